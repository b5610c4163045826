//! Turns library names into per-library invocations and dispatches them.

use tracing::{info, warn};

use crate::command::{Invocation, Step};
use crate::config::WorkspaceConfig;
use crate::discovery::ProjectSet;
use crate::error::{Error, Result};
use crate::naming::{split_library_args, LibraryNaming};
use crate::package::DESCRIPTOR_FILE;
use crate::planner::{DependencyWaitPlan, WaitPlanner};
use crate::runner::{BatchReport, CommandRunner, InvocationResult};

/// Delay the waiter applies before its first poll of a previous library's
/// descriptor.
const PREVIOUS_LIBRARY_WAIT_DELAY_MS: u64 = 200;

/// Test-runner config each generated library ships with.
const GENERATED_TEST_RUNNER_CONFIG: &str = "karma.conf.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub watch: bool,
    pub serve: bool,
    pub concurrent: bool,
}

impl BuildOptions {
    /// Watch builds and the dev server never exit, so they can only run
    /// concurrently.
    pub fn new(watch: bool, serve: bool, concurrent: bool) -> Result<Self> {
        let options = Self {
            watch,
            serve,
            concurrent,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn is_long_running(&self) -> bool {
        self.watch || self.serve
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_long_running() && !self.concurrent {
            return Err(Error::Usage(
                "watch builds and the dev server cannot run sequentially".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ordered invocations for one command, plus how to run them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommandList {
    pub invocations: Vec<Invocation>,
    pub concurrent: bool,
    /// Dependency plans per target, in target order.
    pub plans: Vec<DependencyWaitPlan>,
}

impl BuildCommandList {
    pub fn sequential(invocations: Vec<Invocation>) -> Self {
        Self {
            invocations,
            concurrent: false,
            plans: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&Invocation> {
        self.invocations.iter().find(|i| i.label == label)
    }
}

pub struct Orchestrator<'a> {
    config: &'a WorkspaceConfig,
    naming: LibraryNaming,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a WorkspaceConfig) -> Self {
        Self {
            config,
            naming: config.naming(),
        }
    }

    /// Normalizes CLI arguments into prefixed library names.
    ///
    /// With no names, every discovered project is returned when
    /// `all_if_empty` is set; otherwise that is a usage error.
    pub fn resolve_targets<S: AsRef<str>>(
        &self,
        args: &[S],
        all_if_empty: bool,
    ) -> Result<Vec<String>> {
        let names = split_library_args(args);
        if !names.is_empty() {
            return Ok(names.iter().map(|n| self.naming.to_prefixed(n)).collect());
        }
        if !all_if_empty {
            return Err(Error::Usage("You must specify a library name!".to_string()));
        }
        let projects = ProjectSet::discover(self.config)?;
        info!(
            "No library name(s) passed in, getting all libraries from {}.",
            self.config.libraries_root().display()
        );
        Ok(projects.into_names())
    }

    /// Builds every target, each gated on its in-workspace dependencies, and
    /// optionally a trailing dev-server invocation gated on every target.
    pub fn build_commands(
        &self,
        targets: &[String],
        options: BuildOptions,
    ) -> Result<BuildCommandList> {
        let projects = ProjectSet::discover(self.config)?;
        let built = ProjectSet::discover_built(self.config)?;
        let unbuilt: ProjectSet = projects
            .iter()
            .filter(|p| !built.contains(p) && !targets.contains(p))
            .map(String::as_str)
            .collect();

        self.build_commands_with(targets, options, &projects, &unbuilt)
    }

    /// [`Orchestrator::build_commands`] over an explicit project snapshot.
    pub fn build_commands_with(
        &self,
        targets: &[String],
        options: BuildOptions,
        projects: &ProjectSet,
        unbuilt: &ProjectSet,
    ) -> Result<BuildCommandList> {
        options.validate()?;
        let tools = &self.config.tools;
        let mut planner = WaitPlanner::new(self.config, projects);
        let mut invocations = Vec::with_capacity(targets.len() + 1);
        let mut plans = Vec::with_capacity(targets.len());

        for target in targets {
            let plan = planner.plan(target, targets, unbuilt)?;
            let registry_name = self.naming.to_registry_name(target);
            let invocation = Invocation::new(target.clone())
                .step(tools.remove(&self.config.library_dist_dir(target)))
                .steps(plan.steps())
                .step(tools.build(&registry_name, options.watch));
            invocations.push(invocation);
            plans.push(plan);
        }

        if options.serve {
            let markers = targets
                .iter()
                .map(|t| self.config.build_marker(t))
                .collect();
            let serve = Invocation::new("serve")
                .step(tools.wait_for(markers, None))
                .step(tools.serve());
            invocations.push(serve);
        }

        info!(
            "{} commands to run{}",
            invocations.len(),
            if options.concurrent { " concurrently" } else { "" }
        );

        Ok(BuildCommandList {
            invocations,
            concurrent: options.concurrent,
            plans,
        })
    }

    /// Applies `make` to each library. With `wait_for_previous`, every
    /// invocation waits for the descriptor of the last library that produced
    /// one; skipped libraries are never waited on.
    pub fn per_library<F>(
        &self,
        libraries: &[String],
        wait_for_previous: bool,
        mut make: F,
    ) -> BuildCommandList
    where
        F: FnMut(&str) -> Option<Invocation>,
    {
        let mut invocations = Vec::with_capacity(libraries.len());
        let mut previous: Option<&str> = None;
        for library in libraries {
            let Some(mut invocation) = make(library) else {
                continue;
            };
            if let Some(previous) = previous.filter(|_| wait_for_previous) {
                let descriptor = self.config.library_dir(previous).join(DESCRIPTOR_FILE);
                invocation.prepend(Step::WaitFor(
                    self.config
                        .tools
                        .wait_for(vec![descriptor], Some(PREVIOUS_LIBRARY_WAIT_DELAY_MS)),
                ));
            }
            previous = Some(library.as_str());
            invocations.push(invocation);
        }
        BuildCommandList::sequential(invocations)
    }

    /// Runs `command` inside a library's build output, skipping libraries that
    /// have not been built.
    fn in_dist_dir(&self, library: &str, step: Step) -> Option<Invocation> {
        let dist = self.config.library_dist_dir(library);
        if !dist.is_dir() {
            warn!("no path {} was found", dist.display());
            return None;
        }
        Some(Invocation::new(library).in_dir(dist).step(step))
    }

    pub fn pack_commands(&self, libraries: &[String]) -> BuildCommandList {
        let tools = &self.config.tools;
        self.per_library(libraries, true, |lib| {
            self.in_dist_dir(lib, Step::Run(tools.pack()))
        })
    }

    pub fn publish_commands(&self, libraries: &[String]) -> BuildCommandList {
        let tools = &self.config.tools;
        let public = self.config.is_public_scope;
        self.per_library(libraries, true, |lib| {
            self.in_dist_dir(lib, Step::Run(tools.publish(public)))
        })
    }

    /// Scaffolds each library, then copies the registry auth file in and drops
    /// the generated test-runner config when a shared one is configured.
    pub fn add_commands(&self, libraries: &[String]) -> BuildCommandList {
        let tools = &self.config.tools;
        let auth_file = self.config.registry_auth_file();
        self.per_library(libraries, true, |lib| {
            let library_dir = self.config.library_dir(lib);
            let mut invocation = Invocation::new(lib)
                .step(tools.generate_library(&self.naming.to_registry_name(lib)));
            if let Some(auth_file) = &auth_file {
                invocation = invocation.step(tools.copy(auth_file, &library_dir));
            }
            if self.config.test_runner_config_path.is_some() {
                invocation =
                    invocation.step(tools.remove(&library_dir.join(GENERATED_TEST_RUNNER_CONFIG)));
            }
            Some(invocation)
        })
    }

    pub fn remove_commands(&self, libraries: &[String]) -> BuildCommandList {
        let tools = &self.config.tools;
        self.per_library(libraries, false, |lib| {
            Some(Invocation::new(lib).step(tools.remove(&self.config.library_dir(lib))))
        })
    }
}

/// Dispatches a command list and collects every result.
///
/// Sequential lists run one invocation at a time and report each result to
/// `on_result` as it completes; concurrent lists are handed to the runner as
/// one batch. Failures never stop the remaining invocations.
pub fn execute<R, F>(list: &BuildCommandList, runner: &R, mut on_result: F) -> Result<BatchReport>
where
    R: CommandRunner + ?Sized,
    F: FnMut(&InvocationResult),
{
    let invocations: Vec<Invocation> = list
        .invocations
        .iter()
        .filter(|i| !i.is_empty())
        .cloned()
        .collect();

    if list.concurrent {
        let report = runner.run_concurrent(&invocations)?;
        report.results.iter().for_each(&mut on_result);
        return Ok(report);
    }

    let mut report = BatchReport::default();
    for (index, invocation) in invocations.iter().enumerate() {
        info!(
            "Processing library {} of {}: {}",
            index + 1,
            invocations.len(),
            invocation
        );
        let result = runner.run(invocation)?;
        on_result(&result);
        report.results.push(result);
    }
    Ok(report)
}
