use std::fs;
use std::path::Path;

use libkit_core::config::WorkspaceConfig;
use libkit_core::discovery::ProjectSet;
use libkit_core::error::Error;
use libkit_core::sync::{synchronize, synchronize_workspace, DocumentKind, EntryFixup, PathMapFixup};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

struct NoFixup;

impl EntryFixup for NoFixup {
    fn fix_entry(&mut self, _collection: &mut Map<String, Value>, _key: &str) -> Option<String> {
        None
    }
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn config_for(root: &Path) -> WorkspaceConfig {
    WorkspaceConfig {
        workspace_root: root.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn test_orphaned_manifest_entry_is_removed() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = temp_dir.path().join("angular.json");
    write_json(
        &manifest,
        &json!({
            "version": 1,
            "projects": {
                "app": { "projectType": "application" },
                "lib-a": { "projectType": "library" },
                "lib-b": { "projectType": "library" },
                "lib-orphan": { "projectType": "library" }
            }
        }),
    );

    let projects: ProjectSet = ["lib-a", "lib-b"].into_iter().collect();
    let config = config_for(temp_dir.path());
    let report = synchronize(
        &manifest,
        DocumentKind::Manifest,
        &projects,
        &config.naming(),
        None,
        &mut NoFixup,
    )
    .unwrap();

    assert_eq!(report.showcase.as_deref(), Some("app"));
    assert_eq!(report.removed, vec!["lib-orphan"]);
    assert_eq!(report.libraries, vec!["lib-a", "lib-b"]);

    let written = read_json(&manifest);
    let keys: Vec<&String> = written["projects"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["app", "lib-a", "lib-b"]);
    assert_eq!(written["version"], 1);
}

#[test]
fn test_document_rewritten_with_two_space_indent() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = temp_dir.path().join("angular.json");
    fs::write(&manifest, r#"{"projects":{"app":{"projectType":"application"}}}"#).unwrap();

    let projects = ProjectSet::default();
    let config = config_for(temp_dir.path());
    let report = synchronize(
        &manifest,
        DocumentKind::Manifest,
        &projects,
        &config.naming(),
        Some("app"),
        &mut NoFixup,
    )
    .unwrap();

    assert!(!report.changed());
    let content = fs::read_to_string(&manifest).unwrap();
    assert!(content.starts_with("{\n  \"projects\": {\n    \"app\""));
}

#[test]
fn test_scoped_keys_match_bare_projects() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = temp_dir.path().join("angular.json");
    write_json(
        &manifest,
        &json!({ "projects": {
            "@acme/lib-a": {},
            "@acme/lib-gone": {}
        }}),
    );

    let config = WorkspaceConfig {
        scope_name: Some("@acme".to_string()),
        showcase_project_name: Some("demo".to_string()),
        workspace_root: temp_dir.path().to_path_buf(),
        ..Default::default()
    };
    let projects: ProjectSet = ["lib-a"].into_iter().collect();
    let report = synchronize(
        &manifest,
        DocumentKind::Manifest,
        &projects,
        &config.naming(),
        config.showcase_project_name.as_deref(),
        &mut NoFixup,
    )
    .unwrap();

    assert_eq!(report.removed, vec!["@acme/lib-gone"]);
    assert_eq!(report.libraries, vec!["@acme/lib-a"]);
}

#[test]
fn test_path_map_appends_local_source() {
    let temp_dir = TempDir::new().unwrap();
    let tsconfig = temp_dir.path().join("tsconfig.json");
    write_json(
        &tsconfig,
        &json!({ "compilerOptions": { "paths": { "lib-a": ["a.ts"] } } }),
    );

    let config = config_for(temp_dir.path());
    let projects: ProjectSet = ["lib-a"].into_iter().collect();
    let report = synchronize(
        &tsconfig,
        DocumentKind::PathMap,
        &projects,
        &config.naming(),
        None,
        &mut PathMapFixup::new(&config),
    )
    .unwrap();

    assert_eq!(report.fixes.len(), 1);
    let written = read_json(&tsconfig);
    assert_eq!(
        written["compilerOptions"]["paths"]["lib-a"],
        json!(["a.ts", "./projects/lib-a/src/public-api.ts"])
    );
}

#[test]
fn test_path_map_moves_local_source_from_front() {
    let temp_dir = TempDir::new().unwrap();
    let tsconfig = temp_dir.path().join("tsconfig.json");
    write_json(
        &tsconfig,
        &json!({ "compilerOptions": { "paths": {
            "lib-a": ["./projects/lib-a/src/public-api.ts", "dist/lib-a"]
        } } }),
    );

    let config = config_for(temp_dir.path());
    let projects: ProjectSet = ["lib-a"].into_iter().collect();
    synchronize(
        &tsconfig,
        DocumentKind::PathMap,
        &projects,
        &config.naming(),
        None,
        &mut PathMapFixup::new(&config),
    )
    .unwrap();

    let written = read_json(&tsconfig);
    assert_eq!(
        written["compilerOptions"]["paths"]["lib-a"],
        json!(["dist/lib-a", "./projects/lib-a/src/public-api.ts"])
    );
}

#[test]
fn test_path_map_leaves_correct_entry_alone() {
    let temp_dir = TempDir::new().unwrap();
    let tsconfig = temp_dir.path().join("tsconfig.json");
    write_json(
        &tsconfig,
        &json!({ "compilerOptions": { "paths": {
            "lib-a": ["dist/lib-a", "./projects/lib-a/src/public-api.ts"]
        } } }),
    );

    let config = config_for(temp_dir.path());
    let projects: ProjectSet = ["lib-a"].into_iter().collect();
    let report = synchronize(
        &tsconfig,
        DocumentKind::PathMap,
        &projects,
        &config.naming(),
        None,
        &mut PathMapFixup::new(&config),
    )
    .unwrap();

    assert!(!report.changed());
}

#[test]
fn test_path_map_adds_missing_library() {
    let temp_dir = TempDir::new().unwrap();
    let tsconfig = temp_dir.path().join("tsconfig.json");
    write_json(&tsconfig, &json!({ "compilerOptions": { "paths": {} } }));

    let config = config_for(temp_dir.path());
    let projects: ProjectSet = ["lib-new"].into_iter().collect();
    let report = synchronize(
        &tsconfig,
        DocumentKind::PathMap,
        &projects,
        &config.naming(),
        None,
        &mut PathMapFixup::new(&config),
    )
    .unwrap();

    assert_eq!(report.added, vec!["lib-new"]);
    let written = read_json(&tsconfig);
    assert_eq!(
        written["compilerOptions"]["paths"]["lib-new"],
        json!(["./dist/lib-new", "./projects/lib-new/src/public-api.ts"])
    );
}

#[test]
fn test_wrong_shape_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let tsconfig = temp_dir.path().join("tsconfig.json");
    write_json(
        &tsconfig,
        &json!({ "compilerOptions": { "paths": { "lib-a": "not-a-list" } } }),
    );

    let config = config_for(temp_dir.path());
    let err = synchronize(
        &tsconfig,
        DocumentKind::PathMap,
        &ProjectSet::default(),
        &config.naming(),
        None,
        &mut NoFixup,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidDocument { .. }));
}

#[test]
fn test_malformed_manifest_does_not_block_path_map() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("angular.json"), "{ broken").unwrap();
    write_json(
        &temp_dir.path().join("tsconfig.json"),
        &json!({ "compilerOptions": { "paths": { "lib-gone": ["x.ts"] } } }),
    );

    let config = config_for(temp_dir.path());
    let results = synchronize_workspace(&config, &ProjectSet::default());

    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Err(Error::ConfigParse { .. })));
    let path_map = results[1].as_ref().unwrap();
    assert_eq!(path_map.removed, vec!["lib-gone"]);
}

#[test]
fn test_workspace_sync_carries_detected_showcase_to_path_map() {
    let temp_dir = TempDir::new().unwrap();
    write_json(
        &temp_dir.path().join("angular.json"),
        &json!({ "projects": {
            "demo": { "projectType": "application" },
            "lib-a": {
                "projectType": "library",
                "architect": {
                    "test": { "options": { "karmaConfig": "projects/lib-a/karma.conf.js" } }
                }
            }
        }}),
    );
    write_json(
        &temp_dir.path().join("tsconfig.json"),
        &json!({ "compilerOptions": { "paths": {
            "demo": ["src/main.ts"],
            "lib-a": ["dist/lib-a", "./projects/lib-a/src/public-api.ts"]
        } } }),
    );

    let config = WorkspaceConfig {
        test_runner_config_path: Some("karma.conf.js".to_string()),
        workspace_root: temp_dir.path().to_path_buf(),
        ..Default::default()
    };
    let projects: ProjectSet = ["lib-a"].into_iter().collect();
    let results = synchronize_workspace(&config, &projects);

    let manifest = results[0].as_ref().unwrap();
    assert_eq!(manifest.showcase.as_deref(), Some("demo"));
    assert_eq!(manifest.fixes.len(), 1);

    let path_map = results[1].as_ref().unwrap();
    assert!(path_map.removed.is_empty());

    let written = read_json(&temp_dir.path().join("angular.json"));
    assert_eq!(
        written["projects"]["lib-a"]["architect"]["test"]["options"]["karmaConfig"],
        "karma.conf.js"
    );
}
