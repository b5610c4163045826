use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn run_libkit(workspace: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_libkit"))
        .args(args)
        .current_dir(workspace)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute libkit")
}

fn create_library(root: &Path, name: &str, peers: &[&str]) {
    let dir = root.join("projects").join(name);
    fs::create_dir_all(&dir).unwrap();
    let peers = peers
        .iter()
        .map(|p| format!("\"{}\": \"*\"", p))
        .collect::<Vec<_>>()
        .join(", ");
    fs::write(
        dir.join("package.json"),
        format!(r#"{{ "name": "{}", "peerDependencies": {{ {} }} }}"#, name, peers),
    )
    .unwrap();
}

#[test]
fn test_unknown_command_fails_with_command_list() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_libkit(temp_dir.path(), &["deploy"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    for name in ["build", "build_watch", "pack", "publish", "add", "remove", "configs", "serve"] {
        assert!(stderr.contains(name), "missing {} in: {}", name, stderr);
    }
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_sequential_serve_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    create_library(root, "lib-a", &[]);

    let output = run_libkit(root, &["serve", "--sequential", "--dry-run"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot run sequentially"), "stderr: {}", stderr);
    assert!(!root.join("dist").exists());
}

#[test]
fn test_add_without_names_is_a_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_libkit(temp_dir.path(), &["add"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("You must specify a library name!"));
}

#[test]
fn test_configs_synchronizes_documents() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    create_library(root, "lib-a", &[]);
    fs::write(
        root.join("angular.json"),
        r#"{
  "projects": {
    "showcase": { "projectType": "application" },
    "lib-a": { "projectType": "library" },
    "lib-gone": { "projectType": "library" }
  }
}"#,
    )
    .unwrap();
    fs::write(
        root.join("tsconfig.json"),
        r#"{ "compilerOptions": { "paths": { "lib-gone": ["./dist/lib-gone"] } } }"#,
    )
    .unwrap();

    let output = run_libkit(root, &["configs"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("angular.json")).unwrap()).unwrap();
    let projects = manifest["projects"].as_object().unwrap();
    assert!(projects.contains_key("showcase"));
    assert!(projects.contains_key("lib-a"));
    assert!(!projects.contains_key("lib-gone"));

    let path_map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("tsconfig.json")).unwrap()).unwrap();
    let paths = path_map["compilerOptions"]["paths"].as_object().unwrap();
    assert!(!paths.contains_key("lib-gone"));
    assert_eq!(
        paths["lib-a"],
        serde_json::json!(["./dist/lib-a", "./projects/lib-a/src/public-api.ts"])
    );
}

#[test]
fn test_build_dry_run_prints_plan_without_running() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    create_library(root, "lib-a", &[]);
    create_library(root, "lib-b", &["lib-a"]);

    let output = run_libkit(root, &["build", "lib-b", "--dry-run"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ng build lib-a"));
    assert!(stdout.contains("ng build lib-b"));
    assert!(stdout.contains("Dry run"));
    assert!(!root.join("dist").exists());
}
