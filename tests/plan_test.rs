//! Integration tests for `monodoc plan` and `monodoc list`

mod common;

use common::{exit_code, json, stderr, stdout, TestProject};

fn sample_project() -> TestProject {
    let project = TestProject::with_fake_builder();
    project.add_sample_packages();
    project
}

/// Test: the plan lists packages in dependency order without building
#[test]
fn test_plan_prints_build_order() {
    let project = sample_project();

    let output = project.run(&["plan"]);

    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr(&output));
    let out = stdout(&output);
    let core = out.find("core").unwrap();
    let agents = out.find("agents").unwrap();
    let tools = out.find("tools").unwrap();
    assert!(core < agents && agents < tools, "{out}");
    assert!(out.contains("agents (after core)"), "{out}");
    assert!(project.trace().is_empty());
    assert!(!project.file_exists("_build"));
}

/// Test: JSON plan carries the order and in-plan dependencies
#[test]
fn test_plan_json() {
    let project = sample_project();
    project.create_file("docs/index.rst", "Handbook\n========\n");

    let output = project.run(&["--json", "plan"]);

    assert_eq!(exit_code(&output), 0);
    let plan = json(&output);
    assert_eq!(
        plan["order"],
        serde_json::json!(["core", "agents", "tools", "root"])
    );
    let packages = plan["packages"].as_array().unwrap();
    assert_eq!(packages[1]["dependencies"], serde_json::json!(["core"]));
    assert_eq!(packages[2]["dependencies"], serde_json::json!([]));
    assert_eq!(packages[3]["root"], true);
    assert_eq!(plan["on_dependency_failure"], "skip");
}

/// Test: --package restricts the plan to the dependency closure
#[test]
fn test_plan_package_filter() {
    let project = sample_project();

    let output = project.run(&["--json", "plan", "--package", "Agents"]);

    assert_eq!(exit_code(&output), 0);
    assert_eq!(json(&output)["order"], serde_json::json!(["core", "agents"]));
}

/// Test: cycles are reported with exit code 2
#[test]
fn test_plan_cycle_exits_two() {
    let project = TestProject::with_fake_builder();
    project.add_package("a", &["c"]);
    project.add_package("b", &["a"]);
    project.add_package("c", &["b"]);

    let output = project.run(&["--json", "plan"]);

    assert_eq!(exit_code(&output), 2);
    let error = json(&output);
    assert_eq!(error["status"], "error");
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("a -> c -> b -> a"));
}

/// Test: a malformed manifest names the offending file
#[test]
fn test_malformed_manifest_exits_two() {
    let project = sample_project();
    project.create_file("packages/core/pyproject.toml", "[project\nname = ");

    let output = project.run(&["plan"]);

    assert_eq!(exit_code(&output), 2);
    assert!(stderr(&output).contains("pyproject.toml"));
}

/// Test: list shows every discovered package with its dependencies
#[test]
fn test_list_packages() {
    let project = sample_project();
    project.create_dir("packages/.hidden/docs");
    project.create_file("packages/.hidden/pyproject.toml", "[project]\nname = \"hidden\"\n");

    let output = project.run(&["--json", "list"]);

    assert_eq!(exit_code(&output), 0);
    let listing = json(&output);
    let names: Vec<&str> = listing["packages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["agents", "core", "tools"]);
    assert_eq!(
        listing["packages"][2]["dependencies"],
        serde_json::json!(["requests"])
    );
}

/// Test: text listing includes docs paths
#[test]
fn test_list_text_output() {
    let project = sample_project();

    let output = project.run(&["list"]);

    assert_eq!(exit_code(&output), 0);
    let out = stdout(&output);
    assert!(out.contains("packages/core/docs"), "{out}");
    assert!(out.contains("depends on: core"), "{out}");
    assert!(out.contains("3 packages"), "{out}");
}
