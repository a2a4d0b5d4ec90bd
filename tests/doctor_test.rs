//! Integration tests for `monodoc doctor`

mod common;

use common::{exit_code, json, stdout, TestProject};

/// Test: an available builder passes
#[test]
fn test_doctor_with_available_builder() {
    let project = TestProject::with_fake_builder();

    let output = project.run(&["doctor"]);

    assert_eq!(exit_code(&output), 0);
    let out = stdout(&output);
    assert!(out.contains("sh (builder)"), "{out}");
    assert!(out.contains("Builder available"), "{out}");
}

/// Test: a missing builder exits 1
#[test]
fn test_doctor_with_missing_builder() {
    let project = TestProject::new();
    project.create_file(
        "monodoc.toml",
        "[build]\ncommand = [\"definitely-not-a-real-builder-xyz\"]\n",
    );

    let output = project.run(&["doctor"]);

    assert_eq!(exit_code(&output), 1);
    assert!(stdout(&output).contains("not found"));
}

/// Test: the JSON report lists every probed capability
#[test]
fn test_doctor_json_lists_extensions() {
    let project = TestProject::new();
    project.create_file(
        "monodoc.toml",
        "[build]\ncommand = [\"sh\"]\n\n[capabilities]\npython = \"definitely-not-a-real-python-xyz\"\noptional_extensions = [\"sphinx_copybutton\"]\n",
    );

    let output = project.run(&["--json", "doctor"]);

    assert_eq!(exit_code(&output), 0);
    let report = json(&output);
    assert_eq!(report["status"], "success");
    let capabilities = report["capabilities"].as_array().unwrap();
    let extension = capabilities
        .iter()
        .find(|c| c["name"] == "sphinx_copybutton")
        .unwrap();
    assert_eq!(extension["kind"], "extension");
    assert_eq!(extension["available"], false);
    let interpreter = capabilities
        .iter()
        .find(|c| c["kind"] == "interpreter")
        .unwrap();
    assert_eq!(interpreter["available"], false);
}

/// Test: a builder run through the interpreter (`python -m sphinx`) is found
#[test]
fn test_doctor_builder_is_interpreter() {
    let project = TestProject::new();
    project.create_file(
        "monodoc.toml",
        "[build]\ncommand = [\"sh\", \"-m\", \"sphinx\"]\n\n[capabilities]\npython = \"sh\"\n",
    );

    let output = project.run(&["--json", "doctor"]);

    assert_eq!(exit_code(&output), 0);
    let report = json(&output);
    assert_eq!(report["status"], "success");
    let kinds: Vec<&str> = report["capabilities"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["name"] == "sh")
        .map(|c| c["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["builder", "interpreter"]);
}
