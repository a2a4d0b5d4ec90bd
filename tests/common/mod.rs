//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: a
//! temporary monorepo with helpers to add packages, and a fake
//! documentation builder written as a POSIX shell script.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Fake builder: `sh fake-builder.sh -b <builder> [args...] <docs> <out>`
///
/// Behaviour is driven by marker files in the docs directory:
/// `FAIL` exits 2 with the file's content on stderr, `SLEEP` hangs.
/// Every invocation appends `start:<pkg>` and `end:<pkg>` to the trace file.
const FAKE_BUILDER: &str = r#"#!/bin/sh
docs=""
out=""
for arg in "$@"; do docs="$out"; out="$arg"; done
echo "start:$MONODOC_PACKAGE" >> "@TRACE@"
if [ -f "$docs/FAIL" ]; then
  echo "Running Sphinx"
  echo "Sphinx error: $(cat "$docs/FAIL")" >&2
  exit 2
fi
if [ -f "$docs/SLEEP" ]; then
  exec sleep 30
fi
mkdir -p "$out"
printf 'package=%s fast=%s args=%s\n' "$MONODOC_PACKAGE" "$MONODOC_FAST_BUILD" "$*" > "$out/index.html"
echo "end:$MONODOC_PACKAGE" >> "@TRACE@"
echo "build succeeded."
"#;

/// Test project context
///
/// Creates a temporary monorepo and provides utilities for setting up
/// test scenarios and running the monodoc binary against it.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a project whose builder is the fake builder script
    pub fn with_fake_builder() -> Self {
        let project = Self::new();
        project.install_fake_builder("");
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Write the fake builder and a `monodoc.toml` that uses it
    ///
    /// `extra_config` is appended to the `[build]` section.
    pub fn install_fake_builder(&self, extra_config: &str) {
        let script = self.dir.path().join("fake-builder.sh");
        let trace = self.dir.path().join("trace.log");
        self.create_file(
            "fake-builder.sh",
            &FAKE_BUILDER.replace("@TRACE@", &trace.display().to_string()),
        );
        self.create_file(
            "monodoc.toml",
            &format!(
                "[build]\ncommand = [\"sh\", \"{}\"]\n{extra_config}\n",
                script.display()
            ),
        );
    }

    /// Add a package under `packages/` with a PEP 621 manifest and docs
    pub fn add_package(&self, name: &str, dependencies: &[&str]) {
        let deps = dependencies
            .iter()
            .map(|d| format!("\"{d}\""))
            .collect::<Vec<_>>()
            .join(", ");
        self.create_file(
            &format!("packages/{name}/pyproject.toml"),
            &format!("[project]\nname = \"{name}\"\ndependencies = [{deps}]\n"),
        );
        self.create_file(
            &format!("packages/{name}/docs/index.rst"),
            &format!("{name}\n{}\n", "=".repeat(name.len())),
        );
    }

    /// Make a package's build fail with the given message
    pub fn make_failing(&self, name: &str, message: &str) {
        self.create_file(&format!("packages/{name}/docs/FAIL"), message);
    }

    /// Make a package's build hang until killed
    pub fn make_hanging(&self, name: &str) {
        self.create_file(&format!("packages/{name}/docs/SLEEP"), "");
    }

    /// The standard three-package monorepo: agents depends on core
    pub fn add_sample_packages(&self) {
        self.add_package("core", &[]);
        self.add_package("agents", &["core>=0.1"]);
        self.add_package("tools", &["requests"]);
    }

    /// Lines written to the trace file by the fake builder
    pub fn trace(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("trace.log"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    /// Run monodoc in the project directory
    pub fn run(&self, args: &[&str]) -> Output {
        self.run_with_env(args, &[])
    }

    /// Run monodoc with extra environment variables
    pub fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_monodoc"));
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("MONODOC_MAX_WORKERS")
            .env_remove("MONODOC_FAST_BUILD")
            .env_remove("MONODOC_DEBUG");
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.args(args);
        cmd.output().expect("Failed to execute monodoc")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Exit code of a finished process
pub fn exit_code(output: &Output) -> i32 {
    output.status.code().expect("monodoc terminated by a signal")
}

/// Stdout as a string
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Stderr as a string
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Parse stdout as JSON
pub fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}\nstderr: {}",
            stdout(output),
            stderr(output)
        )
    })
}

/// Package statuses from a JSON build report, in report order
pub fn statuses(report: &serde_json::Value) -> Vec<(String, String)> {
    report["results"]
        .as_array()
        .expect("results array")
        .iter()
        .map(|r| {
            (
                r["package_name"].as_str().unwrap_or_default().to_string(),
                r["status"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}
