//! Builder subprocess execution
//!
//! The only place that spawns the external documentation builder. Each
//! invocation runs with piped output, a per-package timeout and the run's
//! cancellation token; a child that outlives either is killed.

use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::{defaults, env};
use crate::core::config::{BuildDefaults, EnvOverrides, PackageBuildSettings, WorkspaceLayout};
use crate::core::package::PackageDescriptor;
use crate::core::scheduler::{BuildOutcome, DocBuilder};
use crate::error::BuildError;
use crate::infra::filesystem;

/// A fully resolved builder command for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInvocation {
    /// Package being built
    pub package: String,
    /// Program to run
    pub program: String,
    /// Program arguments
    pub args: Vec<String>,
    /// Extra environment for the child
    pub env: Vec<(String, String)>,
    /// Working directory
    pub working_dir: PathBuf,
    /// Builder output directory
    pub output_dir: PathBuf,
    /// Captured log file
    pub log_path: PathBuf,
    /// Time limit
    pub timeout: Duration,
}

impl BuildInvocation {
    /// Command line as a single string, for logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs the configured builder as a subprocess
#[derive(Debug, Clone)]
pub struct SubprocessBuilder {
    defaults: BuildDefaults,
    env: EnvOverrides,
    extensions: Vec<String>,
    layout: WorkspaceLayout,
}

impl SubprocessBuilder {
    /// Create a builder
    ///
    /// `extensions` are the available optional extensions, advertised to
    /// the child through the environment.
    pub fn new(
        defaults: BuildDefaults,
        env: EnvOverrides,
        extensions: Vec<String>,
        layout: WorkspaceLayout,
    ) -> Self {
        Self {
            defaults,
            env,
            extensions,
            layout,
        }
    }

    /// Resolve the command for a package without running it
    pub fn invocation_for(&self, package: &PackageDescriptor) -> BuildInvocation {
        let settings = PackageBuildSettings::merge(&self.defaults, &package.overrides, &self.env);
        let output_dir = self.layout.package_output_dir(&package.name);

        let mut args: Vec<String> = settings.command[1..].to_vec();
        args.push("-b".to_string());
        args.push(settings.builder.clone());
        if settings.warnings_as_errors {
            args.push("-W".to_string());
            args.push("--keep-going".to_string());
        }
        args.extend(settings.extra_args.iter().cloned());
        args.push(package.docs_path.display().to_string());
        args.push(output_dir.display().to_string());

        let mut child_env = settings.env.clone();
        child_env.push((env::PACKAGE.to_string(), package.name.clone()));
        child_env.push((env::EXTENSIONS.to_string(), self.extensions.join(",")));

        BuildInvocation {
            package: package.name.clone(),
            program: settings.command[0].clone(),
            args,
            env: child_env,
            working_dir: package.root_path.clone(),
            output_dir,
            log_path: self
                .layout
                .logs_dir()
                .join(format!("{}.log", package.name)),
            timeout: settings.timeout,
        }
    }

    /// Run one invocation to completion, timeout or cancellation
    pub async fn run(
        &self,
        invocation: &BuildInvocation,
        cancel: &CancellationToken,
    ) -> BuildOutcome {
        if let Err(e) = filesystem::create_dir_all(&invocation.output_dir) {
            return BuildOutcome::failure(e.into(), None);
        }

        tracing::debug!("Running: {}", invocation.command_line());

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return BuildOutcome::failure(
                    BuildError::Spawn {
                        program: invocation.program.clone(),
                        error: e.to_string(),
                    },
                    None,
                );
            }
        };

        // Dropping the wait future drops the child, which kills it.
        let waited = tokio::select! {
            result = tokio::time::timeout(invocation.timeout, child.wait_with_output()) => result,
            () = cancel.cancelled() => {
                tracing::debug!("Cancelled build of {}", invocation.package);
                let log = log_header(invocation) + "cancelled\n";
                let log_path = write_log(invocation, &log).await;
                return BuildOutcome::failure(BuildError::Cancelled, log_path);
            }
        };

        let output = match waited {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return BuildOutcome::failure(BuildError::Wait(e.to_string()), None),
            Err(_) => {
                let secs = invocation.timeout.as_secs();
                tracing::debug!("Build of {} timed out after {secs}s", invocation.package);
                let log = log_header(invocation) + &format!("timeout after {secs}s\n");
                let log_path = write_log(invocation, &log).await;
                return BuildOutcome::failure(BuildError::Timeout { secs }, log_path);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut log = log_header(invocation);
        log.push_str(&stdout);
        log.push_str(&stderr);
        let log_path = invocation.log_path.clone();
        if let Err(e) = filesystem::write_file(&log_path, &log).await {
            return BuildOutcome::failure(e.into(), None);
        }

        if output.status.success() {
            BuildOutcome::success(Some(log_path))
        } else {
            BuildOutcome::failure(
                BuildError::NonZeroExit {
                    status: describe_status(output.status),
                    output: output_tail(&stdout, &stderr, defaults::ERROR_DETAIL_LINES),
                },
                Some(log_path),
            )
        }
    }
}

#[async_trait]
impl DocBuilder for SubprocessBuilder {
    async fn build(&self, package: &PackageDescriptor, cancel: &CancellationToken) -> BuildOutcome {
        let invocation = self.invocation_for(package);
        self.run(&invocation, cancel).await
    }
}

fn log_header(invocation: &BuildInvocation) -> String {
    let mut header = String::new();
    let _ = writeln!(header, "$ {}", invocation.command_line());
    let _ = writeln!(header, "# cwd: {}", invocation.working_dir.display());
    header.push('\n');
    header
}

/// Best-effort log for builds that ended without output
async fn write_log(invocation: &BuildInvocation, content: &str) -> Option<PathBuf> {
    match filesystem::write_file(&invocation.log_path, content).await {
        Ok(()) => Some(invocation.log_path.clone()),
        Err(e) => {
            tracing::warn!("{e}");
            None
        }
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Last `max_lines` non-empty lines of the combined output
fn output_tail(stdout: &str, stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stdout
        .lines()
        .chain(stderr.lines())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return "(no output)".to_string();
    }

    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
