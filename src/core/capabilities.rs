//! Capability table
//!
//! Maps (kind, feature name) pairs to availability. Resolved once at startup by probing
//! the builder executable, the Python interpreter and the configured
//! optional extensions; consumed afterwards as plain data.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::defaults;

/// What kind of feature a capability describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    /// The documentation builder executable
    Builder,
    /// The Python interpreter used for probing
    Interpreter,
    /// An optional documentation extension (Python module)
    Extension,
}

/// Availability of a single feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capability {
    /// Feature name
    pub name: String,
    /// Feature kind
    pub kind: CapabilityKind,
    /// Whether the feature is available
    pub available: bool,
    /// Resolved path or reason it is missing
    pub detail: Option<String>,
}

/// (kind, feature name) -> availability
///
/// Keyed by kind as well as name: `python3 -m sphinx` makes the builder
/// and the interpreter the same program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityTable {
    entries: BTreeMap<(CapabilityKind, String), Capability>,
}

impl CapabilityTable {
    /// Build a table from already-resolved entries
    pub fn from_entries(entries: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|c| ((c.kind, c.name.clone()), c))
                .collect(),
        }
    }

    /// Probe the system
    ///
    /// `builder` is the builder program, `python` the interpreter used to
    /// check whether each optional extension can be imported. The import
    /// probe is bounded by a timeout and gives up when `cancel` fires.
    pub async fn resolve(
        builder: &str,
        python: &str,
        optional_extensions: &[String],
        cancel: &CancellationToken,
    ) -> Self {
        let mut entries = vec![probe_executable(builder, CapabilityKind::Builder)];

        let interpreter = probe_executable(python, CapabilityKind::Interpreter);
        let found = if interpreter.available {
            importable_modules(
                python,
                optional_extensions,
                Duration::from_secs(defaults::PROBE_TIMEOUT_SECS),
                cancel,
            )
            .await
        } else {
            Vec::new()
        };
        entries.push(interpreter);

        entries.extend(optional_extensions.iter().map(|ext| {
            let available = found.contains(ext);
            Capability {
                name: ext.clone(),
                kind: CapabilityKind::Extension,
                available,
                detail: (!available).then(|| "not importable".to_string()),
            }
        }));

        let table = Self::from_entries(entries);
        tracing::debug!("Resolved capabilities: {:?}", table.entries.keys());
        table
    }

    /// Whether a feature of the given kind is available
    pub fn is_available(&self, kind: CapabilityKind, name: &str) -> bool {
        self.get(kind, name).is_some_and(|c| c.available)
    }

    /// Look up a feature
    pub fn get(&self, kind: CapabilityKind, name: &str) -> Option<&Capability> {
        self.entries.get(&(kind, name.to_string()))
    }

    /// All features: builder, interpreter, then extensions in name order
    pub fn entries(&self) -> impl Iterator<Item = &Capability> {
        self.entries.values()
    }

    /// Whether the builder executable was found
    pub fn builder_available(&self) -> bool {
        self.entries
            .values()
            .any(|c| c.kind == CapabilityKind::Builder && c.available)
    }

    /// Names of the available optional extensions
    pub fn available_extensions(&self) -> Vec<String> {
        self.entries
            .values()
            .filter(|c| c.kind == CapabilityKind::Extension && c.available)
            .map(|c| c.name.clone())
            .collect()
    }
}

fn probe_executable(program: &str, kind: CapabilityKind) -> Capability {
    match which::which(program) {
        Ok(path) => Capability {
            name: program.to_string(),
            kind,
            available: true,
            detail: Some(path.display().to_string()),
        },
        Err(e) => Capability {
            name: program.to_string(),
            kind,
            available: false,
            detail: Some(e.to_string()),
        },
    }
}

/// Ask the interpreter which of the modules can be imported, in one call
async fn importable_modules(
    python: &str,
    modules: &[String],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Vec<String> {
    if modules.is_empty() {
        return Vec::new();
    }

    let script = "import importlib.util, sys\n\
                  for m in sys.argv[1:]:\n    \
                  if importlib.util.find_spec(m) is not None:\n        \
                  print(m)";

    let mut command = Command::new(python);
    command
        .arg("-c")
        .arg(script)
        .args(modules)
        .stdin(std::process::Stdio::null())
        .kill_on_drop(true);
    let probe = command.output();

    let result = tokio::select! {
        result = tokio::time::timeout(timeout, probe) => result,
        () = cancel.cancelled() => {
            tracing::debug!("Extension probe cancelled");
            return Vec::new();
        }
    };

    let Ok(result) = result else {
        tracing::warn!(
            "Extension probe with {python} timed out after {}s",
            timeout.as_secs()
        );
        return Vec::new();
    };

    match result {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect(),
        Ok(output) => {
            tracing::warn!(
                "Extension probe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Failed to run {python} for extension probe: {e}");
            Vec::new()
        }
    }
}
