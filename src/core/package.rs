//! Package descriptors and manifest parsing
//!
//! A package is a directory holding a manifest (`pyproject.toml` by default)
//! and a documentation source directory. Package names and dependency names
//! are normalised so that `My_Pkg`, `my.pkg` and `my-pkg` refer to the same
//! package.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::defaults;
use crate::error::ConfigError;

/// A documentable package found during discovery
///
/// Constructed once per discovery pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Normalised package name, unique across the monorepo
    pub name: String,
    /// Package directory
    pub root_path: PathBuf,
    /// Documentation source directory
    pub docs_path: PathBuf,
    /// Declared dependencies (normalised names, not necessarily in the workspace)
    pub dependencies: BTreeSet<String>,
    /// Per-package build overrides from `[tool.monodoc]`
    pub overrides: PackageOverrides,
    /// Whether this is the root (aggregator) documentation entry
    pub is_root: bool,
}

impl PackageDescriptor {
    /// Build a descriptor from a parsed manifest
    ///
    /// Falls back to the directory name when the manifest declares no name.
    pub fn from_manifest(dir: &Path, manifest: PackageManifest, default_docs_dir: &Path) -> Self {
        let name = manifest
            .name
            .as_deref()
            .or_else(|| dir.file_name().and_then(|n| n.to_str()))
            .map(normalize_name)
            .unwrap_or_default();

        let docs_dir = manifest
            .overrides
            .docs_dir
            .clone()
            .unwrap_or_else(|| default_docs_dir.to_path_buf());

        let mut dependencies: BTreeSet<String> = manifest.dependencies.into_iter().collect();
        dependencies.extend(manifest.overrides.depends.iter().map(|d| normalize_name(d)));
        dependencies.remove(&name);

        Self {
            name,
            root_path: dir.to_path_buf(),
            docs_path: dir.join(docs_dir),
            dependencies,
            overrides: manifest.overrides,
            is_root: false,
        }
    }

    /// Build the root documentation entry, depending on every given package
    pub fn root<'a>(
        name: &str,
        root_path: &Path,
        docs_path: &Path,
        packages: impl IntoIterator<Item = &'a PackageDescriptor>,
    ) -> Self {
        Self {
            name: name.to_string(),
            root_path: root_path.to_path_buf(),
            docs_path: docs_path.to_path_buf(),
            dependencies: packages.into_iter().map(|p| p.name.clone()).collect(),
            overrides: PackageOverrides::default(),
            is_root: true,
        }
    }
}

/// Per-package overrides, read from `[tool.monodoc]` in the package manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageOverrides {
    /// Package name (takes precedence over the manifest's own name)
    pub name: Option<String>,

    /// Documentation source directory, relative to the package
    #[serde(alias = "docs_dir")]
    pub docs_dir: Option<PathBuf>,

    /// Extra dependency names, in addition to the manifest's dependencies
    #[serde(default)]
    pub depends: Vec<String>,

    /// Builder name (for example `html` or `dirhtml`)
    pub builder: Option<String>,

    /// Build timeout in seconds
    #[serde(alias = "timeout_secs")]
    pub timeout_secs: Option<u64>,

    /// Extra builder arguments, appended after the workspace ones
    #[serde(default, alias = "extra_args")]
    pub extra_args: Vec<String>,
}

/// The parts of a package manifest monodoc cares about
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageManifest {
    /// Declared package name, if any
    pub name: Option<String>,
    /// Normalised dependency names
    pub dependencies: Vec<String>,
    /// `[tool.monodoc]` overrides
    pub overrides: PackageOverrides,
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    project: Option<RawProject>,
    #[serde(default)]
    package: Option<RawProject>,
    #[serde(default)]
    dependencies: Option<toml::Table>,
    #[serde(default)]
    tool: Option<RawTool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProject {
    name: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTool {
    monodoc: Option<PackageOverrides>,
}

impl PackageManifest {
    /// Parse a manifest from TOML
    ///
    /// Understands PEP 621 `[project]` tables and Cargo-style `[package]`
    /// plus `[dependencies]` tables.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let overrides = raw.tool.and_then(|t| t.monodoc).unwrap_or_default();
        if overrides.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "tool.monodoc.timeout-secs".to_string(),
                message: format!("must be at least 1 second in {}", path.display()),
            });
        }

        let mut name = overrides.name.clone();
        let mut dependencies = Vec::new();

        if let Some(project) = raw.project {
            name = name.or(project.name);
            dependencies.extend(project.dependencies.iter().filter_map(|r| requirement_name(r)));
        }
        if let Some(package) = raw.package {
            name = name.or(package.name);
        }
        if let Some(table) = raw.dependencies {
            dependencies.extend(table.keys().map(|k| normalize_name(k)));
        }

        Ok(Self {
            name,
            dependencies,
            overrides,
        })
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content, path)
    }
}

/// Normalise a package name: lowercase, with runs of `-`, `_` and `.` collapsed to `-`
pub fn normalize_name(name: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let re = SEPARATORS.get_or_init(|| Regex::new(r"[-_.]+").expect("valid separator regex"));
    re.replace_all(name.trim(), "-").to_lowercase()
}

/// Check that a package name is usable as a single output directory name
///
/// The name becomes `<output>/<name>` and `<output>/logs/<name>.log`, so it
/// must be one plain path component and must not shadow the logs directory.
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name.contains(['/', '\\']) || Path::new(name).is_absolute() {
        return Err("name contains a path separator");
    }
    if name == "." || name == ".." {
        return Err("name is a relative path component");
    }
    if name == defaults::LOGS_SUBDIR {
        return Err("name is reserved for the build log directory");
    }
    Ok(())
}

/// Extract the distribution name from a requirement string
///
/// `"core[extra]>=1.0; python_version>'3.8'"` yields `core`.
pub fn requirement_name(requirement: &str) -> Option<String> {
    static NAME: OnceLock<Regex> = OnceLock::new();
    let re = NAME.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)")
            .expect("valid requirement regex")
    });
    re.captures(requirement)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_name(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::generators;
    use proptest::prelude::*;

    fn parse(content: &str) -> PackageManifest {
        PackageManifest::from_toml(content, Path::new("pyproject.toml")).unwrap()
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("My_Package"), "my-package");
        assert_eq!(normalize_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_name("a__-.b"), "a-b");
    }

    #[test]
    fn test_requirement_name_strips_specifiers_and_extras() {
        assert_eq!(requirement_name("core>=1.0").as_deref(), Some("core"));
        assert_eq!(requirement_name("Agents[llm] ~= 2.1").as_deref(), Some("agents"));
        assert_eq!(
            requirement_name("tools ; python_version > '3.8'").as_deref(),
            Some("tools")
        );
        assert_eq!(requirement_name("  my_lib").as_deref(), Some("my-lib"));
        assert_eq!(requirement_name(">=1.0"), None);
    }

    #[test]
    fn test_parse_pep621_manifest() {
        let manifest = parse(
            r#"
[project]
name = "agents"
dependencies = ["core>=0.1", "requests"]
"#,
        );
        assert_eq!(manifest.name.as_deref(), Some("agents"));
        assert_eq!(manifest.dependencies, vec!["core", "requests"]);
        assert_eq!(manifest.overrides, PackageOverrides::default());
    }

    #[test]
    fn test_parse_cargo_style_manifest() {
        let manifest = parse(
            r#"
[package]
name = "engine"

[dependencies]
serde_json = "1"
engine-core = { path = "../core" }
"#,
        );
        assert_eq!(manifest.name.as_deref(), Some("engine"));
        assert!(manifest.dependencies.contains(&"serde-json".to_string()));
        assert!(manifest.dependencies.contains(&"engine-core".to_string()));
    }

    #[test]
    fn test_parse_tool_overrides() {
        let manifest = parse(
            r#"
[project]
name = "core"

[tool.monodoc]
name = "core-docs"
docs-dir = "documentation"
depends = ["Shared_Theme"]
builder = "dirhtml"
timeout-secs = 30
extra-args = ["-q"]
"#,
        );
        assert_eq!(manifest.name.as_deref(), Some("core-docs"));
        let o = &manifest.overrides;
        assert_eq!(o.docs_dir.as_deref(), Some(Path::new("documentation")));
        assert_eq!(o.depends, vec!["Shared_Theme"]);
        assert_eq!(o.builder.as_deref(), Some("dirhtml"));
        assert_eq!(o.timeout_secs, Some(30));
        assert_eq!(o.extra_args, vec!["-q"]);
    }

    #[test]
    fn test_malformed_manifest_is_config_error() {
        let err = PackageManifest::from_toml("[project\nname=", Path::new("bad/pyproject.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("bad/pyproject.toml"));
    }

    #[test]
    fn test_zero_package_timeout_is_rejected() {
        let err = PackageManifest::from_toml(
            "[project]\nname = \"core\"\n\n[tool.monodoc]\ntimeout-secs = 0\n",
            Path::new("core/pyproject.toml"),
        )
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "tool.monodoc.timeout-secs")
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("core").is_ok());
        assert!(validate_name("my-logs").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("logs").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("/abs").is_err());
        assert!(validate_name("..").is_err());
    }

    #[test]
    fn test_descriptor_from_manifest() {
        let manifest = parse(
            r#"
[project]
name = "Agents"
dependencies = ["core", "agents"]

[tool.monodoc]
depends = ["Tools"]
"#,
        );
        let desc = PackageDescriptor::from_manifest(
            Path::new("/repo/packages/agents"),
            manifest,
            Path::new("docs"),
        );
        assert_eq!(desc.name, "agents");
        assert_eq!(desc.docs_path, PathBuf::from("/repo/packages/agents/docs"));
        // Self-reference dropped, extra depends normalised
        let deps: Vec<&str> = desc.dependencies.iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["core", "tools"]);
        assert!(!desc.is_root);
    }

    #[test]
    fn test_descriptor_falls_back_to_directory_name() {
        let desc = PackageDescriptor::from_manifest(
            Path::new("/repo/packages/Data_Utils"),
            PackageManifest::default(),
            Path::new("docs"),
        );
        assert_eq!(desc.name, "data-utils");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_normalize_is_idempotent_and_case_insensitive(name in generators::package_name()) {
            let once = normalize_name(&name);
            prop_assert_eq!(normalize_name(&once), once.clone());
            prop_assert_eq!(normalize_name(&name.to_uppercase().replace('-', "_")), once);
        }
    }
}
