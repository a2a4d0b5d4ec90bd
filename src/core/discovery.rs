//! Package discovery
//!
//! Scans one level of subdirectories of the packages directory for
//! documentable packages: directories holding both the manifest file and a
//! documentation source directory. Nested packages are not discovered.
//!
//! Discovery is read-only.

use std::collections::BTreeMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::core::config::WorkspaceLayout;
use crate::core::package::{validate_name, PackageDescriptor, PackageManifest};
use crate::error::ConfigError;

/// Finds packages in a workspace layout
#[derive(Debug)]
pub struct PackageDiscoverer<'a> {
    layout: &'a WorkspaceLayout,
}

impl<'a> PackageDiscoverer<'a> {
    /// Create a discoverer for a layout
    pub fn new(layout: &'a WorkspaceLayout) -> Self {
        Self { layout }
    }

    /// Discover packages, returned in name order
    ///
    /// Fails if the root or an explicitly configured packages directory is
    /// missing, if a manifest cannot be parsed, or if two directories
    /// declare the same package name.
    pub fn discover(&self) -> Result<Vec<PackageDescriptor>, ConfigError> {
        check_root(&self.layout.root)?;

        let packages_dir = &self.layout.packages_dir;
        if !packages_dir.is_dir() {
            return Err(ConfigError::PackagesDirNotFound {
                path: packages_dir.clone(),
            });
        }

        let mut found: BTreeMap<String, PackageDescriptor> = BTreeMap::new();

        let entries = WalkDir::new(packages_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::ReadError {
                path: e
                    .path()
                    .map_or_else(|| packages_dir.clone(), Path::to_path_buf),
                error: e.to_string(),
            })?;

            if !entry.file_type().is_dir() || self.is_ignored(entry.path()) {
                continue;
            }

            let Some(descriptor) = self.inspect(entry.path())? else {
                continue;
            };

            if let Some(existing) = found.get(&descriptor.name) {
                return Err(ConfigError::DuplicatePackage {
                    name: descriptor.name.clone(),
                    first: existing.root_path.clone(),
                    second: descriptor.root_path,
                });
            }

            tracing::debug!(
                "Discovered package '{}' at {}",
                descriptor.name,
                descriptor.root_path.display()
            );
            found.insert(descriptor.name.clone(), descriptor);
        }

        tracing::info!(
            "Discovered {} packages in {}",
            found.len(),
            packages_dir.display()
        );

        Ok(found.into_values().collect())
    }

    /// Build the root documentation entry, if the root has a docs directory
    pub fn root_entry(
        &self,
        packages: &[PackageDescriptor],
    ) -> Result<Option<PackageDescriptor>, ConfigError> {
        if !self.layout.root_docs_dir.is_dir() {
            tracing::debug!(
                "No root documentation at {}",
                self.layout.root_docs_dir.display()
            );
            return Ok(None);
        }

        let name = &self.layout.root_name;
        validate_name(name).map_err(|reason| ConfigError::InvalidPackageName {
            name: name.clone(),
            path: self.layout.root.clone(),
            reason: reason.to_string(),
        })?;
        if packages.iter().any(|p| &p.name == name) {
            return Err(ConfigError::RootNameCollision { name: name.clone() });
        }

        Ok(Some(PackageDescriptor::root(
            name,
            &self.layout.root,
            &self.layout.root_docs_dir,
            packages,
        )))
    }

    /// Hidden directories and the output tree are never packages
    fn is_ignored(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        hidden || self.layout.output_dir.starts_with(path)
    }

    fn inspect(&self, dir: &Path) -> Result<Option<PackageDescriptor>, ConfigError> {
        let manifest_path = dir.join(&self.layout.manifest);
        if !manifest_path.is_file() {
            tracing::debug!("Skipping {}: no {}", dir.display(), self.layout.manifest);
            return Ok(None);
        }

        let manifest = PackageManifest::load(&manifest_path)?;
        let descriptor = PackageDescriptor::from_manifest(dir, manifest, &self.layout.docs_dir);

        if !descriptor.docs_path.is_dir() {
            tracing::debug!(
                "Skipping {}: no documentation directory at {}",
                dir.display(),
                descriptor.docs_path.display()
            );
            return Ok(None);
        }

        validate_name(&descriptor.name).map_err(|reason| ConfigError::InvalidPackageName {
            name: descriptor.name.clone(),
            path: manifest_path.clone(),
            reason: reason.to_string(),
        })?;

        Ok(Some(descriptor))
    }
}

/// Fail unless the monorepo root is an existing directory
pub fn check_root(root: &Path) -> Result<(), ConfigError> {
    if !root.exists() {
        return Err(ConfigError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(ConfigError::RootNotDirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}
