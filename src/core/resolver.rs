//! Dependency resolution
//!
//! Computes the build order for discovered packages and detects cycles.
//! Only edges between discovered packages count; dependencies on anything
//! outside the workspace are ignored for ordering.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::core::package::PackageDescriptor;
use crate::error::ResolverError;

/// Dependency graph for packages
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Adjacency list: package -> in-graph dependencies
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from discovered packages
    pub fn from_packages(packages: &[PackageDescriptor]) -> Self {
        let mut graph = Self::new();
        for package in packages {
            graph.add_package(&package.name, package.dependencies.iter().cloned());
        }
        graph
    }

    /// Add a package to the graph
    ///
    /// Dependencies that never get added as packages are ignored by
    /// [`Self::topological_sort`].
    pub fn add_package(&mut self, name: &str, dependencies: impl IntoIterator<Item = String>) {
        self.edges
            .entry(name.to_string())
            .or_default()
            .extend(dependencies.into_iter().filter(|d| d != name));
    }

    /// In-graph dependencies of a package
    fn internal_dependencies<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a String> + 'a {
        self.edges
            .get(name)
            .into_iter()
            .flatten()
            .filter(move |dep| self.edges.contains_key(dep.as_str()))
    }

    /// Compute topological sort (build order)
    ///
    /// Kahn's algorithm; among packages that are ready at the same step the
    /// alphabetically first is emitted first, so the order is deterministic.
    pub fn topological_sort(&self) -> Result<Vec<String>, ResolverError> {
        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for (name, deps) in &self.edges {
            in_degree.entry(name.as_str()).or_insert(0);
            for dep in deps {
                if !self.edges.contains_key(dep) {
                    tracing::debug!("Ignoring external dependency '{dep}' of '{name}'");
                    continue;
                }
                *in_degree.entry(name.as_str()).or_insert(0) += 1;
                dependents.entry(dep.as_str()).or_default().push(name.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(&name, _)| name)
            .collect();
        let mut order = Vec::with_capacity(self.edges.len());

        while let Some(name) = ready.pop_first() {
            order.push(name.to_string());
            for &dependent in dependents.get(name).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() < self.edges.len() {
            let emitted: HashSet<&str> = order.iter().map(String::as_str).collect();
            return Err(ResolverError::CircularDependency {
                cycle: self.find_cycle(&emitted),
            });
        }

        Ok(order)
    }

    /// Walk dependency edges among the packages Kahn's algorithm could not
    /// emit until a package repeats; the repeated segment is a cycle.
    ///
    /// Every remaining package has at least one remaining dependency, so the
    /// walk always closes.
    fn find_cycle(&self, emitted: &HashSet<&str>) -> Vec<String> {
        let remaining = |name: &str| !emitted.contains(name);

        let Some(start) = self.edges.keys().find(|n| remaining(n.as_str())) else {
            return Vec::new();
        };

        let mut path: Vec<&str> = Vec::new();
        let mut position: HashMap<&str, usize> = HashMap::new();
        let mut current = start.as_str();

        loop {
            if let Some(&index) = position.get(current) {
                return path[index..].iter().map(|s| (*s).to_string()).collect();
            }
            position.insert(current, path.len());
            path.push(current);

            match self.internal_dependencies(current).find(|d| remaining(d.as_str())) {
                Some(next) => current = next.as_str(),
                None => return path.iter().map(|s| (*s).to_string()).collect(),
            }
        }
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        self.topological_sort().is_err()
    }
}

/// Packages in build order
///
/// Every package appears after all of its in-plan dependencies.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    ordered_packages: Vec<PackageDescriptor>,
    /// In-plan dependencies per package
    dependencies: HashMap<String, Vec<String>>,
}

impl BuildPlan {
    /// Resolve the build order for a set of packages
    pub fn resolve(packages: Vec<PackageDescriptor>) -> Result<Self, ResolverError> {
        let graph = DependencyGraph::from_packages(&packages);
        let order = graph.topological_sort()?;

        let mut by_name: HashMap<String, PackageDescriptor> = packages
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();

        let dependencies = order
            .iter()
            .map(|name| {
                let deps = graph.internal_dependencies(name).cloned().collect();
                (name.clone(), deps)
            })
            .collect();

        let ordered_packages = order
            .iter()
            .filter_map(|name| by_name.remove(name))
            .collect();

        Ok(Self {
            ordered_packages,
            dependencies,
        })
    }

    /// Packages in build order
    pub fn packages(&self) -> &[PackageDescriptor] {
        &self.ordered_packages
    }

    /// Package names in build order
    pub fn names(&self) -> Vec<String> {
        self.ordered_packages.iter().map(|p| p.name.clone()).collect()
    }

    /// Number of packages in the plan
    pub fn len(&self) -> usize {
        self.ordered_packages.len()
    }

    /// Whether the plan is empty
    pub fn is_empty(&self) -> bool {
        self.ordered_packages.is_empty()
    }

    /// Look up a package by name
    pub fn get(&self, name: &str) -> Option<&PackageDescriptor> {
        self.ordered_packages.iter().find(|p| p.name == name)
    }

    /// In-plan dependencies of a package
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.dependencies
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Restrict the plan to the named packages and their dependency closure
    ///
    /// Plan order is preserved.
    pub fn restrict_to(&self, names: &[String]) -> Result<Self, ResolverError> {
        let mut keep: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();

        for name in names {
            if self.get(name).is_none() {
                return Err(ResolverError::UnknownPackage { name: name.clone() });
            }
            stack.push(name);
        }

        while let Some(name) = stack.pop() {
            if keep.insert(name) {
                stack.extend(self.dependencies_of(name).iter().map(String::as_str));
            }
        }

        let ordered_packages: Vec<PackageDescriptor> = self
            .ordered_packages
            .iter()
            .filter(|p| keep.contains(p.name.as_str()))
            .cloned()
            .collect();

        let dependencies = ordered_packages
            .iter()
            .map(|p| (p.name.clone(), self.dependencies_of(&p.name).to_vec()))
            .collect();

        Ok(Self {
            ordered_packages,
            dependencies,
        })
    }
}
