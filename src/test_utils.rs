//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a valid package name (lowercase alphanumeric with hyphens)
    pub fn package_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,30}[a-z0-9]?".prop_filter("Name must not be empty", |s| !s.is_empty())
    }

    /// Generate an acyclic dependency graph with up to `max` packages
    ///
    /// Package `i` may only depend on packages with a lower index, plus an
    /// occasional dependency outside the set.
    pub fn acyclic_graph(max: usize) -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
        (1..=max)
            .prop_flat_map(|n| {
                let names: Vec<String> = (0..n).map(|i| format!("pkg-{i}")).collect();
                let deps = (0..n)
                    .map(|i| {
                        proptest::collection::vec(0..=i, 0..=3)
                            .prop_map(move |picks| {
                                picks
                                    .into_iter()
                                    .map(|p| {
                                        if p == i {
                                            "external-lib".to_string()
                                        } else {
                                            format!("pkg-{p}")
                                        }
                                    })
                                    .collect::<Vec<_>>()
                            })
                    })
                    .collect::<Vec<_>>();
                (Just(names), deps)
            })
            .prop_map(|(names, deps)| names.into_iter().zip(deps).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_package_name_generator(name in package_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }

        #[test]
        fn test_acyclic_graph_only_points_backwards(graph in acyclic_graph(10)) {
            for (index, (_, deps)) in graph.iter().enumerate() {
                for dep in deps {
                    if let Some(n) = dep.strip_prefix("pkg-") {
                        prop_assert!(n.parse::<usize>().unwrap() < index);
                    }
                }
            }
        }
    }
}
