//! Level scheduling
//!
//! Decomposes the dependency graph into build levels: every module in level
//! N has all of its in-set dependencies satisfied by levels < N, and sits at
//! the earliest level its dependencies allow, which maximizes the
//! parallelism available to the executor. Dependencies outside the requested
//! build set count as already satisfied.
//!
//! A cycle among the remaining modules does not abort the run: the scheduler
//! emits one warning and places everything still unleveled into a single
//! final level, leaving ordering inside that level to the external build
//! tool's own reactor.

use std::collections::BTreeSet;

use crate::core::graph::DependencyGraph;

/// One build level: modules safe to build concurrently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLevel {
    /// Module names in this level, in requested order
    pub modules: Vec<String>,
}

impl BuildLevel {
    /// Number of modules in the level
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the level is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Compute the level decomposition for the requested modules.
///
/// Within a level, module order follows the `requested` order; it carries no
/// scheduling meaning since the level runs concurrently.
pub fn compute_levels(requested: &[String], graph: &DependencyGraph) -> Vec<BuildLevel> {
    let requested_set: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
    let mut leveled: BTreeSet<&str> = BTreeSet::new();
    let mut remaining: Vec<&str> = requested.iter().map(String::as_str).collect();
    let mut levels = Vec::new();

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<&str>, Vec<&str>) = remaining.into_iter().partition(|name| {
            graph
                .dependencies_of(name)
                .iter()
                .filter(|dep| requested_set.contains(dep.as_str()))
                .all(|dep| leveled.contains(dep.as_str()))
        });

        if ready.is_empty() {
            // Cycle among the remaining modules; fail soft into one final
            // level rather than aborting or looping
            tracing::warn!(
                "Dependency cycle detected among: {}. Building them in one combined level.",
                blocked.join(", ")
            );
            levels.push(BuildLevel {
                modules: blocked.iter().map(|s| (*s).to_string()).collect(),
            });
            break;
        }

        leveled.extend(ready.iter().copied());
        levels.push(BuildLevel {
            modules: ready.iter().map(|s| (*s).to_string()).collect(),
        });
        remaining = blocked;
    }

    levels
}

/// Level index of each module, for reporting
pub fn level_of(levels: &[BuildLevel], name: &str) -> Option<usize> {
    levels
        .iter()
        .position(|level| level.modules.iter().any(|m| m == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::generators;
    use proptest::prelude::*;

    fn graph_of(edges: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (name, deps) in edges {
            graph.add_module(name, deps.iter().map(|d| (*d).to_string()));
        }
        graph
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_linear_chain() {
        let graph = graph_of(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
        let levels = compute_levels(&names(&["a", "b", "c"]), &graph);

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].modules, vec!["a"]);
        assert_eq!(levels[1].modules, vec!["b"]);
        assert_eq!(levels[2].modules, vec!["c"]);
    }

    #[test]
    fn test_diamond() {
        let graph = graph_of(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["a"]),
            ("d", &["b", "c"]),
        ]);
        let levels = compute_levels(&names(&["a", "b", "c", "d"]), &graph);

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].modules, vec!["a"]);
        assert_eq!(levels[1].modules, vec!["b", "c"]);
        assert_eq!(levels[2].modules, vec!["d"]);
    }

    #[test]
    fn test_two_cycle_lands_in_one_final_level() {
        let graph = graph_of(&[("a", &["b"]), ("b", &["a"])]);
        let levels = compute_levels(&names(&["a", "b"]), &graph);

        // Not an infinite loop, not a silent drop: both together, once
        assert_eq!(levels.len(), 1);
        let mut modules = levels[0].modules.clone();
        modules.sort();
        assert_eq!(modules, vec!["a", "b"]);
    }

    #[test]
    fn test_cycle_after_clean_prefix() {
        let graph = graph_of(&[
            ("base", &[]),
            ("x", &["base", "y"]),
            ("y", &["x"]),
        ]);
        let levels = compute_levels(&names(&["base", "x", "y"]), &graph);

        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].modules, vec!["base"]);
        assert_eq!(levels[1].len(), 2);
    }

    #[test]
    fn test_dependency_outside_requested_set_is_satisfied() {
        let graph = graph_of(&[("a", &[]), ("b", &["a"])]);
        // Only b requested; its dependency on a counts as satisfied
        let levels = compute_levels(&names(&["b"]), &graph);

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].modules, vec!["b"]);
    }

    #[test]
    fn test_isolated_modules_fill_level_zero() {
        let graph = graph_of(&[("a", &[]), ("b", &[]), ("c", &["a"])]);
        let levels = compute_levels(&names(&["a", "b", "c"]), &graph);

        assert_eq!(levels[0].modules, vec!["a", "b"]);
        assert_eq!(levels[1].modules, vec!["c"]);
    }

    #[test]
    fn test_empty_request() {
        let graph = graph_of(&[("a", &[])]);
        assert!(compute_levels(&[], &graph).is_empty());
    }

    #[test]
    fn test_level_of() {
        let graph = graph_of(&[("a", &[]), ("b", &["a"])]);
        let levels = compute_levels(&names(&["a", "b"]), &graph);
        assert_eq!(level_of(&levels, "a"), Some(0));
        assert_eq!(level_of(&levels, "b"), Some(1));
        assert_eq!(level_of(&levels, "zzz"), None);
    }

    /// Random DAG: modules 0..n, each depending on a subset of
    /// lower-numbered modules (acyclic by construction)
    fn dag_strategy() -> impl Strategy<Value = (Vec<String>, DependencyGraph)> {
        (2usize..12).prop_flat_map(|n| {
            let names: Vec<String> = (0..n).map(|i| format!("m{i}")).collect();
            let deps = proptest::collection::vec(proptest::collection::vec(any::<bool>(), n), n);
            (Just(names), deps).prop_map(|(names, matrix)| {
                let mut graph = DependencyGraph::new();
                for (i, name) in names.iter().enumerate() {
                    let deps: Vec<String> = (0..i)
                        .filter(|j| matrix[i][*j])
                        .map(|j| names[j].clone())
                        .collect();
                    graph.add_module(name, deps);
                }
                (names, graph)
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(crate::config::defaults::MIN_PROPTEST_ITERATIONS))]

        /// Levels cover exactly the requested set, no duplicates
        #[test]
        fn prop_levels_cover_requested_set((names, graph) in dag_strategy()) {
            let levels = compute_levels(&names, &graph);

            let mut seen = std::collections::BTreeSet::new();
            for level in &levels {
                for module in &level.modules {
                    prop_assert!(seen.insert(module.clone()), "module appears twice: {module}");
                }
            }
            let requested: std::collections::BTreeSet<String> = names.iter().cloned().collect();
            prop_assert_eq!(seen, requested);
        }

        /// Every in-set dependency sits in a strictly earlier level
        #[test]
        fn prop_dependency_ordering((names, graph) in dag_strategy()) {
            let levels = compute_levels(&names, &graph);

            for name in &names {
                let module_level = level_of(&levels, name).unwrap();
                for dep in graph.dependencies_of(name) {
                    let dep_level = level_of(&levels, &dep).unwrap();
                    prop_assert!(
                        dep_level < module_level,
                        "level({dep})={dep_level} not < level({name})={module_level}"
                    );
                }
            }
        }

        /// Modules without dependencies always land in level 0
        #[test]
        fn prop_isolated_modules_in_level_zero((names, graph) in dag_strategy()) {
            let levels = compute_levels(&names, &graph);

            for name in &names {
                if graph.dependencies_of(name).is_empty() {
                    prop_assert_eq!(level_of(&levels, name), Some(0));
                }
            }
        }

        /// Terminates on arbitrary (possibly cyclic) edge sets and still
        /// covers every requested module exactly once
        #[test]
        fn prop_terminates_on_cycles(
            n in 2usize..8,
            edges in proptest::collection::vec((0usize..8, 0usize..8), 0..16),
        ) {
            let names: Vec<String> = (0..n).map(|i| format!("m{i}")).collect();
            let mut graph = DependencyGraph::new();
            for name in &names {
                graph.add_module(name, Vec::<String>::new());
            }
            for (from, to) in edges {
                if from < n && to < n {
                    graph.add_module(&names[from], [names[to].clone()]);
                }
            }

            let levels = compute_levels(&names, &graph);
            let total: usize = levels.iter().map(BuildLevel::len).sum();
            prop_assert_eq!(total, n);
        }

        /// Scheduling is deterministic
        #[test]
        fn prop_deterministic((names, graph) in dag_strategy()) {
            let first = compute_levels(&names, &graph);
            let second = compute_levels(&names, &graph);
            prop_assert_eq!(first, second);
        }

        /// Generator sanity: module names stay well-formed
        #[test]
        fn prop_module_name_generator(name in generators::module_name()) {
            prop_assert!(!name.is_empty());
        }
    }
}
