//! Internal dependency graph
//!
//! Maps each module to the set of workspace-internal modules it depends on.
//! A declared dependency becomes an edge only when its namespace is one of
//! the workspace's publishing namespaces AND its identifier names a known
//! module; everything else belongs to the external build tool and is dropped
//! here. Every discovered module appears as a node, isolated ones included,
//! so the scheduler can place them in level 0.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::registry::ModuleRegistry;
use crate::core::workspace::WorkspaceManifest;

/// Dependency graph over module names.
///
/// Edges point from a module to its prerequisites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module node with its internal dependencies
    pub fn add_module<I, S>(&mut self, name: &str, dependencies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.edges
            .entry(name.to_string())
            .or_default()
            .extend(dependencies.into_iter().map(Into::into));
    }

    /// Dependencies of a module; empty set for isolated modules
    pub fn dependencies_of(&self, name: &str) -> BTreeSet<String> {
        self.edges.get(name).cloned().unwrap_or_default()
    }

    /// Whether the graph contains a node
    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// All node names
    pub fn nodes(&self) -> Vec<String> {
        self.edges.keys().cloned().collect()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Total number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }
}

/// Derive the internal dependency graph from the registry.
///
/// Deterministic for a given registry: running it twice on the same
/// descriptor set yields an identical graph.
pub fn build_graph(registry: &ModuleRegistry, manifest: &WorkspaceManifest) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for module in registry.modules() {
        let internal: Vec<String> = module
            .declared_dependencies
            .iter()
            .filter(|dep| {
                manifest.is_internal_namespace(dep.namespace.as_deref())
                    && registry.contains(&dep.name)
            })
            .map(|dep| dep.name.clone())
            .collect();

        graph.add_module(&module.name, internal);
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::DeclaredDependency;
    use crate::core::registry::Module;
    use std::path::PathBuf;

    fn manifest() -> WorkspaceManifest {
        WorkspaceManifest::from_toml(
            r#"
[workspace]
name = "demo"
group = "com.example"
js_scope = "@example"
"#,
        )
        .unwrap()
    }

    fn module(name: &str, deps: &[(&str, Option<&str>)]) -> Module {
        Module {
            name: name.to_string(),
            path: PathBuf::from(name),
            group_id: Some("com.example".to_string()),
            version: Some("1.0.0".to_string()),
            declared_dependencies: deps
                .iter()
                .map(|(n, ns)| DeclaredDependency {
                    namespace: ns.map(String::from),
                    name: (*n).to_string(),
                })
                .collect(),
            has_pom: true,
            has_package_json: false,
            parsed: true,
        }
    }

    fn registry_of(modules: Vec<Module>) -> ModuleRegistry {
        ModuleRegistry::from_modules(modules)
    }

    #[test]
    fn test_internal_edges_only() {
        let registry = registry_of(vec![
            module("core", &[]),
            module(
                "api",
                &[
                    ("core", Some("com.example")),
                    ("spring-boot-starter", Some("org.springframework.boot")),
                ],
            ),
        ]);

        let graph = build_graph(&registry, &manifest());
        assert_eq!(graph.dependencies_of("core").len(), 0);
        let api_deps = graph.dependencies_of("api");
        assert_eq!(api_deps.len(), 1);
        assert!(api_deps.contains("core"));
    }

    #[test]
    fn test_unknown_identifier_dropped_even_with_internal_namespace() {
        let registry = registry_of(vec![module(
            "api",
            &[("not-in-workspace", Some("com.example"))],
        )]);

        let graph = build_graph(&registry, &manifest());
        assert!(graph.dependencies_of("api").is_empty());
    }

    #[test]
    fn test_isolated_module_still_gets_node() {
        let registry = registry_of(vec![module("loner", &[])]);
        let graph = build_graph(&registry, &manifest());
        assert!(graph.contains("loner"));
        assert!(graph.dependencies_of("loner").is_empty());
    }

    #[test]
    fn test_js_scope_edges() {
        let registry = registry_of(vec![
            module("ui", &[]),
            module("web", &[("ui", Some("@example")), ("react", None)]),
        ]);

        let graph = build_graph(&registry, &manifest());
        let deps = graph.dependencies_of("web");
        assert_eq!(deps.len(), 1);
        assert!(deps.contains("ui"));
    }

    #[test]
    fn test_graph_construction_is_idempotent() {
        let registry = registry_of(vec![
            module("a", &[]),
            module("b", &[("a", Some("com.example"))]),
            module("c", &[("a", Some("com.example")), ("b", Some("com.example"))]),
        ]);

        let first = build_graph(&registry, &manifest());
        let second = build_graph(&registry, &manifest());
        assert_eq!(first, second);
        assert_eq!(first.edge_count(), 3);
    }
}
