//! Module dependency tree.
//!
//! A directed multigraph over module directories, populated by the importer
//! and consulted by [`crate::Store::delete`] to decide whether a module may
//! be garbage-collected.

use rustc_hash::FxHashMap;

/// One module directory and the directories it imports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyNode {
    pub name: String,
    /// Outgoing edges. Duplicates are allowed: two files of a module may
    /// import the same dependency.
    pub dependencies: Vec<String>,
}

impl DependencyNode {
    pub fn all_dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// The graph itself, keyed by module directory.
#[derive(Debug, Default)]
pub struct DependencyTree {
    nodes: FxHashMap<String, DependencyNode>,
}

impl DependencyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get or create the node for a directory.
    pub fn add_node(&mut self, name: &str) -> &mut DependencyNode {
        self.nodes
            .entry(name.to_string())
            .or_insert_with(|| DependencyNode {
                name: name.to_string(),
                dependencies: Vec::new(),
            })
    }

    /// Record that `from` imports `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        self.add_node(to);
        self.add_node(from).dependencies.push(to.to_string());
    }

    pub fn get_node(&self, name: &str) -> Option<&DependencyNode> {
        self.nodes.get(name)
    }

    /// Whether any module outside `excluded` still imports `name`.
    pub fn has_dependents(&self, name: &str, excluded: &[&str]) -> bool {
        self.nodes.values().any(|node| {
            node.name != name
                && !excluded.contains(&node.name.as_str())
                && node.dependencies.iter().any(|dep| dep == name)
        })
    }

    pub fn delete(&mut self, name: &str) {
        self.nodes.remove(name);
    }
}
