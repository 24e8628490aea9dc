// src/dag/graph.rs

use std::collections::{BTreeMap, HashMap};

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde_json::Value;

use crate::errors::{AssetflowError, Result};

/// A named node with free-form metadata (e.g. `source = true`, `mtime`).
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    name: String,
    metadata: BTreeMap<String, Value>,
}

impl GraphNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.metadata
    }
}

/// Named-node graph with two-way parent/child links.
///
/// Used for exploratory dependency bookkeeping, e.g. remembering which
/// source files include which partials so a changed partial can be unlinked,
/// rescanned and relinked. Node names are unique; links form a set (linking
/// the same pair twice keeps one edge). Edges point parent -> child.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: StableDiGraph<GraphNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All nodes, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Add a node. Returns `false` (and leaves the existing node untouched)
    /// if a node with this name already exists.
    pub fn add(&mut self, name: &str, metadata: BTreeMap<String, Value>) -> bool {
        if self.index.contains_key(name) {
            return false;
        }
        let idx = self.graph.add_node(GraphNode {
            name: name.to_string(),
            metadata,
        });
        self.index.insert(name.to_string(), idx);
        true
    }

    /// Remove a node and every link touching it.
    pub fn remove(&mut self, name: &str) -> Result<GraphNode> {
        let idx = self.verify(name)?;
        self.index.remove(name);
        self.graph
            .remove_node(idx)
            .ok_or_else(|| AssetflowError::MissingNode(name.to_string()))
    }

    /// Link `parent` to `child`.
    pub fn link(&mut self, parent: &str, child: &str) -> Result<()> {
        let (p, c) = self.lookup(parent, child)?;
        self.graph.update_edge(p, c, ());
        Ok(())
    }

    /// Remove the link from `parent` to `child`, if any.
    pub fn unlink(&mut self, parent: &str, child: &str) -> Result<()> {
        let (p, c) = self.lookup(parent, child)?;
        if let Some(edge) = self.graph.find_edge(p, c) {
            self.graph.remove_edge(edge);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&GraphNode> {
        self.index.get(name).and_then(|idx| self.graph.node_weight(*idx))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut GraphNode> {
        let idx = *self.index.get(name)?;
        self.graph.node_weight_mut(idx)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names of the direct children of `name`, sorted.
    pub fn children_of(&self, name: &str) -> Result<Vec<&str>> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Names of the direct parents of `name`, sorted.
    pub fn parents_of(&self, name: &str) -> Result<Vec<&str>> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Result<Vec<&str>> {
        let idx = self.verify(name)?;
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(idx, dir)
            .filter_map(|n| self.graph.node_weight(n))
            .map(|n| n.name.as_str())
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    fn lookup(&self, parent: &str, child: &str) -> Result<(NodeIndex, NodeIndex)> {
        Ok((self.verify(parent)?, self.verify(child)?))
    }

    fn verify(&self, name: &str) -> Result<NodeIndex> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| AssetflowError::MissingNode(name.to_string()))
    }
}
