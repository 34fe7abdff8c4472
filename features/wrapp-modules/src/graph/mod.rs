//! The compiled node/edge graph of an application
//!
//! Nodes live in a flat arena keyed by token, every relation is an [Edge]
//! between two tokens. Nothing holds a direct reference to another node, so
//! cyclic declarations are just cyclic edges.

use std::collections::HashMap;

use crate::{
    declarations::ModuleDeclaration,
    errors::{GraphError, GraphErrors},
    types::Token,
};

pub mod builder;
pub(crate) mod cycles;
pub mod edge;
pub mod node;
pub mod reachability;

pub use builder::GraphBuilder;
use edge::Edge;
use node::{ModuleNode, Node, ProviderNode};

/// Graph of the entire application
///
/// Built once per root module by [GraphBuilder::compile]. Validity problems
/// are collected in [DependencyGraph::errors] instead of failing the build.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    root: Option<Token>,
    nodes: Vec<Node>,
    node_index: HashMap<Token, usize>,
    edges: Vec<Edge>,
    edges_by_source: HashMap<Token, Vec<usize>>,
    errors: Vec<GraphError>,
}

impl DependencyGraph {
    pub fn builder(root: impl Into<ModuleDeclaration>) -> GraphBuilder {
        GraphBuilder::new(root)
    }

    /// Compiles the graph of `root` without plugins
    pub async fn compile(root: impl Into<ModuleDeclaration>) -> Self {
        GraphBuilder::new(root).compile().await
    }

    /// Token of the root module
    pub fn root(&self) -> Option<&Token> {
        self.root.as_ref()
    }

    pub fn get_node(&self, token: &Token) -> Option<&Node> {
        self.node_index.get(token).map(|&index| &self.nodes[index])
    }

    /// All edges starting at `token`, in insertion order
    pub fn get_edge(&self, token: &Token) -> Vec<&Edge> {
        self.edges_by_source
            .get(token)
            .map(|indices| indices.iter().map(|&index| &self.edges[index]).collect())
            .unwrap_or_default()
    }

    pub fn get_all_nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get_all_edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn errors(&self) -> &[GraphError] {
        &self.errors
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), GraphErrors> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(GraphErrors {
            errors: self.errors.clone(),
        })
    }

    pub fn provider(&self, token: &Token) -> Option<&ProviderNode> {
        self.get_node(token).and_then(Node::as_provider)
    }

    pub fn module(&self, token: &Token) -> Option<&ModuleNode> {
        self.get_node(token).and_then(Node::as_module)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleNode> {
        self.nodes.iter().filter_map(Node::as_module)
    }

    pub fn providers(&self) -> impl Iterator<Item = &ProviderNode> {
        self.nodes.iter().filter_map(Node::as_provider)
    }

    /// Stores a node, returns false if its token is already taken
    pub(crate) fn add_node(&mut self, node: Node) -> bool {
        if self.node_index.contains_key(node.id()) {
            return false;
        }
        self.node_index.insert(node.id().clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    pub(crate) fn add_edge(&mut self, edge: Edge) {
        self.edges_by_source
            .entry(edge.source.clone())
            .or_default()
            .push(self.edges.len());
        self.edges.push(edge);
    }
}
