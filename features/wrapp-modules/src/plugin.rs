use crate::{
    graph::{
        edge::Edge,
        node::{ModuleNode, Node, ProviderNode},
        DependencyGraph,
    },
    types::Token,
};

/// Hooks into graph construction
///
/// Every `on_*` hook receives an element before it is stored and returns the
/// element to store in its place. Tokens should be kept, the builder tracks
/// modules and providers by the tokens it analyzed.
pub trait GraphPlugin: Send {
    fn on_module_node(&mut self, node: ModuleNode) -> ModuleNode {
        node
    }

    fn on_import_edge(&mut self, edge: Edge) -> Edge {
        edge
    }

    fn on_provider_node(&mut self, node: ProviderNode) -> ProviderNode {
        node
    }

    /// Runs before the unreached error is decided, so the flag may be changed here
    fn on_dependency_edge(&mut self, edge: Edge) -> Edge {
        edge
    }

    /// Runs after a module, its imports and its providers were stored
    fn after_module(&mut self, module: &ModuleNode, graph: &mut GraphMutator<'_>) {
        let _ = (module, graph);
    }
}

/// Write access to the graph under construction
///
/// Stored elements are kept as they are: dependencies of an inserted provider
/// node are not analyzed, add its dependency edges explicitly.
pub struct GraphMutator<'a> {
    graph: &'a mut DependencyGraph,
}

impl<'a> GraphMutator<'a> {
    pub(crate) fn new(graph: &'a mut DependencyGraph) -> Self {
        GraphMutator { graph }
    }

    /// Returns false if a node with the same token already exists
    pub fn add_node(&mut self, node: Node) -> bool {
        self.graph.add_node(node)
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.graph.add_edge(edge)
    }

    pub fn get_node(&self, token: &Token) -> Option<&Node> {
        self.graph.get_node(token)
    }

    pub fn get_edge(&self, token: &Token) -> Vec<&Edge> {
        self.graph.get_edge(token)
    }
}
