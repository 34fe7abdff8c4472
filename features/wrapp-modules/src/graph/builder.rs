use std::collections::{HashSet, VecDeque};

use crate::{
    analyzer::{ModuleAnalyzer, ProviderAnalyzer},
    declarations::{ModuleDeclaration, Provider},
    errors::GraphError,
    graph::{cycles, node::Node, reachability::ExportTable, DependencyGraph},
    plugin::{GraphMutator, GraphPlugin},
    registry::ModuleRegistry,
    types::Token,
};

/// Builds the [DependencyGraph] of a root module
///
/// The build consists of three parts.
/// 1. A breadth first walk over the imports, adding module and provider nodes
/// 2. Dependency edges, checked against the export visibility of each module
/// 3. Cycle detection over imports and provider dependencies
pub struct GraphBuilder {
    root: ModuleDeclaration,
    plugins: Vec<Box<dyn GraphPlugin>>,
}

impl GraphBuilder {
    pub fn new(root: impl Into<ModuleDeclaration>) -> Self {
        GraphBuilder {
            root: root.into(),
            plugins: Vec::new(),
        }
    }

    /// Plugins run in registration order
    pub fn plugin(mut self, plugin: impl GraphPlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub async fn compile(mut self) -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        let mut registry = ModuleRegistry::new();
        let mut exports = ExportTable::new();
        let mut providers = Vec::new();

        let root = ModuleAnalyzer::analyze(&mut registry, &self.root).await;
        tracing::debug!("Compiling module graph of {}", root.label());
        graph.root = Some(root.id().clone());

        // Visited set only keeps the walk finite, import cycles are detected later
        let mut visited = HashSet::from([root.id().clone()]);
        let mut queue = VecDeque::from([root]);

        while let Some(module) = queue.pop_front() {
            let node = self
                .plugins
                .iter_mut()
                .fold(module.node(), |node, plugin| plugin.on_module_node(node));

            if node.global {
                tracing::debug!("Registering global module {}", node.label);
            }
            exports.add_module(
                module.id().clone(),
                Token::Type(module.class()),
                module.providers().iter().map(Provider::token),
                module.exports().iter().cloned(),
                node.global,
            );
            if !graph.add_node(Node::Module(node.clone())) {
                tracing::warn!("Token of module {} is already used by a provider", node.label);
            }

            for child in module.imports(&mut registry).await {
                let edge = self
                    .plugins
                    .iter_mut()
                    .fold(module.import_edge(&child), |edge, plugin| plugin.on_import_edge(edge));
                exports.add_import(module.id(), child.id().clone());
                graph.add_edge(edge);

                if visited.insert(child.id().clone()) {
                    queue.push_back(child);
                }
            }

            for provider in module.providers() {
                let analyzer = ProviderAnalyzer::analyze(provider, module.id());
                let provider_node = self
                    .plugins
                    .iter_mut()
                    .fold(analyzer.node(), |node, plugin| plugin.on_provider_node(node));

                if graph.add_node(Node::Provider(provider_node)) {
                    graph.add_edge(analyzer.ownership_edge());
                    providers.push(analyzer);
                } else {
                    tracing::warn!(
                        "Provider '{}' in {} is already registered, keeping the first declaration",
                        analyzer.token(),
                        module.label()
                    );
                }
            }

            let mut mutator = GraphMutator::new(&mut graph);
            for plugin in &mut self.plugins {
                plugin.after_module(&node, &mut mutator);
            }
        }

        for provider in &providers {
            add_dependency_edges(&mut graph, &exports, &mut self.plugins, provider);
        }

        for path in registry.take_deferred_cycles() {
            graph.errors.push(GraphError::CircularImports { path });
        }
        cycles::detect_provider_cycles(&mut graph);
        cycles::detect_import_cycles(&mut graph);

        tracing::debug!(
            "Compiled module graph with {} nodes, {} edges and {} errors",
            graph.nodes.len(),
            graph.edges.len(),
            graph.errors.len()
        );
        graph
    }
}

fn add_dependency_edges(
    graph: &mut DependencyGraph,
    exports: &ExportTable,
    plugins: &mut [Box<dyn GraphPlugin>],
    provider: &ProviderAnalyzer,
) {
    for dependency in provider.dependencies() {
        let unreached = !exports.is_reachable(&dependency.token, provider.module());
        let edge = plugins.iter_mut().fold(
            provider.dependency_edge(&dependency, unreached),
            |edge, plugin| plugin.on_dependency_edge(edge),
        );

        if let Some(stored) = edge.as_dependency() {
            if stored.unreached && !stored.optional {
                tracing::debug!(
                    "'{}' can not reach '{}' from {}",
                    provider.token(),
                    dependency.token,
                    provider.module()
                );
                graph.errors.push(GraphError::UnreachedDependency {
                    kind: dependency.site,
                    provider: provider.token().clone(),
                    dependency: dependency.token.clone(),
                    module: provider.module().clone(),
                    key: stored.key.clone(),
                });
            }
        }
        graph.add_edge(edge);
    }
}
