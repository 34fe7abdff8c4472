use std::collections::{HashMap, HashSet};

use crate::{
    errors::GraphError,
    graph::{edge::EdgeKind, DependencyGraph},
    types::Token,
};

/// Outgoing (target, edge index) pairs per token
type Adjacency = HashMap<Token, Vec<(Token, usize)>>;

/// Nodes and edges of one detected cycle, in cycle order
struct Cycle {
    nodes: Vec<Token>,
    edges: Vec<usize>,
}

/// Depth first search with a recursion stack
///
/// Every edge back onto the stack closes a cycle. Fully explored nodes are
/// never re-entered, so each back edge is reported exactly once.
struct CycleSearch<'a> {
    adjacency: &'a Adjacency,
    visited: HashSet<Token>,
    on_stack: HashSet<Token>,
    path: Vec<Token>,
    /// `path_edges[i]` leads from `path[i]` to `path[i + 1]`
    path_edges: Vec<usize>,
    cycles: Vec<Cycle>,
}

impl<'a> CycleSearch<'a> {
    fn new(adjacency: &'a Adjacency) -> Self {
        CycleSearch {
            adjacency,
            visited: HashSet::new(),
            on_stack: HashSet::new(),
            path: Vec::new(),
            path_edges: Vec::new(),
            cycles: Vec::new(),
        }
    }

    fn visit(&mut self, token: &Token) {
        if !self.visited.insert(token.clone()) {
            return;
        }
        self.on_stack.insert(token.clone());
        self.path.push(token.clone());

        let adjacency = self.adjacency;
        for (target, edge) in adjacency.get(token).into_iter().flatten() {
            if self.on_stack.contains(target) {
                let start = self.path.iter().position(|t| t == target).unwrap_or(0);
                let mut edges = self.path_edges[start..].to_vec();
                edges.push(*edge);
                self.cycles.push(Cycle {
                    nodes: self.path[start..].to_vec(),
                    edges,
                });
            } else if !self.visited.contains(target) {
                self.path_edges.push(*edge);
                self.visit(target);
                self.path_edges.pop();
            }
        }

        self.path.pop();
        self.on_stack.remove(token);
    }
}

/// Marks circular provider dependency edges and reports `CD_PROVIDERS`
pub(crate) fn detect_provider_cycles(graph: &mut DependencyGraph) {
    let mut adjacency = Adjacency::new();
    for (index, edge) in graph.edges.iter().enumerate() {
        if matches!(edge.kind, EdgeKind::Dependency(_)) && graph.provider(&edge.target).is_some() {
            adjacency
                .entry(edge.source.clone())
                .or_default()
                .push((edge.target.clone(), index));
        }
    }

    let providers: Vec<Token> = graph.providers().map(|provider| provider.id.clone()).collect();
    let mut search = CycleSearch::new(&adjacency);
    for provider in &providers {
        search.visit(provider);
    }

    for cycle in search.cycles {
        let path = cycle
            .edges
            .iter()
            .map(|&index| {
                let edge = &mut graph.edges[index];
                edge.circular = true;
                (edge.source.clone(), edge.target.clone())
            })
            .collect::<Vec<_>>();
        tracing::debug!("Circular provider dependency: {path:?}");
        graph.errors.push(GraphError::CircularProviders { path });
    }
}

/// Marks circular import edges and reports `CD_IMPORTS` with module labels
pub(crate) fn detect_import_cycles(graph: &mut DependencyGraph) {
    // Import edges point from the imported module to the importer, walk them backwards
    let mut adjacency = Adjacency::new();
    for (index, edge) in graph.edges.iter().enumerate() {
        if edge.is_import() {
            adjacency
                .entry(edge.target.clone())
                .or_default()
                .push((edge.source.clone(), index));
        }
    }

    let modules: Vec<Token> = graph.modules().map(|module| module.id.clone()).collect();
    let mut search = CycleSearch::new(&adjacency);
    for module in &modules {
        search.visit(module);
    }

    for cycle in search.cycles {
        for &index in &cycle.edges {
            graph.edges[index].circular = true;
        }
        let path = cycle
            .nodes
            .iter()
            .map(|token| match graph.get_node(token) {
                Some(node) => node.label().to_string(),
                None => token.label(),
            })
            .collect::<Vec<_>>();
        tracing::debug!("Circular import: {}", path.join(" -> "));
        graph.errors.push(GraphError::CircularImports { path });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &'static str) -> Token {
        Token::named(name)
    }

    #[test]
    fn every_back_edge_closes_one_cycle() {
        // a <-> b and b <-> c share b
        let mut adjacency = Adjacency::new();
        adjacency.insert(t("a"), vec![(t("b"), 0)]);
        adjacency.insert(t("b"), vec![(t("a"), 1), (t("c"), 2)]);
        adjacency.insert(t("c"), vec![(t("b"), 3)]);

        let mut search = CycleSearch::new(&adjacency);
        for node in ["a", "b", "c"] {
            search.visit(&t(node));
        }

        let cycles = search
            .cycles
            .iter()
            .map(|cycle| (cycle.nodes.clone(), cycle.edges.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            cycles,
            vec![
                (vec![t("a"), t("b")], vec![0, 1]),
                (vec![t("b"), t("c")], vec![2, 3]),
            ]
        );
    }

    #[test]
    fn acyclic_graph_reports_nothing() {
        let mut adjacency = Adjacency::new();
        adjacency.insert(t("a"), vec![(t("b"), 0), (t("c"), 1)]);
        adjacency.insert(t("b"), vec![(t("c"), 2)]);

        let mut search = CycleSearch::new(&adjacency);
        search.visit(&t("a"));
        assert!(search.cycles.is_empty());
    }
}
