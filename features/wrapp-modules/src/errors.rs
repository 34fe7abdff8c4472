use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{
    graph::edge::DependencyKey,
    types::{DynError, Token},
};

/// Which injection site an unreached dependency was declared at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnreachedKind {
    Constructor,
    Property,
    Factory,
}
impl UnreachedKind {
    pub fn code(&self) -> &'static str {
        match self {
            UnreachedKind::Constructor => "UNREACHED_DEP_CONSTRUCTOR",
            UnreachedKind::Property => "UNREACHED_DEP_PROPERTY",
            UnreachedKind::Factory => "UNREACHED_DEP_FACTORY",
        }
    }
}

/// A problem found while compiling the graph
///
/// These are collected on the graph, never returned from `compile`.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Circular import between modules: {}", .path.join(" -> "))]
    CircularImports { path: Vec<String> },
    #[error("Circular dependency between providers: {}", format_pairs(.path))]
    CircularProviders { path: Vec<(Token, Token)> },
    #[error("'{provider}' needs '{dependency}' at {key} which is not reachable from '{module}'")]
    UnreachedDependency {
        kind: UnreachedKind,
        provider: Token,
        dependency: Token,
        module: Token,
        key: DependencyKey,
    },
}
impl GraphError {
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::CircularImports { .. } => "CD_IMPORTS",
            GraphError::CircularProviders { .. } => "CD_PROVIDERS",
            GraphError::UnreachedDependency { kind, .. } => kind.code(),
        }
    }
}

fn format_pairs(path: &[(Token, Token)]) -> String {
    path.iter()
        .map(|(from, to)| format!("{from} -> {to}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug, Clone)]
pub struct GraphErrors {
    pub errors: Vec<GraphError>,
}
impl fmt::Display for GraphErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- [{}] {}", error.code(), error));
        }
        f.write_str(&display.join("\n"))
    }
}

/// Errors while resolving a provider from a compiled graph
///
/// Must be clone, every waiter on an in-flight resolution receives a copy
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// Resolution was attempted for a token the graph does not know
    #[error("No provider found for '{0}'")]
    ProviderNotFound(Token),
    /// The token exists, but it belongs to a module
    #[error("'{0}' is a module, not a provider")]
    NotAProvider(Token),
    /// Constructor, factory, property injection or init hook failed
    #[error("Provider for '{token}' failed - error: {error}")]
    ConstructionFailed { token: Token, error: Arc<DynError> },
    #[error("Failed to downcast '{token}', required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        token: Token,
        required_type: &'static str,
        actual_type: &'static str,
    },
    /// The resolution another caller was waiting on was dropped before finishing
    #[error("Resolution of '{0}' was aborted before it completed")]
    Aborted(Token),
}

/// Errors when reading resolved dependencies inside a constructor or factory
#[derive(Error, Debug, Clone)]
pub enum ArgumentError {
    /// Unreached, circular or unresolved optional dependency
    #[error("Dependency at index {0} is not available")]
    Missing(usize),
    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
    #[error("Property '{0}' can not be injected into this type")]
    UnknownProperty(String),
}

/// Errors while eagerly initiating all providers
#[derive(Error, Debug, Clone)]
pub enum InitError {
    /// There are issues with the dependency graph
    #[error(transparent)]
    DependencyGraphError(#[from] GraphErrors),
    #[error(transparent)]
    ResolveError(#[from] ResolveError),
}
