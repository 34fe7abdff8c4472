use std::{borrow::Cow, fmt};

use crate::types::Token;

/// Position of a dependency at its injection site
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyKey {
    /// Constructor parameter or factory `inject` position
    Index(usize),
    /// Property name
    Property(Cow<'static, str>),
}
impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKey::Index(index) => write!(f, "index [{index}]"),
            DependencyKey::Property(key) => write!(f, "property '{key}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectionKind {
    Constructor,
    Property,
}

/// Metadata of a provider to provider dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub key: DependencyKey,
    pub injection: InjectionKind,
    /// The target is not visible from the module owning the source
    pub unreached: bool,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    /// Imported module -> importing module
    Import,
    /// Provider -> owning module
    Provider,
    /// Provider -> dependency token
    Dependency(DependencyEdge),
}

/// Directed, typed relation between two tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: Token,
    pub target: Token,
    pub kind: EdgeKind,
    /// Set by cycle detection, circular edges are never followed during resolution
    pub circular: bool,
}
impl Edge {
    pub fn import(child: Token, importer: Token) -> Self {
        Edge {
            source: child,
            target: importer,
            kind: EdgeKind::Import,
            circular: false,
        }
    }

    pub fn provider(provider: Token, module: Token) -> Self {
        Edge {
            source: provider,
            target: module,
            kind: EdgeKind::Provider,
            circular: false,
        }
    }

    pub fn dependency(provider: Token, dependency: Token, edge: DependencyEdge) -> Self {
        Edge {
            source: provider,
            target: dependency,
            kind: EdgeKind::Dependency(edge),
            circular: false,
        }
    }

    pub fn as_dependency(&self) -> Option<&DependencyEdge> {
        match &self.kind {
            EdgeKind::Dependency(dependency) => Some(dependency),
            _ => None,
        }
    }

    pub fn is_import(&self) -> bool {
        self.kind == EdgeKind::Import
    }

    /// Only dependency edges can be unreached
    pub fn unreached(&self) -> bool {
        self.as_dependency().is_some_and(|dependency| dependency.unreached)
    }

    /// Dependency edge the resolver is allowed to follow
    pub(crate) fn is_active(&self, injection: InjectionKind) -> bool {
        match self.as_dependency() {
            Some(dependency) => {
                dependency.injection == injection && !dependency.unreached && !self.circular
            }
            None => false,
        }
    }
}
