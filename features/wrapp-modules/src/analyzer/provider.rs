use crate::{
    declarations::{ClassProvider, FactoryProvider, Provider},
    errors::UnreachedKind,
    graph::{
        edge::{DependencyEdge, DependencyKey, Edge, InjectionKind},
        node::{ProviderKind, ProviderNode},
    },
    types::{Scope, Token},
};

/// A dependency declared by a provider, before reachability is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub token: Token,
    pub key: DependencyKey,
    pub injection: InjectionKind,
    pub optional: bool,
    /// Error variant reported if the dependency is unreached
    pub site: UnreachedKind,
}

/// Canonical shape of one provider declaration, owned by a module
#[derive(Debug, Clone)]
pub struct ProviderAnalyzer {
    token: Token,
    label: String,
    kind: ProviderKind,
    provider: Provider,
    module: Token,
}

impl ProviderAnalyzer {
    pub fn analyze(provider: &Provider, module: &Token) -> Self {
        let token = provider.token();
        let (kind, label) = match provider {
            Provider::Class(class) => (ProviderKind::Class, class.info().short_name().to_string()),
            Provider::UseClass { token, .. } => (ProviderKind::UseClass, token.label()),
            Provider::UseValue { token, .. } => (ProviderKind::UseValue, token.label()),
            Provider::UseFactory { token, .. } => (ProviderKind::UseFactory, token.label()),
        };

        ProviderAnalyzer {
            token,
            label,
            kind,
            provider: provider.clone(),
            module: module.clone(),
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn scope(&self) -> Scope {
        self.provider.scope()
    }

    pub fn module(&self) -> &Token {
        &self.module
    }

    pub fn node(&self) -> ProviderNode {
        ProviderNode {
            id: self.token.clone(),
            label: self.label.clone(),
            kind: self.kind,
            provider: self.provider.clone(),
            module: self.module.clone(),
            scope: self.scope(),
        }
    }

    /// Provider -> owning module, never unreached nor circular
    pub fn ownership_edge(&self) -> Edge {
        Edge::provider(self.token.clone(), self.module.clone())
    }

    pub fn dependencies(&self) -> Vec<DeclaredDependency> {
        match &self.provider {
            Provider::Class(class) | Provider::UseClass { class, .. } => class_dependencies(class),
            Provider::UseFactory { factory, .. } => factory_dependencies(factory),
            Provider::UseValue { .. } => Vec::new(),
        }
    }

    pub fn dependency_edge(&self, dependency: &DeclaredDependency, unreached: bool) -> Edge {
        Edge::dependency(
            self.token.clone(),
            dependency.token.clone(),
            DependencyEdge {
                key: dependency.key.clone(),
                injection: dependency.injection,
                unreached,
                optional: dependency.optional,
            },
        )
    }
}

fn class_dependencies(class: &ClassProvider) -> Vec<DeclaredDependency> {
    let metadata = class.metadata();
    let mut constructor = metadata.constructor.clone();
    constructor.sort_by_key(|dependency| dependency.index);

    let constructor = constructor.into_iter().map(|dependency| DeclaredDependency {
        optional: metadata.optional_constructor.contains(&dependency.index),
        token: dependency.token,
        key: DependencyKey::Index(dependency.index),
        injection: InjectionKind::Constructor,
        site: UnreachedKind::Constructor,
    });

    let properties = metadata.properties.iter().map(|dependency| DeclaredDependency {
        token: dependency.token.clone(),
        key: DependencyKey::Property(dependency.key.clone()),
        injection: InjectionKind::Property,
        optional: metadata.optional_properties.contains(&dependency.key),
        site: UnreachedKind::Property,
    });

    constructor.chain(properties).collect()
}

fn factory_dependencies(factory: &FactoryProvider) -> Vec<DeclaredDependency> {
    factory
        .inject
        .iter()
        .enumerate()
        .map(|(index, dependency)| DeclaredDependency {
            token: dependency.token.clone(),
            key: DependencyKey::Index(index),
            injection: InjectionKind::Constructor,
            optional: dependency.optional,
            site: UnreachedKind::Factory,
        })
        .collect()
}
