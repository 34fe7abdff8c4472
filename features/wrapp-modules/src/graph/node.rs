use crate::{
    declarations::{ModuleMetadata, Provider, StaticModule},
    types::{Scope, Token},
};

#[derive(Debug, Clone)]
pub enum Node {
    Module(ModuleNode),
    Provider(ProviderNode),
}
impl Node {
    pub fn id(&self) -> &Token {
        match self {
            Node::Module(module) => &module.id,
            Node::Provider(provider) => &provider.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Node::Module(module) => &module.label,
            Node::Provider(provider) => &provider.label,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleNode> {
        match self {
            Node::Module(module) => Some(module),
            Node::Provider(_) => None,
        }
    }

    pub fn as_provider(&self) -> Option<&ProviderNode> {
        match self {
            Node::Provider(provider) => Some(provider),
            Node::Module(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub id: Token,
    pub label: String,
    /// The module type, for dynamic modules the type they were created from
    pub module: StaticModule,
    /// Effective metadata, static and dynamic parts merged
    pub metadata: ModuleMetadata,
    pub global: bool,
    pub dynamic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Class,
    UseClass,
    UseValue,
    UseFactory,
}

#[derive(Debug, Clone)]
pub struct ProviderNode {
    pub id: Token,
    pub label: String,
    pub kind: ProviderKind,
    pub provider: Provider,
    /// Token of the owning module
    pub module: Token,
    pub scope: Scope,
}
