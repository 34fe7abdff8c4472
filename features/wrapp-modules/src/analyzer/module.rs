use crate::{
    declarations::{ModuleDeclaration, Provider},
    graph::{edge::Edge, node::ModuleNode},
    registry::{ModuleRegistry, RegistryEntry},
    types::{Token, TypeInfo},
};

/// Uniform view over static, dynamic and deferred module declarations
#[derive(Debug, Clone)]
pub struct ModuleAnalyzer {
    entry: RegistryEntry,
}

impl ModuleAnalyzer {
    pub async fn analyze(registry: &mut ModuleRegistry, declaration: &ModuleDeclaration) -> Self {
        ModuleAnalyzer {
            entry: registry.resolve(declaration).await,
        }
    }

    pub fn id(&self) -> &Token {
        &self.entry.token
    }

    pub fn label(&self) -> &'static str {
        self.entry.module.info.short_name()
    }

    /// Type of the module, for dynamic modules the type they were created from
    pub fn class(&self) -> TypeInfo {
        self.entry.module.info
    }

    pub fn is_dynamic(&self) -> bool {
        self.entry.dynamic
    }

    /// Explicitly global, or a dynamic module created through its root-style factory
    pub fn is_global(&self) -> bool {
        self.entry.metadata.global || (self.entry.dynamic && self.entry.root)
    }

    pub async fn imports(&self, registry: &mut ModuleRegistry) -> Vec<ModuleAnalyzer> {
        registry
            .imports(&self.entry)
            .await
            .into_iter()
            .map(|entry| ModuleAnalyzer { entry })
            .collect()
    }

    pub fn providers(&self) -> &[Provider] {
        &self.entry.metadata.providers
    }

    pub fn exports(&self) -> &[Token] {
        &self.entry.metadata.exports
    }

    pub fn node(&self) -> ModuleNode {
        ModuleNode {
            id: self.id().clone(),
            label: self.label().to_string(),
            module: self.entry.module,
            metadata: self.entry.metadata.clone(),
            global: self.is_global(),
            dynamic: self.is_dynamic(),
        }
    }

    /// Edge from an imported child to this module
    pub fn import_edge(&self, child: &ModuleAnalyzer) -> Edge {
        Edge::import(child.id().clone(), self.id().clone())
    }
}
