use std::{any::TypeId, collections::HashMap, sync::Arc};

use crate::{
    declarations::{DynamicModule, Module, ModuleDeclaration, ModuleMetadata, StaticModule},
    types::{Symbol, Token},
};

/// A module declaration resolved to its stable token
#[derive(Debug, Clone)]
pub struct RegistryEntry(Arc<RegistryEntryInner>);
#[derive(Debug)]
pub struct RegistryEntryInner {
    pub token: Token,
    pub module: StaticModule,
    /// Static metadata, merged with the dynamic part for dynamic modules
    pub metadata: ModuleMetadata,
    pub dynamic: bool,
    pub root: bool,
}
impl std::ops::Deref for RegistryEntry {
    type Target = RegistryEntryInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Maps module declarations to tokens for the lifetime of one compilation
///
/// Resolving the same declaration twice yields the same entry: static modules
/// are keyed by their type, dynamic modules by their symbol and deferred
/// modules by their handle, so a deferred loader runs at most once.
#[derive(Default)]
pub struct ModuleRegistry {
    statics: HashMap<TypeId, RegistryEntry>,
    dynamics: HashMap<Token, RegistryEntry>,
    deferred: HashMap<u64, RegistryEntry>,
    /// Chains of deferred loaders that led back to themselves
    deferred_cycles: Vec<Vec<String>>,
}

/// Stands in for a deferred chain that never produced a module
pub struct UnresolvedDeferred;
impl Module for UnresolvedDeferred {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve(&mut self, declaration: &ModuleDeclaration) -> RegistryEntry {
        let mut loaded_from = Vec::new();
        let mut current = declaration.clone();

        let entry = loop {
            match current {
                ModuleDeclaration::Static(module) => break self.resolve_static(module),
                ModuleDeclaration::Dynamic(module) => break self.resolve_dynamic(&module),
                ModuleDeclaration::Deferred(deferred) => {
                    if let Some(entry) = self.deferred.get(&deferred.id) {
                        break entry.clone();
                    }
                    if loaded_from.contains(&deferred.id) {
                        break self.unresolved_deferred(&loaded_from, deferred.id);
                    }
                    tracing::debug!("Loading deferred module {}", deferred.id);
                    loaded_from.push(deferred.id);
                    current = (deferred.load)().await;
                }
            }
        };

        for id in loaded_from {
            self.deferred.insert(id, entry.clone());
        }
        entry
    }

    /// Deferred cycles found so far, each as the chain of loader labels
    pub fn take_deferred_cycles(&mut self) -> Vec<Vec<String>> {
        std::mem::take(&mut self.deferred_cycles)
    }

    fn unresolved_deferred(&mut self, loaded_from: &[u64], repeated: u64) -> RegistryEntry {
        let start = loaded_from.iter().position(|&id| id == repeated).unwrap_or(0);
        let path = loaded_from[start..]
            .iter()
            .map(|id| format!("deferred#{id}"))
            .collect::<Vec<_>>();
        tracing::warn!("Deferred module loads itself: {}", path.join(" -> "));
        self.deferred_cycles.push(path);

        let module = StaticModule::of::<UnresolvedDeferred>();
        RegistryEntry(Arc::new(RegistryEntryInner {
            token: Token::Symbol(Symbol::new(format!("deferred#{repeated}"))),
            module,
            metadata: module.metadata(),
            dynamic: false,
            root: false,
        }))
    }

    /// Resolves all imports of an entry, in declaration order
    pub async fn imports(&mut self, entry: &RegistryEntry) -> Vec<RegistryEntry> {
        let mut imports = Vec::with_capacity(entry.metadata.imports.len());
        for declaration in &entry.metadata.imports {
            imports.push(self.resolve(declaration).await);
        }
        imports
    }

    pub fn len(&self) -> usize {
        self.statics.len() + self.dynamics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolve_static(&mut self, module: StaticModule) -> RegistryEntry {
        self.statics
            .entry(module.info.type_id)
            .or_insert_with(|| {
                RegistryEntry(Arc::new(RegistryEntryInner {
                    token: Token::Type(module.info),
                    module,
                    metadata: module.metadata(),
                    dynamic: false,
                    root: false,
                }))
            })
            .clone()
    }

    fn resolve_dynamic(&mut self, dynamic: &DynamicModule) -> RegistryEntry {
        self.dynamics
            .entry(dynamic.token())
            .or_insert_with(|| {
                RegistryEntry(Arc::new(RegistryEntryInner {
                    token: dynamic.token(),
                    module: dynamic.module,
                    metadata: dynamic.module.metadata().merge(&dynamic.metadata),
                    dynamic: true,
                    root: dynamic.root,
                }))
            })
            .clone()
    }
}
