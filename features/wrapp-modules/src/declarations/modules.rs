use std::{
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    declarations::providers::Provider,
    types::{Symbol, Token, TypeInfo},
};

/// A static module: a type describing what it imports, provides and exports
///
/// ```
/// use wrapp_modules::{Module, ModuleMetadata};
///
/// struct DatabaseModule;
/// impl Module for DatabaseModule {
///     fn metadata() -> ModuleMetadata {
///         ModuleMetadata::new().export("db")
///     }
/// }
/// ```
pub trait Module: 'static {
    fn metadata() -> ModuleMetadata;
}

/// Imports, providers and exports of a module
#[derive(Debug, Clone, Default)]
pub struct ModuleMetadata {
    pub imports: Vec<ModuleDeclaration>,
    pub providers: Vec<Provider>,
    /// Provider tokens, or module tokens which are re-exported
    pub exports: Vec<Token>,
    /// Exports are visible to every module of the graph
    pub global: bool,
}
impl ModuleMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn import<M: Module>(self) -> Self {
        self.import_module(ModuleDeclaration::of::<M>())
    }

    pub fn import_module(mut self, module: impl Into<ModuleDeclaration>) -> Self {
        self.imports.push(module.into());
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn export(mut self, token: impl Into<Token>) -> Self {
        self.exports.push(token.into());
        self
    }

    /// Re-exports everything the imported module `M` exports
    pub fn export_module<M: Module>(self) -> Self {
        self.export(Token::of::<M>())
    }

    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    /// Appends the entries of `other`, used to merge dynamic metadata onto static metadata
    pub(crate) fn merge(mut self, other: &ModuleMetadata) -> Self {
        self.imports.extend(other.imports.iter().cloned());
        self.providers.extend(other.providers.iter().cloned());
        self.exports.extend(other.exports.iter().cloned());
        self.global |= other.global;
        self
    }
}

/// Identity and static metadata of a [Module] type
#[derive(Clone, Copy)]
pub struct StaticModule {
    pub info: TypeInfo,
    pub(crate) metadata: fn() -> ModuleMetadata,
}
impl StaticModule {
    pub fn of<M: Module>() -> Self {
        StaticModule {
            info: TypeInfo::of::<M>(),
            metadata: M::metadata,
        }
    }

    pub fn metadata(&self) -> ModuleMetadata {
        (self.metadata)()
    }
}
impl fmt::Debug for StaticModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticModule").field(&self.info.type_name).finish()
    }
}

/// A module configured at runtime
///
/// Its metadata is merged on top of the metadata of the underlying module type.
/// Each `DynamicModule` value is its own module in the graph, identified by a
/// [Symbol] allocated on creation.
#[derive(Debug)]
pub struct DynamicModule {
    pub module: StaticModule,
    pub metadata: ModuleMetadata,
    /// Created through the root-style factory, which implies global visibility
    pub root: bool,
    pub(crate) symbol: Symbol,
}
impl DynamicModule {
    pub fn new<M: Module>(metadata: ModuleMetadata) -> Self {
        let module = StaticModule::of::<M>();
        DynamicModule {
            symbol: Symbol::new(module.info.short_name()),
            module,
            metadata,
            root: false,
        }
    }

    /// Root-style factory, the module becomes visible everywhere
    pub fn for_root<M: Module>(metadata: ModuleMetadata) -> Self {
        DynamicModule {
            root: true,
            ..Self::new::<M>(metadata)
        }
    }

    pub fn token(&self) -> Token {
        Token::Symbol(self.symbol.clone())
    }
}

static NEXT_DEFERRED: AtomicU64 = AtomicU64::new(1);

type LoadFn = dyn Fn() -> BoxFuture<'static, ModuleDeclaration> + Send + Sync;

/// A module declaration which is produced asynchronously when it is imported
#[derive(Clone)]
pub struct DeferredModule {
    pub(crate) id: u64,
    pub(crate) load: Arc<LoadFn>,
}
impl DeferredModule {
    pub fn new<F, Fut>(load: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ModuleDeclaration> + Send + 'static,
    {
        DeferredModule {
            id: NEXT_DEFERRED.fetch_add(1, Ordering::Relaxed),
            load: Arc::new(move || load().boxed()),
        }
    }
}
impl fmt::Debug for DeferredModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeferredModule").field(&self.id).finish()
    }
}

/// Any kind of module declaration that can be imported
#[derive(Debug, Clone)]
pub enum ModuleDeclaration {
    Static(StaticModule),
    Dynamic(Arc<DynamicModule>),
    Deferred(DeferredModule),
}
impl ModuleDeclaration {
    pub fn of<M: Module>() -> Self {
        ModuleDeclaration::Static(StaticModule::of::<M>())
    }

    pub fn deferred<F, Fut>(load: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ModuleDeclaration> + Send + 'static,
    {
        ModuleDeclaration::Deferred(DeferredModule::new(load))
    }
}
impl From<StaticModule> for ModuleDeclaration {
    fn from(module: StaticModule) -> Self {
        ModuleDeclaration::Static(module)
    }
}
impl From<DynamicModule> for ModuleDeclaration {
    fn from(module: DynamicModule) -> Self {
        ModuleDeclaration::Dynamic(Arc::new(module))
    }
}
impl From<Arc<DynamicModule>> for ModuleDeclaration {
    fn from(module: Arc<DynamicModule>) -> Self {
        ModuleDeclaration::Dynamic(module)
    }
}
impl From<DeferredModule> for ModuleDeclaration {
    fn from(module: DeferredModule) -> Self {
        ModuleDeclaration::Deferred(module)
    }
}
