use std::{
    borrow::Cow,
    collections::HashSet,
    convert::Infallible,
    fmt,
    future::Future,
    marker::PhantomData,
    sync::Arc,
};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    errors::ArgumentError,
    resolver::arguments::Arguments,
    types::{DynError, Injectable, Instance, Scope, Token, TypeInfo},
};

/// A constructible type which can be provided by a module
///
/// This is the explicit replacement for constructor and property injection
/// metadata: [Class::metadata] lists what the type needs, [Class::construct]
/// receives it resolved.
pub trait Class: Injectable + Sized {
    /// Dependencies and scope of the type
    fn metadata() -> ClassMetadata {
        ClassMetadata::new()
    }

    /// Constructs a new instance from its resolved constructor dependencies
    fn construct(
        args: Arguments,
    ) -> impl Future<Output = Result<Self, impl Into<DynError>>> + Send;

    /// Assigns a property dependency after construction
    fn inject_property(&mut self, key: &str, value: Instance) -> Result<(), DynError> {
        let _ = value;
        Err(Box::new(ArgumentError::UnknownProperty(key.to_string())))
    }

    /// Called once the instance is fully constructed and all properties are assigned
    ///
    /// Resolution awaits this hook before the instance is cached or handed out, so a slow
    /// hook delays every dependent. An error fails the resolution of this provider.
    fn on_module_init(&mut self) -> impl Future<Output = Result<(), impl Into<DynError>>> + Send {
        async { Ok::<_, Infallible>(()) }
    }
}

/// Constructor dependency at a parameter position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDependency {
    pub index: usize,
    pub token: Token,
}

/// Property dependency assigned after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDependency {
    pub key: Cow<'static, str>,
    pub token: Token,
}

/// Injection metadata of a [Class]
#[derive(Debug, Clone, Default)]
pub struct ClassMetadata {
    pub constructor: Vec<ConstructorDependency>,
    pub optional_constructor: HashSet<usize>,
    pub properties: Vec<PropertyDependency>,
    pub optional_properties: HashSet<Cow<'static, str>>,
    pub scope: Scope,
}
impl ClassMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constructor dependency on `T` at the next parameter position
    pub fn inject<T: 'static + ?Sized>(self) -> Self {
        self.inject_token(Token::of::<T>())
    }

    /// Adds a constructor dependency on `token` at the next parameter position
    pub fn inject_token(mut self, token: impl Into<Token>) -> Self {
        let index = self.next_index();
        self.constructor.push(ConstructorDependency {
            index,
            token: token.into(),
        });
        self
    }

    /// Adds a constructor dependency which may stay unresolved
    pub fn inject_optional(mut self, token: impl Into<Token>) -> Self {
        let index = self.next_index();
        self.optional_constructor.insert(index);
        self.inject_token(token)
    }

    pub fn property(mut self, key: impl Into<Cow<'static, str>>, token: impl Into<Token>) -> Self {
        self.properties.push(PropertyDependency {
            key: key.into(),
            token: token.into(),
        });
        self
    }

    pub fn optional_property(
        mut self,
        key: impl Into<Cow<'static, str>>,
        token: impl Into<Token>,
    ) -> Self {
        let key = key.into();
        self.optional_properties.insert(key.clone());
        self.property(key, token)
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    fn next_index(&self) -> usize {
        self.constructor
            .iter()
            .map(|dependency| dependency.index + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Wrapper Trait for classes, allowing dynamic dispatch over any [Class]
pub(crate) trait DynClass: Send + Sync {
    fn info(&self) -> TypeInfo;

    fn metadata(&self) -> ClassMetadata;

    fn construct(
        &self,
        args: Arguments,
    ) -> BoxFuture<'static, Result<Box<dyn ClassInstance>, DynError>>;
}

/// A constructed but not yet shared class instance
pub(crate) trait ClassInstance: Send {
    fn inject_property(&mut self, key: &str, value: Instance) -> Result<(), DynError>;

    fn on_module_init(&mut self) -> BoxFuture<'_, Result<(), DynError>>;

    fn into_instance(self: Box<Self>) -> Instance;
}

struct ClassHandle<C>(PhantomData<fn() -> C>);

// Impl DynClass for any Class
impl<C: Class> DynClass for ClassHandle<C> {
    fn info(&self) -> TypeInfo {
        TypeInfo::of::<C>()
    }

    fn metadata(&self) -> ClassMetadata {
        C::metadata()
    }

    fn construct(
        &self,
        args: Arguments,
    ) -> BoxFuture<'static, Result<Box<dyn ClassInstance>, DynError>> {
        async move {
            // Forward the call to the specific implementation
            match C::construct(args).await {
                Ok(instance) => Ok(Box::new(instance) as Box<dyn ClassInstance>),
                Err(e) => Err(e.into()),
            }
        }
        .boxed()
    }
}

impl<C: Class> ClassInstance for C {
    fn inject_property(&mut self, key: &str, value: Instance) -> Result<(), DynError> {
        Class::inject_property(self, key, value)
    }

    fn on_module_init(&mut self) -> BoxFuture<'_, Result<(), DynError>> {
        async move {
            match Class::on_module_init(self).await {
                Ok(()) => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
        .boxed()
    }

    fn into_instance(self: Box<Self>) -> Instance {
        Instance::new(*self)
    }
}

/// A constructible type together with its injection metadata
#[derive(Clone)]
pub struct ClassProvider {
    pub(crate) class: Arc<dyn DynClass>,
    pub(crate) metadata: ClassMetadata,
}
impl ClassProvider {
    pub fn of<C: Class>() -> Self {
        let class: Arc<dyn DynClass> = Arc::new(ClassHandle::<C>(PhantomData));
        let metadata = class.metadata();
        ClassProvider { class, metadata }
    }

    pub fn info(&self) -> TypeInfo {
        self.class.info()
    }

    pub fn metadata(&self) -> &ClassMetadata {
        &self.metadata
    }
}
impl fmt::Debug for ClassProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassProvider")
            .field("class", &self.info().type_name)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Positional dependency of a factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryDependency {
    pub token: Token,
    pub optional: bool,
}

type FactoryFn = dyn Fn(Arguments) -> BoxFuture<'static, Result<Instance, DynError>> + Send + Sync;

/// An async function producing a value from its resolved `inject` list
#[derive(Clone)]
pub struct FactoryProvider {
    pub inject: Vec<FactoryDependency>,
    pub scope: Scope,
    pub(crate) factory: Arc<FactoryFn>,
}
impl FactoryProvider {
    pub fn new<F, Fut, T, E>(factory: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Injectable,
        E: Into<DynError>,
    {
        let factory: Arc<FactoryFn> = Arc::new(move |args| {
            let produced = factory(args);
            async move {
                match produced.await {
                    Ok(value) => Ok(Instance::new(value)),
                    Err(e) => Err(e.into()),
                }
            }
            .boxed()
        });

        FactoryProvider {
            inject: Vec::new(),
            scope: Scope::default(),
            factory,
        }
    }

    pub fn inject(mut self, token: impl Into<Token>) -> Self {
        self.inject.push(FactoryDependency {
            token: token.into(),
            optional: false,
        });
        self
    }

    pub fn inject_optional(mut self, token: impl Into<Token>) -> Self {
        self.inject.push(FactoryDependency {
            token: token.into(),
            optional: true,
        });
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}
impl fmt::Debug for FactoryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryProvider")
            .field("inject", &self.inject)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// A provider declared by a module
#[derive(Debug, Clone)]
pub enum Provider {
    /// A bare class, provided under its own type token
    Class(ClassProvider),
    /// A class provided under an explicit token
    UseClass { token: Token, class: ClassProvider },
    /// A precomputed value
    UseValue { token: Token, value: Instance },
    /// The result of an async factory
    UseFactory {
        token: Token,
        factory: FactoryProvider,
    },
}
impl Provider {
    pub fn class<C: Class>() -> Self {
        Provider::Class(ClassProvider::of::<C>())
    }

    pub fn use_class<C: Class>(token: impl Into<Token>) -> Self {
        Provider::UseClass {
            token: token.into(),
            class: ClassProvider::of::<C>(),
        }
    }

    pub fn use_value<T: Injectable>(token: impl Into<Token>, value: T) -> Self {
        Provider::UseValue {
            token: token.into(),
            value: Instance::new(value),
        }
    }

    pub fn use_factory(token: impl Into<Token>, factory: FactoryProvider) -> Self {
        Provider::UseFactory {
            token: token.into(),
            factory,
        }
    }

    /// Overrides the scope, ignored for values
    pub fn with_scope(mut self, scope: Scope) -> Self {
        match &mut self {
            Provider::Class(class) | Provider::UseClass { class, .. } => {
                class.metadata.scope = scope
            }
            Provider::UseFactory { factory, .. } => factory.scope = scope,
            Provider::UseValue { token, .. } => {
                tracing::debug!("Ignoring scope {scope:?} on value provider '{token}'")
            }
        }
        self
    }

    pub fn token(&self) -> Token {
        match self {
            Provider::Class(class) => Token::Type(class.info()),
            Provider::UseClass { token, .. }
            | Provider::UseValue { token, .. }
            | Provider::UseFactory { token, .. } => token.clone(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Provider::Class(class) | Provider::UseClass { class, .. } => class.metadata.scope,
            Provider::UseFactory { factory, .. } => factory.scope,
            Provider::UseValue { .. } => Scope::Singleton,
        }
    }
}
