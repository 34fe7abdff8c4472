use std::{
    any::{Any, TypeId},
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::errors::ArgumentError;

/// Error type returned by user supplied constructors, factories and hooks
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// We assume that we are using a multithreaded async runtime
/// So anything injectable needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// Instance of a Provider
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
}

impl Instance {
    pub fn new<ExistingInstance: Injectable>(instance: ExistingInstance) -> Self {
        Instance {
            info: TypeInfo::of::<ExistingInstance>(),
            instance: Arc::new(instance),
        }
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// Downcasts the instance, reporting a mismatch as an [ArgumentError]
    pub fn require<T: Injectable>(&self) -> Result<Arc<T>, ArgumentError> {
        self.downcast()
            .map_err(|actual_type| ArgumentError::DowncastFailed {
                required_type: std::any::type_name::<T>(),
                actual_type,
            })
    }

    /// True if both handles point to the same allocation
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// Type name without its module path, `my_app::users::UserService` becomes `UserService`
    pub fn short_name(&self) -> &'static str {
        let name = self.type_name;
        let end = name.find('<').unwrap_or(name.len());
        let start = name[..end].rfind("::").map(|i| i + 2).unwrap_or(0);
        &name[start..]
    }
}
// Only the TypeId identifies a type, the name is informational
impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}
impl Eq for TypeInfo {}
impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier, equal only to itself and its clones
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Cow<'static, str>,
}
impl Symbol {
    pub fn new(description: impl Into<Cow<'static, str>>) -> Self {
        Symbol {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Symbol {}
impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({}#{})", self.description, self.id)
    }
}
impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

/// Identity of anything that can be looked up in the graph
///
/// Tokens are compared by identity: a type by its `TypeId`, a name by its text
/// and a [Symbol] by its allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Type(TypeInfo),
    Named(Cow<'static, str>),
    Symbol(Symbol),
}
impl Token {
    pub fn of<T: 'static + ?Sized>() -> Token {
        Token::Type(TypeInfo::of::<T>())
    }

    pub fn named(name: impl Into<Cow<'static, str>>) -> Token {
        Token::Named(name.into())
    }

    /// Human readable name used for node labels
    pub fn label(&self) -> String {
        match self {
            Token::Type(info) => info.short_name().to_string(),
            Token::Named(name) => name.to_string(),
            Token::Symbol(symbol) => symbol.description().to_string(),
        }
    }
}
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type(info) => f.write_str(info.short_name()),
            Token::Named(name) => f.write_str(name),
            Token::Symbol(symbol) => fmt::Display::fmt(symbol, f),
        }
    }
}
impl From<TypeInfo> for Token {
    fn from(info: TypeInfo) -> Self {
        Token::Type(info)
    }
}
impl From<&'static str> for Token {
    fn from(name: &'static str) -> Self {
        Token::Named(Cow::Borrowed(name))
    }
}
impl From<String> for Token {
    fn from(name: String) -> Self {
        Token::Named(Cow::Owned(name))
    }
}
impl From<Symbol> for Token {
    fn from(symbol: Symbol) -> Self {
        Token::Symbol(symbol)
    }
}
impl From<&Token> for Token {
    fn from(token: &Token) -> Self {
        token.clone()
    }
}

/// Instance caching policy of a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One instance for the lifetime of the resolver
    #[default]
    Singleton,
    /// One instance per top level resolution
    Request,
    /// A new instance for every injection
    Transient,
}
