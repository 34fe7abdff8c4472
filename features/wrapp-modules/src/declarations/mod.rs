//! Explicit module and provider descriptors consumed by the graph builder

pub mod modules;
pub mod providers;

pub use modules::{
    DeferredModule, DynamicModule, Module, ModuleDeclaration, ModuleMetadata, StaticModule,
};
pub use providers::{
    Class, ClassMetadata, ClassProvider, ConstructorDependency, FactoryDependency, FactoryProvider,
    PropertyDependency, Provider,
};
