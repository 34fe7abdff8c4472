//! Module based dependency injection for async Rust
//!
//! An application is described by a root [Module]. Modules import other
//! modules, declare [Provider]s and export a subset of what they can see.
//! From that description the [GraphBuilder] compiles a [DependencyGraph]:
//! every module and provider becomes a node, every import, ownership and
//! injection becomes an edge. Visibility violations and cycles are collected
//! on the graph as [GraphError]s instead of aborting the compilation.
//!
//! A [Resolver] then constructs providers from the compiled graph, honoring
//! their [Scope].
//!
//! # Examples
//!
//! ```rust
//! use wrapp_modules::{
//!     DependencyGraph, Module, ModuleDeclaration, ModuleMetadata, Provider, Resolver, Token,
//! };
//!
//! struct AppModule;
//! impl Module for AppModule {
//!     fn metadata() -> ModuleMetadata {
//!         ModuleMetadata::default().provider(Provider::use_value("greeting", "hello".to_string()))
//!     }
//! }
//!
//! futures::executor::block_on(async {
//!     let graph = DependencyGraph::compile(ModuleDeclaration::of::<AppModule>()).await;
//!     graph.check().unwrap();
//!
//!     let resolver = Resolver::new(graph);
//!     let greeting = resolver.resolve_provider::<String>(Token::named("greeting")).await.unwrap();
//!     assert_eq!(*greeting, "hello");
//! });
//! ```

pub mod analyzer;
pub mod declarations;
pub mod errors;
pub mod graph;
pub mod plugin;
pub mod registry;
pub mod resolver;
pub mod types;

pub use declarations::{
    Class, ClassMetadata, DynamicModule, FactoryProvider, Module, ModuleDeclaration, ModuleMetadata,
    Provider,
};
pub use errors::{GraphError, GraphErrors, InitError, ResolveError};
pub use graph::{DependencyGraph, GraphBuilder};
pub use plugin::{GraphMutator, GraphPlugin};
pub use resolver::{arguments::Arguments, Resolver};
pub use types::{DynError, Injectable, Instance, Scope, Symbol, Token, TypeInfo};
