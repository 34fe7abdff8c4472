//! Wrapp Config provides a global registry of configs that can be injected in the rest of the
//! modules.
//!
//! Wrapp Config is split into two major parts:
//! 1. ConfigProvider: Used to create the registry of all configs
//! 2. ConfigModule: The global module the registry turns into, exporting every config
//!
//! # Examples
//!
//! ```rust
//! use wrapp_config::provider::ConfigProvider;
//! use wrapp_modules::{DependencyGraph, DynamicModule, Module, ModuleMetadata, Resolver};
//!
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//! }
//!
//! struct AppModule;
//! impl Module for AppModule {
//!     fn metadata() -> ModuleMetadata {
//!         ModuleMetadata::new()
//!     }
//! }
//!
//! let mut config_provider = ConfigProvider::new();
//! if let Err(e) = config_provider.add_config(AppConfig {
//!     host: "localhost".to_string(),
//!     port: 8080_u16,
//! }) {
//!     eprintln!("{e}");
//!     return;
//! }
//!
//! let root = DynamicModule::new::<AppModule>(
//!     ModuleMetadata::new().import_module(config_provider.into_module()),
//! );
//!
//! futures::executor::block_on(async {
//!     let resolver = Resolver::new(DependencyGraph::compile(root).await);
//!     let config = resolver.resolve::<AppConfig>().await.unwrap();
//!
//!     assert_eq!(config.host, "localhost");
//!     assert_eq!(config.port, 8080);
//! });
//! ```
//!
//! Wrapp Config consists of the following components:
//!
//! 1. Config - the config module type and config tokens
//! 2. Provider - for creating a registry of configs, adding and retrieving configs
//! 3. Errors - for config errors

pub mod config;
pub mod errors;
pub mod provider;
