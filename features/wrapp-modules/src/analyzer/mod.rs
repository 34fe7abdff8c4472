//! Normalizes declarations into graph nodes and edges

pub mod module;
pub mod provider;

pub use module::ModuleAnalyzer;
pub use provider::{DeclaredDependency, ProviderAnalyzer};
