use std::{collections::HashMap, sync::Arc};

use wrapp_modules::{DynamicModule, Injectable, Instance, ModuleMetadata, Provider, Token, TypeInfo};

use crate::{config::ConfigModule, errors::ConfigError};

/// A provider to register all configs.
///
/// Configs can be registered and retrieved based on type.
#[derive(Debug, Default, Clone)]
pub struct ConfigProvider {
    configs: HashMap<TypeInfo, Instance>,
    /// Registration order, kept for a stable provider order in the module
    order: Vec<TypeInfo>,
}

impl ConfigProvider {
    /// Initializes an empty Config Provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a config with specified type.
    ///
    /// If the config type is not registered, it will return [`ConfigError::Missing`]
    pub fn get_config<T: Injectable>(&self) -> Result<Arc<T>, ConfigError> {
        let info = TypeInfo::of::<T>();

        self.configs
            .get(&info)
            .and_then(|config| config.downcast().ok())
            .ok_or(ConfigError::Missing(info))
    }

    /// Add a config to the registry.
    ///
    /// If the config type is already registered, it will return
    /// [`ConfigError::AlreadyRegistered`]
    pub fn add_config<T: Injectable>(&mut self, config: T) -> Result<&mut Self, ConfigError> {
        let info = TypeInfo::of::<T>();

        if self.configs.contains_key(&info) {
            return Err(ConfigError::AlreadyRegistered(info));
        }

        tracing::debug!("Registering config {}", info.type_name);
        self.configs.insert(info, Instance::new(config));
        self.order.push(info);
        Ok(self)
    }

    /// Can optionally add a config to the registry.
    ///
    /// If the config provided is `Some(T)`, it will be the same as calling
    /// [`ConfigProvider::add_config`]
    /// If the config provided is `None`, then the function just returns `Ok(self)` for chaining
    pub fn maybe_add_config<T: Injectable>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(c) => self.add_config(c),
            None => Ok(self),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Turns the registry into a global module exporting every config under its type token
    pub fn into_module(self) -> DynamicModule {
        let mut metadata = ModuleMetadata::new();
        for info in self.order {
            let Some(config) = self.configs.get(&info) else {
                continue;
            };
            let token = Token::Type(info);
            metadata = metadata
                .provider(Provider::UseValue {
                    token: token.clone(),
                    value: config.clone(),
                })
                .export(token);
        }
        DynamicModule::for_root::<ConfigModule>(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_token;

    #[derive(Debug, PartialEq)]
    struct AppConfig {
        host: String,
        port: u16,
    }

    #[test]
    fn register_and_retrieve() {
        let mut provider = ConfigProvider::new();
        provider
            .add_config(AppConfig {
                host: "localhost".to_string(),
                port: 8080,
            })
            .unwrap()
            .maybe_add_config::<u32>(None)
            .unwrap();

        let config = provider.get_config::<AppConfig>().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert_eq!(provider.len(), 1);
        assert!(matches!(
            provider.get_config::<u32>(),
            Err(ConfigError::Missing(info)) if info == TypeInfo::of::<u32>()
        ));
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut provider = ConfigProvider::new();
        provider.add_config(1u16).unwrap();

        assert!(matches!(
            provider.add_config(2u16),
            Err(ConfigError::AlreadyRegistered(_))
        ));
        assert_eq!(*provider.get_config::<u16>().unwrap(), 1);
    }

    #[test]
    fn module_exports_every_config() {
        let mut provider = ConfigProvider::new();
        provider.add_config(1u16).unwrap().add_config("name").unwrap();

        let module = provider.into_module();
        assert!(module.root);
        assert_eq!(module.metadata.providers.len(), 2);
        assert_eq!(
            module.metadata.exports,
            vec![config_token::<u16>(), config_token::<&'static str>()]
        );
    }
}
