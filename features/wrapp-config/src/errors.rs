use wrapp_modules::TypeInfo;

/// Errors when registering or acquiring a config
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// The config type is already registered
    #[error("The config type '{0}' is already registered")]
    AlreadyRegistered(TypeInfo),
    /// The required config type is not known
    #[error("The config type '{0}' is not known")]
    Missing(TypeInfo),
}
