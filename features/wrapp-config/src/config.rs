use wrapp_modules::{Module, ModuleMetadata, Token};

/// Module type of the dynamic module built by [crate::provider::ConfigProvider::into_module]
///
/// Has no static metadata, every config is added as a value provider when the
/// dynamic module is created.
pub struct ConfigModule;
impl Module for ConfigModule {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
    }
}

/// Token a config of type `T` is provided under
///
/// ```rust
/// use wrapp_modules::ClassMetadata;
/// use wrapp_config::config::config_token;
///
/// struct DatabaseConfig {
///     url: String,
/// }
///
/// let metadata = ClassMetadata::new().inject_token(config_token::<DatabaseConfig>());
/// assert_eq!(metadata.constructor.len(), 1);
/// ```
pub fn config_token<T: 'static>() -> Token {
    Token::of::<T>()
}
