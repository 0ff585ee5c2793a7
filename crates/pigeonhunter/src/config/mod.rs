pub mod loader;
pub mod schema;

pub use loader::{
    default_config_path, load_config, load_config_from_str, resolve_config_path, save_config,
    validate_config, write_template, ConfigStore, FileConfigStore, MemoryConfigStore,
};
pub use schema::{Config, GeneralConfig, ImapConfig, OpenAiConfig, TranslationConfig};
