//! Configuration loading.
//!
//! Sources, lowest precedence first: built-in defaults, the optional
//! `config/default.{toml,yaml,json}` file (or an explicit path), then
//! `QUEUE_*` environment variables such as `QUEUE_STORE_HOST` and
//! `QUEUE_STORE_PORT`. Environment keys are split on `_`, so only
//! single-word keys (`host`, `port`, `path`) can be overridden that way.

mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{ConsumerSettings, Settings, StoreSettings};

const DEFAULT_CONFIG_FILE: &str = "config/default";

/// Loads the configuration from the default file and environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(None)
}

/// Like [`load_config`], reading `path` instead of `config/default`.
/// An explicit path must exist.
pub fn load_config_from(path: Option<&str>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => File::with_name(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = Config::builder()
        .add_source(file)
        .add_source(Environment::with_prefix("QUEUE").separator("_"));

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::default().merge(partial))
}
