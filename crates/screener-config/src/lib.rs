//! Configuration management.

mod settings;

pub use settings::{AngelSettings, AppConfig, AppSettings, HistorySettings, LoggingConfig, ScreenerSettings};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Load configuration from file and environment.
///
/// Environment variables use the `SCREENER` prefix and `__` as the section
/// separator, e.g. `SCREENER__SCREENER__THROTTLE_MS=500`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("SCREENER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

/// The default configuration rendered as TOML.
pub fn default_toml() -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&AppConfig::default())
}
