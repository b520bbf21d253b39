pub mod build;
pub mod config_cmd;
pub mod estimate;

use std::path::Path;

use tessera_config::{AppConfig, ConfigError};

/// Load the config from `path` if given, else from the default location.
/// Environment overrides apply either way.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env_overrides()?;
            Ok(config)
        }
        None => AppConfig::load(),
    }
}
