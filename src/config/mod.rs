/// Conference-wide settings (window, editability, tax, numbering)
pub mod conference;

/// Database configuration and connection management
pub mod database;

/// Ticket type seed definitions from config.toml
pub mod ticket_types;

use crate::errors::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// The entire parsed config.toml.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// `[conference]` section
    #[serde(default)]
    pub conference: conference::ConferenceConfig,
    /// `[[ticket_types]]` seed entries
    #[serde(default)]
    pub ticket_types: Vec<ticket_types::TicketTypeConfig>,
}

/// Loads the application configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_app_configuration<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents =
        std::fs::read_to_string(path.as_ref()).map_err(|e| crate::errors::Error::Config {
            message: format!("Failed to read config file: {e}"),
        })?;

    let config: AppConfig = toml::from_str(&contents).map_err(|e| crate::errors::Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    info!(
        "Loaded configuration with {} ticket type seed(s).",
        config.ticket_types.len()
    );
    Ok(config)
}

/// Loads the application configuration from the default location (./config.toml).
pub fn load_default_configuration() -> Result<AppConfig> {
    load_app_configuration("config.toml")
}
