//! Configuration management for the lending kiosk

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KioskConfig {
    /// Subject id attached to every audit entry written by this desk
    pub system_id: String,
    pub barcode_timeout_secs: u64,
    pub isbn_prefix: String,
    pub scan_retry_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    /// Barcode scanner stream, `-` for stdin
    pub barcode_path: String,
    pub card_reader_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub audit_log_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DisplayConfig {
    pub state_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub kiosk: KioskConfig,
    pub input: InputConfig,
    pub catalog: CatalogConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (e.g. KIOSK_KIOSK__SYSTEM_ID)
            .add_source(
                Environment::with_prefix("KIOSK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Override the desk id from SYSTEM_ID env var if present
            .set_override_option("kiosk.system_id", env::var("SYSTEM_ID").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            system_id: "kiosk".to_string(),
            barcode_timeout_secs: 20,
            isbn_prefix: "97".to_string(),
            scan_retry_delay_ms: 500,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            barcode_path: "-".to_string(),
            card_reader_path: "/run/lending-kiosk/card-reader".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/catalog.json"),
            audit_log_path: PathBuf::from("data/audit.jsonl"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
        }
    }
}
