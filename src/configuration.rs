use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    pub log: LogSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApiSettings {
    pub base_url: String,
    /// Request timeout; the transport default applies when unset.
    pub timeout_seconds: Option<u64>,
}

impl ApiSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Where the token pair is persisted between runs
#[derive(serde::Deserialize, Clone, Debug, Default)]
pub struct StorageSettings {
    pub path: Option<PathBuf>,
}

impl StorageSettings {
    /// Configured path, or `tokens.json` in the platform data directory.
    pub fn token_file(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        directories::ProjectDirs::from("ai", "fashion", "fashion_client")
            .map(|dirs| dirs.data_dir().join("tokens.json"))
            .unwrap_or_else(|| PathBuf::from("tokens.json"))
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct LogSettings {
    pub filter: String,
    pub json: bool,
}

/// Reads `configuration.{yaml,toml,json}` from the working directory when
/// present, then `APP_`-prefixed environment variables
/// (e.g. `APP_API__BASE_URL`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("api.base_url", DEFAULT_BASE_URL)?
        .set_default("log.filter", "info")?
        .set_default("log.json", true)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
