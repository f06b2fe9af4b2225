use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/server.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Sweep period; also the idle time after which a participant is evicted.
    pub sweep_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_path: "data/chat.db".to_string(),
            sweep_interval_ms: 15_000,
        }
    }
}

impl AppConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// `PORT` and `DATABASE_PATH` take precedence over the file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(env::var("PORT").ok(), env::var("DATABASE_PATH").ok());
    }

    fn apply_overrides(&mut self, port: Option<String>, database_path: Option<String>) {
        if let Some(raw) = port {
            match raw.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => log::warn!("Ignoring PORT=`{raw}`: {err}"),
            }
        }
        if let Some(path) = database_path.filter(|p| !p.trim().is_empty()) {
            self.database_path = path;
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not a valid server config: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn is_missing(&self) -> bool {
        matches!(self, ConfigError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Strict read of a config file; fields absent from the file keep their defaults.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

/// Read `path`, falling back to built-in defaults when it is absent or broken.
pub fn load_config(path: &str) -> AppConfig {
    match read_config(Path::new(path)) {
        Ok(config) => {
            log::info!("Config: {path}");
            config
        }
        Err(err) if err.is_missing() => {
            log::info!("Config: no file at {path}, built-in defaults");
            AppConfig::default()
        }
        Err(err) => {
            log::warn!("Config: {err}; falling back to built-in defaults");
            AppConfig::default()
        }
    }
}
