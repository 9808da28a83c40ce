//! Console configuration.
//!
//! Resolution order: defaults → TOML file → `SELLERDESK_*` environment
//! variables. The CLI applies its own flags last.
//!
//! ```toml
//! api_url = "http://localhost:3333"
//! timeout_secs = 10
//! session_file = "/home/me/.local/share/sellerdesk/session.json"
//! log_filter = "sellerdesk=debug"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3333";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    /// Where the CLI keeps the session token between runs.
    pub session_file: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_file: project_dirs().map(|dirs| dirs.data_dir().join("session.json")),
            log_filter: "info".to_string(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "sellerdesk", "sellerdesk")
}

impl ConsoleConfig {
    /// `$XDG_CONFIG_HOME/sellerdesk/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`, or from the default location when it exists, then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.with_env_overrides(|name| std::env::var(name).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup("SELLERDESK_API_URL") {
            self.api_url = url;
        }
        if let Some(raw) = lookup("SELLERDESK_TIMEOUT_SECS") {
            self.timeout_secs = raw.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "SELLERDESK_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
        }
        if let Some(path) = lookup("SELLERDESK_SESSION_FILE") {
            self.session_file = Some(PathBuf::from(path));
        }
        if let Some(filter) = lookup("SELLERDESK_LOG") {
            self.log_filter = filter;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ConsoleConfig::from_toml(r#"api_url = "https://api.example.com""#).unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SELLERDESK_API_URL", "http://10.0.0.2:3333"),
            ("SELLERDESK_TIMEOUT_SECS", "30"),
        ]);
        let config = ConsoleConfig::default()
            .with_env_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api_url, "http://10.0.0.2:3333");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn bad_timeout_env_is_rejected() {
        let err = ConsoleConfig::default()
            .with_env_overrides(|name| (name == "SELLERDESK_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = 3\nsession_file = \"/tmp/s.json\"\n").unwrap();

        let config = ConsoleConfig::from_file(&path).unwrap();
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.session_file, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ConsoleConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
