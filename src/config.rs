//! Configuration management for docdesk using the prefer crate.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default service endpoint.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Token filename inside the data directory.
    pub token_filename: String,
    /// Base URL of the document service.
    pub api_url: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("docdesk");

        Self {
            data_dir,
            token_filename: "token".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: 30,
        }
    }
}

impl Settings {
    /// Full path of the persisted-credential file. This is the only durable
    /// client state.
    pub fn token_path(&self) -> PathBuf {
        self.data_dir.join(&self.token_filename)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the document service.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Target directory for data.
    #[serde(default)]
    pub target: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers docdesk config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("docdesk").await {
            Ok(pref_config) => {
                let api_url: Option<String> = pref_config.get("api_url").ok();
                let target: Option<String> = pref_config.get("target").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();

                Config {
                    api_url,
                    target,
                    request_timeout,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref api_url) = self.api_url {
            settings.api_url = api_url.trim_end_matches('/').to_string();
        }
        if let Some(ref target) = self.target {
            let path = shellexpand::tilde(target);
            settings.data_dir = PathBuf::from(path.as_ref());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_point_at_local_service() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.token_filename, "token");
        assert!(settings.token_path().ends_with("docdesk/token"));
    }

    #[test]
    fn config_overrides_trim_trailing_slashes() {
        let config = Config {
            api_url: Some("https://docs.example.com/".to_string()),
            target: None,
            request_timeout: Some(10),
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);
        assert_eq!(settings.api_url, "https://docs.example.com");
        assert_eq!(settings.request_timeout, 10);
    }

    #[test]
    fn target_override_moves_the_data_dir() {
        let config = Config {
            api_url: None,
            target: Some("/tmp/docdesk-test".to_string()),
            request_timeout: None,
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/docdesk-test"));
        assert_eq!(settings.token_path(), PathBuf::from("/tmp/docdesk-test/token"));
    }
}
