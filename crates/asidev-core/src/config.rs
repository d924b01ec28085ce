use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_API_BASE_URL: &str = "https://api.deepseek.com";

/// Environment variable consulted before the config file for the API key.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    /// External command that runs the provider sign-in flow and writes
    /// `session.json` on success.
    pub sign_in_command: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn save_api_key(key: &str) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.api_key = Some(key.to_string());
        config.save()
    }

    /// Resolve the API credential: environment first, then the config file.
    ///
    /// There is deliberately no built-in default key. A missing credential
    /// means the completion client is never constructed and the app fails
    /// closed into the canned fallback responder.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(dir.join("asidev"))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_key: Some("sk-test".to_string()),
            model: Some("deepseek-chat".to_string()),
            api_base_url: None,
            sign_in_command: Some("asidev-login".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("sk-test"));
        assert_eq!(loaded.sign_in_command.as_deref(), Some("asidev-login"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.api_key.is_none());
        assert_eq!(loaded.model(), DEFAULT_MODEL);
        assert_eq!(loaded.api_base_url(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn env_key_wins_over_config_key() {
        let config = Config {
            api_key: Some("from-config".to_string()),
            ..Config::new()
        };
        let key = config.resolve_api_key_with(Some("from-env".to_string()));
        assert_eq!(key.as_deref(), Some("from-env"));
    }

    #[test]
    fn blank_keys_never_resolve() {
        let config = Config {
            api_key: Some("   ".to_string()),
            ..Config::new()
        };
        assert_eq!(config.resolve_api_key_with(Some("".to_string())), None);
        assert_eq!(config.resolve_api_key_with(None), None);
    }

    #[test]
    fn config_key_used_when_env_is_absent() {
        let config = Config {
            api_key: Some("from-config".to_string()),
            ..Config::new()
        };
        assert_eq!(
            config.resolve_api_key_with(None).as_deref(),
            Some("from-config")
        );
    }
}
