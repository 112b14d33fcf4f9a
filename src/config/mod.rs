use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Transcript provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Languages tried, in order, when the original track is unavailable
    pub fallback_languages: Vec<String>,

    /// Accept-Language header sent to YouTube
    pub accept_language: String,

    /// User agent sent to YouTube
    pub user_agent: String,

    /// Timeout applied to every HTTP request
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            fallback_languages: ["en", "es", "fr", "de", "it", "pt"]
                .iter()
                .map(|code| code.to_string())
                .collect(),
            accept_language: "en-US".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from the given file, the default locations, or fall back to defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path().filter(|path| path.exists()),
        };

        match config_path {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config from: {}", path.display());

        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("subtitle-fetcher").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let provider = &self.provider;

        if provider.fallback_languages.is_empty() {
            anyhow::bail!("At least one fallback language must be configured");
        }

        if provider
            .fallback_languages
            .iter()
            .any(|code| code.trim().is_empty())
        {
            anyhow::bail!("Fallback language codes must not be blank");
        }

        if provider.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fallback_languages() {
        let config = Config::default();
        assert_eq!(
            config.provider.fallback_languages,
            vec!["en", "es", "fr", "de", "it", "pt"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(&path, "provider:\n  fallback_languages: [ja, ko]\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.provider.fallback_languages, vec!["ja", "ko"]);
        assert_eq!(config.provider.request_timeout_secs, 30);
        assert_eq!(config.provider.accept_language, "en-US");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.provider.request_timeout_secs = 5;
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.provider.request_timeout_secs, 5);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        fs_err::write(&path, "provider:\n  fallback_languages: []\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        fs_err::write(&path, "provider:\n  fallback_languages: [en, '  ']\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        fs_err::write(&path, "provider:\n  request_timeout_secs: 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        fs_err::write(&path, "provider: [not, a, map]\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.yaml"))).is_err());
    }
}
