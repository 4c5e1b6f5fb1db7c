//! Configuration structures and loading logic.

use crate::config::modes::ResumePolicy;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default chunk size for the copy loop (16 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Folder created under the user's downloads directory.
const APP_FOLDER: &str = "StreamVault";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Download options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Base directory for downloads.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Bytes moved per copy loop iteration.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// What resume does with bytes already on disk.
    #[serde(default)]
    pub resume_policy: ResumePolicy,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            resume_policy: ResumePolicy::default(),
        }
    }
}

/// Session registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// How long a canceled session stays listed before removal.
    #[serde(default = "default_cancel_grace_ms")]
    pub cancel_grace_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cancel_grace_ms: default_cancel_grace_ms(),
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Connect timeout. Reads are never timed out.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: None,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_cancel_grace_ms() -> u64 {
    1500
}

fn default_user_agent() -> String {
    format!("StreamVault/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!("Configuration file not found: {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective download directory.
    ///
    /// Falls back to `<downloads>/StreamVault`, then to the working directory.
    pub fn download_directory(&self) -> PathBuf {
        if let Some(dir) = &self.download.directory {
            return dir.clone();
        }

        directories::UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(|d| d.join(APP_FOLDER)))
            .unwrap_or_else(|| {
                std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(APP_FOLDER)
            })
    }

    /// Grace period before a canceled session leaves the registry.
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.registry.cancel_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.download.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.download.resume_policy, ResumePolicy::Continue);
        assert_eq!(config.registry.cancel_grace_ms, 1500);
        assert!(config.network.user_agent.starts_with("StreamVault/"));
        assert!(config.network.connect_timeout_secs.is_none());
    }

    #[test]
    fn test_parse_full_file() {
        let config: Config = toml::from_str(
            r#"
            [download]
            directory = "/tmp/vault"
            chunk_size = 32768
            resume_policy = "restart"

            [registry]
            cancel_grace_ms = 250

            [network]
            user_agent = "custom-agent"
            connect_timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.download_directory(), PathBuf::from("/tmp/vault"));
        assert_eq!(config.download.chunk_size, 32768);
        assert_eq!(config.download.resume_policy, ResumePolicy::Restart);
        assert_eq!(config.cancel_grace(), Duration::from_millis(250));
        assert_eq!(config.network.user_agent, "custom-agent");
        assert_eq!(config.network.connect_timeout_secs, Some(10));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streamvault.toml");

        let mut config = Config::default();
        config.download.directory = Some(dir.path().to_path_buf());
        config.download.resume_policy = ResumePolicy::Restart;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.download.directory.as_deref(), Some(dir.path()));
        assert_eq!(loaded.download.resume_policy, ResumePolicy::Restart);
    }

    #[test]
    fn test_default_directory_ends_with_app_folder() {
        let config = Config::default();
        assert!(config.download_directory().ends_with(APP_FOLDER));
    }
}
