use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::downloader::{TransferOptions, DEFAULT_RATE_LIMIT_KIB};
use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of download+verify attempts (including the first).
    pub max_attempts: u32,
    /// Fixed delay in seconds between attempts.
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 20,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.delay_secs))
    }
}

fn default_rate_limit_kib() -> u64 {
    DEFAULT_RATE_LIMIT_KIB
}

fn default_connect_timeout_secs() -> u64 {
    30
}

/// Configuration loaded from `~/.config/verified-fetch/config.toml`.
///
/// Artifact fields are optional so the file can hold only transfer/retry
/// tuning while the command line names what to fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// URL of the `checksum filename` manifest.
    #[serde(default)]
    pub manifest_url: Option<String>,
    /// URL of the artifact itself.
    #[serde(default)]
    pub artifact_url: Option<String>,
    /// Where the verified artifact lives.
    #[serde(default)]
    pub local_path: Option<PathBuf>,
    /// Manifest entry name (defaults to the artifact URL's last path segment).
    #[serde(default)]
    pub name: Option<String>,
    /// Transfer-rate cap in KiB/s; 0 disables the cap.
    #[serde(default = "default_rate_limit_kib")]
    pub rate_limit_kib: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            manifest_url: None,
            artifact_url: None,
            local_path: None,
            name: None,
            rate_limit_kib: DEFAULT_RATE_LIMIT_KIB,
            connect_timeout_secs: default_connect_timeout_secs(),
            retry: None,
        }
    }
}

impl FetchConfig {
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            ..TransferOptions::default()
        }
        .with_rate_limit_kib(self.rate_limit_kib)
    }

    /// Reject values the downloader cannot run with.
    pub fn validate(&self) -> Result<()> {
        if let Some(retry) = &self.retry {
            anyhow::ensure!(retry.max_attempts >= 1, "retry.max_attempts must be at least 1");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("verified-fetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path. The file must exist.
pub fn load_from_path(path: &Path) -> Result<FetchConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: FetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.rate_limit_kib, 125);
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert!(cfg.manifest_url.is_none());
        let retry = cfg.retry_or_default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.delay_secs, 20);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FetchConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.rate_limit_kib, cfg.rate_limit_kib);
        assert_eq!(parsed.connect_timeout_secs, cfg.connect_timeout_secs);
        assert!(parsed.retry.is_none());
    }

    #[test]
    fn config_toml_empty_uses_defaults() {
        let cfg: FetchConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.rate_limit_kib, 125);
        assert_eq!(cfg.transfer_options().max_recv_speed, Some(125 * 1024));
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            manifest_url = "https://mirror.example/recovery/MD5SUMS"
            artifact_url = "https://mirror.example/recovery/image.gz"
            local_path = "/srv/recovery/image.gz"
            rate_limit_kib = 0
            connect_timeout_secs = 5

            [retry]
            max_attempts = 5
            delay_secs = 2
        "#;
        let cfg: FetchConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            cfg.artifact_url.as_deref(),
            Some("https://mirror.example/recovery/image.gz")
        );
        assert_eq!(
            cfg.local_path.as_deref(),
            Some(Path::new("/srv/recovery/image.gz"))
        );
        let opts = cfg.transfer_options();
        assert_eq!(opts.max_recv_speed, None);
        assert_eq!(opts.connect_timeout, Duration::from_secs(5));
        let policy = cfg.retry_or_default().policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[test]
    fn load_from_path_rejects_zero_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[retry]\nmax_attempts = 0\ndelay_secs = 1\n").unwrap();
        assert!(load_from_path(&path).is_err());
    }

    #[test]
    fn load_from_path_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("absent.toml")).is_err());
    }
}
