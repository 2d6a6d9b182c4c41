//! Merge command-line flags over the config file.

use anyhow::{Context, Result};
use std::time::Duration;
use vfetch_core::config::FetchConfig;
use vfetch_core::retry::RetryPolicy;
use vfetch_core::{Artifact, TransferOptions};

use super::Cli;

/// Everything one run needs, after flags and config are merged.
#[derive(Debug, Clone)]
pub struct Settings {
    pub manifest_url: String,
    pub artifact: Artifact,
    pub transfer: TransferOptions,
    pub policy: RetryPolicy,
    pub force: bool,
    pub json: bool,
}

impl Settings {
    pub fn resolve(cli: &Cli, cfg: FetchConfig) -> Result<Self> {
        let transfer = cfg.transfer_options();
        let transfer = match cli.rate_limit {
            Some(kib) => transfer.with_rate_limit_kib(kib),
            None => transfer,
        };

        let retry = cfg.retry_or_default();
        let policy = RetryPolicy::new(
            cli.max_attempts.unwrap_or(retry.max_attempts),
            Duration::from_secs(cli.retry_delay.unwrap_or(retry.delay_secs)),
        );
        anyhow::ensure!(policy.max_attempts >= 1, "max attempts must be at least 1");

        let manifest_url = cli
            .manifest_url
            .clone()
            .or(cfg.manifest_url)
            .context("missing --manifest-url (or manifest_url in config)")?;
        let artifact_url = cli
            .artifact_url
            .clone()
            .or(cfg.artifact_url)
            .context("missing --artifact-url (or artifact_url in config)")?;
        let local_path = cli
            .local_path
            .clone()
            .or(cfg.local_path)
            .context("missing --local-path (or local_path in config)")?;

        let artifact = match cli.name.clone().or(cfg.name) {
            Some(name) => Artifact::new(name, local_path, artifact_url)?,
            None => Artifact::from_url(local_path, artifact_url)?,
        };

        Ok(Settings {
            manifest_url,
            artifact,
            transfer,
            policy,
            force: cli.force,
            json: cli.json,
        })
    }
}
