//! CLI for verified-fetch.

mod settings;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use vfetch_core::config;
use vfetch_core::verify::EXIT_OTHER;
use vfetch_core::{CurlTransfer, DownloadError, HttpManifest, VerifiedDownloader, VerifiedResult};

pub use settings::Settings;

/// Download an artifact and verify it against a remote checksum manifest.
///
/// Flags override values from the config file.
#[derive(Debug, Parser)]
#[command(name = "verified-fetch")]
#[command(about = "Fetch an artifact and verify it against a remote checksum manifest", long_about = None)]
pub struct Cli {
    /// URL of the `checksum filename` manifest (e.g. an MD5SUMS file).
    #[arg(long, value_name = "URL")]
    pub manifest_url: Option<String>,

    /// URL of the artifact to download.
    #[arg(long, value_name = "URL")]
    pub artifact_url: Option<String>,

    /// Where the verified artifact is kept.
    #[arg(long, value_name = "PATH")]
    pub local_path: Option<PathBuf>,

    /// Maximum download+verify attempts (default 3).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Transfer-rate cap in KB/s; 0 disables it (default 125).
    #[arg(long, value_name = "KB/s")]
    pub rate_limit: Option<u64>,

    /// Seconds to wait between attempts (default 20).
    #[arg(long, value_name = "SECS")]
    pub retry_delay: Option<u64>,

    /// Manifest entry name (default: last path segment of the artifact URL).
    #[arg(long)]
    pub name: Option<String>,

    /// Download even if the local file already matches.
    #[arg(long)]
    pub force: bool,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Read configuration from this file instead of the XDG config path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);
        let settings = Settings::resolve(&self, cfg)?;

        let manifest = HttpManifest::new(settings.manifest_url.clone())
            .with_connect_timeout(settings.transfer.connect_timeout);
        let downloader = VerifiedDownloader::new(manifest, CurlTransfer::new(settings.transfer))
            .with_policy(settings.policy);

        let result = if settings.force {
            downloader.refetch(&settings.artifact)?
        } else {
            downloader.ensure_verified(&settings.artifact)?
        };

        if settings.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("{}", summary_line(&result));
        }
        Ok(())
    }
}

/// Process exit code for a failed run: the download outcome's code, else `EXIT_OTHER`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<DownloadError>()
        .map(DownloadError::exit_code)
        .unwrap_or(EXIT_OTHER)
}

/// One-line human summary of a successful run.
pub fn summary_line(result: &VerifiedResult) -> String {
    format!(
        "verified {} ({} {}) after {} attempt(s), {} download(s)",
        result.path.display(),
        result.kind,
        result.checksum,
        result.attempts,
        result.downloads
    )
}
