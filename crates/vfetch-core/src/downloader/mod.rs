//! Remote artifact transfer.
//!
//! One unauthenticated GET per transfer, optionally rate-capped so a
//! recovery image does not saturate a constrained uplink. The body lands in
//! a `.part` file and replaces the local artifact only when complete.

mod error;
mod single;

pub use error::TransferError;
pub use single::download_single;

use std::path::Path;
use std::time::Duration;

/// Default transfer-rate cap in KiB/s.
pub const DEFAULT_RATE_LIMIT_KIB: u64 = 125;

/// Curl options applied to every transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Receive-speed cap in bytes per second (None = uncapped).
    pub max_recv_speed: Option<u64>,
    pub connect_timeout: Duration,
    /// Abort if throughput stays below `low_speed_limit` bytes/s for this long.
    pub low_speed_time: Duration,
    pub low_speed_limit: u32,
    /// Hard wall-clock limit for one transfer.
    pub timeout: Duration,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            max_recv_speed: Some(DEFAULT_RATE_LIMIT_KIB * 1024),
            connect_timeout: Duration::from_secs(30),
            low_speed_time: Duration::from_secs(60),
            low_speed_limit: 1024,
            timeout: Duration::from_secs(6 * 3600),
        }
    }
}

impl TransferOptions {
    /// Set the rate cap from a KiB/s value; 0 removes the cap.
    pub fn with_rate_limit_kib(mut self, kib: u64) -> Self {
        self.max_recv_speed = match kib {
            0 => None,
            n => Some(n.saturating_mul(1024)),
        };
        self
    }
}

/// Fetches a URL into a local path, replacing what is there.
pub trait Transfer {
    /// Download `url` to `dest`. Returns the number of bytes written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, TransferError>;
}

/// libcurl-backed transfer.
#[derive(Debug, Clone, Default)]
pub struct CurlTransfer {
    options: TransferOptions,
}

impl CurlTransfer {
    pub fn new(options: TransferOptions) -> Self {
        Self { options }
    }
}

impl Transfer for CurlTransfer {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, TransferError> {
        download_single(url, dest, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_cap_is_125_kib() {
        assert_eq!(TransferOptions::default().max_recv_speed, Some(128_000));
    }

    #[test]
    fn zero_rate_limit_removes_cap() {
        let opts = TransferOptions::default().with_rate_limit_kib(0);
        assert_eq!(opts.max_recv_speed, None);
        let opts = opts.with_rate_limit_kib(10);
        assert_eq!(opts.max_recv_speed, Some(10 * 1024));
    }

    #[test]
    fn file_url_transfer_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("upstream.gz");
        std::fs::write(&src, b"fresh image").unwrap();
        let dest = dir.path().join("local/image.gz");

        let t = CurlTransfer::new(TransferOptions::default().with_rate_limit_kib(0));
        let n = t.fetch(&format!("file://{}", src.display()), &dest).unwrap();
        assert_eq!(n, 11);
        assert_eq!(std::fs::read(&dest).unwrap(), b"fresh image");
        assert!(!crate::storage::temp_path(&dest).exists());
    }

    #[test]
    fn rename_failure_is_storage_error_and_leaves_no_part() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("upstream.gz");
        std::fs::write(&src, b"fresh image").unwrap();
        let dest = dir.path().join("image.gz");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("occupied"), b"x").unwrap();

        let t = CurlTransfer::new(TransferOptions::default().with_rate_limit_kib(0));
        let err = t.fetch(&format!("file://{}", src.display()), &dest).unwrap_err();
        assert!(matches!(err, TransferError::Storage(_)));
        assert!(!crate::storage::temp_path(&dest).exists());
    }

    #[test]
    fn missing_file_url_fails_and_keeps_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("image.gz");
        std::fs::write(&dest, b"old").unwrap();

        let t = CurlTransfer::default();
        let url = format!("file://{}", dir.path().join("absent").display());
        assert!(matches!(t.fetch(&url, &dest), Err(TransferError::Curl(_))));
        assert_eq!(std::fs::read(&dest).unwrap(), b"old");
    }
}
