//! Terminal failures of `ensure_verified`.

use crate::downloader::TransferError;
use crate::manifest::FetchError;

/// Exit code for a run whose checksum never matched.
pub const EXIT_RETRIES_EXHAUSTED: i32 = 3;
/// Exit code for a run whose last attempt failed in the transfer.
pub const EXIT_TRANSFER_FAILED: i32 = 4;
/// Exit code for a run whose last attempt could not read the manifest.
pub const EXIT_MANIFEST: i32 = 5;
/// Exit code for anything else (bad arguments, config).
pub const EXIT_OTHER: i32 = 1;

/// Why the artifact could not be verified. The variant reflects the last attempt.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("attempt budget must be at least 1")]
    InvalidBudget,
    #[error("checksum mismatch after {attempts} attempt(s): expected {expected}, got {actual}")]
    RetriesExhausted {
        attempts: u32,
        expected: String,
        actual: String,
    },
    #[error("transfer failed after {attempts} attempt(s)")]
    TransferFailed {
        attempts: u32,
        #[source]
        last: TransferError,
    },
    #[error("manifest lookup failed after {attempts} attempt(s)")]
    Manifest {
        attempts: u32,
        #[source]
        last: FetchError,
    },
}

impl DownloadError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            DownloadError::InvalidBudget => EXIT_OTHER,
            DownloadError::RetriesExhausted { .. } => EXIT_RETRIES_EXHAUSTED,
            DownloadError::TransferFailed { .. } => EXIT_TRANSFER_FAILED,
            DownloadError::Manifest { .. } => EXIT_MANIFEST,
        }
    }

    /// Attempts consumed before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            DownloadError::InvalidBudget => 0,
            DownloadError::RetriesExhausted { attempts, .. }
            | DownloadError::TransferFailed { attempts, .. }
            | DownloadError::Manifest { attempts, .. } => *attempts,
        }
    }
}
