//! Verified download: make `local_path` hold a file whose checksum matches
//! the manifest, downloading at most once per attempt.
//!
//! Each attempt fetches the expected checksum fresh, downloads when the
//! artifact is `Absent`, then verifies. A file already on disk is verified
//! first and only downloaded after it fails to match.

mod error;

pub use error::{
    DownloadError, EXIT_MANIFEST, EXIT_OTHER, EXIT_RETRIES_EXHAUSTED, EXIT_TRANSFER_FAILED,
};

use crate::artifact::Artifact;
use crate::checksum::{self, ChecksumKind};
use crate::downloader::{Transfer, TransferError};
use crate::manifest::{ChecksumSource, FetchError};
use crate::retry::{classify_transfer, RetryDecision, RetryPolicy};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Where an artifact is in the fetch/verify cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyState {
    Absent,
    Downloading,
    Verifying,
    Verified,
    Failed,
}

impl fmt::Display for VerifyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerifyState::Absent => "absent",
            VerifyState::Downloading => "downloading",
            VerifyState::Verifying => "verifying",
            VerifyState::Verified => "verified",
            VerifyState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Successful outcome of `ensure_verified`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedResult {
    pub name: String,
    pub path: PathBuf,
    /// Attempts used, including the successful one.
    pub attempts: u32,
    /// Transfers started (0 when the local file already matched).
    pub downloads: u32,
    pub checksum: String,
    pub kind: ChecksumKind,
}

/// Why a single attempt did not end in `Verified`.
#[derive(Debug)]
enum AttemptFailure {
    Manifest(FetchError),
    Transfer(TransferError),
    Mismatch { expected: String, actual: String },
}

impl AttemptFailure {
    fn into_error(self, attempts: u32) -> DownloadError {
        match self {
            AttemptFailure::Manifest(last) => DownloadError::Manifest { attempts, last },
            AttemptFailure::Transfer(last) => DownloadError::TransferFailed { attempts, last },
            AttemptFailure::Mismatch { expected, actual } => DownloadError::RetriesExhausted {
                attempts,
                expected,
                actual,
            },
        }
    }
}

/// Drives the fetch/verify state machine for one artifact at a time.
///
/// Runs sequentially on the calling thread; the delay between attempts is a
/// blocking sleep.
pub struct VerifiedDownloader<S, T> {
    source: S,
    transfer: T,
    policy: RetryPolicy,
}

impl<S: ChecksumSource, T: Transfer> VerifiedDownloader<S, T> {
    pub fn new(source: S, transfer: T) -> Self {
        Self {
            source,
            transfer,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ensure `artifact.local_path` matches the manifest, downloading if needed.
    /// A matching file already on disk is accepted without any transfer.
    pub fn ensure_verified(&self, artifact: &Artifact) -> Result<VerifiedResult, DownloadError> {
        self.run(artifact, false)
    }

    /// Like `ensure_verified` but always downloads before the first verification.
    pub fn refetch(&self, artifact: &Artifact) -> Result<VerifiedResult, DownloadError> {
        self.run(artifact, true)
    }

    fn run(&self, artifact: &Artifact, force: bool) -> Result<VerifiedResult, DownloadError> {
        let max_attempts = self.policy.max_attempts;
        if max_attempts == 0 {
            return Err(DownloadError::InvalidBudget);
        }
        let name = artifact.name.as_str();
        let path = artifact.local_path.as_path();

        let mut state = if !force && path.is_file() {
            VerifyState::Verifying
        } else {
            VerifyState::Absent
        };
        let mut downloads = 0u32;
        let mut attempt = 1u32;

        loop {
            tracing::debug!(artifact = name, attempt, max_attempts, %state, "attempt started");
            match self.attempt(artifact, &mut state, &mut downloads) {
                Ok((checksum, kind)) => {
                    tracing::info!(
                        artifact = name,
                        attempt,
                        downloads,
                        %kind,
                        checksum = %checksum,
                        "checksum verified"
                    );
                    return Ok(VerifiedResult {
                        name: name.to_string(),
                        path: path.to_path_buf(),
                        attempts: attempt,
                        downloads,
                        checksum,
                        kind,
                    });
                }
                Err(failure) => {
                    log_failure(name, attempt, max_attempts, &failure);
                    match self.policy.decide(attempt) {
                        RetryDecision::NoRetry => {
                            state = VerifyState::Failed;
                            tracing::error!(
                                artifact = name,
                                attempts = attempt,
                                %state,
                                "retries exhausted"
                            );
                            return Err(failure.into_error(attempt));
                        }
                        RetryDecision::RetryAfter(delay) => {
                            tracing::warn!(
                                artifact = name,
                                attempt,
                                max_attempts,
                                delay_secs = delay.as_secs_f64(),
                                "retrying"
                            );
                            if !delay.is_zero() {
                                std::thread::sleep(delay);
                            }
                            attempt += 1;
                        }
                    }
                }
            }
        }
    }

    /// One manifest lookup, an optional download, and one verification.
    /// Leaves `state` at `Absent` after a mismatch so the next attempt downloads.
    fn attempt(
        &self,
        artifact: &Artifact,
        state: &mut VerifyState,
        downloads: &mut u32,
    ) -> Result<(String, ChecksumKind), AttemptFailure> {
        let name = artifact.name.as_str();
        let expected = self
            .source
            .fetch_expected(name)
            .map_err(AttemptFailure::Manifest)?
            .to_ascii_lowercase();
        let kind = ChecksumKind::detect(&expected).ok_or_else(|| {
            AttemptFailure::Manifest(FetchError::Malformed {
                reason: format!("unsupported checksum {:?} for {}", expected, name),
            })
        })?;

        if *state == VerifyState::Absent {
            *state = VerifyState::Downloading;
            *downloads += 1;
            tracing::info!(artifact = name, url = %artifact.remote_url, "download started");
            match self.transfer.fetch(&artifact.remote_url, &artifact.local_path) {
                Ok(bytes) => {
                    tracing::info!(artifact = name, bytes, "download complete");
                    *state = VerifyState::Verifying;
                }
                Err(e) => {
                    *state = VerifyState::Absent;
                    return Err(AttemptFailure::Transfer(e));
                }
            }
        }

        let actual = match checksum::digest_path(&artifact.local_path, kind) {
            Ok(actual) => actual,
            Err(e) => {
                *state = VerifyState::Absent;
                return Err(AttemptFailure::Transfer(TransferError::storage(e)));
            }
        };
        if actual == expected {
            *state = VerifyState::Verified;
            return Ok((actual, kind));
        }
        *state = VerifyState::Absent;
        Err(AttemptFailure::Mismatch { expected, actual })
    }
}

fn log_failure(name: &str, attempt: u32, max_attempts: u32, failure: &AttemptFailure) {
    match failure {
        AttemptFailure::Manifest(e) => {
            tracing::warn!(artifact = name, attempt, max_attempts, "manifest lookup failed: {}", e)
        }
        AttemptFailure::Transfer(e) => tracing::warn!(
            artifact = name,
            attempt,
            max_attempts,
            kind = ?classify_transfer(e),
            "transfer failed: {}",
            e
        ),
        AttemptFailure::Mismatch { expected, actual } => tracing::warn!(
            artifact = name,
            attempt,
            max_attempts,
            expected = %expected,
            actual = %actual,
            "checksum mismatch"
        ),
    }
}
