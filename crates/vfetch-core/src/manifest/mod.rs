//! Remote checksum manifest lookup.
//!
//! The manifest is a plain-text listing of `checksum filename` lines. It is
//! fetched fresh on every call so upstream republishing is picked up between
//! attempts.

mod parse;

pub(crate) use parse::find_checksum;

use std::str;
use std::time::Duration;

/// Why the expected checksum could not be determined.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("manifest {url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },
    #[error("no manifest entry for {name}")]
    NotFound { name: String },
    #[error("malformed manifest: {reason}")]
    Malformed { reason: String },
}

/// Source of the expected checksum for a named artifact.
pub trait ChecksumSource {
    /// Returns the current expected checksum for `name` as lowercase hex.
    fn fetch_expected(&self, name: &str) -> Result<String, FetchError>;
}

/// Manifest served over HTTP(S) or `file://`, fetched with one GET per lookup.
#[derive(Debug, Clone)]
pub struct HttpManifest {
    url: String,
    connect_timeout: Duration,
    timeout: Duration,
}

impl HttpManifest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn unreachable(&self, reason: impl ToString) -> FetchError {
        FetchError::Unreachable {
            url: self.url.clone(),
            reason: reason.to_string(),
        }
    }

    /// GET the manifest body.
    fn download_body(&self) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&self.url).map_err(|e| self.unreachable(e))?;
        easy.follow_location(true).map_err(|e| self.unreachable(e))?;
        easy.max_redirections(10).map_err(|e| self.unreachable(e))?;
        easy.connect_timeout(self.connect_timeout)
            .map_err(|e| self.unreachable(e))?;
        easy.timeout(self.timeout).map_err(|e| self.unreachable(e))?;

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(|e| self.unreachable(e))?;
            transfer.perform().map_err(|e| self.unreachable(e))?;
        }

        let code = easy.response_code().map_err(|e| self.unreachable(e))?;
        // file:// transfers carry no status code.
        if code != 0 && !(200..300).contains(&code) {
            return Err(self.unreachable(format!("HTTP {}", code)));
        }
        Ok(body)
    }
}

impl ChecksumSource for HttpManifest {
    fn fetch_expected(&self, name: &str) -> Result<String, FetchError> {
        let body = self.download_body()?;
        let text = str::from_utf8(&body).map_err(|e| FetchError::Malformed {
            reason: format!("manifest is not UTF-8: {}", e),
        })?;
        tracing::debug!(url = %self.url, bytes = body.len(), "fetched manifest");
        find_checksum(text, name)
    }
}
