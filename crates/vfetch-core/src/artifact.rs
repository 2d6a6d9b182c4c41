//! The file being fetched and verified, and how its manifest name is derived.

use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A remote file mirrored to a fixed local path.
///
/// `name` is the entry looked up in the checksum manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub name: String,
    pub local_path: PathBuf,
    pub remote_url: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("artifact name must not be empty")]
    EmptyName,
    #[error("cannot derive an artifact name from {url} or {path}")]
    NoName { url: String, path: String },
}

impl Artifact {
    pub fn new(
        name: impl Into<String>,
        local_path: impl Into<PathBuf>,
        remote_url: impl Into<String>,
    ) -> Result<Self, ArtifactError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ArtifactError::EmptyName);
        }
        Ok(Self {
            name,
            local_path: local_path.into(),
            remote_url: remote_url.into(),
        })
    }

    /// Build an artifact whose manifest name is the last path segment of
    /// `remote_url`, or failing that the file name of `local_path`.
    pub fn from_url(
        local_path: impl Into<PathBuf>,
        remote_url: impl Into<String>,
    ) -> Result<Self, ArtifactError> {
        let local_path = local_path.into();
        let remote_url = remote_url.into();
        let name = filename_from_url_path(&remote_url)
            .or_else(|| filename_from_path(&local_path))
            .ok_or_else(|| ArtifactError::NoName {
                url: remote_url.clone(),
                path: local_path.display().to_string(),
            })?;
        Self::new(name, local_path, remote_url)
    }
}

/// Extracts the last path segment from a URL, percent-decoded.
///
/// Returns `None` if the URL cannot be parsed, the path is empty/root, or the
/// decoded segment is not UTF-8.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    if decoded.is_empty() || decoded == "." || decoded == ".." || decoded.contains('/') {
        return None;
    }
    Some(decoded.into_owned())
}

fn filename_from_path(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}
