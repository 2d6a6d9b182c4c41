//! Content digests used to verify transfer integrity.
//!
//! Files are hashed in fixed-size chunks so memory stays bounded for large
//! images. The digest algorithm is picked from the length of the expected
//! hex digest published in the manifest.

use anyhow::{Context, Result};
use md5::Md5;
use serde::Serialize;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Digest algorithms a manifest entry may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumKind {
    Md5,
    Sha256,
    Sha512,
}

impl ChecksumKind {
    /// Detect the algorithm from the length of a hex digest.
    pub fn from_hex_length(len: usize) -> Option<Self> {
        match len {
            32 => Some(ChecksumKind::Md5),
            64 => Some(ChecksumKind::Sha256),
            128 => Some(ChecksumKind::Sha512),
            _ => None,
        }
    }

    /// Detect the algorithm for `digest`, rejecting anything that is not plain hex.
    pub fn detect(digest: &str) -> Option<Self> {
        if !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Self::from_hex_length(digest.len())
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChecksumKind::Md5 => "md5",
            ChecksumKind::Sha256 => "sha256",
            ChecksumKind::Sha512 => "sha512",
        };
        f.write_str(s)
    }
}

/// Compute the digest of a file with the given algorithm, as lowercase hex.
pub fn digest_path(path: &Path, kind: ChecksumKind) -> Result<String> {
    match kind {
        ChecksumKind::Md5 => hash_file::<Md5>(path),
        ChecksumKind::Sha256 => hash_file::<Sha256>(path),
        ChecksumKind::Sha512 => hash_file::<Sha512>(path),
    }
}

/// Compute MD5 of a file and return the digest as lowercase hex.
pub fn md5_path(path: &Path) -> Result<String> {
    hash_file::<Md5>(path)
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    hash_file::<Sha256>(path)
}

fn hash_file<D: Digest>(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
