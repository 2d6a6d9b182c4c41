pub mod config;
pub mod logging;

pub mod artifact;
pub mod checksum;
pub mod downloader;
pub mod manifest;
pub mod retry;
pub mod storage;
pub mod verify;

pub use artifact::Artifact;
pub use downloader::{CurlTransfer, Transfer, TransferOptions};
pub use manifest::{ChecksumSource, FetchError, HttpManifest};
pub use verify::{DownloadError, VerifiedDownloader, VerifiedResult};
