//! Transfer error type.

/// Error returned by a single artifact transfer (curl failure, HTTP error, or storage failure).
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Transfer completed but fewer bytes arrived than `Content-Length` announced.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Disk/storage failure while writing or hashing the artifact.
    #[error("storage: {0}")]
    Storage(#[source] std::io::Error),
}

impl TransferError {
    /// Wrap an `anyhow` error from the storage layer, keeping the io error when there is one.
    pub(crate) fn storage(e: anyhow::Error) -> Self {
        let io_err = e
            .downcast::<std::io::Error>()
            .unwrap_or_else(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("{:#}", e)));
        TransferError::Storage(io_err)
    }
}
