//! Single-stream HTTP GET into a `.part` file.

use super::{TransferError, TransferOptions};
use crate::storage::{self, StorageWriter};
use std::path::Path;

/// Downloads `url` with a single GET (no Range), writing sequentially to
/// `dest.part` and renaming it over `dest` on success.
/// Returns the number of bytes written.
pub fn download_single(
    url: &str,
    dest: &Path,
    opts: &TransferOptions,
) -> Result<u64, TransferError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    if let Some(speed) = opts.max_recv_speed {
        easy.max_recv_speed(speed)?;
    }
    easy.connect_timeout(opts.connect_timeout)?;
    easy.low_speed_limit(opts.low_speed_limit)?;
    easy.low_speed_time(opts.low_speed_time)?;
    easy.timeout(opts.timeout)?;

    let temp = storage::temp_path(dest);
    let mut writer = StorageWriter::create(&temp).map_err(TransferError::storage)?;
    let mut storage_error: Option<std::io::Error> = None;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match writer.write_chunk(data) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                tracing::warn!("artifact write failed: {}", e);
                storage_error = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };

    if let Err(e) = performed {
        writer.discard();
        if e.is_write_error() {
            if let Some(io_err) = storage_error {
                return Err(TransferError::Storage(io_err));
            }
        }
        return Err(TransferError::Curl(e));
    }

    let code = easy.response_code()?;
    // file:// transfers carry no status code.
    if code != 0 && !(200..300).contains(&code) {
        writer.discard();
        return Err(TransferError::Http(code));
    }

    let received = writer.written();
    let advertised = easy.content_length_download()?;
    if advertised >= 0.0 && received != advertised as u64 {
        writer.discard();
        return Err(TransferError::PartialTransfer {
            expected: advertised as u64,
            received,
        });
    }

    if let Err(e) = writer.sync() {
        writer.discard();
        return Err(TransferError::storage(e));
    }
    writer.finalize(dest).map_err(TransferError::storage)?;
    Ok(received)
}
