//! Parse `checksum filename` listings (md5sum/sha256sum output and friends).

use super::FetchError;
use crate::checksum::ChecksumKind;

/// Find the expected checksum for `name` in a manifest body.
///
/// The first whitespace-separated field of a line is the checksum; any later
/// field equal to `name` (ignoring the md5sum `*` binary marker) selects the
/// line. Blank lines, `#` comments and lines for other files are ignored.
/// Returns the digest in lowercase.
pub(crate) fn find_checksum(body: &str, name: &str) -> Result<String, FetchError> {
    if name.is_empty() {
        return Err(FetchError::NotFound {
            name: name.to_string(),
        });
    }

    let mut pairs = 0usize;
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let checksum = match fields.next() {
            Some(c) => c,
            None => continue,
        };
        let mut files = fields.map(|f| f.strip_prefix('*').unwrap_or(f)).peekable();
        if files.peek().is_none() {
            continue;
        }
        pairs += 1;
        if files.any(|f| f == name) {
            if ChecksumKind::detect(checksum).is_none() {
                return Err(FetchError::Malformed {
                    reason: format!("entry for {} has invalid checksum {:?}", name, checksum),
                });
            }
            return Ok(checksum.to_ascii_lowercase());
        }
    }

    if pairs == 0 {
        return Err(FetchError::Malformed {
            reason: "no (checksum, filename) pairs found".to_string(),
        });
    }
    Err(FetchError::NotFound {
        name: name.to_string(),
    })
}
