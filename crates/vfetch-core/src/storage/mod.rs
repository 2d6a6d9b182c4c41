//! Disk side of a transfer.
//!
//! Bodies are written to `<local_path>.part` and atomically renamed into
//! place once complete, so `local_path` only ever holds a finished transfer.
//! A `.part` left behind by a killed run is truncated by the next transfer.

mod writer;

pub use writer::StorageWriter;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `image.gz` → `image.gz.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("image.gz"));
        assert_eq!(p.to_string_lossy(), "image.gz.part");
        let p2 = temp_path(Path::new("/srv/recovery/image.gz"));
        assert_eq!(p2.to_string_lossy(), "/srv/recovery/image.gz.part");
    }

    #[test]
    fn create_write_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("image.gz");
        let tp = temp_path(&final_path);

        let mut writer = StorageWriter::create(&tp).unwrap();
        writer.write_chunk(b"hello ").unwrap();
        writer.write_chunk(b"world").unwrap();
        assert_eq!(writer.written(), 11);
        writer.sync().unwrap();
        writer.finalize(&final_path).unwrap();

        assert!(!tp.exists());
        assert_eq!(std::fs::read(&final_path).unwrap(), b"hello world");
    }

    #[test]
    fn create_truncates_stale_part_and_replaces_final() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("image.gz");
        let tp = temp_path(&final_path);
        std::fs::write(&tp, b"stale partial body from a killed run").unwrap();
        std::fs::write(&final_path, b"old").unwrap();

        let mut writer = StorageWriter::create(&tp).unwrap();
        writer.write_chunk(b"new").unwrap();
        writer.finalize(&final_path).unwrap();

        assert_eq!(std::fs::read(&final_path).unwrap(), b"new");
    }

    #[test]
    fn failed_finalize_removes_part() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("image.gz");
        std::fs::create_dir(&final_path).unwrap();
        std::fs::write(final_path.join("keep"), b"x").unwrap();
        let tp = temp_path(&final_path);

        let mut writer = StorageWriter::create(&tp).unwrap();
        writer.write_chunk(b"body").unwrap();
        assert!(writer.finalize(&final_path).is_err());
        assert!(!tp.exists());
    }

    #[test]
    fn create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let tp = dir.path().join("nested/deeper/image.gz.part");
        let mut writer = StorageWriter::create(&tp).unwrap();
        writer.write_chunk(b"x").unwrap();
        writer.discard();
        assert!(!tp.exists());
    }
}
