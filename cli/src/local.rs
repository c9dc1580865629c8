//! Collect local files into [`FileRecord`]s.
//!
//! Mirrors what the release pipeline returns so the `files` command can
//! stage local inputs the same way it stages release entries.

use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use forgefetch::FileRecord;
use log::debug;

use crate::error::{CliError, Result};

/// Read every path in `paths`, expanding directories recursively.
///
/// Records are named by base name only. Directory contents are visited in
/// name order so the result is deterministic.
///
/// # Errors
///
/// Returns [`CliError::ReadInput`] for the first path that cannot be read
/// and [`CliError::NonUtf8Path`] for directory entries with non-UTF-8 names.
pub fn collect_local_files<P: AsRef<Utf8Path>>(paths: &[P]) -> Result<Vec<FileRecord>> {
    let mut records = Vec::new();
    for path in paths {
        collect_into(path.as_ref(), &mut records)?;
    }
    Ok(records)
}

fn collect_into(path: &Utf8Path, records: &mut Vec<FileRecord>) -> Result<()> {
    debug!("processing {path}");
    let read_error = |source| CliError::ReadInput {
        path: path.to_owned(),
        source,
    };
    let metadata = std::fs::metadata(path).map_err(read_error)?;

    if metadata.is_dir() {
        let mut children = std::fs::read_dir(path)
            .map_err(read_error)?
            .map(|entry| {
                let entry = entry.map_err(read_error)?;
                Utf8PathBuf::from_path_buf(entry.path()).map_err(|p| CliError::NonUtf8Path {
                    path: p.to_string_lossy().into_owned(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        children.sort();
        for child in &children {
            collect_into(child, records)?;
        }
        return Ok(());
    }

    let content = std::fs::read(path).map_err(read_error)?;
    let name = path.file_name().unwrap_or(path.as_str());
    records.push(FileRecord::new(
        name,
        modification_time(metadata.modified().ok()),
        content,
    ));
    Ok(())
}

/// Unavailable or epoch timestamps count as unset.
fn modification_time(modified: Option<SystemTime>) -> Option<DateTime<Utc>> {
    modified
        .filter(|time| *time > SystemTime::UNIX_EPOCH)
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    #[fixture]
    fn tree() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp dir");
        std::fs::create_dir_all(root.join("assets/icons")).expect("create tree");
        std::fs::write(root.join("assets/b.txt"), b"bee").expect("write b");
        std::fs::write(root.join("assets/a.txt"), b"ay").expect("write a");
        std::fs::write(root.join("assets/icons/icon.sys"), b"icon").expect("write icon");
        std::fs::write(root.join("README.md"), b"readme").expect("write readme");
        (dir, root)
    }

    #[rstest]
    fn directories_expand_recursively_in_name_order(tree: (TempDir, Utf8PathBuf)) {
        let (_dir, root) = tree;

        let records = collect_local_files(&[root.join("assets")]).expect("collect");

        let names: Vec<&str> = records.iter().map(FileRecord::name).collect();
        assert_eq!(names, ["a.txt", "b.txt", "icon.sys"]);
        assert_eq!(records.last().map(FileRecord::content), Some(&b"icon"[..]));
    }

    #[rstest]
    fn files_keep_their_modification_time(tree: (TempDir, Utf8PathBuf)) {
        let (_dir, root) = tree;
        let path = root.join("README.md");
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        File::options()
            .write(true)
            .open(&path)
            .and_then(|file| file.set_modified(stamp))
            .expect("set mtime");

        let records = collect_local_files(&[path]).expect("collect");

        let record = records.first().expect("one record");
        assert_eq!(record.name(), "README.md");
        assert_eq!(record.modified_at(), DateTime::<Utc>::from(stamp));
        assert_eq!(record.created_at(), record.modified_at());
    }

    #[test]
    fn epoch_timestamp_counts_as_unset() {
        assert!(modification_time(Some(SystemTime::UNIX_EPOCH)).is_none());
        assert!(modification_time(None).is_none());
    }

    #[rstest]
    fn missing_path_is_read_error(tree: (TempDir, Utf8PathBuf)) {
        let (_dir, root) = tree;

        let err = collect_local_files(&[root.join("absent.elf")]).expect_err("missing file");

        assert!(matches!(err, CliError::ReadInput { .. }), "got {err:?}");
    }
}
