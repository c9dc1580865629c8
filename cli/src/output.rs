//! Writing records and user-facing messages.

use std::fs::File;
use std::io::Write;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use forgefetch::{FileRecord, Tag};

use crate::error::{CliError, Result};

/// Write each record into `out_dir`, creating the directory if needed.
///
/// Files are named by the record name and stamped with its modification
/// time. Returns the written paths in record order.
///
/// # Errors
///
/// Returns [`CliError::WriteOutput`] for the first path that cannot be
/// created, written, or stamped.
pub fn write_records(out_dir: &Utf8Path, records: &[FileRecord]) -> Result<Vec<Utf8PathBuf>> {
    std::fs::create_dir_all(out_dir).map_err(|source| CliError::WriteOutput {
        path: out_dir.to_owned(),
        source,
    })?;

    records
        .iter()
        .map(|record| {
            let path = out_dir.join(record.name());
            write_record(&path, record).map_err(|source| CliError::WriteOutput {
                path: path.clone(),
                source,
            })?;
            Ok(path)
        })
        .collect()
}

fn write_record(path: &Utf8Path, record: &FileRecord) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(record.content())?;
    file.set_modified(SystemTime::from(record.modified_at()))?;
    Ok(())
}

/// Print the tag list in the form `Available tags:` followed by one tag
/// per line.
pub fn print_tags(out: &mut dyn Write, tags: &[Tag]) -> std::io::Result<()> {
    writeln!(out, "Available tags:")?;
    for tag in tags {
        writeln!(out, "{}", tag.as_str())?;
    }
    Ok(())
}

/// Write a line to stderr, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort; nothing useful to do if stderr is gone.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn out_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join("out")).expect("UTF-8 temp dir")
    }

    #[test]
    fn writes_content_and_timestamp() {
        let dir = TempDir::new().expect("create temp dir");
        let at = Utc
            .with_ymd_and_hms(2024, 9, 1, 18, 4, 10)
            .single()
            .expect("valid date");
        let records = [
            FileRecord::new("nhddl.elf", Some(at), vec![0x11; 100]),
            FileRecord::new("nhddl.yaml", Some(at), b"mode: ata\n".to_vec()),
        ];

        let written = write_records(&out_dir(&dir), &records).expect("write records");

        assert_eq!(written.len(), 2);
        let first = written.first().expect("first path");
        assert_eq!(first.file_name(), Some("nhddl.elf"));
        assert_eq!(std::fs::read(first).expect("read back"), vec![0x11; 100]);
        let modified = std::fs::metadata(first)
            .and_then(|m| m.modified())
            .expect("mtime");
        assert_eq!(modified, SystemTime::from(at));
    }

    #[test]
    fn tags_are_listed_one_per_line() {
        let mut out = Vec::new();
        print_tags(&mut out, &[Tag::new("nightly"), Tag::new("v2.0.0")]).expect("print");
        assert_eq!(
            String::from_utf8(out).expect("UTF-8 output"),
            "Available tags:\nnightly\nv2.0.0\n"
        );
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let dir = TempDir::new().expect("create temp dir");
        let blocker = out_dir(&dir);
        std::fs::write(&blocker, b"not a directory").expect("write blocker");

        let err = write_records(&blocker, &[FileRecord::new("a", None, Vec::new())])
            .expect_err("out dir is a file");

        assert!(matches!(err, CliError::WriteOutput { .. }), "got {err:?}");
    }
}
