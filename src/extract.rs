//! ZIP extraction of named entries into [`FileRecord`]s.
//!
//! The archive is parsed from memory through its central directory. Entries
//! are matched on their full in-archive path; the resulting records carry
//! only the final path segment as their name.

use std::io::{Cursor, Read};

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use zip::ZipArchive;

use crate::error::{FetchError, Result};
use crate::record::FileRecord;

/// Metadata for one archive entry, read from the central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ArchiveEntry {
    path: String,
    is_directory: bool,
    modified_at: Option<DateTime<Utc>>,
}

impl ArchiveEntry {
    fn base_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Extract every non-directory entry whose path equals one of `targets`.
///
/// Records follow archive order, not the order of `targets`. Entries
/// without a usable timestamp are stamped with the extraction time.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] if the archive or an entry cannot be
/// read, and [`FetchError::NotFound`] if no entry matched.
pub fn extract<S: AsRef<str>>(archive: &[u8], targets: &[S]) -> Result<Vec<FileRecord>> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(|e| FetchError::Decode {
        what: "archive",
        reason: e.to_string(),
    })?;

    let extracted_at = Utc::now();
    let mut records = Vec::with_capacity(targets.len());
    for index in 0..zip.len() {
        let mut file = zip.by_index(index).map_err(|e| FetchError::Decode {
            what: "archive entry",
            reason: e.to_string(),
        })?;
        let entry = ArchiveEntry {
            path: file.name().to_owned(),
            is_directory: file.is_dir(),
            modified_at: file.last_modified().and_then(to_utc),
        };
        if entry.is_directory || !targets.iter().any(|t| t.as_ref() == entry.path) {
            continue;
        }

        debug!("adding {}", entry.path);
        let mut content = Vec::with_capacity(capacity_hint(file.size(), archive.len()));
        file.read_to_end(&mut content).map_err(|e| FetchError::Decode {
            what: "archive entry",
            reason: format!("{}: {e}", entry.path),
        })?;
        records.push(FileRecord::new(
            entry.base_name(),
            Some(entry.modified_at.unwrap_or(extracted_at)),
            content,
        ));
    }

    if records.is_empty() {
        return Err(FetchError::not_found("matching archive entries"));
    }
    Ok(records)
}

/// Preallocation for an entry declaring `declared` uncompressed bytes.
///
/// The declared size is untrusted, so the hint never exceeds the size of the
/// archive itself; larger entries grow the buffer as they are read.
fn capacity_hint(declared: u64, archive_len: usize) -> usize {
    usize::try_from(declared).map_or(archive_len, |size| size.min(archive_len))
}

/// Convert a DOS timestamp. Unset or invalid dates yield `None`.
fn to_utc(stamp: zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(
        i32::from(stamp.year()),
        u32::from(stamp.month()),
        u32::from(stamp.day()),
    )?
    .and_hms_opt(
        u32::from(stamp.hour()),
        u32::from(stamp.minute()),
        u32::from(stamp.second()),
    )
    .map(|naive| naive.and_utc())
}
