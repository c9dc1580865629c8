//! Fixtures shared by unit and behaviour tests.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// One entry to place in a fixture archive.
#[derive(Debug, Clone)]
pub struct ArchiveFixture {
    path: String,
    content: Option<Vec<u8>>,
    modified: Option<(u16, u8, u8, u8, u8, u8)>,
}

impl ArchiveFixture {
    /// A regular file entry.
    #[must_use]
    pub fn file(path: &str, content: &[u8]) -> Self {
        Self {
            path: path.to_owned(),
            content: Some(content.to_vec()),
            modified: None,
        }
    }

    /// A directory entry; `path` should end with `/`.
    #[must_use]
    pub fn dir(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            content: None,
            modified: None,
        }
    }

    /// Record an explicit modification time (UTC, even seconds only).
    #[must_use]
    pub const fn modified(mut self, year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        self.modified = Some((year, month, day, hour, minute, second));
        self
    }
}

/// Build an in-memory ZIP archive from `entries`, in order.
///
/// # Panics
///
/// Panics if the archive cannot be written or a timestamp is out of the
/// DOS range.
#[must_use]
#[expect(clippy::expect_used, reason = "fixture construction failures are test bugs")]
pub fn zip_archive(entries: &[ArchiveFixture]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        let mut options = SimpleFileOptions::default();
        if let Some((year, month, day, hour, minute, second)) = entry.modified {
            let stamp = zip::DateTime::from_date_and_time(year, month, day, hour, minute, second)
                .expect("fixture timestamp within DOS range");
            options = options.last_modified_time(stamp);
        }
        let Some(content) = &entry.content else {
            writer
                .add_directory(entry.path.as_str(), options)
                .expect("add fixture directory");
            continue;
        };
        writer
            .start_file(entry.path.as_str(), options)
            .expect("start fixture file");
        writer.write_all(content).expect("write fixture file");
    }
    writer.finish().expect("finish fixture archive").into_inner()
}

/// An archive laid out like a typical release bundle: `nhddl.elf`
/// (100 bytes) and `nhddl-standalone.elf` (120 bytes) at the archive root
/// next to a readme, plus a `docs/` directory.
#[must_use]
pub fn release_bundle() -> Vec<u8> {
    zip_archive(&[
        ArchiveFixture::file("README.md", b"# nhddl\n"),
        ArchiveFixture::file("nhddl.elf", &[0x11; 100]).modified(2024, 9, 1, 18, 4, 10),
        ArchiveFixture::file("nhddl-standalone.elf", &[0x22; 120]).modified(2024, 9, 1, 18, 4, 12),
        ArchiveFixture::dir("docs/"),
        ArchiveFixture::file("docs/usage.txt", b"usage"),
    ])
}
