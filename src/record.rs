//! In-memory file records produced by the pipeline.

use chrono::{DateTime, Utc};

/// One extracted file: base name, timestamp, and content.
///
/// Archives do not distinguish creation from modification, so both
/// timestamps are always equal.
///
/// # Examples
///
/// ```
/// use forgefetch::record::FileRecord;
///
/// let record = FileRecord::new("nhddl.elf", None, b"\x7fELF".to_vec());
/// assert_eq!(record.created_at(), record.modified_at());
/// assert_eq!(record.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    name: String,
    timestamp: DateTime<Utc>,
    content: Vec<u8>,
}

impl FileRecord {
    /// Build a record. A missing timestamp is replaced with the current
    /// wall-clock time.
    #[must_use]
    pub fn new(name: impl Into<String>, modified_at: Option<DateTime<Utc>>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            timestamp: modified_at.unwrap_or_else(Utc::now),
            content,
        }
    }

    /// The file's base name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation time; always equal to [`Self::modified_at`].
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Modification time.
    #[must_use]
    pub const fn modified_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The file content.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true for empty files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Consume the record and return its content.
    #[must_use]
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}
