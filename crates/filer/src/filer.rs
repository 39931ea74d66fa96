// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::BitOr;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// A single-shot byte stream handed to or returned from a filer
pub type FileReader = Pin<Box<dyn AsyncRead + Send>>;

/// Wrap an in-memory buffer as a [`FileReader`]
#[must_use]
pub fn reader_from_bytes<B: Into<Vec<u8>>>(bytes: B) -> FileReader {
    Box::pin(std::io::Cursor::new(bytes.into()))
}

/// How `write` treats an existing target and a missing parent.
///
/// The two flags are orthogonal and combine with `|`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteMode {
    overwrite: bool,
    create_parents: bool,
}

impl WriteMode {
    pub const OVERWRITE_IF_EXISTS: WriteMode = WriteMode {
        overwrite: true,
        create_parents: false,
    };

    pub const CREATE_PARENT_DIRECTORIES: WriteMode = WriteMode {
        overwrite: false,
        create_parents: true,
    };

    #[must_use]
    pub const fn overwrite(self) -> bool {
        self.overwrite
    }

    #[must_use]
    pub const fn create_parents(self) -> bool {
        self.create_parents
    }
}

impl BitOr for WriteMode {
    type Output = WriteMode;

    fn bitor(self, rhs: WriteMode) -> WriteMode {
        WriteMode {
            overwrite: self.overwrite || rhs.overwrite,
            create_parents: self.create_parents || rhs.create_parents,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteMode {
    recursive: bool,
}

impl DeleteMode {
    pub const RECURSIVE: DeleteMode = DeleteMode { recursive: true };

    #[must_use]
    pub const fn recursive(self) -> bool {
        self.recursive
    }
}

/// Backend-specific object details that ride along with a [`FileInfo`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata {
    pub object_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// What a filer knows about one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Final path component, or the full path for a root
    pub name: String,
    pub is_dir: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMetadata>,
}

impl FileInfo {
    pub fn file<N: Into<String>>(name: N, size: i64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size: Some(size),
            modified: None,
            metadata: None,
        }
    }

    pub fn directory<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: None,
            modified: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_modified(mut self, modified: Option<DateTime<Utc>>) -> Self {
        self.modified = modified;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Option<ObjectMetadata>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Convert milliseconds since the epoch, as remote APIs report them
#[must_use]
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}

/// Sort listing entries by name, the order every backend returns
pub fn sort_entries(entries: &mut [FileInfo]) {
    entries.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Uniform file operations over one backend, confined to a root.
///
/// Names are resolved against the filer's root before use; a name that
/// would leave the root fails with `PathEscapesRoot`.
#[async_trait]
pub trait Filer: Send + Sync {
    /// Write the reader's bytes to `name`.
    async fn write(&self, name: &str, reader: FileReader, mode: WriteMode) -> Result<()>;

    /// Open `name` for reading. The reader is consumed once.
    async fn read(&self, name: &str) -> Result<FileReader>;

    async fn delete(&self, name: &str, mode: DeleteMode) -> Result<()>;

    /// List a directory, sorted by name
    async fn read_dir(&self, name: &str) -> Result<Vec<FileInfo>>;

    /// Create a directory and any missing parents. Existing directories are fine.
    async fn mkdir(&self, name: &str) -> Result<()>;

    async fn stat(&self, name: &str) -> Result<FileInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_mode_combines() {
        let mode = WriteMode::OVERWRITE_IF_EXISTS | WriteMode::CREATE_PARENT_DIRECTORIES;
        assert!(mode.overwrite());
        assert!(mode.create_parents());

        let plain = WriteMode::default();
        assert!(!plain.overwrite());
        assert!(!plain.create_parents());

        assert_eq!(
            WriteMode::CREATE_PARENT_DIRECTORIES | WriteMode::CREATE_PARENT_DIRECTORIES,
            WriteMode::CREATE_PARENT_DIRECTORIES
        );
    }

    #[test]
    fn test_sort_entries() {
        let mut entries = vec![
            FileInfo::file("b", 1),
            FileInfo::directory("a"),
            FileInfo::file("B", 2),
        ];
        sort_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "a", "b"]);
    }

    #[test]
    fn test_millis_to_datetime() {
        assert!(millis_to_datetime(0).is_none());
        let dt = millis_to_datetime(1_700_000_000_000).unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }
}
