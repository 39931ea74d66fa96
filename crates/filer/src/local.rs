// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::filer::{DeleteMode, FileInfo, FileReader, Filer, WriteMode, sort_entries};
use crate::path::{RootPath, basename, dirname};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// A filer over the host filesystem.
///
/// All I/O goes through `tokio::fs`. Listings include hidden entries.
#[derive(Debug, Clone)]
pub struct LocalFiler {
    root: RootPath,
}

impl LocalFiler {
    /// Create a local filer. An empty root leaves paths unrestricted and
    /// relative to the current directory.
    #[must_use]
    pub fn new(root: &str) -> Self {
        Self {
            root: RootPath::new(root),
        }
    }

    fn resolve(&self, name: &str) -> Result<String> {
        self.root.join(name)
    }

    fn file_info(name: String, metadata: &std::fs::Metadata) -> FileInfo {
        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        let info = if metadata.is_dir() {
            FileInfo::directory(name)
        } else {
            FileInfo::file(name, metadata.len() as i64)
        };
        info.with_modified(modified)
    }
}

#[async_trait]
impl Filer for LocalFiler {
    async fn write(&self, name: &str, mut reader: FileReader, mode: WriteMode) -> Result<()> {
        let path = self.resolve(name)?;
        let parent = dirname(&path);

        if mode.create_parents() {
            tokio::fs::create_dir_all(&parent).await.map_err(|e| {
                match e.kind() {
                    ErrorKind::NotADirectory | ErrorKind::AlreadyExists => {
                        Error::not_a_directory(&parent)
                    }
                    _ => e.into(),
                }
            })?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        _ = options.write(true);
        if mode.overwrite() {
            _ = options.create(true).truncate(true);
        } else {
            _ = options.create_new(true);
        }

        let mut file = options.open(PathBuf::from(&path)).await.map_err(|e| {
            match e.kind() {
                ErrorKind::NotFound => Error::no_such_directory(&parent),
                ErrorKind::NotADirectory => Error::not_a_directory(&parent),
                ErrorKind::AlreadyExists => Error::file_already_exists(&path),
                ErrorKind::IsADirectory => Error::not_a_file(&path),
                _ => e.into(),
            }
        })?;

        log::debug!("writing local file {}", path);
        _ = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<FileReader> {
        let path = self.resolve(name)?;
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::NotADirectory => Error::file_does_not_exist(&path),
            _ => e.into(),
        })?;
        if metadata.is_dir() {
            return Err(Error::not_a_file(&path));
        }
        let file = tokio::fs::File::open(&path).await?;
        Ok(Box::pin(file))
    }

    async fn delete(&self, name: &str, mode: DeleteMode) -> Result<()> {
        let path = self.resolve(name)?;
        let metadata = tokio::fs::symlink_metadata(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::NotADirectory => {
                    Error::file_does_not_exist(&path)
                }
                _ => e.into(),
            })?;

        if !metadata.is_dir() {
            tokio::fs::remove_file(&path).await?;
            return Ok(());
        }

        if mode.recursive() {
            tokio::fs::remove_dir_all(&path).await?;
            return Ok(());
        }

        tokio::fs::remove_dir(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::DirectoryNotEmpty => Error::directory_not_empty(&path),
                _ => e.into(),
            })
    }

    async fn read_dir(&self, name: &str) -> Result<Vec<FileInfo>> {
        let path = self.resolve(name)?;
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::no_such_directory(&path),
            ErrorKind::NotADirectory => Error::not_a_directory(&path),
            _ => e.into(),
        })?;
        if !metadata.is_dir() {
            return Err(Error::not_a_directory(&path));
        }

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let metadata = entry.metadata().await?;
            entries.push(Self::file_info(name, &metadata));
        }
        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn mkdir(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        if let Ok(metadata) = tokio::fs::metadata(&path).await {
            if !metadata.is_dir() {
                return Err(Error::not_a_directory(&path));
            }
            return Ok(());
        }
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotADirectory | ErrorKind::AlreadyExists => {
                    Error::not_a_directory(&path)
                }
                _ => e.into(),
            })
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        let path = self.resolve(name)?;
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::NotADirectory => Error::file_does_not_exist(&path),
            _ => e.into(),
        })?;
        let name = basename(&path).unwrap_or_else(|| path.clone());
        Ok(Self::file_info(name, &metadata))
    }
}
