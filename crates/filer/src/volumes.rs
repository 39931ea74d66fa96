// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::api::ApiResult;
use crate::api::files::{DirectoryEntry, FilesApi};
use crate::error::{Error, Result};
use crate::filer::{
    DeleteMode, FileInfo, FileReader, Filer, WriteMode, millis_to_datetime, sort_entries,
};
use crate::path::{self, RootPath, basename, dirname};
use async_trait::async_trait;
use std::sync::Arc;

/// A filer over Unity Catalog volumes via the Files API
pub struct VolumesFiler {
    api: Arc<dyn FilesApi>,
    root: RootPath,
}

impl VolumesFiler {
    #[must_use]
    pub fn new(api: Arc<dyn FilesApi>, root: &str) -> Self {
        Self {
            api,
            root: RootPath::new(root),
        }
    }

    async fn is_directory(&self, path: &str) -> Result<bool> {
        match self.api.get_directory_metadata(path).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn is_file(&self, path: &str) -> Result<bool> {
        match self.api.get_metadata(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Collect every page of a directory listing
    async fn list_all(&self, path: &str) -> ApiResult<Vec<DirectoryEntry>> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .api
                .list_directory(path, page_token.as_deref())
                .await?;
            entries.extend(page.contents);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(entries),
            }
        }
    }

    fn entry_info(entry: &DirectoryEntry) -> FileInfo {
        let name = if entry.name.is_empty() {
            basename(&entry.path).unwrap_or_else(|| entry.path.clone())
        } else {
            entry.name.clone()
        };
        let info = if entry.is_directory {
            FileInfo::directory(name)
        } else {
            FileInfo::file(name, entry.file_size.unwrap_or(0))
        };
        info.with_modified(entry.last_modified.and_then(millis_to_datetime))
    }

    async fn delete_directory(&self, path: &str) -> Result<()> {
        self.api.delete_directory(path).await.map_err(|e| {
            match e.error_code() {
                Some("DIRECTORY_NOT_EMPTY") | Some("FILES_API_DIRECTORY_IS_NOT_EMPTY") => {
                    Error::directory_not_empty(path)
                }
                _ if e.is_not_found() => Error::file_does_not_exist(path),
                _ => e.into(),
            }
        })
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        self.api.delete_file(path).await.map_err(|e| {
            if e.is_not_found() {
                Error::file_does_not_exist(path)
            } else {
                e.into()
            }
        })
    }

    /// Delete a directory tree: files as they are found, then the
    /// directories deepest first.
    async fn delete_tree(&self, root: &str) -> Result<()> {
        let mut directories = vec![root.to_string()];
        let mut pending = vec![root.to_string()];
        while let Some(dir) = pending.pop() {
            let entries = self.list_all(&dir).await?;
            for entry in entries {
                let child = path::join(&dir, &Self::entry_info(&entry).name);
                if entry.is_directory {
                    directories.push(child.clone());
                    pending.push(child);
                } else {
                    log::debug!("volumes delete file {}", child);
                    self.delete_file(&child).await?;
                }
            }
        }
        for dir in directories.iter().rev() {
            log::debug!("volumes delete directory {}", dir);
            self.delete_directory(dir).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Filer for VolumesFiler {
    async fn write(&self, name: &str, reader: FileReader, mode: WriteMode) -> Result<()> {
        let path = self.root.join(name)?;

        // Uploads create missing parents on their own
        if !mode.create_parents() {
            let parent = dirname(&path);
            if !self.is_directory(&parent).await? {
                return Err(Error::no_such_directory(&parent));
            }
        }

        log::debug!("volumes upload {} (overwrite={})", path, mode.overwrite());
        self.api
            .upload(&path, reader, mode.overwrite())
            .await
            .map_err(|e| {
                if e.is(409, "ALREADY_EXISTS") {
                    Error::file_already_exists(&path)
                } else {
                    e.into()
                }
            })
    }

    async fn read(&self, name: &str) -> Result<FileReader> {
        let path = self.root.join(name)?;
        match self.api.download(&path).await {
            Ok(reader) => Ok(reader),
            Err(err) if err.is_not_found() => {
                if self.is_directory(&path).await? {
                    Err(Error::not_a_file(&path))
                } else {
                    Err(Error::file_does_not_exist(&path))
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, name: &str, mode: DeleteMode) -> Result<()> {
        let path = self.root.join(name)?;
        let info = self.stat(name).await?;

        if !info.is_dir {
            return self.delete_file(&path).await;
        }
        if mode.recursive() {
            return self.delete_tree(&path).await;
        }
        self.delete_directory(&path).await
    }

    async fn read_dir(&self, name: &str) -> Result<Vec<FileInfo>> {
        let path = self.root.join(name)?;
        let entries = match self.list_all(&path).await {
            Ok(entries) => entries,
            Err(err) if err.is_not_found() => {
                if self.is_file(&path).await? {
                    return Err(Error::not_a_directory(&path));
                }
                return Err(Error::no_such_directory(&path));
            }
            Err(err) => return Err(err.into()),
        };

        let mut infos: Vec<FileInfo> = entries.iter().map(Self::entry_info).collect();
        sort_entries(&mut infos);
        Ok(infos)
    }

    async fn mkdir(&self, name: &str) -> Result<()> {
        let path = self.root.join(name)?;
        log::debug!("volumes create directory {}", path);
        self.api.create_directory(&path).await.map_err(|e| {
            if e.http_status() == Some(409) {
                Error::CannotCreateDirectoryBecauseFileExists(path.clone())
            } else {
                e.into()
            }
        })
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        let path = self.root.join(name)?;
        let display_name = basename(&path).unwrap_or_else(|| path.clone());

        match self.api.get_metadata(&path).await {
            Ok(meta) => {
                return Ok(FileInfo::file(display_name, meta.content_length.unwrap_or(0))
                    .with_modified(meta.last_modified));
            }
            Err(err) if !err.is_not_found() => return Err(err.into()),
            Err(_) => {}
        }

        if self.is_directory(&path).await? {
            return Ok(FileInfo::directory(display_name));
        }
        Err(Error::file_does_not_exist(&path))
    }
}
