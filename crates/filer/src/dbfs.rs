// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::api::ApiError;
use crate::api::dbfs::{DbfsApi, FileStatus};
use crate::error::{Error, Result};
use crate::filer::{
    DeleteMode, FileInfo, FileReader, Filer, WriteMode, millis_to_datetime, sort_entries,
};
use crate::path::{RootPath, basename, dirname};
use async_stream::try_stream;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use futures::Stream;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

/// Upload blocks and read windows are both capped at 1 MiB by the API
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// A filer over the DBFS block-store API
pub struct DbfsFiler {
    api: Arc<dyn DbfsApi>,
    root: RootPath,
}

impl DbfsFiler {
    #[must_use]
    pub fn new(api: Arc<dyn DbfsApi>, root: &str) -> Self {
        Self {
            api,
            root: RootPath::new(root),
        }
    }

    /// Send the reader's bytes one block at a time, buffering at most one block
    async fn upload_blocks(&self, handle: i64, mut reader: FileReader) -> Result<()> {
        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            let mut filled = 0;
            while filled < buffer.len() {
                let n = reader.read(&mut buffer[filled..]).await?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            if filled == 0 {
                return Ok(());
            }

            let data = general_purpose::STANDARD.encode(&buffer[..filled]);
            self.api.add_block(handle, &data).await?;

            if filled < buffer.len() {
                return Ok(());
            }
        }
    }

    fn file_info(status: &FileStatus) -> FileInfo {
        let name = basename(&status.path).unwrap_or_else(|| status.path.clone());
        let info = if status.is_dir {
            FileInfo::directory(name)
        } else {
            FileInfo::file(name, status.file_size)
        };
        info.with_modified(millis_to_datetime(status.modification_time))
    }
}

/// Map a 404 to `not_found`, anything else to its generic translation
fn or_not_found(err: ApiError, not_found: impl FnOnce() -> Error) -> Error {
    if err.is_not_found() {
        not_found()
    } else {
        err.into()
    }
}

/// Lazily read a file in fixed windows until a short or empty one
fn read_windows(
    api: Arc<dyn DbfsApi>,
    path: String,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send {
    try_stream! {
        let mut offset: i64 = 0;
        loop {
            let block = api
                .read(&path, offset, CHUNK_SIZE as i64)
                .await
                .map_err(|e| or_not_found(e, || Error::file_does_not_exist(&path)).into_io())?;
            let data = general_purpose::STANDARD
                .decode(block.data.as_bytes())
                .map_err(|e| Error::backend("decode", e.to_string()).into_io())?;

            let short = block.bytes_read < CHUNK_SIZE as i64 || data.is_empty();
            offset += data.len() as i64;
            if !data.is_empty() {
                yield Bytes::from(data);
            }
            if short {
                break;
            }
        }
    }
}

#[async_trait]
impl Filer for DbfsFiler {
    async fn write(&self, name: &str, reader: FileReader, mode: WriteMode) -> Result<()> {
        let path = self.root.join(name)?;

        if !mode.create_parents() {
            let parent = dirname(&path);
            _ = self
                .api
                .get_status(&parent)
                .await
                .map_err(|e| or_not_found(e, || Error::no_such_directory(&parent)))?;
        }

        log::debug!("dbfs create {} (overwrite={})", path, mode.overwrite());
        let handle = self
            .api
            .create(&path, mode.overwrite())
            .await
            .map_err(|e| {
                if e.is(400, "RESOURCE_ALREADY_EXISTS") {
                    Error::file_already_exists(&path)
                } else {
                    e.into()
                }
            })?;

        let uploaded = self.upload_blocks(handle, reader).await;
        let closed = self.api.close(handle).await;
        match (uploaded, closed) {
            (Err(err), _) => Err(err),
            (Ok(()), Err(err)) => Err(err.into()),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    async fn read(&self, name: &str) -> Result<FileReader> {
        let path = self.root.join(name)?;
        let status = self
            .api
            .get_status(&path)
            .await
            .map_err(|e| or_not_found(e, || Error::file_does_not_exist(&path)))?;
        if status.is_dir {
            return Err(Error::not_a_file(&path));
        }
        Ok(Box::pin(StreamReader::new(read_windows(
            self.api.clone(),
            path,
        ))))
    }

    async fn delete(&self, name: &str, mode: DeleteMode) -> Result<()> {
        let path = self.root.join(name)?;

        // The delete call itself succeeds on missing paths
        _ = self
            .api
            .get_status(&path)
            .await
            .map_err(|e| or_not_found(e, || Error::file_does_not_exist(&path)))?;

        log::debug!("dbfs delete {} (recursive={})", path, mode.recursive());
        self.api
            .delete(&path, mode.recursive())
            .await
            .map_err(|e| {
                if e.is(400, "IO_ERROR") {
                    Error::directory_not_empty(&path)
                } else {
                    or_not_found(e, || Error::file_does_not_exist(&path))
                }
            })
    }

    async fn read_dir(&self, name: &str) -> Result<Vec<FileInfo>> {
        let path = self.root.join(name)?;
        let files = self
            .api
            .list(&path)
            .await
            .map_err(|e| or_not_found(e, || Error::no_such_directory(&path)))?;

        // Listing a file returns just that file
        if files.len() == 1 && files[0].path == path && !files[0].is_dir {
            return Err(Error::not_a_directory(&path));
        }

        let mut entries: Vec<FileInfo> = files.iter().map(Self::file_info).collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn mkdir(&self, name: &str) -> Result<()> {
        let path = self.root.join(name)?;
        log::debug!("dbfs mkdirs {}", path);
        self.api.mkdirs(&path).await.map_err(|e| {
            if e.is(400, "RESOURCE_ALREADY_EXISTS") {
                Error::CannotCreateDirectoryBecauseFileExists(path.clone())
            } else {
                e.into()
            }
        })
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        let path = self.root.join(name)?;
        let status = self
            .api
            .get_status(&path)
            .await
            .map_err(|e| or_not_found(e, || Error::file_does_not_exist(&path)))?;
        Ok(Self::file_info(&status))
    }
}
