// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::api::{ApiError, ApiResult};
use crate::api::workspace::{ImportRequest, ObjectInfo, WorkspaceApi};
use crate::error::{Error, Result};
use crate::filer::{
    DeleteMode, FileInfo, FileReader, Filer, ObjectMetadata, WriteMode, millis_to_datetime,
    reader_from_bytes, sort_entries,
};
use crate::path::{RootPath, basename, dirname};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

const IMPORT_FORMAT: &str = "AUTO";
const EXPORT_FORMAT: &str = "SOURCE";

/// A filer over workspace objects: notebooks, files, directories and repos
pub struct WorkspaceFiler {
    api: Arc<dyn WorkspaceApi>,
    root: RootPath,
}

impl WorkspaceFiler {
    #[must_use]
    pub fn new(api: Arc<dyn WorkspaceApi>, root: &str) -> Self {
        Self {
            api,
            root: RootPath::new(root),
        }
    }

    fn file_info(object: &ObjectInfo) -> FileInfo {
        let name = basename(&object.path).unwrap_or_else(|| object.path.clone());
        let info = if object.object_type.is_directory() {
            FileInfo::directory(name)
        } else {
            FileInfo {
                size: object.size,
                ..FileInfo::file(name, 0)
            }
        };
        info.with_modified(object.modified_at.and_then(millis_to_datetime))
            .with_metadata(Some(ObjectMetadata {
                object_type: object.object_type.as_str().to_string(),
                language: object.language.clone(),
            }))
    }

    async fn import(&self, path: &str, content: &str, overwrite: bool) -> ApiResult<()> {
        self.api
            .import(ImportRequest {
                path: path.to_string(),
                format: IMPORT_FORMAT.to_string(),
                overwrite,
                content: content.to_string(),
            })
            .await
    }
}

fn or_not_found(err: ApiError, not_found: impl FnOnce() -> Error) -> Error {
    if err.is_not_found() {
        not_found()
    } else {
        err.into()
    }
}

/// Notebooks report 400 and plain files 409 when the target exists
fn is_already_exists(err: &ApiError) -> bool {
    err.error_code() == Some("RESOURCE_ALREADY_EXISTS") || err.http_status() == Some(409)
}

#[async_trait]
impl Filer for WorkspaceFiler {
    async fn write(&self, name: &str, mut reader: FileReader, mode: WriteMode) -> Result<()> {
        let path = self.root.join(name)?;
        let parent = dirname(&path);

        if !mode.create_parents() {
            _ = self
                .api
                .get_status(&parent)
                .await
                .map_err(|e| or_not_found(e, || Error::no_such_directory(&parent)))?;
        }

        // Import takes the whole object in one request body
        let mut content = Vec::new();
        _ = reader.read_to_end(&mut content).await?;
        let encoded = general_purpose::STANDARD.encode(&content);

        log::debug!("workspace import {} ({} bytes)", path, content.len());
        let mut result = self.import(&path, &encoded, mode.overwrite()).await;
        if mode.create_parents() {
            if let Err(err) = &result {
                if err.is_not_found() {
                    log::debug!("workspace mkdirs {} and retry import", parent);
                    self.api.mkdirs(&parent).await?;
                    result = self.import(&path, &encoded, mode.overwrite()).await;
                }
            }
        }

        result.map_err(|e| {
            if is_already_exists(&e) {
                Error::file_already_exists(&path)
            } else {
                or_not_found(e, || Error::no_such_directory(&parent))
            }
        })
    }

    async fn read(&self, name: &str) -> Result<FileReader> {
        let path = self.root.join(name)?;
        let object = self
            .api
            .get_status(&path)
            .await
            .map_err(|e| or_not_found(e, || Error::file_does_not_exist(&path)))?;
        if object.object_type.is_directory() {
            return Err(Error::not_a_file(&path));
        }

        let encoded = self
            .api
            .export(&path, EXPORT_FORMAT)
            .await
            .map_err(|e| or_not_found(e, || Error::file_does_not_exist(&path)))?;
        let content = general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| Error::backend("decode", e.to_string()))?;
        Ok(reader_from_bytes(content))
    }

    async fn delete(&self, name: &str, mode: DeleteMode) -> Result<()> {
        let path = self.root.join(name)?;
        _ = self
            .api
            .get_status(&path)
            .await
            .map_err(|e| or_not_found(e, || Error::file_does_not_exist(&path)))?;

        log::debug!("workspace delete {} (recursive={})", path, mode.recursive());
        self.api
            .delete(&path, mode.recursive())
            .await
            .map_err(|e| {
                if e.error_code() == Some("DIRECTORY_NOT_EMPTY") {
                    Error::directory_not_empty(&path)
                } else {
                    or_not_found(e, || Error::file_does_not_exist(&path))
                }
            })
    }

    async fn read_dir(&self, name: &str) -> Result<Vec<FileInfo>> {
        let path = self.root.join(name)?;
        let objects = self
            .api
            .list(&path)
            .await
            .map_err(|e| or_not_found(e, || Error::no_such_directory(&path)))?;

        // Listing a non-directory object returns just that object
        if objects.len() == 1
            && objects[0].path == path
            && !objects[0].object_type.is_directory()
        {
            return Err(Error::not_a_directory(&path));
        }

        let mut entries: Vec<FileInfo> = objects.iter().map(Self::file_info).collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn mkdir(&self, name: &str) -> Result<()> {
        let path = self.root.join(name)?;
        log::debug!("workspace mkdirs {}", path);
        self.api.mkdirs(&path).await.map_err(|e| {
            if e.error_code() == Some("RESOURCE_ALREADY_EXISTS") {
                Error::CannotCreateDirectoryBecauseFileExists(path.clone())
            } else {
                e.into()
            }
        })
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        let path = self.root.join(name)?;
        let object = self
            .api
            .get_status(&path)
            .await
            .map_err(|e| or_not_found(e, || Error::file_does_not_exist(&path)))?;
        Ok(Self::file_info(&object))
    }
}
