// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Files API for Unity Catalog volumes (`/api/2.0/fs/*`).
//!
//! Unlike DBFS, file contents travel as raw request and response bodies.

use super::{ApiClient, ApiResult};
use crate::filer::FileReader;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use reqwest::Method;
use reqwest::header::{CONTENT_LENGTH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use tokio_util::io::{ReaderStream, StreamReader};

/// Headers returned by a HEAD on a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub content_length: Option<i64>,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
}

/// One page of a directory listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryPage {
    #[serde(default)]
    pub contents: Vec<DirectoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Serialize)]
struct OverwriteQuery {
    overwrite: bool,
}

#[derive(Serialize)]
struct PageQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[async_trait]
pub trait FilesApi: Send + Sync {
    async fn upload(&self, path: &str, body: FileReader, overwrite: bool) -> ApiResult<()>;

    async fn download(&self, path: &str) -> ApiResult<FileReader>;

    async fn get_metadata(&self, path: &str) -> ApiResult<FileMetadata>;

    async fn delete_file(&self, path: &str) -> ApiResult<()>;

    async fn create_directory(&self, path: &str) -> ApiResult<()>;

    async fn list_directory(&self, path: &str, page_token: Option<&str>)
    -> ApiResult<DirectoryPage>;

    /// Succeeds if a directory exists at `path`
    async fn get_directory_metadata(&self, path: &str) -> ApiResult<()>;

    async fn delete_directory(&self, path: &str) -> ApiResult<()>;
}

fn files_path(path: &str) -> String {
    format!("/api/2.0/fs/files{}", path)
}

fn directories_path(path: &str) -> String {
    format!("/api/2.0/fs/directories{}", path)
}

#[async_trait]
impl FilesApi for ApiClient {
    async fn upload(&self, path: &str, body: FileReader, overwrite: bool) -> ApiResult<()> {
        let request = self
            .request(Method::PUT, &files_path(path))
            .query(&OverwriteQuery { overwrite })
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(reqwest::Body::wrap_stream(ReaderStream::new(body)));
        _ = self.send(request).await?;
        Ok(())
    }

    async fn download(&self, path: &str) -> ApiResult<FileReader> {
        let request = self.request(Method::GET, &files_path(path));
        let response = self.send(request).await?;
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::pin(StreamReader::new(stream)))
    }

    async fn get_metadata(&self, path: &str) -> ApiResult<FileMetadata> {
        let request = self.request(Method::HEAD, &files_path(path));
        let response = self.send(request).await?;
        let headers = response.headers();
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());
        let last_modified = headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Ok(FileMetadata {
            content_length,
            last_modified,
        })
    }

    async fn delete_file(&self, path: &str) -> ApiResult<()> {
        let request = self.request(Method::DELETE, &files_path(path));
        _ = self.send(request).await?;
        Ok(())
    }

    async fn create_directory(&self, path: &str) -> ApiResult<()> {
        let request = self.request(Method::PUT, &directories_path(path));
        _ = self.send(request).await?;
        Ok(())
    }

    async fn list_directory(
        &self,
        path: &str,
        page_token: Option<&str>,
    ) -> ApiResult<DirectoryPage> {
        self.get_json(&directories_path(path), &PageQuery { page_token })
            .await
    }

    async fn get_directory_metadata(&self, path: &str) -> ApiResult<()> {
        let request = self.request(Method::HEAD, &directories_path(path));
        _ = self.send(request).await?;
        Ok(())
    }

    async fn delete_directory(&self, path: &str) -> ApiResult<()> {
        let request = self.request(Method::DELETE, &directories_path(path));
        _ = self.send(request).await?;
        Ok(())
    }
}
