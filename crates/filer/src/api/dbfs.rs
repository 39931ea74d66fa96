// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! DBFS block-store API (`/api/2.0/dbfs/*`).

use super::{ApiClient, ApiResult, Empty};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Status of one DBFS path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub modification_time: i64,
}

/// One window returned by `read`; `data` is base64
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadBlock {
    #[serde(default)]
    pub bytes_read: i64,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListResponse {
    #[serde(default)]
    files: Vec<FileStatus>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    handle: i64,
}

#[derive(Serialize)]
struct PathRequest<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    path: &'a str,
    overwrite: bool,
}

#[derive(Serialize)]
struct AddBlockRequest<'a> {
    handle: i64,
    data: &'a str,
}

#[derive(Serialize)]
struct HandleRequest {
    handle: i64,
}

#[derive(Serialize)]
struct ReadQuery<'a> {
    path: &'a str,
    offset: i64,
    length: i64,
}

#[async_trait]
pub trait DbfsApi: Send + Sync {
    async fn get_status(&self, path: &str) -> ApiResult<FileStatus>;

    async fn list(&self, path: &str) -> ApiResult<Vec<FileStatus>>;

    async fn mkdirs(&self, path: &str) -> ApiResult<()>;

    async fn delete(&self, path: &str, recursive: bool) -> ApiResult<()>;

    /// Open a streaming upload and return its handle
    async fn create(&self, path: &str, overwrite: bool) -> ApiResult<i64>;

    /// Append one base64-encoded block to an open upload
    async fn add_block(&self, handle: i64, data: &str) -> ApiResult<()>;

    async fn close(&self, handle: i64) -> ApiResult<()>;

    async fn read(&self, path: &str, offset: i64, length: i64) -> ApiResult<ReadBlock>;
}

#[async_trait]
impl DbfsApi for ApiClient {
    async fn get_status(&self, path: &str) -> ApiResult<FileStatus> {
        self.get_json("/api/2.0/dbfs/get-status", &PathRequest { path })
            .await
    }

    async fn list(&self, path: &str) -> ApiResult<Vec<FileStatus>> {
        let response: ListResponse = self
            .get_json("/api/2.0/dbfs/list", &PathRequest { path })
            .await?;
        Ok(response.files)
    }

    async fn mkdirs(&self, path: &str) -> ApiResult<()> {
        let _: Empty = self
            .post_json("/api/2.0/dbfs/mkdirs", &PathRequest { path })
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &str, recursive: bool) -> ApiResult<()> {
        let _: Empty = self
            .post_json("/api/2.0/dbfs/delete", &DeleteRequest { path, recursive })
            .await?;
        Ok(())
    }

    async fn create(&self, path: &str, overwrite: bool) -> ApiResult<i64> {
        let response: CreateResponse = self
            .post_json("/api/2.0/dbfs/create", &CreateRequest { path, overwrite })
            .await?;
        Ok(response.handle)
    }

    async fn add_block(&self, handle: i64, data: &str) -> ApiResult<()> {
        let _: Empty = self
            .post_json("/api/2.0/dbfs/add-block", &AddBlockRequest { handle, data })
            .await?;
        Ok(())
    }

    async fn close(&self, handle: i64) -> ApiResult<()> {
        let _: Empty = self
            .post_json("/api/2.0/dbfs/close", &HandleRequest { handle })
            .await?;
        Ok(())
    }

    async fn read(&self, path: &str, offset: i64, length: i64) -> ApiResult<ReadBlock> {
        self.get_json(
            "/api/2.0/dbfs/read",
            &ReadQuery {
                path,
                offset,
                length,
            },
        )
        .await
    }
}
