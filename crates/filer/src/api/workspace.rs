// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Workspace object API (`/api/2.0/workspace/*`).

use super::{ApiClient, ApiResult, Empty};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Notebook,
    Directory,
    File,
    Library,
    Repo,
    Dashboard,
    #[serde(other)]
    Unknown,
}

impl ObjectType {
    /// Repos are browsed like directories
    #[must_use]
    pub fn is_directory(self) -> bool {
        matches!(self, ObjectType::Directory | ObjectType::Repo)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Notebook => "NOTEBOOK",
            ObjectType::Directory => "DIRECTORY",
            ObjectType::File => "FILE",
            ObjectType::Library => "LIBRARY",
            ObjectType::Repo => "REPO",
            ObjectType::Dashboard => "DASHBOARD",
            ObjectType::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub path: String,
    pub object_type: ObjectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<i64>,
}

/// Request body for `import`; `content` is base64
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub path: String,
    pub format: String,
    pub overwrite: bool,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListResponse {
    #[serde(default)]
    objects: Vec<ObjectInfo>,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    #[serde(default)]
    content: String,
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
struct ExportQuery<'a> {
    path: &'a str,
    format: &'a str,
}

#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    async fn get_status(&self, path: &str) -> ApiResult<ObjectInfo>;

    async fn list(&self, path: &str) -> ApiResult<Vec<ObjectInfo>>;

    async fn mkdirs(&self, path: &str) -> ApiResult<()>;

    async fn delete(&self, path: &str, recursive: bool) -> ApiResult<()>;

    async fn import(&self, request: ImportRequest) -> ApiResult<()>;

    /// Export an object and return its base64 content
    async fn export(&self, path: &str, format: &str) -> ApiResult<String>;
}

#[async_trait]
impl WorkspaceApi for ApiClient {
    async fn get_status(&self, path: &str) -> ApiResult<ObjectInfo> {
        self.get_json("/api/2.0/workspace/get-status", &PathRequest { path })
            .await
    }

    async fn list(&self, path: &str) -> ApiResult<Vec<ObjectInfo>> {
        let response: ListResponse = self
            .get_json("/api/2.0/workspace/list", &PathRequest { path })
            .await?;
        Ok(response.objects)
    }

    async fn mkdirs(&self, path: &str) -> ApiResult<()> {
        let _: Empty = self
            .post_json("/api/2.0/workspace/mkdirs", &PathRequest { path })
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &str, recursive: bool) -> ApiResult<()> {
        let _: Empty = self
            .post_json("/api/2.0/workspace/delete", &DeleteRequest { path, recursive })
            .await?;
        Ok(())
    }

    async fn import(&self, request: ImportRequest) -> ApiResult<()> {
        let _: Empty = self
            .post_json("/api/2.0/workspace/import", &request)
            .await?;
        Ok(())
    }

    async fn export(&self, path: &str, format: &str) -> ApiResult<String> {
        let response: ExportResponse = self
            .get_json("/api/2.0/workspace/export", &ExportQuery { path, format })
            .await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_decodes() {
        let info: ObjectInfo = serde_json::from_str(
            r#"{"path":"/Users/me/nb","object_type":"NOTEBOOK","language":"PYTHON","object_id":7}"#,
        )
        .unwrap();
        assert_eq!(info.object_type, ObjectType::Notebook);
        assert_eq!(info.language.as_deref(), Some("PYTHON"));

        let info: ObjectInfo =
            serde_json::from_str(r#"{"path":"/x","object_type":"SOMETHING_NEW"}"#).unwrap();
        assert_eq!(info.object_type, ObjectType::Unknown);
    }

    #[test]
    fn test_repo_is_directory() {
        assert!(ObjectType::Repo.is_directory());
        assert!(ObjectType::Directory.is_directory());
        assert!(!ObjectType::Notebook.is_directory());
    }
}
