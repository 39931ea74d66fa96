// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-in for the remote file APIs.
//!
//! [`MemoryRemote`] implements the DBFS, workspace and Files API traits over a
//! single tree and answers with the status codes and error codes the real
//! services use, so the remote filers can be exercised without a network.

use crate::api::dbfs::{DbfsApi, FileStatus, ReadBlock};
use crate::api::files::{DirectoryEntry, DirectoryPage, FileMetadata, FilesApi};
use crate::api::workspace::{ImportRequest, ObjectInfo, ObjectType, WorkspaceApi};
use crate::api::{ApiError, ApiResult};
use crate::dbfs::CHUNK_SIZE;
use crate::filer::{FileReader, millis_to_datetime, reader_from_bytes};
use crate::path::{basename, clean, dirname};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::AsyncReadExt;

const DEFAULT_PAGE_SIZE: usize = 1000;
const EPOCH_MILLIS: i64 = 1_700_000_000_000;

#[derive(Debug, Clone)]
enum Node {
    Directory {
        object_type: ObjectType,
    },
    File {
        data: Vec<u8>,
        object_type: ObjectType,
        language: Option<String>,
        modified: i64,
    },
}

impl Node {
    fn is_dir(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }
}

#[derive(Debug)]
struct Upload {
    path: String,
    data: Vec<u8>,
}

#[derive(Debug)]
struct State {
    nodes: BTreeMap<String, Node>,
    uploads: HashMap<i64, Upload>,
    next_handle: i64,
    failures: HashMap<String, ApiError>,
    calls: Vec<String>,
    page_size: usize,
    clock: i64,
}

fn not_found<C: Into<String>>(code: C, message: String) -> ApiError {
    ApiError::status(404, code, message)
}

fn bad_request<C: Into<String>>(code: C, message: String) -> ApiError {
    ApiError::status(400, code, message)
}

fn conflict<C: Into<String>>(code: C, message: String) -> ApiError {
    ApiError::status(409, code, message)
}

/// Every proper prefix directory of `path`, plus `path` itself, shallowest first
fn ancestors(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for component in path.split('/').filter(|c| !c.is_empty()) {
        current.push('/');
        current.push_str(component);
        out.push(current.clone());
    }
    out
}

impl State {
    fn new() -> Self {
        let mut nodes = BTreeMap::new();
        _ = nodes.insert(
            "/".to_string(),
            Node::Directory {
                object_type: ObjectType::Directory,
            },
        );
        Self {
            nodes,
            uploads: HashMap::new(),
            next_handle: 1,
            failures: HashMap::new(),
            calls: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            clock: EPOCH_MILLIS,
        }
    }

    fn record(&mut self, call: String) {
        self.calls.push(call);
    }

    fn check_failure(&self, path: &str) -> ApiResult<()> {
        match self.failures.get(path) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1000;
        self.clock
    }

    fn children(&self, dir: &str) -> Vec<(String, Node)> {
        self.nodes
            .iter()
            .filter(|(path, _)| path.as_str() != dir && dirname(path) == dir)
            .map(|(path, node)| (path.clone(), node.clone()))
            .collect()
    }

    fn has_children(&self, dir: &str) -> bool {
        self.nodes
            .keys()
            .any(|path| path.as_str() != dir && dirname(path) == dir)
    }

    /// Create `path` and its parents, failing with `on_file` if a file is in the way
    fn ensure_dirs(&mut self, path: &str, on_file: impl Fn(&str) -> ApiError) -> ApiResult<()> {
        for dir in ancestors(path) {
            match self.nodes.get(&dir) {
                Some(Node::File { .. }) => return Err(on_file(&dir)),
                Some(Node::Directory { .. }) => {}
                None => {
                    _ = self.nodes.insert(
                        dir,
                        Node::Directory {
                            object_type: ObjectType::Directory,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    fn remove_tree(&mut self, path: &str) {
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{}/", path)
        };
        self.nodes
            .retain(|key, _| key == "/" || (key != path && !key.starts_with(&prefix)));
    }

    fn put_file(&mut self, path: &str, data: Vec<u8>, object_type: ObjectType, language: Option<String>) {
        let modified = self.tick();
        _ = self.nodes.insert(
            path.to_string(),
            Node::File {
                data,
                object_type,
                language,
                modified,
            },
        );
    }

    fn file_status(path: &str, node: &Node) -> FileStatus {
        match node {
            Node::Directory { .. } => FileStatus {
                path: path.to_string(),
                is_dir: true,
                file_size: 0,
                modification_time: 0,
            },
            Node::File { data, modified, .. } => FileStatus {
                path: path.to_string(),
                is_dir: false,
                file_size: data.len() as i64,
                modification_time: *modified,
            },
        }
    }

    fn object_info(path: &str, node: &Node) -> ObjectInfo {
        match node {
            Node::Directory { object_type } => ObjectInfo {
                path: path.to_string(),
                object_type: *object_type,
                language: None,
                size: None,
                modified_at: None,
            },
            Node::File {
                data,
                object_type,
                language,
                modified,
            } => ObjectInfo {
                path: path.to_string(),
                object_type: *object_type,
                language: language.clone(),
                size: Some(data.len() as i64),
                modified_at: Some(*modified),
            },
        }
    }

    fn directory_entry(path: &str, node: &Node) -> DirectoryEntry {
        let name = basename(path).unwrap_or_default();
        match node {
            Node::Directory { .. } => DirectoryEntry {
                path: format!("{}/", path),
                name,
                is_directory: true,
                file_size: None,
                last_modified: None,
            },
            Node::File { data, modified, .. } => DirectoryEntry {
                path: path.to_string(),
                name,
                is_directory: false,
                file_size: Some(data.len() as i64),
                last_modified: Some(*modified),
            },
        }
    }
}

/// A shared in-memory remote. Clones see the same tree.
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a file, creating its parents
    pub fn put_file<D: Into<Vec<u8>>>(&self, path: &str, data: D) {
        let path = clean(path);
        let mut state = self.state();
        _ = state.ensure_dirs(&dirname(&path), |p| bad_request("", p.to_string()));
        state.put_file(&path, data.into(), ObjectType::File, None);
    }

    /// Seed a workspace notebook with its source
    pub fn put_notebook<D: Into<Vec<u8>>>(&self, path: &str, language: &str, source: D) {
        let path = clean(path);
        let mut state = self.state();
        _ = state.ensure_dirs(&dirname(&path), |p| bad_request("", p.to_string()));
        state.put_file(
            &path,
            source.into(),
            ObjectType::Notebook,
            Some(language.to_string()),
        );
    }

    pub fn put_dir(&self, path: &str) {
        _ = self
            .state()
            .ensure_dirs(&clean(path), |p| bad_request("", p.to_string()));
    }

    /// Contents of a file, if one exists at `path`
    #[must_use]
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        match self.state().nodes.get(&clean(path)) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_dir(&self, path: &str) -> bool {
        self.state()
            .nodes
            .get(&clean(path))
            .is_some_and(Node::is_dir)
    }

    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.state().nodes.contains_key(&clean(path))
    }

    /// Make every call that touches `path` fail with `err`
    pub fn fail_path(&self, path: &str, err: ApiError) {
        _ = self.state().failures.insert(clean(path), err);
    }

    /// Limit directory listing pages of the Files API
    pub fn set_page_size(&self, page_size: usize) {
        self.state().page_size = page_size.max(1);
    }

    /// API calls made so far, as `"<api>.<op> <path>"`
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl DbfsApi for MemoryRemote {
    async fn get_status(&self, path: &str) -> ApiResult<FileStatus> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("dbfs.get-status {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            Some(node) => Ok(State::file_status(&path, node)),
            None => Err(not_found(
                "RESOURCE_DOES_NOT_EXIST",
                format!("No file or directory exists on path {}.", path),
            )),
        }
    }

    async fn list(&self, path: &str) -> ApiResult<Vec<FileStatus>> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("dbfs.list {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            None => Err(not_found(
                "RESOURCE_DOES_NOT_EXIST",
                format!("No file or directory exists on path {}.", path),
            )),
            Some(node @ Node::File { .. }) => Ok(vec![State::file_status(&path, node)]),
            Some(Node::Directory { .. }) => Ok(state
                .children(&path)
                .iter()
                .map(|(child, node)| State::file_status(child, node))
                .collect()),
        }
    }

    async fn mkdirs(&self, path: &str) -> ApiResult<()> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("dbfs.mkdirs {}", path));
        state.check_failure(&path)?;
        state.ensure_dirs(&path, |p| {
            bad_request(
                "RESOURCE_ALREADY_EXISTS",
                format!("A file or directory already exists at the input path {}.", p),
            )
        })
    }

    async fn delete(&self, path: &str, recursive: bool) -> ApiResult<()> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("dbfs.delete {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            None => Ok(()),
            Some(Node::Directory { .. }) if !recursive && state.has_children(&path) => {
                Err(bad_request(
                    "IO_ERROR",
                    format!("Directory {} is not empty", path),
                ))
            }
            Some(_) => {
                state.remove_tree(&path);
                Ok(())
            }
        }
    }

    async fn create(&self, path: &str, overwrite: bool) -> ApiResult<i64> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("dbfs.create {}", path));
        state.check_failure(&path)?;
        let exists = |p: &str| {
            bad_request(
                "RESOURCE_ALREADY_EXISTS",
                format!("A file or directory already exists at the input path {}.", p),
            )
        };
        match state.nodes.get(&path) {
            Some(Node::Directory { .. }) => return Err(exists(path.as_str())),
            Some(Node::File { .. }) if !overwrite => return Err(exists(path.as_str())),
            _ => {}
        }
        state.ensure_dirs(&dirname(&path), exists)?;

        let handle = state.next_handle;
        state.next_handle += 1;
        _ = state.uploads.insert(
            handle,
            Upload {
                path,
                data: Vec::new(),
            },
        );
        Ok(handle)
    }

    async fn add_block(&self, handle: i64, data: &str) -> ApiResult<()> {
        let decoded = general_purpose::STANDARD
            .decode(data.as_bytes())
            .map_err(|e| bad_request("INVALID_PARAMETER_VALUE", e.to_string()))?;
        if decoded.len() > CHUNK_SIZE {
            return Err(bad_request(
                "MAX_BLOCK_SIZE_EXCEEDED",
                format!("Block size {} exceeds {}", decoded.len(), CHUNK_SIZE),
            ));
        }

        let mut state = self.state();
        state.record(format!("dbfs.add-block {}", handle));
        match state.uploads.get_mut(&handle) {
            Some(upload) => {
                upload.data.extend_from_slice(&decoded);
                Ok(())
            }
            None => Err(not_found(
                "RESOURCE_DOES_NOT_EXIST",
                format!("No upload with handle {}", handle),
            )),
        }
    }

    async fn close(&self, handle: i64) -> ApiResult<()> {
        let mut state = self.state();
        state.record(format!("dbfs.close {}", handle));
        match state.uploads.remove(&handle) {
            Some(upload) => {
                state.put_file(&upload.path, upload.data, ObjectType::File, None);
                Ok(())
            }
            None => Err(not_found(
                "RESOURCE_DOES_NOT_EXIST",
                format!("No upload with handle {}", handle),
            )),
        }
    }

    async fn read(&self, path: &str, offset: i64, length: i64) -> ApiResult<ReadBlock> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("dbfs.read {}", path));
        state.check_failure(&path)?;
        if length > CHUNK_SIZE as i64 {
            return Err(bad_request(
                "MAX_READ_SIZE_EXCEEDED",
                format!("Read length {} exceeds {}", length, CHUNK_SIZE),
            ));
        }
        match state.nodes.get(&path) {
            None => Err(not_found(
                "RESOURCE_DOES_NOT_EXIST",
                format!("No file or directory exists on path {}.", path),
            )),
            Some(Node::Directory { .. }) => Err(bad_request(
                "INVALID_PARAMETER_VALUE",
                format!("The path {} is a directory.", path),
            )),
            Some(Node::File { data, .. }) => {
                let start = (offset.max(0) as usize).min(data.len());
                let end = (start + length.max(0) as usize).min(data.len());
                let window = &data[start..end];
                Ok(ReadBlock {
                    bytes_read: window.len() as i64,
                    data: general_purpose::STANDARD.encode(window),
                })
            }
        }
    }
}

#[async_trait]
impl WorkspaceApi for MemoryRemote {
    async fn get_status(&self, path: &str) -> ApiResult<ObjectInfo> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("workspace.get-status {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            Some(node) => Ok(State::object_info(&path, node)),
            None => Err(not_found(
                "RESOURCE_DOES_NOT_EXIST",
                format!("Path ({}) doesn't exist.", path),
            )),
        }
    }

    async fn list(&self, path: &str) -> ApiResult<Vec<ObjectInfo>> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("workspace.list {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            None => Err(not_found(
                "RESOURCE_DOES_NOT_EXIST",
                format!("Path ({}) doesn't exist.", path),
            )),
            Some(node @ Node::File { .. }) => Ok(vec![State::object_info(&path, node)]),
            Some(Node::Directory { .. }) => Ok(state
                .children(&path)
                .iter()
                .map(|(child, node)| State::object_info(child, node))
                .collect()),
        }
    }

    async fn mkdirs(&self, path: &str) -> ApiResult<()> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("workspace.mkdirs {}", path));
        state.check_failure(&path)?;
        state.ensure_dirs(&path, |p| {
            bad_request(
                "RESOURCE_ALREADY_EXISTS",
                format!("Path ({}) already exists.", p),
            )
        })
    }

    async fn delete(&self, path: &str, recursive: bool) -> ApiResult<()> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("workspace.delete {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            None => Err(not_found(
                "RESOURCE_DOES_NOT_EXIST",
                format!("Path ({}) doesn't exist.", path),
            )),
            Some(Node::Directory { .. }) if !recursive && state.has_children(&path) => {
                Err(bad_request(
                    "DIRECTORY_NOT_EMPTY",
                    format!("Folder ({}) is not empty", path),
                ))
            }
            Some(_) => {
                state.remove_tree(&path);
                Ok(())
            }
        }
    }

    async fn import(&self, request: ImportRequest) -> ApiResult<()> {
        let path = clean(&request.path);
        let data = general_purpose::STANDARD
            .decode(request.content.as_bytes())
            .map_err(|e| bad_request("INVALID_PARAMETER_VALUE", e.to_string()))?;

        let mut state = self.state();
        state.record(format!("workspace.import {}", path));
        state.check_failure(&path)?;

        let parent = dirname(&path);
        if !state.nodes.get(&parent).is_some_and(Node::is_dir) {
            return Err(not_found(
                "RESOURCE_DOES_NOT_EXIST",
                format!("The parent folder ({}) does not exist.", parent),
            ));
        }
        match state.nodes.get(&path) {
            Some(Node::Directory { .. }) => {
                return Err(bad_request(
                    "RESOURCE_ALREADY_EXISTS",
                    format!("Path ({}) already exists.", path),
                ));
            }
            Some(Node::File { .. }) if !request.overwrite => {
                return Err(bad_request(
                    "RESOURCE_ALREADY_EXISTS",
                    format!("Path ({}) already exists.", path),
                ));
            }
            _ => {}
        }
        state.put_file(&path, data, ObjectType::File, None);
        Ok(())
    }

    async fn export(&self, path: &str, _format: &str) -> ApiResult<String> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("workspace.export {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            None => Err(not_found(
                "RESOURCE_DOES_NOT_EXIST",
                format!("Path ({}) doesn't exist.", path),
            )),
            Some(Node::Directory { .. }) => Err(bad_request(
                "INVALID_PARAMETER_VALUE",
                format!("Cannot export directory {}", path),
            )),
            Some(Node::File { data, .. }) => Ok(general_purpose::STANDARD.encode(data)),
        }
    }
}

#[async_trait]
impl FilesApi for MemoryRemote {
    async fn upload(&self, path: &str, mut body: FileReader, overwrite: bool) -> ApiResult<()> {
        let path = clean(path);
        let mut data = Vec::new();
        _ = body
            .read_to_end(&mut data)
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let mut state = self.state();
        state.record(format!("files.upload {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            Some(Node::Directory { .. }) => {
                return Err(conflict(
                    "ALREADY_EXISTS",
                    format!("A directory exists at {}", path),
                ));
            }
            Some(Node::File { .. }) if !overwrite => {
                return Err(conflict(
                    "ALREADY_EXISTS",
                    format!("The file being created already exists: {}", path),
                ));
            }
            _ => {}
        }
        state.ensure_dirs(&dirname(&path), |p| {
            bad_request(
                "INVALID_PARAMETER_VALUE",
                format!("A file exists at {}", p),
            )
        })?;
        state.put_file(&path, data, ObjectType::File, None);
        Ok(())
    }

    async fn download(&self, path: &str) -> ApiResult<FileReader> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("files.download {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            Some(Node::File { data, .. }) => Ok(reader_from_bytes(data.clone())),
            _ => Err(not_found(
                "NOT_FOUND",
                format!("The file {} does not exist", path),
            )),
        }
    }

    async fn get_metadata(&self, path: &str) -> ApiResult<FileMetadata> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("files.head {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            Some(Node::File { data, modified, .. }) => Ok(FileMetadata {
                content_length: Some(data.len() as i64),
                last_modified: millis_to_datetime(*modified),
            }),
            // HEAD responses carry no body
            _ => Err(not_found("", "HTTP 404 Not Found".to_string())),
        }
    }

    async fn delete_file(&self, path: &str) -> ApiResult<()> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("files.delete {}", path));
        state.check_failure(&path)?;
        match state.nodes.get(&path) {
            Some(Node::File { .. }) => {
                _ = state.nodes.remove(&path);
                Ok(())
            }
            _ => Err(not_found(
                "NOT_FOUND",
                format!("The file {} does not exist", path),
            )),
        }
    }

    async fn create_directory(&self, path: &str) -> ApiResult<()> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("files.mkdir {}", path));
        state.check_failure(&path)?;
        state.ensure_dirs(&path, |p| {
            conflict(
                "ALREADY_EXISTS",
                format!("A file exists at {}", p),
            )
        })
    }

    async fn list_directory(
        &self,
        path: &str,
        page_token: Option<&str>,
    ) -> ApiResult<DirectoryPage> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("files.list {}", path));
        state.check_failure(&path)?;
        if !state.nodes.get(&path).is_some_and(Node::is_dir) {
            return Err(not_found(
                "NOT_FOUND",
                format!("The directory {} does not exist", path),
            ));
        }

        let start = match page_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                bad_request(
                    "INVALID_PARAMETER_VALUE",
                    format!("Invalid page token {}", token),
                )
            })?,
            None => 0,
        };
        let children = state.children(&path);
        let end = (start + state.page_size).min(children.len());
        let contents = children
            .get(start.min(end)..end)
            .unwrap_or_default()
            .iter()
            .map(|(child, node)| State::directory_entry(child, node))
            .collect();
        let next_page_token = (end < children.len()).then(|| end.to_string());
        Ok(DirectoryPage {
            contents,
            next_page_token,
        })
    }

    async fn get_directory_metadata(&self, path: &str) -> ApiResult<()> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("files.head-directory {}", path));
        state.check_failure(&path)?;
        if state.nodes.get(&path).is_some_and(Node::is_dir) {
            Ok(())
        } else {
            Err(not_found("", "HTTP 404 Not Found".to_string()))
        }
    }

    async fn delete_directory(&self, path: &str) -> ApiResult<()> {
        let path = clean(path);
        let mut state = self.state();
        state.record(format!("files.delete-directory {}", path));
        state.check_failure(&path)?;
        if !state.nodes.get(&path).is_some_and(Node::is_dir) {
            return Err(not_found(
                "NOT_FOUND",
                format!("The directory {} does not exist", path),
            ));
        }
        if state.has_children(&path) {
            return Err(conflict(
                "DIRECTORY_NOT_EMPTY",
                format!("The directory {} is not empty", path),
            ));
        }
        _ = state.nodes.remove(&path);
        Ok(())
    }
}
