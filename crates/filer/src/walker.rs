// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::Result;
use crate::filer::{FileInfo, Filer};
use crate::path;
use async_stream::stream;
use futures::Stream;

/// One step of a walk: the path visited and what the filer said about it
#[derive(Debug)]
pub struct WalkEntry {
    pub path: String,
    pub info: Result<FileInfo>,
}

/// Walk the tree under `root` as a lazy stream.
///
/// Entries come in pre-order: the root first, each directory before its
/// children, siblings by name. A directory that cannot be listed produces one
/// error entry and the walk moves on. Each call lists the tree afresh.
pub fn walk<'a>(filer: &'a dyn Filer, root: &str) -> impl Stream<Item = WalkEntry> + Send + 'a {
    let root = root.to_string();
    stream! {
        let info = filer.stat(&root).await;
        let descend = matches!(&info, Ok(info) if info.is_dir);
        yield WalkEntry { path: root.clone(), info };
        if !descend {
            return;
        }

        let mut stack: Vec<(String, std::vec::IntoIter<FileInfo>)> = Vec::new();
        match filer.read_dir(&root).await {
            Ok(entries) => stack.push((root.clone(), entries.into_iter())),
            Err(err) => {
                log::debug!("walk: cannot list {}: {}", root, err);
                yield WalkEntry { path: root, info: Err(err) };
                return;
            }
        }

        while let Some((dir, entries)) = stack.last_mut() {
            let Some(entry) = entries.next() else {
                _ = stack.pop();
                continue;
            };
            let child = path::join(dir, &entry.name);
            let is_dir = entry.is_dir;
            yield WalkEntry { path: child.clone(), info: Ok(entry) };

            if is_dir {
                match filer.read_dir(&child).await {
                    Ok(children) => stack.push((child, children.into_iter())),
                    Err(err) => {
                        log::debug!("walk: cannot list {}: {}", child, err);
                        yield WalkEntry { path: child, info: Err(err) };
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::filer::{DeleteMode, FileReader, WriteMode};
    use crate::local::LocalFiler;
    use async_trait::async_trait;
    use futures::StreamExt;
    use tempfile::TempDir;

    fn build_tree(dir: &TempDir) {
        let base = dir.path();
        std::fs::create_dir_all(base.join("b/inner")).unwrap();
        std::fs::create_dir_all(base.join("a")).unwrap();
        std::fs::write(base.join("c.txt"), "c").unwrap();
        std::fs::write(base.join("a/1.txt"), "1").unwrap();
        std::fs::write(base.join("b/inner/2.txt"), "2").unwrap();
        std::fs::write(base.join("b/0.txt"), "0").unwrap();
    }

    #[tokio::test]
    async fn test_walk_preorder() {
        let temp_dir = TempDir::new().unwrap();
        build_tree(&temp_dir);
        let filer = LocalFiler::new(temp_dir.path().to_str().unwrap());

        let paths: Vec<String> = walk(&filer, "/")
            .map(|entry| {
                assert!(entry.info.is_ok(), "{:?}", entry.info);
                entry.path
            })
            .collect()
            .await;

        assert_eq!(
            paths,
            vec![
                "/",
                "/a",
                "/a/1.txt",
                "/b",
                "/b/0.txt",
                "/b/inner",
                "/b/inner/2.txt",
                "/c.txt",
            ]
        );
    }

    #[tokio::test]
    async fn test_walk_file_root() {
        let temp_dir = TempDir::new().unwrap();
        build_tree(&temp_dir);
        let filer = LocalFiler::new(temp_dir.path().to_str().unwrap());

        let entries: Vec<WalkEntry> = walk(&filer, "/c.txt").collect().await;
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].info.as_ref().unwrap().is_dir);
    }

    #[tokio::test]
    async fn test_walk_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let filer = LocalFiler::new(temp_dir.path().to_str().unwrap());

        let entries: Vec<WalkEntry> = walk(&filer, "/nope").collect().await;
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0].info, Err(Error::FileDoesNotExist(_))));
    }

    /// Delegates to a local filer but refuses to list one directory
    struct Unlistable {
        inner: LocalFiler,
        broken: &'static str,
    }

    #[async_trait]
    impl Filer for Unlistable {
        async fn write(&self, name: &str, reader: FileReader, mode: WriteMode) -> Result<()> {
            self.inner.write(name, reader, mode).await
        }
        async fn read(&self, name: &str) -> Result<FileReader> {
            self.inner.read(name).await
        }
        async fn delete(&self, name: &str, mode: DeleteMode) -> Result<()> {
            self.inner.delete(name, mode).await
        }
        async fn read_dir(&self, name: &str) -> Result<Vec<FileInfo>> {
            if name == self.broken {
                return Err(Error::backend("PERMISSION_DENIED", "no access"));
            }
            self.inner.read_dir(name).await
        }
        async fn mkdir(&self, name: &str) -> Result<()> {
            self.inner.mkdir(name).await
        }
        async fn stat(&self, name: &str) -> Result<FileInfo> {
            self.inner.stat(name).await
        }
    }

    #[tokio::test]
    async fn test_walk_continues_past_unlistable_directory() {
        let temp_dir = TempDir::new().unwrap();
        build_tree(&temp_dir);
        let filer = Unlistable {
            inner: LocalFiler::new(temp_dir.path().to_str().unwrap()),
            broken: "/b",
        };

        let entries: Vec<WalkEntry> = walk(&filer, "/").collect().await;
        let summary: Vec<(String, bool)> = entries
            .iter()
            .map(|e| (e.path.clone(), e.info.is_ok()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("/".to_string(), true),
                ("/a".to_string(), true),
                ("/a/1.txt".to_string(), true),
                ("/b".to_string(), true),
                ("/b".to_string(), false),
                ("/c.txt".to_string(), true),
            ]
        );
    }
}
