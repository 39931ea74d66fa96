// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Lexical path handling shared by all backends.
//!
//! Everything here works on forward-slash strings. Nothing touches the
//! filesystem and nothing resolves symlinks: confinement to a root is purely
//! lexical.

use crate::error::{Error, Result};

/// Lexically clean a forward-slash path.
///
/// Repeated separators collapse, `.` components disappear and `..` removes the
/// preceding component. A `..` above the root of an absolute path is dropped;
/// leading `..` components of a relative path are kept. An empty result is `.`
/// for relative paths and `/` for absolute ones.
#[must_use]
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut components: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => match components.last() {
                Some(&last) if last != ".." => {
                    _ = components.pop();
                }
                _ if rooted => {}
                _ => components.push(".."),
            },
            other => components.push(other),
        }
    }

    let joined = components.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Extracts the final component of a path, if there is one
#[must_use]
pub fn basename(path: &str) -> Option<String> {
    let cleaned = clean(path);
    match cleaned.rsplit('/').next() {
        Some("") | Some(".") | Some("..") | None => None,
        Some(name) => Some(name.to_string()),
    }
}

/// Extracts the directory portion of a cleaned path
#[must_use]
pub fn dirname(path: &str) -> String {
    let cleaned = clean(path);
    match cleaned.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => cleaned[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// Join a child name onto a directory path with exactly one separator
#[must_use]
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return name.to_string();
    }
    format!(
        "{}/{}",
        dir.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}

/// Express `target` relative to `base`, both cleaned first.
///
/// Returns `.` when they are equal and `None` when `target` is not inside
/// `base`.
#[must_use]
pub fn relative(base: &str, target: &str) -> Option<String> {
    let base = clean(base);
    let target = clean(target);
    if base == target {
        return Some(".".to_string());
    }
    if base == "." && !target.starts_with('/') && !target.starts_with("..") {
        return Some(target);
    }
    let prefix = if base.ends_with('/') {
        base
    } else {
        format!("{}/", base)
    };
    target.strip_prefix(&prefix).map(|rest| rest.to_string())
}

/// True if `path` is `root` itself or a descendant at a separator boundary
#[must_use]
pub fn is_within(root: &str, path: &str) -> bool {
    if root == path || root == "/" && path.starts_with('/') {
        return true;
    }
    path.strip_prefix(root)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// A root that every path handed to a filer is confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPath {
    root: String,
}

impl RootPath {
    /// An empty root means "no restriction": names are cleaned and returned
    /// as given, relative names stay relative.
    #[must_use]
    pub fn new(root: &str) -> Self {
        let root = if root.is_empty() {
            String::new()
        } else {
            clean(root)
        };
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Resolve `name` beneath the root.
    ///
    /// Absolute names are taken relative to the root, so `/a` under root
    /// `/x` is `/x/a`.
    pub fn join(&self, name: &str) -> Result<String> {
        if self.root.is_empty() {
            return Ok(clean(name));
        }

        // Clean the name on its own first so a leading `..` is not swallowed
        // by the root's own leading slash.
        let name_clean = clean(name);
        let name_rel = name_clean.trim_start_matches('/');
        if name_rel == ".." || name_rel.starts_with("../") {
            return Err(Error::path_escapes_root(name));
        }

        let joined = clean(&format!("{}/{}", self.root, name_rel));
        if !is_within(&self.root, &joined) {
            return Err(Error::path_escapes_root(name));
        }
        Ok(joined)
    }
}
