// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Shell completion of remote paths.
//!
//! A partial path is completed by listing it as a directory (the nested
//! probe) and, in case that finds nothing, listing the directory the user is
//! typing in (the adjacent probe). Both listings run at once and the nested
//! one wins when it has entries.

use crate::common::Backends;
use filer::{FileInfo, Filer};
use std::ops::BitOr;

/// Completion directives understood by the shell completion scripts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Directive(u8);

impl Directive {
    pub const ERROR: Directive = Directive(1);
    pub const NO_SPACE: Directive = Directive(2);
    pub const NO_FILE_COMP: Directive = Directive(4);

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Directive) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Directive {
    type Output = Directive;

    fn bitor(self, rhs: Directive) -> Directive {
        Directive(self.0 | rhs.0)
    }
}

/// Candidates plus the directive for the shell
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    pub candidates: Vec<String>,
    pub directive: Directive,
}

impl Completion {
    fn only(candidate: &str) -> Self {
        Self {
            candidates: vec![candidate.to_string()],
            directive: Directive::NO_SPACE,
        }
    }

    fn error() -> Self {
        Self {
            candidates: Vec::new(),
            directive: Directive::ERROR,
        }
    }
}

const DEFAULT_PREFIX: &str = "dbfs:/";
const REMOTE_PREFIXES: &[&str] = &["dbfs:/", "workspace:/"];

pub struct Completer<'a> {
    backends: &'a Backends,
    only_dirs: bool,
}

impl<'a> Completer<'a> {
    #[must_use]
    pub fn new(backends: &'a Backends, only_dirs: bool) -> Self {
        Self {
            backends,
            only_dirs,
        }
    }

    pub async fn complete(&self, partial: &str) -> Completion {
        if !REMOTE_PREFIXES.iter().any(|p| partial.starts_with(p)) {
            let prefix = REMOTE_PREFIXES
                .iter()
                .find(|p| !partial.is_empty() && p.starts_with(partial))
                .copied()
                .unwrap_or(DEFAULT_PREFIX);
            return Completion::only(prefix);
        }

        let resolved = match self.backends.filer_for_path(partial) {
            Ok(resolved) => resolved,
            Err(err) => {
                log::debug!("completion: cannot resolve {}: {}", partial, err);
                return Completion::error();
            }
        };
        let Some(scheme) = resolved.scheme else {
            return Completion::error();
        };
        let filer = resolved.filer.as_ref();
        let nested_dir = resolved.path.as_str();
        let adjacent_dir = parent_text(nested_dir);

        let nested = list(filer, nested_dir);
        let adjacent = list(filer, adjacent_dir);
        tokio::pin!(nested);
        tokio::pin!(adjacent);

        let mut adjacent_result = None;
        let nested_result = loop {
            tokio::select! {
                biased;
                res = &mut nested => break res,
                res = &mut adjacent, if adjacent_result.is_none() => adjacent_result = Some(res),
            }
        };

        match nested_result {
            Ok(entries) if !entries.is_empty() => {
                return self.candidates(scheme.as_str(), nested_dir, entries);
            }
            Ok(_) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => {
                log::debug!("completion: listing {} failed: {}", nested_dir, err);
                return Completion::error();
            }
        }

        let adjacent_result = match adjacent_result {
            Some(res) => res,
            None => adjacent.await,
        };
        let mut dir = adjacent_dir;
        let mut result = adjacent_result;
        loop {
            match result {
                Ok(entries) => return self.candidates(scheme.as_str(), dir, entries),
                Err(err) if err.is_not_found() && dir != "/" => {
                    // Keep climbing to the nearest ancestor that exists
                    dir = parent_text(dir);
                    result = list(filer, dir).await;
                }
                Err(err) if err.is_not_found() => {
                    return Completion {
                        candidates: Vec::new(),
                        directive: Directive::NO_SPACE,
                    };
                }
                Err(err) => {
                    log::debug!("completion: listing {} failed: {}", dir, err);
                    return Completion::error();
                }
            }
        }
    }

    fn candidates(&self, scheme: &str, dir: &str, entries: Vec<FileInfo>) -> Completion {
        let separator = if dir.ends_with('/') { "" } else { "/" };
        let candidates = entries
            .into_iter()
            .filter(|entry| !self.only_dirs || entry.is_dir)
            .map(|entry| format!("{}:{}{}{}", scheme, dir, separator, entry.name))
            .collect();
        Completion {
            candidates,
            directive: Directive::NO_SPACE,
        }
    }
}

async fn list(filer: &dyn Filer, dir: &str) -> filer::Result<Vec<FileInfo>> {
    filer.read_dir(dir).await
}

/// The user's text up to and including its last `/`, ignoring one trailing
/// `/`, so `/a/b` and `/a/b/` both give `/a/`.
fn parent_text(path: &str) -> &str {
    let trimmed = match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    };
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[..=idx],
        None => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_text() {
        assert_eq!(parent_text("/wrong/"), "/");
        assert_eq!(parent_text("/dir2/fi"), "/dir2/");
        assert_eq!(parent_text("/dir2/sub/"), "/dir2/");
        assert_eq!(parent_text("//a//b"), "//a//");
        assert_eq!(parent_text("/"), "/");
        assert_eq!(parent_text("/x"), "/");
    }

    #[test]
    fn test_directive_bits() {
        assert_eq!(Directive::ERROR.bits(), 1);
        assert_eq!(Directive::NO_SPACE.bits(), 2);
        assert_eq!(Directive::NO_FILE_COMP.bits(), 4);

        let combined = Directive::NO_SPACE | Directive::NO_FILE_COMP;
        assert_eq!(combined.bits(), 6);
        assert!(combined.contains(Directive::NO_SPACE));
        assert!(!combined.contains(Directive::ERROR));
    }
}
