// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::api::ApiError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Schemes accepted on the command line, in the order they are listed to users.
pub const VALID_SCHEMES: &[&str] = &["dbfs", "file", "workspace"];

fn valid_schemes() -> String {
    VALID_SCHEMES
        .iter()
        .map(|s| format!("{}:", s))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Represents errors that can occur in filer operations.
///
/// Backends translate their native failures into these variants at their
/// boundary; everything above the backends passes them through unchanged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("file does not exist: {0}")]
    FileDoesNotExist(String),

    #[error("file already exists: {0}")]
    FileAlreadyExists(String),

    #[error("no such directory: {0}")]
    NoSuchDirectory(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("cannot create directory {0}: a file exists at this path")]
    CannotCreateDirectoryBecauseFileExists(String),

    #[error("invalid scheme: {0}; valid schemes are {schemes}", schemes = valid_schemes())]
    InvalidScheme(String),

    #[error("no scheme specified for path {0}; valid schemes are {schemes}", schemes = valid_schemes())]
    MissingScheme(String),

    #[error("remote path must be absolute: {0}")]
    RelativeRemotePath(String),

    #[error("relative path escapes root: {0}")]
    PathEscapesRoot(String),

    #[error("source path {0} is a directory. Please specify the --recursive flag")]
    DirectoryWithoutRecursive(String),

    #[error("operation cancelled")]
    Cancelled,

    /// Any other failure, carrying the backend's own message verbatim
    #[error("{message}")]
    Backend { kind: String, message: String },
}

impl Error {
    pub fn file_does_not_exist<P: AsRef<str>>(path: P) -> Self {
        Error::FileDoesNotExist(path.as_ref().to_string())
    }

    pub fn file_already_exists<P: AsRef<str>>(path: P) -> Self {
        Error::FileAlreadyExists(path.as_ref().to_string())
    }

    pub fn no_such_directory<P: AsRef<str>>(path: P) -> Self {
        Error::NoSuchDirectory(path.as_ref().to_string())
    }

    pub fn not_a_directory<P: AsRef<str>>(path: P) -> Self {
        Error::NotADirectory(path.as_ref().to_string())
    }

    pub fn not_a_file<P: AsRef<str>>(path: P) -> Self {
        Error::NotAFile(path.as_ref().to_string())
    }

    pub fn directory_not_empty<P: AsRef<str>>(path: P) -> Self {
        Error::DirectoryNotEmpty(path.as_ref().to_string())
    }

    pub fn path_escapes_root<P: AsRef<str>>(path: P) -> Self {
        Error::PathEscapesRoot(path.as_ref().to_string())
    }

    pub fn backend<K: Into<String>, M: Into<String>>(kind: K, message: M) -> Self {
        Error::Backend {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// True for the "nothing at this path" family of errors
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::FileDoesNotExist(_) | Error::NoSuchDirectory(_) | Error::NotADirectory(_)
        )
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::FileAlreadyExists(_))
    }

    /// Wrap this error so it can travel through `std::io` reader/writer plumbing.
    #[must_use]
    pub fn into_io(self) -> std::io::Error {
        std::io::Error::other(self)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        // Errors we pushed into an io::Error (e.g. cancellation observed by a
        // reader) come back out as themselves.
        if err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            if let Some(inner) = err.into_inner() {
                if let Ok(ours) = inner.downcast::<Error>() {
                    return *ours;
                }
            }
            return Error::backend("io", "unreadable wrapped error");
        }
        Error::backend("io", err.to_string())
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Error {
        match err {
            ApiError::Status {
                error_code,
                message,
                ..
            } => Error::Backend {
                kind: error_code,
                message,
            },
            ApiError::Transport(message) => Error::backend("transport", message),
            ApiError::Decode(message) => Error::backend("decode", message),
        }
    }
}
