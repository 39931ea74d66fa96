// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Uniform file operations over local disk and the platform's remote stores.
//!
//! Every backend implements [`Filer`] and is confined to a root. Remote
//! backends talk to their REST APIs through the traits in [`api`].

pub mod api;
pub mod cancel;
pub mod dbfs;
pub mod error;
pub mod filer;
pub mod local;
pub mod path;
pub mod volumes;
pub mod walker;
pub mod workspace;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use api::{ApiClient, ApiError, ClientConfig};
pub use cancel::{CancellableFiler, CancellableReader};
pub use dbfs::DbfsFiler;
pub use error::{Error, Result, VALID_SCHEMES};
pub use filer::{
    DeleteMode, FileInfo, FileReader, Filer, ObjectMetadata, WriteMode, reader_from_bytes,
};
pub use local::LocalFiler;
pub use path::RootPath;
pub use volumes::VolumesFiler;
pub use walker::{WalkEntry, walk};
pub use workspace::WorkspaceFiler;
