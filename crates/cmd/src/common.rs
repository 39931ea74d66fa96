// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::config::Config;
use anyhow::{Result, anyhow};
use clap::ValueEnum;
use filer::api::dbfs::DbfsApi;
use filer::api::files::FilesApi;
use filer::api::workspace::WorkspaceApi;
use filer::{
    CancellableFiler, DbfsFiler, Error, Filer, LocalFiler, VolumesFiler, WorkspaceFiler,
};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Prefix of `dbfs:` paths that live in Unity Catalog volumes
pub const VOLUMES_PREFIX: &str = "/Volumes/";

/// How command results are written to stdout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// A recognised path scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    File,
    Dbfs,
    Workspace,
}

impl Scheme {
    fn parse(prefix: &str) -> Option<Scheme> {
        match prefix {
            "file" => Some(Scheme::File),
            "dbfs" => Some(Scheme::Dbfs),
            "workspace" => Some(Scheme::Workspace),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::File => "file",
            Scheme::Dbfs => "dbfs",
            Scheme::Workspace => "workspace",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The remote APIs a workspace connection offers
#[derive(Clone)]
pub struct Remote {
    dbfs: Arc<dyn DbfsApi>,
    workspace: Arc<dyn WorkspaceApi>,
    files: Arc<dyn FilesApi>,
}

impl Remote {
    /// Use one implementation for all three APIs
    pub fn from_api<T>(api: Arc<T>) -> Self
    where
        T: DbfsApi + WorkspaceApi + FilesApi + 'static,
    {
        Self {
            dbfs: api.clone(),
            workspace: api.clone(),
            files: api,
        }
    }
}

/// A path argument resolved to the filer that serves it
pub struct Resolved {
    pub filer: Box<dyn Filer>,
    pub path: String,
    pub scheme: Option<Scheme>,
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("path", &self.path)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl Resolved {
    /// Render a path on this filer the way the user would write it
    #[must_use]
    pub fn display(&self, path: &str) -> String {
        match self.scheme {
            Some(scheme) => format!("{}:{}", scheme, path),
            None => path.to_string(),
        }
    }
}

/// Everything needed to turn path arguments into filers for one invocation
#[derive(Clone)]
pub struct Backends {
    remote: Option<Remote>,
    token: CancellationToken,
}

impl Backends {
    #[must_use]
    pub fn new(remote: Option<Remote>, token: CancellationToken) -> Self {
        Self { remote, token }
    }

    pub fn from_config(config: &Config, token: CancellationToken) -> Result<Self> {
        let remote = config
            .client()?
            .map(|client| Remote::from_api(Arc::new(client)));
        Ok(Self::new(remote, token))
    }

    /// Pick the filer for a command-line path.
    ///
    /// `scheme:path` selects a backend; anything without a `:` is a local
    /// path. Remote paths must be absolute and get a filer rooted at `/`.
    pub fn filer_for_path(&self, raw: &str) -> Result<Resolved> {
        let Some((prefix, rest)) = raw.split_once(':') else {
            return Ok(self.local(raw, None));
        };

        // `C:\data` on Windows is a drive letter, not a scheme
        if cfg!(windows) && prefix.len() == 1 {
            return Ok(self.local(raw, None));
        }

        let scheme = Scheme::parse(prefix).ok_or_else(|| Error::InvalidScheme(prefix.to_string()))?;
        if scheme == Scheme::File {
            return Ok(self.local(rest, Some(scheme)));
        }

        if !rest.starts_with('/') {
            return Err(Error::RelativeRemotePath(raw.to_string()).into());
        }
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| anyhow!("no workspace host configured"))?;

        let filer: Box<dyn Filer> = match scheme {
            Scheme::Dbfs if rest.starts_with(VOLUMES_PREFIX) => {
                log::debug!("{} routes to the volume files backend", raw);
                Box::new(VolumesFiler::new(remote.files.clone(), "/"))
            }
            Scheme::Dbfs => Box::new(DbfsFiler::new(remote.dbfs.clone(), "/")),
            _ => Box::new(WorkspaceFiler::new(remote.workspace.clone(), "/")),
        };
        Ok(Resolved {
            filer: self.cancellable(filer),
            path: rest.to_string(),
            scheme: Some(scheme),
        })
    }

    fn local(&self, path: &str, scheme: Option<Scheme>) -> Resolved {
        Resolved {
            filer: self.cancellable(Box::new(LocalFiler::new(""))),
            path: path.to_string(),
            scheme,
        }
    }

    fn cancellable(&self, filer: Box<dyn Filer>) -> Box<dyn Filer> {
        Box::new(CancellableFiler::new(filer, self.token.clone()))
    }
}
