// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Workspace connection settings.
//!
//! Settings come from a YAML file (`--config`, else `$LAKE_CONFIG_FILE`, else
//! `~/.lake.yaml` when present), then `LAKE_HOST` and `LAKE_TOKEN` override
//! whatever the file said.

use crate::template_utils::expand_yaml_template;
use anyhow::{Context, Result, anyhow};
use filer::{ApiClient, ClientConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const CONFIG_FILE_ENV: &str = "LAKE_CONFIG_FILE";
pub const HOST_ENV: &str = "LAKE_HOST";
pub const TOKEN_ENV: &str = "LAKE_TOKEN";

const DEFAULT_CONFIG_FILE: &str = ".lake.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Workspace URL, with or without `https://`
    #[serde(default)]
    pub host: Option<String>,

    /// Personal access token sent as a bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// HTTP request timeout
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Config {
    /// Load the config the CLI runs with, including environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match config_path(explicit) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        log::debug!("reading config from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_yaml_template(content)?;
        if expanded.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(&expanded).map_err(|e| anyhow!("{}", e))
    }

    /// Replace host and token with non-empty values from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV).filter(|v| !v.is_empty()) {
            self.host = Some(host);
        }
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
    }

    /// The normalised workspace URL, if one is configured
    pub fn host_url(&self) -> Result<Option<Url>> {
        match self.host.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(host) => normalize_host(host).map(Some),
        }
    }

    /// Build the shared API client, or `None` without a host
    pub fn client(&self) -> Result<Option<ApiClient>> {
        let Some(host) = self.host_url()? else {
            return Ok(None);
        };
        let mut config = ClientConfig::new(host).with_token(self.token.clone());
        if let Some(seconds) = self.timeout_seconds {
            config = config.with_timeout(Duration::from_secs(seconds));
        }
        Ok(Some(config.build()?))
    }
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.is_file())
}

/// Add `https://` when no scheme is given and drop trailing slashes
pub fn normalize_host(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };
    Url::parse(&with_scheme).with_context(|| format!("invalid workspace host: {}", host))
}
