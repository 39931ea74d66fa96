// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::Backends;
use anyhow::Result;
use filer::DeleteMode;

pub async fn rm_command(backends: &Backends, path: &str, recursive: bool) -> Result<()> {
    let resolved = backends.filer_for_path(path)?;
    let mode = if recursive {
        DeleteMode::RECURSIVE
    } else {
        DeleteMode::default()
    };
    log::debug!("rm {} (recursive: {})", path, recursive);
    resolved.filer.delete(&resolved.path, mode).await?;
    Ok(())
}
