// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::Backends;
use anyhow::Result;

/// Create a directory and any missing parents. Existing directories are fine.
pub async fn mkdir_command(backends: &Backends, dir_path: &str) -> Result<()> {
    let resolved = backends.filer_for_path(dir_path)?;
    log::debug!("mkdir {}", dir_path);
    resolved.filer.mkdir(&resolved.path).await?;
    Ok(())
}
