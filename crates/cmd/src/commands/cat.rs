// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::Backends;
use anyhow::Result;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Stream a file's contents into `output`
pub async fn cat_command<W>(backends: &Backends, file_path: &str, output: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let resolved = backends.filer_for_path(file_path)?;
    let mut reader = resolved.filer.read(&resolved.path).await?;
    let written = tokio::io::copy(&mut reader, output)
        .await
        .map_err(filer::Error::from)?;
    output.flush().await?;
    log::debug!("cat {}: {} bytes", file_path, written);
    Ok(())
}
