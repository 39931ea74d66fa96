// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::{Backends, Resolved};
use crate::events::CopyEvent;
use anyhow::Result;
use filer::path::{basename, join, relative};
use filer::{Error, WriteMode, walk};
use futures::StreamExt;

#[derive(Clone, Copy, Debug, Default)]
pub struct CopyOptions {
    pub recursive: bool,
    pub overwrite: bool,
}

/// One copy between two resolved locations
struct Copier<'a, F> {
    source: &'a Resolved,
    target: &'a Resolved,
    options: CopyOptions,
    handler: F,
}

impl<F> Copier<'_, F>
where
    F: FnMut(CopyEvent),
{
    fn write_mode(&self) -> WriteMode {
        if self.options.overwrite {
            WriteMode::CREATE_PARENT_DIRECTORIES | WriteMode::OVERWRITE_IF_EXISTS
        } else {
            WriteMode::CREATE_PARENT_DIRECTORIES
        }
    }

    async fn copy_file(&mut self, source_path: &str, target_path: &str) -> Result<()> {
        let reader = self.source.filer.read(source_path).await?;
        let source_display = self.source.display(source_path);
        let target_display = self.target.display(target_path);

        match self
            .target
            .filer
            .write(target_path, reader, self.write_mode())
            .await
        {
            Ok(()) => {
                log::debug!("copied {} to {}", source_display, target_display);
                (self.handler)(CopyEvent::copied(source_display, target_display));
                Ok(())
            }
            Err(err) if err.is_already_exists() && !self.options.overwrite => {
                log::info!("skipping {}: {} exists", source_display, target_display);
                (self.handler)(CopyEvent::skipped(source_display, target_display));
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn copy_tree(&mut self, source_dir: &str, target_dir: &str) -> Result<()> {
        let source = self.source;
        let entries = walk(source.filer.as_ref(), source_dir);
        futures::pin_mut!(entries);

        while let Some(entry) = entries.next().await {
            let info = entry.info?;
            let rel = relative(source_dir, &entry.path)
                .ok_or_else(|| Error::path_escapes_root(&entry.path))?;
            let target_path = if rel == "." {
                target_dir.to_string()
            } else {
                join(target_dir, &rel)
            };

            if info.is_dir {
                log::debug!("mkdir {}", self.target.display(&target_path));
                self.target.filer.mkdir(&target_path).await?;
            } else {
                self.copy_file(&entry.path, &target_path).await?;
            }
        }
        Ok(())
    }
}

/// Copy `source` to `target`, reporting each file to `handler`.
///
/// At least one side must name a scheme. A directory source needs
/// `recursive`; a file copied onto an existing directory, or onto a target
/// ending in `/`, lands inside it under its own name. Without `overwrite`,
/// files that already exist are skipped rather than failing the copy.
pub async fn cp_command<F>(
    backends: &Backends,
    source: &str,
    target: &str,
    options: CopyOptions,
    handler: F,
) -> Result<()>
where
    F: FnMut(CopyEvent),
{
    let source_resolved = backends.filer_for_path(source)?;
    let target_resolved = backends.filer_for_path(target)?;
    if source_resolved.scheme.is_none() && target_resolved.scheme.is_none() {
        return Err(Error::MissingScheme(source.to_string()).into());
    }

    log::debug!("cp {} {} {:?}", source, target, options);
    let source_info = source_resolved.filer.stat(&source_resolved.path).await?;

    let mut copier = Copier {
        source: &source_resolved,
        target: &target_resolved,
        options,
        handler,
    };

    if source_info.is_dir {
        if !options.recursive {
            return Err(Error::DirectoryWithoutRecursive(source_resolved.path.clone()).into());
        }
        return copier
            .copy_tree(&source_resolved.path, &target_resolved.path)
            .await;
    }

    let target_path = &target_resolved.path;
    let into_directory = target_path.ends_with('/')
        || target_resolved
            .filer
            .stat(target_path)
            .await
            .is_ok_and(|info| info.is_dir);

    if into_directory {
        let name = basename(&source_resolved.path)
            .ok_or_else(|| Error::not_a_file(&source_resolved.path))?;
        copier
            .copy_file(&source_resolved.path, &join(target_path, &name))
            .await
    } else {
        copier.copy_file(&source_resolved.path, target_path).await
    }
}
