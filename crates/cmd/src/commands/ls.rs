// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::{Backends, OutputFormat};
use anyhow::Result;
use filer::path::{basename, clean, join};
use filer::{Error, FileInfo};

#[derive(Clone, Copy, Debug, Default)]
pub struct ListOptions {
    /// Show type, size and modification time
    pub long: bool,
    /// Show full paths, with the scheme when one was given
    pub absolute: bool,
}

/// List a directory in name order. Listing a file shows just that file.
pub async fn ls_command<F>(
    backends: &Backends,
    path: &str,
    options: ListOptions,
    mut handler: F,
) -> Result<()>
where
    F: FnMut(FileInfo),
{
    let resolved = backends.filer_for_path(path)?;
    let dir = clean(&resolved.path);

    match resolved.filer.read_dir(&resolved.path).await {
        Ok(entries) => {
            for mut entry in entries {
                if options.absolute {
                    entry.name = resolved.display(&join(&dir, &entry.name));
                }
                handler(entry);
            }
        }
        Err(Error::NotADirectory(_)) => {
            let mut entry = resolved.filer.stat(&resolved.path).await?;
            entry.name = if options.absolute {
                resolved.display(&dir)
            } else {
                basename(&dir).unwrap_or(dir)
            };
            handler(entry);
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// Render one listing line, newline included
pub fn render_entry(entry: &FileInfo, long: bool, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(format!("{}\n", serde_json::to_string(entry)?));
    }
    if !long {
        return Ok(format!("{}\n", entry.name));
    }

    let kind = if entry.is_dir { "DIRECTORY" } else { "FILE" };
    let size = match (entry.is_dir, entry.size) {
        (false, Some(size)) => size.to_string(),
        _ => "-".to_string(),
    };
    let modified = entry
        .modified
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    Ok(format!(
        "{:<9} {:>12} {:<19} {}\n",
        kind, size, modified, entry.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_short() {
        let entry = FileInfo::file("a.txt", 3);
        let line = render_entry(&entry, false, OutputFormat::Text).unwrap();
        assert_eq!(line, "a.txt\n");
    }

    #[test]
    fn test_render_long() {
        let modified = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).single();
        let entry = FileInfo::file("a.txt", 1234).with_modified(modified);
        let line = render_entry(&entry, true, OutputFormat::Text).unwrap();
        assert_eq!(
            line,
            "FILE              1234 2025-03-01 12:30:00 a.txt\n"
        );

        let line = render_entry(&FileInfo::directory("d"), true, OutputFormat::Text).unwrap();
        assert_eq!(
            line,
            "DIRECTORY            - -                   d\n"
        );
    }

    #[test]
    fn test_render_json() {
        let entry = FileInfo::directory("d");
        let line = render_entry(&entry, false, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["name"], "d");
        assert_eq!(value["is_dir"], true);
    }
}
