// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Events emitted by `fs cp` and how they are rendered.

use crate::common::OutputFormat;
use anyhow::{Result, anyhow};
use serde::Serialize;
use tera::{Context, Tera};

const COPIED_TEMPLATE: &str = "{{ source_path }} -> {{ target_path }}\n";
const SKIPPED_TEMPLATE: &str = "{{ source_path }} -> {{ target_path }} (skipped; already exists)\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Copied,
    Skipped,
}

impl EventType {
    fn template_name(self) -> &'static str {
        match self {
            EventType::Copied => "copied",
            EventType::Skipped => "skipped",
        }
    }
}

/// One file handled by a copy, with both paths as the user would write them
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CopyEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub source_path: String,
    pub target_path: String,
}

impl CopyEvent {
    #[must_use]
    pub fn copied(source_path: String, target_path: String) -> Self {
        Self {
            event_type: EventType::Copied,
            source_path,
            target_path,
        }
    }

    #[must_use]
    pub fn skipped(source_path: String, target_path: String) -> Self {
        Self {
            event_type: EventType::Skipped,
            source_path,
            target_path,
        }
    }
}

/// Turns events into output lines
pub struct EventRenderer {
    format: OutputFormat,
    tera: Tera,
}

impl EventRenderer {
    pub fn new(format: OutputFormat) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (EventType::Copied.template_name(), COPIED_TEMPLATE),
            (EventType::Skipped.template_name(), SKIPPED_TEMPLATE),
        ])
        .map_err(|e| anyhow!("invalid event template: {}", e))?;
        Ok(Self { format, tera })
    }

    /// Render one event, newline included
    pub fn render(&self, event: &CopyEvent) -> Result<String> {
        match self.format {
            OutputFormat::Text => {
                let context = Context::from_serialize(event)?;
                self.tera
                    .render(event.event_type.template_name(), &context)
                    .map_err(|e| anyhow!("cannot render event: {}", e))
            }
            OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string(event)?)),
        }
    }
}
