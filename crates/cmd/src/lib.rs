// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The `lake` command line: `fs` commands over local and remote filers.

pub mod commands;
pub mod common;
pub mod completer;
pub mod config;
pub mod events;
pub mod template_utils;
