// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod cat;
pub mod complete;
pub mod cp;
pub mod ls;
pub mod mkdir;
pub mod rm;

pub use cat::cat_command;
pub use complete::complete_command;
pub use cp::{CopyOptions, cp_command};
pub use ls::{ListOptions, ls_command};
pub use mkdir::mkdir_command;
pub use rm::rm_command;
