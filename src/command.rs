// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 verdant contributors
// This file is part of the verdant crate.

mod cmd_lsystem_tree;
mod trait_impl;

use crate::{VerdantError, ffi::FFIVector3};
use std::collections::HashMap;

pub(crate) trait Options {
    /// Will return an option parsed as a `T` or an Err.
    /// A missing option is replaced by `default`, if there is one.
    fn get_mandatory_parsed_option<'a, T: std::str::FromStr>(
        &'a self,
        key: &'a str,
        default: Option<T>,
    ) -> Result<T, VerdantError>;

    /// Will return an option parsed as a `T` or None.
    /// If the option is missing None is returned, if it there but if it can't be parsed an error
    /// will be returned.
    fn get_parsed_option<'a, T: std::str::FromStr>(
        &'a self,
        key: &'a str,
    ) -> Result<Option<T>, VerdantError>;

    /// Returns the &str value of an option, or an Err is it does not exists
    fn get_mandatory_option(&self, key: &str) -> Result<&str, VerdantError>;

    /// Returns true if the option exists
    fn does_option_exist(&self, key: &str) -> Result<bool, VerdantError>;
}

pub type ConfigType = HashMap<String, String>;

/// Vertices, triangle indices and the result options
pub type CommandResult = (Vec<FFIVector3>, Vec<usize>, ConfigType);

/// This is the main entry point, all commands will be routed through this API
pub fn process_command(config: ConfigType) -> Result<CommandResult, VerdantError> {
    Ok(match config.get_mandatory_option("command")? {
        cmd_lsystem_tree::COMMAND_NAME => cmd_lsystem_tree::process_command(&config)?,
        illegal_command => Err(VerdantError::InvalidParameter(format!(
            "Invalid command:{illegal_command}"
        )))?,
    })
}
