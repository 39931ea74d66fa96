// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Template expansion for the YAML config file.
//!
//! The config file is run through Tera before it is parsed, so secrets can
//! stay in the environment:
//!
//! ```text
//! host: "{{ env(name='LAKE_WORKSPACE') }}"
//! token: "{{ env(name='LAKE_SECRET', default='') }}"
//! ```

use anyhow::Result;
use std::collections::HashMap;
use tera::{Tera, Value};

/// Expand Tera syntax in YAML content, with `env` registered
pub fn expand_yaml_template(yaml_content: &str) -> Result<String> {
    let mut tera = Tera::default();
    tera.register_function("env", lookup_env);

    tera.render_str(yaml_content, &tera::Context::new())
        .map_err(|e| anyhow::anyhow!("config template: {}", error_messages(&e)))
}

/// Tera buries the useful part of a render failure in its sources
fn error_messages(err: &dyn std::error::Error) -> String {
    std::iter::successors(Some(err), |e| e.source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

/// `env(name=..)` reads a variable; an optional `default=..` covers it being unset
fn lookup_env(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let Some(name) = args.get("name").and_then(Value::as_str) else {
        return Err(tera::Error::msg("env() needs a 'name' argument"));
    };
    let default = args.get("default").and_then(Value::as_str);

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(Value::String(value)),
        (Err(std::env::VarError::NotPresent), Some(default)) => {
            Ok(Value::String(default.to_owned()))
        }
        (Err(std::env::VarError::NotPresent), None) => Err(tera::Error::msg(format!(
            "{name} is unset and env() was given no default"
        ))),
        (Err(err), _) => Err(tera::Error::msg(format!("{name}: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_with_env_function() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("LAKE_TEMPLATE_TEST_TOKEN", "dapi123");
        }

        let yaml = "token: \"{{ env(name='LAKE_TEMPLATE_TEST_TOKEN') }}\"\n";
        let result = expand_yaml_template(yaml).unwrap();
        assert_eq!(result, "token: \"dapi123\"\n");

        // SAFETY: as above
        unsafe {
            std::env::remove_var("LAKE_TEMPLATE_TEST_TOKEN");
        }
    }

    #[test]
    fn test_expand_with_env_default() {
        let yaml = "host: \"{{ env(name='LAKE_TEMPLATE_TEST_UNSET', default='example.com') }}\"";
        let result = expand_yaml_template(yaml).unwrap();
        assert!(result.contains("example.com"));
    }

    #[test]
    fn test_expand_env_missing_error() {
        let yaml = "host: \"{{ env(name='LAKE_TEMPLATE_TEST_MISSING') }}\"";
        let err = expand_yaml_template(yaml).unwrap_err();
        assert!(err.to_string().contains("LAKE_TEMPLATE_TEST_MISSING"), "{err}");
    }

    #[test]
    fn test_expand_no_templates() {
        let yaml = "host: https://example.com\ntimeout_seconds: 30\n";
        assert_eq!(expand_yaml_template(yaml).unwrap(), yaml);
    }
}
