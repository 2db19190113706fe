// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Access to configuration values supplied through the process environment.
//!
//! Code that needs a setting takes a `&dyn Environment` instead of calling `std::env::var`
//! directly, so that tests can substitute a [`MapEnvironment`].

mod map;

use std::str::FromStr;

pub use map::MapEnvironment;

pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn enabled(&self, key: &str, default_value: bool) -> Result<bool, EnvError> {
        match self.get(key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" | "enabled" | "enable" => Ok(true),
                "false" | "0" | "no" | "off" | "disabled" | "disable" => Ok(false),
                _ => Err(EnvError::InvalidBoolean {
                    key: key.to_string(),
                    value,
                }),
            },
            None => Ok(default_value),
        }
    }

    fn get_or_else(&self, key: &str, default_value: &str) -> String {
        self.get(key).unwrap_or_else(|| default_value.to_string())
    }
}

/// Parse the value of `key`, returning `Ok(None)` if it is not set.
pub fn get_parsed<T>(env: &dyn Environment, key: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env.get(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| EnvError::InvalidValue {
                key: key.to_string(),
                value: value.clone(),
                message: e.to_string(),
            })
        })
        .transpose()
}

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error(
        "Invalid value for {key}: {value}. Expected true, 1, yes, on, enabled, enable OR false, 0, no, off, disabled, disable"
    )]
    InvalidBoolean { key: String, value: String },

    #[error("Invalid value '{value}' for {key}: {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_accepts_common_spellings() {
        let env = MapEnvironment::from([("A", "yes"), ("B", "Off"), ("C", "maybe")]);

        assert!(env.enabled("A", false).unwrap());
        assert!(!env.enabled("B", true).unwrap());
        assert!(env.enabled("MISSING", true).unwrap());
        assert!(matches!(
            env.enabled("C", true),
            Err(EnvError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn parsed_values() {
        let env = MapEnvironment::from([("PORT", " 4000 "), ("BAD_PORT", "forty")]);

        assert_eq!(get_parsed::<u16>(&env, "PORT").unwrap(), Some(4000));
        assert_eq!(get_parsed::<u16>(&env, "UNSET").unwrap(), None);

        let err = get_parsed::<u16>(&env, "BAD_PORT").unwrap_err();
        assert!(err.to_string().contains("BAD_PORT"));
    }
}
