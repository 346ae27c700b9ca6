//! Binder configuration.
//!
//! [`BindConfig`] holds the limits applied while reading bodies. It follows
//! the framework's layered approach: built-in defaults, then an optional TOML
//! document, then environment variable overrides.
//!
//! ```
//! use archimedes_bind::BindConfig;
//!
//! let config = BindConfig::from_toml_str(r#"
//!     max_memory = 1048576
//!     max_body_size = 4194304
//! "#).unwrap();
//!
//! assert_eq!(config.max_memory, 1024 * 1024);
//! assert_eq!(config.max_body_size, Some(4 * 1024 * 1024));
//! ```

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default in-memory budget for multipart bodies (32 MiB).
pub const DEFAULT_MAX_MEMORY: usize = 32 << 20;

/// Default extra budget for multipart text parts (10 MiB).
pub const DEFAULT_MAX_VALUE_OVERFLOW: usize = 10 << 20;

/// Ceiling for urlencoded bodies when `max_body_size` is unset (10 MiB).
pub const DEFAULT_MAX_FORM_SIZE: usize = 10 << 20;

/// Limits applied while reading request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindConfig {
    /// Bytes of multipart file content kept in memory before spooling the
    /// rest to temporary files.
    pub max_memory: usize,

    /// Extra bytes allowed for multipart text parts on top of `max_memory`.
    /// Text parts are never spooled; going over this is an error.
    pub max_value_overflow: usize,

    /// Upper bound for JSON, XML, YAML and urlencoded bodies. `None` leaves
    /// whole-body formats unbounded and caps urlencoded bodies at
    /// [`DEFAULT_MAX_FORM_SIZE`].
    pub max_body_size: Option<usize>,

    /// Directory for multipart spool files. Defaults to the system temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            max_memory: DEFAULT_MAX_MEMORY,
            max_value_overflow: DEFAULT_MAX_VALUE_OVERFLOW,
            max_body_size: None,
            temp_dir: None,
        }
    }
}

impl BindConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TOML document; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the document is invalid or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides of the form `PREFIX__BIND__KEY`.
    ///
    /// Recognized keys: `MAX_MEMORY`, `MAX_VALUE_OVERFLOW`, `MAX_BODY_SIZE`
    /// and `TEMP_DIR`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or the result
    /// fails validation.
    pub fn with_env_prefix(self, prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(&prefix))
            .collect();
        self.with_env_vars(&prefix, &vars)
    }

    fn with_env_vars(
        mut self,
        prefix: &str,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        for (key, value) in vars {
            let Some(setting) = key
                .strip_prefix(prefix)
                .and_then(|k| k.strip_prefix("__BIND__"))
            else {
                continue;
            };

            match setting {
                "MAX_MEMORY" => self.max_memory = parse_size(key, value)?,
                "MAX_VALUE_OVERFLOW" => self.max_value_overflow = parse_size(key, value)?,
                "MAX_BODY_SIZE" => {
                    self.max_body_size = if value.is_empty() {
                        None
                    } else {
                        Some(parse_size(key, value)?)
                    };
                }
                "TEMP_DIR" => self.temp_dir = Some(PathBuf::from(value)),
                _ => return Err(ConfigError::env_parse(key, "unknown setting")),
            }
        }

        self.validate()?;
        Ok(self)
    }

    /// Returns the byte limit applied to urlencoded bodies.
    #[must_use]
    pub fn form_limit(&self) -> usize {
        self.max_body_size.unwrap_or(DEFAULT_MAX_FORM_SIZE)
    }

    /// Checks the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero body size limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_size == Some(0) {
            return Err(ConfigError::invalid_value(
                "max_body_size",
                "must be greater than zero; omit it to disable the limit",
            ));
        }
        Ok(())
    }
}

fn parse_size(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse(key, "expected a size in bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = BindConfig::default();
        assert_eq!(config.max_memory, 32 * 1024 * 1024);
        assert_eq!(config.max_value_overflow, 10 * 1024 * 1024);
        assert_eq!(config.max_body_size, None);
        assert_eq!(config.temp_dir, None);
    }

    #[test]
    fn test_form_limit() {
        assert_eq!(BindConfig::default().form_limit(), 10 * 1024 * 1024);

        let config = BindConfig {
            max_body_size: Some(512),
            ..BindConfig::default()
        };
        assert_eq!(config.form_limit(), 512);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BindConfig::from_toml_str("temp_dir = \"/var/spool\"").unwrap();
        assert_eq!(config.temp_dir, Some(PathBuf::from("/var/spool")));
        assert_eq!(config.max_memory, DEFAULT_MAX_MEMORY);
    }

    #[test]
    fn test_unknown_toml_key_rejected() {
        let result = BindConfig::from_toml_str("max_files = 3");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let result = BindConfig::from_toml_str("max_body_size = 0");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let config = BindConfig::default()
            .with_env_vars(
                "APP",
                &vars(&[
                    ("APP__BIND__MAX_MEMORY", "1024"),
                    ("APP__BIND__MAX_BODY_SIZE", "2048"),
                    ("APP__SERVER__HTTP_ADDR", "ignored"),
                ]),
            )
            .unwrap();

        assert_eq!(config.max_memory, 1024);
        assert_eq!(config.max_body_size, Some(2048));
    }

    #[test]
    fn test_env_parse_error() {
        let result = BindConfig::default()
            .with_env_vars("APP", &vars(&[("APP__BIND__MAX_MEMORY", "big")]));

        match result {
            Err(ConfigError::EnvParse { var, .. }) => assert_eq!(var, "APP__BIND__MAX_MEMORY"),
            other => panic!("expected EnvParse, got {other:?}"),
        }
    }

    #[test]
    fn test_env_unknown_setting() {
        let result = BindConfig::default()
            .with_env_vars("APP", &vars(&[("APP__BIND__MAX_FILES", "3")]));
        assert!(result.is_err());
    }
}
