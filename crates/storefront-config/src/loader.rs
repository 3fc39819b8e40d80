//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use storefront_telemetry::LogFormat;

use crate::{ConfigError, StorefrontConfig};

/// Default prefix for override variables.
pub const DEFAULT_ENV_PREFIX: &str = "STOREFRONT";

/// Builds a [`StorefrontConfig`] from layers, later ones winning:
///
/// 1. built-in defaults
/// 2. a TOML or JSON file
/// 3. `PREFIX__SECTION__KEY` environment variables
///
/// ```no_run
/// use storefront_config::ConfigLoader;
///
/// # fn main() -> Result<(), storefront_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("storefront.toml")?
///     .with_env_prefix("STOREFRONT")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: StorefrontConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Starts from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from [`StorefrontConfig::development`].
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = StorefrontConfig::development();
        self
    }

    /// Replaces the current layer with the contents of `path`.
    ///
    /// Fields missing from the file take their defaults; unknown fields are
    /// an error.
    ///
    /// # Errors
    ///
    /// `FileNotFound`, `Read`, `UnsupportedFormat`, or a parse error.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file) but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Same as `with_file` once the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Replaces the current layer with `content` in the given format.
    ///
    /// ```
    /// use storefront_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[pagination]\ndefault_page_size = 25", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.pagination.default_page_size, 25);
    /// assert_eq!(config.pagination.search_page_size, 10);
    /// ```
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` or a parse error.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Reads overrides from the process environment at [`load`](Self::load).
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies overrides from an explicit variable list.
    ///
    /// # Errors
    ///
    /// `InvalidEnvValue` for a known key with a malformed value.
    pub fn with_env_vars<I, K, V>(mut self, prefix: &str, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let prefix = prefix.to_uppercase();
        for (key, value) in vars {
            self.apply_env_var(&prefix, key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    /// Loads `.env` into the process environment if one exists.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// `InvalidEnvValue` or `InvalidValue`.
    pub fn load(mut self) -> Result<StorefrontConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self = self.with_env_vars(&prefix, env::vars())?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    fn apply_env_var(&mut self, prefix: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let Some(rest) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_num(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => config.server.max_body_bytes = parse_num(key, value)?,

            ["PAGINATION", "DEFAULT_PAGE"] => config.pagination.default_page = parse_num(key, value)?,
            ["PAGINATION", "DEFAULT_PAGE_SIZE"] => {
                config.pagination.default_page_size = parse_num(key, value)?;
            }
            ["PAGINATION", "SEARCH_PAGE"] => config.pagination.search_page = parse_num(key, value)?,
            ["PAGINATION", "SEARCH_PAGE_SIZE"] => {
                config.pagination.search_page_size = parse_num(key, value)?;
            }
            ["PAGINATION", "MIN_SEARCH_LEN"] => {
                config.pagination.min_search_len = parse_num(key, value)?;
            }

            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                config.telemetry.logging.enabled = parse_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => config.telemetry.logging.level = value.to_string(),
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::invalid_env(key, "expected 'json' or 'pretty'")),
                };
            }
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                config.telemetry.metrics.enabled = parse_bool(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ADDR"] => config.telemetry.metrics.addr = value.to_string(),

            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<StorefrontConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_num<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_env(key, "expected a non-negative integer"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_env(key, "expected boolean")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, StorefrontConfig::default());
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
http_addr = "127.0.0.1:3000"

[pagination]
default_page_size = 20

[telemetry.logging]
format = "pretty"
"#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.server.max_body_bytes, 1024 * 1024);
        assert_eq!(config.pagination.default_page_size, 20);
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"pagination": {{"min_search_len": 5}}}}"#).unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.pagination.min_search_len, 5);
    }

    #[test]
    fn test_unknown_field_in_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 8080").unwrap();

        let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_files() {
        let err = ConfigLoader::new()
            .with_file("/nonexistent/storefront.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/storefront.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_env_overrides_file() {
        let config = ConfigLoader::new()
            .with_string("[pagination]\ndefault_page_size = 20", "toml")
            .unwrap()
            .with_env_vars(
                DEFAULT_ENV_PREFIX,
                vars(&[
                    ("STOREFRONT__PAGINATION__DEFAULT_PAGE_SIZE", "15"),
                    ("STOREFRONT__SERVER__HTTP_ADDR", "127.0.0.1:9000"),
                    ("STOREFRONT__TELEMETRY__LOGGING__FORMAT", "Pretty"),
                    ("STOREFRONT__TELEMETRY__METRICS__ENABLED", "off"),
                ]),
            )
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.pagination.default_page_size, 15);
        assert_eq!(config.server.http_addr, "127.0.0.1:9000");
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
        assert!(!config.telemetry.metrics.enabled);
    }

    #[test]
    fn test_env_invalid_value() {
        let err = ConfigLoader::new()
            .with_env_vars(
                DEFAULT_ENV_PREFIX,
                vars(&[("STOREFRONT__SERVER__MAX_BODY_BYTES", "lots")]),
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { ref var, .. } if var == "STOREFRONT__SERVER__MAX_BODY_BYTES"));
    }

    #[test]
    fn test_env_unknown_and_foreign_keys_ignored() {
        let config = ConfigLoader::new()
            .with_env_vars(
                DEFAULT_ENV_PREFIX,
                vars(&[
                    ("STOREFRONT__SERVER__THREADS", "8"),
                    ("STOREFRONTISH__SERVER__HTTP_ADDR", "garbage"),
                    ("PATH", "/usr/bin"),
                ]),
            )
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, StorefrontConfig::default());
    }

    #[test]
    fn test_env_value_failing_validation() {
        let err = ConfigLoader::new()
            .with_env_vars(
                DEFAULT_ENV_PREFIX,
                vars(&[("STOREFRONT__PAGINATION__DEFAULT_PAGE", "0")]),
            )
            .unwrap()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
