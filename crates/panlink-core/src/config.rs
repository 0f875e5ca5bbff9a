//! PANLINK Configuration Management
//!
//! Handles configuration from environment variables and TOML files with
//! defaults that work out of the box. Invalid values are rejected by
//! [`AppConfig::validate`] before any page is processed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{CONTEXT_PROXIMITY, DIRECT_ADJACENCY, NER_FALLBACK};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Linking engine configuration
    pub linking: LinkingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    /// Parse a TOML document
    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    /// Check every section; the only fatal-at-startup condition
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.linking.validate()?;
        self.logging.validate()
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(size) = var("PANLINK_WINDOW_SIZE") {
            self.linking.window_size = parse_env("PANLINK_WINDOW_SIZE", size)?;
        }
        if let Some(high) = var("PANLINK_HIGH_THRESHOLD") {
            self.linking.confidence_thresholds.high = parse_env("PANLINK_HIGH_THRESHOLD", high)?;
        }
        if let Some(medium) = var("PANLINK_MEDIUM_THRESHOLD") {
            self.linking.confidence_thresholds.medium =
                parse_env("PANLINK_MEDIUM_THRESHOLD", medium)?;
        }

        // Logging
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.json_format = match format.to_lowercase().as_str() {
                "json" => true,
                "text" | "pretty" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "LOG_FORMAT".to_string(),
                        value: format,
                    })
                }
            };
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Linking engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkingConfig {
    /// Proximity window in characters, split evenly around an identifier
    pub window_size: usize,

    /// Base score per link method (0.0 - 1.0)
    pub method_base_scores: BTreeMap<String, f32>,

    /// Reporting thresholds for confidence buckets
    pub confidence_thresholds: ConfidenceThresholds,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        let method_base_scores = BTreeMap::from([
            (CONTEXT_PROXIMITY.to_string(), 0.9),
            (DIRECT_ADJACENCY.to_string(), 0.95),
            (NER_FALLBACK.to_string(), 0.5),
        ]);

        Self {
            window_size: 200,
            method_base_scores,
            confidence_thresholds: ConfidenceThresholds::default(),
        }
    }
}

impl LinkingConfig {
    /// Reject out-of-range values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "linking.window_size".to_string(),
                value: self.window_size.to_string(),
            });
        }

        for (method, score) in &self.method_base_scores {
            if !(0.0..=1.0).contains(score) {
                return Err(ConfigError::InvalidValue {
                    key: format!("linking.method_base_scores.{method}"),
                    value: score.to_string(),
                });
            }
        }

        if !self.method_base_scores.contains_key(CONTEXT_PROXIMITY) {
            return Err(ConfigError::MissingRequired(format!(
                "linking.method_base_scores.{CONTEXT_PROXIMITY}"
            )));
        }

        self.confidence_thresholds.validate()
    }
}

/// Bucket thresholds; `medium <= high`, both within [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub high: f32,
    pub medium: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.8,
            medium: 0.6,
        }
    }
}

impl ConfidenceThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("high", self.high), ("medium", self.medium)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: format!("linking.confidence_thresholds.{key}"),
                    value: value.to_string(),
                });
            }
        }

        if self.medium > self.high {
            return Err(ConfigError::InvalidValue {
                key: "linking.confidence_thresholds.medium".to_string(),
                value: format!("{} (above high threshold {})", self.medium, self.high),
            });
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.level.clone(),
            }),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.linking.window_size, 200);
        assert_eq!(config.linking.method_base_scores[CONTEXT_PROXIMITY], 0.9);
        assert_eq!(config.linking.confidence_thresholds.high, 0.8);
        assert_eq!(config.linking.confidence_thresholds.medium, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = AppConfig::default();
        config.linking.window_size = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "linking.window_size"));
    }

    #[test]
    fn test_base_score_out_of_range_rejected() {
        let mut config = LinkingConfig::default();
        config.method_base_scores.insert("guess".to_string(), 1.5);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_proximity_score_rejected() {
        let mut config = LinkingConfig::default();
        config.method_base_scores.remove(CONTEXT_PROXIMITY);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let thresholds = ConfidenceThresholds {
            high: 0.5,
            medium: 0.7,
        };
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [linking]
            window_size = 120

            [linking.confidence_thresholds]
            high = 0.85
            "#,
        )
        .unwrap();

        assert_eq!(config.linking.window_size, 120);
        assert_eq!(config.linking.confidence_thresholds.high, 0.85);
        assert_eq!(config.linking.confidence_thresholds.medium, 0.6);
        assert_eq!(config.linking.method_base_scores.len(), 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_negative_window_fails_to_parse() {
        let result = AppConfig::from_toml_str("[linking]\nwindow_size = -4\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[linking.method_base_scores]\ncontext_proximity = 0.7\n\n[logging]\njson_format = true"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.linking.method_base_scores[CONTEXT_PROXIMITY], 0.7);
        assert_eq!(config.linking.method_base_scores.len(), 1);
        assert!(config.logging.json_format);
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = AppConfig::from_toml_str(
            r#"
            [linking]
            window_size = 120

            [logging]
            level = "debug"
            json_format = true
            "#,
        )
        .unwrap();

        config
            .apply_vars(vars(&[
                ("PANLINK_WINDOW_SIZE", " 80 "),
                ("PANLINK_HIGH_THRESHOLD", "0.9"),
                ("LOG_FORMAT", "Text"),
            ]))
            .unwrap();

        assert_eq!(config.linking.window_size, 80);
        assert_eq!(config.linking.confidence_thresholds.high, 0.9);
        assert_eq!(config.linking.confidence_thresholds.medium, 0.6);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_no_env_keeps_values() {
        let mut config = AppConfig::default();
        config.linking.window_size = 150;

        config.apply_vars(vars(&[])).unwrap();
        assert_eq!(config.linking.window_size, 150);
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        let err = AppConfig::default()
            .apply_vars(vars(&[("LOG_FORMAT", "xml")]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { ref key, ref value }
            if key == "LOG_FORMAT" && value == "xml"));
    }

    #[test]
    fn test_unparsable_env_number_rejected() {
        let err = AppConfig::default()
            .apply_vars(vars(&[("PANLINK_WINDOW_SIZE", "wide")]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. }
            if key == "PANLINK_WINDOW_SIZE"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = AppConfig::from_file("/nonexistent/panlink.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }
}
