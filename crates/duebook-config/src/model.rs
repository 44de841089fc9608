use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ConfigError;

/// Stores user-configurable preferences for the debt book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub currency: String,
    /// Balance at which a client is flagged in the detail view.
    #[serde(default = "Config::default_threshold")]
    pub alert_threshold: f64,
    /// Balance used by the directory's overdue group; adjustable by the user.
    #[serde(default = "Config::default_threshold")]
    pub directory_threshold: f64,
    #[serde(default = "Config::default_top_debtor_limit")]
    pub top_debtor_limit: usize,
    #[serde(default = "Config::default_statement_history_limit")]
    pub statement_history_limit: usize,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom data directory. Defaults to the platform data dir.
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "EGP".into(),
            alert_threshold: Self::default_threshold(),
            directory_threshold: Self::default_threshold(),
            top_debtor_limit: Self::default_top_debtor_limit(),
            statement_history_limit: Self::default_statement_history_limit(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            data_root: None,
        }
    }
}

impl Config {
    /// Keys accepted by [`Config::set_field`].
    pub const FIELDS: [&'static str; 7] = [
        "currency",
        "alert_threshold",
        "directory_threshold",
        "top_debtor_limit",
        "statement_history_limit",
        "ui_color_enabled",
        "data_root",
    ];

    pub fn default_threshold() -> f64 {
        5000.0
    }

    pub fn default_top_debtor_limit() -> usize {
        5
    }

    pub fn default_statement_history_limit() -> usize {
        15
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("duebook")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("alert_threshold", self.alert_threshold),
            ("directory_threshold", self.directory_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        if self.top_debtor_limit == 0 {
            return Err(ConfigError::Invalid(
                "top_debtor_limit must be greater than zero".into(),
            ));
        }
        if self.statement_history_limit == 0 {
            return Err(ConfigError::Invalid(
                "statement_history_limit must be greater than zero".into(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency must not be empty".into()));
        }
        Ok(())
    }

    /// Current value of every field as display text.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("currency", self.currency.clone()),
            ("alert_threshold", self.alert_threshold.to_string()),
            ("directory_threshold", self.directory_threshold.to_string()),
            ("top_debtor_limit", self.top_debtor_limit.to_string()),
            (
                "statement_history_limit",
                self.statement_history_limit.to_string(),
            ),
            ("ui_color_enabled", self.ui_color_enabled.to_string()),
            (
                "data_root",
                self.data_root
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "(default)".into()),
            ),
        ]
    }

    /// Parses `value` into the named field, then re-validates.
    ///
    /// The config is left unchanged when parsing or validation fails.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut next = self.clone();
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "currency" => next.currency = value.to_ascii_uppercase(),
            "alert_threshold" => next.alert_threshold = parse_field(key, value)?,
            "directory_threshold" => next.directory_threshold = parse_field(key, value)?,
            "top_debtor_limit" => next.top_debtor_limit = parse_field(key, value)?,
            "statement_history_limit" => next.statement_history_limit = parse_field(key, value)?,
            "ui_color_enabled" => next.ui_color_enabled = parse_field(key, value)?,
            "data_root" => {
                next.data_root = match value {
                    "" | "default" => None,
                    path => Some(PathBuf::from(path)),
                }
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown configuration key `{other}`"
                )))
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("`{value}` is not a valid value for {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.alert_threshold, 5000.0);
        assert_eq!(config.directory_threshold, 5000.0);
        assert_eq!(config.currency, "EGP");
    }

    #[test]
    fn set_field_rejects_negative_threshold_without_changes() {
        let mut config = Config::default();
        let err = config
            .set_field("directory_threshold", "-1")
            .expect_err("negative threshold must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(config, Config::default());

        config.set_field("directory_threshold", "750").unwrap();
        assert_eq!(config.directory_threshold, 750.0);
        assert_eq!(config.alert_threshold, 5000.0);
    }

    #[test]
    fn set_field_parses_each_kind() {
        let mut config = Config::default();
        config.set_field("currency", "usd").unwrap();
        config.set_field("ui_color_enabled", "false").unwrap();
        config.set_field("data_root", "/tmp/duebook").unwrap();
        assert_eq!(config.currency, "USD");
        assert!(!config.ui_color_enabled);
        assert_eq!(config.resolve_data_root(), PathBuf::from("/tmp/duebook"));
        assert!(config.set_field("top_debtor_limit", "0").is_err());
        assert!(config.set_field("theme", "dark").is_err());
    }
}
