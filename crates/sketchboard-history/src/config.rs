#![forbid(unsafe_code)]

//! History configuration.
//!
//! [`HistoryConfig`] carries the tunables of the history manager. With the
//! `history-config` feature it can be loaded from TOML or JSON at startup:
//!
//! ```toml
//! # sketchboard-history.toml
//! max_stack_size = 200
//! ```
//!
//! ```rust,ignore
//! let config = HistoryConfig::from_toml_file("sketchboard-history.toml")?;
//! let manager = HistoryManager::with_config(config);
//! ```

#[cfg(feature = "history-config")]
use std::path::Path;

#[cfg(feature = "history-config")]
use serde::{Deserialize, Serialize};

/// Tunables for [`HistoryManager`](crate::undo::HistoryManager).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "history-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "history-config", serde(default))]
pub struct HistoryConfig {
    /// Maximum number of entries on the undo stack (and on the redo stack).
    /// Values below 1 are raised to 1 when applied.
    pub max_stack_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_stack_size: Self::DEFAULT_MAX_STACK_SIZE,
        }
    }
}

impl HistoryConfig {
    pub const DEFAULT_MAX_STACK_SIZE: usize = 100;

    #[must_use]
    pub fn new(max_stack_size: usize) -> Self {
        Self { max_stack_size }
    }

    /// No practical bound (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_stack_size: usize::MAX,
        }
    }

    /// Stack bound as the manager applies it (never below 1).
    #[must_use]
    pub fn effective_max_stack_size(&self) -> usize {
        self.max_stack_size.max(1)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_stack_size == 0 {
            errors.push("max_stack_size must be >= 1".into());
        }
        errors
    }

    /// Load from a TOML string.
    #[cfg(feature = "history-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, HistoryConfigError> {
        let config: Self = toml::from_str(s).map_err(HistoryConfigError::Toml)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "history-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, HistoryConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(HistoryConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "history-config")]
    pub fn from_json_str(s: &str) -> Result<Self, HistoryConfigError> {
        let config: Self = serde_json::from_str(s).map_err(HistoryConfigError::Json)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "history-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, HistoryConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(HistoryConfigError::Io)?;
        Self::from_json_str(&content)
    }

    #[cfg(feature = "history-config")]
    fn checked(self) -> Result<Self, HistoryConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(HistoryConfigError::Validation(errors))
        }
    }
}

/// Errors from loading a [`HistoryConfig`].
#[derive(Debug)]
pub enum HistoryConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "history-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "history-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for HistoryConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "history-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "history-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for HistoryConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "history-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "history-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bound() {
        let config = HistoryConfig::default();
        assert_eq!(config.max_stack_size, 100);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn zero_is_invalid_but_clamped() {
        let config = HistoryConfig::new(0);
        assert_eq!(config.validate().len(), 1);
        assert_eq!(config.effective_max_stack_size(), 1);
    }

    #[test]
    fn unlimited_is_max() {
        assert_eq!(HistoryConfig::unlimited().max_stack_size, usize::MAX);
    }

    #[test]
    fn validation_error_display() {
        let err = HistoryConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation errors: a; b");
    }

    #[cfg(feature = "history-config")]
    mod loading {
        use super::*;
        use std::io::Write;

        #[test]
        fn toml_round_trip() {
            let config = HistoryConfig::from_toml_str("max_stack_size = 7").unwrap();
            assert_eq!(config.max_stack_size, 7);
        }

        #[test]
        fn missing_fields_use_defaults() {
            let config = HistoryConfig::from_json_str("{}").unwrap();
            assert_eq!(config, HistoryConfig::default());
        }

        #[test]
        fn zero_rejected_on_load() {
            let err = HistoryConfig::from_json_str(r#"{"max_stack_size":0}"#).unwrap_err();
            assert!(matches!(err, HistoryConfigError::Validation(_)));
        }

        #[test]
        fn bad_toml_reports_parse_error() {
            let err = HistoryConfig::from_toml_str("max_stack_size = \"lots\"").unwrap_err();
            assert!(err.to_string().starts_with("TOML parse error"));
        }

        #[test]
        fn loads_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "max_stack_size = 12").unwrap();
            let config = HistoryConfig::from_toml_file(file.path()).unwrap();
            assert_eq!(config.max_stack_size, 12);
        }

        #[test]
        fn missing_file_is_io_error() {
            let err = HistoryConfig::from_json_file("/definitely/not/here.json").unwrap_err();
            assert!(matches!(err, HistoryConfigError::Io(_)));
        }
    }
}
