//! Configuration for task-sequence.
//!
//! The defaults bind to the host's standard automation classes. A host that
//! registers them under different identifiers, or whose dialog engine uses
//! different result codes, can override both from code or from TOML:
//!
//! ```toml
//! environment_class = "Microsoft.SMS.TSEnvironment"
//! progress_class = "Microsoft.SMS.TsProgressUI"
//!
//! [result_codes]
//! yes = 6
//! no = 7
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskSequenceError};
use crate::message::ResultCodes;

/// Default class identifier of the variable store.
pub const DEFAULT_ENVIRONMENT_CLASS: &str = "Microsoft.SMS.TSEnvironment";

/// Default class identifier of the progress UI.
pub const DEFAULT_PROGRESS_CLASS: &str = "Microsoft.SMS.TsProgressUI";

/// Configuration shared by [`VariableStore`](crate::VariableStore) and
/// [`ProgressReporter`](crate::ProgressReporter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Class identifier of the variable store object.
    pub environment_class: String,

    /// Class identifier of the progress UI object.
    pub progress_class: String,

    /// Codes returned by result-bearing message boxes.
    pub result_codes: ResultCodes,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            environment_class: DEFAULT_ENVIRONMENT_CLASS.to_string(),
            progress_class: DEFAULT_PROGRESS_CLASS.to_string(),
            result_codes: ResultCodes::default(),
        }
    }
}

impl AutomationConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the class identifier of the variable store.
    #[must_use]
    pub fn environment_class(mut self, class: impl Into<String>) -> Self {
        self.environment_class = class.into();
        self
    }

    /// Set the class identifier of the progress UI.
    #[must_use]
    pub fn progress_class(mut self, class: impl Into<String>) -> Self {
        self.progress_class = class.into();
        self
    }

    /// Set the message box result codes.
    #[must_use]
    pub const fn result_codes(mut self, codes: ResultCodes) -> Self {
        self.result_codes = codes;
        self
    }

    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file owned by the host.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TaskSequenceError::config(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that both class identifiers are set and the result codes are
    /// unambiguous.
    pub fn validate(&self) -> Result<()> {
        if self.environment_class.trim().is_empty() {
            return Err(TaskSequenceError::config("environment_class must not be empty"));
        }
        if self.progress_class.trim().is_empty() {
            return Err(TaskSequenceError::config("progress_class must not be empty"));
        }
        self.result_codes.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AutomationConfig::default();
        assert_eq!(config.environment_class, "Microsoft.SMS.TSEnvironment");
        assert_eq!(config.progress_class, "Microsoft.SMS.TsProgressUI");
        assert_eq!(config.result_codes, ResultCodes::default());
    }

    #[test]
    fn builder() {
        let config = AutomationConfig::new()
            .environment_class("Contoso.Env")
            .progress_class("Contoso.Ui");
        assert_eq!(config.environment_class, "Contoso.Env");
        assert_eq!(config.progress_class, "Contoso.Ui");
    }

    #[test]
    fn empty_class_is_rejected() {
        let err = AutomationConfig::new().environment_class(" ").validate().unwrap_err();
        assert!(matches!(err, TaskSequenceError::Config { .. }));
    }
}
