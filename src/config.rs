//! Runner configuration
//!
//! Every section deserializes from YAML with defaults for missing fields:
//!
//! ```yaml
//! input_names: [image, label]
//! progress:
//!   enabled: true
//!   log_interval: 50
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};
use crate::infer::TriggerSchedule;

/// Progress reporting during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub enabled: bool,
    /// Log a progress line every N steps
    pub log_interval: usize,
    /// Width of the rendered bar in characters
    pub bar_width: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { enabled: true, log_interval: 10, bar_width: 30 }
    }
}

impl ProgressConfig {
    pub fn validate(&self) -> Result<()> {
        if self.log_interval == 0 {
            return Err(InferenceError::config("progress.log_interval must be > 0"));
        }
        Ok(())
    }
}

/// Configuration of a fed [`InferenceRunner`](crate::infer::InferenceRunner)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceRunnerConfig {
    /// Names the datapoint components are fed to. Defaults to the model's
    /// declared inputs.
    pub input_names: Option<Vec<String>>,
    pub progress: ProgressConfig,
    pub schedule: TriggerSchedule,
}

impl InferenceRunnerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if matches!(&self.input_names, Some(names) if names.is_empty()) {
            return Err(InferenceError::config("input_names must not be empty when given"));
        }
        self.progress.validate()?;
        self.schedule.validate()
    }
}

/// Configuration of a [`FeedfreeInferenceRunner`](crate::infer::FeedfreeInferenceRunner)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedfreeRunnerConfig {
    /// Remapping of pipeline tensors onto model inputs. Not supported.
    pub input_names: Option<Vec<String>>,
    /// Tower name prefix; must differ between feedfree runners sharing a graph
    pub prefix: String,
    pub progress: ProgressConfig,
    pub schedule: TriggerSchedule,
}

impl FeedfreeRunnerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefix.contains('/') {
            return Err(InferenceError::config(format!(
                "prefix '{}' must not contain '/'",
                self.prefix
            )));
        }
        self.progress.validate()?;
        self.schedule.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = InferenceRunnerConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, InferenceRunnerConfig::default());
        assert!(config.progress.enabled);
        assert_eq!(config.schedule.every_k_epochs, 1);
    }

    #[test]
    fn test_fed_config_from_yaml() {
        let yaml = r"
input_names: [image, label]
progress:
  log_interval: 50
schedule:
  every_k_epochs: 2
";
        let config = InferenceRunnerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.input_names, Some(vec!["image".to_string(), "label".to_string()]));
        assert_eq!(config.progress.log_interval, 50);
        assert_eq!(config.progress.bar_width, 30);
        assert_eq!(config.schedule.every_k_epochs, 2);
    }

    #[test]
    fn test_empty_input_names_rejected() {
        let err = InferenceRunnerConfig::from_yaml_str("input_names: []").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_zero_log_interval_rejected() {
        let err = InferenceRunnerConfig::from_yaml_str("progress: {log_interval: 0}").unwrap_err();
        assert!(err.to_string().contains("log_interval"));
    }

    #[test]
    fn test_feedfree_config_from_yaml() {
        let config = FeedfreeRunnerConfig::from_yaml_str("prefix: val").unwrap();
        assert_eq!(config.prefix, "val");
        assert!(config.input_names.is_none());
    }

    #[test]
    fn test_feedfree_prefix_with_slash_rejected() {
        assert!(FeedfreeRunnerConfig::from_yaml_str("prefix: a/b").is_err());
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = FeedfreeRunnerConfig::from_yaml_str("prefix: [unclosed").unwrap_err();
        assert_eq!(err.code(), "E007");
    }
}
