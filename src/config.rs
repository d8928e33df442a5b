//! Layered configuration
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `sampling-lab.toml` in the working directory (optional)
//! 3. `OPENAI_API_KEY` (mapped to `api_key`)
//! 4. `SAMPLING_LAB_*` environment variables (`SAMPLING_LAB_MODEL`, ...)

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE: &str = "sampling-lab.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "SAMPLING_LAB_";

/// Runtime configuration for experiments and the HTTP generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Model identifier sent with every generation request
    pub model: String,
    /// Minimum prompt length in characters
    pub min_prompt_chars: usize,
    /// Completion length cap passed to the provider
    pub max_tokens: u32,
    /// Overall time budget of one experiment, in milliseconds
    pub deadline_ms: Option<u64>,
    /// Provider base URL
    pub base_url: String,
    /// Provider API key
    pub api_key: Option<String>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            min_prompt_chars: 10,
            max_tokens: 1000,
            deadline_ms: Some(300_000),
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
        }
    }
}

impl LabConfig {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a source cannot be parsed or the result
    /// fails [`validate`](Self::validate).
    pub fn load() -> Result<Self> {
        Self::load_from(Self::figment())
    }

    /// Extract and validate configuration from a custom figment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on extraction or validation failure.
    pub fn load_from(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Provider chain using the default config file.
    #[must_use]
    pub fn figment() -> Figment {
        Self::figment_with_file(CONFIG_FILE)
    }

    /// Provider chain reading the given TOML file (skipped when absent).
    #[must_use]
    pub fn figment_with_file(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "api_key".into()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Reject configurations that cannot drive an experiment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty model, a zero `max_tokens`, or a
    /// placeholder API key.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Config("model must not be empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be positive".to_string()));
        }
        if let Some(key) = &self.api_key {
            if key.contains("your_openai") || key.contains("placeholder") {
                return Err(Error::Config(
                    "api_key appears to be a placeholder. Please set your actual API key."
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Experiment time budget, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Set the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the minimum prompt length.
    #[must_use]
    pub const fn with_min_prompt_chars(mut self, min: usize) -> Self {
        self.min_prompt_chars = min;
        self
    }

    /// Set the completion length cap.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set (or clear) the experiment time budget.
    ///
    /// Kept at millisecond precision, rounded up so a non-zero budget never
    /// becomes zero.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline_ms = deadline.map(|d| {
            let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
            if Duration::from_millis(ms) < d {
                ms.saturating_add(1)
            } else {
                ms
            }
        });
        self
    }

    /// Set the provider base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the provider API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = LabConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.min_prompt_chars, 10);
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.deadline(), Some(Duration::from_secs(300)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_placeholder_key() {
        let config = LabConfig::default().with_api_key("your_openai_key_here");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_model_and_zero_tokens() {
        assert!(LabConfig::default().with_model(" ").validate().is_err());
        assert!(LabConfig::default().with_max_tokens(0).validate().is_err());
    }

    #[test]
    fn test_load_layers_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                model = "from-file"
                max_tokens = 256
                "#,
            )?;
            jail.set_env("OPENAI_API_KEY", "sk-openai");
            jail.set_env("SAMPLING_LAB_MODEL", "from-env");
            jail.set_env("SAMPLING_LAB_DEADLINE_MS", "45000");

            let config = LabConfig::load().expect("config should load");
            assert_eq!(config.model, "from-env");
            assert_eq!(config.max_tokens, 256);
            assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
            assert_eq!(config.deadline(), Some(Duration::from_secs(45)));
            Ok(())
        });
    }

    #[test]
    fn test_sub_second_deadline_keeps_precision() {
        let config = LabConfig::default().with_deadline(Some(Duration::from_millis(300)));
        assert_eq!(config.deadline_ms, Some(300));
        assert_eq!(config.deadline(), Some(Duration::from_millis(300)));

        let config = LabConfig::default().with_deadline(Some(Duration::from_millis(1900)));
        assert_eq!(config.deadline(), Some(Duration::from_millis(1900)));

        let config = LabConfig::default().with_deadline(Some(Duration::from_micros(1)));
        assert_eq!(config.deadline(), Some(Duration::from_millis(1)));

        assert_eq!(LabConfig::default().with_deadline(None).deadline(), None);
    }

    #[test]
    fn test_deadline_from_toml_in_millis() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "deadline_ms = 750")?;
            let config = LabConfig::load().expect("config should load");
            assert_eq!(config.deadline(), Some(Duration::from_millis(750)));
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_api_key_wins() {
        Jail::expect_with(|jail| {
            jail.set_env("OPENAI_API_KEY", "sk-openai");
            jail.set_env("SAMPLING_LAB_API_KEY", "sk-lab");
            let config = LabConfig::load().expect("config should load");
            assert_eq!(config.api_key.as_deref(), Some("sk-lab"));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "max_tokens = 0")?;
            assert!(matches!(LabConfig::load(), Err(Error::Config(_))));
            Ok(())
        });
    }
}
