//! Endpoint credentials and session limits
//!
//! Settings are assembled from layers: a TOML file, the environment and
//! command-line overrides, each later layer replacing fields of the earlier
//! ones. The resolved [`Settings`] value is passed explicitly to the
//! components that need it.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file read when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

/// Endpoint used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Hard cap on intermediate reasoning steps per session
pub const DEFAULT_MAX_STEPS: u32 = 15;

/// Output budget for each intermediate step call
pub const DEFAULT_STEP_MAX_TOKENS: u32 = 800;

/// Output budget for the final answer call
pub const DEFAULT_FINAL_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("missing required setting `{0}` (set it in the config file, environment or command line)")]
    Missing(&'static str),
    #[error("invalid setting `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Connection settings for the chat completion endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
}

/// Policy constants of a reasoning session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Maximum number of intermediate steps before finalizing
    pub max_steps: u32,
    /// `max_tokens` for each intermediate step
    pub step_max_tokens: u32,
    /// `max_tokens` for the final answer
    pub final_max_tokens: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            step_max_tokens: DEFAULT_STEP_MAX_TOKENS,
            final_max_tokens: DEFAULT_FINAL_MAX_TOKENS,
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub llm: LlmConfig,
    pub limits: SessionLimits,
}

/// One source of settings; unset fields defer to lower layers
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub openai: EndpointLayer,
    #[serde(default)]
    pub limits: LimitsLayer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointLayer {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsLayer {
    pub max_steps: Option<u32>,
    pub step_max_tokens: Option<u32>,
    pub final_max_tokens: Option<u32>,
}

impl ConfigLayer {
    /// Parse a TOML config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid settings table.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse the config file if it exists; a missing file is an empty layer.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLayer::from_file`] for a file that exists.
    pub fn from_optional_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, skipping");
            Ok(Self::default())
        }
    }

    /// # Errors
    ///
    /// Fails on invalid TOML, unknown keys or mistyped values.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a layer from environment-style lookups.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            openai: EndpointLayer {
                api_key: non_empty("OPENAI_API_KEY"),
                base_url: non_empty("OPENAI_BASE_URL"),
                model_name: non_empty("STEPWISE_MODEL"),
            },
            limits: LimitsLayer::default(),
        }
    }

    /// Overlay `higher` on top of `self`.
    #[must_use]
    pub fn merge(self, higher: ConfigLayer) -> Self {
        Self {
            openai: EndpointLayer {
                api_key: higher.openai.api_key.or(self.openai.api_key),
                base_url: higher.openai.base_url.or(self.openai.base_url),
                model_name: higher.openai.model_name.or(self.openai.model_name),
            },
            limits: LimitsLayer {
                max_steps: higher.limits.max_steps.or(self.limits.max_steps),
                step_max_tokens: higher.limits.step_max_tokens.or(self.limits.step_max_tokens),
                final_max_tokens: higher
                    .limits
                    .final_max_tokens
                    .or(self.limits.final_max_tokens),
            },
        }
    }

    /// Apply defaults and validate.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] without an API key or model name,
    /// [`ConfigError::Invalid`] for a non-HTTP base URL or a zero limit.
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        let api_key = self.openai.api_key.ok_or(ConfigError::Missing("api_key"))?;
        let model_name = self
            .openai
            .model_name
            .ok_or(ConfigError::Missing("model_name"))?;
        let base_url = self
            .openai
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "base_url",
                reason: format!("expected an http(s) URL, got {base_url:?}"),
            });
        }

        let defaults = SessionLimits::default();
        let limits = SessionLimits {
            max_steps: positive("max_steps", self.limits.max_steps, defaults.max_steps)?,
            step_max_tokens: positive(
                "step_max_tokens",
                self.limits.step_max_tokens,
                defaults.step_max_tokens,
            )?,
            final_max_tokens: positive(
                "final_max_tokens",
                self.limits.final_max_tokens,
                defaults.final_max_tokens,
            )?,
        };

        Ok(Settings {
            llm: LlmConfig {
                api_key,
                base_url,
                model_name,
            },
            limits,
        })
    }
}

fn positive(name: &'static str, value: Option<u32>, default: u32) -> Result<u32, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        }),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}
