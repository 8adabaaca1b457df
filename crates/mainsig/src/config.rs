//! Dispatch configuration.
//!
//! Everything that shapes a run is an explicit field of [`DispatchConfig`]:
//! the [`ParsePolicy`] handed to the capture builder and the
//! [`UsageFormat`] handed to the usage synthesizer. The record is fixed
//! before the runner starts and is passed to hooks by reference, never
//! read from global state.
//!
//! Configuration can be built in code or loaded from YAML or JSON. Every
//! field has a default, so a file only lists what it changes:
//!
//! ```
//! use mainsig::{DescriptionLayout, DispatchConfig, DuplicatePolicy};
//!
//! let config = DispatchConfig::from_yaml_str(
//!     "parse:\n  named_anywhere: true\n  duplicates: reject\nusage:\n  descriptions: global\n",
//! )
//! .unwrap();
//!
//! assert!(config.parse.named_anywhere);
//! assert_eq!(config.parse.duplicates, DuplicatePolicy::Reject);
//! assert_eq!(config.parse.help_flag, "help");
//! assert_eq!(config.usage.descriptions, DescriptionLayout::Global);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
}

/// What the capture builder does when a named key repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later occurrence overwrites the earlier one.
    #[default]
    LastWins,
    /// A repeated key is a parse error.
    Reject,
}

/// Rules for turning argv into a [`Capture`](crate::Capture).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsePolicy {
    /// Permit named tokens after the first positional token.
    pub named_anywhere: bool,
    /// Handling of repeated named keys.
    pub duplicates: DuplicatePolicy,
    /// Short alias → long name, consulted before aliases declared on
    /// parameters.
    pub aliases: BTreeMap<String, String>,
    /// Name of the help flag. Always parsed as Boolean; its presence sends
    /// usage text to stdout instead of stderr.
    pub help_flag: String,
}

impl Default for ParsePolicy {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("h".to_string(), "help".to_string());
        Self {
            named_anywhere: false,
            duplicates: DuplicatePolicy::LastWins,
            aliases,
            help_flag: "help".to_string(),
        }
    }
}

impl ParsePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named_anywhere(mut self, enabled: bool) -> Self {
        self.named_anywhere = enabled;
        self
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Maps `-short` to `--long`.
    pub fn alias(mut self, short: impl Into<String>, long: impl Into<String>) -> Self {
        self.aliases.insert(short.into(), long.into());
        self
    }

    pub fn help_flag(mut self, name: impl Into<String>) -> Self {
        self.help_flag = name.into();
        self
    }
}

/// Where parameter descriptions are listed in usage text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionLayout {
    /// Below each usage line, for that signature's parameters.
    #[default]
    PerCandidate,
    /// One `parameters:` block after all usage lines; each name once.
    Global,
}

/// Formatting of synthesized usage text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageFormat {
    /// Word opening every usage line.
    pub prefix: String,
    pub descriptions: DescriptionLayout,
    /// Indentation of description lines.
    pub indent: usize,
    /// A minijinja template replacing the built-in usage layout.
    pub template: Option<String>,
}

impl Default for UsageFormat {
    fn default() -> Self {
        Self {
            prefix: "usage:".to_string(),
            descriptions: DescriptionLayout::PerCandidate,
            indent: 4,
            template: None,
        }
    }
}

/// Complete configuration for one runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub parse: ParsePolicy,
    pub usage: UsageFormat,
}

impl DispatchConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads configuration from a `.yaml`, `.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}
