//! Registry configuration

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process-wide knobs consulted by the registry, the builder and the sanitizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tags kept when `clean` strips markup, written as `"<a><b>"`
    #[serde(default)]
    pub allowed_tags: String,

    /// LIMIT used when a SELECT does not specify one
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Field list used when neither the options nor the connection provide one
    #[serde(default = "default_fields")]
    pub default_fields: Vec<String>,

    /// Undo legacy automatic backslash escaping of input before SQL escaping
    #[serde(default)]
    pub magic_quotes: bool,

    /// Let the empty string pass the blank check, as older releases did
    #[serde(default)]
    pub legacy_blank_check: bool,

    /// Emit INSERT values without escaping, as older releases did
    #[serde(default)]
    pub legacy_insert_values: bool,
}

fn default_limit() -> u64 {
    1
}

fn default_fields() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allowed_tags: String::new(),
            default_limit: default_limit(),
            default_fields: default_fields(),
            magic_quotes: false,
            legacy_blank_check: false,
            legacy_insert_values: false,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn with_allowed_tags(mut self, tags: impl Into<String>) -> Self {
        self.allowed_tags = tags.into();
        self
    }

    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_default_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_magic_quotes(mut self, enabled: bool) -> Self {
        self.magic_quotes = enabled;
        self
    }

    pub fn with_legacy_blank_check(mut self, enabled: bool) -> Self {
        self.legacy_blank_check = enabled;
        self
    }

    pub fn with_legacy_insert_values(mut self, enabled: bool) -> Self {
        self.legacy_insert_values = enabled;
        self
    }
}
