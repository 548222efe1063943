//! Interpreter configuration

use serde::Deserialize;
use thiserror::Error;

/// Default user-function call depth limit
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Remaining stack below which the evaluator grows the native stack
pub const DEFAULT_STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each native stack extension
pub const DEFAULT_STACK_GROWTH: usize = 4 * 1024 * 1024;

/// Failure to load a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Runtime limits for one run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Maximum nesting of user function calls before `StackOverflow`
    pub max_call_depth: usize,
    /// Bytes of native stack that must remain before growing
    pub stack_red_zone: usize,
    /// Bytes added per native stack extension
    pub stack_growth: usize,
}

impl Config {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            stack_red_zone: DEFAULT_STACK_RED_ZONE,
            stack_growth: DEFAULT_STACK_GROWTH,
        }
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Set the call depth limit
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Set the native stack red zone
    pub fn stack_red_zone(mut self, bytes: usize) -> Self {
        self.stack_red_zone = bytes;
        self
    }

    /// Set the native stack growth step
    pub fn stack_growth(mut self, bytes: usize) -> Self {
        self.stack_growth = bytes;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
