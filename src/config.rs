//! Run configuration
//!
//! One explicit struct carries every run parameter. Values come from, in
//! increasing precedence: built-in defaults, a TOML file, command line flags.
//!
//! ## File format
//!
//! ```toml
//! batch_size = 25          # calls per flush
//! arg_count = 5            # argument slots per call
//! call_count = 350000      # logical calls per strategy
//! flush_mode = "threshold" # or "modulo"
//! boundary = "thread"      # or "native"
//! ```
//!
//! Every key is optional. A configuration is validated before any batching
//! begins; an invalid one never reaches the encoder.

use std::num::{NonZeroU64, NonZeroUsize};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::batch::FlushMode;
use crate::boundary::BoundaryKind;

/// Default number of calls per batch
pub const DEFAULT_BATCH_SIZE: usize = 25;
/// Default number of argument slots per call
pub const DEFAULT_ARG_COUNT: usize = 5;
/// Default number of logical calls per strategy
pub const DEFAULT_CALL_COUNT: u64 = 350_000;

/// Errors raised while loading or validating a run configuration
#[derive(Debug)]
pub enum ConfigError {
    /// `batch_size` must be at least 1
    InvalidBatchSize(usize),
    /// `call_count` must be at least 1
    InvalidCallCount(u64),
    /// `arg_count` must fit an entry header
    ArgCountTooLarge(usize),
    /// The configuration file could not be read
    Io { path: PathBuf, source: std::io::Error },
    /// The configuration file is not valid TOML for this schema
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBatchSize(n) => write!(f, "batch_size must be positive, got {}", n),
            Self::InvalidCallCount(n) => write!(f, "call_count must be positive, got {}", n),
            Self::ArgCountTooLarge(n) => {
                write!(f, "arg_count {} exceeds the header limit of {}", n, u32::MAX)
            }
            Self::Io { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            Self::Parse(e) => write!(f, "Invalid config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// Parameters of one benchmark run, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Calls per flush
    pub batch_size: usize,
    /// Argument slots per call, used uniformly for every call
    pub arg_count: usize,
    /// Logical calls performed by each strategy
    pub call_count: u64,
    /// When pending batches are flushed
    pub flush_mode: FlushMode,
    /// Which boundary the calls cross
    pub boundary: BoundaryKind,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            arg_count: DEFAULT_ARG_COUNT,
            call_count: DEFAULT_CALL_COUNT,
            flush_mode: FlushMode::default(),
            boundary: BoundaryKind::default(),
        }
    }
}

impl RunConfig {
    /// Parse a configuration from TOML content
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Check every parameter and produce settings the core can use directly
    pub fn validate(&self) -> Result<RunSettings, ConfigError> {
        let batch_size =
            NonZeroUsize::new(self.batch_size).ok_or(ConfigError::InvalidBatchSize(self.batch_size))?;
        let call_count =
            NonZeroU64::new(self.call_count).ok_or(ConfigError::InvalidCallCount(self.call_count))?;
        if u32::try_from(self.arg_count).is_err() {
            return Err(ConfigError::ArgCountTooLarge(self.arg_count));
        }

        Ok(RunSettings {
            batch_size,
            arg_count: self.arg_count,
            call_count,
            flush_mode: self.flush_mode,
            boundary: self.boundary,
        })
    }
}

/// A validated [`RunConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub batch_size: NonZeroUsize,
    pub arg_count: usize,
    pub call_count: NonZeroU64,
    pub flush_mode: FlushMode,
    pub boundary: BoundaryKind,
}
