//! Run configuration.
//!
//! Settings come from defaults, then an optional YAML file, then CLI flags:
//!
//! ```yaml
//! filter: equality
//! use_colors: false
//! default_tolerance: 0.0001
//! date_equality: by-instant
//! format: json
//! ```

use crate::compare::DateEquality;
use crate::errors::ConfigError;
use crate::expect::DEFAULT_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How a run is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// Configuration for test execution and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Only tests whose name contains this substring run.
    pub filter: Option<String>,
    pub use_colors: bool,
    /// Tolerance of the `roughly` assertions.
    pub default_tolerance: f64,
    pub date_equality: DateEquality,
    pub format: OutputFormat,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            filter: None,
            use_colors: atty::is(atty::Stream::Stdout),
            default_tolerance: DEFAULT_TOLERANCE,
            date_equality: DateEquality::default(),
            format: OutputFormat::default(),
        }
    }
}

impl RunnerConfig {
    /// Loads a YAML config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: display,
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunnerConfig = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_tolerance.is_finite() || self.default_tolerance < 0.0 {
            return Err(ConfigError::Invalid {
                field: "default_tolerance",
                reason: format!("must be a finite, non-negative number, got {}", self.default_tolerance),
            });
        }
        if matches!(self.filter.as_deref(), Some("")) {
            return Err(ConfigError::Invalid {
                field: "filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
