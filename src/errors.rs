//! brotest error handling.
//!
//! Two things can go wrong inside a test body:
//!
//! - a [`Failure`]: an assertion did not hold. It carries the message plus the
//!   expected and found values so a reporter can diff them.
//! - a [`Fault`]: anything else that was raised. Code defects, panics, and
//!   `to_throw` category mismatches all land here, with no expected/found data.
//!
//! Both travel inside [`TestError`], which is what test bodies return. The
//! runner catches both at the per-test boundary and keeps them apart when
//! reporting.

use crate::value::Value;
use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// The result type returned by test bodies and assertions.
pub type TestResult = Result<(), TestError>;

/// A failed assertion.
///
/// Only assertion operations construct this; the runner never wraps an
/// unrelated fault into a `Failure`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Failure {
    /// Name of the assertion that failed, e.g. `to_equal`.
    pub assertion: &'static str,
    pub message: String,
    pub expected: Option<Value>,
    pub found: Option<Value>,
}

impl Failure {
    pub fn new(assertion: &'static str, message: impl Into<String>) -> Self {
        Self {
            assertion,
            message: message.into(),
            expected: None,
            found: None,
        }
    }

    pub fn with_values(mut self, expected: Value, found: Value) -> Self {
        self.expected = Some(expected);
        self.found = Some(found);
        self
    }

    fn help_text(&self) -> String {
        match (&self.expected, &self.found) {
            (Some(expected), Some(found)) => {
                format!("expected: {}\n   found: {}", expected, found)
            }
            _ => format!("raised by {}", self.assertion),
        }
    }
}

impl Diagnostic for Failure {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("brotest::assert::{}", self.assertion)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.help_text()))
    }
}

/// An unstructured fault raised from a test body.
///
/// `category` plays the role of an error class: `to_throw` matches against it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{category}: {message}")]
pub struct Fault {
    pub category: String,
    pub message: String,
}

impl Fault {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }

    /// Wraps any error, using its type name (without module path) as the
    /// category.
    pub fn from_error<E: std::error::Error>(err: E) -> Self {
        let full = std::any::type_name::<E>();
        let category = full.rsplit("::").next().unwrap_or(full);
        Self::new(category, err.to_string())
    }

    /// Converts a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "test body panicked".to_string()
        };
        Self::new("panic", message)
    }
}

/// Everything a test body can raise.
#[derive(Debug, Clone, Error)]
pub enum TestError {
    #[error(transparent)]
    Failure(#[from] Failure),
    #[error(transparent)]
    Fault(#[from] Fault),
}

impl TestError {
    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            TestError::Failure(f) => Some(f),
            TestError::Fault(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.as_failure().is_some()
    }
}

/// Errors raised while loading a run configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    #[diagnostic(code(brotest::config::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}'")]
    #[diagnostic(
        code(brotest::config::parse),
        help("the file must be a YAML mapping of run options")
    )]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for '{field}': {reason}")]
    #[diagnostic(code(brotest::config::invalid))]
    Invalid { field: &'static str, reason: String },
}
