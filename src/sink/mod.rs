//! Reporting sinks: where test outcomes go.
//!
//! The runner talks to a sink through two calls only:
//!
//! - [`ReportSink::register_placeholder`] at registration time, which returns
//!   the [`OutcomeReporter`] for that test. The runner calls it at most once,
//!   when the test finishes; skipped tests never call it.
//! - [`ReportSink::report_summary`] exactly once, when the run finishes.
//!
//! Outcomes arrive in registration order, origin by origin, group by group.

mod console;
mod json;
mod memory;

pub use console::ConsoleSink;
pub use json::JsonSink;
pub use memory::{MemorySink, Record};

use crate::errors::TestError;
use crate::runner::{Origin, RunSummary};
use crate::value::Value;

/// Called once with the outcome of the test it was issued for.
pub type OutcomeReporter = Box<dyn FnOnce(Outcome)>;

/// The result of one executed test.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub passed: bool,
    pub message: String,
    /// The raised failure or fault; `None` when the test passed.
    pub error: Option<TestError>,
}

impl Outcome {
    pub fn passed() -> Self {
        Self {
            passed: true,
            message: String::new(),
            error: None,
        }
    }

    pub fn failed(error: TestError) -> Self {
        Self {
            passed: false,
            message: error.to_string(),
            error: Some(error),
        }
    }

    /// Expected value of a failed assertion. Unstructured faults have none.
    pub fn expected(&self) -> Option<&Value> {
        self.error
            .as_ref()
            .and_then(TestError::as_failure)
            .and_then(|f| f.expected.as_ref())
    }

    /// Found value of a failed assertion. Unstructured faults have none.
    pub fn found(&self) -> Option<&Value> {
        self.error
            .as_ref()
            .and_then(TestError::as_failure)
            .and_then(|f| f.found.as_ref())
    }
}

/// Receives outcomes from a run.
pub trait ReportSink {
    /// Announces a registered test and returns the callback for its outcome.
    fn register_placeholder(&mut self, origin: &Origin, group: Option<&str>, name: &str) -> OutcomeReporter;

    /// Called once after every eligible test has run.
    fn report_summary(&mut self, summary: &RunSummary);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn register_placeholder(&mut self, _origin: &Origin, _group: Option<&str>, _name: &str) -> OutcomeReporter {
        Box::new(|_| {})
    }

    fn report_summary(&mut self, _summary: &RunSummary) {}
}
