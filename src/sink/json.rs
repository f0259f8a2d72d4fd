//! Machine-readable reporting: one JSON document written when the run ends.

use super::{Outcome, OutcomeReporter, ReportSink};
use crate::errors::TestError;
use crate::runner::{Origin, RunSummary};
use crate::value::Value;
use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

#[derive(Debug, Clone, Serialize)]
struct TestEntry {
    origin: Origin,
    group: Option<String>,
    name: String,
    /// `passed`, `failed`, or `skipped`.
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    /// `failure` for assertion failures, `fault` for anything else raised.
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    found: Option<Value>,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a RunSummary,
    tests: &'a [TestEntry],
}

struct JsonState<W> {
    out: W,
    tests: Vec<TestEntry>,
}

/// Collects every outcome and writes a single JSON report on summary.
pub struct JsonSink<W: Write> {
    state: Rc<RefCell<JsonState<W>>>,
}

impl JsonSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + 'static> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Rc::new(RefCell::new(JsonState {
                out,
                tests: Vec::new(),
            })),
        }
    }

    pub fn with_writer<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        f(&self.state.borrow().out)
    }
}

impl<W: Write> Clone for JsonSink<W> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<W: Write + 'static> ReportSink for JsonSink<W> {
    fn register_placeholder(&mut self, origin: &Origin, group: Option<&str>, name: &str) -> OutcomeReporter {
        let index = {
            let mut state = self.state.borrow_mut();
            state.tests.push(TestEntry {
                origin: origin.clone(),
                group: group.map(str::to_string),
                name: name.to_string(),
                status: "skipped",
                message: None,
                kind: None,
                expected: None,
                found: None,
            });
            state.tests.len() - 1
        };
        let state = Rc::clone(&self.state);
        Box::new(move |outcome: Outcome| {
            if let Some(entry) = state.borrow_mut().tests.get_mut(index) {
                entry.status = if outcome.passed { "passed" } else { "failed" };
                entry.expected = outcome.expected().cloned();
                entry.found = outcome.found().cloned();
                entry.kind = outcome.error.as_ref().map(|e| match e {
                    TestError::Failure(_) => "failure",
                    TestError::Fault(_) => "fault",
                });
                if !outcome.passed {
                    entry.message = Some(outcome.message);
                }
            }
        })
    }

    fn report_summary(&mut self, summary: &RunSummary) {
        let mut state = self.state.borrow_mut();
        let JsonState { out, tests } = &mut *state;
        let report = Report { summary, tests };
        match serde_json::to_writer_pretty(&mut *out, &report) {
            Ok(()) => {
                let _ = writeln!(out);
            }
            Err(e) => tracing::warn!(target: "brotest", error = %e, "failed to write JSON report"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Failure, Fault};

    #[test]
    fn report_keeps_structure_for_failures_only() {
        let mut sink = JsonSink::new(Vec::<u8>::new());
        let origin = Origin::new("suite.rs");
        let ok = sink.register_placeholder(&origin, Some("g"), "ok");
        let failed = sink.register_placeholder(&origin, Some("g"), "failed");
        let faulted = sink.register_placeholder(&origin, None, "faulted");
        let _skipped = sink.register_placeholder(&origin, None, "skipped");
        ok(Outcome::passed());
        failed(Outcome::failed(
            Failure::new("to_be", "because 1 is not 2")
                .with_values(Value::from(2), Value::from(1))
                .into(),
        ));
        faulted(Outcome::failed(Fault::new("TypeError", "bad").into()));
        sink.report_summary(&RunSummary {
            total: 4,
            passed: 1,
            failed: 2,
            skipped: 1,
            success: false,
        });

        let doc: serde_json::Value = sink
            .with_writer(|buf| serde_json::from_slice::<serde_json::Value>(buf))
            .unwrap_or_default();
        assert_eq!(doc["summary"]["failed"], 2);
        let tests = &doc["tests"];
        assert_eq!(tests[0]["status"], "passed");
        assert_eq!(tests[1]["kind"], "failure");
        assert_eq!(tests[1]["expected"], 2.0);
        assert_eq!(tests[2]["kind"], "fault");
        assert!(tests[2].get("expected").is_none());
        assert_eq!(tests[3]["status"], "skipped");
    }
}
