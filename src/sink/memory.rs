use super::{Outcome, OutcomeReporter, ReportSink};
use crate::runner::{Origin, RunSummary};
use std::cell::RefCell;
use std::rc::Rc;

/// One registered test as seen by a [`MemorySink`].
#[derive(Debug, Clone)]
pub struct Record {
    pub origin: Origin,
    pub group: Option<String>,
    pub name: String,
    /// `None` until the test finishes; stays `None` for skipped tests.
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Default)]
struct State {
    records: Vec<Record>,
    summaries: Vec<RunSummary>,
}

/// Keeps every placeholder, outcome, and summary in memory.
///
/// Clones share the same storage, so keep one clone to inspect after handing
/// the other to a registry.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Rc<RefCell<State>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.state.borrow().records.clone()
    }

    /// Every summary reported so far; a finished run reports exactly one.
    pub fn summaries(&self) -> Vec<RunSummary> {
        self.state.borrow().summaries.clone()
    }

    /// Outcomes in the order they were reported, with the test name.
    pub fn outcomes(&self) -> Vec<(String, Outcome)> {
        self.state
            .borrow()
            .records
            .iter()
            .filter_map(|r| r.outcome.clone().map(|o| (r.name.clone(), o)))
            .collect()
    }
}

impl ReportSink for MemorySink {
    fn register_placeholder(&mut self, origin: &Origin, group: Option<&str>, name: &str) -> OutcomeReporter {
        let index = {
            let mut state = self.state.borrow_mut();
            state.records.push(Record {
                origin: origin.clone(),
                group: group.map(str::to_string),
                name: name.to_string(),
                outcome: None,
            });
            state.records.len() - 1
        };
        let state = Rc::clone(&self.state);
        Box::new(move |outcome| {
            if let Some(record) = state.borrow_mut().records.get_mut(index) {
                record.outcome = Some(outcome);
            }
        })
    }

    fn report_summary(&mut self, summary: &RunSummary) {
        self.state.borrow_mut().summaries.push(*summary);
    }
}
