//! What the registry stores: origins, groups, and test cases.

use crate::compare::Comparator;
use crate::errors::TestResult;
use crate::expect::{Expectation, DEFAULT_TOLERANCE};
use crate::sink::OutcomeReporter;
use crate::value::Value;
use futures::future::LocalBoxFuture;
use serde::Serialize;
use std::fmt;
use std::panic::Location;
use std::time::Duration;

/// Where a registration call came from. Only used as a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The source file of the caller.
    #[track_caller]
    pub fn caller() -> Self {
        Self(Location::caller().file().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one registered test within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestId(pub(crate) usize);

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handed to every test body.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub name: String,
    pub(crate) comparator: Comparator,
    pub(crate) default_tolerance: f64,
}

impl TestContext {
    pub(crate) fn new(name: String, comparator: Comparator, default_tolerance: f64) -> Self {
        Self {
            name,
            comparator,
            default_tolerance,
        }
    }

    /// An expectation that compares with this run's settings.
    pub fn expect(&self, value: impl Into<Value>) -> Expectation {
        Expectation::new(value.into())
            .with_comparator(self.comparator)
            .with_default_tolerance(self.default_tolerance)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new(String::new(), Comparator::default(), DEFAULT_TOLERANCE)
    }
}

pub(crate) type Body = Box<dyn FnOnce(TestContext) -> LocalBoxFuture<'static, TestResult>>;

pub(crate) struct TestCase {
    pub id: TestId,
    pub name: String,
    pub body: Body,
    pub only: bool,
    /// Stored for reporting; not enforced.
    pub timeout: Option<Duration>,
    pub reporter: OutcomeReporter,
}

pub(crate) struct Group {
    pub name: String,
    pub tests: Vec<TestCase>,
}

pub(crate) enum Entry {
    Group(Group),
    Test(TestCase),
}

/// All entries registered from one origin, in registration order.
pub(crate) struct OriginBucket {
    pub origin: Origin,
    pub entries: Vec<Entry>,
}

impl OriginBucket {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            entries: Vec::new(),
        }
    }

    /// Appends to the last entry when it is a group named `name`, otherwise
    /// opens a new group.
    pub fn push_grouped(&mut self, name: &str, test: TestCase) {
        if let Some(Entry::Group(group)) = self.entries.last_mut() {
            if group.name == name {
                group.tests.push(test);
                return;
            }
        }
        self.entries.push(Entry::Group(Group {
            name: name.to_string(),
            tests: vec![test],
        }));
    }

    pub fn group_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::Group(_)))
            .count()
    }
}
