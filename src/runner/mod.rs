//! Test registration and orchestration.
//!
//! A [`Registry`] collects tests per [`Origin`] (the source file that
//! registered them), optionally inside named groups opened with
//! [`Registry::describe`]. [`Registry::run`] then executes every eligible test
//! strictly one after another, in registration order, and reports each outcome
//! through the registry's [`ReportSink`].
//!
//! ```rust
//! use brotest::runner::Registry;
//! use brotest::sink::MemorySink;
//!
//! let sink = MemorySink::new();
//! let mut registry = Registry::new(sink.clone());
//! registry.describe("math", |block| {
//!     block.test("adds", |t| t.expect(1 + 1).to_be(2));
//! });
//! let summary = registry.run_blocking();
//! assert!(summary.success);
//! assert_eq!(sink.records().len(), 1);
//! ```

mod model;
mod summary;

pub use model::{Origin, TestContext, TestId};
pub use summary::RunSummary;

use crate::compare::Comparator;
use crate::config::RunnerConfig;
use crate::errors::{Fault, TestError, TestResult};
use crate::expect::DEFAULT_TOLERANCE;
use crate::sink::{Outcome, ReportSink};
use futures::FutureExt;
use model::{Body, Entry, OriginBucket, TestCase};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, info};

/// Why a registered test did not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Another test was selected with `only`.
    NotSelected,
    /// The name does not contain the configured filter.
    Filtered(String),
}

/// Owns every registered test, the only-selector, and the reporting sink.
pub struct Registry {
    buckets: Vec<OriginBucket>,
    sink: Box<dyn ReportSink>,
    only: Option<TestId>,
    next_id: usize,
    comparator: Comparator,
    default_tolerance: f64,
    filter: Option<String>,
}

impl Registry {
    pub fn new(sink: impl ReportSink + 'static) -> Self {
        Self {
            buckets: Vec::new(),
            sink: Box::new(sink),
            only: None,
            next_id: 0,
            comparator: Comparator::default(),
            default_tolerance: DEFAULT_TOLERANCE,
            filter: None,
        }
    }

    /// A registry that compares and filters according to `config`.
    pub fn with_config(sink: impl ReportSink + 'static, config: &RunnerConfig) -> Self {
        let mut registry = Self::new(sink);
        registry.comparator = Comparator::default().with_dates(config.date_equality);
        registry.default_tolerance = config.default_tolerance;
        registry.filter = config.filter.clone();
        registry
    }

    /// Number of registered tests.
    pub fn total(&self) -> usize {
        self.next_id
    }

    /// The test selected by the most recent `only`, if any.
    pub fn selected(&self) -> Option<TestId> {
        self.only
    }

    /// Number of groups registered from `origin`.
    pub fn group_count(&self, origin: &Origin) -> usize {
        self.buckets
            .iter()
            .find(|b| &b.origin == origin)
            .map_or(0, OriginBucket::group_count)
    }

    // ========================================================================
    // REGISTRATION
    // ========================================================================

    /// Registers an ungrouped test from the caller's source file.
    #[track_caller]
    pub fn test<F>(&mut self, name: impl Into<String>, body: F) -> TestId
    where
        F: FnOnce(TestContext) -> TestResult + 'static,
    {
        self.register(Origin::caller(), None, name.into(), sync_body(body), false, None)
    }

    /// Registers an ungrouped test whose body may suspend.
    #[track_caller]
    pub fn test_async<F, Fut>(&mut self, name: impl Into<String>, body: F) -> TestId
    where
        F: FnOnce(TestContext) -> Fut + 'static,
        Fut: Future<Output = TestResult> + 'static,
    {
        self.register(Origin::caller(), None, name.into(), async_body(body), false, None)
    }

    /// Registers a test with a timeout. The timeout is recorded but not
    /// enforced.
    #[track_caller]
    pub fn test_with_timeout<F>(&mut self, name: impl Into<String>, timeout: Duration, body: F) -> TestId
    where
        F: FnOnce(TestContext) -> TestResult + 'static,
    {
        self.register(
            Origin::caller(),
            None,
            name.into(),
            sync_body(body),
            false,
            Some(timeout),
        )
    }

    /// Registers a test and makes it the only one that runs. A later `only`
    /// replaces this selection.
    #[track_caller]
    pub fn only<F>(&mut self, name: impl Into<String>, body: F) -> TestId
    where
        F: FnOnce(TestContext) -> TestResult + 'static,
    {
        self.register(Origin::caller(), None, name.into(), sync_body(body), true, None)
    }

    #[track_caller]
    pub fn only_async<F, Fut>(&mut self, name: impl Into<String>, body: F) -> TestId
    where
        F: FnOnce(TestContext) -> Fut + 'static,
        Fut: Future<Output = TestResult> + 'static,
    {
        self.register(Origin::caller(), None, name.into(), async_body(body), true, None)
    }

    /// Registers an ungrouped test under an explicit origin.
    pub fn test_at<F>(&mut self, origin: Origin, name: impl Into<String>, body: F) -> TestId
    where
        F: FnOnce(TestContext) -> TestResult + 'static,
    {
        self.register(origin, None, name.into(), sync_body(body), false, None)
    }

    /// Opens the group `name` for the caller's source file and hands `f` a
    /// [`Block`] to register into. Blocks cannot be nested.
    #[track_caller]
    pub fn describe<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: FnOnce(&mut Block<'_>),
    {
        self.describe_at(Origin::caller(), name, f)
    }

    /// [`describe`](Self::describe) under an explicit origin.
    pub fn describe_at<F>(&mut self, origin: Origin, name: impl Into<String>, f: F)
    where
        F: FnOnce(&mut Block<'_>),
    {
        let mut block = Block {
            registry: self,
            origin,
            name: name.into(),
        };
        f(&mut block);
    }

    fn register(
        &mut self,
        origin: Origin,
        group: Option<&str>,
        name: String,
        body: Body,
        only: bool,
        timeout: Option<Duration>,
    ) -> TestId {
        let id = TestId(self.next_id);
        self.next_id += 1;
        if only {
            if let Some(previous) = self.only.replace(id) {
                debug!(target: "brotest", %previous, selected = %id, "only selector replaced");
            }
        }
        if let Some(timeout) = timeout {
            debug!(target: "brotest", test = %name, ?timeout, "timeout recorded, not enforced");
        }
        let reporter = self.sink.register_placeholder(&origin, group, &name);
        debug!(target: "brotest", %origin, group = group.unwrap_or("-"), test = %name, %id, "registered");

        let test = TestCase {
            id,
            name,
            body,
            only,
            timeout,
            reporter,
        };
        let bucket = self.bucket_mut(origin);
        match group {
            Some(group) => bucket.push_grouped(group, test),
            None => bucket.entries.push(Entry::Test(test)),
        }
        id
    }

    fn bucket_mut(&mut self, origin: Origin) -> &mut OriginBucket {
        let index = match self.buckets.iter().position(|b| b.origin == origin) {
            Some(index) => index,
            None => {
                self.buckets.push(OriginBucket::new(origin));
                self.buckets.len() - 1
            }
        };
        &mut self.buckets[index]
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    /// Runs every eligible test in registration order, one at a time, and
    /// reports the summary once at the end.
    pub async fn run(self) -> RunSummary {
        let Registry {
            buckets,
            mut sink,
            only,
            next_id,
            comparator,
            default_tolerance,
            filter,
        } = self;
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        info!(target: "brotest", total = next_id, origins = buckets.len(), "run started");
        for bucket in buckets {
            for entry in bucket.entries {
                let tests = match entry {
                    Entry::Group(group) => group.tests,
                    Entry::Test(test) => vec![test],
                };
                for test in tests {
                    if let Some(reason) = skip_reason(&test, only, filter.as_deref()) {
                        debug!(target: "brotest", test = %test.name, ?reason, "skipped");
                        skipped += 1;
                        continue;
                    }
                    debug!(
                        target: "brotest",
                        test = %test.name,
                        declared_only = test.only,
                        timeout = ?test.timeout,
                        "running"
                    );
                    let ctx = TestContext::new(test.name.clone(), comparator, default_tolerance);
                    let outcome = execute(test.name.as_str(), test.body, ctx).await;
                    if outcome.passed {
                        passed += 1;
                    } else {
                        failed += 1;
                    }
                    (test.reporter)(outcome);
                }
            }
        }

        let summary = RunSummary::new(next_id, passed, failed, skipped);
        info!(target: "brotest", %summary, "run finished");
        sink.report_summary(&summary);
        summary
    }

    /// Drives [`run`](Self::run) to completion on the current thread.
    pub fn run_blocking(self) -> RunSummary {
        futures::executor::block_on(self.run())
    }
}

/// Registration context for one open group.
///
/// It has no `describe`: a group cannot be opened inside another one.
pub struct Block<'r> {
    registry: &'r mut Registry,
    origin: Origin,
    name: String,
}

impl Block<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn test<F>(&mut self, name: impl Into<String>, body: F) -> TestId
    where
        F: FnOnce(TestContext) -> TestResult + 'static,
    {
        self.add(name.into(), sync_body(body), false)
    }

    pub fn test_async<F, Fut>(&mut self, name: impl Into<String>, body: F) -> TestId
    where
        F: FnOnce(TestContext) -> Fut + 'static,
        Fut: Future<Output = TestResult> + 'static,
    {
        self.add(name.into(), async_body(body), false)
    }

    pub fn only<F>(&mut self, name: impl Into<String>, body: F) -> TestId
    where
        F: FnOnce(TestContext) -> TestResult + 'static,
    {
        self.add(name.into(), sync_body(body), true)
    }

    pub fn only_async<F, Fut>(&mut self, name: impl Into<String>, body: F) -> TestId
    where
        F: FnOnce(TestContext) -> Fut + 'static,
        Fut: Future<Output = TestResult> + 'static,
    {
        self.add(name.into(), async_body(body), true)
    }

    fn add(&mut self, name: String, body: Body, only: bool) -> TestId {
        let origin = self.origin.clone();
        self.registry
            .register(origin, Some(self.name.as_str()), name, body, only, None)
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn sync_body<F>(body: F) -> Body
where
    F: FnOnce(TestContext) -> TestResult + 'static,
{
    Box::new(move |ctx| async move { body(ctx) }.boxed_local())
}

fn async_body<F, Fut>(body: F) -> Body
where
    F: FnOnce(TestContext) -> Fut + 'static,
    Fut: Future<Output = TestResult> + 'static,
{
    Box::new(move |ctx| async move { body(ctx).await }.boxed_local())
}

fn skip_reason(test: &TestCase, only: Option<TestId>, filter: Option<&str>) -> Option<SkipReason> {
    if let Some(selected) = only {
        if selected != test.id {
            return Some(SkipReason::NotSelected);
        }
        return None;
    }
    match filter {
        Some(f) if !test.name.contains(f) => Some(SkipReason::Filtered(f.to_string())),
        _ => None,
    }
}

/// Runs one body, catching failures, faults, and panics alike.
async fn execute(name: &str, body: Body, ctx: TestContext) -> Outcome {
    let result = match AssertUnwindSafe(body(ctx)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(TestError::Fault(Fault::from_panic(payload))),
    };
    match result {
        Ok(()) => {
            debug!(target: "brotest", test = name, "passed");
            Outcome::passed()
        }
        Err(error) => {
            debug!(target: "brotest", test = name, structured = error.is_failure(), %error, "failed");
            Outcome::failed(error)
        }
    }
}
