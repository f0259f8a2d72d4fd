// Registration, selection, execution order, and what reaches the sink.

use brotest::errors::{Failure, Fault, TestError};
use brotest::runner::{Origin, Registry, RunSummary, TestContext};
use brotest::sink::{MemorySink, NullSink};
use brotest::{TestResult, Value};
use futures::future::{self, FutureExt};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

fn counted(counter: &Rc<Cell<usize>>) -> impl FnOnce(TestContext) -> TestResult + 'static {
    let counter = Rc::clone(counter);
    move |_| {
        counter.set(counter.get() + 1);
        Ok(())
    }
}

#[test]
fn only_runs_the_selected_test() {
    let counters: Vec<Rc<Cell<usize>>> = (0..5).map(|_| Rc::new(Cell::new(0))).collect();
    let sink = MemorySink::new();
    let mut registry = Registry::new(sink.clone());
    registry.test("T1", counted(&counters[0]));
    registry.test("T2", counted(&counters[1]));
    registry.only("T3", counted(&counters[2]));
    registry.test("T4", counted(&counters[3]));
    registry.test("T5", counted(&counters[4]));

    let summary = registry.run_blocking();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 4);
    let runs: Vec<usize> = counters.iter().map(|c| c.get()).collect();
    assert_eq!(runs, vec![0, 0, 1, 0, 0]);

    let reported: Vec<String> = sink.outcomes().into_iter().map(|(name, _)| name).collect();
    assert_eq!(reported, vec!["T3".to_string()]);
}

#[test]
fn only_counts_a_failing_selection() {
    let mut registry = Registry::new(NullSink);
    registry.test("T1", |_| Ok(()));
    registry.only("T2", |t| t.expect(1).to_be(2));
    let summary = registry.run_blocking();
    assert_eq!(summary, RunSummary { total: 2, passed: 0, failed: 1, skipped: 1, success: false });
}

#[test]
fn the_most_recent_only_wins() {
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));
    let mut registry = Registry::new(NullSink);
    registry.only("first", counted(&first));
    registry.describe("later", |block| {
        block.only("second", counted(&second));
    });
    let summary = registry.run_blocking();
    assert_eq!((first.get(), second.get()), (0, 1));
    assert_eq!(summary.skipped, 1);
}

#[test]
fn failure_records_carry_expected_and_found() {
    let sink = MemorySink::new();
    let mut registry = Registry::new(sink.clone());
    registry.test("structured", |t| t.expect(Value::map([("a", 1)])).to_equal(Value::map([("a", 2)])));
    registry.test("unstructured", |_| Err(Fault::new("TypeError", "undefined is not a function").into()));
    let summary = registry.run_blocking();
    assert_eq!(summary.failed, 2);

    let outcomes = sink.outcomes();
    assert_eq!(outcomes.len(), 2);

    let (_, structured) = &outcomes[0];
    assert!(!structured.passed);
    assert!(matches!(structured.error, Some(TestError::Failure(_))));
    assert!(structured.expected().is_some());
    assert!(structured.found().is_some());

    let (_, unstructured) = &outcomes[1];
    assert!(!unstructured.passed);
    assert!(matches!(unstructured.error, Some(TestError::Fault(_))));
    assert!(unstructured.expected().is_none());
    assert!(unstructured.found().is_none());
    assert_eq!(unstructured.message, "TypeError: undefined is not a function");
}

#[test]
fn to_throw_on_a_non_function_reaches_the_sink_structured() {
    let sink = MemorySink::new();
    let mut registry = Registry::new(sink.clone());
    registry.test("not callable", |t| t.expect(1).to_throw(None));
    registry.run_blocking();
    let outcomes = sink.outcomes();
    let (_, outcome) = &outcomes[0];
    assert!(matches!(outcome.error, Some(TestError::Failure(_))));
    assert!(outcome.expected().is_some());
    assert!(outcome.found().is_some());
}

#[test]
fn a_failure_built_by_hand_is_still_structured() {
    let sink = MemorySink::new();
    let mut registry = Registry::new(sink.clone());
    registry.test("manual", |_| {
        Err(Failure::new("custom", "because it said so")
            .with_values(Value::from(true), Value::from(false))
            .into())
    });
    registry.run_blocking();
    let outcomes = sink.outcomes();
    assert_eq!(outcomes[0].1.message, "because it said so");
    assert!(outcomes[0].1.expected().is_some());
}

#[test]
fn adjacent_describes_share_one_group() {
    let sink = MemorySink::new();
    let mut registry = Registry::new(sink.clone());
    registry.describe("block", |b| {
        b.test("one", |_| Ok(()));
    });
    registry.describe("block", |b| {
        b.test("two", |_| Ok(()));
    });
    assert_eq!(registry.group_count(&Origin::new(file!())), 1);
    assert_eq!(registry.total(), 2);

    registry.run_blocking();
    let groups: Vec<Option<String>> = sink.records().into_iter().map(|r| r.group).collect();
    assert_eq!(groups, vec![Some("block".to_string()), Some("block".to_string())]);
}

#[test]
fn placeholders_are_announced_at_registration() {
    let sink = MemorySink::new();
    let mut registry = Registry::new(sink.clone());
    registry.test("pending", |_| Ok(()));
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].origin.as_str(), file!());
    assert!(records[0].outcome.is_none());
}

#[test]
fn origins_run_in_first_registration_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut registry = Registry::new(NullSink);
    for (origin, name) in [("a.rs", "a1"), ("b.rs", "b1"), ("a.rs", "a2")] {
        let order = Rc::clone(&order);
        registry.test_at(Origin::new(origin), name, move |_| {
            order.borrow_mut().push(name);
            Ok(())
        });
    }
    registry.run_blocking();
    assert_eq!(*order.borrow(), vec!["a1", "a2", "b1"]);
}

#[test]
fn async_tests_run_one_at_a_time() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut registry = Registry::new(NullSink);
    for name in ["first", "second"] {
        let log = Rc::clone(&log);
        registry.test_async(name, move |t| async move {
            log.borrow_mut().push(format!("{name} start"));
            future::ready(()).await;
            future::lazy(|_| ()).await;
            log.borrow_mut().push(format!("{name} end"));
            t.expect(name).to_be(name)
        });
    }
    let summary = registry.run_blocking();
    assert!(summary.success);
    assert_eq!(
        *log.borrow(),
        vec!["first start", "first end", "second start", "second end"]
    );
}

#[test]
fn async_failures_are_classified_like_sync_ones() {
    let sink = MemorySink::new();
    let mut registry = Registry::new(sink.clone());
    registry.describe("async", |block| {
        block.test_async("rejects", |_| async {
            Err::<(), TestError>(Fault::new("Error", "rejected").into())
        });
        block.test_async("asserts", |t| async move { t.expect(3).to_be_less_than(2.0) });
    });
    let summary = registry.run_blocking();
    assert_eq!(summary.failed, 2);
    let outcomes = sink.outcomes();
    assert!(outcomes[0].1.expected().is_none());
    assert!(outcomes[1].1.expected().is_some());
}

#[test]
fn a_panicking_test_does_not_stop_the_run() {
    let after = Rc::new(Cell::new(0));
    let sink = MemorySink::new();
    let mut registry = Registry::new(sink.clone());
    registry.test("panics", |_| panic!("index out of bounds"));
    registry.test("after", counted(&after));
    let summary = registry.run_blocking();
    assert_eq!(after.get(), 1);
    assert_eq!((summary.passed, summary.failed), (1, 1));
    let outcomes = sink.outcomes();
    assert!(matches!(outcomes[0].1.error, Some(TestError::Fault(ref f)) if f.category == "panic"));
}

#[test]
fn timeouts_are_recorded_but_not_enforced() {
    let sink = MemorySink::new();
    let mut registry = Registry::new(sink.clone());
    registry.test_with_timeout("slow", Duration::from_nanos(1), |_| {
        thread::sleep(Duration::from_millis(5));
        Ok(())
    });
    assert_eq!(registry.total(), 1);
    let summary = registry.run_blocking();
    assert_eq!(summary, RunSummary { total: 1, passed: 1, failed: 0, skipped: 0, success: true });
    assert!(sink.outcomes()[0].1.passed);
}

#[test]
fn exactly_one_summary_per_run() {
    let sink = MemorySink::new();
    let mut registry = Registry::new(sink.clone());
    registry.test("ok", |_| Ok(()));
    let summary = registry.run().now_or_never();
    assert_eq!(summary.map(|s| s.passed), Some(1));
    assert_eq!(sink.summaries().len(), 1);
}

#[test]
fn an_empty_registry_still_reports_a_summary() {
    let sink = MemorySink::new();
    let summary = Registry::new(sink.clone()).run_blocking();
    assert_eq!(summary, RunSummary { total: 0, passed: 0, failed: 0, skipped: 0, success: true });
    assert_eq!(sink.summaries(), vec![summary]);
}
