//! Expectation API: wraps one captured value and checks it.
//!
//! Every assertion returns `Ok(())` when it holds and a [`Failure`] (inside a
//! [`TestError`]) when it does not, so test bodies chain them with `?`:
//!
//! ```rust
//! use brotest::expect::expect;
//! use brotest::value::Value;
//!
//! fn body() -> brotest::TestResult {
//!     expect(2).to_be(2)?;
//!     expect(Value::map([("a", 1), ("b", 2)])).to_match_object(Value::map([("a", 1)]))?;
//!     expect(0.1 + 0.2).to_roughly_equal(0.3)?;
//!     Ok(())
//! }
//! assert!(body().is_ok());
//! ```

use crate::compare::Comparator;
use crate::errors::{Failure, Fault, TestError, TestResult};
use crate::value::Value;
use std::panic::{self, AssertUnwindSafe};

/// Tolerance used by the `roughly` assertions when none is given.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Starts an expectation with default comparison settings.
pub fn expect(value: impl Into<Value>) -> Expectation {
    Expectation::new(value.into())
}

/// A captured value and the settings its assertions compare with.
#[derive(Debug, Clone)]
pub struct Expectation {
    value: Value,
    comparator: Comparator,
    default_tolerance: f64,
}

impl Expectation {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            comparator: Comparator::default(),
            default_tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Uses `comparator` for date handling. Its tolerance is ignored; each
    /// assertion picks its own.
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_default_tolerance(mut self, tolerance: f64) -> Self {
        self.default_tolerance = tolerance;
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn compare_with(&self, tolerance: Option<f64>) -> Comparator {
        Comparator {
            tolerance,
            ..self.comparator
        }
    }

    fn fail(&self, assertion: &'static str, message: String, expected: Value) -> TestResult {
        Err(Failure::new(assertion, message)
            .with_values(expected, self.value.clone())
            .into())
    }

    // ------------------------------------------------------------------------
    // Equality
    // ------------------------------------------------------------------------

    /// Strict equality: same scalar, or same reference for handles and
    /// composites. Never recurses.
    pub fn to_be(&self, expected: impl Into<Value>) -> TestResult {
        let expected = expected.into();
        if self.value.same_ref(&expected) {
            return Ok(());
        }
        let message = format!("because {} is not {}", self.value, expected);
        self.fail("to_be", message, expected)
    }

    /// Deep structural equality.
    pub fn to_equal(&self, expected: impl Into<Value>) -> TestResult {
        self.equal("to_equal", expected.into(), None)
    }

    /// Deep structural equality with numbers compared within `tolerance`.
    pub fn to_equal_within(&self, expected: impl Into<Value>, tolerance: f64) -> TestResult {
        self.equal("to_equal", expected.into(), Some(tolerance))
    }

    /// [`to_equal_within`](Self::to_equal_within) with the default tolerance.
    pub fn to_roughly_equal(&self, expected: impl Into<Value>) -> TestResult {
        self.equal("to_roughly_equal", expected.into(), Some(self.default_tolerance))
    }

    fn equal(&self, assertion: &'static str, expected: Value, tolerance: Option<f64>) -> TestResult {
        if self.compare_with(tolerance).deep_equal(&expected, &self.value) {
            return Ok(());
        }
        let message = match tolerance {
            Some(t) => format!("because {} is not equal to {} (tolerance {})", self.value, expected, t),
            None => format!("because {} is not equal to {}", self.value, expected),
        };
        self.fail(assertion, message, expected)
    }

    // ------------------------------------------------------------------------
    // Subset matching
    // ------------------------------------------------------------------------

    /// The captured value must structurally contain `pattern`.
    pub fn to_match_object(&self, pattern: impl Into<Value>) -> TestResult {
        self.match_object("to_match_object", pattern.into(), None)
    }

    pub fn to_match_object_within(&self, pattern: impl Into<Value>, tolerance: f64) -> TestResult {
        self.match_object("to_match_object", pattern.into(), Some(tolerance))
    }

    /// [`to_match_object_within`](Self::to_match_object_within) with the
    /// default tolerance.
    pub fn to_roughly_match(&self, pattern: impl Into<Value>) -> TestResult {
        self.match_object("to_roughly_match", pattern.into(), Some(self.default_tolerance))
    }

    fn match_object(&self, assertion: &'static str, pattern: Value, tolerance: Option<f64>) -> TestResult {
        let comparator = self.compare_with(tolerance);
        if comparator.matches(&pattern, &self.value) {
            return Ok(());
        }
        let message = match first_mismatch(&comparator, &pattern, &self.value) {
            Some(key) => format!(
                "because in property \"{}\" that is {} does not match {}",
                key,
                self.value.get_key(&key).cloned().unwrap_or_default(),
                pattern.get_key(&key).cloned().unwrap_or_default()
            ),
            None => format!("because {} does not match {}", self.value, pattern),
        };
        self.fail(assertion, message, pattern)
    }

    // ------------------------------------------------------------------------
    // Size and ordering
    // ------------------------------------------------------------------------

    pub fn to_have_length(&self, expected: usize) -> TestResult {
        match self.value.length() {
            Some(len) if len == expected => Ok(()),
            Some(len) => self.fail(
                "to_have_length",
                format!("because {} has length {}, not {}", self.value, len, expected),
                Value::from(expected),
            ),
            None => self.fail(
                "to_have_length",
                format!("because {} ({}) has no length", self.value, self.value.type_name()),
                Value::from(expected),
            ),
        }
    }

    /// Numeric strictly-less-than.
    pub fn to_be_less_than(&self, bound: f64) -> TestResult {
        self.ordered("to_be_less_than", bound, "less than", |a, b| a < b)
    }

    /// Numeric strictly-greater-than.
    pub fn to_be_greater_than(&self, bound: f64) -> TestResult {
        self.ordered("to_be_greater_than", bound, "greater than", |a, b| a > b)
    }

    fn ordered(
        &self,
        assertion: &'static str,
        bound: f64,
        relation: &str,
        holds: impl Fn(f64, f64) -> bool,
    ) -> TestResult {
        match self.value.as_number() {
            Some(n) if holds(n, bound) => Ok(()),
            Some(_) => self.fail(
                assertion,
                format!("because {} is not {} {}", self.value, relation, bound),
                Value::from(bound),
            ),
            None => self.fail(
                assertion,
                format!("because {} is not a number", self.value),
                Value::from(bound),
            ),
        }
    }

    // ------------------------------------------------------------------------
    // Raising
    // ------------------------------------------------------------------------

    /// The captured value must be a function handle that raises when called.
    /// A panic inside the handle counts as raising, with category `panic`.
    ///
    /// With `category`, the raised fault must be of that category; a fault of
    /// any other category is returned as-is rather than turned into a
    /// [`Failure`].
    pub fn to_throw(&self, category: Option<&str>) -> TestResult {
        let expected = Value::from(category.unwrap_or("a raised fault"));
        let Value::Function(handle) = &self.value else {
            let message = format!("because {} ({}) is not a function", self.value, self.value.type_name());
            return self.fail("to_throw", message, Value::from("a function"));
        };
        let called = panic::catch_unwind(AssertUnwindSafe(|| handle.call()))
            .unwrap_or_else(|payload| Err(Fault::from_panic(payload)));
        match (called, category) {
            (Ok(returned), _) => Err(Failure::new(
                "to_throw",
                format!("because the function returned {} instead of raising", returned),
            )
            .with_values(expected, returned)
            .into()),
            (Err(_), None) => Ok(()),
            (Err(fault), Some(wanted)) if fault.category == wanted => Ok(()),
            (Err(fault), Some(_)) => Err(TestError::Fault(fault)),
        }
    }
}

/// Names the first pattern key whose value fails to match.
fn first_mismatch(comparator: &Comparator, pattern: &Value, value: &Value) -> Option<String> {
    if !pattern.is_composite() {
        return None;
    }
    pattern.keys().into_iter().find(|k| match (pattern.get_key(k), value.get_key(k)) {
        (Some(p), Some(v)) => !comparator.matches(p, v),
        _ => true,
    })
}
