//! Structural comparison engine behind every assertion.
//!
//! Three operations of increasing power share one scalar fast path:
//!
//! - [`Comparator::primitive_equal`] settles everything that does not need
//!   recursion and answers [`Decision::Undecidable`] otherwise.
//! - [`Comparator::deep_equal`] recurses with symmetric key sets.
//! - [`Comparator::matches`] recurses asymmetrically: keys only present in the
//!   value are ignored.
//!
//! Nothing in this module raises or panics.

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Outcome of the scalar comparison step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Known(bool),
    /// Both operands are composites; a structural walk is required.
    Undecidable,
}

impl Decision {
    /// Collapses the tri-state, reading `Undecidable` as `false`.
    pub fn is_true(self) -> bool {
        matches!(self, Decision::Known(true))
    }
}

/// How two date values compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateEquality {
    /// Two date handles are equal only if they are the same handle, even when
    /// they hold the same instant. This is the historical behavior.
    #[default]
    ByReference,
    /// Two date handles are equal when they hold the same instant.
    ByInstant,
}

/// Comparison settings shared by the three operations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Comparator {
    /// Maximum absolute difference at which two numbers still compare equal.
    pub tolerance: Option<f64>,
    pub dates: DateEquality,
}

impl Comparator {
    pub fn new(tolerance: Option<f64>) -> Self {
        Self {
            tolerance,
            dates: DateEquality::default(),
        }
    }

    pub fn with_dates(mut self, dates: DateEquality) -> Self {
        self.dates = dates;
        self
    }

    /// Scalar comparison; see the rules inline, they are evaluated in order.
    pub fn primitive_equal(&self, x: &Value, y: &Value) -> Decision {
        // Undefined and Null are distinct.
        if x.is_nullish() || y.is_nullish() {
            return Decision::Known(x.category() == y.category());
        }
        if x.category() != y.category() {
            return Decision::Known(false);
        }
        match (x, y) {
            (Value::Function(a), Value::Function(b)) => return Decision::Known(a.same(b)),
            (Value::Regex(a), Value::Regex(b)) => return Decision::Known(a.same(b)),
            (Value::List(a), Value::List(b)) if a.len() != b.len() => {
                return Decision::Known(false)
            }
            (Value::Date(a), Value::Date(b)) => {
                return Decision::Known(match self.dates {
                    DateEquality::ByReference => a.same(b),
                    DateEquality::ByInstant => a.instant() == b.instant(),
                })
            }
            _ => {}
        }
        if x.same_ref(y) || x.primitive_eq(y) || self.within_tolerance(x, y) {
            return Decision::Known(true);
        }
        if !x.is_composite() || !y.is_composite() {
            return Decision::Known(false);
        }
        Decision::Undecidable
    }

    /// Recursive structural equality. Both operands must have exactly the same
    /// key sets, and every value must be deep-equal under the same settings.
    pub fn deep_equal(&self, x: &Value, y: &Value) -> bool {
        if let Decision::Known(known) = self.primitive_equal(x, y) {
            return known;
        }
        let x_keys = x.keys();
        let y_keys = y.keys();
        if !y_keys.iter().all(|k| x.get_key(k).is_some()) {
            return false;
        }
        x_keys.iter().all(|k| match (x.get_key(k), y.get_key(k)) {
            (Some(a), Some(b)) => self.deep_equal(a, b),
            _ => false,
        })
    }

    /// Asymmetric subset check: every key of `pattern` must exist in `value`
    /// and match recursively. Extra keys in `value` are ignored.
    pub fn matches(&self, pattern: &Value, value: &Value) -> bool {
        if !pattern.is_composite() {
            return self.primitive_equal(pattern, value).is_true();
        }
        pattern.keys().iter().all(|k| match (pattern.get_key(k), value.get_key(k)) {
            (Some(p), Some(v)) => self.matches(p, v),
            _ => false,
        })
    }

    fn within_tolerance(&self, x: &Value, y: &Value) -> bool {
        match (self.tolerance, x, y) {
            (Some(tolerance), Value::Number(a), Value::Number(b)) => (a - b).abs() <= tolerance,
            _ => false,
        }
    }
}

/// [`Comparator::primitive_equal`] with default settings.
pub fn primitive_equal(x: &Value, y: &Value, tolerance: Option<f64>) -> Decision {
    Comparator::new(tolerance).primitive_equal(x, y)
}

/// [`Comparator::deep_equal`] with default settings.
///
/// # Examples
///
/// ```rust
/// use brotest::compare::deep_equal;
/// use brotest::value::Value;
/// let a = Value::map([("a", 1), ("b", 2)]);
/// let b = Value::map([("b", 2), ("a", 1)]);
/// assert!(deep_equal(&a, &b, None));
/// assert!(!deep_equal(&Value::list([1, 2]), &Value::list([1, 2, 3]), None));
/// ```
pub fn deep_equal(x: &Value, y: &Value, tolerance: Option<f64>) -> bool {
    Comparator::new(tolerance).deep_equal(x, y)
}

/// [`Comparator::matches`] with default settings.
pub fn matches(pattern: &Value, value: &Value, tolerance: Option<f64>) -> bool {
    Comparator::new(tolerance).matches(pattern, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullish_values_only_equal_themselves() {
        assert_eq!(primitive_equal(&Value::Null, &Value::Null, None), Decision::Known(true));
        assert_eq!(
            primitive_equal(&Value::Undefined, &Value::Null, None),
            Decision::Known(false)
        );
        assert_eq!(
            primitive_equal(&Value::Null, &Value::from(0), None),
            Decision::Known(false)
        );
    }

    #[test]
    fn composites_are_undecidable() {
        let a = Value::map([("a", 1)]);
        let b = Value::map([("a", 1)]);
        assert_eq!(primitive_equal(&a, &b, None), Decision::Undecidable);
        assert!(!Decision::Undecidable.is_true());
    }

    #[test]
    fn shared_composites_are_decided_early() {
        let a = Value::list([1, 2]);
        assert_eq!(primitive_equal(&a, &a.clone(), None), Decision::Known(true));
    }

    #[test]
    fn length_mismatch_is_decided_early() {
        let a = Value::list([1, 2]);
        let b = Value::list([1, 2, 3]);
        assert_eq!(primitive_equal(&a, &b, None), Decision::Known(false));
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        let nan = Value::Number(f64::NAN);
        assert!(!deep_equal(&nan, &nan, None));
        assert!(!deep_equal(&nan, &nan, Some(1.0)));
    }

    #[test]
    fn tolerance_only_applies_to_numbers() {
        assert!(deep_equal(&Value::from(1.00001), &Value::from(1.0), Some(1e-3)));
        assert!(!deep_equal(&Value::from("a"), &Value::from("b"), Some(1e9)));
    }

    #[test]
    fn date_modes() {
        let a = Value::date_millis(1234).unwrap();
        let b = Value::date_millis(1234).unwrap();
        let by_ref = Comparator::default();
        let by_instant = Comparator::default().with_dates(DateEquality::ByInstant);
        assert!(by_ref.deep_equal(&a, &a.clone()));
        assert!(!by_ref.deep_equal(&a, &b));
        assert!(by_instant.deep_equal(&a, &b));
        assert!(!by_instant.deep_equal(&a, &Value::date_millis(1235).unwrap()));
    }

    #[test]
    fn matches_recurses_into_nested_patterns() {
        let value = Value::map([
            ("a", Value::map([("x", 1), ("y", 2)])),
            ("b", Value::from(3)),
        ]);
        let pattern = Value::map([("a", Value::map([("x", 1)]))]);
        assert!(matches(&pattern, &value, None));
        let pattern = Value::map([("a", Value::map([("z", 1)]))]);
        assert!(!matches(&pattern, &value, None));
    }

    #[test]
    fn matches_against_a_scalar_fails() {
        let pattern = Value::map([("a", 1)]);
        assert!(!matches(&pattern, &Value::from(1), None));
    }

    #[test]
    fn list_patterns_match_prefixes() {
        assert!(matches(&Value::list([1]), &Value::list([1, 2]), None));
        assert!(!matches(&Value::list([1, 2]), &Value::list([1]), None));
    }

    #[test]
    fn empty_composites() {
        assert!(deep_equal(&Value::map(Vec::<(String, Value)>::new()), &Value::map(Vec::<(String, Value)>::new()), None));
        assert!(deep_equal(&Value::list(Vec::<Value>::new()), &Value::list(Vec::<Value>::new()), None));
        assert!(!deep_equal(&Value::list(Vec::<Value>::new()), &Value::map(Vec::<(String, Value)>::new()), None));
    }
}
