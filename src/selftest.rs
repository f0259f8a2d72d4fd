//! The framework's own checks, registered through its public API.
//!
//! The `brotest` binary runs these; embedders can register them next to their
//! own tests to make sure the comparison rules they rely on still hold.

use crate::compare::{deep_equal, matches, primitive_equal, Decision};
use crate::errors::Fault;
use crate::runner::Registry;
use crate::value::Value;

/// Registers every self-check on `registry`.
#[track_caller]
pub fn register(registry: &mut Registry) {
    registry.describe("equality", |block| {
        block.test("deep equal", |t| {
            t.expect(deep_equal(&Value::from(2), &Value::from(3), None)).to_be(false)?;
            t.expect(deep_equal(&Value::from(2), &Value::from(2), None)).to_be(true)?;
            t.expect(deep_equal(&empty_map(), &Value::map([("a", 3)]), None)).to_be(false)?;
            t.expect(deep_equal(&Value::map([("a", 3)]), &Value::map([("a", 3)]), None)).to_be(true)?;
            t.expect(deep_equal(&empty_map(), &empty_map(), None)).to_be(true)?;
            t.expect(deep_equal(&empty_list(), &empty_list(), None)).to_be(true)?;
            t.expect(deep_equal(&empty_list(), &empty_map(), None)).to_be(false)?;
            t.expect(deep_equal(&Value::list([1]), &empty_list(), None)).to_be(false)?;
            t.expect(deep_equal(&Value::list([1, 2]), &Value::list([1, 2]), None)).to_be(true)
        });

        block.test("key order is irrelevant", |t| {
            let a = Value::map([("a", 1), ("b", 2)]);
            let b = Value::map([("b", 2), ("a", 1)]);
            t.expect(deep_equal(&a, &b, None)).to_be(true)?;
            t.expect(deep_equal(&b, &a, None)).to_be(true)
        });

        block.test("length matters", |t| {
            let short = Value::list([1, 2]);
            t.expect(deep_equal(&short, &Value::list([1, 2, 3]), None)).to_be(false)?;
            let padded = Value::list([Value::from(1), Value::from(2), Value::Undefined]);
            t.expect(deep_equal(&padded, &short, None)).to_be(false)
        });

        block.test("absent is not empty", |t| {
            t.expect(deep_equal(&Value::Undefined, &Value::Null, None)).to_be(false)?;
            t.expect(deep_equal(&Value::Null, &Value::Null, None)).to_be(true)
        });

        block.test("category mismatch", |t| {
            t.expect(deep_equal(&date(1234)?, &Value::from(1234), None)).to_be(false)?;
            t.expect(deep_equal(&Value::from("1"), &Value::from(1), None)).to_be(false)
        });

        block.test("tolerance", |t| {
            t.expect(deep_equal(&Value::from(0.10000001), &Value::from(0.1), Some(1e-4))).to_be(true)?;
            t.expect(deep_equal(&Value::from(0.2), &Value::from(0.1), Some(1e-4))).to_be(false)
        });
    });

    registry.describe("handles", |block| {
        block.test("functions compare by reference", |t| {
            let f = Value::function(|| Ok(Value::Undefined));
            let g = Value::function(|| Ok(Value::Undefined));
            t.expect(deep_equal(&f, &f.clone(), None)).to_be(true)?;
            t.expect(deep_equal(&f, &g, None)).to_be(false)
        });

        block.test("regular expressions compare by reference", |t| {
            let a = Value::regex("^a+$").map_err(Fault::from_error)?;
            let b = Value::regex("^a+$").map_err(Fault::from_error)?;
            t.expect(deep_equal(&a, &a.clone(), None)).to_be(true)?;
            t.expect(deep_equal(&a, &b, None)).to_be(false)
        });

        block.test("distinct dates never compare equal", |t| {
            let a = date(1234)?;
            t.expect(deep_equal(&a, &a.clone(), None)).to_be(true)?;
            t.expect(deep_equal(&a, &date(1234)?, None)).to_be(false)
        });
    });

    registry.describe("subset", |block| {
        block.test("extra keys in the value are ignored", |t| {
            let value = Value::map([("a", 1), ("b", 2)]);
            t.expect(matches(&Value::map([("a", 1)]), &value, None)).to_be(true)?;
            t.expect(value).to_match_object(Value::map([("a", 1)]))
        });

        block.test("extra keys in the pattern fail", |t| {
            let pattern = Value::map([("a", 1), ("b", 2)]);
            t.expect(matches(&pattern, &Value::map([("a", 1)]), None)).to_be(false)
        });

        block.test("scalars fall back to the primitive rules", |t| {
            let decided = primitive_equal(&Value::from(1), &Value::from(1), None);
            t.expect(decided == Decision::Known(true)).to_be(true)?;
            t.expect(matches(&Value::from(1), &Value::from(2), None)).to_be(false)
        });
    });

    registry.describe("expectations", |block| {
        block.test("to_throw", |t| {
            let raises = Value::function(|| Err(Fault::new("RangeError", "too big")));
            t.expect(raises.clone()).to_throw(None)?;
            t.expect(raises).to_throw(Some("RangeError"))
        });

        block.test("roughly", |t| {
            t.expect(0.1 + 0.2).to_roughly_equal(0.3)?;
            t.expect(Value::map([("x", 0.1 + 0.2), ("y", 1.0)])).to_roughly_match(Value::map([("x", 0.3)]))
        });

        block.test("sizes and bounds", |t| {
            t.expect(Value::list([1, 2, 3])).to_have_length(3)?;
            t.expect("four").to_have_length(4)?;
            t.expect(1).to_be_less_than(2.0)
        });
    });
}

fn date(millis: i64) -> Result<Value, Fault> {
    Value::date_millis(millis).ok_or_else(|| Fault::new("RangeError", format!("invalid date {millis}")))
}

fn empty_map() -> Value {
    Value::map(Vec::<(String, Value)>::new())
}

fn empty_list() -> Value {
    Value::list(Vec::<Value>::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Origin;
    use crate::sink::MemorySink;

    #[test]
    fn every_self_check_passes() {
        let sink = MemorySink::new();
        let mut registry = Registry::new(sink.clone());
        register(&mut registry);
        let total = registry.total();
        let summary = registry.run_blocking();
        let failures: Vec<_> = sink
            .outcomes()
            .into_iter()
            .filter(|(_, o)| !o.passed)
            .map(|(name, o)| format!("{name}: {}", o.message))
            .collect();
        assert!(failures.is_empty(), "self-checks failed: {failures:?}");
        assert_eq!(summary.total, total);
        assert_eq!(summary.passed, total);
    }

    #[test]
    fn self_checks_are_grouped_under_the_caller() {
        let mut registry = Registry::new(MemorySink::new());
        register(&mut registry);
        assert_eq!(registry.group_count(&Origin::new(file!())), 4);
    }
}
