//! # brotest
//!
//! A small test micro-framework: a structural comparison engine, fluent
//! expectations built on it, and a registry that runs tests one at a time and
//! reports through a pluggable sink.
//!
//! ```rust
//! use brotest::runner::Registry;
//! use brotest::sink::MemorySink;
//! use brotest::{TestResult, Value};
//!
//! fn adds_up(t: brotest::runner::TestContext) -> TestResult {
//!     t.expect(Value::map([("sum", 3)])).to_match_object(Value::map([("sum", 1 + 2)]))
//! }
//!
//! let mut registry = Registry::new(MemorySink::new());
//! registry.describe("arithmetic", |block| {
//!     block.test("adds up", adds_up);
//! });
//! assert!(registry.run_blocking().success);
//! ```

pub use crate::errors::{Failure, Fault, TestError, TestResult};
pub use crate::expect::expect;
pub use crate::runner::Registry;
pub use crate::value::Value;

pub mod cli;
pub mod compare;
pub mod config;
pub mod errors;
pub mod expect;
pub mod logging;
pub mod runner;
pub mod selftest;
pub mod sink;
pub mod value;
