//! The structured values that assertions capture and compare.
//!
//! Scalars compare by content. Functions, regular expressions, and dates are
//! opaque capability handles: they compare by handle identity, never by what
//! they contain. Composites (lists and maps) share their storage on clone, so
//! a cloned composite is still "the same reference" for [`Value::same_ref`].

use crate::errors::Fault;
use chrono::{DateTime, TimeZone, Utc};
use im::OrdMap;
use regex::Regex;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;
use std::rc::Rc;

/// A value captured by an expectation or stored inside a composite.
///
/// # Examples
///
/// ```rust
/// use brotest::value::Value;
/// let v = Value::map([("a", Value::from(1)), ("b", Value::from("two"))]);
/// assert_eq!(v.type_name(), "Map");
/// assert_eq!(v.length(), Some(2));
/// assert!(Value::Undefined.is_nullish());
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent.
    #[default]
    Undefined,
    /// Explicitly empty.
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Function(FnHandle),
    Regex(RegexHandle),
    Date(DateHandle),
    List(Rc<Vec<Value>>),
    Map(OrdMap<String, Value>),
}

/// The runtime category of a value. Two values of different categories are
/// never equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Undefined,
    Null,
    Bool,
    Number,
    String,
    Function,
    Regex,
    Date,
    List,
    Map,
}

impl Value {
    /// Builds a list value.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Builds a map value from key/value pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wraps a zero-argument operation as a function handle.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn() -> Result<Value, Fault> + 'static,
    {
        Value::Function(FnHandle::new(f))
    }

    /// Compiles `pattern` into a regular-expression handle.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Value::Regex(RegexHandle::new(Regex::new(pattern)?)))
    }

    /// A date handle at `millis` milliseconds since the Unix epoch, or `None`
    /// when the instant is outside the range `chrono` can represent.
    pub fn date_millis(millis: i64) -> Option<Self> {
        let at = Utc.timestamp_millis_opt(millis).single()?;
        Some(Value::Date(DateHandle::new(at)))
    }

    pub fn category(&self) -> Category {
        match self {
            Value::Undefined => Category::Undefined,
            Value::Null => Category::Null,
            Value::Bool(_) => Category::Bool,
            Value::Number(_) => Category::Number,
            Value::String(_) => Category::String,
            Value::Function(_) => Category::Function,
            Value::Regex(_) => Category::Regex,
            Value::Date(_) => Category::Date,
            Value::List(_) => Category::List,
            Value::Map(_) => Category::Map,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.category() {
            Category::Undefined => "Undefined",
            Category::Null => "Null",
            Category::Bool => "Bool",
            Category::Number => "Number",
            Category::String => "String",
            Category::Function => "Function",
            Category::Regex => "Regex",
            Category::Date => "Date",
            Category::List => "List",
            Category::Map => "Map",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true for lists and maps.
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Length of a string (in chars), list, or map.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// The keys of a composite. List indices are rendered as decimal strings.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Value::List(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            Value::Map(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Looks up `key` in a composite. Lists accept decimal indices.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        match self {
            Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Reference identity, or content identity for scalars.
    ///
    /// This is strict equality: numbers compare with IEEE rules (`NaN` is not
    /// itself), handles and composites compare by the storage they share.
    pub fn same_ref(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.same(b),
            (Value::Regex(a), Value::Regex(b)) => a.same(b),
            (Value::Date(a), Value::Date(b)) => a.same(b),
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Equality of the primitive projections of two scalars.
    pub(crate) fn primitive_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Display formatting helpers
    // ------------------------------------------------------------------------

    fn fmt_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            item.fmt_nested(f)?;
        }
        write!(f, "]")
    }

    fn fmt_map(f: &mut fmt::Formatter<'_>, map: &OrdMap<String, Value>) -> fmt::Result {
        if map.is_empty() {
            return write!(f, "{{}}");
        }
        write!(f, "{{ ")?;
        for (i, (k, v)) in map.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: ", k)?;
            v.fmt_nested(f)?;
        }
        write!(f, " }}")
    }

    /// Strings are quoted when they appear inside a composite.
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }

    /// Multi-line rendering, one entry per line, used for diffs.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth + 1);
        let close = "  ".repeat(depth);
        match self {
            Value::List(items) if !items.is_empty() => {
                out.push_str("[\n");
                for item in items.iter() {
                    out.push_str(&pad);
                    item.write_pretty(out, depth + 1);
                    out.push_str(",\n");
                }
                out.push_str(&close);
                out.push(']');
            }
            Value::Map(map) if !map.is_empty() => {
                out.push_str("{\n");
                for (k, v) in map.iter() {
                    out.push_str(&pad);
                    out.push_str(k);
                    out.push_str(": ");
                    v.write_pretty(out, depth + 1);
                    out.push_str(",\n");
                }
                out.push_str(&close);
                out.push('}');
            }
            Value::String(s) => out.push_str(&format!("{:?}", s)),
            other => out.push_str(&other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Function(h) => write!(f, "{}", h),
            Value::Regex(h) => write!(f, "{}", h),
            Value::Date(h) => write!(f, "{}", h),
            Value::List(items) => Value::fmt_list(f, items),
            Value::Map(map) => Value::fmt_map(f, map),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Function(_) | Value::Regex(_) | Value::Date(_) => {
                serializer.collect_str(self)
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

// ============================================================================
// CAPABILITY HANDLES
// ============================================================================

type Thunk = dyn Fn() -> Result<Value, Fault>;

/// A zero-argument operation. Equal only to clones of itself.
#[derive(Clone)]
pub struct FnHandle(Rc<Thunk>);

impl FnHandle {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<Value, Fault> + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self) -> Result<Value, Fault> {
        (self.0)()
    }

    pub fn same(&self, other: &FnHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for FnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnHandle({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

impl fmt::Display for FnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[function]")
    }
}

/// A compiled regular expression. Two handles with the same pattern are
/// still different values.
#[derive(Debug, Clone)]
pub struct RegexHandle(Rc<Regex>);

impl RegexHandle {
    pub fn new(regex: Regex) -> Self {
        Self(Rc::new(regex))
    }

    pub fn regex(&self) -> &Regex {
        &self.0
    }

    pub fn same(&self, other: &RegexHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for RegexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.0.as_str())
    }
}

/// A point in time.
#[derive(Debug, Clone)]
pub struct DateHandle(Rc<DateTime<Utc>>);

impl DateHandle {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Rc::new(at))
    }

    pub fn instant(&self) -> DateTime<Utc> {
        *self.0
    }

    pub fn same(&self, other: &DateHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for DateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(at: DateTime<Utc>) -> Self {
        Value::Date(DateHandle::new(at))
    }
}

impl From<Regex> for Value {
    fn from(regex: Regex) -> Self {
        Value::Regex(RegexHandle::new(regex))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(map) => Value::map(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_keys_are_indices() {
        let v = Value::list([10, 20]);
        assert_eq!(v.keys(), vec!["0".to_string(), "1".to_string()]);
        assert_eq!(v.get_key("1").and_then(Value::as_number), Some(20.0));
        assert!(v.get_key("2").is_none());
        assert!(v.get_key("x").is_none());
    }

    #[test]
    fn cloned_composites_share_identity() {
        let list = Value::list([1, 2]);
        let map = Value::map([("a", 1)]);
        assert!(list.same_ref(&list.clone()));
        assert!(map.same_ref(&map.clone()));
        assert!(!list.same_ref(&Value::list([1, 2])));
    }

    #[test]
    fn display_is_literal_like() {
        let v = Value::map([
            ("a", Value::list([Value::from(1), Value::from("x")])),
            ("b", Value::Null),
        ]);
        assert_eq!(v.to_string(), "{ a: [1, \"x\"], b: null }");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Undefined.to_string(), "undefined");
    }

    #[test]
    fn json_conversion_keeps_structure() {
        let v = Value::from(serde_json::json!({"a": [1, true, null], "b": "s"}));
        assert_eq!(v.get_key("a").and_then(Value::length), Some(3));
        assert_eq!(v.get_key("b").and_then(Value::as_str), Some("s"));
        assert_eq!(serde_json::to_string(&v).ok().as_deref(), Some(r#"{"a":[1.0,true,null],"b":"s"}"#));
    }

    #[test]
    fn string_length_counts_chars() {
        assert_eq!(Value::from("héllo").length(), Some(5));
        assert_eq!(Value::Number(3.0).length(), None);
    }

    #[test]
    fn out_of_range_dates_are_rejected() {
        assert!(Value::date_millis(i64::MAX).is_none());
        assert!(Value::date_millis(i64::MIN).is_none());
        let at = Value::date_millis(86_400_000);
        assert!(matches!(at, Some(Value::Date(ref h)) if h.instant().timestamp() == 86_400));
    }
}
