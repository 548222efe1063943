//! Runtime values for the interpreter

use super::env::EnvRef;
use crate::ast::FnLit;
use std::fmt;
use std::ops::RangeInclusive;
use std::rc::Rc;

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// Boolean
    Bool(bool),
    /// Immutable byte string, written to the host unchanged
    Str(Rc<[u8]>),
    /// Unit value
    Unit,
    /// Function value with its captured environment
    Function(Rc<Closure>),
    /// Integer range
    Range(RangeValue),
}

/// A function literal paired with the environment it was defined in
pub struct Closure {
    pub lit: Rc<FnLit>,
    pub env: EnvRef,
}

impl Closure {
    pub fn name(&self) -> Option<&str> {
        self.lit.name.as_deref()
    }

    pub fn arity(&self) -> usize {
        self.lit.params.len()
    }
}

// The captured environment may contain this closure
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.lit.name)
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}

/// `start..end` or `start..=end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
    pub inclusive: bool,
}

impl RangeValue {
    pub fn new(start: i64, end: i64, inclusive: bool) -> Self {
        RangeValue {
            start,
            end,
            inclusive,
        }
    }

    /// Lazily yield every integer in the range
    pub fn iter(&self) -> RangeInclusive<i64> {
        if self.inclusive {
            self.start..=self.end
        } else {
            match self.end.checked_sub(1) {
                Some(last) => self.start..=last,
                #[allow(clippy::reversed_empty_ranges)]
                None => 1..=0,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.iter().is_empty()
    }
}

impl Value {
    pub fn string(s: impl AsRef<[u8]>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// Append the output form of this value; strings go out as raw bytes
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Value::Str(s) => out.extend_from_slice(s),
            other => out.extend_from_slice(other.to_string().as_bytes()),
        }
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Unit => "()",
            Value::Function(_) => "function",
            Value::Range(_) => "range",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Functions and ranges have no value equality
    pub fn is_comparable(&self) -> bool {
        !matches!(self, Value::Function(_) | Value::Range(_))
    }

    /// Language-level `==`; `None` when either side is not comparable
    pub fn structural_eq(&self, other: &Value) -> Option<bool> {
        if !self.is_comparable() || !other.is_comparable() {
            return None;
        }
        Some(self == other)
    }

    /// Rendering used in diagnostics: strings quoted, everything else displayed
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("{:?}", String::from_utf8_lossy(s)),
            Value::Unit => "()".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(&String::from_utf8_lossy(s)),
            Value::Unit => Ok(()),
            Value::Function(closure) => match closure.name() {
                Some(name) => write!(f, "<fn {name}>"),
                None => write!(f, "<fn>"),
            },
            Value::Range(r) if r.inclusive => write!(f, "{}..={}", r.start, r.end),
            Value::Range(r) => write!(f, "{}..{}", r.start, r.end),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Unit, Value::Unit) => true,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Range(a), Value::Range(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Int(-42)), "-42");
        assert_eq!(format!("{}", Value::Bool(true)), "true");
        assert_eq!(format!("{}", Value::string("raw \"text\"")), "raw \"text\"");
        assert_eq!(format!("{}", Value::Unit), "");
    }

    #[test]
    fn test_write_to_keeps_raw_bytes() {
        let mut out = Vec::new();
        Value::string(b"\x1b\xff").write_to(&mut out);
        Value::Int(7).write_to(&mut out);
        Value::Unit.write_to(&mut out);
        assert_eq!(out, vec![0x1b, 0xff, b'7']);
    }

    #[test]
    fn test_range_display() {
        assert_eq!(Value::Range(RangeValue::new(0, 10, false)).to_string(), "0..10");
        assert_eq!(Value::Range(RangeValue::new(1, 100, true)).to_string(), "1..=100");
    }

    #[test]
    fn test_range_counts() {
        assert_eq!(RangeValue::new(1, 100, true).iter().count(), 100);
        assert_eq!(RangeValue::new(0, 10, false).iter().count(), 10);
        assert_eq!(RangeValue::new(5, 5, true).iter().count(), 1);
    }

    #[test]
    fn test_empty_ranges() {
        assert!(RangeValue::new(5, 5, false).is_empty());
        assert!(RangeValue::new(6, 5, true).is_empty());
        assert!(RangeValue::new(i64::MIN, i64::MIN, false).is_empty());
    }

    #[test]
    fn test_range_at_integer_bounds() {
        let r = RangeValue::new(i64::MAX - 1, i64::MAX, true);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![i64::MAX - 1, i64::MAX]);
    }

    #[test]
    fn test_structural_eq() {
        assert_eq!(Value::Int(1).structural_eq(&Value::Int(1)), Some(true));
        assert_eq!(Value::Int(1).structural_eq(&Value::string("1")), Some(false));
        assert_eq!(Value::Unit.structural_eq(&Value::Unit), Some(true));
        let range = Value::Range(RangeValue::new(0, 1, false));
        assert_eq!(range.structural_eq(&range), None);
        assert_eq!(Value::Int(0).structural_eq(&range), None);
    }

    #[test]
    fn test_repr_quotes_strings() {
        assert_eq!(Value::string("hi").repr(), "\"hi\"");
        assert_eq!(Value::Int(3).repr(), "3");
        assert_eq!(Value::Unit.repr(), "()");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Int(0).type_name(), "int");
        assert_eq!(Value::string("").type_name(), "string");
        assert_eq!(Value::Range(RangeValue::new(0, 0, true)).type_name(), "range");
    }
}
