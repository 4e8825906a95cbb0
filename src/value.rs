//! Dynamically typed property values.
//!
//! Component property bags are heterogeneous: a `Value` is what every key in a
//! bag maps to. Equality comes in two flavours: the derived strict `PartialEq`
//! used by the diff engine by default, and [`Value::loosely_equals`] for
//! widgets that treat coercible values (`"1"` and `1`) as unchanged.

use std::fmt;

use crate::surface::NodeId;

/// A property value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / unset.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Reference to a surface node.
    Node(NodeId),
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by boolean-ish painters (`disabled`, `hidden`, ...).
    ///
    /// `Null`, `false`, `0`, `0.0`, `NaN`, `""` and `"false"` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Str(s) => !s.is_empty() && s != "false",
            Value::List(_) | Value::Node(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Coerce a textual value (as found in markup) into the most specific
    /// variant: `true`/`false`, integers, floats, otherwise a string.
    /// Zero-padded numbers such as `007` stay strings.
    pub fn parse_literal(text: &str) -> Value {
        let text = text.trim();
        match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" => Value::Null,
            _ if is_zero_padded(text) => Value::Str(text.to_owned()),
            _ => {
                if let Ok(i) = text.parse::<i64>() {
                    Value::Int(i)
                } else if let Ok(f) = text.parse::<f64>() {
                    if f.is_finite() {
                        Value::Float(f)
                    } else {
                        Value::Str(text.to_owned())
                    }
                } else {
                    Value::Str(text.to_owned())
                }
            }
        }
    }

    /// Equality after coercion: numbers compare numerically across `Int` and
    /// `Float`, strings that parse as numbers or booleans compare against
    /// those, and `Null` equals the empty string.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Value::Null, Value::Str(s)) | (Value::Str(s), Value::Null) => s.is_empty(),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_float() == other.as_float()
            }
            (Value::Str(s), scalar @ (Value::Int(_) | Value::Float(_) | Value::Bool(_)))
            | (scalar @ (Value::Int(_) | Value::Float(_) | Value::Bool(_)), Value::Str(s)) => {
                let parsed = Value::parse_literal(s);
                !matches!(parsed, Value::Str(_)) && parsed.loosely_equals(scalar)
            }
            _ => false,
        }
    }
}

fn is_zero_padded(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let mut chars = digits.chars();
    chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Node(n) => write!(f, "{n:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NodeId> for Value {
    fn from(v: NodeId) -> Self {
        Value::Node(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from("false").is_truthy());
        assert!(Value::from("yes").is_truthy());
        assert!(Value::from(3).is_truthy());
        assert!(Value::List(Vec::new()).is_truthy());
    }

    #[test]
    fn parse_literal_picks_most_specific() {
        assert_eq!(Value::parse_literal("true"), Value::Bool(true));
        assert_eq!(Value::parse_literal(" 42 "), Value::Int(42));
        assert_eq!(Value::parse_literal("1.5"), Value::Float(1.5));
        assert_eq!(Value::parse_literal("null"), Value::Null);
        assert_eq!(Value::parse_literal("hello"), Value::from("hello"));
        assert_eq!(Value::parse_literal("inf"), Value::from("inf"));
    }

    #[test]
    fn zero_padded_numbers_stay_strings() {
        assert_eq!(Value::parse_literal("007"), Value::from("007"));
        assert_eq!(Value::parse_literal("-01"), Value::from("-01"));
        assert_eq!(Value::parse_literal("00.5"), Value::from("00.5"));
        assert_eq!(Value::parse_literal("0"), Value::Int(0));
        assert_eq!(Value::parse_literal("0.5"), Value::Float(0.5));
        assert_eq!(Value::parse_literal("-0.25"), Value::Float(-0.25));
    }

    #[test]
    fn strict_equality_distinguishes_types() {
        assert_ne!(Value::from(1), Value::from("1"));
        assert_ne!(Value::from(1), Value::from(1.0));
    }

    #[test]
    fn loose_equality_coerces() {
        assert!(Value::from(1).loosely_equals(&Value::from("1")));
        assert!(Value::from("2.5").loosely_equals(&Value::from(2.5)));
        assert!(Value::from(1).loosely_equals(&Value::from(1.0)));
        assert!(Value::from(true).loosely_equals(&Value::from("true")));
        assert!(Value::Null.loosely_equals(&Value::from("")));
        assert!(!Value::from("abc").loosely_equals(&Value::from(0)));
        assert!(!Value::from(1).loosely_equals(&Value::from(2)));
    }

    #[test]
    fn display_formats_lists() {
        let v = Value::from(vec![1, 2, 3]);
        assert_eq!(v.to_string(), "1,2,3");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }
}
