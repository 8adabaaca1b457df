//! Argument values and type constraints.
//!
//! [`Value`] is what the capture builder produces from raw tokens and what
//! handlers finally receive. [`ValueType`] is the constraint a parameter
//! declares; coercion from a raw token to the declared type happens at
//! match time, per candidate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single argument value.
///
/// Raw tokens arrive as `String`, bare boolean flags as `Boolean`. The
/// other variants are produced by [`ValueType::coerce`].
///
/// # Example
///
/// ```
/// use mainsig::{Value, ValueType};
///
/// let raw = Value::from("42");
/// assert_eq!(ValueType::Integer.coerce(&raw), Some(Value::Integer(42)));
/// assert_eq!(ValueType::Boolean.coerce(&raw), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Text value, including every unconverted raw token.
    String(String),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Boolean, produced by bare `--flag` / `--no-flag` tokens.
    Boolean(bool),
    /// Ordered list, produced by list coercion and variadic parameters.
    List(Vec<Value>),
}

impl Value {
    /// Short lowercase name of the variant, used in mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
        }
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the integer value, if present.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts a float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extracts the list items, if present.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
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

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Type constraint declared by a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValueType {
    /// Any scalar rendered as text.
    String,
    /// Parsed as `i64`.
    Integer,
    /// Parsed as `f64`; integers widen.
    Float,
    /// `true/false`, `yes/no`, `on/off`, `1/0`, or a bare flag.
    Boolean,
    /// Comma-separated list whose items coerce to the inner type.
    List(Box<ValueType>),
    /// One of a fixed set of strings.
    Choice(Vec<String>),
    /// No constraint; the value passes through unchanged.
    #[default]
    Any,
}

impl ValueType {
    /// Shorthand for `ValueType::List(Box::new(inner))`.
    pub fn list_of(inner: ValueType) -> Self {
        ValueType::List(Box::new(inner))
    }

    /// Shorthand for a [`ValueType::Choice`] over string slices.
    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueType::Choice(choices.into_iter().map(Into::into).collect())
    }

    /// Returns true for [`ValueType::Boolean`].
    pub fn is_boolean(&self) -> bool {
        matches!(self, ValueType::Boolean)
    }

    /// Converts `value` to this type, or returns `None` if it cannot.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ValueType::Any, v) => Some(v.clone()),

            (ValueType::String, Value::String(s)) => Some(Value::String(s.clone())),
            (ValueType::String, Value::Integer(_) | Value::Float(_)) => {
                Some(Value::String(value.to_string()))
            }

            (ValueType::Integer, Value::Integer(n)) => Some(Value::Integer(*n)),
            (ValueType::Integer, Value::String(s)) => s.trim().parse().ok().map(Value::Integer),

            (ValueType::Float, Value::Float(x)) => Some(Value::Float(*x)),
            (ValueType::Float, Value::Integer(n)) => Some(Value::Float(*n as f64)),
            (ValueType::Float, Value::String(s)) => s
                .trim()
                .parse()
                .ok()
                .filter(|x: &f64| x.is_finite())
                .map(Value::Float),

            (ValueType::Boolean, Value::Boolean(b)) => Some(Value::Boolean(*b)),
            (ValueType::Boolean, Value::String(s)) => parse_bool(s).map(Value::Boolean),

            (ValueType::Choice(choices), Value::String(s)) => choices
                .iter()
                .any(|c| c == s)
                .then(|| Value::String(s.clone())),

            (ValueType::List(inner), Value::List(items)) => items
                .iter()
                .map(|item| inner.coerce(item))
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            (ValueType::List(_), Value::String(s)) if s.is_empty() => Some(Value::List(Vec::new())),
            (ValueType::List(inner), Value::String(s)) => s
                .split(',')
                .map(|part| inner.coerce(&Value::String(part.to_string())))
                .collect::<Option<Vec<_>>>()
                .map(Value::List),

            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => f.write_str("String"),
            ValueType::Integer => f.write_str("Integer"),
            ValueType::Float => f.write_str("Float"),
            ValueType::Boolean => f.write_str("Boolean"),
            ValueType::List(inner) => write!(f, "List<{inner}>"),
            ValueType::Choice(choices) => f.write_str(&choices.join("|")),
            ValueType::Any => f.write_str("Any"),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
