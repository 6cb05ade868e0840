use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A scalar value produced by a format adapter or computed by a function.
///
/// Mirrors spec §3's "Scalar coercion": a bare string read off the wire is
/// coerced into one of these via [`Value::coerce_str`] before any condition
/// or function sees it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// `NULL`.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// A decimal integer.
    Int(i64),
    /// A decimal or exponent-notation float.
    Float(f64),
    /// Anything that didn't coerce to one of the above.
    Str(String),
}

impl Value {
    /// Coerces a raw string the way every format adapter's cell value does
    /// before it reaches a condition or projection: decimal integers,
    /// decimal/exponent floats, case-insensitive `true`/`false`, case-
    /// insensitive `null`, otherwise the string itself.
    pub fn coerce_str(s: &str) -> Value {
        if s.eq_ignore_ascii_case("null") {
            return Value::Null;
        }
        if s.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
        if looks_like_float(s) {
            if let Ok(f) = s.parse::<f64>() {
                return Value::Float(f);
            }
        }
        Value::Str(s.to_owned())
    }

    /// True for any numeric-like value (`Int` or `Float`).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Coerces to `f64`, for use by math/aggregate functions.
    ///
    /// Returns `None` for non-numeric values; callers turn that into
    /// [`crate::Error::Type`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Renders the value the way `GROUP_CONCAT`/`CONCAT`/canonical-serialization
    /// dedup keys want it: strings unquoted, numbers in their natural form,
    /// `NULL` as the empty string.
    pub fn coerce_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coerce_string())
    }
}

fn looks_like_float(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut i = 0;
    if bytes[i] == b'+' || bytes[i] == b'-' {
        i += 1;
    }
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if !seen_exp && seen_digit => {
                seen_exp = true;
                if i + 1 < bytes.len() && (bytes[i + 1] == b'+' || bytes[i + 1] == b'-') {
                    i += 1;
                }
            }
            _ => return false,
        }
        i += 1;
    }
    seen_digit && (seen_dot || seen_exp)
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}

/// Three-way comparison used by `ORDER BY` and by comparison operators.
///
/// Per spec §3: "Numeric comparisons coerce both sides when both are
/// numeric-like; otherwise string compare." `Null` sorts as less than any
/// other value (spec §4.6 step 4).
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (a, b) if a.is_numeric() && b.is_numeric() => {
            let (a, b) = (a.as_f64().unwrap(), b.as_f64().unwrap());
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (a, b) => a.coerce_string().cmp(&b.coerce_string()),
    }
}

/// A recursive row value: either a leaf [`Value`], an ordered mapping of
/// further rows keyed by string (insertion order preserved, per spec §3), or
/// an ordered sequence of rows.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Row {
    /// A leaf scalar.
    Scalar(Value),
    /// An ordered mapping from string key to row.
    Map(IndexMap<String, Row>),
    /// An ordered sequence of rows.
    Seq(Vec<Row>),
}

impl Row {
    /// Shorthand for a null scalar row.
    pub fn null() -> Row {
        Row::Scalar(Value::Null)
    }

    /// The leaf scalar, if this row is one. Maps and sequences return `None`.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Row::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// The mapping, if this row is one.
    pub fn as_map(&self) -> Option<&IndexMap<String, Row>> {
        match self {
            Row::Map(m) => Some(m),
            _ => None,
        }
    }

    /// The sequence, if this row is one.
    pub fn as_seq(&self) -> Option<&[Row]> {
        match self {
            Row::Seq(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Value> for Row {
    fn from(v: Value) -> Self {
        Row::Scalar(v)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Row::Scalar(v) => write!(f, "{}", v),
            Row::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Row::Seq(s) => {
                write!(f, "[")?;
                for (i, v) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}
