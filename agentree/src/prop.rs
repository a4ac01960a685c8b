//! Prop-bag values.
//!
//! `Node::props` holds arbitrary values. The serializer distinguishes
//! "scalar" values (formatted as their own string form) from "compound"
//! values (JSON-encoded) and excludes callbacks and absent/null values
//! from serialization entirely. [`PropValue`] models exactly that split.

use std::fmt;
use std::sync::Arc;

/// A single prop value. Cloning a `Callback` clones the `Arc`, not the
/// closure; two callbacks are equal only if they share the same
/// allocation (`Arc::ptr_eq`), since closures have no structural
/// equality.
#[derive(Clone)]
pub enum PropValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Arrays/objects/anything else JSON-shaped; formatted via
    /// `serde_json::to_string`.
    Json(serde_json::Value),
    /// A prop whose value is a function. Always excluded from
    /// serialization by the attribute filter.
    Callback(Arc<dyn Fn(&[PropValue]) + Send + Sync>),
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "Null"),
            PropValue::Bool(b) => write!(f, "Bool({b})"),
            PropValue::Int(i) => write!(f, "Int({i})"),
            PropValue::Float(n) => write!(f, "Float({n})"),
            PropValue::Str(s) => write!(f, "Str({s:?})"),
            PropValue::Json(v) => write!(f, "Json({v})"),
            PropValue::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Json(a), PropValue::Json(b)) => a == b,
            (PropValue::Callback(a), PropValue::Callback(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PropValue {
    /// Is this prop value a function? Always filtered out of attribute
    /// output, regardless of key name.
    pub fn is_callback(&self) -> bool {
        matches!(self, PropValue::Callback(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    /// Render this value the way an attribute value is formatted before
    /// entity-escaping: scalars as their own string form, compound
    /// values JSON-encoded. Returns `None` for callbacks (callers must
    /// filter those out before reaching formatting at all).
    pub fn format(&self) -> Option<String> {
        match self {
            PropValue::Null => None,
            PropValue::Bool(b) => Some(b.to_string()),
            PropValue::Int(i) => Some(i.to_string()),
            PropValue::Float(n) => Some(format_float(*n)),
            PropValue::Str(s) => Some(s.clone()),
            PropValue::Json(v) => Some(serde_json::to_string(v).unwrap_or_default()),
            PropValue::Callback(_) => None,
        }
    }
}

fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropValue::Null,
            serde_json::Value::Bool(b) => PropValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PropValue::Int(i)
                } else {
                    PropValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => PropValue::Str(s),
            compound => PropValue::Json(compound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_equality_is_nan_safe() {
        let a = PropValue::Float(f64::NAN);
        let b = PropValue::Float(f64::NAN);
        assert_eq!(a, b);
    }

    #[test]
    fn callbacks_compare_by_pointer() {
        let f: Arc<dyn Fn(&[PropValue]) + Send + Sync> = Arc::new(|_| {});
        let a = PropValue::Callback(f.clone());
        let b = PropValue::Callback(f);
        assert_eq!(a, b);
        let c = PropValue::Callback(Arc::new(|_| {}));
        assert_ne!(a, c);
    }

    #[test]
    fn compound_values_format_as_json() {
        let v = PropValue::Json(serde_json::json!({"a": 1, "b": [1,2]}));
        assert_eq!(v.format().unwrap(), r#"{"a":1,"b":[1,2]}"#);
    }
}
