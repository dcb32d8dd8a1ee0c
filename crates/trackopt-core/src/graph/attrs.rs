//! Open attribute maps attached to nodes and edges.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute map of a node or edge.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A scalar, string or list attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Numeric value; booleans count as 0 or 1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            AttrValue::Int(value) => Some(*value as f64),
            AttrValue::Float(value) => Some(*value),
            AttrValue::Str(_) | AttrValue::List(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Python-style truthiness: zero, empty and `false` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Bool(value) => *value,
            AttrValue::Int(value) => *value != 0,
            AttrValue::Float(value) => *value != 0.0,
            AttrValue::Str(value) => !value.is_empty(),
            AttrValue::List(values) => !values.is_empty(),
        }
    }

    /// Coordinates of a scalar or a list of numbers.
    pub fn as_vector(&self) -> Option<Vec<f64>> {
        match self {
            AttrValue::List(values) => values.iter().map(AttrValue::as_f64).collect(),
            scalar => scalar.as_f64().map(|value| vec![value]),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(value) => write!(f, "{value}"),
            AttrValue::Int(value) => write!(f, "{value}"),
            AttrValue::Float(value) => write!(f, "{value}"),
            AttrValue::Str(value) => write!(f, "{value:?}"),
            AttrValue::List(values) => {
                f.write_str("[")?;
                for (position, value) in values.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(values: Vec<f64>) -> Self {
        AttrValue::List(values.into_iter().map(AttrValue::Float).collect())
    }
}

/// Builds an [`Attributes`] map from `key => value` pairs.
///
/// ```
/// use trackopt_core::attrs;
///
/// let attributes = attrs! { "t" => 0, "score" => 0.5, "label" => "a" };
/// assert_eq!(attributes.len(), 3);
/// ```
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::graph::Attributes::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut attributes = $crate::graph::Attributes::new();
        $(
            attributes.insert(
                ::std::string::String::from($key),
                $crate::graph::AttrValue::from($value),
            );
        )+
        attributes
    }};
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_views() {
        assert_eq!(AttrValue::from(3).as_f64(), Some(3.0));
        assert_eq!(AttrValue::from(true).as_f64(), Some(1.0));
        assert_eq!(AttrValue::from("x").as_f64(), None);
        assert_eq!(AttrValue::from(2.5).as_i64(), None);
        assert_eq!(AttrValue::from(7).as_i64(), Some(7));
    }

    #[test]
    fn test_truthiness() {
        assert!(!AttrValue::from(false).is_truthy());
        assert!(!AttrValue::from(0).is_truthy());
        assert!(!AttrValue::from("").is_truthy());
        assert!(AttrValue::from(0.1).is_truthy());
        assert!(AttrValue::from("yes").is_truthy());
    }

    #[test]
    fn test_vectors() {
        assert_eq!(AttrValue::from(1.5).as_vector(), Some(vec![1.5]));
        assert_eq!(
            AttrValue::from(vec![1.0, 2.0]).as_vector(),
            Some(vec![1.0, 2.0])
        );
        let mixed = AttrValue::List(vec![AttrValue::from(1.0), AttrValue::from("a")]);
        assert_eq!(mixed.as_vector(), None);
    }

    #[test]
    fn test_untagged_json() {
        let attributes: Attributes =
            serde_json::from_str(r#"{"t": 1, "x": 0.5, "flag": true, "pos": [1, 2.5]}"#)
                .unwrap();
        assert_eq!(attributes["t"], AttrValue::Int(1));
        assert_eq!(attributes["x"], AttrValue::Float(0.5));
        assert_eq!(attributes["flag"], AttrValue::Bool(true));
        assert_eq!(attributes["pos"].as_vector(), Some(vec![1.0, 2.5]));
    }

    #[test]
    fn test_attrs_macro() {
        let attributes = crate::attrs! { "t" => 2, "name" => "cell" };
        assert_eq!(attributes["t"], AttrValue::Int(2));
        assert_eq!(attributes["name"].as_str(), Some("cell"));
        assert!(crate::attrs! {}.is_empty());
    }
}
