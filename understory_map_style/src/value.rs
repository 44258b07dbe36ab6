// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamically typed values for feature attributes and style literals.
//!
//! Feature attributes and literal style values share one representation,
//! [`Value`]. Strings and arrays are reference counted so that snapshotting
//! an attribute set (see the single-slot style cache) only bumps counts.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::hash::BuildHasher;

/// A dynamically typed attribute or style value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absent or JSON `null`.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. Integers are carried as `f64`, like in the style document.
    Number(f64),
    /// A string.
    String(Arc<str>),
    /// An ordered list of values, e.g. `text-offset` or `line-dasharray`.
    Array(Arc<[Value]>),
}

impl Value {
    /// Returns the number if this is a [`Value::Number`].
    #[must_use]
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string if this is a [`Value::String`].
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`Value::Array`].
    #[must_use]
    #[inline]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Coerces this value to a number the way filter comparisons do.
    ///
    /// Numbers are returned as-is, booleans become `0`/`1`, and strings are
    /// parsed after trimming whitespace. Empty strings, strings that parse to
    /// NaN, arrays and null are not numeric.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
                }
            }
            Self::Null | Self::Array(_) => None,
        }
    }

    /// Loose equality used by `==`, `!=`, `in` and `!in`.
    ///
    /// Values of the same kind compare structurally. A number compares equal
    /// to a string or boolean that coerces to the same number, so `"1" == 1`
    /// and `true == 1`. Null only equals null, and arrays never equal scalars.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
            }
            (Self::Number(_), Self::String(_) | Self::Bool(_))
            | (Self::String(_) | Self::Bool(_), Self::Number(_))
            | (Self::String(_), Self::Bool(_))
            | (Self::Bool(_), Self::String(_)) => match (self.to_number(), other.to_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            _ => false,
        }
    }

    /// Loose ordering used by `<`, `<=`, `>` and `>=`.
    ///
    /// Two strings compare lexicographically; any other pair is coerced to
    /// numbers. Returns `None` when the pair is not comparable (null, arrays,
    /// non-numeric strings against numbers, or NaN).
    #[must_use]
    pub fn loose_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.as_ref().cmp(b.as_ref())),
            _ => self.to_number()?.partial_cmp(&other.to_number()?),
        }
    }
}

impl fmt::Display for Value {
    /// Formats the value the way labels and icon names render it.
    ///
    /// Null renders as an empty string and integral numbers render without a
    /// fractional part. Arrays render comma separated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write_number(f, *n),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
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

#[expect(
    clippy::cast_possible_truncation,
    reason = "integral check: the round trip only succeeds when nothing was truncated"
)]
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    let integral = n as i64;
    if integral as f64 == n && (-1e15..=1e15).contains(&n) {
        write!(f, "{integral}")
    } else {
        write!(f, "{n}")
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::Array(Arc::from(value))
    }
}

impl From<&serde_json::Value> for Value {
    /// Converts a JSON value. Objects have no counterpart and become null.
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null | serde_json::Value::Object(_) => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::from(s.as_str()),
            serde_json::Value::Array(items) => {
                Self::Array(items.iter().map(Self::from).collect())
            }
        }
    }
}

/// Read access to a feature's attributes by name.
///
/// Implemented for the common map types so callers can hand in whatever
/// their feature model already stores.
pub trait Attributes {
    /// Returns the value of the named attribute, if present.
    fn get(&self, key: &str) -> Option<&Value>;
}

impl<A: Attributes + ?Sized> Attributes for &A {
    #[inline]
    fn get(&self, key: &str) -> Option<&Value> {
        (**self).get(key)
    }
}

impl Attributes for BTreeMap<String, Value> {
    #[inline]
    fn get(&self, key: &str) -> Option<&Value> {
        BTreeMap::get(self, key)
    }
}

impl<S: BuildHasher> Attributes for hashbrown::HashMap<String, Value, S> {
    #[inline]
    fn get(&self, key: &str) -> Option<&Value> {
        hashbrown::HashMap::get(self, key)
    }
}

#[cfg(feature = "std")]
impl<S: BuildHasher> Attributes for std::collections::HashMap<String, Value, S> {
    #[inline]
    fn get(&self, key: &str) -> Option<&Value> {
        std::collections::HashMap::get(self, key)
    }
}

impl<K: AsRef<str>> Attributes for [(K, Value)] {
    fn get(&self, key: &str) -> Option<&Value> {
        self.iter()
            .find(|(name, _)| name.as_ref() == key)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn numeric_strings_loosely_equal_numbers() {
        assert!(Value::from("1").loose_eq(&Value::from(1)));
        assert!(Value::from(2.5).loose_eq(&Value::from(" 2.5 ")));
        assert!(!Value::from("one").loose_eq(&Value::from(1)));
        assert!(!Value::from("").loose_eq(&Value::from(0)));
    }

    #[test]
    fn nan_strings_are_not_numeric() {
        assert_eq!(Value::from("NaN").to_number(), None);
        assert_eq!(Value::from(" nan ").to_number(), None);
        assert_eq!(Value::from("inf").to_number(), Some(f64::INFINITY));
        assert!(!Value::from("NaN").loose_eq(&Value::from(f64::NAN)));
    }

    #[test]
    fn booleans_coerce_to_zero_or_one() {
        assert!(Value::from(true).loose_eq(&Value::from(1)));
        assert!(Value::from(false).loose_eq(&Value::from("0")));
        assert!(!Value::from(true).loose_eq(&Value::from("true")));
    }

    #[test]
    fn null_only_equals_null() {
        assert!(Value::Null.loose_eq(&Value::Null));
        assert!(!Value::Null.loose_eq(&Value::from(0)));
        assert!(!Value::Null.loose_eq(&Value::from("")));
    }

    #[test]
    fn ordering_is_lexicographic_for_strings_numeric_otherwise() {
        assert_eq!(
            Value::from("10").loose_cmp(&Value::from("9")),
            Some(Ordering::Less),
            "two strings compare lexicographically"
        );
        assert_eq!(
            Value::from("10").loose_cmp(&Value::from(9)),
            Some(Ordering::Greater),
            "mixed pairs compare numerically"
        );
        assert_eq!(Value::from("abc").loose_cmp(&Value::from(9)), None);
        assert_eq!(Value::Null.loose_cmp(&Value::from(9)), None);
    }

    #[test]
    fn display_drops_integral_fraction() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(-2.0).to_string(), "-2");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(
            Value::from(vec![Value::from(1), Value::from("a")]).to_string(),
            "1,a"
        );
    }

    #[test]
    fn json_conversion() {
        let json = serde_json::json!(["a", 1, true, null, {"k": 1}]);
        let value = Value::from(&json);
        let items = value.as_array().expect("array converts to array");
        assert_eq!(items[0], Value::from("a"));
        assert_eq!(items[1], Value::from(1));
        assert_eq!(items[2], Value::from(true));
        assert!(items[3].is_null());
        assert!(items[4].is_null(), "objects have no value counterpart");
    }

    #[test]
    fn slice_attributes_lookup() {
        let attrs = [("class", Value::from("road")), ("rank", Value::from(3))];
        assert_eq!(Attributes::get(&attrs[..], "rank"), Some(&Value::from(3)));
        assert_eq!(Attributes::get(&attrs[..], "missing"), None);
    }
}
