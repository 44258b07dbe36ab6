// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Boolean filter expressions selecting the features a layer applies to.
//!
//! Filters are parsed once from their JSON array form into a [`Filter`] tree
//! and then evaluated by recursive descent against an attribute set:
//!
//! ```rust
//! use understory_map_style::{Filter, Value};
//!
//! let filter = Filter::parse(&serde_json::json!(
//!     ["all", ["==", "class", "road"], [">", "rank", 2]]
//! ));
//! let attrs = [("class", Value::from("road")), ("rank", Value::from(3))];
//! assert!(filter.evaluate(&attrs[..]));
//! ```

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;

use hashbrown::HashSet;

use crate::value::{Attributes, Value};

/// Comparison operator of a [`Filter::Compare`] leaf.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl CompareOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            _ => return None,
        })
    }
}

/// A parsed filter expression. Immutable once parsed.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Compares one attribute against a literal.
    Compare {
        /// The operator.
        op: CompareOp,
        /// Attribute name.
        key: Arc<str>,
        /// Literal to compare against.
        value: Value,
    },
    /// `in` / `!in`: (non-)membership of one attribute in a literal set.
    In {
        /// Attribute name.
        key: Arc<str>,
        /// Candidate literals.
        values: Vec<Value>,
        /// `true` for `!in`.
        negate: bool,
    },
    /// `has` / `!has`: presence of one attribute.
    Has {
        /// Attribute name.
        key: Arc<str>,
        /// `true` for `!has`.
        negate: bool,
    },
    /// Logical AND over the children.
    All(Vec<Filter>),
    /// Logical OR over the children.
    Any(Vec<Filter>),
    /// Logical NOR over the children.
    None(Vec<Filter>),
    /// An operator this crate does not know, or a malformed expression.
    ///
    /// Never matches.
    Unknown(String),
}

impl Filter {
    /// Parses a filter from its JSON array form.
    ///
    /// Parsing never fails: malformed or unsupported expressions become
    /// [`Filter::Unknown`] nodes, which evaluate to `false`.
    #[must_use]
    pub fn parse(json: &serde_json::Value) -> Self {
        let Some(items) = json.as_array() else {
            return Self::Unknown(json.to_string());
        };
        let Some(op) = items.first().and_then(serde_json::Value::as_str) else {
            return Self::Unknown(json.to_string());
        };
        let key = || {
            items
                .get(1)
                .and_then(serde_json::Value::as_str)
                .map(Arc::<str>::from)
        };
        let parsed = match op {
            "all" | "any" | "none" => {
                let children = items[1..].iter().map(Self::parse).collect();
                Some(match op {
                    "all" => Self::All(children),
                    "any" => Self::Any(children),
                    _ => Self::None(children),
                })
            }
            "in" | "!in" => key().map(|key| Self::In {
                key,
                values: items[2..].iter().map(Value::from).collect(),
                negate: op == "!in",
            }),
            "has" | "!has" if items.len() == 2 => key().map(|key| Self::Has {
                key,
                negate: op == "!has",
            }),
            _ => match CompareOp::from_symbol(op) {
                Some(op) if items.len() == 3 => key().map(|key| Self::Compare {
                    op,
                    key,
                    value: Value::from(&items[2]),
                }),
                _ => None,
            },
        };
        parsed.unwrap_or_else(|| Self::Unknown(op.to_string()))
    }

    /// Evaluates the filter against a feature's attributes.
    pub fn evaluate<A: Attributes + ?Sized>(&self, attributes: &A) -> bool {
        match self {
            Self::Compare { op, key, value } => {
                let Some(actual) = attributes.get(key) else {
                    return *op == CompareOp::Ne;
                };
                match op {
                    CompareOp::Eq => actual.loose_eq(value),
                    CompareOp::Ne => !actual.loose_eq(value),
                    CompareOp::Gt => actual.loose_cmp(value) == Some(Ordering::Greater),
                    CompareOp::Lt => actual.loose_cmp(value) == Some(Ordering::Less),
                    CompareOp::Ge => matches!(
                        actual.loose_cmp(value),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    CompareOp::Le => matches!(
                        actual.loose_cmp(value),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                }
            }
            Self::In {
                key,
                values,
                negate,
            } => {
                let found = attributes
                    .get(key)
                    .is_some_and(|actual| values.iter().any(|v| actual.loose_eq(v)));
                found != *negate
            }
            Self::Has { key, negate } => attributes.get(key).is_some() != *negate,
            Self::All(children) => children.iter().all(|c| c.evaluate(attributes)),
            Self::Any(children) => children.iter().any(|c| c.evaluate(attributes)),
            Self::None(children) => !children.iter().any(|c| c.evaluate(attributes)),
            Self::Unknown(_) => false,
        }
    }

    /// Records every attribute name referenced by a leaf of this filter.
    ///
    /// This is a static walk; nothing is evaluated.
    pub fn collect_referenced_attributes(&self, seen: &mut HashSet<String>) {
        match self {
            Self::Compare { key, .. } | Self::In { key, .. } | Self::Has { key, .. } => {
                if !seen.contains(key.as_ref()) {
                    seen.insert(key.to_string());
                }
            }
            Self::All(children) | Self::Any(children) | Self::None(children) => {
                for child in children {
                    child.collect_referenced_attributes(seen);
                }
            }
            Self::Unknown(_) => {}
        }
    }

    /// Returns the set of attribute names referenced by this filter.
    #[must_use]
    pub fn referenced_attributes(&self) -> HashSet<String> {
        let mut seen = HashSet::new();
        self.collect_referenced_attributes(&mut seen);
        seen
    }

    /// Calls `f` with the operator of every [`Filter::Unknown`] node.
    pub(crate) fn for_each_unknown(&self, f: &mut impl FnMut(&str)) {
        match self {
            Self::Unknown(op) => f(op),
            Self::All(children) | Self::Any(children) | Self::None(children) => {
                for child in children {
                    child.for_each_unknown(f);
                }
            }
            _ => {}
        }
    }
}
