// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compiled property functions.
//!
//! A style declaration compiles once into a [`PropertyFunction`], a pure
//! function of `(zoom, attributes)`. Literal declarations compile to a
//! constant. Stop lists compile to a zoom function whose [`FunctionKind`] is
//! fixed by the property table:
//!
//! - [`FunctionKind::Interpolated`] interpolates numeric values (and numeric
//!   arrays element-wise) between the surrounding stops, clamping outside the
//!   first and last stop.
//! - [`FunctionKind::PiecewiseConstant`] selects the value of the greatest
//!   stop not above the query.
//!
//! Declarations with a `"property"` key are attribute driven: they read the
//! named feature attribute instead of the zoom level.
//!
//! ```rust
//! use understory_map_style::{FunctionKind, PropertyFunction, Value};
//!
//! let width = PropertyFunction::compile(
//!     &serde_json::json!({"stops": [[0, 1], [10, 11]]}),
//!     FunctionKind::Interpolated,
//! );
//! let no_attributes: [(&str, Value); 0] = [];
//! assert_eq!(width.evaluate_number(5.0, &no_attributes[..]), Some(6.0));
//! ```

use alloc::borrow::Cow;
use alloc::sync::Arc;
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::math;
use crate::value::{Attributes, Value};

/// How a stop list is evaluated between stops.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Continuous interpolation between stops.
    Interpolated,
    /// Step function: the greatest stop not above the input wins.
    PiecewiseConstant,
}

/// Numeric stops: `(input, output)` pairs sorted by input.
pub type Stops = SmallVec<[(f64, Value); 4]>;

/// A compiled, pure property function of `(zoom, attributes)`.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyFunction {
    /// A literal value; zoom and attributes are ignored.
    Constant(Value),
    /// A function of the zoom level.
    Zoom(ZoomFunction),
    /// A function of one feature attribute.
    Attribute(AttributeFunction),
}

/// A stop-list function of the zoom level.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomFunction {
    kind: FunctionKind,
    base: f64,
    stops: Stops,
}

/// A stop-list function of one feature attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeFunction {
    attribute: Arc<str>,
    mode: AttributeMode,
    default: Value,
}

/// How an [`AttributeFunction`] maps the attribute to an output.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeMode {
    /// Interpolates between numeric stops (`"type": "exponential"`).
    Exponential {
        /// Exponential base; `1` is linear.
        base: f64,
        /// Numeric stops.
        stops: Stops,
    },
    /// Step function over numeric stops (`"type": "interval"`).
    Interval {
        /// Numeric stops.
        stops: Stops,
    },
    /// Exact match against stop inputs (`"type": "categorical"`).
    Categorical {
        /// `(input, output)` pairs.
        stops: Vec<(Value, Value)>,
    },
    /// The attribute value itself (`"type": "identity"`).
    Identity,
}

impl PropertyFunction {
    /// Compiles a raw declaration.
    ///
    /// Objects with a `"stops"` array compile to stop functions (attribute
    /// driven when a `"property"` key is present); anything else is a literal.
    #[must_use]
    pub fn compile(raw: &serde_json::Value, kind: FunctionKind) -> Self {
        Self::compile_with_fallback(raw, kind, None)
    }

    /// Like [`compile`](Self::compile), with the value a function yields when
    /// the declaration has no `"default"` of its own.
    ///
    /// Property declarations pass the property's table default here, so an
    /// attribute function falls back to it for features without the attribute.
    #[must_use]
    pub fn compile_with_fallback(
        raw: &serde_json::Value,
        kind: FunctionKind,
        fallback: Option<Value>,
    ) -> Self {
        let Some(object) = raw.as_object() else {
            return Self::Constant(Value::from(raw));
        };
        let base = object
            .get("base")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(1.0);
        let default = object
            .get("default")
            .map(Value::from)
            .or(fallback)
            .unwrap_or_default();
        let stops = object.get("stops").and_then(serde_json::Value::as_array);

        if let Some(attribute) = object.get("property").and_then(serde_json::Value::as_str) {
            let function_type = object.get("type").and_then(serde_json::Value::as_str);
            let mode = match (function_type, kind) {
                (Some("identity"), _) => AttributeMode::Identity,
                (Some("categorical"), _) => AttributeMode::Categorical {
                    stops: stops
                        .into_iter()
                        .flatten()
                        .filter_map(|stop| {
                            let [input, output] = stop.as_array()?.as_slice() else {
                                return None;
                            };
                            Some((Value::from(input), Value::from(output)))
                        })
                        .collect(),
                },
                (Some("interval"), _) | (None, FunctionKind::PiecewiseConstant) => {
                    AttributeMode::Interval {
                        stops: numeric_stops(stops),
                    }
                }
                _ => AttributeMode::Exponential {
                    base,
                    stops: numeric_stops(stops),
                },
            };
            return Self::Attribute(AttributeFunction {
                attribute: Arc::from(attribute),
                mode,
                default,
            });
        }

        let stops = numeric_stops(stops);
        if stops.is_empty() {
            return Self::Constant(default);
        }
        Self::Zoom(ZoomFunction { kind, base, stops })
    }

    /// Evaluates the function, borrowing the result where possible.
    pub fn evaluate<'a, A: Attributes + ?Sized>(
        &'a self,
        zoom: f64,
        attributes: &A,
    ) -> Cow<'a, Value> {
        match self {
            Self::Constant(value) => Cow::Borrowed(value),
            Self::Zoom(function) => function.evaluate(zoom),
            Self::Attribute(function) => function.evaluate(attributes),
        }
    }

    /// Evaluates the function and expects a number.
    pub fn evaluate_number<A: Attributes + ?Sized>(&self, zoom: f64, attributes: &A) -> Option<f64> {
        self.evaluate(zoom, attributes).as_f64()
    }

    /// Returns the attribute this function reads, if it is attribute driven.
    #[must_use]
    pub fn referenced_attribute(&self) -> Option<&str> {
        match self {
            Self::Attribute(function) => Some(&function.attribute),
            _ => None,
        }
    }

    /// Rewrites every possible output of this function.
    ///
    /// Used at compile time to resolve font stacks ahead of evaluation.
    pub(crate) fn map_outputs(&mut self, mut f: impl FnMut(&Value) -> Value) {
        let rewrite = |stops: &mut Stops, f: &mut dyn FnMut(&Value) -> Value| {
            for (_, output) in stops.iter_mut() {
                *output = f(output);
            }
        };
        match self {
            Self::Constant(value) => *value = f(value),
            Self::Zoom(function) => rewrite(&mut function.stops, &mut f),
            Self::Attribute(function) => {
                match &mut function.mode {
                    AttributeMode::Exponential { stops, .. } | AttributeMode::Interval { stops } => {
                        rewrite(stops, &mut f);
                    }
                    AttributeMode::Categorical { stops } => {
                        for (_, output) in stops.iter_mut() {
                            *output = f(output);
                        }
                    }
                    AttributeMode::Identity => {}
                }
                if !function.default.is_null() {
                    function.default = f(&function.default);
                }
            }
        }
    }
}

impl ZoomFunction {
    /// Returns the function kind.
    #[must_use]
    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Returns the stops.
    #[must_use]
    pub fn stops(&self) -> &[(f64, Value)] {
        &self.stops
    }

    fn evaluate(&self, zoom: f64) -> Cow<'_, Value> {
        match self.kind {
            FunctionKind::Interpolated => interpolate(&self.stops, zoom, self.base),
            FunctionKind::PiecewiseConstant => Cow::Borrowed(step(&self.stops, zoom)),
        }
    }
}

impl AttributeFunction {
    /// Returns the attribute this function reads.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Returns how the attribute maps to an output.
    #[must_use]
    pub fn mode(&self) -> &AttributeMode {
        &self.mode
    }

    fn evaluate<A: Attributes + ?Sized>(&self, attributes: &A) -> Cow<'_, Value> {
        let Some(input) = attributes.get(&self.attribute) else {
            return Cow::Borrowed(&self.default);
        };
        match &self.mode {
            AttributeMode::Identity => Cow::Owned(input.clone()),
            AttributeMode::Categorical { stops } => stops
                .iter()
                .find(|(candidate, _)| candidate.loose_eq(input))
                .map_or(Cow::Borrowed(&self.default), |(_, output)| {
                    Cow::Borrowed(output)
                }),
            AttributeMode::Exponential { base, stops } => match input.to_number() {
                Some(n) if !stops.is_empty() => interpolate(stops, n, *base),
                _ => Cow::Borrowed(&self.default),
            },
            AttributeMode::Interval { stops } => match input.to_number() {
                Some(n) if !stops.is_empty() => Cow::Borrowed(step(stops, n)),
                _ => Cow::Borrowed(&self.default),
            },
        }
    }
}

fn numeric_stops(stops: Option<&Vec<serde_json::Value>>) -> Stops {
    let mut parsed: Stops = stops
        .into_iter()
        .flatten()
        .filter_map(|stop| {
            let [input, output] = stop.as_array()?.as_slice() else {
                return None;
            };
            Some((input.as_f64()?, Value::from(output)))
        })
        .collect();
    parsed.sort_by(|a, b| a.0.total_cmp(&b.0));
    parsed
}

/// Value of the greatest stop not above `input`; the first stop below all
/// and for NaN.
///
/// `stops` must not be empty.
fn step(stops: &[(f64, Value)], input: f64) -> &Value {
    let mut selected = &stops[0].1;
    for (stop, value) in stops {
        if *stop <= input {
            selected = value;
        } else {
            break;
        }
    }
    selected
}

/// Interpolates between the stops surrounding `input`, clamping at the ends.
///
/// NaN is treated as below the first stop. Outputs that cannot be interpolated fall back to the lower stop.
/// `stops` must not be empty.
fn interpolate(stops: &[(f64, Value)], input: f64, base: f64) -> Cow<'_, Value> {
    let (first, last) = (&stops[0], &stops[stops.len() - 1]);
    if input.is_nan() || input <= first.0 {
        return Cow::Borrowed(&first.1);
    }
    if input >= last.0 {
        return Cow::Borrowed(&last.1);
    }
    let upper = stops.partition_point(|(stop, _)| *stop <= input);
    let (lower_stop, lower) = &stops[upper - 1];
    let (upper_stop, upper) = &stops[upper];
    let t = interpolation_factor(input, *lower_stop, *upper_stop, base);
    interpolate_value(lower, upper, t).map_or(Cow::Borrowed(lower), Cow::Owned)
}

fn interpolation_factor(input: f64, lower: f64, upper: f64, base: f64) -> f64 {
    let range = upper - lower;
    if range == 0.0 {
        return 0.0;
    }
    let progress = input - lower;
    if base == 1.0 {
        progress / range
    } else {
        (math::powf(base, progress) - 1.0) / (math::powf(base, range) - 1.0)
    }
}

fn interpolate_value(lower: &Value, upper: &Value, t: f64) -> Option<Value> {
    match (lower, upper) {
        (Value::Number(a), Value::Number(b)) => Some(Value::Number(a + (b - a) * t)),
        (Value::Array(a), Value::Array(b)) if a.len() == b.len() => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| Some(Value::Number(x.as_f64()? + (y.as_f64()? - x.as_f64()?) * t)))
            .collect::<Option<Vec<_>>>()
            .map(Value::from),
        _ => None,
    }
}
