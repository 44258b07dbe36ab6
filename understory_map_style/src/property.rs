// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The static paint property table.
//!
//! Every property the evaluator reads is listed here together with its
//! function kind and default value. The function kind is fixed per property
//! name and never inferred from a declaration.

use alloc::sync::Arc;
use alloc::vec;

use crate::function::FunctionKind;
use crate::value::Value;

macro_rules! paint_properties {
    ($($variant:ident => $name:literal, $kind:expr;)*) => {
        /// A paint (or layout) property understood by the evaluator.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum PaintProperty {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )*
        }

        impl PaintProperty {
            /// Every property, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// Number of properties.
            pub const COUNT: usize = Self::ALL.len();

            /// Returns the property's name as written in style documents.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// Looks a property up by name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Returns the function kind declarations of this property compile to.
            ///
            /// `None` for properties that are only ever read as literals.
            #[must_use]
            pub const fn kind(self) -> Option<FunctionKind> {
                match self {
                    $(Self::$variant => $kind,)*
                }
            }
        }
    };
}

const INTERPOLATED: Option<FunctionKind> = Some(FunctionKind::Interpolated);
const PIECEWISE: Option<FunctionKind> = Some(FunctionKind::PiecewiseConstant);

paint_properties! {
    LineMiterLimit => "line-miter-limit", INTERPOLATED;
    FillOpacity => "fill-opacity", INTERPOLATED;
    LineOpacity => "line-opacity", INTERPOLATED;
    LineWidth => "line-width", INTERPOLATED;
    TextHaloWidth => "text-halo-width", INTERPOLATED;
    TextMaxWidth => "text-max-width", INTERPOLATED;
    TextOffset => "text-offset", INTERPOLATED;
    TextSize => "text-size", INTERPOLATED;
    IconOpacity => "icon-opacity", INTERPOLATED;
    IconRotate => "icon-rotate", INTERPOLATED;
    IconSize => "icon-size", INTERPOLATED;
    CircleRadius => "circle-radius", INTERPOLATED;
    FillColor => "fill-color", PIECEWISE;
    FillOutlineColor => "fill-outline-color", PIECEWISE;
    IconImage => "icon-image", PIECEWISE;
    LineCap => "line-cap", PIECEWISE;
    LineColor => "line-color", PIECEWISE;
    LineJoin => "line-join", PIECEWISE;
    LineDasharray => "line-dasharray", PIECEWISE;
    TextAnchor => "text-anchor", PIECEWISE;
    TextColor => "text-color", PIECEWISE;
    TextField => "text-field", PIECEWISE;
    TextFont => "text-font", PIECEWISE;
    TextHaloColor => "text-halo-color", PIECEWISE;
    CircleColor => "circle-color", PIECEWISE;
    CircleStrokeColor => "circle-stroke-color", PIECEWISE;
    FillPattern => "fill-pattern", None;
    LinePattern => "line-pattern", None;
    TextTransform => "text-transform", None;
}

impl PaintProperty {
    /// Returns the value an undeclared property takes, if it has one.
    #[must_use]
    pub fn default_value(self) -> Option<Value> {
        let number = |n: f64| Some(Value::Number(n));
        let string = |s: &str| Some(Value::String(Arc::from(s)));
        match self {
            Self::FillOpacity
            | Self::LineOpacity
            | Self::LineWidth
            | Self::IconOpacity
            | Self::IconSize => number(1.0),
            Self::LineMiterLimit => number(2.0),
            Self::TextHaloWidth | Self::IconRotate => number(0.0),
            Self::TextMaxWidth => number(10.0),
            Self::TextSize => number(16.0),
            Self::LineCap => string(DEFAULT_LINE_CAP),
            Self::LineJoin => string(DEFAULT_LINE_JOIN),
            Self::TextAnchor => string("center"),
            Self::TextColor | Self::CircleColor | Self::CircleStrokeColor => string("#000000"),
            Self::TextHaloColor => string("rgba(0, 0, 0, 0)"),
            Self::TextOffset => Some(Value::from(vec![Value::Number(0.0), Value::Number(0.0)])),
            Self::TextFont => Some(Value::from(vec![
                Value::from("Open Sans Regular"),
                Value::from("Arial Unicode MS Regular"),
            ])),
            Self::CircleRadius
            | Self::FillColor
            | Self::FillOutlineColor
            | Self::IconImage
            | Self::LineColor
            | Self::LineDasharray
            | Self::TextField
            | Self::FillPattern
            | Self::LinePattern
            | Self::TextTransform => None,
        }
    }

    /// Index of this property in dense per-property tables.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Line cap used when none is declared, and for polygon outlines.
pub const DEFAULT_LINE_CAP: &str = "butt";

/// Line join used when none is declared, and for polygon outlines.
pub const DEFAULT_LINE_JOIN: &str = "miter";

/// Miter limit used when none is declared, and for polygon outlines.
pub const DEFAULT_MITER_LIMIT: f64 = 2.0;
