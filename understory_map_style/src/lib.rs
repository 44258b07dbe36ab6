// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Map Style: compile vector map style documents into per-feature
//! draw instructions.
//!
//! A style document is an ordered list of layers. Each layer has a filter
//! over feature attributes, a zoom range, and paint/layout properties whose
//! values may vary with zoom or with feature attributes. This crate compiles
//! such a document once into a [`StyleEvaluator`] and then answers, at high
//! frequency, "how should this feature be drawn at this resolution?" with a
//! list of [`DrawInstruction`]s.
//!
//! It does not render, load documents, fetch sprites or measure text.
//! Measurement is injected through [`TextMeasurer`]; color parsing through
//! [`ColorParser`] (CSS syntax via `peniko` by default).
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_map_style::{
//!     DrawInstruction, FeatureSnapshot, GeometryType, StyleEvaluatorBuilder,
//! };
//!
//! let style = r##"{
//!     "version": 8,
//!     "layers": [
//!         {"id": "water", "type": "fill", "source-layer": "water",
//!          "paint": {"fill-color": "#0000ff", "fill-opacity": 0.5}},
//!         {"id": "roads", "type": "line", "source-layer": "roads",
//!          "filter": ["==", "class", "motorway"],
//!          "paint": {"line-color": "red", "line-width": {"stops": [[5, 1], [15, 5]]}}}
//!     ]
//! }"##;
//!
//! // Every character is eight pixels wide.
//! let measure = |_font: &str, text: &str| text.len() as f64 * 8.0;
//! let mut evaluator = StyleEvaluatorBuilder::new()
//!     .build_from_json(style, measure)
//!     .unwrap();
//!
//! let road = FeatureSnapshot::new(GeometryType::LineString)
//!     .with_source_layer("roads")
//!     .with_attribute("class", "motorway");
//! let instructions = evaluator.resolve_at_zoom(&road, 10.0);
//! let [DrawInstruction::Stroke(line)] = instructions else {
//!     panic!("expected one stroke");
//! };
//! assert_eq!(line.stroke.width, 3.0);
//! assert_eq!(line.z_index, 1);
//!
//! // The same feature again is answered from the cache.
//! evaluator.resolve_at_zoom(&road, 10.0);
//! assert_eq!(evaluator.revision(), 1);
//! assert_eq!(evaluator.cache_hits(), 1);
//! ```
//!
//! ## Pipeline
//!
//! - [`StyleDocument`] deserializes and validates the document (version 8
//!   only).
//! - [`preprocess()`] resolves `ref` layers, merges layout into paint, fills in
//!   defaults, resolves font stacks and compiles every property into a
//!   [`PropertyFunction`].
//! - [`StyleEvaluator::resolve`] maps the resolution to a zoom with
//!   [`resolution_to_zoom`], consults the single-slot [`StyleCache`], and on a
//!   miss evaluates each candidate layer's [`Filter`] and properties into an
//!   [`InstructionPool`].
//!
//! ## Caching
//!
//! The evaluator keeps exactly one cache entry: the zoom and the values of the
//! attributes that can influence the output (filter keys, template
//! placeholders, attribute-driven functions, `$type` and `layer`). Consecutive
//! features that agree on all of these get the previous instructions back
//! without any evaluation. Memoized colors, fonts, wrapped text, icons and
//! circles live as long as the evaluator.
//!
//! ## Features
//!
//! - `std` (enabled by default): use the standard library's float functions.
//! - `libm`: use `libm` instead, for `no_std` targets. One of the two is
//!   required.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod cache;
mod color;
mod document;
mod error;
mod evaluator;
mod feature;
mod filter;
mod function;
mod instruction;
mod math;
mod preprocess;
mod property;
mod sprite;
mod text;
mod value;
mod zoom;

pub use cache::StyleCache;
pub use color::{ColorCache, ColorParser, parse_css_color, with_opacity};
pub use document::{Layer, LayerSelection, SUPPORTED_VERSION, StyleDocument};
pub use error::StyleError;
pub use evaluator::{StyleEvaluator, StyleEvaluatorBuilder};
pub use feature::{
    Feature, FeatureSnapshot, GEOMETRY_TYPE_ATTRIBUTE, GeometryType, SOURCE_LAYER_ATTRIBUTE,
};
pub use filter::{CompareOp, Filter};
pub use function::{
    AttributeFunction, AttributeMode, FunctionKind, PropertyFunction, Stops, ZoomFunction,
};
pub use instruction::{
    CircleStyle, DrawInstruction, FillStyle, Halo, InstructionKind, InstructionPool, LabelStyle,
    MarkerStyle, StrokeStyle,
};
pub use preprocess::{
    CompiledLayer, CompiledStyle, Paint, choose_font, compile_layer, normalize_paint, preprocess,
    resolve_ref,
};
pub use property::{DEFAULT_LINE_CAP, DEFAULT_LINE_JOIN, DEFAULT_MITER_LIMIT, PaintProperty};
pub use sprite::{SpriteAtlas, SpriteEntry};
pub use text::{
    FontCache, FontDescriptor, TextMeasurer, TextWrapper, collect_template_attributes,
    substitute_template, template_attributes, transform_text,
};
pub use value::{Attributes, Value};
pub use zoom::{
    DEFAULT_LEVELS, DEFAULT_MAX_RESOLUTION, ResolutionLadder, ZoomRange, resolution_to_zoom,
};
