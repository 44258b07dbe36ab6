// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compiled per-feature style evaluator.
//!
//! [`StyleEvaluatorBuilder`] collects configuration and compiles a
//! [`StyleDocument`] into a [`StyleEvaluator`]. The evaluator is then asked,
//! once per visible feature per frame, for the [`DrawInstruction`]s of that
//! feature.
//!
//! ## Resolution
//!
//! A call to [`StyleEvaluator::resolve`]:
//! 1. Maps the view resolution to a fractional zoom.
//! 2. Compares the zoom and the feature's style-relevant attributes with the
//!    single cache slot. On a match the previous instructions are returned as
//!    they are.
//! 3. Otherwise walks the candidate layers: first those restricted to the
//!    feature's source-layer, then those without a source-layer, each group in
//!    document order. Layers outside their zoom range or whose filter rejects
//!    the feature are skipped.
//! 4. Emits fill, outline, line, marker, circle and label instructions for
//!    each remaining layer into a pool of reusable slots.
//!
//! Instructions carry the document index of their layer as `z_index`.

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::f64::consts::PI;

use hashbrown::HashMap;
use kurbo::{Cap, Join, Point, Size, Vec2};

use crate::cache::StyleCache;
use crate::color::{ColorCache, ColorParser, parse_css_color};
use crate::document::{LayerSelection, StyleDocument};
use crate::error::StyleError;
use crate::feature::{Feature, FeatureView, GeometryType, SOURCE_LAYER_ATTRIBUTE};
use crate::instruction::{CircleStyle, DrawInstruction, Halo, InstructionPool, MarkerStyle};
use crate::preprocess::{CompiledLayer, preprocess};
use crate::property::{DEFAULT_MITER_LIMIT, PaintProperty};
use crate::sprite::SpriteAtlas;
use crate::text::{FontCache, TextMeasurer, TextWrapper, substitute_template, transform_text};
use crate::value::{Attributes, Value};
use crate::zoom::ResolutionLadder;

/// Builder for a [`StyleEvaluator`].
///
/// ```rust
/// use understory_map_style::{StyleDocument, StyleEvaluatorBuilder};
///
/// let document = StyleDocument::from_json_str(
///     r#"{"version": 8, "layers": [{"id": "water", "type": "fill", "source": "osm"}]}"#,
/// )
/// .unwrap();
/// let evaluator = StyleEvaluatorBuilder::new()
///     .source("osm")
///     .fonts(["Open Sans Regular"])
///     .build(&document, |_font: &str, text: &str| text.len() as f64 * 8.0)
///     .unwrap();
/// assert_eq!(evaluator.layers().len(), 1);
/// ```
#[derive(Debug)]
pub struct StyleEvaluatorBuilder {
    selection: LayerSelection,
    ladder: ResolutionLadder,
    sprite: Option<SpriteAtlas>,
    fonts: Option<Vec<String>>,
    color_parser: ColorParser,
}

impl Default for StyleEvaluatorBuilder {
    fn default() -> Self {
        Self {
            selection: LayerSelection::All,
            ladder: ResolutionLadder::default(),
            sprite: None,
            fonts: None,
            color_parser: parse_css_color,
        }
    }
}

impl StyleEvaluatorBuilder {
    /// Creates a builder that selects every layer and uses the default
    /// resolution ladder and color parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects only the layers drawing from `source`.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.selection = LayerSelection::Source(source.into());
        self
    }

    /// Selects only the layers with the given ids.
    #[must_use]
    pub fn layer_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = LayerSelection::Ids(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the layer selection directly.
    #[must_use]
    pub fn selection(mut self, selection: LayerSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Uses a custom resolution ladder for mapping resolutions to zoom levels.
    #[must_use]
    pub fn resolutions(mut self, ladder: ResolutionLadder) -> Self {
        self.ladder = ladder;
        self
    }

    /// Provides the sprite atlas icons are looked up in.
    #[must_use]
    pub fn sprite(mut self, atlas: SpriteAtlas) -> Self {
        self.sprite = Some(atlas);
        self
    }

    /// Lists the font names available to the renderer.
    ///
    /// Without a list, the first font of every font stack is used.
    #[must_use]
    pub fn fonts<I, S>(mut self, fonts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fonts = Some(fonts.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the color parser.
    #[must_use]
    pub fn color_parser(mut self, parser: ColorParser) -> Self {
        self.color_parser = parser;
        self
    }

    /// Compiles `document` into an evaluator that measures text with `measurer`.
    ///
    /// The document is copied, never modified. Fails if the document's
    /// version is not supported.
    pub fn build<M: TextMeasurer>(
        self,
        document: &StyleDocument,
        measurer: M,
    ) -> Result<StyleEvaluator<M>, StyleError> {
        document.validate()?;
        let compiled = preprocess(document, &self.selection, self.fonts.as_deref());

        let mut by_source_layer: HashMap<Arc<str>, Vec<usize>> = HashMap::new();
        let mut ungrouped = Vec::new();
        for (position, layer) in compiled.layers.iter().enumerate() {
            match &layer.source_layer {
                Some(name) => by_source_layer
                    .entry(Arc::clone(name))
                    .or_default()
                    .push(position),
                None => ungrouped.push(position),
            }
        }

        Ok(StyleEvaluator {
            style: Style {
                layers: compiled.layers,
                by_source_layer,
                ungrouped,
                relevant: compiled.relevant_attributes,
                geometry_names: [
                    Value::from(GeometryType::Point.name()),
                    Value::from(GeometryType::LineString.name()),
                    Value::from(GeometryType::Polygon.name()),
                ],
                ladder: self.ladder,
                sprite: self.sprite,
            },
            scratch: Scratch {
                measurer,
                colors: ColorCache::new(self.color_parser),
                fonts: FontCache::default(),
                wrapper: TextWrapper::default(),
                icons: HashMap::new(),
                circles: HashMap::new(),
                pool: InstructionPool::new(),
            },
            cache: StyleCache::new(),
            revision: 0,
            hits: 0,
            misses: 0,
        })
    }

    /// Parses `text` as a style document and compiles it.
    pub fn build_from_json<M: TextMeasurer>(
        self,
        text: &str,
        measurer: M,
    ) -> Result<StyleEvaluator<M>, StyleError> {
        let document = StyleDocument::from_json_str(text)?;
        self.build(&document, measurer)
    }
}

/// Compiled, immutable state.
#[derive(Debug)]
struct Style {
    layers: Vec<CompiledLayer>,
    by_source_layer: HashMap<Arc<str>, Vec<usize>>,
    ungrouped: Vec<usize>,
    relevant: Vec<Arc<str>>,
    geometry_names: [Value; 3],
    ladder: ResolutionLadder,
    sprite: Option<SpriteAtlas>,
}

#[derive(Clone, Debug)]
struct IconPlacement {
    image: Arc<str>,
    icon: Arc<str>,
    origin: Point,
    size: Size,
    pixel_ratio: f64,
}

type CircleKey = (u64, Option<Arc<str>>, Option<Arc<str>>);

/// Mutable per-evaluator caches and the instruction pool.
#[derive(Debug)]
struct Scratch<M> {
    measurer: M,
    colors: ColorCache,
    fonts: FontCache,
    wrapper: TextWrapper,
    icons: HashMap<Arc<str>, IconPlacement>,
    circles: HashMap<CircleKey, CircleStyle>,
    pool: InstructionPool,
}

/// Resolves features to draw instructions.
///
/// One evaluator holds one cache slot and one instruction pool, so it must not
/// be shared between threads; give each thread its own.
#[derive(Debug)]
pub struct StyleEvaluator<M> {
    style: Style,
    scratch: Scratch<M>,
    cache: StyleCache,
    revision: u64,
    hits: u64,
    misses: u64,
}

impl<M: TextMeasurer> StyleEvaluator<M> {
    /// Returns the instructions for `feature` viewed at `resolution`.
    ///
    /// The returned slice stays valid until the next call. When the zoom and
    /// every style-relevant attribute match the previous call, the previous
    /// instructions are returned unchanged.
    pub fn resolve<F: Feature + ?Sized>(
        &mut self,
        feature: &F,
        resolution: f64,
    ) -> &[DrawInstruction] {
        let zoom = self.style.ladder.zoom_for_resolution(resolution);
        self.resolve_at_zoom(feature, zoom)
    }

    /// Like [`resolve`](Self::resolve), with the zoom level given directly.
    pub fn resolve_at_zoom<F: Feature + ?Sized>(
        &mut self,
        feature: &F,
        zoom: f64,
    ) -> &[DrawInstruction] {
        let Self {
            style,
            scratch,
            cache,
            revision,
            hits,
            misses,
        } = self;
        let geometry = feature.geometry_type().normalized();
        let view = FeatureView::new(
            feature.attributes(),
            &style.geometry_names[geometry.normalized_index()],
        );
        if cache.check_or_store(zoom, &style.relevant, &view) {
            *hits += 1;
            return scratch.pool.as_slice();
        }
        *misses += 1;
        *revision += 1;

        scratch.pool.reset();
        let group = view
            .get(SOURCE_LAYER_ATTRIBUTE)
            .and_then(Value::as_str)
            .and_then(|name| style.by_source_layer.get(name));
        for &position in group.into_iter().flatten().chain(&style.ungrouped) {
            let layer = &style.layers[position];
            if !layer.zoom.contains(zoom) {
                continue;
            }
            if layer.filter.as_ref().is_some_and(|filter| !filter.evaluate(&view)) {
                continue;
            }
            scratch.emit(style, layer, geometry, zoom, &view);
        }
        log::trace!(
            "style cache miss at zoom {zoom}: {} instructions (revision {revision})",
            scratch.pool.len()
        );
        scratch.pool.as_slice()
    }

    /// The instructions produced by the most recent recomputation.
    #[must_use]
    pub fn instructions(&self) -> &[DrawInstruction] {
        self.scratch.pool.as_slice()
    }

    /// Number of recomputations so far. Unchanged by cache hits.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of calls answered from the cache.
    #[must_use]
    pub fn cache_hits(&self) -> u64 {
        self.hits
    }

    /// Number of calls that recomputed instructions.
    #[must_use]
    pub fn cache_misses(&self) -> u64 {
        self.misses
    }

    /// Forgets the cached entry; the next call recomputes.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Maps a view resolution to the fractional zoom used for evaluation.
    #[must_use]
    pub fn zoom_for_resolution(&self, resolution: f64) -> f64 {
        self.style.ladder.zoom_for_resolution(resolution)
    }

    /// The attributes whose values can change the instructions, sorted.
    #[must_use]
    pub fn relevant_attributes(&self) -> &[Arc<str>] {
        &self.style.relevant
    }

    /// The compiled layers, in document order.
    #[must_use]
    pub fn layers(&self) -> &[CompiledLayer] {
        &self.style.layers
    }

    /// The text measurer.
    pub fn measurer_mut(&mut self) -> &mut M {
        &mut self.scratch.measurer
    }
}

impl<M: TextMeasurer> Scratch<M> {
    fn emit<A: Attributes + ?Sized>(
        &mut self,
        style: &Style,
        layer: &CompiledLayer,
        geometry: GeometryType,
        zoom: f64,
        attributes: &A,
    ) {
        let paint = &layer.paint;
        let z_index = layer.index;
        let value = |property: PaintProperty| {
            paint
                .get(property)
                .map(|function| function.evaluate(zoom, attributes))
        };
        let number = |property: PaintProperty| {
            paint
                .get(property)
                .and_then(|function| function.evaluate_number(zoom, attributes))
        };

        if geometry == GeometryType::Polygon
            && !paint.contains(PaintProperty::FillPattern)
            && paint.contains(PaintProperty::FillColor)
        {
            let opacity = number(PaintProperty::FillOpacity).unwrap_or(1.0);
            if let Some(color) = self.color(value(PaintProperty::FillColor), Some(opacity)) {
                let fill = self.pool.fill();
                fill.color = color;
                fill.z_index = z_index;
            }
            if let Some(color) = self.color(value(PaintProperty::FillOutlineColor), Some(opacity)) {
                let outline = self.pool.stroke();
                outline.color = color;
                outline.z_index = z_index;
                let stroke = &mut outline.stroke;
                stroke.width = 1.0;
                stroke.start_cap = Cap::Butt;
                stroke.end_cap = Cap::Butt;
                stroke.join = Join::Miter;
                stroke.miter_limit = DEFAULT_MITER_LIMIT;
                stroke.dash_pattern.clear();
                stroke.dash_offset = 0.0;
            }
        }

        if geometry != GeometryType::Point && !paint.contains(PaintProperty::LinePattern) {
            let opacity = number(PaintProperty::LineOpacity).unwrap_or(1.0);
            let width = number(PaintProperty::LineWidth).unwrap_or(1.0);
            if width > 0.0
                && let Some(color) = self.color(value(PaintProperty::LineColor), Some(opacity))
            {
                let line = self.pool.stroke();
                line.color = color;
                line.z_index = z_index;
                let cap = parse_cap(value(PaintProperty::LineCap).as_deref());
                let stroke = &mut line.stroke;
                stroke.width = width;
                stroke.start_cap = cap;
                stroke.end_cap = cap;
                stroke.join = parse_join(value(PaintProperty::LineJoin).as_deref());
                stroke.miter_limit =
                    number(PaintProperty::LineMiterLimit).unwrap_or(DEFAULT_MITER_LIMIT);
                stroke.dash_pattern.clear();
                stroke.dash_offset = 0.0;
                if let Some(dashes) = value(PaintProperty::LineDasharray)
                    && let Some(dashes) = dashes.as_array()
                {
                    stroke
                        .dash_pattern
                        .extend(dashes.iter().filter_map(Value::as_f64).map(|d| d * width));
                }
            }
        }

        if geometry == GeometryType::Point {
            if let Some(image) = value(PaintProperty::IconImage) {
                let name = render_text(&image, attributes);
                if let Some(placement) = self.icon(style, &name) {
                    let size = number(PaintProperty::IconSize).unwrap_or(1.0);
                    let rotation = number(PaintProperty::IconRotate).unwrap_or(0.0);
                    self.pool.push(DrawInstruction::Marker(MarkerStyle {
                        image: placement.image,
                        icon: placement.icon,
                        origin: placement.origin,
                        size: placement.size,
                        scale: size / placement.pixel_ratio,
                        rotation: rotation * PI / 180.0,
                        opacity: number(PaintProperty::IconOpacity).unwrap_or(1.0),
                        z_index,
                    }));
                }
            }

            if let Some(radius) = number(PaintProperty::CircleRadius) {
                let stroke = value(PaintProperty::CircleStrokeColor).and_then(shared_str);
                let fill = value(PaintProperty::CircleColor).and_then(shared_str);
                let mut circle = self.circle(radius, stroke, fill);
                circle.z_index = z_index;
                self.pool.push(DrawInstruction::Circle(circle));
            }
        }

        if geometry != GeometryType::LineString
            && let Some(field) = value(PaintProperty::TextField)
        {
            let label = render_text(&field, attributes);
            if !label.is_empty() {
                let transform = value(PaintProperty::TextTransform);
                let label = transform_text(label, transform.as_deref().and_then(Value::as_str));
                self.label(&label, layer, zoom, attributes);
            }
        }
    }

    fn label<A: Attributes + ?Sized>(
        &mut self,
        text: &str,
        layer: &CompiledLayer,
        zoom: f64,
        attributes: &A,
    ) {
        let paint = &layer.paint;
        let value = |property: PaintProperty| {
            paint
                .get(property)
                .map(|function| function.evaluate(zoom, attributes))
        };
        let number = |property: PaintProperty| {
            paint
                .get(property)
                .and_then(|function| function.evaluate_number(zoom, attributes))
        };

        let font_value = value(PaintProperty::TextFont);
        debug_assert!(font_value.is_some(), "text-font has a default");
        let Some(font_name) = font_value.as_deref().and_then(font_name) else {
            return;
        };
        let size = number(PaintProperty::TextSize).unwrap_or(16.0);
        let font = self.fonts.css(&font_name, size);
        let max_width = number(PaintProperty::TextMaxWidth).unwrap_or(10.0);
        let wrapped = self.wrapper.wrap(&mut self.measurer, text, &font, max_width);
        let extra_lines = wrapped.matches('\n').count() as f64;

        let (offset_x, offset_y) = value(PaintProperty::TextOffset)
            .as_deref()
            .and_then(Value::as_array)
            .and_then(|offset| Some((offset.first()?.as_f64()?, offset.get(1)?.as_f64()?)))
            .unwrap_or((0.0, 0.0));
        let mut y = offset_y * size + extra_lines * size;
        let anchor = value(PaintProperty::TextAnchor);
        match anchor.as_deref().and_then(Value::as_str) {
            Some(anchor) if anchor.starts_with("top") => y += 0.5 * size,
            Some(anchor) if anchor.starts_with("bottom") => y -= 0.5 * size,
            _ => {}
        }

        let color = self.color(value(PaintProperty::TextColor), None);
        let halo_width = number(PaintProperty::TextHaloWidth).unwrap_or(0.0);
        let halo = if halo_width > 0.0 {
            self.color(value(PaintProperty::TextHaloColor), None)
                .map(|color| Halo {
                    width: halo_width,
                    color,
                })
        } else {
            None
        };

        let label = self.pool.label();
        label.text = wrapped;
        label.font = font;
        label.offset = Vec2::new(offset_x * size, y);
        label.color = color;
        label.halo = halo;
        label.z_index = layer.index;
    }

    /// Resolves a color value, compositing `opacity` if given.
    fn color(
        &mut self,
        value: Option<Cow<'_, Value>>,
        opacity: Option<f64>,
    ) -> Option<peniko::Color> {
        let value = value?;
        let text = value.as_str()?;
        match opacity {
            Some(opacity) => self.colors.get_with_opacity(text, opacity),
            None => self.colors.get(text),
        }
    }

    fn icon(&mut self, style: &Style, name: &str) -> Option<IconPlacement> {
        if let Some(placement) = self.icons.get(name) {
            return Some(placement.clone());
        }
        let atlas = style.sprite.as_ref()?;
        let entry = atlas.get(name)?;
        let icon: Arc<str> = Arc::from(name);
        let placement = IconPlacement {
            image: Arc::clone(atlas.image_source()),
            icon: Arc::clone(&icon),
            origin: entry.origin(),
            size: entry.size(),
            pixel_ratio: entry.pixel_ratio,
        };
        self.icons.insert(icon, placement.clone());
        Some(placement)
    }

    fn circle(
        &mut self,
        radius: f64,
        stroke: Option<Arc<str>>,
        fill: Option<Arc<str>>,
    ) -> CircleStyle {
        let key = (radius.to_bits(), stroke, fill);
        if let Some(circle) = self.circles.get(&key) {
            return circle.clone();
        }
        let circle = CircleStyle {
            radius,
            stroke: key.1.as_deref().and_then(|color| self.colors.get(color)),
            fill: key.2.as_deref().and_then(|color| self.colors.get(color)),
            z_index: 0,
        };
        self.circles.insert(key, circle.clone());
        circle
    }
}

/// Renders a text-valued property, substituting `{attribute}` placeholders.
fn render_text<'a, A: Attributes + ?Sized>(value: &'a Value, attributes: &A) -> Cow<'a, str> {
    match value {
        Value::String(template) => substitute_template(template, attributes),
        other => Cow::Owned(other.to_string()),
    }
}

fn shared_str(value: Cow<'_, Value>) -> Option<Arc<str>> {
    match &*value {
        Value::String(text) => Some(Arc::clone(text)),
        _ => None,
    }
}

/// The font a `text-font` value names: the string itself, or the first entry
/// of an unresolved stack.
fn font_name(value: &Value) -> Option<Arc<str>> {
    match value {
        Value::String(name) => Some(Arc::clone(name)),
        Value::Array(stack) => stack.iter().find_map(|entry| match entry {
            Value::String(name) => Some(Arc::clone(name)),
            _ => None,
        }),
        _ => None,
    }
}

fn parse_cap(value: Option<&Value>) -> Cap {
    match value.and_then(Value::as_str) {
        Some("round") => Cap::Round,
        Some("square") => Cap::Square,
        _ => Cap::Butt,
    }
}

fn parse_join(value: Option<&Value>) -> Join {
    match value.and_then(Value::as_str) {
        Some("round") => Join::Round,
        Some("bevel") => Join::Bevel,
        _ => Join::Miter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureSnapshot;
    use crate::instruction::InstructionKind;
    use serde_json::json;

    fn measure(_font: &str, text: &str) -> f64 {
        text.chars().count() as f64
    }

    fn evaluator(layers: serde_json::Value) -> StyleEvaluator<fn(&str, &str) -> f64> {
        let document =
            StyleDocument::from_value(&json!({"version": 8, "layers": layers})).unwrap();
        StyleEvaluatorBuilder::new()
            .build(&document, measure as fn(&str, &str) -> f64)
            .unwrap()
    }

    fn kinds(instructions: &[DrawInstruction]) -> Vec<InstructionKind> {
        instructions.iter().map(DrawInstruction::kind).collect()
    }

    #[test]
    fn rejects_unsupported_versions() {
        let document = StyleDocument {
            version: 7,
            ..StyleDocument::default()
        };
        let err = StyleEvaluatorBuilder::new()
            .build(&document, measure as fn(&str, &str) -> f64)
            .unwrap_err();
        assert!(matches!(err, StyleError::UnsupportedVersion { found: 7 }));
    }

    #[test]
    fn polygon_gets_fill_and_outline() {
        let mut evaluator = evaluator(json!([{
            "id": "park", "type": "fill",
            "paint": {"fill-color": "#00ff00", "fill-outline-color": "#000000", "fill-opacity": 0.5}
        }]));
        let park = FeatureSnapshot::new(GeometryType::MultiPolygon);
        let out = evaluator.resolve_at_zoom(&park, 10.0);
        assert_eq!(kinds(out), [InstructionKind::Fill, InstructionKind::Stroke]);
        let DrawInstruction::Stroke(outline) = &out[1] else {
            panic!("expected outline stroke");
        };
        assert_eq!(outline.stroke.width, 1.0);
        assert_eq!(outline.stroke.join, Join::Miter);
        assert_eq!(outline.color.components[3], 0.5, "outline shares fill opacity");
    }

    #[test]
    fn fill_patterns_suppress_fills() {
        let mut evaluator = evaluator(json!([{
            "id": "park", "type": "fill",
            "paint": {"fill-color": "#00ff00", "fill-pattern": "stripes"}
        }]));
        let park = FeatureSnapshot::new(GeometryType::Polygon);
        assert!(evaluator.resolve_at_zoom(&park, 10.0).is_empty());
    }

    #[test]
    fn lines_scale_dashes_by_width() {
        let mut evaluator = evaluator(json!([{
            "id": "path", "type": "line",
            "layout": {"line-cap": "round", "line-join": "bevel"},
            "paint": {"line-color": "red", "line-width": 2, "line-dasharray": [2, 1]}
        }]));
        let path = FeatureSnapshot::new(GeometryType::LineString);
        let out = evaluator.resolve_at_zoom(&path, 10.0);
        let [DrawInstruction::Stroke(line)] = out else {
            panic!("expected one stroke, got {out:?}");
        };
        assert_eq!(line.stroke.width, 2.0);
        assert_eq!(line.stroke.start_cap, Cap::Round);
        assert_eq!(line.stroke.join, Join::Bevel);
        assert_eq!(line.stroke.dash_pattern.as_slice(), [4.0, 2.0]);
    }

    #[test]
    fn polygons_are_stroked_by_line_layers_only() {
        let mut evaluator = evaluator(json!([
            {"id": "fill", "type": "fill", "paint": {"fill-color": "blue"}}
        ]));
        let lake = FeatureSnapshot::new(GeometryType::Polygon);
        assert_eq!(
            kinds(evaluator.resolve_at_zoom(&lake, 3.0)),
            [InstructionKind::Fill],
            "fill colors do not leak into line strokes"
        );
    }

    #[test]
    fn zero_width_lines_are_skipped() {
        let mut evaluator = evaluator(json!([{
            "id": "path", "type": "line",
            "paint": {"line-color": "red", "line-width": {"stops": [[0, 0], [10, 4]]}}
        }]));
        let path = FeatureSnapshot::new(GeometryType::LineString);
        assert!(evaluator.resolve_at_zoom(&path, 0.0).is_empty());
        assert_eq!(evaluator.resolve_at_zoom(&path, 5.0).len(), 1);
    }

    #[test]
    fn markers_come_from_the_sprite_atlas() {
        let mut atlas = SpriteAtlas::new("sprite.png");
        atlas.insert(
            "bus-11",
            crate::sprite::SpriteEntry {
                x: 4.0,
                y: 8.0,
                width: 22.0,
                height: 22.0,
                pixel_ratio: 2.0,
            },
        );
        let document = StyleDocument::from_value(&json!({"version": 8, "layers": [{
            "id": "poi", "type": "symbol",
            "layout": {"icon-image": "{maki}-11", "icon-rotate": 90, "icon-size": 1.5}
        }]}))
        .unwrap();
        let mut evaluator = StyleEvaluatorBuilder::new()
            .sprite(atlas)
            .build(&document, measure)
            .unwrap();

        let bus = FeatureSnapshot::new(GeometryType::Point).with_attribute("maki", "bus");
        let out = evaluator.resolve_at_zoom(&bus, 12.0);
        let [DrawInstruction::Marker(marker)] = out else {
            panic!("expected one marker, got {out:?}");
        };
        assert_eq!(&*marker.icon, "bus-11");
        assert_eq!(&*marker.image, "sprite.png");
        assert_eq!(marker.origin, Point::new(4.0, 8.0));
        assert_eq!(marker.scale, 0.75);
        assert!((marker.rotation - PI / 2.0).abs() < 1e-12);

        let ferry = FeatureSnapshot::new(GeometryType::Point).with_attribute("maki", "ferry");
        assert!(
            evaluator.resolve_at_zoom(&ferry, 12.0).is_empty(),
            "missing sprites are skipped"
        );
    }

    #[test]
    fn circles() {
        let mut evaluator = evaluator(json!([{
            "id": "dots", "type": "circle",
            "paint": {"circle-radius": 4, "circle-color": "red"}
        }]));
        let dot = FeatureSnapshot::new(GeometryType::Point);
        let out = evaluator.resolve_at_zoom(&dot, 1.0);
        let [DrawInstruction::Circle(circle)] = out else {
            panic!("expected one circle, got {out:?}");
        };
        assert_eq!(circle.radius, 4.0);
        assert!(circle.fill.is_some());
        assert!(circle.stroke.is_some(), "stroke color defaults to black");
    }

    #[test]
    fn labels_wrap_and_offset() {
        let mut evaluator = evaluator(json!([{
            "id": "names", "type": "symbol",
            "layout": {
                "text-field": "{name}",
                "text-size": 10,
                "text-max-width": 5,
                "text-anchor": "top",
                "text-offset": [1, 2],
                "text-transform": "uppercase",
                "text-font": ["Open Sans Bold"]
            },
            "paint": {"text-color": "#333", "text-halo-width": 1, "text-halo-color": "white"}
        }]));
        let city = FeatureSnapshot::new(GeometryType::Point).with_attribute("name", "new york city");
        let out = evaluator.resolve_at_zoom(&city, 5.0);
        let [DrawInstruction::Label(label)] = out else {
            panic!("expected one label, got {out:?}");
        };
        assert_eq!(&*label.text, "NEW\nYORK\nCITY");
        assert_eq!(&*label.font, "normal 700 10px \"Open Sans\"");
        // 2 * 10 + 2 extra lines * 10 + half a line for the top anchor.
        assert_eq!(label.offset, Vec2::new(10.0, 45.0));
        assert_eq!(label.halo.map(|halo| halo.width), Some(1.0));
    }

    #[test]
    fn labels_skip_line_strings_and_empty_text() {
        let mut evaluator = evaluator(json!([{
            "id": "names", "type": "symbol", "layout": {"text-field": "{name}"}
        }]));
        let road = FeatureSnapshot::new(GeometryType::LineString).with_attribute("name", "Main");
        assert!(evaluator.resolve_at_zoom(&road, 5.0).is_empty());
        let unnamed = FeatureSnapshot::new(GeometryType::Point);
        assert!(evaluator.resolve_at_zoom(&unnamed, 5.0).is_empty());
        let named = FeatureSnapshot::new(GeometryType::Point).with_attribute("name", "Main");
        let out = evaluator.resolve_at_zoom(&named, 5.0);
        let [DrawInstruction::Label(label)] = out else {
            panic!("expected one label, got {out:?}");
        };
        assert!(label.halo.is_none(), "no halo without a halo width");
    }

    #[test]
    fn zoom_bounds_are_half_open() {
        let mut evaluator = evaluator(json!([{
            "id": "l", "type": "fill", "minzoom": 5, "maxzoom": 10,
            "paint": {"fill-color": "red"}
        }]));
        let area = FeatureSnapshot::new(GeometryType::Polygon);
        assert!(evaluator.resolve_at_zoom(&area, 4.5).is_empty());
        assert_eq!(evaluator.resolve_at_zoom(&area, 5.0).len(), 1);
        assert!(evaluator.resolve_at_zoom(&area, 10.0).is_empty());
    }
}
