// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning document layers into compiled layers.
//!
//! Each selected layer is copied out of the document, has its `ref` resolved,
//! its layout merged into its paint, its defaults filled in and its font
//! stack resolved, and is finally compiled into a [`CompiledLayer`] whose
//! properties are [`PropertyFunction`]s indexed by [`PaintProperty`].

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashSet;
use serde_json::{Map, Value as JsonValue};

use crate::document::{Layer, LayerSelection, StyleDocument};
use crate::feature::{GEOMETRY_TYPE_ATTRIBUTE, SOURCE_LAYER_ATTRIBUTE};
use crate::filter::Filter;
use crate::function::PropertyFunction;
use crate::property::PaintProperty;
use crate::text::collect_template_attributes;
use crate::value::Value;
use crate::zoom::ZoomRange;

/// Compiled property functions of one layer, indexed by property.
#[derive(Clone, Debug)]
pub struct Paint {
    functions: [Option<PropertyFunction>; PaintProperty::COUNT],
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            functions: core::array::from_fn(|_| None),
        }
    }
}

impl Paint {
    /// Returns the compiled function for `property`, if declared or defaulted.
    #[must_use]
    #[inline]
    pub fn get(&self, property: PaintProperty) -> Option<&PropertyFunction> {
        self.functions[property.index()].as_ref()
    }

    /// Returns `true` if `property` is declared or defaulted.
    #[must_use]
    #[inline]
    pub fn contains(&self, property: PaintProperty) -> bool {
        self.functions[property.index()].is_some()
    }

    /// Sets the compiled function for `property`.
    pub fn set(&mut self, property: PaintProperty, function: PropertyFunction) {
        self.functions[property.index()] = Some(function);
    }

    /// Iterates the declared properties and their functions.
    pub fn iter(&self) -> impl Iterator<Item = (PaintProperty, &PropertyFunction)> {
        PaintProperty::ALL
            .iter()
            .zip(&self.functions)
            .filter_map(|(property, function)| Some((*property, function.as_ref()?)))
    }
}

/// A preprocessed, compiled layer.
#[derive(Clone, Debug)]
pub struct CompiledLayer {
    /// Layer id.
    pub id: Arc<str>,
    /// Position of the layer in the document; the z-order of its instructions.
    pub index: usize,
    /// Source-layer the layer is restricted to.
    pub source_layer: Option<Arc<str>>,
    /// Zoom levels the layer is visible at.
    pub zoom: ZoomRange,
    /// Parsed filter, if any.
    pub filter: Option<Filter>,
    /// Compiled properties.
    pub paint: Paint,
}

/// Copies the structure of the layer named by `layer.reference` into `layer`.
///
/// `type`, `source`, `source-layer`, `minzoom`, `maxzoom`, `filter` and
/// `layout` are copied; `paint` stays the layer's own. Returns `false` if the
/// reference does not name a layer in `document`. Layers without a reference
/// are left alone.
pub fn resolve_ref(layer: &mut Layer, document: &StyleDocument) -> bool {
    let Some(reference) = layer.reference.as_deref() else {
        return true;
    };
    let Some(target) = document.layers.iter().find(|l| l.id == reference) else {
        return false;
    };
    layer.kind.clone_from(&target.kind);
    layer.source.clone_from(&target.source);
    layer.source_layer.clone_from(&target.source_layer);
    layer.minzoom = target.minzoom;
    layer.maxzoom = target.maxzoom;
    layer.filter.clone_from(&target.filter);
    layer.layout.clone_from(&target.layout);
    true
}

/// Normalizes a layer's declarations in place.
///
/// Creates an empty paint map if there is none, merges layout declarations
/// into it (paint wins, and `ref` layers skip this step) and fills in every
/// property that has a default. Running it twice changes nothing.
pub fn normalize_paint(layer: &mut Layer) {
    let paint = layer.paint.get_or_insert_with(Map::new);
    if layer.reference.is_none()
        && let Some(layout) = &layer.layout
    {
        for (key, value) in layout {
            let declared = paint.get(key).is_some_and(|existing| !existing.is_null());
            if !declared {
                paint.insert(key.clone(), value.clone());
            }
        }
    }
    for &property in PaintProperty::ALL {
        if paint.contains_key(property.name()) {
            continue;
        }
        if let Some(default) = property.default_value() {
            paint.insert(property.name().to_string(), value_to_json(&default));
        }
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number),
        Value::String(s) => JsonValue::String(s.to_string()),
        Value::Array(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
    }
}

/// Picks one font from a declared font stack.
///
/// The first declared font that is in `available` wins. Without an
/// availability list, or when nothing matches, the first declared font is
/// used. Values that are not font stacks are returned unchanged.
#[must_use]
pub fn choose_font(stack: &Value, available: Option<&[String]>) -> Value {
    let Some(fonts) = stack.as_array() else {
        return stack.clone();
    };
    let names = || fonts.iter().filter_map(Value::as_str);
    let chosen = available
        .and_then(|available| names().find(|name| available.iter().any(|a| a == name)))
        .or_else(|| names().next());
    chosen.map_or(Value::Null, Value::from)
}

/// Compiles a normalized layer.
///
/// `index` is the layer's position in the document.
#[must_use]
pub fn compile_layer(layer: &Layer, index: usize, fonts: Option<&[String]>) -> CompiledLayer {
    let mut paint = Paint::default();
    if let Some(raw) = &layer.paint {
        for &property in PaintProperty::ALL {
            let Some(declaration) = raw.get(property.name()) else {
                continue;
            };
            let function = match property.kind() {
                Some(kind) => PropertyFunction::compile_with_fallback(
                    declaration,
                    kind,
                    property.default_value(),
                ),
                None => PropertyFunction::Constant(Value::from(declaration)),
            };
            paint.set(property, function);
        }
    }
    if paint.contains(PaintProperty::TextField)
        && let Some(font) = paint.functions[PaintProperty::TextFont.index()].as_mut()
    {
        font.map_outputs(|stack| choose_font(stack, fonts));
    }

    let filter = layer.filter.as_ref().map(Filter::parse);
    if let Some(filter) = &filter {
        filter.for_each_unknown(&mut |op| {
            log::warn!("layer {:?}: unknown filter operator {op:?} never matches", layer.id);
        });
    }

    CompiledLayer {
        id: Arc::from(layer.id.as_str()),
        index,
        source_layer: layer.source_layer.as_deref().map(Arc::from),
        zoom: ZoomRange {
            min: layer.minzoom,
            max: layer.maxzoom,
        },
        filter,
        paint,
    }
}

/// Everything compiled from one document.
#[derive(Clone, Debug, Default)]
pub struct CompiledStyle {
    /// Selected layers, in document order.
    pub layers: Vec<CompiledLayer>,
    /// Attributes whose values can change the instructions, sorted.
    pub relevant_attributes: Vec<Arc<str>>,
}

/// Preprocesses and compiles the selected layers of `document`.
///
/// The document is not modified. Layers with a dangling `ref` and layers
/// hidden by `visibility: none` are dropped.
#[must_use]
pub fn preprocess(
    document: &StyleDocument,
    selection: &LayerSelection,
    fonts: Option<&[String]>,
) -> CompiledStyle {
    let mut layers = Vec::new();
    let mut seen = HashSet::new();
    for (index, original) in document.layers.iter().enumerate() {
        let mut layer = original.clone();
        if !resolve_ref(&mut layer, document) {
            log::warn!(
                "layer {:?} refers to missing layer {:?}; skipped",
                layer.id,
                layer.reference.as_deref().unwrap_or_default()
            );
            continue;
        }
        if !selection.matches(&layer) || !layer.is_visible() {
            continue;
        }
        normalize_paint(&mut layer);
        let compiled = compile_layer(&layer, index, fonts);
        collect_relevant_attributes(&layer, &compiled, &mut seen);
        layers.push(compiled);
    }
    seen.insert(GEOMETRY_TYPE_ATTRIBUTE.to_string());
    seen.insert(SOURCE_LAYER_ATTRIBUTE.to_string());

    let mut relevant_attributes: Vec<Arc<str>> =
        seen.into_iter().map(|name| Arc::from(name.as_str())).collect();
    relevant_attributes.sort();
    log::debug!(
        "compiled {} of {} layers; {} style-relevant attributes",
        layers.len(),
        document.layers.len(),
        relevant_attributes.len()
    );
    CompiledStyle {
        layers,
        relevant_attributes,
    }
}

fn collect_relevant_attributes(layer: &Layer, compiled: &CompiledLayer, seen: &mut HashSet<String>) {
    if let Some(filter) = &compiled.filter {
        filter.collect_referenced_attributes(seen);
    }
    for declarations in [&layer.layout, &layer.paint].into_iter().flatten() {
        for declaration in declarations.values() {
            collect_template_attributes(declaration, seen);
        }
    }
    for (_, function) in compiled.paint.iter() {
        if let Some(attribute) = function.referenced_attribute()
            && !seen.contains(attribute)
        {
            seen.insert(attribute.to_string());
        }
    }
}
