// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feature snapshots handed to the evaluator.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::value::{Attributes, Value};

/// Attribute name under which the normalized geometry type is visible to
/// filters and the style cache.
pub const GEOMETRY_TYPE_ATTRIBUTE: &str = "$type";

/// Attribute name carrying the feature's source-layer.
pub const SOURCE_LAYER_ATTRIBUTE: &str = "layer";

/// Geometry type of a map feature.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeometryType {
    /// A single point.
    Point,
    /// A collection of points.
    MultiPoint,
    /// A single line string.
    LineString,
    /// A collection of line strings.
    MultiLineString,
    /// A single polygon.
    Polygon,
    /// A collection of polygons.
    MultiPolygon,
}

impl GeometryType {
    /// Strips the multi-geometry qualifier (`MultiPolygon` → `Polygon`).
    #[must_use]
    pub const fn normalized(self) -> Self {
        match self {
            Self::Point | Self::MultiPoint => Self::Point,
            Self::LineString | Self::MultiLineString => Self::LineString,
            Self::Polygon | Self::MultiPolygon => Self::Polygon,
        }
    }

    /// Returns the GeoJSON name of this geometry type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::MultiPoint => "MultiPoint",
            Self::LineString => "LineString",
            Self::MultiLineString => "MultiLineString",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
        }
    }

    /// Parses a GeoJSON geometry type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Point" => Self::Point,
            "MultiPoint" => Self::MultiPoint,
            "LineString" => Self::LineString,
            "MultiLineString" => Self::MultiLineString,
            "Polygon" => Self::Polygon,
            "MultiPolygon" => Self::MultiPolygon,
            _ => return None,
        })
    }

    /// Slot of the normalized type in per-type tables.
    pub(crate) const fn normalized_index(self) -> usize {
        match self.normalized() {
            Self::Point => 0,
            Self::LineString => 1,
            _ => 2,
        }
    }
}

/// A map feature as seen by the style evaluator.
///
/// The evaluator only reads a feature for the duration of one call.
pub trait Feature {
    /// The attribute storage of this feature.
    type Attributes: Attributes + ?Sized;

    /// Returns the geometry type, possibly a multi-geometry.
    fn geometry_type(&self) -> GeometryType;

    /// Returns the feature's attributes.
    ///
    /// The source-layer name is expected under [`SOURCE_LAYER_ATTRIBUTE`].
    fn attributes(&self) -> &Self::Attributes;
}

/// An owned feature: a geometry type plus an attribute map.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureSnapshot {
    /// The geometry type.
    pub geometry_type: GeometryType,
    /// Attribute values by name.
    pub attributes: BTreeMap<String, Value>,
}

impl FeatureSnapshot {
    /// Creates a feature with no attributes.
    #[must_use]
    pub fn new(geometry_type: GeometryType) -> Self {
        Self {
            geometry_type,
            attributes: BTreeMap::new(),
        }
    }

    /// Adds or replaces an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the source-layer attribute.
    #[must_use]
    pub fn with_source_layer(self, source_layer: &str) -> Self {
        self.with_attribute(SOURCE_LAYER_ATTRIBUTE, source_layer)
    }

    /// Adds or replaces an attribute in place.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }
}

impl Feature for FeatureSnapshot {
    type Attributes = BTreeMap<String, Value>;

    #[inline]
    fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    #[inline]
    fn attributes(&self) -> &Self::Attributes {
        &self.attributes
    }
}

/// Feature attributes extended with the synthetic `$type` attribute.
pub(crate) struct FeatureView<'a, A: ?Sized> {
    attributes: &'a A,
    geometry: &'a Value,
}

impl<'a, A: Attributes + ?Sized> FeatureView<'a, A> {
    pub(crate) fn new(attributes: &'a A, geometry: &'a Value) -> Self {
        Self {
            attributes,
            geometry,
        }
    }
}

impl<A: Attributes + ?Sized> Attributes for FeatureView<'_, A> {
    #[inline]
    fn get(&self, key: &str) -> Option<&Value> {
        if key == GEOMETRY_TYPE_ATTRIBUTE {
            Some(self.geometry)
        } else {
            self.attributes.get(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_geometries_normalize() {
        assert_eq!(GeometryType::MultiPolygon.normalized(), GeometryType::Polygon);
        assert_eq!(GeometryType::MultiPoint.normalized(), GeometryType::Point);
        assert_eq!(
            GeometryType::MultiLineString.normalized(),
            GeometryType::LineString
        );
        assert_eq!(GeometryType::Polygon.normalized(), GeometryType::Polygon);
    }

    #[test]
    fn names_round_trip_through_parsing() {
        assert_eq!(
            GeometryType::from_name("MultiLineString"),
            Some(GeometryType::MultiLineString)
        );
        assert_eq!(GeometryType::from_name("GeometryCollection"), None);
        assert_eq!(GeometryType::MultiPolygon.normalized().name(), "Polygon");
    }

    #[test]
    fn view_exposes_geometry_type() {
        let feature = FeatureSnapshot::new(GeometryType::MultiPolygon)
            .with_attribute("class", "park")
            .with_source_layer("landuse");
        let geometry = Value::from(feature.geometry_type.normalized().name());
        let view = FeatureView::new(feature.attributes(), &geometry);
        assert_eq!(view.get("$type"), Some(&Value::from("Polygon")));
        assert_eq!(view.get("class"), Some(&Value::from("park")));
        assert_eq!(view.get("layer"), Some(&Value::from("landuse")));
        assert_eq!(view.get("name"), None);
    }
}
