// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The style document model.
//!
//! Documents are deserialized with serde into owned values, so the caller's
//! input is never mutated. Property declarations stay as raw JSON until
//! [`preprocess`](crate::preprocess) compiles them.

use alloc::string::String;
use alloc::vec::Vec;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::StyleError;

/// The only style schema version this crate understands.
pub const SUPPORTED_VERSION: u64 = 8;

/// A versioned style document: an ordered list of layers.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct StyleDocument {
    /// Schema version; must equal [`SUPPORTED_VERSION`].
    pub version: u64,
    /// Optional human-readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional sprite URL prefix, as declared by the document.
    #[serde(default)]
    pub sprite: Option<String>,
    /// Layers in paint order.
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl StyleDocument {
    /// Parses and validates a document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, StyleError> {
        let value: JsonValue = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Deserializes and validates a document from a JSON value.
    ///
    /// The version is checked before the layers are looked at, so a document
    /// for another schema fails with [`StyleError::UnsupportedVersion`] rather
    /// than a shape error.
    pub fn from_value(value: &JsonValue) -> Result<Self, StyleError> {
        let Some(object) = value.as_object() else {
            return Err(StyleError::InvalidDocument("document is not an object"));
        };
        let version = object
            .get("version")
            .ok_or(StyleError::InvalidDocument("missing `version`"))?
            .as_u64()
            .ok_or(StyleError::InvalidDocument("`version` is not an integer"))?;
        check_version(version)?;
        if object.get("layers").is_some_and(|layers| !layers.is_array()) {
            return Err(StyleError::InvalidDocument("`layers` is not an array"));
        }
        let document = Self::deserialize(value)?;
        document.validate()?;
        Ok(document)
    }

    /// Checks invariants that deserialization alone does not enforce.
    pub fn validate(&self) -> Result<(), StyleError> {
        check_version(self.version)
    }

    /// Finds a layer by id.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }
}

fn check_version(found: u64) -> Result<(), StyleError> {
    if found == SUPPORTED_VERSION {
        Ok(())
    } else {
        Err(StyleError::UnsupportedVersion { found })
    }
}

/// One styling rule.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Layer {
    /// Unique layer id.
    pub id: String,
    /// Layer type (`fill`, `line`, `symbol`, `circle`, ...).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Source the layer draws from.
    #[serde(default)]
    pub source: Option<String>,
    /// Source-layer the layer is restricted to.
    #[serde(rename = "source-layer", default)]
    pub source_layer: Option<String>,
    /// Inclusive minimum zoom.
    #[serde(default)]
    pub minzoom: Option<f64>,
    /// Exclusive maximum zoom.
    #[serde(default)]
    pub maxzoom: Option<f64>,
    /// Raw filter expression.
    #[serde(default)]
    pub filter: Option<JsonValue>,
    /// Id of the layer this one inherits its structure from.
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    /// Raw layout declarations.
    #[serde(default)]
    pub layout: Option<Map<String, JsonValue>>,
    /// Raw paint declarations.
    #[serde(default)]
    pub paint: Option<Map<String, JsonValue>>,
}

impl Layer {
    /// Returns `false` if the layout hides this layer.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.layout
            .as_ref()
            .and_then(|layout| layout.get("visibility"))
            .and_then(JsonValue::as_str)
            != Some("none")
    }
}

/// Which layers of a document an evaluator is built from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LayerSelection {
    /// Every layer.
    #[default]
    All,
    /// Layers drawing from the named source.
    Source(String),
    /// Layers with one of the listed ids.
    Ids(Vec<String>),
}

impl LayerSelection {
    /// Returns `true` if `layer` is selected.
    #[must_use]
    pub fn matches(&self, layer: &Layer) -> bool {
        match self {
            Self::All => true,
            Self::Source(source) => layer.source.as_deref() == Some(source.as_str()),
            Self::Ids(ids) => ids.iter().any(|id| *id == layer.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_layers_in_order() {
        let document = StyleDocument::from_json_str(
            r#"{
                "version": 8,
                "name": "test",
                "layers": [
                    {"id": "water", "type": "fill", "source": "osm",
                     "source-layer": "water", "paint": {"fill-color": "blue"}},
                    {"id": "water-outline", "ref": "water", "paint": {}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(document.layers.len(), 2);
        assert_eq!(document.layers[0].source_layer.as_deref(), Some("water"));
        assert_eq!(document.layers[1].reference.as_deref(), Some("water"));
        assert_eq!(document.layer("water-outline").map(|l| l.id.as_str()), Some("water-outline"));
    }

    #[test]
    fn rejects_other_versions() {
        let err = StyleDocument::from_value(&json!({"version": 7, "layers": {}})).unwrap_err();
        assert!(matches!(err, StyleError::UnsupportedVersion { found: 7 }));
    }

    #[test]
    fn rejects_structural_errors() {
        assert!(matches!(
            StyleDocument::from_value(&json!({"layers": []})),
            Err(StyleError::InvalidDocument(_))
        ));
        assert!(matches!(
            StyleDocument::from_value(&json!({"version": 8, "layers": 3})),
            Err(StyleError::InvalidDocument(_))
        ));
        assert!(matches!(
            StyleDocument::from_json_str("[1, 2"),
            Err(StyleError::Json(_))
        ));
    }

    #[test]
    fn visibility() {
        let hidden: Layer =
            serde_json::from_value(json!({"id": "a", "layout": {"visibility": "none"}})).unwrap();
        let shown: Layer =
            serde_json::from_value(json!({"id": "b", "layout": {"visibility": "visible"}}))
                .unwrap();
        assert!(!hidden.is_visible());
        assert!(shown.is_visible());
    }

    #[test]
    fn selection() {
        let layer: Layer =
            serde_json::from_value(json!({"id": "roads", "source": "osm"})).unwrap();
        assert!(LayerSelection::All.matches(&layer));
        assert!(LayerSelection::Source("osm".into()).matches(&layer));
        assert!(!LayerSelection::Source("sat".into()).matches(&layer));
        assert!(LayerSelection::Ids(alloc::vec!["roads".into()]).matches(&layer));
    }
}
