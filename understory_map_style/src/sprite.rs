// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sprite atlas metadata.
//!
//! An atlas maps icon names to their placement in one shared image. Fetching
//! and decoding the image is the host's business; the atlas only carries an
//! opaque reference to it.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;

use hashbrown::HashMap;
use kurbo::{Point, Size};
use serde::Deserialize;

use crate::error::StyleError;

/// Placement of one icon within the atlas image.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct SpriteEntry {
    /// Left edge in image pixels.
    pub x: f64,
    /// Top edge in image pixels.
    pub y: f64,
    /// Width in image pixels.
    pub width: f64,
    /// Height in image pixels.
    pub height: f64,
    /// Image pixels per logical pixel.
    #[serde(rename = "pixelRatio", default = "default_pixel_ratio")]
    pub pixel_ratio: f64,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

impl SpriteEntry {
    /// Top-left corner of the icon in the atlas image.
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Size of the icon in image pixels.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Icon placements plus a reference to the shared atlas image.
#[derive(Clone, Debug, Default)]
pub struct SpriteAtlas {
    entries: HashMap<String, SpriteEntry>,
    image: Arc<str>,
}

impl SpriteAtlas {
    /// Creates an empty atlas for the image at `image`.
    #[must_use]
    pub fn new(image: impl Into<Arc<str>>) -> Self {
        Self {
            entries: HashMap::new(),
            image: image.into(),
        }
    }

    /// Parses sprite metadata: a JSON object mapping icon names to entries.
    pub fn from_json_str(text: &str, image: impl Into<Arc<str>>) -> Result<Self, StyleError> {
        let entries: BTreeMap<String, SpriteEntry> = serde_json::from_str(text)?;
        Ok(Self {
            entries: entries.into_iter().collect(),
            image: image.into(),
        })
    }

    /// Adds or replaces an icon.
    pub fn insert(&mut self, name: impl Into<String>, entry: SpriteEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Looks an icon up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SpriteEntry> {
        self.entries.get(name)
    }

    /// The opaque atlas image reference.
    #[must_use]
    pub fn image_source(&self) -> &Arc<str> {
        &self.image
    }

    /// Number of icons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the atlas has no icons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sprite_metadata() {
        let atlas = SpriteAtlas::from_json_str(
            r#"{
                "airport": {"x": 0, "y": 10, "width": 16, "height": 18, "pixelRatio": 2},
                "bus": {"x": 16, "y": 0, "width": 12, "height": 12}
            }"#,
            "sprite.png",
        )
        .unwrap();
        assert_eq!(atlas.len(), 2);
        let airport = atlas.get("airport").unwrap();
        assert_eq!(airport.origin(), Point::new(0.0, 10.0));
        assert_eq!(airport.size(), Size::new(16.0, 18.0));
        assert_eq!(airport.pixel_ratio, 2.0);
        assert_eq!(atlas.get("bus").unwrap().pixel_ratio, 1.0, "defaults to 1");
        assert_eq!(&**atlas.image_source(), "sprite.png");
        assert!(atlas.get("ferry").is_none());
    }

    #[test]
    fn malformed_metadata_is_an_error() {
        assert!(SpriteAtlas::from_json_str(r#"{"a": {"x": 0}}"#, "s.png").is_err());
    }
}
