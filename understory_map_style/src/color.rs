// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color parsing and opacity compositing.
//!
//! Parsing is an injected capability ([`ColorParser`]); the default,
//! [`parse_css_color`], understands CSS color syntax through `peniko`.
//! Parsed colors are memoized per evaluator in a [`ColorCache`].

use alloc::sync::Arc;

use hashbrown::HashMap;
use peniko::Color;
use peniko::color::Srgb;

/// Resolves a color string to an sRGB color with alpha.
pub type ColorParser = fn(&str) -> Option<Color>;

/// Parses CSS color syntax: hex, `rgb()`/`rgba()`, `hsl()`/`hsla()` and
/// named colors.
///
/// ```rust
/// use understory_map_style::parse_css_color;
///
/// let red = parse_css_color("rgba(255, 0, 0, 0.5)").unwrap();
/// assert_eq!(red.components[3], 0.5);
/// assert!(parse_css_color("not a color").is_none());
/// ```
#[must_use]
pub fn parse_css_color(text: &str) -> Option<Color> {
    peniko::color::parse_color(text)
        .ok()
        .map(|color| color.to_alpha_color::<Srgb>())
}

/// Multiplies a color's alpha by `opacity`.
///
/// Returns `None` when the resulting alpha is zero, meaning nothing should be
/// drawn.
#[must_use]
pub fn with_opacity(color: Color, opacity: f64) -> Option<Color> {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "opacity is in [0, 1]; f32 precision is what the color carries"
    )]
    let alpha = color.components[3] * opacity as f32;
    if alpha <= 0.0 || alpha.is_nan() {
        None
    } else {
        Some(color.with_alpha(alpha))
    }
}

/// Memoized color parsing, owned by one evaluator.
///
/// Both successful and failed parses are remembered, so a bad color string is
/// reported once.
#[derive(Debug)]
pub struct ColorCache {
    parser: ColorParser,
    parsed: HashMap<Arc<str>, Option<Color>>,
}

impl ColorCache {
    /// Creates an empty cache using `parser`.
    #[must_use]
    pub fn new(parser: ColorParser) -> Self {
        Self {
            parser,
            parsed: HashMap::new(),
        }
    }

    /// Parses `text`, consulting the cache first.
    pub fn get(&mut self, text: &str) -> Option<Color> {
        if let Some(color) = self.parsed.get(text) {
            return *color;
        }
        let color = (self.parser)(text);
        if color.is_none() {
            log::warn!("unparseable color {text:?}");
        }
        self.parsed.insert(Arc::from(text), color);
        color
    }

    /// Parses `text` and composites it with `opacity`.
    pub fn get_with_opacity(&mut self, text: &str, opacity: f64) -> Option<Color> {
        self.get(text).and_then(|color| with_opacity(color, opacity))
    }

    /// Number of distinct strings seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parsed.len()
    }

    /// Returns `true` if nothing has been parsed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }
}

impl Default for ColorCache {
    fn default() -> Self {
        Self::new(parse_css_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_opacity_halves_alpha() {
        let color = parse_css_color("#ff0000").unwrap();
        assert_eq!(color.components[3], 1.0);
        let composited = with_opacity(color, 0.5).unwrap();
        assert_eq!(composited.components[3], 0.5);
        assert_eq!(composited.components[0], color.components[0]);
    }

    #[test]
    fn zero_opacity_is_absent() {
        let color = parse_css_color("blue").unwrap();
        assert!(with_opacity(color, 0.0).is_none());
        let transparent = parse_css_color("rgba(0, 0, 0, 0)").unwrap();
        assert!(with_opacity(transparent, 1.0).is_none());
    }

    #[test]
    fn existing_alpha_is_multiplied() {
        let color = parse_css_color("rgba(0, 0, 255, 0.5)").unwrap();
        let composited = with_opacity(color, 0.5).unwrap();
        assert!((composited.components[3] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn cache_remembers_results() {
        fn only_red(text: &str) -> Option<Color> {
            (text == "red").then(|| Color::from_rgba8(255, 0, 0, 255))
        }
        let mut cache = ColorCache::new(only_red);
        assert!(cache.get("red").is_some());
        assert!(cache.get("red").is_some());
        assert!(cache.get("green").is_none());
        assert_eq!(cache.len(), 2);
    }
}
