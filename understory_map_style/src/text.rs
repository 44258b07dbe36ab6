// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label text: template substitution, font descriptors and word wrapping.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::Write as _;

use hashbrown::{Equivalent, HashMap, HashSet};

use crate::value::{Attributes, Value};

/// Replaces every `{attribute}` placeholder in `template`.
///
/// Missing and null attributes render as the empty string. An unmatched `{`
/// is kept verbatim. Templates without placeholders are returned borrowed.
///
/// ```rust
/// use understory_map_style::{substitute_template, Value};
///
/// let attrs = [("name", Value::from("Main St")), ("ref", Value::from(66))];
/// assert_eq!(substitute_template("{name} ({ref})", &attrs[..]), "Main St (66)");
/// assert_eq!(substitute_template("{missing}!", &attrs[..]), "!");
/// assert_eq!(substitute_template("plain", &attrs[..]), "plain");
/// ```
pub fn substitute_template<'a, A: Attributes + ?Sized>(
    template: &'a str,
    attributes: &A,
) -> Cow<'a, str> {
    if !template.contains('{') {
        return Cow::Borrowed(template);
    }
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some((before, key, after)) = split_placeholder(rest) {
        out.push_str(before);
        if let Some(value) = attributes.get(key) {
            // Writing into a `String` cannot fail.
            let _ = write!(out, "{value}");
        }
        rest = after;
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Iterates the attribute names referenced by `{attribute}` placeholders.
pub fn template_attributes(template: &str) -> impl Iterator<Item = &str> {
    let mut rest = template;
    core::iter::from_fn(move || {
        let (_, key, after) = split_placeholder(rest)?;
        rest = after;
        Some(key)
    })
}

fn split_placeholder(text: &str) -> Option<(&str, &str, &str)> {
    let open = text.find('{')?;
    let close = open + text[open..].find('}')?;
    Some((&text[..open], &text[open + 1..close], &text[close + 1..]))
}

/// Records attributes referenced by placeholders anywhere inside a raw JSON
/// declaration: strings, arrays and object values are all scanned.
pub fn collect_template_attributes(json: &serde_json::Value, seen: &mut HashSet<String>) {
    match json {
        serde_json::Value::String(text) => {
            for key in template_attributes(text) {
                if !key.is_empty() && !seen.contains(key) {
                    seen.insert(key.to_string());
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_template_attributes(item, seen);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_template_attributes(item, seen);
            }
        }
        _ => {}
    }
}

/// Applies a `text-transform` value to a label.
#[must_use]
pub fn transform_text<'a>(text: Cow<'a, str>, transform: Option<&str>) -> Cow<'a, str> {
    match transform {
        Some("uppercase") => Cow::Owned(text.to_uppercase()),
        Some("lowercase") => Cow::Owned(text.to_lowercase()),
        _ => text,
    }
}

const FONT_WEIGHTS: &[(&str, u16)] = &[
    ("thin", 100),
    ("hairline", 100),
    ("ultra-light", 100),
    ("extra-light", 100),
    ("light", 200),
    ("book", 300),
    ("regular", 400),
    ("normal", 400),
    ("plain", 400),
    ("roman", 400),
    ("standard", 400),
    ("medium", 500),
    ("semi-bold", 600),
    ("demi-bold", 600),
    ("bold", 700),
    ("heavy", 800),
    ("black", 800),
    ("extra-bold", 800),
    ("ultra-black", 900),
    ("extra-black", 900),
    ("ultra-bold", 900),
    ("heavy-black", 900),
    ("fat", 900),
    ("poster", 900),
];

/// A font name such as `"Open Sans Bold Italic"` split into CSS parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontDescriptor {
    /// `normal`, `italic` or `oblique`.
    pub style: &'static str,
    /// Numeric CSS weight.
    pub weight: u16,
    /// Family name, quoted if it contains spaces.
    pub family: String,
}

impl FontDescriptor {
    /// Splits a font name into style, weight and family.
    ///
    /// A trailing `Italic`/`Oblique` (possibly fused, as in `BoldItalic`)
    /// sets the style; a trailing weight keyword sets the weight. Both are
    /// removed from the family name.
    ///
    /// ```rust
    /// use understory_map_style::FontDescriptor;
    ///
    /// let font = FontDescriptor::parse("Open Sans Bold Italic");
    /// assert_eq!(font.css(16.0), "italic 700 16px \"Open Sans\"");
    /// assert_eq!(FontDescriptor::parse("Arial").css(12.5), "normal 400 12.5px Arial");
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let mut parts: Vec<&str> = name.split(' ').filter(|part| !part.is_empty()).collect();
        let mut style = "normal";
        let mut weight = 400;

        let mut last = parts.last().map(|part| part.to_ascii_lowercase());
        if let Some(word) = last.as_deref() {
            if let Some(found) = ["normal", "italic", "oblique"].into_iter().find(|s| *s == word) {
                style = found;
                parts.pop();
                last = parts.last().map(|part| part.to_ascii_lowercase());
            } else if let Some(found) = ["italic", "oblique"]
                .into_iter()
                .find(|suffix| word.ends_with(suffix))
            {
                style = found;
                let stem = String::from(&word[..word.len() - found.len()]);
                last = Some(stem);
            }
        }
        if let Some(word) = last.as_deref() {
            let matched = FONT_WEIGHTS.iter().find(|(keyword, _)| {
                word == *keyword
                    || (keyword.contains('-') && word == keyword.replace('-', ""))
            });
            if let Some((_, value)) = matched {
                weight = *value;
                parts.pop();
            }
        }

        let joined = parts.join(" ");
        let family = if joined.contains(' ') {
            alloc::format!("\"{joined}\"")
        } else {
            joined
        };
        Self {
            style,
            weight,
            family,
        }
    }

    /// Formats a CSS font shorthand at `size` pixels.
    #[must_use]
    pub fn css(&self, size: f64) -> String {
        alloc::format!(
            "{} {} {}px {}",
            self.style,
            self.weight,
            Value::Number(size),
            self.family
        )
    }
}

/// CSS font shorthands by font name and size, owned by one evaluator.
#[derive(Debug, Default)]
pub struct FontCache {
    descriptors: HashMap<Arc<str>, FontDescriptor>,
    css: HashMap<(u64, Arc<str>), Arc<str>>,
}

impl FontCache {
    /// Returns the CSS shorthand for `font` at `size`.
    pub fn css(&mut self, font: &Arc<str>, size: f64) -> Arc<str> {
        let key = (size.to_bits(), Arc::clone(font));
        if let Some(css) = self.css.get(&key) {
            return Arc::clone(css);
        }
        let descriptor = self
            .descriptors
            .entry(Arc::clone(font))
            .or_insert_with(|| FontDescriptor::parse(font));
        let css: Arc<str> = Arc::from(descriptor.css(size));
        self.css.insert(key, Arc::clone(&css));
        css
    }
}

/// Measures rendered text width for a CSS font shorthand.
///
/// Implemented for any `FnMut(&str, &str) -> f64` taking `(font, text)`.
pub trait TextMeasurer {
    /// Returns the width of `text` rendered in `font`.
    fn measure(&mut self, font: &str, text: &str) -> f64;
}

impl<F: FnMut(&str, &str) -> f64> TextMeasurer for F {
    fn measure(&mut self, font: &str, text: &str) -> f64 {
        self(font, text)
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct WrapKey {
    em: u64,
    font: Box<str>,
    text: Box<str>,
}

#[derive(Hash)]
struct WrapKeyRef<'a> {
    em: u64,
    font: &'a str,
    text: &'a str,
}

impl Equivalent<WrapKey> for WrapKeyRef<'_> {
    fn equivalent(&self, key: &WrapKey) -> bool {
        self.em == key.em && self.font == &*key.font && self.text == &*key.text
    }
}

/// Greedy word wrapping with memoized results, owned by one evaluator.
#[derive(Debug, Default)]
pub struct TextWrapper {
    wrapped: HashMap<WrapKey, Arc<str>>,
}

impl TextWrapper {
    /// Wraps `text` so no line is wider than `max_width_em` ems of `font`.
    ///
    /// One em is the measured width of `"M"`. Words are separated by single
    /// spaces; a word wider than the limit gets a line of its own. Lines are
    /// joined with `\n` and no line is ever empty.
    pub fn wrap<M: TextMeasurer + ?Sized>(
        &mut self,
        measurer: &mut M,
        text: &str,
        font: &str,
        max_width_em: f64,
    ) -> Arc<str> {
        let lookup = WrapKeyRef {
            em: max_width_em.to_bits(),
            font,
            text,
        };
        if let Some(wrapped) = self.wrapped.get(&lookup) {
            return Arc::clone(wrapped);
        }
        let max_width = measurer.measure(font, "M") * max_width_em;
        let mut lines: Vec<String> = Vec::new();
        let mut line = String::new();
        for word in text.split(' ').filter(|word| !word.is_empty()) {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let start = line.len();
            line.push(' ');
            line.push_str(word);
            if measurer.measure(font, &line) > max_width {
                line.truncate(start);
                lines.push(core::mem::replace(&mut line, String::from(word)));
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
        let wrapped: Arc<str> = Arc::from(lines.join("\n"));
        self.wrapped.insert(
            WrapKey {
                em: lookup.em,
                font: Box::from(font),
                text: Box::from(text),
            },
            Arc::clone(&wrapped),
        );
        wrapped
    }

    /// Number of memoized wraps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wrapped.len()
    }

    /// Returns `true` if nothing has been wrapped yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wrapped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is one unit wide.
    fn monospace(_font: &str, text: &str) -> f64 {
        text.chars().count() as f64
    }

    #[test]
    fn templates_replace_every_placeholder() {
        let attrs = [("a", Value::from("x")), ("n", Value::from(2.5))];
        assert_eq!(substitute_template("{a}-{n}-{a}", &attrs[..]), "x-2.5-x");
        assert_eq!(substitute_template("open {brace", &attrs[..]), "open {brace");
        let null = [("a", Value::Null)];
        assert_eq!(substitute_template("[{a}]", &null[..]), "[]");
    }

    #[test]
    fn template_scan_finds_nested_placeholders() {
        let mut seen = HashSet::new();
        collect_template_attributes(
            &serde_json::json!({
                "text-field": {"stops": [[0, "{name}"], [10, "{name_en} {ref}"]]},
                "icon-image": "{maki}-11",
                "fill-color": "#fff"
            }),
            &mut seen,
        );
        let mut names: Vec<_> = seen.into_iter().collect();
        names.sort();
        assert_eq!(names, ["maki", "name", "name_en", "ref"]);
    }

    #[test]
    fn transforms() {
        assert_eq!(transform_text(Cow::Borrowed("Main St"), Some("uppercase")), "MAIN ST");
        assert_eq!(transform_text(Cow::Borrowed("Main St"), Some("lowercase")), "main st");
        assert_eq!(transform_text(Cow::Borrowed("Main St"), Some("none")), "Main St");
    }

    #[test]
    fn font_descriptors() {
        let cases = [
            ("Open Sans Regular", "normal", 400, "\"Open Sans\""),
            ("Open Sans Semibold", "normal", 600, "\"Open Sans\""),
            ("Noto Sans BoldItalic", "italic", 700, "\"Noto Sans\""),
            ("Arial Unicode MS Regular", "normal", 400, "\"Arial Unicode MS\""),
            ("Helvetica Oblique", "oblique", 400, "Helvetica"),
        ];
        for (name, style, weight, family) in cases {
            let font = FontDescriptor::parse(name);
            assert_eq!(font.style, style, "{name}");
            assert_eq!(font.weight, weight, "{name}");
            assert_eq!(font.family, family, "{name}");
        }
    }

    #[test]
    fn font_cache_reuses_shorthands() {
        let mut cache = FontCache::default();
        let font: Arc<str> = Arc::from("Open Sans Bold");
        let first = cache.css(&font, 14.0);
        let second = cache.css(&font, 14.0);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*first, "normal 700 14px \"Open Sans\"");
    }

    #[test]
    fn wraps_greedily_at_the_em_limit() {
        let mut wrapper = TextWrapper::default();
        let mut measure = monospace;
        // "M" is one unit wide, so the limit is five characters.
        let wrapped = wrapper.wrap(&mut measure, "aa bb cc dddddd e", "font", 5.0);
        assert_eq!(&*wrapped, "aa bb\ncc\ndddddd\ne");
    }

    #[test]
    fn never_emits_empty_lines() {
        let mut wrapper = TextWrapper::default();
        let mut measure = monospace;
        let wrapped = wrapper.wrap(&mut measure, "overlong  word", "font", 2.0);
        assert_eq!(&*wrapped, "overlong\nword");
        assert_eq!(&*wrapper.wrap(&mut measure, "", "font", 2.0), "");
    }

    #[test]
    fn wraps_are_memoized() {
        let mut wrapper = TextWrapper::default();
        let calls = core::cell::Cell::new(0);
        let mut measure = |_: &str, text: &str| {
            calls.set(calls.get() + 1);
            text.len() as f64
        };
        let first = wrapper.wrap(&mut measure, "a b c", "font", 10.0);
        let after_first = calls.get();
        let second = wrapper.wrap(&mut measure, "a b c", "font", 10.0);
        assert_eq!(calls.get(), after_first, "second wrap is served from the cache");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(wrapper.len(), 1);
    }
}
