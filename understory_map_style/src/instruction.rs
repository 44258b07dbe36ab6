// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolved draw instructions and the pool they are built in.
//!
//! Every instruction carries concrete values only: colors with alpha already
//! composited, widths, dash patterns, offsets. The `z_index` of an
//! instruction is the document index of the layer that produced it.

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Point, Size, Stroke, Vec2};
use peniko::Color;

/// Fills a polygon.
#[derive(Clone, Debug, PartialEq)]
pub struct FillStyle {
    /// Fill color.
    pub color: Color,
    /// Document index of the originating layer.
    pub z_index: usize,
}

/// Strokes a line or polygon outline.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Stroke color.
    pub color: Color,
    /// Width, caps, join, miter limit and dash pattern.
    pub stroke: Stroke,
    /// Document index of the originating layer.
    pub z_index: usize,
}

/// Draws an icon from the sprite atlas at a point.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerStyle {
    /// Opaque reference to the atlas image.
    pub image: Arc<str>,
    /// Resolved icon name.
    pub icon: Arc<str>,
    /// Top-left corner of the icon in the atlas image.
    pub origin: Point,
    /// Icon size in image pixels.
    pub size: Size,
    /// Scale from image pixels to logical pixels.
    pub scale: f64,
    /// Clockwise rotation in radians.
    pub rotation: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Document index of the originating layer.
    pub z_index: usize,
}

/// Draws a circle at a point.
#[derive(Clone, Debug, PartialEq)]
pub struct CircleStyle {
    /// Radius in logical pixels.
    pub radius: f64,
    /// Fill color, if any.
    pub fill: Option<Color>,
    /// Stroke color, if any.
    pub stroke: Option<Color>,
    /// Document index of the originating layer.
    pub z_index: usize,
}

/// Outline drawn around label glyphs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Halo {
    /// Halo width in logical pixels.
    pub width: f64,
    /// Halo color.
    pub color: Color,
}

/// Draws a text label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelStyle {
    /// Label text, already wrapped into lines separated by `\n`.
    pub text: Arc<str>,
    /// CSS font shorthand.
    pub font: Arc<str>,
    /// Offset from the anchor point in logical pixels.
    pub offset: Vec2,
    /// Glyph color, if any.
    pub color: Option<Color>,
    /// Halo, only set for a positive halo width.
    pub halo: Option<Halo>,
    /// Document index of the originating layer.
    pub z_index: usize,
}

impl Default for FillStyle {
    fn default() -> Self {
        Self {
            color: Color::TRANSPARENT,
            z_index: 0,
        }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::TRANSPARENT,
            stroke: Stroke::default(),
            z_index: 0,
        }
    }
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            text: Arc::from(""),
            font: Arc::from(""),
            offset: Vec2::ZERO,
            color: None,
            halo: None,
            z_index: 0,
        }
    }
}

/// The kind of a [`DrawInstruction`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    /// [`DrawInstruction::Fill`]
    Fill,
    /// [`DrawInstruction::Stroke`]
    Stroke,
    /// [`DrawInstruction::Marker`]
    Marker,
    /// [`DrawInstruction::Circle`]
    Circle,
    /// [`DrawInstruction::Label`]
    Label,
}

/// One fully resolved paint operation.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawInstruction {
    /// Polygon fill.
    Fill(FillStyle),
    /// Line or outline stroke.
    Stroke(StrokeStyle),
    /// Sprite icon.
    Marker(MarkerStyle),
    /// Circle marker.
    Circle(CircleStyle),
    /// Text label.
    Label(LabelStyle),
}

impl DrawInstruction {
    /// Returns the kind of this instruction.
    #[must_use]
    pub fn kind(&self) -> InstructionKind {
        match self {
            Self::Fill(_) => InstructionKind::Fill,
            Self::Stroke(_) => InstructionKind::Stroke,
            Self::Marker(_) => InstructionKind::Marker,
            Self::Circle(_) => InstructionKind::Circle,
            Self::Label(_) => InstructionKind::Label,
        }
    }

    /// Returns the document index of the layer that produced this instruction.
    #[must_use]
    pub fn z_index(&self) -> usize {
        match self {
            Self::Fill(fill) => fill.z_index,
            Self::Stroke(stroke) => stroke.z_index,
            Self::Marker(marker) => marker.z_index,
            Self::Circle(circle) => circle.z_index,
            Self::Label(label) => label.z_index,
        }
    }
}

/// Reusable instruction slots with an explicit active length.
///
/// Slots past the active length are kept for reuse; a slot is rebuilt only
/// when the kind requested at its position differs from what it held on the
/// previous pass.
#[derive(Debug, Default)]
pub struct InstructionPool {
    slots: Vec<DrawInstruction>,
    len: usize,
}

macro_rules! claim_slot {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $name(&mut self) -> &mut $ty {
            let slot = self.claim();
            if !matches!(slot, DrawInstruction::$variant(_)) {
                *slot = DrawInstruction::$variant(<$ty>::default());
            }
            match slot {
                DrawInstruction::$variant(style) => style,
                _ => unreachable!("slot was just set to {}", stringify!($variant)),
            }
        }
    };
}

impl InstructionPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active instructions.
    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[DrawInstruction] {
        &self.slots[..self.len]
    }

    /// Number of active instructions.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no instruction is active.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots held, active or not.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Deactivates every slot without dropping them.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Appends a finished instruction, replacing whatever the slot held.
    pub fn push(&mut self, instruction: DrawInstruction) {
        *self.claim() = instruction;
    }

    claim_slot!(
        /// Activates the next slot as a fill, reusing it if it already is one.
        fill, Fill, FillStyle
    );
    claim_slot!(
        /// Activates the next slot as a stroke, reusing its dash buffer if it
        /// already is one.
        stroke, Stroke, StrokeStyle
    );
    claim_slot!(
        /// Activates the next slot as a label, reusing it if it already is one.
        label, Label, LabelStyle
    );

    fn claim(&mut self) -> &mut DrawInstruction {
        let index = self.len;
        self.len += 1;
        if index == self.slots.len() {
            self.slots.push(DrawInstruction::Fill(FillStyle::default()));
        }
        &mut self.slots[index]
    }
}
