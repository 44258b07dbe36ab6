// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping view resolutions to fractional zoom levels.

use alloc::vec::Vec;

use crate::math;

/// Resolution of zoom level 0 in the default ladder (Web Mercator, 256px tiles).
pub const DEFAULT_MAX_RESOLUTION: f64 = 156_543.033_928_040_97;

/// Number of levels in the default ladder.
pub const DEFAULT_LEVELS: usize = 22;

/// A strictly decreasing sequence of resolutions, one per integer zoom level.
///
/// The default ladder is the power-of-two tile pyramid starting at
/// [`DEFAULT_MAX_RESOLUTION`] with [`DEFAULT_LEVELS`] levels.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionLadder {
    resolutions: Vec<f64>,
}

impl Default for ResolutionLadder {
    fn default() -> Self {
        Self::pyramid(DEFAULT_MAX_RESOLUTION, DEFAULT_LEVELS)
    }
}

impl ResolutionLadder {
    /// Creates a ladder from explicit resolutions.
    ///
    /// # Panics (debug only)
    ///
    /// Panics in debug builds if `resolutions` is not strictly decreasing.
    #[must_use]
    pub fn new(resolutions: Vec<f64>) -> Self {
        debug_assert!(
            resolutions.windows(2).all(|w| w[0] > w[1]),
            "resolutions must be strictly decreasing"
        );
        Self { resolutions }
    }

    /// Creates a power-of-two pyramid: each level halves the previous one.
    #[must_use]
    pub fn pyramid(max_resolution: f64, levels: usize) -> Self {
        let mut resolutions = Vec::with_capacity(levels);
        let mut resolution = max_resolution;
        for _ in 0..levels {
            resolutions.push(resolution);
            resolution /= 2.0;
        }
        Self { resolutions }
    }

    /// Returns the resolutions, coarsest first.
    #[must_use]
    pub fn resolutions(&self) -> &[f64] {
        &self.resolutions
    }

    /// Returns the fractional zoom level for a resolution.
    ///
    /// See [`resolution_to_zoom`].
    #[must_use]
    pub fn zoom_for_resolution(&self, resolution: f64) -> f64 {
        resolution_to_zoom(resolution, &self.resolutions)
    }
}

/// Maps a view resolution to a fractional zoom level.
///
/// `resolutions` must be strictly decreasing. A resolution equal to a ladder
/// entry returns that entry's index exactly. A resolution between entries `i`
/// and `i + 1` returns
/// `i + ln(resolutions[i] / resolution) / ln(resolutions[i] / resolutions[i + 1])`,
/// which lies strictly between `i` and `i + 1`. Resolutions finer than the
/// last entry return the last index; resolutions coarser than the first
/// entry extrapolate below zero along the first interval.
#[must_use]
pub fn resolution_to_zoom(resolution: f64, resolutions: &[f64]) -> f64 {
    let Some(last) = resolutions.len().checked_sub(1) else {
        return 0.0;
    };
    if let Some(exact) = resolutions.iter().position(|&r| r == resolution) {
        return exact as f64;
    }
    if resolution.is_nan() || resolution <= 0.0 || last == 0 {
        return last as f64;
    }
    // First level finer than the query; the query sits in the interval above it.
    let Some(finer) = resolutions.iter().position(|&r| r < resolution) else {
        return last as f64;
    };
    let i = finer.saturating_sub(1);
    let ratio = resolutions[i] / resolutions[i + 1];
    i as f64 + math::ln(resolutions[i] / resolution) / math::ln(ratio)
}

/// Half-open zoom interval `[min, max)` a layer is visible in.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ZoomRange {
    /// Inclusive lower bound, if any.
    pub min: Option<f64>,
    /// Exclusive upper bound, if any.
    pub max: Option<f64>,
}

impl ZoomRange {
    /// Returns `true` if `zoom` lies within the range.
    #[must_use]
    #[inline]
    pub fn contains(&self, zoom: f64) -> bool {
        !self.min.is_some_and(|min| zoom < min) && !self.max.is_some_and(|max| zoom >= max)
    }
}
