// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-slot memoization of the last resolved feature.
//!
//! Renderers query features in long runs that share a zoom level and, very
//! often, every attribute that matters to the style. The cache remembers the
//! zoom and the values of the style-relevant attributes from the last
//! recomputation; when both match, the previous instructions are still valid.

use alloc::sync::Arc;
use smallvec::SmallVec;

use crate::value::{Attributes, Value};

/// The last input state that produced the current instructions.
#[derive(Clone, Debug, Default)]
pub struct StyleCache {
    zoom: Option<f64>,
    snapshot: SmallVec<[Option<Value>; 8]>,
    used_count: usize,
}

impl StyleCache {
    /// Creates an empty cache; the first lookup always misses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `zoom` and every relevant attribute match the stored
    /// entry. Otherwise stores the new state and returns `false`.
    ///
    /// `relevant` must be the same list on every call. Attributes outside it
    /// are never looked at. A hit does not allocate.
    pub fn check_or_store<A: Attributes + ?Sized>(
        &mut self,
        zoom: f64,
        relevant: &[Arc<str>],
        attributes: &A,
    ) -> bool {
        if self.zoom == Some(zoom) && self.snapshot.len() == relevant.len() {
            let mut used = 0;
            let mut matched = true;
            for (key, stored) in relevant.iter().zip(&self.snapshot) {
                let current = attributes.get(key);
                used += usize::from(current.is_some());
                if current != stored.as_ref() {
                    matched = false;
                    break;
                }
            }
            if matched && used == self.used_count {
                return true;
            }
        }
        self.store(zoom, relevant, attributes);
        false
    }

    fn store<A: Attributes + ?Sized>(&mut self, zoom: f64, relevant: &[Arc<str>], attributes: &A) {
        self.zoom = Some(zoom);
        self.snapshot.clear();
        self.snapshot
            .extend(relevant.iter().map(|key| attributes.get(key).cloned()));
        self.used_count = self.snapshot.iter().filter(|value| value.is_some()).count();
    }

    /// Forgets the stored entry, so the next lookup misses.
    pub fn invalidate(&mut self) {
        self.zoom = None;
        self.snapshot.clear();
        self.used_count = 0;
    }

    /// The zoom of the stored entry, if any.
    #[must_use]
    pub fn zoom(&self) -> Option<f64> {
        self.zoom
    }

    /// Number of relevant attributes present in the stored entry.
    #[must_use]
    pub fn used_count(&self) -> usize {
        self.used_count
    }
}
