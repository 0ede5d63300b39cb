//! Ordered key-binding index with chord lookup.
//!
//! Bindings are kept sorted by a composite key of `(key_code, modifier_mask)`.
//! Several bindings may share one composite key; a lookup returns the whole run
//! so a single keystroke can sound a chord. Inert bindings (`key_code == -1`)
//! never enter the index.

use std::cmp::Ordering;

use crate::config::records::{KeyBinding, SourceSample};

/// Composite modifier weight. Alt is the least significant bit so the sort
/// order is stable across layouts.
pub fn modifier_mask(alt: bool, ctrl: bool, shift: bool) -> u8 {
    (alt as u8) | ((ctrl as u8) << 1) | ((shift as u8) << 2)
}

/// Total order used by both the sort and the binary search.
pub fn compare_bindings(a: &KeyBinding, b: &KeyBinding) -> Ordering {
    a.key_code
        .cmp(&b.key_code)
        .then_with(|| {
            modifier_mask(a.alt_key, a.ctrl_key, a.shift_key)
                .cmp(&modifier_mask(b.alt_key, b.ctrl_key, b.shift_key))
        })
}

/// A keystroke as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: i32,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub shift_key: bool,
}

impl KeyEvent {
    fn compare_to(&self, binding: &KeyBinding) -> Ordering {
        self.key_code.cmp(&binding.key_code).then_with(|| {
            modifier_mask(self.alt_key, self.ctrl_key, self.shift_key)
                .cmp(&modifier_mask(binding.alt_key, binding.ctrl_key, binding.shift_key))
        })
    }
}

#[derive(Debug, Default)]
pub struct KeyBindIndex {
    bindings: Vec<KeyBinding>,
}

impl KeyBindIndex {
    /// Replace the index contents. Inert bindings are dropped; the rest are
    /// stable-sorted so bindings sharing a composite key keep their manifest
    /// order.
    pub fn rebuild(&mut self, bindings: Vec<KeyBinding>) {
        self.bindings = bindings
            .into_iter()
            .filter(|b| b.key_code != -1)
            .collect();
        self.bindings.sort_by(compare_bindings);
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    /// All bindings matching the event's composite key, in manifest order.
    /// Binary search finds one member of the run, then the run is expanded in
    /// both directions.
    pub fn lookup(&self, event: &KeyEvent) -> &[KeyBinding] {
        let Ok(hit) = self
            .bindings
            .binary_search_by(|b| event.compare_to(b).reverse())
        else {
            return &[];
        };

        let mut lo = hit;
        while lo > 0 && event.compare_to(&self.bindings[lo - 1]) == Ordering::Equal {
            lo -= 1;
        }
        let mut hi = hit + 1;
        while hi < self.bindings.len() && event.compare_to(&self.bindings[hi]) == Ordering::Equal {
            hi += 1;
        }
        &self.bindings[lo..hi]
    }

    /// Re-derive every binding's buffer from the sample list by name. All
    /// buffers are cleared first so a sample that disappeared on reload also
    /// disappears here.
    pub fn cross_link(&mut self, samples: &[SourceSample]) {
        for binding in &mut self.bindings {
            binding.buffer = None;
            if let Some(sample) = samples.iter().find(|s| s.name == binding.name) {
                binding.buffer = sample.buffer.clone();
            }
        }
    }
}
