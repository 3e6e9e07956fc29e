//! Map configuration.

use crate::error::{CritBitError, Result};

/// Configuration for a [`CritBitMap`](crate::CritBitMap).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Number of distinct keys to reserve node slots for up front
    pub initial_capacity: usize,
    /// Fraction of vacant arena slots (in `(0, 1]`) at which `remove`
    /// compacts the arena. `None` disables automatic compaction.
    pub compact_threshold: Option<f64>,
}

/// Automatic compaction is not worth it on tiny arenas.
pub(crate) const MIN_COMPACT_SLOTS: usize = 64;

impl Config {
    /// Set the initial key capacity.
    pub fn initial_capacity(mut self, keys: usize) -> Self {
        self.initial_capacity = keys;
        self
    }

    /// Enable automatic compaction once `ratio` of the arena is vacant.
    pub fn compact_threshold(mut self, ratio: f64) -> Self {
        self.compact_threshold = Some(ratio);
        self
    }

    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        if let Some(ratio) = self.compact_threshold {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(CritBitError::configuration(format!(
                    "compact_threshold must be in (0, 1], got {}",
                    ratio
                )));
            }
        }
        // A map with n keys uses 2n - 1 slots.
        if self.initial_capacity.saturating_mul(2) > u32::MAX as usize {
            return Err(CritBitError::configuration(format!(
                "initial_capacity {} exceeds the arena's addressable slots",
                self.initial_capacity
            )));
        }
        Ok(())
    }

    /// Node slots needed for `initial_capacity` keys.
    pub(crate) fn slot_capacity(&self) -> usize {
        self.initial_capacity.saturating_mul(2).saturating_sub(1)
    }
}
