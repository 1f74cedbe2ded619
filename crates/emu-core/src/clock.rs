//! Master clock configuration.

use crate::Ticks;

/// Master clock configuration for a system.
///
/// Everything on the X65 bus ticks at this frequency: one CPU cycle per
/// master tick, with every chip advanced in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// Crystal frequency in Hz (e.g., `6_288_000` for the X65).
    pub frequency_hz: u64,
}

impl MasterClock {
    /// # Panics
    ///
    /// Panics if `frequency_hz` is zero.
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        assert!(frequency_hz > 0, "clock frequency must be non-zero");
        Self { frequency_hz }
    }

    /// Ticks that fit into `micros` microseconds, rounded down.
    #[must_use]
    pub const fn ticks_for_micros(&self, micros: u64) -> Ticks {
        Ticks::new(((self.frequency_hz as u128 * micros as u128) / 1_000_000) as u64)
    }
}
