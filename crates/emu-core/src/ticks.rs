//! The fundamental unit of time in the emulator.

/// A count of master clock ticks.
///
/// One tick is one CPU cycle on the X65 bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticks(pub u64);

impl Ticks {
    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_a_raw_count() {
        assert_eq!(Ticks::new(104_800).get(), 104_800);
        assert_eq!(Ticks::default(), Ticks(0));
    }
}
