//! 16-bit down counter with a reload latch.

/// Control bit: counter running.
pub const CTL_RUN: u8 = 0x01;
/// Control bit: reload on underflow and keep running.
pub const CTL_CONTINUOUS: u8 = 0x02;

const CTL_MASK: u8 = CTL_RUN | CTL_CONTINUOUS;

/// One RIA interval timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timer {
    pub counter: u16,
    pub latch: u16,
    control: u8,
}

impl Timer {
    #[must_use]
    pub const fn new() -> Self {
        Self { counter: 0, latch: 0, control: 0 }
    }

    #[must_use]
    pub const fn control(&self) -> u8 {
        self.control
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.control & CTL_RUN != 0
    }

    /// Write the control register. Starting a stopped timer loads the
    /// counter from the latch.
    pub fn set_control(&mut self, value: u8) {
        let value = value & CTL_MASK;
        if value & CTL_RUN != 0 && !self.is_running() {
            self.counter = self.latch;
        }
        self.control = value;
    }

    pub fn set_latch_lo(&mut self, value: u8) {
        self.latch = (self.latch & 0xFF00) | u16::from(value);
    }

    pub fn set_latch_hi(&mut self, value: u8) {
        self.latch = (self.latch & 0x00FF) | (u16::from(value) << 8);
    }

    /// Count one tick. Returns true on underflow.
    ///
    /// The counter reloads from the latch on underflow; a one-shot timer
    /// also stops.
    pub fn tick(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let (next, underflow) = self.counter.overflowing_sub(1);
        if !underflow {
            self.counter = next;
            return false;
        }
        self.counter = self.latch;
        if self.control & CTL_CONTINUOUS == 0 {
            self.control &= !CTL_RUN;
        }
        true
    }
}
