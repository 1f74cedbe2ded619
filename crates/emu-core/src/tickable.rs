//! Trait for chips that sit on the pin bus.

use crate::Pins;

/// A peripheral chip advanced by master clock ticks.
///
/// Every chip is ticked once per cycle whether or not it is addressed, so
/// its counters keep running. When the chip's select line is set in `pins`
/// it also services a register read (placing the byte on the data lines)
/// or write (taking the byte from the data lines). A chip never sets its own
/// select line; it may set its own output lines (interrupt, sample strobe).
pub trait Chip {
    /// Advance the chip by one master clock tick.
    fn tick(&mut self, pins: Pins) -> Pins;

    /// Return registers and counters to power-on defaults.
    ///
    /// External wiring (buffers handed over at construction) survives.
    fn reset(&mut self);
}
