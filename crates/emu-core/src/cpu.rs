//! CPU core trait.

use crate::Pins;

/// A cycle-stepped CPU core.
///
/// The CPU never touches memory itself. Each `tick()` receives the pins the
/// outside world produced in answer to the previous request and returns the
/// next request. Whoever drives the CPU (a system bus, a test harness) must
/// satisfy that request before the following tick.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance the CPU by exactly one clock cycle.
    fn tick(&mut self, pins: Pins) -> Pins;

    /// Returns the current program counter, bank included.
    ///
    /// Returns `u32` so 24-bit address spaces fit without truncation.
    fn pc(&self) -> u32;

    /// Returns a copy of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is stopped and waiting for a reset.
    fn is_halted(&self) -> bool;

    /// Restart the CPU and return the pins that begin its reset sequence.
    fn reset(&mut self) -> Pins;
}
