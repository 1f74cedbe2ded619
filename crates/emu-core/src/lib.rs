//! Core traits and types for the X65 pin-bus emulator.
//!
//! One master clock drives everything. Each tick the CPU produces a pin
//! request, the system decodes it, and every chip is advanced once with the
//! same pin value. Chips that read memory on their own do so through
//! [`DmaBus`].

mod bus;
mod clock;
mod cpu;
mod observable;
mod pins;
mod tickable;
mod ticks;

pub use bus::DmaBus;
pub use clock::MasterClock;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use pins::Pins;
pub use tickable::Chip;
pub use ticks::Ticks;
