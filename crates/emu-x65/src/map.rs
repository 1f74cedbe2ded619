//! Bank 0 I/O windows and chip-select decode.

use std::ops::RangeInclusive;

use emu_core::Pins;

/// SGU-1 sound unit registers.
pub const SGU_WINDOW: RangeInclusive<u16> = 0xFC00..=0xFC3F;
/// CGIA video registers.
pub const CGIA_WINDOW: RangeInclusive<u16> = 0xFF00..=0xFF3F;
/// TCA6416A I/O expander registers.
pub const GPIO_WINDOW: RangeInclusive<u16> = 0xFF80..=0xFF87;
/// RIA816 registers. The CPU vectors above it are RAM.
pub const RIA_WINDOW: RangeInclusive<u16> = 0xFFC0..=0xFFDF;

/// Set the chip select for a valid bank 0 access inside a chip window.
///
/// Anything else (other banks, gaps between windows, internal cycles) is
/// left unselected and goes to RAM.
#[must_use]
pub fn decode(pins: Pins) -> Pins {
    if !pins.is_valid() || pins.bank() != 0 {
        return pins;
    }
    let addr = pins.addr16();
    let select = if CGIA_WINDOW.contains(&addr) {
        Pins::CS_CGIA
    } else if GPIO_WINDOW.contains(&addr) {
        Pins::CS_GPIO
    } else if RIA_WINDOW.contains(&addr) {
        Pins::CS_RIA
    } else if SGU_WINDOW.contains(&addr) {
        Pins::CS_SGU
    } else {
        0
    };
    pins.set(select)
}
