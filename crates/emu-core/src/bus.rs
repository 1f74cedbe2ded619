//! Direct memory access interface.

use crate::Pins;

/// Memory fetch path for chips with their own port into shared RAM.
///
/// The video adaptor pulls display data through this trait instead of the
/// CPU-driven bus cycle, so its fetch timing is independent of whatever the
/// CPU is doing in the same tick. Implementations place the byte found at
/// `pins.address()` on the data lines and return the pins.
pub trait DmaBus {
    fn fetch(&self, pins: Pins) -> Pins;

    /// Convenience wrapper returning only the fetched byte.
    fn fetch_byte(&self, address: u32) -> u8 {
        self.fetch(Pins::new().with_address(address)).data()
    }
}

impl DmaBus for [u8] {
    /// Flat memory, mirrored over its length.
    fn fetch(&self, pins: Pins) -> Pins {
        if self.is_empty() {
            return pins.with_data(0xFF);
        }
        let index = pins.address() as usize % self.len();
        pins.with_data(self[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_fetch_mirrors() {
        let mem = [0x11u8, 0x22, 0x33, 0x44];
        assert_eq!(mem[..].fetch_byte(1), 0x22);
        assert_eq!(mem[..].fetch_byte(6), 0x33);
    }

    #[test]
    fn empty_slice_floats_high() {
        let mem: [u8; 0] = [];
        assert_eq!(mem[..].fetch_byte(0x1234), 0xFF);
    }
}
