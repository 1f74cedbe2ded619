//! Flat RAM across the 24-bit address space.

use emu_core::{DmaBus, Pins};

/// X65 RAM. Addresses beyond the installed size mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    ram: Vec<u8>,
    mask: u32,
}

impl Memory {
    /// # Panics
    ///
    /// Panics unless `size` is a power of two between 64 KiB and 16 MiB.
    #[must_use]
    pub fn new(size: usize) -> Self {
        assert!(size.is_power_of_two(), "RAM size must be a power of two");
        assert!(
            (0x1_0000..=0x100_0000).contains(&size),
            "RAM size must be between 64 KiB and 16 MiB"
        );
        Self { ram: vec![0; size], mask: (size - 1) as u32 }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.ram.len()
    }

    #[must_use]
    pub fn read(&self, addr: u32) -> u8 {
        self.ram[(addr & self.mask) as usize]
    }

    pub fn write(&mut self, addr: u32, value: u8) {
        self.ram[(addr & self.mask) as usize] = value;
    }

    /// Copy `bytes` in starting at `addr`, wrapping at the end of RAM.
    pub fn load(&mut self, addr: u32, bytes: &[u8]) {
        for (offset, &byte) in bytes.iter().enumerate() {
            self.write(addr.wrapping_add(offset as u32), byte);
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.ram
    }

    /// Replace the contents. Sizes must match.
    pub(crate) fn restore(&mut self, ram: &[u8]) {
        self.ram.copy_from_slice(ram);
    }
}

impl DmaBus for Memory {
    fn fetch(&self, pins: Pins) -> Pins {
        pins.with_data(self.read(pins.address()))
    }
}
