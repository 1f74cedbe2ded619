//! The X65 pin bus.
//!
//! A single 64-bit value carries every address, data and control line shared
//! between the CPU and the chips for one clock cycle. The CPU drives the
//! address, direction and valid-address lines; the bus dispatcher drives the
//! chip selects; exactly one party drives the data lines per cycle.
//!
//! | Bits  | Signal                                   |
//! |-------|------------------------------------------|
//! | 0-15  | A0-A15                                   |
//! | 16-23 | D0-D7                                    |
//! | 24    | RW (set = read)                          |
//! | 25    | VDA, valid data address                  |
//! | 26    | VPA, valid program address               |
//! | 27    | VPB, vector pull                         |
//! | 28    | E, emulation mode status                 |
//! | 29    | MLB, memory lock (read-modify-write)     |
//! | 32    | IRQ (level)                              |
//! | 33    | NMI (edge)                               |
//! | 34    | RDY (set = stall read cycles)            |
//! | 35    | RES                                      |
//! | 40-47 | BA0-BA7, bank address                    |
//! | 48-51 | chip selects                             |
//! | 56-59 | chip output lines                        |

use std::fmt;

/// Snapshot of all bus lines for one clock cycle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pins(pub u64);

impl Pins {
    /// Address lines A0-A15.
    pub const A: u64 = 0xFFFF;
    /// Data lines D0-D7.
    pub const D: u64 = 0xFF << 16;
    /// Read/write direction (set = read).
    pub const RW: u64 = 1 << 24;
    /// Valid data address.
    pub const VDA: u64 = 1 << 25;
    /// Valid program address.
    pub const VPA: u64 = 1 << 26;
    /// Vector pull.
    pub const VPB: u64 = 1 << 27;
    /// Emulation mode status output.
    pub const E: u64 = 1 << 28;
    /// Memory lock, asserted during read-modify-write cycles.
    pub const MLB: u64 = 1 << 29;
    /// Maskable interrupt request.
    pub const IRQ: u64 = 1 << 32;
    /// Non-maskable interrupt request.
    pub const NMI: u64 = 1 << 33;
    /// Ready: stall the CPU on read cycles while set.
    pub const RDY: u64 = 1 << 34;
    /// Reset request.
    pub const RES: u64 = 1 << 35;
    /// Bank address lines BA0-BA7.
    pub const BA: u64 = 0xFF << 40;

    /// Chip select: CGIA video adaptor.
    pub const CS_CGIA: u64 = 1 << 48;
    /// Chip select: TCA6416A I/O expander.
    pub const CS_GPIO: u64 = 1 << 49;
    /// Chip select: RIA816 bridge chip.
    pub const CS_RIA: u64 = 1 << 50;
    /// Chip select: SGU-1 sound unit.
    pub const CS_SGU: u64 = 1 << 51;
    /// All chip selects.
    pub const CS_ANY: u64 = Self::CS_CGIA | Self::CS_GPIO | Self::CS_RIA | Self::CS_SGU;

    /// CGIA interrupt output.
    pub const CGIA_INT: u64 = 1 << 56;
    /// TCA6416A interrupt output.
    pub const GPIO_INT: u64 = 1 << 57;
    /// RIA816 interrupt output.
    pub const RIA_IRQ: u64 = 1 << 58;
    /// SGU-1 sample-ready strobe.
    pub const SGU_SAMPLE: u64 = 1 << 59;
    /// All chip output lines.
    pub const CHIP_OUT: u64 = Self::CGIA_INT | Self::GPIO_INT | Self::RIA_IRQ | Self::SGU_SAMPLE;

    /// Full 24-bit address mask.
    pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// 24-bit address: bank lines on top of A0-A15.
    #[must_use]
    pub const fn address(self) -> u32 {
        ((self.0 & Self::A) as u32) | (((self.0 & Self::BA) >> 24) as u32)
    }

    /// Set the 24-bit address; higher bits are dropped.
    #[must_use]
    pub const fn with_address(self, addr: u32) -> Self {
        let addr = (addr & Self::ADDRESS_MASK) as u64;
        Self((self.0 & !(Self::A | Self::BA)) | (addr & Self::A) | ((addr & 0xFF_0000) << 24))
    }

    /// Low 16 address lines.
    #[must_use]
    pub const fn addr16(self) -> u16 {
        (self.0 & Self::A) as u16
    }

    /// Bank address lines.
    #[must_use]
    pub const fn bank(self) -> u8 {
        ((self.0 & Self::BA) >> 40) as u8
    }

    #[must_use]
    pub const fn data(self) -> u8 {
        ((self.0 & Self::D) >> 16) as u8
    }

    #[must_use]
    pub const fn with_data(self, data: u8) -> Self {
        Self((self.0 & !Self::D) | ((data as u64) << 16))
    }

    /// True if every line in `mask` is set.
    #[must_use]
    pub const fn is_set(self, mask: u64) -> bool {
        self.0 & mask == mask
    }

    /// True if any line in `mask` is set.
    #[must_use]
    pub const fn any(self, mask: u64) -> bool {
        self.0 & mask != 0
    }

    #[must_use]
    pub const fn set(self, mask: u64) -> Self {
        Self(self.0 | mask)
    }

    #[must_use]
    pub const fn clear(self, mask: u64) -> Self {
        Self(self.0 & !mask)
    }

    /// Set or clear `mask` depending on `on`.
    #[must_use]
    pub const fn with(self, mask: u64, on: bool) -> Self {
        if on { self.set(mask) } else { self.clear(mask) }
    }

    #[must_use]
    pub const fn is_read(self) -> bool {
        self.0 & Self::RW != 0
    }

    #[must_use]
    pub const fn is_write(self) -> bool {
        self.0 & Self::RW == 0
    }

    /// Opcode fetch cycle: VDA and VPA both asserted.
    #[must_use]
    pub const fn is_sync(self) -> bool {
        self.is_set(Self::VDA | Self::VPA)
    }

    /// Any bus cycle with a meaningful address.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.any(Self::VDA | Self::VPA)
    }
}

impl fmt::Debug for Pins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |mask: u64, name: &'static str| if self.any(mask) { name } else { "" };
        write!(
            f,
            "Pins(${:06X} D=${:02X} {}{}{}{}{}{}{}{}{})",
            self.address(),
            self.data(),
            if self.is_read() { "R" } else { "W" },
            flag(Self::VDA, " VDA"),
            flag(Self::VPA, " VPA"),
            flag(Self::VPB, " VPB"),
            flag(Self::IRQ, " IRQ"),
            flag(Self::NMI, " NMI"),
            flag(Self::RDY, " RDY"),
            flag(Self::RES, " RES"),
            flag(Self::CS_ANY, " CS"),
        )
    }
}

impl From<u64> for Pins {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Pins> for u64 {
    fn from(pins: Pins) -> Self {
        pins.0
    }
}
