//! 65816 processor status register (P).
//!
//! | Bit | Native            | Emulation         |
//! |-----|-------------------|-------------------|
//! | 7   | N negative        | N                 |
//! | 6   | V overflow        | V                 |
//! | 5   | M 8-bit memory/A  | (always 1)        |
//! | 4   | X 8-bit index     | B break (pushed)  |
//! | 3   | D decimal         | D                 |
//! | 2   | I IRQ disable     | I                 |
//! | 1   | Z zero            | Z                 |
//! | 0   | C carry           | C                 |

/// Carry.
pub const C: u8 = 0x01;
/// Zero.
pub const Z: u8 = 0x02;
/// IRQ disable.
pub const I: u8 = 0x04;
/// Decimal mode for ADC/SBC.
pub const D: u8 = 0x08;
/// 8-bit index registers (native mode).
pub const X: u8 = 0x10;
/// Break, sharing the X bit position in emulation mode.
pub const B: u8 = 0x10;
/// 8-bit accumulator and memory (native mode).
pub const M: u8 = 0x20;
/// Overflow.
pub const V: u8 = 0x40;
/// Negative.
pub const N: u8 = 0x80;

/// Processor status register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status(pub u8);

impl Status {
    /// Power-on value: Z set, 8-bit accumulator and index.
    #[must_use]
    pub const fn new() -> Self {
        Self(Z | M | X)
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    /// Set or clear a flag based on condition.
    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Update N and Z from an 8- or 16-bit result.
    pub fn update_nz(&mut self, value: u16, wide: bool) {
        let (mask, sign) = if wide { (0xFFFF, 0x8000) } else { (0x00FF, 0x0080) };
        self.set_if(Z, value & mask == 0);
        self.set_if(N, value & sign != 0);
    }
}
