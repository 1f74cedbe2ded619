//! 65816 register file.

use crate::flags::{I, M, Status, X};

/// Programmer-visible registers.
///
/// The accumulator is held as one 16-bit value; `a()` and `b()` give the low
/// and high halves by shift and mask. In emulation mode the stack is pinned
/// to page 1 and the M and X status bits read as set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    /// Accumulator (C = B:A).
    pub c: u16,
    pub x: u16,
    pub y: u16,
    /// Stack pointer.
    pub s: u16,
    /// Direct page base.
    pub d: u16,
    /// Data bank.
    pub dbr: u8,
    /// Program bank.
    pub pbr: u8,
    pub pc: u16,
    pub p: Status,
    /// Emulation mode.
    pub e: bool,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Power-on state: emulation mode, stack at $01FF.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            c: 0,
            x: 0,
            y: 0,
            s: 0x01FF,
            d: 0,
            dbr: 0,
            pbr: 0,
            pc: 0,
            p: Status::new(),
            e: true,
        }
    }

    /// Low accumulator byte.
    #[must_use]
    pub const fn a(&self) -> u8 {
        (self.c & 0xFF) as u8
    }

    /// High accumulator byte.
    #[must_use]
    pub const fn b(&self) -> u8 {
        (self.c >> 8) as u8
    }

    pub fn set_a(&mut self, value: u8) {
        self.c = (self.c & 0xFF00) | u16::from(value);
    }

    pub fn set_b(&mut self, value: u8) {
        self.c = (self.c & 0x00FF) | (u16::from(value) << 8);
    }

    /// True when the accumulator and memory operands are 16-bit.
    #[must_use]
    pub const fn m16(&self) -> bool {
        !self.e && !self.p.is_set(M)
    }

    /// True when the index registers are 16-bit.
    #[must_use]
    pub const fn x16(&self) -> bool {
        !self.e && !self.p.is_set(X)
    }

    /// Load P, applying the mode constraints that follow from it.
    pub fn set_p(&mut self, value: u8) {
        self.p = Status(value);
        if self.e {
            self.p.set(M | X);
        }
        if self.p.is_set(X) {
            self.x &= 0xFF;
            self.y &= 0xFF;
        }
    }

    /// Enter or leave emulation mode.
    pub fn set_emulation(&mut self, on: bool) {
        self.e = on;
        if on {
            self.p.set(M | X);
            self.x &= 0xFF;
            self.y &= 0xFF;
            self.s = 0x0100 | (self.s & 0xFF);
        }
    }

    /// Register changes made by the hardware reset sequence.
    pub fn reset(&mut self) {
        self.set_emulation(true);
        self.d = 0;
        self.dbr = 0;
        self.pbr = 0;
        self.p.set(I);
        self.p.clear(crate::flags::D);
    }

    /// Full program counter including bank.
    #[must_use]
    pub const fn pc24(&self) -> u32 {
        ((self.pbr as u32) << 16) | self.pc as u32
    }

    /// Post-decrement S for a push, returning the slot address.
    pub(crate) fn push_slot(&mut self) -> u16 {
        let slot = self.s;
        self.s = if self.e {
            0x0100 | (self.s.wrapping_sub(1) & 0xFF)
        } else {
            self.s.wrapping_sub(1)
        };
        slot
    }

    /// Pre-increment S for a pull, returning the slot address.
    pub(crate) fn pull_slot(&mut self) -> u16 {
        self.s = if self.e {
            0x0100 | (self.s.wrapping_add(1) & 0xFF)
        } else {
            self.s.wrapping_add(1)
        };
        self.s
    }
}
