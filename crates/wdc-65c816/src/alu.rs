//! Operation semantics, shared by every addressing mode.

use crate::cpu::W65c816;
use crate::flags::{C, D, I, N, V, Z};
use crate::opcodes::Op;

const fn mask(wide: bool) -> u16 {
    if wide { 0xFFFF } else { 0x00FF }
}

const fn sign(wide: bool) -> u16 {
    if wide { 0x8000 } else { 0x0080 }
}

impl W65c816 {
    fn acc(&self, wide: bool) -> u16 {
        self.regs.c & mask(wide)
    }

    /// Store an accumulator result. In 8-bit mode B is preserved.
    pub(crate) fn set_acc(&mut self, value: u16, wide: bool) {
        if wide {
            self.regs.c = value;
        } else {
            self.regs.set_a(value as u8);
        }
    }

    /// Value written by a store operation.
    pub(crate) fn store_value(&self, op: Op) -> u16 {
        match op {
            Op::Sta => self.regs.c,
            Op::Stx => self.regs.x,
            Op::Sty => self.regs.y,
            _ => 0,
        }
    }

    pub(crate) fn execute_read(&mut self, op: Op, value: u16) {
        let wide = self.is_wide(op);
        match op {
            Op::Lda => {
                self.set_acc(value, wide);
                self.regs.p.update_nz(value, wide);
            }
            Op::Ldx => {
                self.regs.x = value;
                self.regs.p.update_nz(value, wide);
            }
            Op::Ldy => {
                self.regs.y = value;
                self.regs.p.update_nz(value, wide);
            }
            Op::Ora | Op::And | Op::Eor => {
                let a = self.acc(wide);
                let result = match op {
                    Op::Ora => a | value,
                    Op::And => a & value,
                    _ => a ^ value,
                };
                self.set_acc(result, wide);
                self.regs.p.update_nz(result, wide);
            }
            Op::Adc => self.add_with_carry(value, wide, false),
            Op::Sbc => self.add_with_carry(!value, wide, true),
            Op::Cmp => self.compare(self.regs.c, value, wide),
            Op::Cpx => self.compare(self.regs.x, value, wide),
            Op::Cpy => self.compare(self.regs.y, value, wide),
            Op::Bit => {
                let sign = sign(wide);
                self.regs.p.set_if(N, value & sign != 0);
                self.regs.p.set_if(V, value & (sign >> 1) != 0);
                self.regs.p.set_if(Z, self.acc(wide) & value == 0);
            }
            // BIT #imm only affects Z.
            Op::BitImm => self.regs.p.set_if(Z, self.acc(wide) & value == 0),
            _ => unreachable!("{op:?} has no read semantics"),
        }
    }

    fn compare(&mut self, register: u16, value: u16, wide: bool) {
        let r = register & mask(wide);
        let v = value & mask(wide);
        self.regs.p.set_if(C, r >= v);
        self.regs.p.update_nz(r.wrapping_sub(v), wide);
    }

    /// ADC, and SBC with the operand already complemented.
    ///
    /// Decimal mode adjusts one nibble at a time; the top digit's adjustment
    /// happens after V is taken from the unadjusted sum.
    fn add_with_carry(&mut self, value: u16, wide: bool, subtract: bool) {
        let m = i32::from(mask(wide));
        let a = i32::from(self.acc(wide));
        let data = i32::from(value) & m;
        let mut carry = i32::from(self.regs.p.is_set(C));
        let decimal = self.bcd_enabled && self.regs.p.is_set(D);
        let digits = if wide { 4 } else { 2 };

        let adjust = |r: i32, shift: u32| -> i32 {
            if subtract {
                if r < 0x10 << shift { r - (6 << shift) } else { r }
            } else if r >= 0xA << shift {
                r + (6 << shift)
            } else {
                r
            }
        };

        let mut result = if decimal {
            let mut r = 0;
            for digit in 0..digits {
                let shift = digit * 4;
                let nibble = 0xF << shift;
                r = (a & nibble) + (data & nibble) + (carry << shift) + (r & ((1 << shift) - 1));
                if digit + 1 < digits {
                    r = adjust(r, shift);
                    carry = i32::from(r >= 0x10 << shift);
                }
            }
            r
        } else {
            a + data + carry
        };

        let sign = i32::from(sign(wide));
        self.regs.p.set_if(V, !(a ^ data) & (a ^ result) & sign != 0);
        if decimal {
            result = adjust(result, (digits - 1) * 4);
        }
        self.regs.p.set_if(C, result > m);

        let result = (result & m) as u16;
        self.set_acc(result, wide);
        self.regs.p.update_nz(result, wide);
    }

    /// Shift, rotate, increment and bit test-and-set/reset.
    pub(crate) fn execute_modify(&mut self, op: Op, value: u16, wide: bool) -> u16 {
        let m = mask(wide);
        let sign = sign(wide);
        let v = value & m;
        let carry_in = self.regs.p.is_set(C);
        let result = match op {
            Op::Asl => {
                self.regs.p.set_if(C, v & sign != 0);
                (v << 1) & m
            }
            Op::Lsr => {
                self.regs.p.set_if(C, v & 1 != 0);
                v >> 1
            }
            Op::Rol => {
                self.regs.p.set_if(C, v & sign != 0);
                ((v << 1) | u16::from(carry_in)) & m
            }
            Op::Ror => {
                self.regs.p.set_if(C, v & 1 != 0);
                (v >> 1) | if carry_in { sign } else { 0 }
            }
            Op::Inc => v.wrapping_add(1) & m,
            Op::Dec => v.wrapping_sub(1) & m,
            Op::Tsb | Op::Trb => {
                let a = self.acc(wide);
                self.regs.p.set_if(Z, a & v == 0);
                return if op == Op::Tsb { v | a } else { v & !a };
            }
            _ => unreachable!("{op:?} has no read-modify-write semantics"),
        };
        self.regs.p.update_nz(result, wide);
        result
    }

    /// Register-only operations.
    pub(crate) fn execute_implied(&mut self, op: Op) {
        let m16 = self.regs.m16();
        let x16 = self.regs.x16();
        let xmask = mask(x16);
        let regs = &mut self.regs;
        match op {
            Op::Clc => regs.p.clear(C),
            Op::Sec => regs.p.set(C),
            Op::Cli => regs.p.clear(I),
            Op::Sei => regs.p.set(I),
            Op::Cld => regs.p.clear(D),
            Op::Sed => regs.p.set(D),
            Op::Clv => regs.p.clear(V),
            Op::Nop => {}

            Op::Inx => {
                regs.x = regs.x.wrapping_add(1) & xmask;
                regs.p.update_nz(regs.x, x16);
            }
            Op::Iny => {
                regs.y = regs.y.wrapping_add(1) & xmask;
                regs.p.update_nz(regs.y, x16);
            }
            Op::Dex => {
                regs.x = regs.x.wrapping_sub(1) & xmask;
                regs.p.update_nz(regs.x, x16);
            }
            Op::Dey => {
                regs.y = regs.y.wrapping_sub(1) & xmask;
                regs.p.update_nz(regs.y, x16);
            }

            Op::Tax | Op::Tay => {
                let value = regs.c & xmask;
                if op == Op::Tax {
                    regs.x = value;
                } else {
                    regs.y = value;
                }
                regs.p.update_nz(value, x16);
            }
            Op::Txa | Op::Tya => {
                let value = if op == Op::Txa { regs.x } else { regs.y };
                if m16 {
                    regs.c = value;
                } else {
                    regs.set_a(value as u8);
                }
                regs.p.update_nz(value, m16);
            }
            Op::Txy => {
                regs.y = regs.x;
                regs.p.update_nz(regs.y, x16);
            }
            Op::Tyx => {
                regs.x = regs.y;
                regs.p.update_nz(regs.x, x16);
            }
            Op::Tsx => {
                regs.x = regs.s & xmask;
                regs.p.update_nz(regs.x, x16);
            }
            Op::Txs => {
                regs.s = if regs.e { 0x0100 | (regs.x & 0xFF) } else { regs.x };
            }
            Op::Tcs => {
                regs.s = if regs.e { 0x0100 | (regs.c & 0xFF) } else { regs.c };
            }
            Op::Tsc => {
                regs.c = regs.s;
                regs.p.update_nz(regs.c, true);
            }
            Op::Tcd => {
                regs.d = regs.c;
                regs.p.update_nz(regs.d, true);
            }
            Op::Tdc => {
                regs.c = regs.d;
                regs.p.update_nz(regs.c, true);
            }
            Op::Xce => {
                let carry = regs.p.is_set(C);
                regs.p.set_if(C, regs.e);
                regs.set_emulation(carry);
            }
            _ => unreachable!("{op:?} is not a register operation"),
        }
    }
}
