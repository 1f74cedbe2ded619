//! Memory-operand addressing modes.
//!
//! Each mode walks its own address-calculation steps and then hands the
//! effective address to a shared data phase (`DATA..`), which performs the
//! 8- or 16-bit read, write or read-modify-write. The width is looked up
//! when the data phase runs, never at decode time.

use emu_core::Pins;

use crate::cpu::{DATA, W65c816};
use crate::opcodes::{Access, Mode, Op, Width};

impl W65c816 {
    /// True if `op` works on a 16-bit operand with the current mode bits.
    pub(crate) fn is_wide(&self, op: Op) -> bool {
        match op.width() {
            Width::M => self.regs.m16(),
            Width::X => self.regs.x16(),
        }
    }

    pub(crate) fn memory_op(&mut self, op: Op, mode: Mode, pins: Pins) -> Pins {
        if self.step() >= DATA {
            return self.data_phase(op, pins);
        }
        match mode {
            Mode::Implied | Mode::Accumulator => self.addr_implied(op, mode, pins),
            Mode::Immediate => self.addr_immediate(op, pins),
            Mode::Direct => self.addr_direct(op, pins),
            Mode::DirectX => self.addr_direct_indexed(op, self.regs.x, pins),
            Mode::DirectY => self.addr_direct_indexed(op, self.regs.y, pins),
            Mode::DirectIndirect => self.addr_direct_indirect(op, pins),
            Mode::DirectIndexedIndirect => self.addr_direct_indexed_indirect(op, pins),
            Mode::DirectIndirectIndexed => self.addr_direct_indirect_indexed(op, pins),
            Mode::DirectIndirectLong => self.addr_direct_indirect_long(op, 0, pins),
            Mode::DirectIndirectLongY => self.addr_direct_indirect_long(op, self.regs.y, pins),
            Mode::Absolute => self.addr_absolute(op, pins),
            Mode::AbsoluteX => self.addr_absolute_indexed(op, self.regs.x, pins),
            Mode::AbsoluteY => self.addr_absolute_indexed(op, self.regs.y, pins),
            Mode::Long => self.addr_long(op, 0, pins),
            Mode::LongX => self.addr_long(op, self.regs.x, pins),
            Mode::StackRelative => self.addr_stack_relative(op, pins),
            Mode::StackRelativeIndirectY => self.addr_stack_relative_indirect(op, pins),
            _ => self.invalid_step(),
        }
    }

    fn data_bank(&self, addr: u16) -> u32 {
        (u32::from(self.regs.dbr) << 16) | u32::from(addr)
    }

    fn ea_plus(&self, n: u32) -> u32 {
        self.ea.wrapping_add(n) & 0x00FF_FFFF
    }

    /// Issue the first operand access at `ea` and continue in the data phase.
    fn begin_data(&mut self, op: Op, ea: u32, pins: Pins) -> Pins {
        self.ea = ea & 0x00FF_FFFF;
        self.set_step(DATA - 1);
        match op.access() {
            Access::Read => self.read(pins, self.ea),
            Access::Write => {
                self.data = self.store_value(op);
                self.write(pins, self.ea, self.data as u8)
            }
            Access::Modify => self.read(pins, self.ea).set(Pins::MLB),
            Access::None => self.invalid_step(),
        }
    }

    /// Read: lo [hi]. Write: lo [hi]. Modify: lo [hi], modify, [hi] lo.
    fn data_phase(&mut self, op: Op, pins: Pins) -> Pins {
        let wide = self.is_wide(op);
        match (op.access(), self.step() - DATA) {
            (Access::Read, 0) => {
                let lo = u16::from(pins.data());
                if wide {
                    self.data = lo;
                    return self.read(pins, self.ea_plus(1));
                }
                self.execute_read(op, lo);
                self.fetch(pins)
            }
            (Access::Read, 1) => {
                let value = self.data | (u16::from(pins.data()) << 8);
                self.execute_read(op, value);
                self.fetch(pins)
            }

            (Access::Write, 0) => {
                if wide {
                    return self.write(pins, self.ea_plus(1), (self.data >> 8) as u8);
                }
                self.fetch(pins)
            }
            (Access::Write, 1) => self.fetch(pins),

            (Access::Modify, 0) => {
                self.data = u16::from(pins.data());
                if wide {
                    return self.read(pins, self.ea_plus(1)).set(Pins::MLB);
                }
                self.skip_step();
                self.modify_cycle(pins)
            }
            (Access::Modify, 1) => {
                self.data |= u16::from(pins.data()) << 8;
                self.modify_cycle(pins)
            }
            (Access::Modify, 2) => {
                self.data = self.execute_modify(op, self.data, wide);
                if wide {
                    return self.write(pins, self.ea_plus(1), (self.data >> 8) as u8).set(Pins::MLB);
                }
                self.skip_step();
                self.write(pins, self.ea, self.data as u8).set(Pins::MLB)
            }
            (Access::Modify, 3) => self.write(pins, self.ea, self.data as u8).set(Pins::MLB),
            (Access::Modify, 4) => self.fetch(pins),
            _ => self.invalid_step(),
        }
    }

    /// Emulation mode rewrites the unmodified byte; native mode idles.
    fn modify_cycle(&self, pins: Pins) -> Pins {
        if self.regs.e {
            self.write(pins, self.ea, self.data as u8).set(Pins::MLB)
        } else {
            self.io(pins).set(Pins::MLB)
        }
    }

    /// Indexed modes pay an extra cycle on writes, on 16-bit index or on a
    /// page crossing.
    fn needs_index_cycle(&self, op: Op, base: u32, ea: u32) -> bool {
        op.access() != Access::Read || self.regs.x16() || (base ^ ea) & 0x00FF_FF00 != 0
    }

    // ========================================================================
    // Register-only modes
    // ========================================================================

    /// Implied / accumulator - 2 cycles.
    fn addr_implied(&mut self, op: Op, mode: Mode, pins: Pins) -> Pins {
        match self.step() {
            0 => self.io(pins),
            1 => {
                if mode == Mode::Accumulator {
                    let wide = self.regs.m16();
                    let result = self.execute_modify(op, self.regs.c, wide);
                    self.set_acc(result, wide);
                } else {
                    self.execute_implied(op);
                }
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// #imm - 2 cycles, +1 when 16-bit.
    fn addr_immediate(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                let lo = u16::from(pins.data());
                if self.is_wide(op) {
                    self.data = lo;
                    return self.read_pc(pins);
                }
                self.execute_read(op, lo);
                self.fetch(pins)
            }
            2 => {
                let value = self.data | (u16::from(pins.data()) << 8);
                self.execute_read(op, value);
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    // ========================================================================
    // Direct page
    // ========================================================================

    /// dp - 3 cycles.
    fn addr_direct(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                if self.dp_penalty() {
                    return self.io(pins);
                }
                self.skip_step();
                self.addr_direct(op, pins)
            }
            2 => {
                let ea = self.dp_addr(self.data);
                self.begin_data(op, ea, pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// dp,X / dp,Y - 4 cycles.
    fn addr_direct_indexed(&mut self, op: Op, index: u16, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                if self.dp_penalty() {
                    return self.io(pins);
                }
                self.skip_step();
                self.addr_direct_indexed(op, index, pins)
            }
            2 => self.io(pins),
            3 => {
                let ea = self.dp_addr(self.data.wrapping_add(index));
                self.begin_data(op, ea, pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// (dp) - 5 cycles.
    fn addr_direct_indirect(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                if self.dp_penalty() {
                    return self.io(pins);
                }
                self.skip_step();
                self.addr_direct_indirect(op, pins)
            }
            2 => self.read(pins, self.dp_addr(self.data)),
            3 => {
                self.ptr = u32::from(pins.data());
                self.read(pins, self.dp_addr(self.data.wrapping_add(1)))
            }
            4 => {
                let ptr = self.ptr as u16 | (u16::from(pins.data()) << 8);
                let ea = self.data_bank(ptr);
                self.begin_data(op, ea, pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// (dp,X) - 6 cycles.
    fn addr_direct_indexed_indirect(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                if self.dp_penalty() {
                    return self.io(pins);
                }
                self.skip_step();
                self.addr_direct_indexed_indirect(op, pins)
            }
            2 => {
                self.data = self.data.wrapping_add(self.regs.x);
                self.io(pins)
            }
            3 => self.read(pins, self.dp_addr(self.data)),
            4 => {
                self.ptr = u32::from(pins.data());
                self.read(pins, self.dp_addr(self.data.wrapping_add(1)))
            }
            5 => {
                let ptr = self.ptr as u16 | (u16::from(pins.data()) << 8);
                let ea = self.data_bank(ptr);
                self.begin_data(op, ea, pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// (dp),Y - 5 cycles, +1 for writes, 16-bit index or page crossing.
    fn addr_direct_indirect_indexed(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                if self.dp_penalty() {
                    return self.io(pins);
                }
                self.skip_step();
                self.addr_direct_indirect_indexed(op, pins)
            }
            2 => self.read(pins, self.dp_addr(self.data)),
            3 => {
                self.ptr = u32::from(pins.data());
                self.read(pins, self.dp_addr(self.data.wrapping_add(1)))
            }
            4 => {
                let base = self.data_bank(self.ptr as u16 | (u16::from(pins.data()) << 8));
                self.ea = base.wrapping_add(u32::from(self.regs.y)) & 0x00FF_FFFF;
                if self.needs_index_cycle(op, base, self.ea) {
                    return self.io(pins);
                }
                self.skip_step();
                self.addr_direct_indirect_indexed(op, pins)
            }
            5 => self.begin_data(op, self.ea, pins),
            _ => self.invalid_step(),
        }
    }

    /// [dp] / [dp],Y - 6 cycles.
    fn addr_direct_indirect_long(&mut self, op: Op, index: u16, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                if self.dp_penalty() {
                    return self.io(pins);
                }
                self.skip_step();
                self.addr_direct_indirect_long(op, index, pins)
            }
            2 => self.read(pins, self.dp_addr(self.data)),
            3 => {
                self.ptr = u32::from(pins.data());
                self.read(pins, self.dp_addr(self.data.wrapping_add(1)))
            }
            4 => {
                self.ptr |= u32::from(pins.data()) << 8;
                self.read(pins, self.dp_addr(self.data.wrapping_add(2)))
            }
            5 => {
                let base = self.ptr | (u32::from(pins.data()) << 16);
                self.begin_data(op, base.wrapping_add(u32::from(index)), pins)
            }
            _ => self.invalid_step(),
        }
    }

    // ========================================================================
    // Absolute and long
    // ========================================================================

    /// abs - 4 cycles.
    fn addr_absolute(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                self.read_pc(pins)
            }
            2 => {
                let ea = self.data_bank(self.data | (u16::from(pins.data()) << 8));
                self.begin_data(op, ea, pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// abs,X / abs,Y - 4 cycles, +1 for writes, 16-bit index or page crossing.
    fn addr_absolute_indexed(&mut self, op: Op, index: u16, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                self.read_pc(pins)
            }
            2 => {
                let base = self.data_bank(self.data | (u16::from(pins.data()) << 8));
                self.ea = base.wrapping_add(u32::from(index)) & 0x00FF_FFFF;
                if self.needs_index_cycle(op, base, self.ea) {
                    return self.io(pins);
                }
                self.skip_step();
                self.addr_absolute_indexed(op, index, pins)
            }
            3 => self.begin_data(op, self.ea, pins),
            _ => self.invalid_step(),
        }
    }

    /// long / long,X - 5 cycles.
    fn addr_long(&mut self, op: Op, index: u16, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.ptr = u32::from(pins.data());
                self.read_pc(pins)
            }
            2 => {
                self.ptr |= u32::from(pins.data()) << 8;
                self.read_pc(pins)
            }
            3 => {
                let base = self.ptr | (u32::from(pins.data()) << 16);
                self.begin_data(op, base.wrapping_add(u32::from(index)), pins)
            }
            _ => self.invalid_step(),
        }
    }

    // ========================================================================
    // Stack relative
    // ========================================================================

    /// sr,S - 4 cycles.
    fn addr_stack_relative(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                self.io(pins)
            }
            2 => {
                let ea = u32::from(self.regs.s.wrapping_add(self.data));
                self.begin_data(op, ea, pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// (sr,S),Y - 7 cycles.
    fn addr_stack_relative_indirect(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step() {
            0 => self.read_pc(pins),
            1 => {
                self.data = self.regs.s.wrapping_add(u16::from(pins.data()));
                self.io(pins)
            }
            2 => self.read(pins, u32::from(self.data)),
            3 => {
                self.ptr = u32::from(pins.data());
                self.read(pins, u32::from(self.data.wrapping_add(1)))
            }
            4 => {
                self.ptr |= u32::from(pins.data()) << 8;
                self.io(pins)
            }
            5 => {
                let ea = self.data_bank(self.ptr as u16).wrapping_add(u32::from(self.regs.y));
                self.begin_data(op, ea, pins)
            }
            _ => self.invalid_step(),
        }
    }
}
