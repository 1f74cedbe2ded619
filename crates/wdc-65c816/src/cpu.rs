//! 65816 CPU implementation.
//!
//! Each `tick()` is one clock cycle. The pins passed in carry the answer to
//! the request made by the previous tick (the byte read, or nothing for a
//! write or internal cycle); the pins returned carry the next request. An
//! instruction is a sequence of micro-steps numbered from zero, one per
//! tick, and the step that completes it always requests the next opcode
//! fetch (VDA and VPA together).
//!
//! Interrupt timing follows the usual 65xx pipeline. IRQ is a level input
//! gated by the I flag and must be held during the two cycles before a
//! fetch; NMI is latched on its rising edge. At the fetch boundary a pending
//! request (RES, then NMI, then IRQ) replaces the opcode with a forced BRK.

use emu_core::{Cpu, Observable, Pins, Value};

use crate::Registers;
use crate::flags::{B, C, D, I, N, V, X, Z};
use crate::opcodes::{Instr, Mode, OPCODES, Op};

/// Lines owned by the CPU; everything else in the pin word passes through.
const DRIVEN: u64 =
    Pins::A | Pins::BA | Pins::RW | Pins::VDA | Pins::VPA | Pins::VPB | Pins::E | Pins::MLB;

/// First micro-step of the operand data phase shared by all memory modes.
pub(crate) const DATA: u8 = 0x10;

const BRK_IRQ: u8 = 1 << 0;
const BRK_NMI: u8 = 1 << 1;
const BRK_RESET: u8 = 1 << 2;

/// CPU construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuConfig {
    /// Honour the D flag in ADC/SBC. When false, arithmetic is always binary.
    pub bcd_enabled: bool,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self { bcd_enabled: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum State {
    Running,
    /// WAI: idle until an interrupt line is asserted.
    Waiting,
    /// STP: idle until reset.
    Stopped,
}

/// The WDC 65C816.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct W65c816 {
    pub regs: Registers,
    opcode: u8,
    step: u8,
    /// Effective address of the current memory operand.
    pub(crate) ea: u32,
    /// Pointer or bank scratch for indirect modes.
    pub(crate) ptr: u32,
    /// Operand / address assembly latch.
    pub(crate) data: u16,
    irq_pip: u16,
    nmi_pip: u16,
    brk_flags: u8,
    /// Pins returned by the last tick, for NMI edge detection.
    pins: Pins,
    pub(crate) bcd_enabled: bool,
    state: State,
    total_cycles: u64,
}

impl Default for W65c816 {
    fn default() -> Self {
        Self::new(CpuConfig::default())
    }
}

impl W65c816 {
    #[must_use]
    pub fn new(config: CpuConfig) -> Self {
        Self {
            regs: Registers::new(),
            opcode: 0,
            step: 0,
            ea: 0,
            ptr: 0,
            data: 0,
            irq_pip: 0,
            nmi_pip: 0,
            brk_flags: 0,
            pins: Pins::new(),
            bcd_enabled: config.bcd_enabled,
            state: State::Running,
            total_cycles: 0,
        }
    }

    /// Create a CPU together with the pins that start its reset sequence.
    ///
    /// Seven ticks later the CPU fetches its first opcode from the address
    /// stored in the reset vector at `$FFFC`.
    #[must_use]
    pub fn init(config: CpuConfig) -> (Self, Pins) {
        let mut cpu = Self::new(config);
        let pins = cpu.reset();
        (cpu, pins)
    }

    /// Place the CPU at an opcode fetch of `addr`, skipping the reset
    /// sequence. Registers are left as they are.
    pub fn prefetch(&mut self, addr: u32) -> Pins {
        self.regs.pbr = (addr >> 16) as u8;
        self.regs.pc = addr as u16;
        self.step = 0;
        self.brk_flags = 0;
        self.state = State::Running;
        let pins = self.fetch(Pins::new());
        self.pins = pins;
        pins
    }

    /// Current opcode.
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Micro-step within the current opcode.
    #[must_use]
    pub const fn step(&self) -> u8 {
        self.step
    }

    /// Total cycles executed.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.total_cycles
    }

    /// True while parked by WAI.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.state == State::Waiting
    }

    /// Execute one clock cycle.
    pub fn tick(&mut self, mut pins: Pins) -> Pins {
        self.total_cycles += 1;

        if pins.any(Pins::NMI) && !self.pins.any(Pins::NMI) {
            self.nmi_pip |= 1;
        }
        if pins.any(Pins::IRQ) && !self.regs.p.is_set(I) {
            self.irq_pip |= 1;
        }

        // RDY freezes the CPU on read cycles only. The NMI latch is sticky,
        // the IRQ level has to be seen again after the stall.
        if pins.is_set(Pins::RW | Pins::RDY) {
            self.pins = pins;
            self.irq_pip <<= 1;
            return pins;
        }

        if pins.is_sync() {
            self.opcode = pins.data();
            self.step = 0;
            if self.irq_pip & 4 != 0 {
                self.brk_flags |= BRK_IRQ;
            }
            if self.nmi_pip & 0xFFFC != 0 {
                self.brk_flags |= BRK_NMI;
            }
            if pins.any(Pins::RES) {
                self.brk_flags |= BRK_RESET;
            }
            self.irq_pip &= 3;
            self.nmi_pip &= 3;

            if self.brk_flags == 0 {
                self.regs.pc = self.regs.pc.wrapping_add(1);
            } else {
                log::trace!(
                    "65816 interrupt entry at ${:06X} (flags {:03b})",
                    self.regs.pc24(),
                    self.brk_flags
                );
                self.opcode = 0x00;
                pins = pins.clear(Pins::RES);
            }
        }

        let out = self.execute(pins);
        self.step = self.step.wrapping_add(1);
        self.pins = out;
        self.irq_pip <<= 1;
        self.nmi_pip <<= 1;
        out
    }

    fn execute(&mut self, pins: Pins) -> Pins {
        let Instr { op, mode } = OPCODES[usize::from(self.opcode)];
        match op {
            Op::Brk | Op::Cop => self.op_break(op, pins),
            Op::Jmp | Op::Jml => self.op_jump(mode, pins),
            Op::Jsr if mode == Mode::AbsoluteIndexedIndirect => self.op_jsr_indexed(pins),
            Op::Jsr => self.op_jsr(pins),
            Op::Jsl => self.op_jsl(pins),
            Op::Rts | Op::Rtl => self.op_return(op, pins),
            Op::Rti => self.op_rti(pins),
            Op::Bpl | Op::Bmi | Op::Bvc | Op::Bvs | Op::Bcc | Op::Bcs | Op::Bne | Op::Beq
            | Op::Bra => {
                let taken = self.branch_taken(op);
                self.op_branch(taken, pins)
            }
            Op::Brl => self.op_brl(pins),
            Op::Php | Op::Phb | Op::Phk => self.op_push_byte(op, pins),
            Op::Pha | Op::Phx | Op::Phy => self.op_push_register(op, pins),
            Op::Phd => self.op_phd(pins),
            Op::Pla | Op::Plx | Op::Ply => self.op_pull_register(op, pins),
            Op::Plb | Op::Plp => self.op_pull_byte(op, pins),
            Op::Pld => self.op_pld(pins),
            Op::Pea => self.op_pea(pins),
            Op::Pei => self.op_pei(pins),
            Op::Per => self.op_per(pins),
            Op::Rep | Op::Sep => self.op_rep_sep(op, pins),
            Op::Xba => self.op_xba(pins),
            Op::Wdm => self.op_wdm(pins),
            Op::Wai => self.op_wai(pins),
            Op::Stp => self.op_stp(pins),
            Op::Mvn | Op::Mvp => self.op_block_move(op, pins),
            _ => self.memory_op(op, mode, pins),
        }
    }

    /// Reached only through a gap in a micro-step sequence.
    #[cold]
    #[inline(never)]
    pub(crate) fn invalid_step(&self) -> ! {
        panic!(
            "65816: opcode ${:02X} has no micro-step {}",
            self.opcode, self.step
        )
    }

    // ========================================================================
    // Bus requests
    // ========================================================================

    fn bus(&self, pins: Pins, addr: u32, control: u64) -> Pins {
        let e = if self.regs.e { Pins::E } else { 0 };
        Pins((pins.0 & !DRIVEN) | control | e).with_address(addr)
    }

    /// Opcode fetch at PBR:PC.
    pub(crate) fn fetch(&self, pins: Pins) -> Pins {
        self.bus(pins, self.regs.pc24(), Pins::RW | Pins::VDA | Pins::VPA)
    }

    /// Operand byte at PBR:PC, advancing PC.
    pub(crate) fn read_pc(&mut self, pins: Pins) -> Pins {
        let out = self.bus(pins, self.regs.pc24(), Pins::RW | Pins::VPA);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        out
    }

    pub(crate) fn read(&self, pins: Pins, addr: u32) -> Pins {
        self.bus(pins, addr, Pins::RW | Pins::VDA)
    }

    pub(crate) fn write(&self, pins: Pins, addr: u32, byte: u8) -> Pins {
        self.bus(pins, addr, Pins::VDA).with_data(byte)
    }

    /// Internal operation cycle: no valid address.
    pub(crate) fn io(&self, pins: Pins) -> Pins {
        self.bus(pins, self.regs.pc24(), Pins::RW)
    }

    fn vector_read(&self, pins: Pins, addr: u16) -> Pins {
        self.bus(pins, u32::from(addr), Pins::RW | Pins::VDA | Pins::VPB)
    }

    /// Push one byte. During reset the cycle becomes a read but S still moves.
    pub(crate) fn push(&mut self, pins: Pins, byte: u8) -> Pins {
        let slot = u32::from(self.regs.push_slot());
        if self.brk_flags & BRK_RESET != 0 {
            self.read(pins, slot)
        } else {
            self.write(pins, slot, byte)
        }
    }

    /// Request the next stack byte; it arrives on the following tick.
    pub(crate) fn pull(&mut self, pins: Pins) -> Pins {
        let slot = u32::from(self.regs.pull_slot());
        self.read(pins, slot)
    }

    /// Direct page address for an operand offset.
    ///
    /// In emulation mode with a page-aligned D the low byte wraps within the
    /// page, as it does on the 6502.
    pub(crate) fn dp_addr(&self, offset: u16) -> u32 {
        let addr = if self.regs.e && self.regs.d & 0xFF == 0 {
            self.regs.d | (offset & 0xFF)
        } else {
            self.regs.d.wrapping_add(offset)
        };
        u32::from(addr)
    }

    /// Extra internal cycle when D is not page-aligned.
    pub(crate) fn dp_penalty(&self) -> bool {
        self.regs.d & 0xFF != 0
    }

    /// Continue with the next micro-step in this same tick.
    pub(crate) fn skip_step(&mut self) {
        self.step += 1;
    }

    /// Jump to `step`; the end of the tick advances past it.
    pub(crate) fn set_step(&mut self, step: u8) {
        self.step = step;
    }

    // ========================================================================
    // Interrupts and software breaks
    // ========================================================================

    fn vector(&self, op: Op) -> u16 {
        let e = self.regs.e;
        if self.brk_flags & BRK_RESET != 0 {
            0xFFFC
        } else if self.brk_flags & BRK_NMI != 0 {
            if e { 0xFFFA } else { 0xFFEA }
        } else if self.brk_flags & BRK_IRQ != 0 {
            if e { 0xFFFE } else { 0xFFEE }
        } else if op == Op::Cop {
            if e { 0xFFF4 } else { 0xFFE4 }
        } else if e {
            0xFFFE
        } else {
            0xFFE6
        }
    }

    /// BRK, COP, IRQ, NMI and RES: 7 cycles in emulation, 8 native.
    fn op_break(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step {
            0 => {
                if self.brk_flags & BRK_RESET != 0 {
                    self.regs.reset();
                    self.state = State::Running;
                }
                // Emulation mode has no program bank to push.
                let out = if self.brk_flags == 0 { self.read_pc(pins) } else { self.io(pins) };
                if self.regs.e {
                    self.skip_step();
                }
                out
            }
            1 => self.push(pins, self.regs.pbr),
            2 => self.push(pins, (self.regs.pc >> 8) as u8),
            3 => self.push(pins, self.regs.pc as u8),
            4 => {
                let mut p = self.regs.p.0;
                if self.regs.e && self.brk_flags != 0 {
                    p &= !B;
                }
                self.push(pins, p)
            }
            5 => {
                self.regs.p.set(I);
                self.regs.p.clear(D);
                self.regs.pbr = 0;
                self.ea = u32::from(self.vector(op));
                self.vector_read(pins, self.ea as u16)
            }
            6 => {
                self.data = u16::from(pins.data());
                self.vector_read(pins, (self.ea as u16).wrapping_add(1))
            }
            7 => {
                self.regs.pc = self.data | (u16::from(pins.data()) << 8);
                self.brk_flags = 0;
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    fn op_rti(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 | 1 => self.io(pins),
            2 => self.pull(pins),
            3 => {
                self.regs.set_p(pins.data());
                self.pull(pins)
            }
            4 => {
                self.data = u16::from(pins.data());
                self.pull(pins)
            }
            5 => {
                self.data |= u16::from(pins.data()) << 8;
                if self.regs.e {
                    self.regs.pc = self.data;
                    return self.fetch(pins);
                }
                self.pull(pins)
            }
            6 => {
                self.regs.pbr = pins.data();
                self.regs.pc = self.data;
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    fn branch_taken(&self, op: Op) -> bool {
        let p = self.regs.p;
        match op {
            Op::Bpl => !p.is_set(N),
            Op::Bmi => p.is_set(N),
            Op::Bvc => !p.is_set(V),
            Op::Bvs => p.is_set(V),
            Op::Bcc => !p.is_set(C),
            Op::Bcs => p.is_set(C),
            Op::Bne => !p.is_set(Z),
            Op::Beq => p.is_set(Z),
            _ => true,
        }
    }

    /// Bxx rel - 2 cycles, +1 taken, +1 page cross in emulation mode.
    fn op_branch(&mut self, taken: bool, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => {
                if !taken {
                    return self.fetch(pins);
                }
                let offset = pins.data() as i8 as u16;
                self.data = self.regs.pc.wrapping_add(offset);
                self.io(pins)
            }
            2 => {
                if self.regs.e && (self.data ^ self.regs.pc) & 0xFF00 != 0 {
                    return self.io(pins);
                }
                self.skip_step();
                self.op_branch(taken, pins)
            }
            3 => {
                self.regs.pc = self.data;
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// BRL rel16 - 4 cycles.
    fn op_brl(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                self.read_pc(pins)
            }
            2 => {
                self.data |= u16::from(pins.data()) << 8;
                self.io(pins)
            }
            3 => {
                self.regs.pc = self.regs.pc.wrapping_add(self.data);
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// JMP abs (3), JML long (4), JMP (abs) (5), JMP (abs,X) (6), JML [abs] (6).
    fn op_jump(&mut self, mode: Mode, pins: Pins) -> Pins {
        match (mode, self.step) {
            (_, 0) => self.read_pc(pins),
            (_, 1) => {
                self.data = u16::from(pins.data());
                self.read_pc(pins)
            }
            (Mode::Absolute, 2) => {
                self.regs.pc = self.data | (u16::from(pins.data()) << 8);
                self.fetch(pins)
            }

            (Mode::Long, 2) => {
                self.data |= u16::from(pins.data()) << 8;
                self.read_pc(pins)
            }
            (Mode::Long, 3) => {
                self.regs.pbr = pins.data();
                self.regs.pc = self.data;
                self.fetch(pins)
            }

            (Mode::AbsoluteIndirect | Mode::AbsoluteIndirectLong, 2) => {
                self.data |= u16::from(pins.data()) << 8;
                self.read(pins, u32::from(self.data))
            }
            (Mode::AbsoluteIndirect | Mode::AbsoluteIndirectLong, 3) => {
                self.ptr = u32::from(pins.data());
                self.read(pins, u32::from(self.data.wrapping_add(1)))
            }
            (Mode::AbsoluteIndirect, 4) => {
                self.regs.pc = self.ptr as u16 | (u16::from(pins.data()) << 8);
                self.fetch(pins)
            }
            (Mode::AbsoluteIndirectLong, 4) => {
                self.ptr |= u32::from(pins.data()) << 8;
                self.read(pins, u32::from(self.data.wrapping_add(2)))
            }
            (Mode::AbsoluteIndirectLong, 5) => {
                self.regs.pbr = pins.data();
                self.regs.pc = self.ptr as u16;
                self.fetch(pins)
            }

            (Mode::AbsoluteIndexedIndirect, 2) => {
                self.data = (self.data | (u16::from(pins.data()) << 8)).wrapping_add(self.regs.x);
                self.io(pins)
            }
            (Mode::AbsoluteIndexedIndirect, 3) => {
                self.read(pins, self.program_bank(self.data))
            }
            (Mode::AbsoluteIndexedIndirect, 4) => {
                self.ptr = u32::from(pins.data());
                self.read(pins, self.program_bank(self.data.wrapping_add(1)))
            }
            (Mode::AbsoluteIndexedIndirect, 5) => {
                self.regs.pc = self.ptr as u16 | (u16::from(pins.data()) << 8);
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    fn program_bank(&self, addr: u16) -> u32 {
        (u32::from(self.regs.pbr) << 16) | u32::from(addr)
    }

    /// JSR abs - 6 cycles, pushes the address of its last byte.
    fn op_jsr(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                self.read_pc(pins)
            }
            2 => {
                self.data |= u16::from(pins.data()) << 8;
                self.io(pins)
            }
            3 => {
                let ret = self.regs.pc.wrapping_sub(1);
                self.push(pins, (ret >> 8) as u8)
            }
            4 => {
                let ret = self.regs.pc.wrapping_sub(1);
                self.push(pins, ret as u8)
            }
            5 => {
                self.regs.pc = self.data;
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// JSR (abs,X) - 8 cycles. PC is pushed before the high operand byte is read.
    fn op_jsr_indexed(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                self.push(pins, (self.regs.pc >> 8) as u8)
            }
            2 => self.push(pins, self.regs.pc as u8),
            3 => self.read_pc(pins),
            4 => {
                self.data = (self.data | (u16::from(pins.data()) << 8)).wrapping_add(self.regs.x);
                self.io(pins)
            }
            5 => self.read(pins, self.program_bank(self.data)),
            6 => {
                self.ptr = u32::from(pins.data());
                self.read(pins, self.program_bank(self.data.wrapping_add(1)))
            }
            7 => {
                self.regs.pc = self.ptr as u16 | (u16::from(pins.data()) << 8);
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// JSL long - 8 cycles.
    fn op_jsl(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                self.read_pc(pins)
            }
            2 => {
                self.data |= u16::from(pins.data()) << 8;
                self.push(pins, self.regs.pbr)
            }
            3 => self.io(pins),
            4 => self.read_pc(pins),
            5 => {
                self.ptr = u32::from(pins.data());
                let ret = self.regs.pc.wrapping_sub(1);
                self.push(pins, (ret >> 8) as u8)
            }
            6 => {
                let ret = self.regs.pc.wrapping_sub(1);
                self.push(pins, ret as u8)
            }
            7 => {
                self.regs.pbr = self.ptr as u8;
                self.regs.pc = self.data;
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// RTS / RTL - 6 cycles.
    fn op_return(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step {
            0 | 1 => self.io(pins),
            2 => self.pull(pins),
            3 => {
                self.data = u16::from(pins.data());
                self.pull(pins)
            }
            4 => {
                self.data |= u16::from(pins.data()) << 8;
                if op == Op::Rtl { self.pull(pins) } else { self.io(pins) }
            }
            5 => {
                if op == Op::Rtl {
                    self.regs.pbr = pins.data();
                }
                self.regs.pc = self.data.wrapping_add(1);
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    // ========================================================================
    // Stack
    // ========================================================================

    /// PHP / PHB / PHK - 3 cycles.
    fn op_push_byte(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step {
            0 => self.io(pins),
            1 => {
                let value = match op {
                    Op::Php => self.regs.p.0,
                    Op::Phb => self.regs.dbr,
                    _ => self.regs.pbr,
                };
                self.push(pins, value)
            }
            2 => self.fetch(pins),
            _ => self.invalid_step(),
        }
    }

    /// PHA / PHX / PHY - 3 cycles, +1 when 16-bit. High byte goes first.
    fn op_push_register(&mut self, op: Op, pins: Pins) -> Pins {
        let value = match op {
            Op::Pha => self.regs.c,
            Op::Phx => self.regs.x,
            _ => self.regs.y,
        };
        match self.step {
            0 => self.io(pins),
            1 => {
                if self.is_wide(op) {
                    return self.push(pins, (value >> 8) as u8);
                }
                self.skip_step();
                self.op_push_register(op, pins)
            }
            2 => self.push(pins, value as u8),
            3 => self.fetch(pins),
            _ => self.invalid_step(),
        }
    }

    /// PHD - 4 cycles.
    fn op_phd(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.io(pins),
            1 => self.push(pins, (self.regs.d >> 8) as u8),
            2 => self.push(pins, self.regs.d as u8),
            3 => self.fetch(pins),
            _ => self.invalid_step(),
        }
    }

    /// PLA / PLX / PLY - 4 cycles, +1 when 16-bit.
    fn op_pull_register(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step {
            0 | 1 => self.io(pins),
            2 => self.pull(pins),
            3 => {
                self.data = u16::from(pins.data());
                if self.is_wide(op) {
                    return self.pull(pins);
                }
                self.load_pulled(op, self.data);
                self.fetch(pins)
            }
            4 => {
                let value = self.data | (u16::from(pins.data()) << 8);
                self.load_pulled(op, value);
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    fn load_pulled(&mut self, op: Op, value: u16) {
        let wide = self.is_wide(op);
        match op {
            Op::Pla => self.set_acc(value, wide),
            Op::Plx => self.regs.x = value,
            _ => self.regs.y = value,
        }
        self.regs.p.update_nz(value, wide);
    }

    /// PLB / PLP - 4 cycles.
    fn op_pull_byte(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step {
            0 | 1 => self.io(pins),
            2 => self.pull(pins),
            3 => {
                let value = pins.data();
                if op == Op::Plp {
                    self.regs.set_p(value);
                } else {
                    self.regs.dbr = value;
                    self.regs.p.update_nz(u16::from(value), false);
                }
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// PLD - 5 cycles.
    fn op_pld(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 | 1 => self.io(pins),
            2 => self.pull(pins),
            3 => {
                self.data = u16::from(pins.data());
                self.pull(pins)
            }
            4 => {
                self.regs.d = self.data | (u16::from(pins.data()) << 8);
                self.regs.p.update_nz(self.regs.d, true);
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// PEA abs - 5 cycles.
    fn op_pea(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                self.read_pc(pins)
            }
            2 => {
                self.data |= u16::from(pins.data()) << 8;
                self.push(pins, (self.data >> 8) as u8)
            }
            3 => self.push(pins, self.data as u8),
            4 => self.fetch(pins),
            _ => self.invalid_step(),
        }
    }

    /// PEI (dp) - 6 cycles, +1 if D is not page-aligned.
    fn op_pei(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => {
                self.ptr = u32::from(pins.data());
                if self.dp_penalty() {
                    return self.io(pins);
                }
                self.skip_step();
                self.op_pei(pins)
            }
            2 => self.read(pins, self.dp_addr(self.ptr as u16)),
            3 => {
                self.data = u16::from(pins.data());
                self.read(pins, self.dp_addr((self.ptr as u16).wrapping_add(1)))
            }
            4 => {
                self.data |= u16::from(pins.data()) << 8;
                self.push(pins, (self.data >> 8) as u8)
            }
            5 => self.push(pins, self.data as u8),
            6 => self.fetch(pins),
            _ => self.invalid_step(),
        }
    }

    /// PER rel16 - 6 cycles.
    fn op_per(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                self.read_pc(pins)
            }
            2 => {
                self.data |= u16::from(pins.data()) << 8;
                self.io(pins)
            }
            3 => {
                self.data = self.regs.pc.wrapping_add(self.data);
                self.push(pins, (self.data >> 8) as u8)
            }
            4 => self.push(pins, self.data as u8),
            5 => self.fetch(pins),
            _ => self.invalid_step(),
        }
    }

    // ========================================================================
    // Mode and miscellaneous
    // ========================================================================

    /// REP / SEP #imm - 3 cycles.
    fn op_rep_sep(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => {
                let mask = pins.data();
                let p = if op == Op::Rep { self.regs.p.0 & !mask } else { self.regs.p.0 | mask };
                self.regs.set_p(p);
                self.io(pins)
            }
            2 => self.fetch(pins),
            _ => self.invalid_step(),
        }
    }

    /// XBA - 3 cycles.
    fn op_xba(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 | 1 => self.io(pins),
            2 => {
                self.regs.c = self.regs.c.rotate_left(8);
                self.regs.p.update_nz(self.regs.c, false);
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// WDM - 2 bytes, 2 cycles, no operation.
    fn op_wdm(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => self.fetch(pins),
            _ => self.invalid_step(),
        }
    }

    /// WAI - 3 cycles, then idle until IRQ, NMI or RES.
    ///
    /// An IRQ wakes the CPU even while I is set; it then simply continues
    /// with the next instruction.
    fn op_wai(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.io(pins),
            1 => {
                self.state = State::Waiting;
                self.io(pins)
            }
            2 => {
                // Release once the pipelines guarantee service at the fetch.
                let wake = self.irq_pip & 2 != 0
                    || self.nmi_pip & 0xFFFE != 0
                    || (pins.any(Pins::IRQ) && self.regs.p.is_set(I))
                    || pins.any(Pins::RES);
                if wake {
                    self.state = State::Running;
                    return self.fetch(pins);
                }
                self.step -= 1;
                self.io(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// STP - idle until RES.
    fn op_stp(&mut self, pins: Pins) -> Pins {
        match self.step {
            0 => self.io(pins),
            1 => {
                self.state = State::Stopped;
                self.io(pins)
            }
            2 => {
                if pins.any(Pins::RES) {
                    self.state = State::Running;
                    return self.fetch(pins);
                }
                self.step -= 1;
                self.io(pins)
            }
            _ => self.invalid_step(),
        }
    }

    /// MVN / MVP - 7 cycles per byte, repeated until C wraps to $FFFF.
    fn op_block_move(&mut self, op: Op, pins: Pins) -> Pins {
        match self.step {
            0 => self.read_pc(pins),
            1 => {
                self.data = u16::from(pins.data());
                self.read_pc(pins)
            }
            2 => {
                self.ptr = u32::from(pins.data());
                self.regs.dbr = self.data as u8;
                self.read(pins, (self.ptr << 16) | u32::from(self.regs.x))
            }
            3 => {
                let dst = (u32::from(self.regs.dbr) << 16) | u32::from(self.regs.y);
                self.write(pins, dst, pins.data())
            }
            4 => {
                let mask = if self.regs.x16() { 0xFFFF } else { 0x00FF };
                let delta = if op == Op::Mvn { 1 } else { 0xFFFF };
                self.regs.x = self.regs.x.wrapping_add(delta) & mask;
                self.regs.y = self.regs.y.wrapping_add(delta) & mask;
                self.regs.c = self.regs.c.wrapping_sub(1);
                self.io(pins)
            }
            5 => self.io(pins),
            6 => {
                if self.regs.c != 0xFFFF {
                    self.regs.pc = self.regs.pc.wrapping_sub(3);
                }
                self.fetch(pins)
            }
            _ => self.invalid_step(),
        }
    }
}

impl Cpu for W65c816 {
    type Registers = Registers;

    fn tick(&mut self, pins: Pins) -> Pins {
        W65c816::tick(self, pins)
    }

    fn pc(&self) -> u32 {
        self.regs.pc24()
    }

    fn registers(&self) -> Self::Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.state == State::Stopped
    }

    fn reset(&mut self) -> Pins {
        *self = Self::new(CpuConfig { bcd_enabled: self.bcd_enabled });
        let pins = Pins(Pins::RW | Pins::VDA | Pins::VPA | Pins::RES | Pins::E);
        self.pins = pins;
        pins
    }
}

impl Observable for W65c816 {
    fn query(&self, path: &str) -> Option<Value> {
        let p = self.regs.p;
        match path {
            "pc" => Some(self.regs.pc24().into()),
            "a" => Some(self.regs.a().into()),
            "b" => Some(self.regs.b().into()),
            "c" => Some(self.regs.c.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" => Some(self.regs.s.into()),
            "d" => Some(self.regs.d.into()),
            "dbr" => Some(self.regs.dbr.into()),
            "pbr" => Some(self.regs.pbr.into()),
            "p" => Some(p.0.into()),
            "e" => Some(self.regs.e.into()),
            "flags.n" => Some(p.is_set(N).into()),
            "flags.v" => Some(p.is_set(V).into()),
            "flags.m" => Some(p.is_set(crate::flags::M).into()),
            "flags.x" => Some(p.is_set(X).into()),
            "flags.d" => Some(p.is_set(D).into()),
            "flags.i" => Some(p.is_set(I).into()),
            "flags.z" => Some(p.is_set(Z).into()),
            "flags.c" => Some(p.is_set(C).into()),
            "opcode" => Some(self.opcode.into()),
            "step" => Some(self.step.into()),
            "cycle" => Some(self.total_cycles.into()),
            "waiting" => Some(self.is_waiting().into()),
            "halted" => Some(self.is_halted().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "a", "b", "c", "x", "y", "s", "d", "dbr", "pbr", "p", "e", "flags.n",
            "flags.v", "flags.m", "flags.x", "flags.d", "flags.i", "flags.z", "flags.c", "opcode",
            "step", "cycle", "waiting", "halted",
        ]
    }
}
