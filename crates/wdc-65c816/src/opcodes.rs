//! Opcode decode table.
//!
//! Every one of the 256 opcodes maps to an operation and an addressing
//! mode. The table is generated at compile time from [`decode`], so there is
//! no hand-maintained array to drift out of sync.

macro_rules! operations {
    ($($name:ident => $text:literal),* $(,)?) => {
        /// An instruction operation, independent of addressing mode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Op {
            $($name),*
        }

        impl Op {
            /// Assembler mnemonic.
            #[must_use]
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Op::$name => $text),*
                }
            }
        }
    };
}

operations! {
    Adc => "ADC", And => "AND", Asl => "ASL", Bcc => "BCC", Bcs => "BCS", Beq => "BEQ",
    Bit => "BIT", BitImm => "BIT", Bmi => "BMI", Bne => "BNE", Bpl => "BPL", Bra => "BRA",
    Brk => "BRK", Brl => "BRL", Bvc => "BVC", Bvs => "BVS", Clc => "CLC", Cld => "CLD",
    Cli => "CLI", Clv => "CLV", Cmp => "CMP", Cop => "COP", Cpx => "CPX", Cpy => "CPY",
    Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR", Inc => "INC", Inx => "INX",
    Iny => "INY", Jml => "JML", Jmp => "JMP", Jsl => "JSL", Jsr => "JSR", Lda => "LDA",
    Ldx => "LDX", Ldy => "LDY", Lsr => "LSR", Mvn => "MVN", Mvp => "MVP", Nop => "NOP",
    Ora => "ORA", Pea => "PEA", Pei => "PEI", Per => "PER", Pha => "PHA", Phb => "PHB",
    Phd => "PHD", Phk => "PHK", Php => "PHP", Phx => "PHX", Phy => "PHY", Pla => "PLA",
    Plb => "PLB", Pld => "PLD", Plp => "PLP", Plx => "PLX", Ply => "PLY", Rep => "REP",
    Rol => "ROL", Ror => "ROR", Rti => "RTI", Rtl => "RTL", Rts => "RTS", Sbc => "SBC",
    Sec => "SEC", Sed => "SED", Sei => "SEI", Sep => "SEP", Sta => "STA", Stp => "STP",
    Stx => "STX", Sty => "STY", Stz => "STZ", Tax => "TAX", Tay => "TAY", Tcd => "TCD",
    Tcs => "TCS", Tdc => "TDC", Trb => "TRB", Tsb => "TSB", Tsc => "TSC", Tsx => "TSX",
    Txa => "TXA", Txs => "TXS", Txy => "TXY", Tya => "TYA", Tyx => "TYX", Wai => "WAI",
    Wdm => "WDM", Xba => "XBA", Xce => "XCE",
}

/// How an operation touches its memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Modify,
    /// Control flow, stack and register-only operations.
    None,
}

/// Which status bit selects the operand width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Accumulator width (M).
    M,
    /// Index width (X).
    X,
}

impl Op {
    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Op::Lda | Op::Ldx | Op::Ldy | Op::Ora | Op::And | Op::Eor | Op::Adc | Op::Sbc
            | Op::Cmp | Op::Cpx | Op::Cpy | Op::Bit | Op::BitImm => Access::Read,
            Op::Sta | Op::Stx | Op::Sty | Op::Stz => Access::Write,
            Op::Asl | Op::Lsr | Op::Rol | Op::Ror | Op::Inc | Op::Dec | Op::Tsb | Op::Trb => {
                Access::Modify
            }
            _ => Access::None,
        }
    }

    #[must_use]
    pub const fn width(self) -> Width {
        match self {
            Op::Ldx | Op::Ldy | Op::Cpx | Op::Cpy | Op::Stx | Op::Sty | Op::Phx | Op::Phy
            | Op::Plx | Op::Ply => Width::X,
            _ => Width::M,
        }
    }
}

/// Addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// No operand, or the operand lives on the stack.
    Implied,
    /// Operates on the accumulator.
    Accumulator,
    /// `#imm`, width chosen by the operation.
    Immediate,
    /// One operand byte regardless of register width (REP, SEP, WDM and the
    /// BRK/COP signature).
    Immediate8,
    /// `dp`
    Direct,
    /// `dp,X`
    DirectX,
    /// `dp,Y`
    DirectY,
    /// `(dp)`
    DirectIndirect,
    /// `(dp,X)`
    DirectIndexedIndirect,
    /// `(dp),Y`
    DirectIndirectIndexed,
    /// `[dp]`
    DirectIndirectLong,
    /// `[dp],Y`
    DirectIndirectLongY,
    /// `abs`
    Absolute,
    /// `abs,X`
    AbsoluteX,
    /// `abs,Y`
    AbsoluteY,
    /// `long`
    Long,
    /// `long,X`
    LongX,
    /// `sr,S`
    StackRelative,
    /// `(sr,S),Y`
    StackRelativeIndirectY,
    /// 8-bit branch offset.
    Relative,
    /// 16-bit branch offset.
    RelativeLong,
    /// `(abs)`
    AbsoluteIndirect,
    /// `(abs,X)`
    AbsoluteIndexedIndirect,
    /// `[abs]`
    AbsoluteIndirectLong,
    /// `src,dst` bank pair.
    BlockMove,
}

impl Mode {
    /// Operand bytes following the opcode, given the current register widths.
    #[must_use]
    pub const fn operand_len(self, wide: bool) -> u8 {
        match self {
            Mode::Implied | Mode::Accumulator => 0,
            Mode::Immediate => {
                if wide {
                    2
                } else {
                    1
                }
            }
            Mode::Direct
            | Mode::DirectX
            | Mode::DirectY
            | Mode::DirectIndirect
            | Mode::DirectIndexedIndirect
            | Mode::DirectIndirectIndexed
            | Mode::DirectIndirectLong
            | Mode::DirectIndirectLongY
            | Mode::StackRelative
            | Mode::StackRelativeIndirectY
            | Mode::Relative
            | Mode::Immediate8 => 1,
            Mode::Absolute
            | Mode::AbsoluteX
            | Mode::AbsoluteY
            | Mode::RelativeLong
            | Mode::AbsoluteIndirect
            | Mode::AbsoluteIndexedIndirect
            | Mode::AbsoluteIndirectLong
            | Mode::BlockMove => 2,
            Mode::Long | Mode::LongX => 3,
        }
    }
}

/// A decoded opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instr {
    pub op: Op,
    pub mode: Mode,
}

const fn instr(op: Op, mode: Mode) -> Instr {
    Instr { op, mode }
}

/// The eight-operation ALU group (cc = 01 on the 6502, extended by the 65816).
const fn alu_group(opcode: u8) -> Option<Instr> {
    let op = match opcode >> 5 {
        0 => Op::Ora,
        1 => Op::And,
        2 => Op::Eor,
        3 => Op::Adc,
        4 => Op::Sta,
        5 => Op::Lda,
        6 => Op::Cmp,
        _ => Op::Sbc,
    };
    let mode = match opcode & 0x1F {
        0x01 => Mode::DirectIndexedIndirect,
        0x03 => Mode::StackRelative,
        0x05 => Mode::Direct,
        0x07 => Mode::DirectIndirectLong,
        0x09 => Mode::Immediate,
        0x0D => Mode::Absolute,
        0x0F => Mode::Long,
        0x11 => Mode::DirectIndirectIndexed,
        0x12 => Mode::DirectIndirect,
        0x13 => Mode::StackRelativeIndirectY,
        0x15 => Mode::DirectX,
        0x17 => Mode::DirectIndirectLongY,
        0x19 => Mode::AbsoluteY,
        0x1D => Mode::AbsoluteX,
        0x1F => Mode::LongX,
        _ => return None,
    };
    // There is no STA #imm; its slot holds BIT #imm.
    if opcode == 0x89 {
        return Some(instr(Op::BitImm, Mode::Immediate));
    }
    Some(instr(op, mode))
}

/// Decode one opcode byte.
#[must_use]
#[allow(clippy::enum_glob_use)]
pub const fn decode(opcode: u8) -> Instr {
    if let Some(i) = alu_group(opcode) {
        return i;
    }
    use Mode::*;
    match opcode {
        0x00 => instr(Op::Brk, Immediate8),
        0x02 => instr(Op::Cop, Immediate8),
        0x04 => instr(Op::Tsb, Direct),
        0x06 => instr(Op::Asl, Direct),
        0x08 => instr(Op::Php, Implied),
        0x0A => instr(Op::Asl, Accumulator),
        0x0B => instr(Op::Phd, Implied),
        0x0C => instr(Op::Tsb, Absolute),
        0x0E => instr(Op::Asl, Absolute),
        0x10 => instr(Op::Bpl, Relative),
        0x14 => instr(Op::Trb, Direct),
        0x16 => instr(Op::Asl, DirectX),
        0x18 => instr(Op::Clc, Implied),
        0x1A => instr(Op::Inc, Accumulator),
        0x1B => instr(Op::Tcs, Implied),
        0x1C => instr(Op::Trb, Absolute),
        0x1E => instr(Op::Asl, AbsoluteX),
        0x20 => instr(Op::Jsr, Absolute),
        0x22 => instr(Op::Jsl, Long),
        0x24 => instr(Op::Bit, Direct),
        0x26 => instr(Op::Rol, Direct),
        0x28 => instr(Op::Plp, Implied),
        0x2A => instr(Op::Rol, Accumulator),
        0x2B => instr(Op::Pld, Implied),
        0x2C => instr(Op::Bit, Absolute),
        0x2E => instr(Op::Rol, Absolute),
        0x30 => instr(Op::Bmi, Relative),
        0x34 => instr(Op::Bit, DirectX),
        0x36 => instr(Op::Rol, DirectX),
        0x38 => instr(Op::Sec, Implied),
        0x3A => instr(Op::Dec, Accumulator),
        0x3B => instr(Op::Tsc, Implied),
        0x3C => instr(Op::Bit, AbsoluteX),
        0x3E => instr(Op::Rol, AbsoluteX),
        0x40 => instr(Op::Rti, Implied),
        0x42 => instr(Op::Wdm, Immediate8),
        0x44 => instr(Op::Mvp, BlockMove),
        0x46 => instr(Op::Lsr, Direct),
        0x48 => instr(Op::Pha, Implied),
        0x4A => instr(Op::Lsr, Accumulator),
        0x4B => instr(Op::Phk, Implied),
        0x4C => instr(Op::Jmp, Absolute),
        0x4E => instr(Op::Lsr, Absolute),
        0x50 => instr(Op::Bvc, Relative),
        0x54 => instr(Op::Mvn, BlockMove),
        0x56 => instr(Op::Lsr, DirectX),
        0x58 => instr(Op::Cli, Implied),
        0x5A => instr(Op::Phy, Implied),
        0x5B => instr(Op::Tcd, Implied),
        0x5C => instr(Op::Jml, Long),
        0x5E => instr(Op::Lsr, AbsoluteX),
        0x60 => instr(Op::Rts, Implied),
        0x62 => instr(Op::Per, RelativeLong),
        0x64 => instr(Op::Stz, Direct),
        0x66 => instr(Op::Ror, Direct),
        0x68 => instr(Op::Pla, Implied),
        0x6A => instr(Op::Ror, Accumulator),
        0x6B => instr(Op::Rtl, Implied),
        0x6C => instr(Op::Jmp, AbsoluteIndirect),
        0x6E => instr(Op::Ror, Absolute),
        0x70 => instr(Op::Bvs, Relative),
        0x74 => instr(Op::Stz, DirectX),
        0x76 => instr(Op::Ror, DirectX),
        0x78 => instr(Op::Sei, Implied),
        0x7A => instr(Op::Ply, Implied),
        0x7B => instr(Op::Tdc, Implied),
        0x7C => instr(Op::Jmp, AbsoluteIndexedIndirect),
        0x7E => instr(Op::Ror, AbsoluteX),
        0x80 => instr(Op::Bra, Relative),
        0x82 => instr(Op::Brl, RelativeLong),
        0x84 => instr(Op::Sty, Direct),
        0x86 => instr(Op::Stx, Direct),
        0x88 => instr(Op::Dey, Implied),
        0x8A => instr(Op::Txa, Implied),
        0x8B => instr(Op::Phb, Implied),
        0x8C => instr(Op::Sty, Absolute),
        0x8E => instr(Op::Stx, Absolute),
        0x90 => instr(Op::Bcc, Relative),
        0x94 => instr(Op::Sty, DirectX),
        0x96 => instr(Op::Stx, DirectY),
        0x98 => instr(Op::Tya, Implied),
        0x9A => instr(Op::Txs, Implied),
        0x9B => instr(Op::Txy, Implied),
        0x9C => instr(Op::Stz, Absolute),
        0x9E => instr(Op::Stz, AbsoluteX),
        0xA0 => instr(Op::Ldy, Immediate),
        0xA2 => instr(Op::Ldx, Immediate),
        0xA4 => instr(Op::Ldy, Direct),
        0xA6 => instr(Op::Ldx, Direct),
        0xA8 => instr(Op::Tay, Implied),
        0xAA => instr(Op::Tax, Implied),
        0xAB => instr(Op::Plb, Implied),
        0xAC => instr(Op::Ldy, Absolute),
        0xAE => instr(Op::Ldx, Absolute),
        0xB0 => instr(Op::Bcs, Relative),
        0xB4 => instr(Op::Ldy, DirectX),
        0xB6 => instr(Op::Ldx, DirectY),
        0xB8 => instr(Op::Clv, Implied),
        0xBA => instr(Op::Tsx, Implied),
        0xBB => instr(Op::Tyx, Implied),
        0xBC => instr(Op::Ldy, AbsoluteX),
        0xBE => instr(Op::Ldx, AbsoluteY),
        0xC0 => instr(Op::Cpy, Immediate),
        0xC2 => instr(Op::Rep, Immediate8),
        0xC4 => instr(Op::Cpy, Direct),
        0xC6 => instr(Op::Dec, Direct),
        0xC8 => instr(Op::Iny, Implied),
        0xCA => instr(Op::Dex, Implied),
        0xCB => instr(Op::Wai, Implied),
        0xCC => instr(Op::Cpy, Absolute),
        0xCE => instr(Op::Dec, Absolute),
        0xD0 => instr(Op::Bne, Relative),
        0xD4 => instr(Op::Pei, Direct),
        0xD6 => instr(Op::Dec, DirectX),
        0xD8 => instr(Op::Cld, Implied),
        0xDA => instr(Op::Phx, Implied),
        0xDB => instr(Op::Stp, Implied),
        0xDC => instr(Op::Jml, AbsoluteIndirectLong),
        0xDE => instr(Op::Dec, AbsoluteX),
        0xE0 => instr(Op::Cpx, Immediate),
        0xE2 => instr(Op::Sep, Immediate8),
        0xE4 => instr(Op::Cpx, Direct),
        0xE6 => instr(Op::Inc, Direct),
        0xE8 => instr(Op::Inx, Implied),
        0xEA => instr(Op::Nop, Implied),
        0xEB => instr(Op::Xba, Implied),
        0xEC => instr(Op::Cpx, Absolute),
        0xEE => instr(Op::Inc, Absolute),
        0xF0 => instr(Op::Beq, Relative),
        0xF4 => instr(Op::Pea, Absolute),
        0xF6 => instr(Op::Inc, DirectX),
        0xF8 => instr(Op::Sed, Implied),
        0xFA => instr(Op::Plx, Implied),
        0xFB => instr(Op::Xce, Implied),
        0xFC => instr(Op::Jsr, AbsoluteIndexedIndirect),
        0xFE => instr(Op::Inc, AbsoluteX),
        // Every remaining slot is claimed by the ALU group above.
        _ => instr(Op::Nop, Implied),
    }
}

const fn build_table() -> [Instr; 256] {
    let mut table = [instr(Op::Nop, Mode::Implied); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
}

/// The full decode table, indexed by opcode.
pub static OPCODES: [Instr; 256] = build_table();
