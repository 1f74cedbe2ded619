//! Multi-cycle behaviour: reset, interrupts, width changes, stalls and
//! the long-running instructions.

mod common;

use common::Harness;
use emu_core::{Cpu, Pins};
use wdc_65c816::flags::{C, I, M, X};
use wdc_65c816::{CpuConfig, W65c816};

fn nops(h: &mut Harness, addr: u32, count: usize) {
    h.load(addr, &vec![0xEA; count]);
}

#[test]
fn reset_fetches_from_the_vector_after_seven_cycles() {
    let mut h = Harness::new();
    h.load(0xFFFC, &[0x34, 0x12]);
    let (cpu, pins) = W65c816::init(CpuConfig::default());
    h.cpu = cpu;
    h.pins = pins;

    let mut vector_cycles = 0;
    for _ in 0..7 {
        assert!(!h.cpu.is_halted());
        h.step();
        if h.pins.any(Pins::VPB) {
            vector_cycles += 1;
        }
    }
    assert!(h.pins.is_sync());
    assert_eq!(h.pins.address(), 0x1234);
    assert_eq!(vector_cycles, 2);
    // The stack cycles of a reset are reads.
    assert!(h.writes.is_empty());
    assert!(h.cpu.regs.e);
    assert!(h.cpu.regs.p.is_set(I));
}

#[test]
fn immediate_length_follows_the_m_flag() {
    let mut h = Harness::native16();
    // LDA #$1234 ; SEP #$20 ; LDA #$56
    h.load(0x0200, &[0xA9, 0x34, 0x12, 0xE2, 0x20, 0xA9, 0x56]);
    h.start(0x0200);

    assert_eq!(h.run_instruction(), 3);
    assert_eq!(h.pins.address(), 0x0203);
    assert_eq!(h.cpu.regs.c, 0x1234);

    assert_eq!(h.run_instruction(), 3);
    assert!(h.cpu.regs.p.is_set(M));

    assert_eq!(h.run_instruction(), 2);
    assert_eq!(h.pins.address(), 0x0207);
    assert_eq!(h.cpu.regs.c, 0x1256);
}

#[test]
fn wide_modify_writes_high_byte_first() {
    let mut h = Harness::native16();
    // INC $1000
    h.load(0x0200, &[0xEE, 0x00, 0x10]);
    h.load(0x1000, &[0xFF, 0x00]);
    h.start(0x0200);

    assert_eq!(h.run_instruction(), 8);
    assert_eq!(h.writes, vec![(0x1001, 0x01), (0x1000, 0x00)]);
}

#[test]
fn emulation_modify_rewrites_the_old_value() {
    let mut h = Harness::emulation();
    // ASL $10
    h.load(0x0200, &[0x06, 0x10]);
    h.load(0x0010, &[0x41]);
    h.start(0x0200);

    assert_eq!(h.run_instruction(), 5);
    assert_eq!(h.writes, vec![(0x0010, 0x41), (0x0010, 0x82)]);
    assert!(!h.cpu.regs.p.is_set(C));
}

#[test]
fn irq_enters_the_handler_with_b_clear() {
    let mut h = Harness::emulation();
    h.cpu.regs.set_p(0);
    nops(&mut h, 0x0200, 0x20);
    h.load(0xFFFE, &[0x00, 0x30]);
    h.start(0x0200);

    assert!(h.run_until_fetch(0x3000, Pins::IRQ, 30).is_some());
    assert_eq!(h.peek(0x01FF), 0x02);
    assert_eq!(h.peek(0x01FD), 0x20);
    assert!(h.cpu.regs.p.is_set(I));
}

#[test]
fn irq_is_ignored_while_masked() {
    let mut h = Harness::emulation();
    nops(&mut h, 0x0200, 0x40);
    h.load(0xFFFE, &[0x00, 0x30]);
    h.start(0x0200);

    assert_eq!(h.run_until_fetch(0x3000, Pins::IRQ, 60), None);
}

#[test]
fn nmi_takes_priority_over_irq() {
    let mut h = Harness::emulation();
    h.cpu.regs.set_p(0);
    nops(&mut h, 0x0200, 0x20);
    h.load(0xFFFA, &[0x00, 0x40]);
    h.load(0xFFFE, &[0x00, 0x30]);
    h.start(0x0200);

    assert!(h.run_until_fetch(0x4000, Pins::IRQ | Pins::NMI, 20).is_some());
}

#[test]
fn held_nmi_is_taken_once() {
    let mut h = Harness::emulation();
    nops(&mut h, 0x0200, 0x20);
    nops(&mut h, 0x4000, 0x40);
    h.load(0xFFFA, &[0x00, 0x40]);
    h.start(0x0200);

    let mut entries = 0;
    for _ in 0..80 {
        h.run_with(1, Pins::NMI);
        if h.pins.is_sync() && h.pins.address() == 0x4000 {
            entries += 1;
        }
    }
    assert_eq!(entries, 1);
}

#[test]
fn native_brk_pushes_the_program_bank() {
    let mut h = Harness::native16();
    // BRK with a signature byte, in bank 1.
    h.load(0x01_0200, &[0x00, 0xEE]);
    h.load(0xFFE6, &[0x00, 0x50]);
    h.start(0x01_0200);

    assert_eq!(h.run_instruction(), 8);
    assert_eq!(h.pins.address(), 0x00_5000);
    assert_eq!(
        h.writes,
        vec![(0x01FF, 0x01), (0x01FE, 0x02), (0x01FD, 0x02), (0x01FC, 0x04)]
    );
    assert_eq!(h.cpu.regs.pbr, 0);
}

#[test]
fn rdy_stalls_read_cycles() {
    let mut h = Harness::emulation();
    // LDA #$42
    h.load(0x0200, &[0xA9, 0x42]);
    h.start(0x0200);
    h.step();

    for _ in 0..3 {
        h.serve();
        let stalled = h.pins.set(Pins::RDY);
        let out = h.cpu.tick(stalled);
        assert_eq!(out, stalled);
        h.pins = out.clear(Pins::RDY);
    }
    assert_eq!(h.cpu.regs.a(), 0);

    assert_eq!(h.run_instruction(), 1);
    assert_eq!(h.pins.address(), 0x0202);
    assert_eq!(h.cpu.regs.a(), 0x42);
}

#[test]
fn mvn_copies_a_block_upwards() {
    let mut h = Harness::native16();
    h.cpu.regs.x = 0x1000;
    h.cpu.regs.y = 0x2000;
    h.cpu.regs.c = 2;
    h.load(0x0200, &[0x54, 0x00, 0x00]);
    h.load(0x1000, &[1, 2, 3]);
    h.start(0x0200);

    let mut cycles = 0;
    loop {
        cycles += h.run_instruction();
        if h.pins.address() != 0x0200 {
            break;
        }
    }
    assert_eq!(cycles, 21);
    assert_eq!(h.pins.address(), 0x0203);
    assert_eq!([h.peek(0x2000), h.peek(0x2001), h.peek(0x2002)], [1, 2, 3]);
    assert_eq!(h.cpu.regs.c, 0xFFFF);
    assert_eq!(h.cpu.regs.x, 0x1003);
    assert_eq!(h.cpu.regs.y, 0x2003);
}

#[test]
fn jsr_and_rts_round_trip() {
    let mut h = Harness::emulation();
    h.load(0x0200, &[0x20, 0x00, 0x03]);
    h.load(0x0300, &[0x60]);
    h.start(0x0200);

    assert_eq!(h.run_instruction(), 6);
    assert_eq!(h.pins.address(), 0x0300);
    assert_eq!((h.peek(0x01FF), h.peek(0x01FE)), (0x02, 0x02));

    assert_eq!(h.run_instruction(), 6);
    assert_eq!(h.pins.address(), 0x0203);
    assert_eq!(h.cpu.regs.s, 0x01FF);
}

#[test]
fn jsl_and_rtl_cross_banks() {
    let mut h = Harness::emulation();
    h.load(0x0200, &[0x22, 0x00, 0x80, 0x01]);
    h.load(0x01_8000, &[0x6B]);
    h.start(0x0200);

    assert_eq!(h.run_instruction(), 8);
    assert_eq!(h.pins.address(), 0x01_8000);
    assert_eq!(h.cpu.regs.pbr, 1);
    assert_eq!(h.writes, vec![(0x01FF, 0x00), (0x01FE, 0x02), (0x01FD, 0x03)]);

    assert_eq!(h.run_instruction(), 6);
    assert_eq!(h.pins.address(), 0x0204);
    assert_eq!(h.cpu.regs.pbr, 0);
}

#[test]
fn wai_resumes_on_a_masked_irq() {
    let mut h = Harness::emulation();
    h.load(0x0200, &[0xCB, 0xEA]);
    h.load(0xFFFE, &[0x00, 0x30]);
    h.start(0x0200);

    h.run_with(10, 0);
    assert!(h.cpu.is_waiting());
    assert!(!h.pins.is_sync());

    assert!(h.run_until_fetch(0x0201, Pins::IRQ, 5).is_some());
    assert!(!h.cpu.is_waiting());
}

#[test]
fn stp_holds_until_reset() {
    let mut h = Harness::emulation();
    h.load(0x0200, &[0xDB]);
    h.load(0xFFFC, &[0x00, 0x06]);
    h.start(0x0200);

    h.run_with(50, 0);
    assert!(h.cpu.is_halted());

    h.run_with(1, Pins::RES);
    assert!(h.run_until_fetch(0x0600, 0, 20).is_some());
    assert!(!h.cpu.is_halted());
}

#[test]
fn xce_switches_between_modes() {
    let mut h = Harness::emulation();
    // CLC ; XCE ; REP #$30 ; SEC ; XCE
    h.load(0x0200, &[0x18, 0xFB, 0xC2, 0x30, 0x38, 0xFB]);
    h.start(0x0200);

    h.run_instruction();
    h.run_instruction();
    assert!(!h.cpu.regs.e);
    assert!(h.cpu.regs.p.is_set(C));

    h.run_instruction();
    assert!(h.cpu.regs.m16());
    assert!(h.cpu.regs.x16());
    h.cpu.regs.x = 0x1234;

    h.run_instruction();
    h.run_instruction();
    assert!(h.cpu.regs.e);
    assert!(h.cpu.regs.p.is_set(M | X));
    assert_eq!(h.cpu.regs.x, 0x0034);
}

#[test]
fn rep_cannot_widen_registers_in_emulation() {
    let mut h = Harness::emulation();
    h.load(0x0200, &[0xC2, 0x30]);
    h.start(0x0200);

    h.run_instruction();
    assert!(h.cpu.regs.p.is_set(M | X));
    assert!(!h.cpu.regs.m16());
}

#[test]
fn decimal_add_through_the_bus() {
    let mut h = Harness::emulation();
    // SED ; CLC ; LDA #$15 ; ADC #$27
    h.load(0x0200, &[0xF8, 0x18, 0xA9, 0x15, 0x69, 0x27]);
    h.start(0x0200);
    for _ in 0..4 {
        h.run_instruction();
    }
    assert_eq!(h.cpu.regs.a(), 0x42);
}

#[test]
fn load_then_store() {
    let mut h = Harness::emulation();
    // LDA #$42 ; STA $2000
    h.load(0x0200, &[0xA9, 0x42, 0x8D, 0x00, 0x20]);
    h.start(0x0200);

    assert_eq!(h.run_instruction(), 2);
    assert_eq!(h.run_instruction(), 4);
    assert_eq!(h.peek(0x2000), 0x42);
    assert_eq!(h.pins.address(), 0x0205);
}

#[test]
fn reset_wins_over_a_simultaneous_nmi() {
    let mut h = Harness::emulation();
    h.cpu.regs.set_p(0);
    nops(&mut h, 0x0200, 0x20);
    h.load(0xFFFA, &[0x00, 0x40]);
    h.load(0xFFFC, &[0x00, 0x06]);
    h.start(0x0200);

    let mut saw_nmi_handler = false;
    let mut reached_reset = false;
    for _ in 0..30 {
        h.run_with(1, Pins::NMI | Pins::RES);
        if h.pins.is_sync() && h.pins.address() == 0x4000 {
            saw_nmi_handler = true;
        }
        if h.pins.is_sync() && h.pins.address() == 0x0600 {
            reached_reset = true;
            break;
        }
    }
    assert!(reached_reset);
    assert!(!saw_nmi_handler);
    // The stack cycles of a reset are reads.
    assert!(h.writes.is_empty());
}

#[test]
fn native_irq_pushes_four_bytes_and_rti_takes_seven_cycles() {
    let mut h = Harness::native16();
    h.cpu.regs.set_p(0);
    nops(&mut h, 0x0200, 0x20);
    h.load(0xFFEE, &[0x00, 0x30]);
    h.load(0x3000, &[0x40]);
    h.start(0x0200);

    assert!(h.run_until_fetch(0x3000, Pins::IRQ, 30).is_some());
    let stacked: Vec<u32> = h.writes.iter().map(|&(addr, _)| addr).collect();
    assert_eq!(stacked, [0x01FF, 0x01FE, 0x01FD, 0x01FC]);
    assert_eq!(h.writes[0].1, 0x00, "program bank first");
    let resume = (u32::from(h.writes[1].1) << 8) | u32::from(h.writes[2].1);
    assert_eq!(h.cpu.regs.s, 0x01FB);

    assert_eq!(h.run_instruction(), 7);
    assert_eq!(h.pins.address(), resume);
    assert_eq!(h.cpu.regs.s, 0x01FF);
    assert!(!h.cpu.regs.p.is_set(I));
}
