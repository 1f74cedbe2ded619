//! Flat-memory harness driving the CPU pin by pin.

#![allow(dead_code)]

use emu_core::Pins;
use wdc_65c816::{CpuConfig, W65c816};

pub struct Harness {
    pub cpu: W65c816,
    pub ram: Vec<u8>,
    pub pins: Pins,
    /// Every write cycle as (address, byte).
    pub writes: Vec<(u32, u8)>,
}

impl Harness {
    /// 128 KiB of RAM, mirrored across the 24-bit space.
    pub fn new() -> Self {
        Self {
            cpu: W65c816::new(CpuConfig::default()),
            ram: vec![0; 0x2_0000],
            pins: Pins::new(),
            writes: Vec::new(),
        }
    }

    /// Stable emulation-mode state: flags clear apart from I.
    pub fn emulation() -> Self {
        let mut h = Self::new();
        h.cpu.regs.set_p(wdc_65c816::flags::I);
        h
    }

    /// Native mode with 16-bit accumulator and index registers.
    pub fn native16() -> Self {
        let mut h = Self::new();
        h.cpu.regs.e = false;
        h.cpu.regs.set_p(wdc_65c816::flags::I);
        h
    }

    pub fn load(&mut self, addr: u32, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            let a = self.index(addr + i as u32);
            self.ram[a] = b;
        }
    }

    pub fn peek(&self, addr: u32) -> u8 {
        self.ram[self.index(addr)]
    }

    fn index(&self, addr: u32) -> usize {
        addr as usize & (self.ram.len() - 1)
    }

    /// Begin execution with an opcode fetch at `addr`.
    pub fn start(&mut self, addr: u32) {
        self.pins = self.cpu.prefetch(addr);
    }

    /// Answer the pending request, then tick once.
    pub fn step(&mut self) {
        self.serve();
        self.pins = self.cpu.tick(self.pins);
    }

    pub fn serve(&mut self) {
        if !self.pins.is_valid() {
            return;
        }
        let a = self.index(self.pins.address());
        if self.pins.is_read() {
            self.pins = self.pins.with_data(self.ram[a]);
        } else {
            self.ram[a] = self.pins.data();
            self.writes.push((self.pins.address(), self.pins.data()));
        }
    }

    /// Run until the next opcode fetch; returns cycles taken.
    pub fn run_instruction(&mut self) -> u32 {
        let mut cycles = 0;
        loop {
            self.step();
            cycles += 1;
            if self.pins.is_sync() {
                return cycles;
            }
            assert!(cycles < 64, "no opcode fetch within 64 cycles");
        }
    }

    /// Run `n` cycles, holding `lines` asserted on every input.
    pub fn run_with(&mut self, n: u32, lines: u64) {
        for _ in 0..n {
            self.serve();
            self.pins = self.cpu.tick(self.pins.set(lines));
        }
    }

    /// Run until an opcode fetch at `addr`, holding `lines` asserted.
    /// Returns the cycles taken, or `None` after `limit` cycles.
    pub fn run_until_fetch(&mut self, addr: u32, lines: u64, limit: u32) -> Option<u32> {
        for n in 1..=limit {
            self.run_with(1, lines);
            if self.pins.is_sync() && self.pins.address() == addr {
                return Some(n);
            }
        }
        None
    }
}
