//! X65 RIA816 bridge chip.
//!
//! The RIA sits between the 65816 and the host controller. This core
//! models the parts of it the CPU sees: a byte UART, a random number
//! source, a hardware multiply/divide unit and two interval timers, all
//! sharing one interrupt output.
//!
//! # Registers ($00-$1F)
//!
//! | Reg     | Name        | Description                                |
//! |---------|-------------|--------------------------------------------|
//! | $00     | UART_STATUS | bit7 TX ready, bit6 RX byte waiting (read-only) |
//! | $01     | UART_DATA   | write transmits, read pops RX ($00 if empty) |
//! | $02     | RNG         | next random byte                           |
//! | $04-$05 | OPERA       | operand A                                  |
//! | $06-$07 | OPERB       | operand B                                  |
//! | $08-$0B | MULAB       | A × B, 32-bit (read-only)                  |
//! | $0C-$0D | DIVAB       | A ÷ B, $FFFF when B = 0 (read-only)        |
//! | $10-$11 | TIMER_A     | read counter, write latch                  |
//! | $12     | TIMER_A_CTL | bit0 run, bit1 continuous                  |
//! | $14-$15 | TIMER_B     | read counter, write latch                  |
//! | $16     | TIMER_B_CTL | bit0 run, bit1 continuous                  |
//! | $18     | IRQ_STATUS  | bit0 timer A, bit1 timer B, bit2 UART RX; write 1 to clear |
//! | $19     | IRQ_ENABLE  | same bit layout                            |
//!
//! Other slots read `$FF` and ignore writes.

mod rng;
mod timer;

use std::collections::VecDeque;

use emu_core::{Chip, Observable, Pins, Value};

pub use rng::Rng;
pub use timer::{CTL_CONTINUOUS, CTL_RUN, Timer};

/// IRQ bit: timer A underflow.
pub const IRQ_TIMER_A: u8 = 0x01;
/// IRQ bit: timer B underflow.
pub const IRQ_TIMER_B: u8 = 0x02;
/// IRQ bit: UART byte received.
pub const IRQ_UART_RX: u8 = 0x04;

const IRQ_MASK: u8 = IRQ_TIMER_A | IRQ_TIMER_B | IRQ_UART_RX;

/// Transmitted bytes held for the host before the oldest are dropped.
pub const UART_TX_CAPACITY: usize = 4096;

const UART_TX_READY: u8 = 0x80;
const UART_RX_READY: u8 = 0x40;

/// RIA816 construction options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RiaConfig {
    /// Fixed RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

/// RIA816 bridge chip.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ria816 {
    /// Bytes received from the host, oldest first.
    rx: VecDeque<u8>,
    /// Bytes transmitted by the CPU, not yet collected by the host.
    tx: VecDeque<u8>,
    rng: Rng,
    opera: u16,
    operb: u16,
    /// Timer A and timer B.
    pub timers: [Timer; 2],
    irq_status: u8,
    irq_enable: u8,
}

impl Ria816 {
    #[must_use]
    pub fn new(config: RiaConfig) -> Self {
        Self {
            rx: VecDeque::new(),
            tx: VecDeque::new(),
            rng: Rng::new(config.rng_seed),
            opera: 0,
            operb: 0,
            timers: [Timer::new(); 2],
            irq_status: 0,
            irq_enable: 0,
        }
    }

    /// Queue a byte arriving on the UART.
    pub fn uart_receive(&mut self, byte: u8) {
        self.rx.push_back(byte);
        self.irq_status |= IRQ_UART_RX;
    }

    /// Collect everything the CPU transmitted since the last call.
    ///
    /// The host should drain regularly: once [`UART_TX_CAPACITY`] bytes are
    /// waiting, each new byte pushes out the oldest.
    pub fn uart_take_output(&mut self) -> Vec<u8> {
        self.tx.drain(..).collect()
    }

    #[must_use]
    pub fn irq_active(&self) -> bool {
        self.irq_status & self.irq_enable != 0
    }

    fn product(&self) -> u32 {
        u32::from(self.opera) * u32::from(self.operb)
    }

    fn quotient(&self) -> u16 {
        self.opera.checked_div(self.operb).unwrap_or(0xFFFF)
    }

    /// Register read with side effects (UART pop, RNG advance).
    pub fn read(&mut self, reg: u8) -> u8 {
        match reg & 0x1F {
            0x00 => {
                let rx = if self.rx.is_empty() { 0 } else { UART_RX_READY };
                UART_TX_READY | rx
            }
            0x01 => self.rx.pop_front().unwrap_or(0),
            0x02 => self.rng.next_byte(),
            0x04 => self.opera as u8,
            0x05 => (self.opera >> 8) as u8,
            0x06 => self.operb as u8,
            0x07 => (self.operb >> 8) as u8,
            r @ 0x08..=0x0B => (self.product() >> (8 * (r - 0x08))) as u8,
            0x0C => self.quotient() as u8,
            0x0D => (self.quotient() >> 8) as u8,
            0x10 => self.timers[0].counter as u8,
            0x11 => (self.timers[0].counter >> 8) as u8,
            0x12 => self.timers[0].control(),
            0x14 => self.timers[1].counter as u8,
            0x15 => (self.timers[1].counter >> 8) as u8,
            0x16 => self.timers[1].control(),
            0x18 => self.irq_status,
            0x19 => self.irq_enable,
            _ => 0xFF,
        }
    }

    /// Register write. Read-only slots ignore it.
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x1F {
            0x01 => {
                log::trace!("RIA UART TX ${value:02X}");
                if self.tx.len() == UART_TX_CAPACITY {
                    self.tx.pop_front();
                }
                self.tx.push_back(value);
            }
            0x04 => self.opera = (self.opera & 0xFF00) | u16::from(value),
            0x05 => self.opera = (self.opera & 0x00FF) | (u16::from(value) << 8),
            0x06 => self.operb = (self.operb & 0xFF00) | u16::from(value),
            0x07 => self.operb = (self.operb & 0x00FF) | (u16::from(value) << 8),
            0x10 => self.timers[0].set_latch_lo(value),
            0x11 => self.timers[0].set_latch_hi(value),
            0x12 => self.timers[0].set_control(value),
            0x14 => self.timers[1].set_latch_lo(value),
            0x15 => self.timers[1].set_latch_hi(value),
            0x16 => self.timers[1].set_control(value),
            0x18 => self.irq_status &= !value,
            0x19 => self.irq_enable = value & IRQ_MASK,
            _ => {}
        }
    }
}

impl Default for Ria816 {
    fn default() -> Self {
        Self::new(RiaConfig::default())
    }
}

impl Chip for Ria816 {
    fn tick(&mut self, mut pins: Pins) -> Pins {
        if self.timers[0].tick() {
            self.irq_status |= IRQ_TIMER_A;
        }
        if self.timers[1].tick() {
            self.irq_status |= IRQ_TIMER_B;
        }

        if pins.any(Pins::CS_RIA) {
            let reg = pins.addr16() as u8;
            if pins.is_read() {
                pins = pins.with_data(self.read(reg));
            } else {
                self.write(reg, pins.data());
            }
        }
        pins.with(Pins::RIA_IRQ, self.irq_active())
    }

    /// Registers, timers and interrupt state return to power-on values.
    /// The UART queues belong to the host side and the RNG keeps running.
    fn reset(&mut self) {
        self.opera = 0;
        self.operb = 0;
        self.timers = [Timer::new(); 2];
        self.irq_status = 0;
        self.irq_enable = 0;
    }
}

impl Observable for Ria816 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "uart.rx_pending" => Some((self.rx.len() as u32).into()),
            "uart.tx_pending" => Some((self.tx.len() as u32).into()),
            "opera" => Some(self.opera.into()),
            "operb" => Some(self.operb.into()),
            "mulab" => Some(self.product().into()),
            "divab" => Some(self.quotient().into()),
            "timer_a.counter" => Some(self.timers[0].counter.into()),
            "timer_a.latch" => Some(self.timers[0].latch.into()),
            "timer_a.control" => Some(self.timers[0].control().into()),
            "timer_b.counter" => Some(self.timers[1].counter.into()),
            "timer_b.latch" => Some(self.timers[1].latch.into()),
            "timer_b.control" => Some(self.timers[1].control().into()),
            "irq.status" => Some(self.irq_status.into()),
            "irq.enable" => Some(self.irq_enable.into()),
            "irq" => Some(self.irq_active().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "uart.rx_pending",
            "uart.tx_pending",
            "opera",
            "operb",
            "mulab",
            "divab",
            "timer_a.counter",
            "timer_a.latch",
            "timer_a.control",
            "timer_b.counter",
            "timer_b.latch",
            "timer_b.control",
            "irq.status",
            "irq.enable",
            "irq",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ria() -> Ria816 {
        Ria816::new(RiaConfig { rng_seed: Some(1) })
    }

    #[test]
    fn multiply_and_divide() {
        let mut ria = ria();
        ria.write(0x04, 0x34);
        ria.write(0x05, 0x12);
        ria.write(0x06, 0x10);
        ria.write(0x07, 0x00);
        let product: Vec<u8> = (0x08..=0x0B).map(|r| ria.read(r)).collect();
        assert_eq!(product, [0x40, 0x23, 0x01, 0x00]);
        assert_eq!((ria.read(0x0C), ria.read(0x0D)), (0x23, 0x01));
    }

    #[test]
    fn divide_by_zero_saturates() {
        let mut ria = ria();
        ria.write(0x04, 0x05);
        assert_eq!((ria.read(0x0C), ria.read(0x0D)), (0xFF, 0xFF));
    }

    #[test]
    fn uart_status_and_receive_order() {
        let mut ria = ria();
        assert_eq!(ria.read(0x00), 0x80);
        assert_eq!(ria.read(0x01), 0x00);
        ria.uart_receive(b'h');
        ria.uart_receive(b'i');
        assert_eq!(ria.read(0x00), 0xC0);
        assert_eq!(ria.read(0x01), b'h');
        assert_eq!(ria.read(0x01), b'i');
        assert_eq!(ria.read(0x00), 0x80);
    }

    #[test]
    fn uart_transmit_collects_bytes() {
        let mut ria = ria();
        ria.write(0x01, b'O');
        ria.write(0x01, b'K');
        assert_eq!(ria.uart_take_output(), b"OK");
        assert!(ria.uart_take_output().is_empty());
    }

    #[test]
    fn unmapped_slots_read_high() {
        let mut ria = ria();
        for reg in [0x03, 0x0E, 0x0F, 0x13, 0x17, 0x1A, 0x1F] {
            ria.write(reg, 0x00);
            assert_eq!(ria.read(reg), 0xFF, "reg ${reg:02X}");
        }
    }

    #[test]
    fn read_only_results_ignore_writes() {
        let mut ria = ria();
        ria.write(0x08, 0x55);
        ria.write(0x0C, 0x55);
        assert_eq!(ria.read(0x08), 0x00);
        assert_eq!(ria.read(0x0C), 0x00);
    }

    #[test]
    fn enable_masks_unused_bits() {
        let mut ria = ria();
        ria.write(0x19, 0xFF);
        assert_eq!(ria.read(0x19), 0x07);
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut a = ria();
        let mut b = ria();
        let xs: Vec<u8> = (0..16).map(|_| a.read(0x02)).collect();
        let ys: Vec<u8> = (0..16).map(|_| b.read(0x02)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn reset_keeps_uart_queues() {
        let mut ria = ria();
        ria.uart_receive(0x41);
        ria.write(0x19, IRQ_UART_RX);
        ria.reset();
        assert!(!ria.irq_active());
        assert_eq!(ria.read(0x01), 0x41);
    }

    #[test]
    fn undrained_uart_output_keeps_the_newest_bytes() {
        let mut ria = ria();
        for n in 0..=UART_TX_CAPACITY {
            ria.write(0x01, n as u8);
        }
        assert_eq!(ria.query("uart.tx_pending"), Some(Value::U32(UART_TX_CAPACITY as u32)));
        let out = ria.uart_take_output();
        assert_eq!(out.len(), UART_TX_CAPACITY);
        assert_eq!(out[0], 1);
        assert_eq!(out[UART_TX_CAPACITY - 1], UART_TX_CAPACITY as u8);
        assert!(ria.uart_take_output().is_empty());
    }
}
