//! Top-level X65 system.
//!
//! One master clock drives everything at the CPU cycle rate. Each tick:
//! 1. CPU: consume the previous cycle's answer, issue the next request
//! 2. Clear the interrupt, ready, chip-select and chip output lines
//! 3. Decode: bank 0 I/O windows get a chip select, the rest is RAM
//! 4. Tick CGIA, GPIO, RIA and SGU once each; the selected chip answers
//! 5. RAM read or write for unselected valid cycles
//! 6. Route chip outputs: CGIA to NMI, GPIO and RIA to IRQ, SGU to audio

use std::ops::ControlFlow;

use emu_core::{Chip, Cpu, MasterClock, Observable, Pins, Value};
use ti_tca6416a::Tca6416a;
use wdc_65c816::{CpuConfig, W65c816};
use x65_cgia::{Cgia, CgiaConfig};
use x65_ria816::{Ria816, RiaConfig};
use x65_sgu1::{Sgu1, SguConfig};

use crate::config::X65Config;
use crate::map;
use crate::memory::Memory;

/// Called after every tick; `Break` stops the current run.
pub type DebugHook = Box<dyn FnMut(&X65) -> ControlFlow<()>>;

/// X65 system.
pub struct X65 {
    pub(crate) cpu: W65c816,
    pub(crate) memory: Memory,
    pub(crate) cgia: Cgia,
    pub(crate) gpio: Tca6416a,
    pub(crate) ria: Ria816,
    pub(crate) sgu: Sgu1,
    /// Pins left by the last tick, fed to the CPU on the next.
    pub(crate) pins: Pins,
    /// Master clock ticks since construction.
    pub(crate) ticks: u64,
    clock: MasterClock,
    /// Samples produced since the last `take_audio`.
    audio: Vec<f32>,
    hook: Option<DebugHook>,
    stopped: bool,
}

impl X65 {
    /// Build the machine with RAM zeroed and the CPU at the start of its
    /// reset sequence.
    #[must_use]
    pub fn new(config: &X65Config) -> Self {
        let clock = MasterClock::new(config.frequency_hz);
        let (cpu, pins) = W65c816::init(CpuConfig { bcd_enabled: config.bcd_enabled });
        let sgu = Sgu1::new(SguConfig {
            clock_hz: u32::try_from(config.frequency_hz).unwrap_or(u32::MAX),
            sample_rate: config.sample_rate,
        });
        log::debug!(
            "X65: {} Hz, {} KiB RAM, {} Hz audio",
            config.frequency_hz,
            config.ram_size / 1024,
            config.sample_rate
        );
        Self {
            cpu,
            memory: Memory::new(config.ram_size),
            cgia: Cgia::new(CgiaConfig::default()),
            gpio: Tca6416a::new(),
            ria: Ria816::new(RiaConfig { rng_seed: config.rng_seed }),
            sgu,
            pins,
            ticks: 0,
            clock,
            audio: Vec::with_capacity(config.sample_rate as usize / 50 + 1),
            hook: None,
            stopped: false,
        }
    }

    /// Advance the whole machine by one master clock tick.
    pub fn tick(&mut self) {
        let pins = self.cpu.tick(self.pins);
        let pins = pins.clear(Pins::IRQ | Pins::NMI | Pins::RDY | Pins::CS_ANY | Pins::CHIP_OUT);
        let mut pins = map::decode(pins);

        pins = self.cgia.tick(pins, &self.memory);
        pins = self.gpio.tick(pins);
        pins = self.ria.tick(pins);
        pins = self.sgu.tick(pins);

        if pins.is_valid() && !pins.any(Pins::CS_ANY) {
            let addr = pins.address();
            if pins.is_read() {
                pins = pins.with_data(self.memory.read(addr));
            } else {
                self.memory.write(addr, pins.data());
            }
        }

        pins = pins
            .with(Pins::NMI, pins.any(Pins::CGIA_INT))
            .with(Pins::IRQ, pins.any(Pins::GPIO_INT | Pins::RIA_IRQ));
        if pins.any(Pins::SGU_SAMPLE) {
            self.audio.push(self.sgu.sample());
        }

        self.pins = pins;
        self.ticks += 1;
    }

    /// Tick once and consult the debug hook. Returns false to stop.
    fn step(&mut self) -> bool {
        self.tick();
        if let Some(mut hook) = self.hook.take() {
            let flow = hook(self);
            self.hook = Some(hook);
            if flow.is_break() {
                self.stopped = true;
                return false;
            }
        }
        true
    }

    /// Run for `micros` microseconds of machine time.
    ///
    /// Returns the ticks executed, fewer than budgeted if the debug hook
    /// stopped the run.
    pub fn exec(&mut self, micros: u64) -> u64 {
        let budget = self.clock.ticks_for_micros(micros).get();
        self.run_ticks(budget)
    }

    /// Run `count` ticks, or until the debug hook stops the run.
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        self.stopped = false;
        let mut done = 0;
        while done < count {
            done += 1;
            if !self.step() {
                break;
            }
        }
        done
    }

    /// Run until the CGIA completes a frame, or the debug hook stops the run.
    pub fn run_until_frame(&mut self) -> u64 {
        self.stopped = false;
        let mut done = 0;
        loop {
            done += 1;
            if !self.step() || self.cgia.take_frame_complete() {
                return done;
            }
        }
    }

    /// True when the last run ended because the debug hook returned `Break`.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    pub fn set_debug_hook(&mut self, hook: impl FnMut(&X65) -> ControlFlow<()> + 'static) {
        self.hook = Some(Box::new(hook));
    }

    pub fn clear_debug_hook(&mut self) {
        self.hook = None;
    }

    /// Restart the CPU's reset sequence and return every chip to its
    /// power-on state. RAM and host-side buffers are kept.
    pub fn reset(&mut self) {
        log::debug!("X65: reset at tick {}", self.ticks);
        self.pins = self.cpu.reset();
        self.cgia.reset();
        self.gpio.reset();
        self.ria.reset();
        self.sgu.reset();
    }

    pub fn load(&mut self, addr: u32, bytes: &[u8]) {
        self.memory.load(addr, bytes);
    }

    #[must_use]
    pub fn peek(&self, addr: u32) -> u8 {
        self.memory.read(addr)
    }

    pub fn poke(&mut self, addr: u32, value: u8) {
        self.memory.write(addr, value);
    }

    /// Drain the audio samples produced so far.
    pub fn take_audio(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.audio)
    }

    /// ARGB32 framebuffer.
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        self.cgia.framebuffer()
    }

    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        self.cgia.framebuffer_width()
    }

    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        self.cgia.framebuffer_height()
    }

    #[must_use]
    pub fn cpu(&self) -> &W65c816 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut W65c816 {
        &mut self.cpu
    }

    #[must_use]
    pub fn cgia(&self) -> &Cgia {
        &self.cgia
    }

    #[must_use]
    pub fn gpio(&self) -> &Tca6416a {
        &self.gpio
    }

    pub fn gpio_mut(&mut self) -> &mut Tca6416a {
        &mut self.gpio
    }

    #[must_use]
    pub fn ria(&self) -> &Ria816 {
        &self.ria
    }

    pub fn ria_mut(&mut self) -> &mut Ria816 {
        &mut self.ria
    }

    #[must_use]
    pub fn sgu(&self) -> &Sgu1 {
        &self.sgu
    }

    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Pins at the end of the last tick.
    #[must_use]
    pub fn pins(&self) -> Pins {
        self.pins
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn clock(&self) -> MasterClock {
        self.clock
    }
}

impl Observable for X65 {
    /// Paths are forwarded by prefix: `cpu.pc`, `cgia.raster`, `ria.irq`.
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "ticks" => return Some(self.ticks.into()),
            "halted" => return Some(self.cpu.is_halted().into()),
            _ => {}
        }
        let (chip, rest) = path.split_once('.')?;
        match chip {
            "cpu" => self.cpu.query(rest),
            "cgia" => self.cgia.query(rest),
            "gpio" => self.gpio.query(rest),
            "ria" => self.ria.query(rest),
            "sgu" => self.sgu.query(rest),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["ticks", "halted"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> X65 {
        X65::new(&X65Config { ram_size: 0x1_0000, rng_seed: Some(1), ..X65Config::default() })
    }

    #[test]
    fn reset_vector_reaches_first_fetch() {
        let mut x65 = machine();
        x65.load(0xFFFC, &[0x00, 0x80]);
        x65.run_ticks(7);
        assert!(x65.pins().is_sync());
        assert_eq!(x65.pins().address(), 0x8000);
    }

    #[test]
    fn queries_forward_by_prefix() {
        let x65 = machine();
        assert_eq!(x65.query("ticks"), Some(Value::U64(0)));
        assert_eq!(x65.query("cpu.e"), Some(Value::Bool(true)));
        assert_eq!(x65.query("gpio.config0"), Some(Value::U8(0xFF)));
        assert_eq!(x65.query("nothing.here"), None);
    }
}
