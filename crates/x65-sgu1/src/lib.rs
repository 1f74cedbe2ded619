//! X65 SGU-1 sound generation unit.
//!
//! Four channels of two-operator FM: each channel's modulator sine,
//! optionally fed back into itself, phase-modulates a carrier sine whose
//! amplitude follows an attack/release envelope. Oscillators advance once
//! per output sample, not once per master clock tick; the chip counts
//! ticks and strobes `SGU_SAMPLE` on the tick a new sample is ready.
//!
//! # Register map ($00-$3F)
//!
//! | Addr      | Register                                        |
//! |-----------|-------------------------------------------------|
//! | $00+8n    | Channel n FREQ lo                               |
//! | $01+8n    | Channel n FREQ hi                               |
//! | $02+8n    | RATIO (hi nibble carrier, lo nibble modulator)  |
//! | $03+8n    | MOD_LEVEL                                       |
//! | $04+8n    | VOLUME (bits 0-5)                               |
//! | $05+8n    | FEEDBACK (bits 0-2)                             |
//! | $06+8n    | ENVELOPE (hi nibble attack, lo nibble release)  |
//! | $07+8n    | CONTROL (bit 0 key on)                          |
//! | $20       | MASTER_VOLUME (bits 0-6)                        |
//! | $21       | STATUS: bit n set while channel n sounds (read-only) |
//!
//! Unused bits read 0; unused slots read `$FF`.

#![allow(clippy::cast_precision_loss)]

mod channel;
mod envelope;

use emu_core::{Chip, Observable, Pins, Value};

pub use channel::{CTL_KEY_ON, Channel};
pub use envelope::{Envelope, Phase};

/// Number of FM channels.
pub const CHANNELS: usize = 4;

/// SGU-1 construction options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SguConfig {
    /// Master clock rate the chip is ticked at.
    pub clock_hz: u32,
    /// Output sample rate.
    pub sample_rate: u32,
}

impl Default for SguConfig {
    fn default() -> Self {
        Self { clock_hz: 6_288_000, sample_rate: 48_000 }
    }
}

/// Everything that changes while the chip runs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SguState {
    pub channels: [Channel; CHANNELS],
    /// 7-bit.
    pub master_volume: u8,
    /// Fractional tick accumulator, in units of 1 / `clock_hz` samples.
    sample_phase: u64,
    /// Last mixed output.
    last_sample: f32,
}

impl SguState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channels: [Channel::new(); CHANNELS],
            master_volume: 0x7F,
            sample_phase: 0,
            last_sample: 0.0,
        }
    }
}

impl Default for SguState {
    fn default() -> Self {
        Self::new()
    }
}

/// SGU-1 chip.
#[derive(Clone, Debug, PartialEq)]
pub struct Sgu1 {
    state: SguState,
    clock_hz: u32,
    sample_rate: u32,
}

impl Sgu1 {
    /// # Panics
    ///
    /// Panics if either rate is zero, or if more than one sample per
    /// master tick is requested.
    #[must_use]
    pub fn new(config: SguConfig) -> Self {
        assert!(config.clock_hz > 0, "SGU-1 clock must be non-zero");
        assert!(config.sample_rate > 0, "SGU-1 sample rate must be non-zero");
        assert!(
            config.sample_rate <= config.clock_hz,
            "SGU-1 sample rate must not exceed its clock"
        );
        Self {
            state: SguState::new(),
            clock_hz: config.clock_hz,
            sample_rate: config.sample_rate,
        }
    }

    /// Last mixed sample, -1.0 to 1.0.
    #[must_use]
    pub fn sample(&self) -> f32 {
        self.state.last_sample
    }

    #[must_use]
    pub fn state(&self) -> &SguState {
        &self.state
    }

    pub fn restore(&mut self, state: &SguState) {
        self.state = state.clone();
    }

    fn status(&self) -> u8 {
        self.state
            .channels
            .iter()
            .enumerate()
            .filter(|(_, ch)| ch.envelope.is_active())
            .fold(0, |acc, (n, _)| acc | (1 << n))
    }

    pub fn read(&self, reg: u8) -> u8 {
        let reg = reg & 0x3F;
        if reg < 0x20 {
            let ch = &self.state.channels[usize::from(reg >> 3)];
            return match reg & 7 {
                0 => ch.freq as u8,
                1 => (ch.freq >> 8) as u8,
                2 => ch.ratio,
                3 => ch.mod_level,
                4 => ch.volume,
                5 => ch.feedback,
                6 => ch.envelope_reg(),
                _ => ch.control,
            };
        }
        match reg {
            0x20 => self.state.master_volume,
            0x21 => self.status(),
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        let reg = reg & 0x3F;
        if reg < 0x20 {
            let ch = &mut self.state.channels[usize::from(reg >> 3)];
            match reg & 7 {
                0 => ch.freq = (ch.freq & 0xFF00) | u16::from(value),
                1 => ch.freq = (ch.freq & 0x00FF) | (u16::from(value) << 8),
                2 => ch.ratio = value,
                3 => ch.mod_level = value,
                4 => ch.volume = value & 0x3F,
                5 => ch.feedback = value & 0x07,
                6 => ch.set_envelope_reg(value),
                _ => ch.set_control(value),
            }
            return;
        }
        if reg == 0x20 {
            self.state.master_volume = value & 0x7F;
        }
    }

    fn mix(&mut self) -> f32 {
        let sum: f32 = self.state.channels.iter_mut().map(Channel::sample).sum();
        let master = f32::from(self.state.master_volume) / 127.0;
        (sum / CHANNELS as f32 * master).clamp(-1.0, 1.0)
    }
}

impl Default for Sgu1 {
    fn default() -> Self {
        Self::new(SguConfig::default())
    }
}

impl Chip for Sgu1 {
    fn tick(&mut self, mut pins: Pins) -> Pins {
        if pins.any(Pins::CS_SGU) {
            let reg = pins.addr16() as u8;
            if pins.is_read() {
                pins = pins.with_data(self.read(reg));
            } else {
                self.write(reg, pins.data());
            }
        }

        self.state.sample_phase += u64::from(self.sample_rate);
        let ready = self.state.sample_phase >= u64::from(self.clock_hz);
        if ready {
            self.state.sample_phase -= u64::from(self.clock_hz);
            self.state.last_sample = self.mix();
        }
        pins.with(Pins::SGU_SAMPLE, ready)
    }

    fn reset(&mut self) {
        self.state = SguState::new();
    }
}

impl Observable for Sgu1 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "master_volume" => return Some(self.state.master_volume.into()),
            "status" => return Some(self.status().into()),
            "sample" => return Some(format!("{:.4}", self.state.last_sample).into()),
            _ => {}
        }
        let (channel, field) = path.strip_prefix("channel")?.split_once('.')?;
        let ch = self.state.channels.get(channel.parse::<usize>().ok()?)?;
        match field {
            "freq" => Some(ch.freq.into()),
            "ratio" => Some(ch.ratio.into()),
            "mod_level" => Some(ch.mod_level.into()),
            "volume" => Some(ch.volume.into()),
            "feedback" => Some(ch.feedback.into()),
            "envelope" => Some(ch.envelope_reg().into()),
            "key_on" => Some((ch.control & CTL_KEY_ON != 0).into()),
            "level" => Some(format!("{:.4}", ch.envelope.level).into()),
            _ => None,
        }
    }

    /// Per-channel fields are queried as `channel<n>.<field>`.
    fn query_paths(&self) -> &'static [&'static str] {
        &["master_volume", "status", "sample"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sgu() -> Sgu1 {
        Sgu1::new(SguConfig { clock_hz: 1000, sample_rate: 100 })
    }

    #[test]
    fn register_masks() {
        let mut sgu = sgu();
        sgu.write(0x04, 0xFF);
        sgu.write(0x05, 0xFF);
        sgu.write(0x07, 0xFF);
        sgu.write(0x20, 0xFF);
        assert_eq!(sgu.read(0x04), 0x3F);
        assert_eq!(sgu.read(0x05), 0x07);
        assert_eq!(sgu.read(0x07), 0x01);
        assert_eq!(sgu.read(0x20), 0x7F);
        assert_eq!(sgu.read(0x22), 0xFF);
        assert_eq!(sgu.read(0x3F), 0xFF);
    }

    #[test]
    fn channel_registers_are_independent() {
        let mut sgu = sgu();
        sgu.write(0x18, 0x34);
        sgu.write(0x19, 0x12);
        assert_eq!(sgu.state().channels[3].freq, 0x1234);
        assert_eq!(sgu.state().channels[0].freq, 0);
    }

    #[test]
    fn status_tracks_envelopes() {
        let mut sgu = sgu();
        sgu.write(0x0E, 0xFF);
        sgu.write(0x0F, CTL_KEY_ON);
        assert_eq!(sgu.read(0x21), 0x02);
        sgu.write(0x21, 0x00);
        assert_eq!(sgu.read(0x21), 0x02);
    }

    #[test]
    fn strobes_at_the_sample_rate() {
        let mut sgu = sgu();
        let strobes: Vec<usize> = (0..50)
            .filter(|_| sgu.tick(Pins::new()).any(Pins::SGU_SAMPLE))
            .collect();
        assert_eq!(strobes.len(), 5);
    }

    #[test]
    fn fractional_rate_averages_out() {
        let mut sgu = Sgu1::new(SguConfig { clock_hz: 1000, sample_rate: 300 });
        let strobes = (0..1000).filter(|_| sgu.tick(Pins::new()).any(Pins::SGU_SAMPLE)).count();
        assert_eq!(strobes, 300);
    }

    #[test]
    fn keyed_channel_produces_sound() {
        let mut sgu = sgu();
        sgu.write(0x00, 0x00);
        sgu.write(0x01, 0x10);
        sgu.write(0x04, 0x3F);
        sgu.write(0x06, 0xF0);
        sgu.write(0x07, CTL_KEY_ON);
        let mut peak = 0.0f32;
        for _ in 0..1000 {
            if sgu.tick(Pins::new()).any(Pins::SGU_SAMPLE) {
                peak = peak.max(sgu.sample().abs());
            }
        }
        assert!(peak > 0.1, "peak {peak}");
        assert!(peak <= 1.0);
    }

    #[test]
    fn reset_silences() {
        let mut sgu = sgu();
        sgu.write(0x07, CTL_KEY_ON);
        sgu.reset();
        assert_eq!(sgu.read(0x21), 0);
        assert_eq!(sgu.read(0x20), 0x7F);
    }

    #[test]
    fn observable_channel_paths() {
        let mut sgu = sgu();
        sgu.write(0x12, 0x35);
        assert_eq!(sgu.query("channel2.ratio"), Some(Value::U8(0x35)));
        assert_eq!(sgu.query("channel4.ratio"), None);
        assert_eq!(sgu.query("channel1.bogus"), None);
    }

    #[test]
    fn sample_rate_equal_to_clock_strobes_every_tick() {
        let mut sgu = Sgu1::new(SguConfig { clock_hz: 48_000, sample_rate: 48_000 });
        for _ in 0..10 {
            assert!(sgu.tick(Pins::new()).any(Pins::SGU_SAMPLE));
        }
    }

    #[test]
    #[should_panic(expected = "must not exceed its clock")]
    fn rejects_sample_rate_above_clock() {
        let _ = Sgu1::new(SguConfig { clock_hz: 44_100, sample_rate: 48_000 });
    }
}
