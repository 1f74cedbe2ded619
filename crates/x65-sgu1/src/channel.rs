//! One two-operator FM channel: a modulator feeding a carrier.

use std::f32::consts::{PI, TAU};

use crate::envelope::Envelope;

/// Control bit: key on.
pub const CTL_KEY_ON: u8 = 0x01;

/// Frequency multiplier for a 4-bit ratio nibble, in halves:
/// nibble 0 is ×0.5, nibble n is ×n.
const fn multiplier_halves(nibble: u8) -> u32 {
    if nibble == 0 { 1 } else { 2 * nibble as u32 }
}

fn phase_to_radians(phase: u32) -> f32 {
    (phase as f32 / 4_294_967_296.0) * TAU
}

/// Channel registers plus oscillator and envelope state.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel {
    /// Base phase increment per sample.
    pub freq: u16,
    /// High nibble carrier multiplier, low nibble modulator multiplier.
    pub ratio: u8,
    pub mod_level: u8,
    /// 6-bit.
    pub volume: u8,
    /// 3-bit modulator self-feedback.
    pub feedback: u8,
    pub control: u8,
    pub envelope: Envelope,
    carrier_phase: u32,
    modulator_phase: u32,
    /// Last two modulator outputs, averaged for feedback.
    history: [f32; 2],
}

impl Channel {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            freq: 0,
            ratio: 0x11,
            mod_level: 0,
            volume: 0,
            feedback: 0,
            control: 0,
            envelope: Envelope::new(),
            carrier_phase: 0,
            modulator_phase: 0,
            history: [0.0; 2],
        }
    }

    /// ENVELOPE register value.
    #[must_use]
    pub const fn envelope_reg(&self) -> u8 {
        (self.envelope.attack << 4) | self.envelope.release
    }

    pub fn set_envelope_reg(&mut self, value: u8) {
        self.envelope.attack = value >> 4;
        self.envelope.release = value & 0x0F;
    }

    /// CONTROL write. A key-on edge restarts both oscillators.
    pub fn set_control(&mut self, value: u8) {
        let was_on = self.control & CTL_KEY_ON != 0;
        let on = value & CTL_KEY_ON != 0;
        self.control = value & CTL_KEY_ON;
        if on && !was_on {
            self.carrier_phase = 0;
            self.modulator_phase = 0;
            self.history = [0.0; 2];
            self.envelope.gate_on();
        } else if !on && was_on {
            self.envelope.gate_off();
        }
    }

    fn increment(&self, nibble: u8) -> u32 {
        (u32::from(self.freq) * multiplier_halves(nibble)).wrapping_shl(15)
    }

    /// Produce one output sample in -1.0..=1.0 and advance the oscillators.
    pub fn sample(&mut self) -> f32 {
        self.envelope.step();

        let feedback = if self.feedback == 0 {
            0.0
        } else {
            let amount = PI * (1u32 << self.feedback) as f32 / 128.0;
            amount * (self.history[0] + self.history[1]) * 0.5
        };
        let modulator = (phase_to_radians(self.modulator_phase) + feedback).sin();
        self.history = [self.history[1], modulator];

        let depth = f32::from(self.mod_level) / 255.0 * 4.0 * PI;
        let carrier = (phase_to_radians(self.carrier_phase) + depth * modulator).sin();

        self.modulator_phase = self.modulator_phase.wrapping_add(self.increment(self.ratio & 0x0F));
        self.carrier_phase = self.carrier_phase.wrapping_add(self.increment(self.ratio >> 4));

        carrier * self.envelope.level * f32::from(self.volume) / 63.0
    }
}
