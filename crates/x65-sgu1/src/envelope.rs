//! Attack/release envelope generator.

/// Envelope phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    #[default]
    Idle,
    Attack,
    Sustain,
    Release,
}

/// Linear envelope advanced once per output sample.
///
/// Rates are 4-bit; higher is faster. Rate 15 completes in one sample,
/// rate 0 takes 32768 samples.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope {
    pub attack: u8,
    pub release: u8,
    pub phase: Phase,
    /// Output level, 0.0 to 1.0.
    pub level: f32,
}

fn rate_step(rate: u8) -> f32 {
    if rate >= 0x0F {
        1.0
    } else {
        (1u32 << rate) as f32 / 32768.0
    }
}

impl Envelope {
    #[must_use]
    pub const fn new() -> Self {
        Self { attack: 0, release: 0, phase: Phase::Idle, level: 0.0 }
    }

    /// Key on: attack from the current level, so retriggers don't click.
    pub fn gate_on(&mut self) {
        self.phase = Phase::Attack;
    }

    pub fn gate_off(&mut self) {
        if self.phase != Phase::Idle {
            self.phase = Phase::Release;
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn step(&mut self) {
        match self.phase {
            Phase::Idle | Phase::Sustain => {}
            Phase::Attack => {
                self.level += rate_step(self.attack);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.phase = Phase::Sustain;
                }
            }
            Phase::Release => {
                self.level -= rate_step(self.release);
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.phase = Phase::Idle;
                }
            }
        }
    }
}
