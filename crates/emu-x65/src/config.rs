//! X65 configuration.

/// Configuration for constructing an X65 instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct X65Config {
    /// Master clock in Hz. CPU and chips all tick at this rate.
    pub frequency_hz: u64,
    /// RAM size in bytes: a power of two, at least 64 KiB.
    pub ram_size: usize,
    /// Decimal mode ADC/SBC.
    pub bcd_enabled: bool,
    /// Audio output rate in Hz.
    pub sample_rate: u32,
    /// Fixed RIA RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for X65Config {
    fn default() -> Self {
        Self {
            frequency_hz: 6_288_000,
            ram_size: 16 * 1024 * 1024,
            bcd_enabled: true,
            sample_rate: 48_000,
            rng_seed: None,
        }
    }
}
