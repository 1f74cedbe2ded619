//! In-memory machine snapshots.
//!
//! A snapshot captures everything that decides the next tick: CPU
//! micro-state, chip registers and counters, the bus pins and RAM. The
//! framebuffer, audio buffer and debug hook belong to the host and are
//! neither saved nor replaced on load.

use emu_core::Pins;
use thiserror::Error;
use ti_tca6416a::Tca6416a;
use wdc_65c816::W65c816;
use x65_cgia::CgiaState;
use x65_ria816::Ria816;
use x65_sgu1::SguState;

use crate::x65::X65;

/// Layout version written by `save_snapshot`.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Complete machine state at a tick boundary.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct X65Snapshot {
    pub version: u32,
    pub cpu: W65c816,
    pub cgia: CgiaState,
    pub gpio: Tca6416a,
    pub ria: Ria816,
    pub sgu: SguState,
    pub pins: Pins,
    pub ticks: u64,
    pub ram: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot version {found} is not supported (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("snapshot holds {found} bytes of RAM, machine has {expected}")]
    RamSizeMismatch { expected: usize, found: usize },
}

impl X65 {
    #[must_use]
    pub fn save_snapshot(&self) -> X65Snapshot {
        log::debug!("X65: snapshot saved at tick {}", self.ticks);
        X65Snapshot {
            version: SNAPSHOT_VERSION,
            cpu: self.cpu.clone(),
            cgia: self.cgia.state().clone(),
            gpio: self.gpio.clone(),
            ria: self.ria.clone(),
            sgu: self.sgu.state().clone(),
            pins: self.pins,
            ticks: self.ticks,
            ram: self.memory.as_slice().to_vec(),
        }
    }

    /// Restore a snapshot. On error the machine is left untouched.
    ///
    /// # Errors
    ///
    /// Fails if the snapshot was written by another layout version or for a
    /// machine with a different RAM size.
    pub fn load_snapshot(&mut self, snapshot: &X65Snapshot) -> Result<(), SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            log::warn!("X65: rejected snapshot version {}", snapshot.version);
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }
        if snapshot.ram.len() != self.memory.size() {
            log::warn!("X65: rejected snapshot with {} bytes of RAM", snapshot.ram.len());
            return Err(SnapshotError::RamSizeMismatch {
                expected: self.memory.size(),
                found: snapshot.ram.len(),
            });
        }

        self.cpu = snapshot.cpu.clone();
        self.cgia.restore(&snapshot.cgia);
        self.gpio = snapshot.gpio.clone();
        self.ria = snapshot.ria.clone();
        self.sgu.restore(&snapshot.sgu);
        self.pins = snapshot.pins;
        self.ticks = snapshot.ticks;
        self.memory.restore(&snapshot.ram);
        log::debug!("X65: snapshot loaded at tick {}", self.ticks);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{X65, X65Config};

    use super::*;

    fn machine() -> X65 {
        X65::new(&X65Config { ram_size: 0x1_0000, rng_seed: Some(7), ..X65Config::default() })
    }

    #[test]
    fn version_is_checked_first() {
        let mut x65 = machine();
        let mut snap = x65.save_snapshot();
        snap.version = 99;
        snap.ram.clear();
        assert_eq!(
            x65.load_snapshot(&snap),
            Err(SnapshotError::VersionMismatch { expected: SNAPSHOT_VERSION, found: 99 })
        );
    }

    #[test]
    fn failed_load_leaves_state_alone() {
        let mut x65 = machine();
        x65.poke(0x1234, 0xAA);
        let mut snap = x65.save_snapshot();
        snap.ram = vec![0; 0x2_0000];
        snap.ticks = 1_000;
        assert_eq!(
            x65.load_snapshot(&snap),
            Err(SnapshotError::RamSizeMismatch { expected: 0x1_0000, found: 0x2_0000 })
        );
        assert_eq!(x65.ticks(), 0);
        assert_eq!(x65.peek(0x1234), 0xAA);
    }

    #[test]
    fn errors_describe_the_mismatch() {
        let err = SnapshotError::RamSizeMismatch { expected: 65536, found: 131072 };
        assert_eq!(err.to_string(), "snapshot holds 131072 bytes of RAM, machine has 65536");
    }
}
