//! X65 microcomputer emulator core.
//!
//! A 65C816 CPU, CGIA video, TCA6416A I/O expander, RIA816 bridge and
//! SGU-1 sound unit on one 64-bit pin bus, all stepped by a single master
//! clock. The host drives the machine with [`X65::exec`] or
//! [`X65::run_until_frame`] and reads back the framebuffer and audio.
//!
//! # Memory map
//!
//! | Range            | Device                            |
//! |------------------|-----------------------------------|
//! | `$00:FC00-FC3F`  | SGU-1                             |
//! | `$00:FF00-FF3F`  | CGIA                              |
//! | `$00:FF80-FF87`  | TCA6416A                          |
//! | `$00:FFC0-FFDF`  | RIA816                            |
//! | everything else  | RAM, mirrored by installed size   |
//!
//! The CPU vectors at `$FFE0-FFFF` are RAM, so a program installs its own.

mod config;
pub mod map;
mod memory;
mod snapshot;
mod x65;

pub use config::X65Config;
pub use memory::Memory;
pub use snapshot::{SNAPSHOT_VERSION, SnapshotError, X65Snapshot};
pub use x65::{DebugHook, X65};

pub use emu_core::{Chip, Cpu, Observable, Pins, Value};
