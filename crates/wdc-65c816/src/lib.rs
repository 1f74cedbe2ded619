//! Cycle-stepped WDC 65C816 CPU core.
//!
//! The core never touches memory. Every `tick()` consumes the pins holding
//! the answer to the previous bus request and returns the next request, one
//! clock cycle at a time, in both emulation and native mode.
//!
//! ```
//! use emu_core::Pins;
//! use wdc_65c816::{CpuConfig, W65c816};
//!
//! let mut ram = vec![0u8; 0x10000];
//! ram[0xFFFC] = 0x00;
//! ram[0xFFFD] = 0x02;
//!
//! let (mut cpu, mut pins) = W65c816::init(CpuConfig::default());
//! for _ in 0..7 {
//!     pins = cpu.tick(pins);
//!     let addr = pins.addr16() as usize;
//!     if pins.is_read() {
//!         pins = pins.with_data(ram[addr]);
//!     }
//! }
//! assert!(pins.is_sync());
//! assert_eq!(pins.address(), 0x0200);
//! ```

mod addressing;
mod alu;
mod cpu;
pub mod flags;
mod opcodes;
mod registers;

pub use cpu::{CpuConfig, W65c816};
pub use flags::Status;
pub use opcodes::{Access, Instr, Mode, OPCODES, Op, Width, decode};
pub use registers::Registers;
