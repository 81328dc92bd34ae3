//! # LC-3 virtual machine.
//!
//! `lc3-vm` emulates the LC-3 16-bit educational computer: a flat
//! 65 536-word memory, eight general registers with one-hot condition
//! codes, sixteen opcodes and six console-I/O trap routines. Object
//! images load at their origin word; execution always starts at the
//! architecture's fixed entry address `0x3000` and runs until HALT.
//!
//! # Example
//! ```
//! use lc3_vm::Emulator;
//! let mut emu = Emulator::new();
//! // AND R0,R0,#0 ; ADD R0,R0,#5 ; HALT
//! emu.load_words(0x3000, &[0x5020, 0x1025, 0xF025]).unwrap();
//! let mut console = Vec::new();
//! emu.execute_with_output(&mut console).unwrap();
//! assert_eq!(emu.registers().get(0).as_decimal(), 5);
//! ```
//! # Errors
//! - Loading rejects malformed or oversized images, see
//!   [`errors::LoadImageError`]
//! - Execution stops on reserved instructions, unknown trap vectors and
//!   failed console I/O, see [`errors::ExecutionError`]

pub mod emulator;
pub mod errors;
pub mod hardware;
pub mod loader;
pub mod numbers;
pub mod terminal;

pub use emulator::Emulator;
pub use loader::Image;
