//! Errors that can occur using this crate.
//!
//! The crate's code is designed in a way that functions/methods _can_ trigger all the enum variants
//! specified in the returned [`Result`]

use displaydoc::Display;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Possible errors while reading or placing an object image.
///
/// Issues are malformed images or errors during attempts to read them.
/// `Display` and `Debug` provide all necessary details.
#[rustfmt::skip]
#[expect(clippy::doc_markdown, reason = "using backticks as suggested would break displaydoc")]
#[derive(Display, PartialEq, Eq)]
pub enum LoadImageError {
    /// Image '{file}' is missing its origin word
    ImageMissingOriginHeader { file: String },
    /// Images must be a whole number of 16-bit words, but '{file}' is {size} bytes long
    ImageNotEvenSize { file: String, size: usize },
    /// Image does not fit into memory: origin {origin:#06X} plus {words} words exceeds the {capacity} cells above the origin
    ImageExceedsMemory { origin: u16, words: usize, capacity: usize },
    /// Cannot read image from file '{file}': {message}
    ImageNotLoadable { file: String, message: String },
}
impl Debug for LoadImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
impl Error for LoadImageError {}

/// Possible errors during program execution.
///
/// `Display` and `Debug` provide all necessary details.
#[rustfmt::skip]
#[derive(Display, PartialEq, Eq)]
pub enum ExecutionError {
    /// The reserved opcode 0b1101 at {pc:#06X} is not executable, instruction word {instruction:#06X}. Most probably an invalid program.
    ReservedInstructionFound { pc: u16, instruction: u16 },
    /// RTI at {pc:#06X} needs supervisor mode, which this machine does not provide, instruction word {instruction:#06X}
    PrivilegedInstructionFound { pc: u16, instruction: u16 },
    /// Unknown trap routine {vector:#04X} called at {pc:#06X}
    UnknownTrapRoutine { vector: u16, pc: u16 },
    /// Error during reading Stdin or writing program output to Stdout: {0}
    IOInputOutputError(String),
}
impl Debug for ExecutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
impl Error for ExecutionError {}
