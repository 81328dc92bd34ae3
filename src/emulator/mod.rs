//! The fetch-decode-execute engine.
//!
//! An [`Emulator`] owns the whole machine state: memory (with the
//! memory-mapped keyboard) and the register file. Every cycle fetches the
//! word at PC, post-increments PC, decodes the opcode and dispatches to
//! the matching handler. The loop ends with `Ok` on HALT and with an
//! [`ExecutionError`] on a fatal instruction.

pub mod instruction;
pub mod opcodes;
#[cfg(test)]
pub(crate) mod test_helpers;
pub mod trap_routines;

use crate::errors::{ExecutionError, LoadImageError};
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use crate::loader::{self, Image};
use instruction::{Instruction, Opcode};
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, Sender};

/// The public facing emulator used to run LC-3 programs.
pub struct Emulator {
    pub(crate) memory: Memory,
    pub(crate) registers: Registers,
    keyboard_sender: Option<Sender<u16>>,
}
impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}
impl Emulator {
    /// A machine with an internal keyboard channel; bytes are injected
    /// through [`Emulator::keyboard_sender`].
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            memory: Memory::new(receiver),
            registers: Registers::new(),
            keyboard_sender: Some(sender),
        }
    }

    /// A machine fed by an external keyboard source, usually the input
    /// thread from [`crate::hardware::keyboard::spawn_input_thread`].
    #[must_use]
    pub fn with_keyboard(keyboard: Receiver<u16>) -> Self {
        Self {
            memory: Memory::new(keyboard),
            registers: Registers::new(),
            keyboard_sender: None,
        }
    }

    /// The injection side of the internal keyboard channel, present only
    /// on machines built with [`Emulator::new`].
    #[must_use]
    pub fn keyboard_sender(&self) -> Option<&Sender<u16>> {
        self.keyboard_sender.as_ref()
    }

    /// Places a parsed object image into memory.
    ///
    /// Images loaded later overwrite earlier cells where they overlap. The
    /// start address of execution stays the architecture's fixed entry
    /// address, whatever the image origins were.
    ///
    /// # Errors
    /// - Image does not fit between its origin and the end of memory
    pub fn load_image(&mut self, image: &Image) -> Result<(), LoadImageError> {
        self.memory.load_image(image.origin, &image.words)
    }

    /// Reads an object file from disk and places it into memory.
    ///
    /// # Errors
    /// - File unreadable or malformed, see [`loader::read_image_file`]
    /// - Image does not fit between its origin and the end of memory
    pub fn load_image_file(&mut self, path: &str) -> Result<(), LoadImageError> {
        self.load_image(&loader::read_image_file(path)?)
    }

    /// Places raw words at an origin, like an already-decoded image.
    ///
    /// # Errors
    /// - Words do not fit between the origin and the end of memory
    pub fn load_words(&mut self, origin: u16, words: &[u16]) -> Result<(), LoadImageError> {
        self.memory.load_image(origin, words)
    }

    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Returns the register file to its start state so the loaded machine
    /// can run again.
    pub fn reset_registers(&mut self) {
        self.registers.reset();
    }

    /// Runs the machine against the process console until HALT or a fatal
    /// instruction.
    ///
    /// # Errors
    /// - Fatal instruction or failed console I/O, see [`ExecutionError`]
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        self.execute_with_output(&mut io::stdout())
    }

    /// Runs the machine with guest console output going to `stdout`.
    ///
    /// # Errors
    /// - Fatal instruction or failed console I/O, see [`ExecutionError`]
    pub fn execute_with_output(&mut self, stdout: &mut impl Write) -> Result<(), ExecutionError> {
        loop {
            let pc = self.registers.pc().as_binary();
            let instruction = Instruction::from(self.memory.read(pc));
            self.registers.inc_pc();
            if let ControlFlow::Break(result) = self.step(instruction, pc, stdout) {
                return result;
            }
        }
    }

    fn step(
        &mut self,
        instruction: Instruction,
        pc: u16,
        stdout: &mut impl Write,
    ) -> ControlFlow<Result<(), ExecutionError>> {
        let regs = &mut self.registers;
        match instruction.opcode() {
            Opcode::Br => opcodes::br(instruction, regs),
            Opcode::Add => opcodes::add(instruction, regs),
            Opcode::Ld => opcodes::ld(instruction, regs, &mut self.memory),
            Opcode::St => opcodes::st(instruction, regs, &mut self.memory),
            Opcode::Jsr => opcodes::jsr_or_jsrr(instruction, regs),
            Opcode::And => opcodes::and(instruction, regs),
            Opcode::Ldr => opcodes::ldr(instruction, regs, &mut self.memory),
            Opcode::Str => opcodes::str(instruction, regs, &mut self.memory),
            Opcode::Not => opcodes::not(instruction, regs),
            Opcode::Ldi => opcodes::ldi(instruction, regs, &mut self.memory),
            Opcode::Sti => opcodes::sti(instruction, regs, &mut self.memory),
            Opcode::Jmp => opcodes::jmp_or_ret(instruction, regs),
            Opcode::Lea => opcodes::lea(instruction, regs),
            Opcode::Trap => {
                // the incremented PC is the trap's return address
                regs.set(7, regs.pc());
                return trap_routines::dispatch(
                    instruction.trap_vector(),
                    pc,
                    regs,
                    &mut self.memory,
                    stdout,
                );
            }
            Opcode::Rti => {
                return ControlFlow::Break(Err(ExecutionError::PrivilegedInstructionFound {
                    pc,
                    instruction: instruction.bits(),
                }));
            }
            Opcode::Res => {
                return ControlFlow::Break(Err(ExecutionError::ReservedInstructionFound {
                    pc,
                    instruction: instruction.bits(),
                }));
            }
        }
        ControlFlow::Continue(())
    }
}
