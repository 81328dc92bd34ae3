//! This code does emulate the trap routines but does not implement them via
//! the opcodes of the LC-3 but directly.
//!
//! In the real system the code for these routines is at the target of the
//! [Trap Vector Tables](https://cs131.info/Assembly/Instructions/TRAPRoutines.html#trap-vector-table).
use crate::errors::ExecutionError;
use crate::hardware::memory::{Memory, MemoryMappedIOLocations};
use crate::hardware::registers::{Registers, from_binary};
use crate::terminal;
use crate::terminal::EchoOptions;
use std::io;
use std::io::Write;
use std::ops::ControlFlow;
use std::thread::sleep;
use std::time::Duration;

const TRAP_GETC: u16 = 0x20;
const TRAP_OUT: u16 = 0x21;
const TRAP_PUTS: u16 = 0x22;
const TRAP_IN: u16 = 0x23;
const TRAP_PUTSP: u16 = 0x24;
const TRAP_HALT: u16 = 0x25;

/// Pause between probes of the keyboard status register while a trap
/// blocks for input. The status read itself never blocks.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Runs the service routine selected by the low 8 bits of a TRAP
/// instruction.
///
/// `pc` is the address of the TRAP instruction itself, for diagnostics.
/// `ControlFlow::Break` ends the fetch loop: with `Ok` on HALT, with an
/// [`ExecutionError`] on an unknown vector or failed console I/O.
pub fn dispatch(
    vector: u16,
    pc: u16,
    regs: &mut Registers,
    memory: &mut Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    match vector {
        TRAP_GETC => get_c(regs, memory, stdout),
        TRAP_OUT => out(regs, stdout),
        TRAP_PUTS => put_s(regs, memory, stdout),
        TRAP_IN => in_trap(regs, memory, stdout),
        TRAP_PUTSP => put_sp(regs, memory, stdout),
        TRAP_HALT => halt(stdout),
        _ => ControlFlow::Break(Err(ExecutionError::UnknownTrapRoutine { vector, pc })),
    }
}

fn read_character_from_console(
    regs: &mut Registers,
    eo: EchoOptions,
    memory: &mut Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    loop {
        if memory.read(MemoryMappedIOLocations::Kbsr as u16) & 0x8000 != 0 {
            let c = memory.read(MemoryMappedIOLocations::Kbdr as u16) & 0xFF;
            regs.set(0, from_binary(c));
            regs.update_conditional_register(0);
            if eo == EchoOptions::EchoOn {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "the keyboard device delivers single bytes"
                )]
                let echoed = (c as u8) as char;
                return write_str_out(&String::from(echoed), stdout);
            }
            return ControlFlow::Continue(());
        }
        if memory.input_closed() {
            return ControlFlow::Break(Err(ExecutionError::IOInputOutputError(
                "keyboard input stream closed while waiting for a character".into(),
            )));
        }
        sleep(INPUT_POLL_INTERVAL);
    }
}

/// GETC: Read a single character from the keyboard. The character is not
/// echoed onto the console.
///
/// Its ASCII code is copied into R0. The high eight bits of R0 are cleared.
pub fn get_c(
    regs: &mut Registers,
    memory: &mut Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    read_character_from_console(regs, EchoOptions::EchoOff, memory, stdout)
}

/// IN: Print a prompt on the screen and read a single character echoed back
/// from the keyboard.
///
/// Otherwise, like 0x20 GETC.
pub fn in_trap(
    regs: &mut Registers,
    memory: &mut Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    write_str_out("Input: ", stdout)?;
    read_character_from_console(regs, EchoOptions::EchoOn, memory, stdout)
}

/// OUT: Write a character in R0\[7:0\] to the console display.
pub fn out(regs: &Registers, stdout: &mut impl Write) -> ControlFlow<Result<(), ExecutionError>> {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "truncation to the low byte is what OUT specifies"
    )]
    let c = (regs.get(0).as_binary() & 0xFF) as u8 as char;
    write_str_out(&String::from(c), stdout)
}

fn put_one_char_per_u16(input: u16, append_to: &mut String) {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "Truncation is what is expected here"
    )]
    let c = (input as u8) as char;
    append_to.push(c);
}

fn put_two_chars_per_u16(input: u16, append_to: &mut String) {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "Truncation is what is expected here"
    )]
    let c = (input as u8) as char;
    append_to.push(c);
    let c = ((input >> 8) as u8) as char;
    if c != '\0' {
        append_to.push(c);
    }
}

fn put(
    regs: &Registers,
    mem: &mut Memory,
    stdout: &mut impl Write,
    handle_char: fn(u16, &mut String),
) -> ControlFlow<Result<(), ExecutionError>> {
    let mut address = regs.get(0).as_binary();
    let mut s = String::with_capacity(120);
    loop {
        let word = mem.read(address);
        if word == 0 {
            break;
        }
        handle_char(word, &mut s);
        address = address.wrapping_add(1);
    }
    write_str_out(s.as_str(), stdout)
}

/// PUTS: print the zero-terminated string of one character per word,
/// starting at the address in R0.
pub fn put_s(
    regs: &Registers,
    mem: &mut Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    put(regs, mem, stdout, put_one_char_per_u16)
}

/// PUTSP: Packed version of PUTS
///
/// The ASCII code contained in bits \[7:0\] of a memory location is written
/// to the console first, then the one in bits \[15:8\] unless it is 0x00.
/// Writing terminates with a 0x0000 word.
pub fn put_sp(
    regs: &Registers,
    mem: &mut Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    put(regs, mem, stdout, put_two_chars_per_u16)
}

/// HALT: End program and stdout a message
pub fn halt(stdout: &mut impl Write) -> ControlFlow<Result<(), ExecutionError>> {
    write_str_out("\nProgram halted\n", stdout)?;
    ControlFlow::Break(Ok(()))
}

fn write_str_out(
    message: &str,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    match terminal::print(stdout, message) {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => wrap_io_error_in_cf(&e),
    }
}

fn wrap_io_error_in_cf(error: &io::Error) -> ControlFlow<Result<(), ExecutionError>, ()> {
    ControlFlow::Break(Err(ExecutionError::IOInputOutputError(error.to_string())))
}
