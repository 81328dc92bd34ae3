use crate::emulator::Emulator;
use crate::errors::ExecutionError;
use crate::hardware::memory::{Memory, PC_START};
use crate::hardware::registers::Registers;
use std::io;
use std::io::Write;

/// Collects guest console output for assertions.
pub struct StringWriter {
    vec: Vec<u8>,
}
impl Write for StringWriter {
    fn write(&mut self, data: &[u8]) -> Result<usize, io::Error> {
        self.vec.write(data)
    }
    fn flush(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}
impl StringWriter {
    pub fn new() -> Self {
        let vec = Vec::<u8>::with_capacity(120);
        Self { vec }
    }
    pub fn get_string(&self) -> String {
        String::from_utf8(self.vec.clone()).unwrap()
    }
}

/// An emulator wired for tests: program placed at the entry address,
/// keyboard bytes pre-queued, console output captured in memory.
pub struct FakeEmulator {
    inner: Emulator,
    stdout: StringWriter,
}
impl FakeEmulator {
    pub fn new(program_no_header: &[u16], stdin_data: &str) -> Self {
        let mut inner = Emulator::new();
        inner
            .load_words(PC_START, program_no_header)
            .expect("test program fits into memory");
        let sender = inner.keyboard_sender().expect("internal keyboard channel");
        for b in stdin_data.bytes() {
            sender.send(u16::from(b)).expect("keyboard channel open");
        }
        Self {
            inner,
            stdout: StringWriter::new(),
        }
    }

    /// Drops the keyboard sender so blocking traps observe a closed input.
    pub fn close_keyboard(&mut self) {
        self.inner.keyboard_sender = None;
    }

    pub fn get_parts(&mut self) -> (&mut Registers, &mut Memory, &mut StringWriter) {
        (
            &mut self.inner.registers,
            &mut self.inner.memory,
            &mut self.stdout,
        )
    }

    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        self.inner.execute_with_output(&mut self.stdout)
    }

    pub fn output(&self) -> String {
        self.stdout.get_string()
    }

    pub const fn inner(&self) -> &Emulator {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut Emulator {
        &mut self.inner
    }
}
