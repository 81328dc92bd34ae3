use crate::errors::LoadImageError;
use std::sync::mpsc::{Receiver, TryRecvError};

/// Number of addressable 16-bit cells.
pub const MEMORY_SIZE: usize = 1 << 16;
/// Fixed entry address of the LC-3 architecture, independent of where
/// images were loaded.
pub const PC_START: u16 = 0x3000;

/// Addresses with device semantics attached.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u16)]
pub enum MemoryMappedIOLocations {
    /// Keyboard status register, bit 15 set while a byte is pending.
    Kbsr = 0xFE00,
    /// Keyboard data register, holds the most recently consumed byte.
    Kbdr = 0xFE02,
}

/// An abstraction for the LC-3 memory including the memory-mapped keyboard
/// but excluding registers.
pub struct Memory {
    /// Index equals memory address
    data: Vec<u16>,
    keyboard: Receiver<u16>,
    input_closed: bool,
}
impl Memory {
    pub fn new(keyboard: Receiver<u16>) -> Self {
        Self {
            data: vec![0x0u16; MEMORY_SIZE],
            keyboard,
            input_closed: false,
        }
    }

    /// Places one object image payload at its origin.
    ///
    /// Images loaded later overwrite earlier cells where they overlap.
    ///
    /// # Errors
    /// - Image does not fit between its origin and the end of memory
    pub fn load_image(&mut self, origin: u16, words: &[u16]) -> Result<(), LoadImageError> {
        let origin_index = usize::from(origin);
        let capacity = MEMORY_SIZE - origin_index;
        if words.len() > capacity {
            return Err(LoadImageError::ImageExceedsMemory {
                origin,
                words: words.len(),
                capacity,
            });
        }
        self.data[origin_index..origin_index + words.len()].copy_from_slice(words);
        Ok(())
    }

    /// Reads one cell.
    ///
    /// Reading the keyboard status register polls the input channel first:
    /// a pending byte lands in the data register and sets bit 15 of the
    /// status register, otherwise the status register is cleared. The poll
    /// never blocks.
    pub fn read(&mut self, address: u16) -> u16 {
        if address == MemoryMappedIOLocations::Kbsr as u16 {
            self.poll_keyboard();
        }
        self.data[usize::from(address)]
    }

    /// Unconditional store. The device registers may be overwritten like
    /// any other cell.
    pub fn write(&mut self, address: u16, value: u16) {
        self.data[usize::from(address)] = value;
    }

    /// True once the sending side of the keyboard channel is gone and all
    /// queued bytes have been drained.
    pub const fn input_closed(&self) -> bool {
        self.input_closed
    }

    fn poll_keyboard(&mut self) {
        match self.keyboard.try_recv() {
            Ok(byte) => {
                self.data[MemoryMappedIOLocations::Kbdr as usize] = byte;
                self.data[MemoryMappedIOLocations::Kbsr as usize] = 0x8000;
            }
            Err(TryRecvError::Empty) => {
                self.data[MemoryMappedIOLocations::Kbsr as usize] = 0;
            }
            Err(TryRecvError::Disconnected) => {
                self.input_closed = true;
                self.data[MemoryMappedIOLocations::Kbsr as usize] = 0;
            }
        }
    }

    /// Memory with a program placed at the entry address and a sender to
    /// feed the keyboard device.
    #[cfg(test)]
    pub fn with_program(words: &[u16]) -> (Self, std::sync::mpsc::Sender<u16>) {
        let (sender, receiver) = std::sync::mpsc::channel();
        let mut memory = Self::new(receiver);
        memory.load_image(PC_START, words).expect("test image fits");
        (memory, sender)
    }
}
