//! Keyboard feed for the memory-mapped device.
//!
//! A dedicated thread owns the terminal event stream and forwards decoded
//! key bytes over a channel. The memory-mapped status register drains the
//! channel without ever blocking; the thread is the only place that does
//! a blocking read.

use crate::terminal::TerminalRestore;
use crossterm::event::{self, KeyCode, KeyEventKind, KeyModifiers};
use std::process;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Exit status reported after the user interrupted the machine.
const INTERRUPT_EXIT_CODE: i32 = 130;

/// Spawns the thread that owns the terminal event stream.
///
/// Key presses arrive as bytes on the returned channel. Ctrl+C does not
/// reach the guest: the thread restores the terminal, prints a newline,
/// and terminates the process.
pub fn spawn_input_thread(restore: Option<TerminalRestore>) -> Receiver<u16> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || read_key_events(&sender, restore));
    receiver
}

fn read_key_events(sender: &Sender<u16>, restore: Option<TerminalRestore>) {
    loop {
        // Closing the event stream (or losing the receiver) ends the
        // thread, which the memory poll observes as a disconnect.
        let Ok(event) = event::read() else { return };
        let Some(key) = event.as_key_event() else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            if let Some(restore) = restore {
                restore.apply();
            }
            eprintln!();
            process::exit(INTERRUPT_EXIT_CODE);
        }
        if let Some(byte) = key_to_byte(key.code)
            && sender.send(byte).is_err()
        {
            return;
        }
    }
}

/// Translates one key event into the byte the guest sees.
///
/// Raw mode swallows the terminal's own line handling, so the keys that
/// normally rely on it map to their ASCII codes here.
fn key_to_byte(code: KeyCode) -> Option<u16> {
    match code {
        KeyCode::Enter => Some(u16::from(b'\n')),
        KeyCode::Tab => Some(u16::from(b'\t')),
        KeyCode::Backspace => Some(0x08),
        KeyCode::Esc => Some(0x1B),
        code => code.as_char().map(|c| c as u16),
    }
}
