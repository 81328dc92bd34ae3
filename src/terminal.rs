//! Raw-mode control of the controlling terminal.
//!
//! The guest owns the console for the duration of a run: line buffering
//! and local echo go off when the machine starts and the previous mode
//! comes back on every exit path. POSIX hosts toggle the mode through
//! `termios`, Windows hosts through the crossterm terminal API; both sit
//! behind the same [`RawLock`] interface.

use std::io::{self, Write};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EchoOptions {
    EchoOn,
    EchoOff,
}

#[cfg(unix)]
mod backend {
    use super::EchoOptions;
    use std::io::stdin;
    use std::os::fd::{AsRawFd, RawFd};
    use termios::{ECHO, ICANON, ISIG, Termios, VMIN, VTIME};

    /// Everything needed to put the terminal back into its pre-run state.
    #[derive(Copy, Clone)]
    pub struct TerminalRestore {
        fd: RawFd,
        termios_orig: Termios,
    }
    impl TerminalRestore {
        pub fn apply(&self) {
            // no means to repair if this fails; the terminal stays raw
            let _ = termios::tcsetattr(self.fd, termios::TCSAFLUSH, &self.termios_orig);
        }
    }

    pub fn enter_raw_mode(eo: EchoOptions) -> Result<TerminalRestore, std::io::Error> {
        let fd = stdin().as_raw_fd();
        let termios_orig = Termios::from_fd(fd)?;
        let mut termios_raw = termios_orig;
        // https://man7.org/linux/man-pages/man3/termios.3.html
        // Input-side raw mode only: line buffering, local echo and signal
        // characters off. Output post-processing stays on so '\n' still
        // starts a fresh line.
        termios_raw.c_lflag &= !(ICANON | ECHO | ISIG);
        if eo == EchoOptions::EchoOn {
            termios_raw.c_lflag |= ECHO;
        }
        termios_raw.c_cc[VMIN] = 1;
        termios_raw.c_cc[VTIME] = 0;
        // TCSAFLUSH also discards input typed before the machine started
        termios::tcsetattr(fd, termios::TCSAFLUSH, &termios_raw)?;
        Ok(TerminalRestore { fd, termios_orig })
    }
}

#[cfg(windows)]
mod backend {
    use super::EchoOptions;
    use crossterm::terminal;

    /// Everything needed to put the terminal back into its pre-run state.
    #[derive(Copy, Clone)]
    pub struct TerminalRestore;
    impl TerminalRestore {
        pub fn apply(&self) {
            let _ = terminal::disable_raw_mode();
        }
    }

    pub fn enter_raw_mode(_eo: EchoOptions) -> Result<TerminalRestore, std::io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TerminalRestore)
    }
}

pub use backend::TerminalRestore;

/// Guard holding the terminal in raw mode; dropping it restores the
/// previous mode.
pub struct RawLock {
    restore: TerminalRestore,
}
impl RawLock {
    /// A copyable handle for restoring the terminal from another thread,
    /// e.g. when the input thread fields an interrupt.
    #[must_use]
    pub fn restore_handle(&self) -> TerminalRestore {
        self.restore
    }
}
impl Drop for RawLock {
    fn drop(&mut self) {
        self.restore.apply();
    }
}

/// Disables line buffering and local echo until the returned lock drops.
///
/// # Errors
/// - stdin is not a terminal, or the mode change was refused
pub fn set_terminal_raw(eo: EchoOptions) -> Result<RawLock, std::io::Error> {
    Ok(RawLock {
        restore: backend::enter_raw_mode(eo)?,
    })
}

/// Writes guest console output and flushes it in one step.
///
/// # Errors
/// - the underlying writer failed
pub fn print(out: &mut impl Write, message: &str) -> io::Result<()> {
    out.write_all(message.as_bytes())?;
    out.flush()
}
