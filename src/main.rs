use lc3_vm::emulator::Emulator;
use lc3_vm::hardware::keyboard;
use lc3_vm::loader::{self, Image};
use lc3_vm::terminal::{self, EchoOptions, RawLock};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let image_paths: Vec<String> = env::args().skip(1).collect();
    if image_paths.is_empty() {
        eprintln!("usage: lc3-vm image-file ...");
        return ExitCode::from(2);
    }

    // Read and validate every image before touching the terminal mode, so
    // setup failures report on a normally behaving console.
    let mut images: Vec<Image> = Vec::with_capacity(image_paths.len());
    for path in &image_paths {
        match loader::read_image_file(path) {
            Ok(image) => images.push(image),
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::from(1);
            }
        }
    }

    // A non-terminal stdin leaves the mode untouched; the machine still runs.
    let raw_lock = terminal::set_terminal_raw(EchoOptions::EchoOff).ok();
    let keyboard = keyboard::spawn_input_thread(raw_lock.as_ref().map(RawLock::restore_handle));

    let mut emu = Emulator::with_keyboard(keyboard);
    for image in &images {
        if let Err(e) = emu.load_image(image) {
            drop(raw_lock);
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    }

    match emu.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // restore the terminal before the diagnostic prints
            drop(raw_lock);
            eprintln!("{e}");
            eprintln!("{:?}", emu.registers());
            ExitCode::from(1)
        }
    }
}
