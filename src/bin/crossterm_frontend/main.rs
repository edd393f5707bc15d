use std::path::PathBuf;

use structopt::StructOpt;

use chip_8::emulator::{Driver, DriverConfig, Emulator};

mod crossterm_io;
mod key_buffer;
mod key_manager;
use crossterm::event::KeyCode;
use crossterm_io::{CrosstermInput, CrosstermOutput};
use key_manager::KeyManager;

/// The program options.
#[derive(StructOpt)]
struct Opt {
    /// The program to execute
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Steps per second
    #[structopt(long, default_value = "120")]
    hz: u32,

    /// Seed for the random number generator
    #[structopt(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {

    env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    log::info!("Executing {:?} at {} Hz", &opt.input, opt.hz);
    let program = std::fs::read(&opt.input)?;

    let key_manager = KeyManager::new();

    let emulator = match opt.seed {
        Some(seed) => Emulator::with_seed(seed),
        None => Emulator::new(),
    };
    let mut driver = Driver::new(
        emulator,
        CrosstermInput::new(&key_manager),
        CrosstermOutput::new()?,
        DriverConfig { steps_per_second: opt.hz },
    );

    // Load instructions into emulator memory
    driver.load(&program)?;

    // Start execution
    let result = driver.run(|| key_manager.is_held(KeyCode::Esc));

    // Restore the terminal before reporting anything
    drop(driver);
    if let Err(error) = &result {
        eprintln!("Halted: {}", error);
    }
    result?;

    Ok(())
}
