use std::path::PathBuf;

use structopt::StructOpt;

use chip_8::emulator::{Driver, DriverConfig, Emulator};
use chip_8::emulator::{input::DummyInput, output::DummyOutput};

/// Run a program without input, then print the screen.
#[derive(StructOpt)]
struct Opt {
    /// The program to execute
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// How many steps to run before stopping
    #[structopt(long, default_value = "1000")]
    steps: u64,

    /// Steps per second, 0 runs as fast as possible
    #[structopt(long, default_value = "0")]
    hz: u32,

    /// Seed for the random number generator
    #[structopt(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    log::info!("Executing {:?}", &opt.input);
    let program = std::fs::read(&opt.input)?;

    let emulator = match opt.seed {
        Some(seed) => Emulator::with_seed(seed),
        None => Emulator::new(),
    };
    let config = DriverConfig { steps_per_second: opt.hz };
    let mut driver = Driver::new(emulator, DummyInput, DummyOutput::new(), config);

    // Load instructions into emulator memory
    driver.load(&program)?;

    // Start execution
    let mut remaining = opt.steps;
    let result = driver.run(|| {
        if remaining == 0 {
            return true;
        }
        remaining -= 1;
        false
    });

    print!("{}", driver.emulator().display());
    log::info!(
        "Ran {} steps, presented {} frames and {} tones",
        opt.steps - remaining,
        driver.output().frames(),
        driver.output().beeps()
    );

    result?;
    Ok(())
}
