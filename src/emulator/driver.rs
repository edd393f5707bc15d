use crate::emulator::emulator::{Emulator, Step};
use crate::emulator::error::{EmulatorError, Result};
use crate::emulator::input::EmulatorInput;
use crate::emulator::output::EmulatorOutput;
use std::thread;
use std::time::Duration;

pub const DEFAULT_STEPS_PER_SECOND: u32 = 120;

/// How a [`Driver`] paces the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Steps, and with them timer ticks, per second. 0 runs unthrottled.
    pub steps_per_second: u32,
}

impl DriverConfig {
    /// Time to sleep between steps, if any.
    pub fn step_delay(&self) -> Option<Duration> {
        if self.steps_per_second == 0 {
            None
        } else {
            Some(Duration::from_secs(1) / self.steps_per_second)
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig { steps_per_second: DEFAULT_STEPS_PER_SECOND }
    }
}

/// Runs an [`Emulator`] against an input and an output device.
///
/// Before every step the input gets to update the keypad, after every step
/// a changed frame is presented and a finished sound timer is beeped.
/// Once a fatal error has been seen the driver is halted and refuses to step.
pub struct Driver<I: EmulatorInput, O: EmulatorOutput> {
    emulator: Emulator,
    input: I,
    output: O,
    config: DriverConfig,
    halted: Option<EmulatorError>,
}

impl<I: EmulatorInput, O: EmulatorOutput> Driver<I, O> {

    pub fn new(emulator: Emulator, input: I, output: O, config: DriverConfig) -> Driver<I, O> {
        Driver {
            emulator,
            input,
            output,
            config,
            halted: None,
        }
    }

    /// Create a driver for a fresh emulator with the default configuration.
    pub fn with_io(input: I, output: O) -> Driver<I, O> {
        Driver::new(Emulator::new(), input, output, DriverConfig::default())
    }

    /// Wipe the emulator and load a new program, which also lifts a halt.
    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        self.emulator.power_cycle();
        match self.emulator.load(program) {
            Ok(()) => {
                self.halted = None;
                Ok(())
            }
            Err(error) => {
                log::error!("Could not load program: {}", error);
                self.halted = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Poll input, perform a single step and forward what came out of it.
    pub fn tick(&mut self) -> Result<Step> {
        if let Some(error) = &self.halted {
            return Err(error.clone());
        }

        self.input.update(self.emulator.keypad_mut());
        let result = self.emulator.step();

        // Present whatever was drawn, even if the step failed afterwards
        let display = self.emulator.display_mut();
        if display.is_dirty() {
            self.output.present(display);
            display.mark_clean();
        }

        match result {
            Ok(step) => {
                if step.tone {
                    self.output.beep();
                }
                Ok(step)
            }
            Err(error) if error.is_fatal() => {
                log::error!("Halting at {:#05x}: {}", self.emulator.program_counter(), error);
                self.halted = Some(error.clone());
                Err(error)
            }
            Err(error) => {
                log::warn!("Ignoring error at {:#05x}: {}", self.emulator.program_counter(), error);
                Err(error)
            }
        }
    }

    /// Keep ticking at the configured pace until `should_stop` says so,
    /// or until a fatal error halts the machine.
    pub fn run<F: FnMut() -> bool>(&mut self, mut should_stop: F) -> Result<()> {
        let delay = self.config.step_delay();
        while !should_stop() {
            match self.tick() {
                Err(error) if error.is_fatal() => return Err(error),
                _ => {}
            }
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
        }
        Ok(())
    }

    /// The error that halted the machine, if it is halted.
    pub fn halted(&self) -> Option<&EmulatorError> {
        self.halted.as_ref()
    }

    pub fn emulator(&self) -> &Emulator {
        &self.emulator
    }

    pub fn emulator_mut(&mut self) -> &mut Emulator {
        &mut self.emulator
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }
}
