//! The emulator itself, and the traits a frontend implements to drive it.

pub mod display;
pub mod driver;
pub mod emulator;
pub mod error;
pub mod font;
pub mod input;
pub mod instruction;
pub mod memory;
pub mod output;

pub use self::driver::{Driver, DriverConfig};
pub use self::emulator::{Emulator, Progress, Step};
pub use self::error::{EmulatorError, Result};
