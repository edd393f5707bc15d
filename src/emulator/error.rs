use thiserror::Error;

/// Everything that can go wrong while loading or running a program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmulatorError {
    #[error("memory access out of bounds at {address:#06x}")]
    OutOfBounds { address: usize },

    #[error("program is {size} bytes, but only {available} bytes are available")]
    ProgramTooLarge { size: usize, available: usize },

    #[error("unknown opcode {0:#06x}")]
    UnknownOpcode(u16),

    #[error("return with an empty call stack")]
    StackUnderflow,

    #[error("call with a full call stack")]
    StackOverflow,

    #[error("invalid key {0:#x}, keys are in the range 0x0..=0xF")]
    InvalidKey(u8),
}

impl EmulatorError {

    /// Whether the machine state can no longer be trusted after this error.
    /// A driver must stop stepping once it has seen a fatal error.
    pub fn is_fatal(&self) -> bool {
        match self {
            EmulatorError::UnknownOpcode(_)
            | EmulatorError::StackUnderflow
            | EmulatorError::StackOverflow
            | EmulatorError::ProgramTooLarge { .. } => true,
            EmulatorError::OutOfBounds { .. } | EmulatorError::InvalidKey(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, EmulatorError>;
