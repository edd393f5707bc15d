use crate::emulator::error::{EmulatorError, Result};

pub const NUM_KEYS: usize = 16;

/// The state of the 16 keys, 0x0 to 0xF.
/// The emulator only reads it, an [`EmulatorInput`] keeps it up to date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}

impl Keypad {

    pub fn new() -> Keypad {
        Keypad::default()
    }

    pub fn is_pressed(&self, key: u8) -> Result<bool> {
        self.keys
            .get(key as usize)
            .copied()
            .ok_or(EmulatorError::InvalidKey(key))
    }

    pub fn set_pressed(&mut self, key: u8, pressed: bool) -> Result<()> {
        let state = self.keys.get_mut(key as usize).ok_or(EmulatorError::InvalidKey(key))?;
        *state = pressed;
        Ok(())
    }

    /// The lowest numbered key that is currently pressed.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|pressed| *pressed).map(|key| key as u8)
    }

    pub fn release_all(&mut self) {
        self.keys = [false; NUM_KEYS];
    }
}

/// Represents an input device that is capable of providing keys in the range 0..0xF.
/// It is polled once before every step.
pub trait EmulatorInput {
    fn update(&mut self, keypad: &mut Keypad);
}

/// An input device that never provides any input
pub struct DummyInput;

impl EmulatorInput for DummyInput {
    fn update(&mut self, _: &mut Keypad) {}
}
