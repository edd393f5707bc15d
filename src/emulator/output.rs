use crate::emulator::display::Display;

/// Represents an output device that frames and tones can be sent to.
pub trait EmulatorOutput {
    /// Show a frame. Only called when the frame has changed.
    fn present(&mut self, display: &Display);
    /// Play a short tone.
    fn beep(&mut self);
}

/// A simple output device that keeps track of what it was given.
pub struct DummyOutput {
    last_frame: Option<String>,
    frames: usize,
    beeps: usize,
}

impl DummyOutput {
    pub fn new() -> DummyOutput {
        DummyOutput {
            last_frame: None,
            frames: 0,
            beeps: 0,
        }
    }

    /// The last presented frame, rendered as text.
    pub fn last_frame(&self) -> Option<&str> {
        self.last_frame.as_deref()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn beeps(&self) -> usize {
        self.beeps
    }
}

impl Default for DummyOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatorOutput for DummyOutput {
    fn present(&mut self, display: &Display) {
        self.last_frame = Some(display.to_string());
        self.frames += 1;
    }
    fn beep(&mut self) {
        self.beeps += 1;
    }
}
