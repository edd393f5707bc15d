use crate::emulator::error::{EmulatorError, Result};
use crate::emulator::font::{FONT, FONT_START};

pub const MEM_SIZE: usize = 4096;

/// Where programs are loaded, and where execution starts.
pub const PROGRAM_START: u16 = 0x200;

/// Flat, byte addressable memory. Every access is bounds checked,
/// callers that want wrapping addresses must mask them first.
#[derive(Clone)]
pub struct Memory {
    bytes: [u8; MEM_SIZE],
}

impl Memory {

    pub fn new() -> Memory {
        Memory { bytes: [0; MEM_SIZE] }
    }

    pub fn read(&self, address: u16) -> Result<u8> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(EmulatorError::OutOfBounds { address: address as usize })
    }

    pub fn write(&mut self, address: u16, value: u8) -> Result<()> {
        let byte = self
            .bytes
            .get_mut(address as usize)
            .ok_or(EmulatorError::OutOfBounds { address: address as usize })?;
        *byte = value;
        Ok(())
    }

    /// Copy `bytes` into memory starting at `address`.
    /// Nothing is written unless the whole block fits.
    pub fn write_block(&mut self, address: u16, bytes: &[u8]) -> Result<()> {
        let start = address as usize;
        let end = start + bytes.len();
        if end > MEM_SIZE {
            // Report the first address that does not exist
            return Err(EmulatorError::OutOfBounds { address: start.max(MEM_SIZE) });
        }
        self.bytes[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Copy a program into memory at 0x200.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        let available = MEM_SIZE - PROGRAM_START as usize;
        if program.len() > available {
            return Err(EmulatorError::ProgramTooLarge { size: program.len(), available });
        }
        self.write_block(PROGRAM_START, program)
    }

    /// Copy the built-in hexadecimal font to where `Fx29` expects it.
    pub fn load_font(&mut self) {
        let start = FONT_START as usize;
        self.bytes[start..start + FONT.len()].copy_from_slice(&FONT);
    }

    /// Zero everything, then put the font back.
    pub fn clear(&mut self) {
        self.bytes = [0; MEM_SIZE];
        self.load_font();
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn read_what_was_written() {
        let mut memory = Memory::new();
        memory.write(0x0FFF, 0xAB).unwrap();
        assert_eq!(memory.read(0x0FFF), Ok(0xAB));
    }

    #[test]
    fn access_past_the_end_is_out_of_bounds() {
        let mut memory = Memory::new();
        assert_eq!(memory.read(0x1000), Err(EmulatorError::OutOfBounds { address: 0x1000 }));
        assert_eq!(memory.write(0xFFFF, 1), Err(EmulatorError::OutOfBounds { address: 0xFFFF }));
    }

    #[test]
    fn write_block_is_all_or_nothing() {
        let mut memory = Memory::new();
        assert_eq!(
            memory.write_block(0x0FFE, &[1, 2, 3]),
            Err(EmulatorError::OutOfBounds { address: 0x1000 })
        );
        assert_eq!(memory.read(0x0FFE), Ok(0));
        assert_eq!(memory.read(0x0FFF), Ok(0));

        memory.write_block(0x0FFD, &[1, 2, 3]).unwrap();
        assert_eq!(memory.read(0x0FFF), Ok(3));
    }

    #[test]
    fn program_is_loaded_at_0x200() {
        let mut memory = Memory::new();
        memory.load_program(&[0x12, 0x34]).unwrap();
        assert_eq!(memory.read(0x1FF), Ok(0));
        assert_eq!(memory.read(0x200), Ok(0x12));
        assert_eq!(memory.read(0x201), Ok(0x34));
    }

    #[test]
    fn program_filling_all_space_fits() {
        let mut memory = Memory::new();
        let program = vec![0xAA; MEM_SIZE - 0x200];
        assert_eq!(memory.load_program(&program), Ok(()));
        assert_eq!(memory.read(0xFFF), Ok(0xAA));
    }

    #[test]
    fn font_is_loaded_at_font_start() {
        let mut memory = Memory::new();
        memory.load_font();
        assert_eq!(memory.read(FONT_START), Ok(0xF0));
        assert_eq!(memory.read(FONT_START + 79), Ok(0x80));
        assert_eq!(memory.read(FONT_START + 80), Ok(0));
    }

    #[test]
    fn oversized_program_is_rejected() {
        let mut memory = Memory::new();
        let program = vec![0xAA; MEM_SIZE - 0x200 + 1];
        assert_eq!(
            memory.load_program(&program),
            Err(EmulatorError::ProgramTooLarge { size: 3585, available: 3584 })
        );
        assert_eq!(memory.read(0x200), Ok(0));
    }

    #[test]
    fn clear_keeps_only_the_font() {
        let mut memory = Memory::new();
        memory.load_font();
        memory.load_program(&[0x12, 0x34]).unwrap();
        memory.write(0x0FFF, 0xAB).unwrap();

        memory.clear();
        assert_eq!(memory.read(0x200), Ok(0));
        assert_eq!(memory.read(0x0FFF), Ok(0));
        assert_eq!(memory.read(FONT_START), Ok(0xF0));
    }
}
