//! The CHIP-8 interpreter as described at https://en.wikipedia.org/wiki/CHIP-8#Virtual_machine_description.

use crate::emulator::display::Display;
use crate::emulator::error::{EmulatorError, Result};
use crate::emulator::font;
use crate::emulator::input::Keypad;
use crate::emulator::instruction::*;
use crate::emulator::memory::{Memory, PROGRAM_START};
use rand::{rngs::StdRng, Rng, SeedableRng};

const NUM_REGISTERS: usize = 16;
const STACK_SIZE: usize = 16;
const MAX_SPRITE_HEIGHT: usize = 15;
const ADDR_MASK: u16 = 0x0FFF;

/// VF doubles as the carry, borrow and collision flag.
const FLAG: usize = 0xF;

/// How far a step got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The instruction ran and the program counter moved on.
    Executed,
    /// `Fx0A` found no pressed key. The same instruction runs again next step.
    AwaitingKey,
}

/// The outcome of a single call to [`Emulator::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub progress: Progress,
    /// The sound timer ran out during this step.
    pub tone: bool,
}

pub struct Emulator {
    memory: Memory,
    registers: [u8; NUM_REGISTERS],
    delay_timer: u8,
    sound_timer: u8,
    i: u16,
    program_counter: u16,
    stack_pointer: usize,
    stack: [u16; STACK_SIZE],

    display: Display,
    keypad: Keypad,
    rng: StdRng,
}

impl Emulator {

    /// Create a new emulator, with the font loaded and nothing else in memory.
    pub fn new() -> Emulator {
        Emulator::with_rng(StdRng::from_entropy())
    }

    /// Create a new emulator whose random numbers are reproducible.
    pub fn with_seed(seed: u64) -> Emulator {
        Emulator::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Emulator {
        let mut memory = Memory::new();
        memory.load_font();

        Emulator {
            memory,
            registers: [0; NUM_REGISTERS],
            delay_timer: 0,
            sound_timer: 0,
            i: 0,
            program_counter: PROGRAM_START,
            stack_pointer: 0,
            stack: [0; STACK_SIZE],

            display: Display::new(),
            keypad: Keypad::new(),
            rng,
        }
    }

    /// Copy a program into memory at 0x200.
    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        self.memory.load_program(program)?;
        log::debug!("Loaded {} byte program", program.len());
        Ok(())
    }

    /// Put registers, timers, stack, screen and keys back the way they were
    /// after construction. Memory is kept, so a loaded program starts over.
    pub fn reset(&mut self) {
        self.registers = [0; NUM_REGISTERS];
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.i = 0;
        self.program_counter = PROGRAM_START;
        self.stack_pointer = 0;
        self.stack = [0; STACK_SIZE];
        self.display.clear();
        self.keypad.release_all();
        log::debug!("Reset");
    }

    /// Reset, and also wipe memory back to just the font.
    /// Nothing from a previously loaded program survives.
    pub fn power_cycle(&mut self) {
        self.memory.clear();
        self.reset();
    }

    /// Perform a single step, which will load an instruction and execute it,
    /// then update timers.
    ///
    /// A fatal error leaves the program counter on the offending instruction
    /// and the timers untouched. A step that fails with a recoverable error,
    /// such as `InvalidKey`, has still moved past the instruction and ticked the timers.
    pub fn step(&mut self) -> Result<Step> {
        let at = self.program_counter;

        // Each opcode is two bytes
        let left = self.memory.read(at)?;
        let right = self.memory.read(at.wrapping_add(1) & ADDR_MASK)?;
        let instruction = Instruction::from_two_u8(left, right)?;

        log::trace!("{:#05x}: {}", at, instruction);

        // Point past this instruction before executing it
        self.program_counter = at.wrapping_add(2) & ADDR_MASK;

        let progress = match self.execute_single(instruction) {
            Err(error) if error.is_fatal() => {
                self.program_counter = at;
                return Err(error);
            }
            result => result,
        };
        let tone = self.update_timers();

        Ok(Step { progress: progress?, tone })
    }

    /// Count both timers down, returns true when the sound timer runs out.
    fn update_timers(&mut self) -> bool {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }

        let tone = self.sound_timer == 1;
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
        }
        tone
    }

    /// Execute a single instruction without fetching it or touching the timers.
    /// The program counter is expected to already point past the instruction.
    pub fn execute_single(&mut self, instruction: Instruction) -> Result<Progress> {
        match instruction {

            // Only meaningful on the COSMAC VIP
            Instruction::MachineCall(Addr(addr)) => {
                log::debug!("Ignoring machine code routine at {:#05x}", addr);
            }

            // Clear the screen
            Instruction::ClearScreen => {
                self.display.clear();
            }

            // Return to the previous call site via the stack.
            Instruction::Return => {
                if self.stack_pointer == 0 {
                    return Err(EmulatorError::StackUnderflow);
                }
                self.stack_pointer -= 1;
                self.program_counter = self.stack[self.stack_pointer]; // Jump back via stack
            }

            // Go to a specific memory address
            Instruction::Goto(Addr(addr)) => {
                self.program_counter = addr;
            }

            // Store the current address on the stack, then jump to the specified address
            Instruction::Call(Addr(addr)) => {
                if self.stack_pointer == STACK_SIZE {
                    return Err(EmulatorError::StackOverflow);
                }
                self.stack[self.stack_pointer] = self.program_counter; // Store return address
                self.stack_pointer += 1;
                self.program_counter = addr; // Jump to addr
            }

            // If the register equals the constant, skip the next instruction
            Instruction::IfRegEqConst(Reg(x), Const(n)) => {
                self.skip_if(self.registers[x as usize] == n);
            }

            Instruction::IfRegNeqConst(Reg(x), Const(n)) => {
                self.skip_if(self.registers[x as usize] != n);
            }

            Instruction::IfRegEqReg(Reg(x), Reg(y)) => {
                self.skip_if(self.registers[x as usize] == self.registers[y as usize]);
            }

            Instruction::SetRegToConst(Reg(x), Const(n)) => {
                self.registers[x as usize] = n;
            }

            // Wraps, and leaves VF alone
            Instruction::IncRegByConst(Reg(x), Const(n)) => {
                self.registers[x as usize] = self.registers[x as usize].wrapping_add(n);
            }

            Instruction::SetRegToReg(Reg(x), Reg(y)) => {
                self.registers[x as usize] = self.registers[y as usize];
            }

            Instruction::BitwiseOr(Reg(x), Reg(y)) => {
                self.registers[x as usize] |= self.registers[y as usize];
            }

            Instruction::BitwiseAnd(Reg(x), Reg(y)) => {
                self.registers[x as usize] &= self.registers[y as usize];
            }

            Instruction::BitwiseXor(Reg(x), Reg(y)) => {
                self.registers[x as usize] ^= self.registers[y as usize];
            }

            // Increment the value of a register by the value of another, VF is the carry
            Instruction::IncRegByReg(Reg(x), Reg(y)) => {
                let (sum, carry) = self.registers[x as usize].overflowing_add(self.registers[y as usize]);
                self.registers[x as usize] = sum;
                self.registers[FLAG] = carry as u8;
            }

            // Decrement the value of a register by the value of another, VF is 1 when there is no borrow
            Instruction::DecRegByReg(Reg(x), Reg(y)) => {
                let (vx, vy) = (self.registers[x as usize], self.registers[y as usize]);
                self.registers[x as usize] = vx.wrapping_sub(vy);
                self.registers[FLAG] = (vx > vy) as u8;
            }

            // VF gets the bit that is shifted out
            Instruction::BitshiftRight(Reg(x)) => {
                let vx = self.registers[x as usize];
                self.registers[x as usize] = vx >> 1;
                self.registers[FLAG] = vx & 1;
            }

            Instruction::SetVxVyMinusVx(Reg(x), Reg(y)) => {
                let (vx, vy) = (self.registers[x as usize], self.registers[y as usize]);
                self.registers[x as usize] = vy.wrapping_sub(vx);
                self.registers[FLAG] = (vy > vx) as u8;
            }

            Instruction::BitshiftLeft(Reg(x)) => {
                let vx = self.registers[x as usize];
                self.registers[x as usize] = vx << 1;
                self.registers[FLAG] = vx >> 7;
            }

            Instruction::IfRegNeqReg(Reg(x), Reg(y)) => {
                self.skip_if(self.registers[x as usize] != self.registers[y as usize]);
            }

            Instruction::SetI(Addr(addr)) => {
                self.i = addr;
            }

            Instruction::SetPcToV0PlusAddr(Addr(addr)) => {
                self.program_counter = addr.wrapping_add(self.registers[0] as u16) & ADDR_MASK;
            }

            Instruction::SetVxRand(Reg(x), Const(n)) => {
                self.registers[x as usize] = self.rng.gen::<u8>() & n;
            }

            Instruction::Draw(Reg(x), Reg(y), Const(sprite_height)) => {

                // Get coordinates
                let x_coord = self.registers[x as usize] as usize;
                let y_coord = self.registers[y as usize] as usize;

                // Get sprite, each row is 8 bits
                let height = sprite_height as usize;
                let mut sprite = [0; MAX_SPRITE_HEIGHT];
                for (row_no, row) in sprite.iter_mut().take(height).enumerate() {
                    *row = self.memory.read(self.offset_from_i(row_no))?;
                }

                // Set VF collision flag
                let collision = self.display.draw_sprite(x_coord, y_coord, &sprite[..height]);
                self.registers[FLAG] = collision as u8;
            }

            // Skip if the key in Vx is pressed
            Instruction::IfKeyEqVx(Reg(x)) => {
                let pressed = self.keypad.is_pressed(self.registers[x as usize])?;
                self.skip_if(pressed);
            }

            // Skip if the key in Vx isn't pressed
            Instruction::IfKeyNeqVx(Reg(x)) => {
                let pressed = self.keypad.is_pressed(self.registers[x as usize])?;
                self.skip_if(!pressed);
            }

            Instruction::SetRegToDelayTimer(Reg(x)) => {
                self.registers[x as usize] = self.delay_timer;
            }

            // Wait for a key press by running this instruction again until there is one
            Instruction::SetRegToGetKey(Reg(x)) => match self.keypad.first_pressed() {
                Some(key) => self.registers[x as usize] = key,
                None => {
                    self.program_counter = self.program_counter.wrapping_sub(2) & ADDR_MASK;
                    return Ok(Progress::AwaitingKey);
                }
            },

            Instruction::SetDelayTimerToReg(Reg(x)) => {
                self.delay_timer = self.registers[x as usize];
            }

            Instruction::SetSoundTimerToReg(Reg(x)) => {
                self.sound_timer = self.registers[x as usize];
            }

            Instruction::AddRegToI(Reg(x)) => {
                self.i = self.i.wrapping_add(self.registers[x as usize] as u16);
            }

            // Set i to character address. Each font element is 5 bytes tall.
            Instruction::SetIToSpriteAddrVx(Reg(x)) => {
                self.i = font::sprite_addr(self.registers[x as usize]);
            }

            Instruction::SetIToBcdOfReg(Reg(x)) => {
                let value = self.registers[x as usize];
                self.memory.write(self.offset_from_i(0), value / 100)?;
                self.memory.write(self.offset_from_i(1), value / 10 % 10)?;
                self.memory.write(self.offset_from_i(2), value % 10)?;
            }

            // Dump register values up to Vx
            Instruction::RegDump(Reg(x)) => {
                for reg_no in 0..=x as usize {
                    self.memory.write(self.offset_from_i(reg_no), self.registers[reg_no])?;
                }
            }

            // Load register values up to Vx
            Instruction::RegLoad(Reg(x)) => {
                for reg_no in 0..=x as usize {
                    self.registers[reg_no] = self.memory.read(self.offset_from_i(reg_no))?;
                }
            }
        };

        Ok(Progress::Executed)
    }

    /// Execute instructions in order, stopping at the first error.
    pub fn execute_many(&mut self, instructions: &[Instruction]) -> Result<()> {
        for instruction in instructions {
            self.execute_single(*instruction)?;
        }
        Ok(())
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.program_counter = self.program_counter.wrapping_add(2) & ADDR_MASK;
        }
    }

    /// The address `offset` bytes past I, wrapped to the address space.
    fn offset_from_i(&self, offset: usize) -> u16 {
        self.i.wrapping_add(offset as u16) & ADDR_MASK
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    /// Return addresses, the most recent call last.
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.stack_pointer]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut Display {
        &mut self.display
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn emulator_with(program: &[u8]) -> Emulator {
        let mut emulator = Emulator::with_seed(8);
        emulator.load(program).unwrap();
        emulator
    }

    fn assert_reset_state(emulator: &Emulator) {
        assert_eq!(emulator.program_counter, 0x200);
        assert_eq!(emulator.i, 0);
        assert_eq!(emulator.registers, [0; NUM_REGISTERS]);
        assert!(emulator.stack().is_empty());
        assert_eq!(emulator.delay_timer, 0);
        assert_eq!(emulator.sound_timer, 0);
        assert!(emulator.display.rows().all(|row| row.iter().all(|pixel| !pixel)));
    }

    #[test]
    fn new_emulator_is_in_reset_state() {
        assert_reset_state(&Emulator::new());
    }

    #[test]
    fn reset_restores_initial_state_but_keeps_the_program() {
        let mut emulator = emulator_with(&[0x60, 0x05, 0xF0, 0x15, 0xA2, 0x22, 0x23, 0x00]);
        for _ in 0..4 {
            emulator.step().unwrap();
        }
        emulator.display.draw_sprite(0, 0, &[0xFF]);
        emulator.keypad.set_pressed(3, true).unwrap();

        emulator.reset();
        assert_reset_state(&emulator);
        assert_eq!(emulator.keypad.first_pressed(), None);
        assert_eq!(emulator.memory.read(0x200), Ok(0x60));
    }

    #[test]
    fn power_cycle_also_wipes_memory() {
        // Store BCD of V0 at 0x300, then stop
        let mut emulator = emulator_with(&[0x60, 0x7B, 0xA3, 0x00, 0xF0, 0x33]);
        for _ in 0..3 {
            emulator.step().unwrap();
        }
        assert_eq!(emulator.memory.read(0x300), Ok(1));

        emulator.power_cycle();
        assert_reset_state(&emulator);
        assert_eq!(emulator.memory.read(0x200), Ok(0));
        assert_eq!(emulator.memory.read(0x300), Ok(0));
        assert_eq!(emulator.memory.read(font::sprite_addr(0xF)), Ok(0xF0));
    }

    #[test]
    fn goto_goes_to() {
        let mut emulator = Emulator::new();
        emulator.program_counter = 0x456;
        emulator.execute_single(Instruction::Goto(Addr(0x250))).unwrap();
        assert_eq!(emulator.program_counter, 0x250);
    }

    #[test]
    fn jump_word_sets_pc_exactly() {
        let mut emulator = emulator_with(&[0x1A, 0xBC]);
        emulator.step().unwrap();
        assert_eq!(emulator.program_counter, 0x0ABC);
    }

    #[test]
    fn return_after_call_is_neutral() {
        // Create emulator
        let mut emulator = Emulator::new();
        assert_eq!(emulator.program_counter, 0x200);

        // Write program with call and return
        let program = [
            0x22, 0x06, // 0x00, call 0x206
            0x00, 0x00, // 0x02
            0x00, 0x00, // 0x04
            0x00, 0xEE  // 0x06, return
        ];
        emulator.load(&program).unwrap();

        // Run the program
        emulator.step().unwrap(); // Call 0x206
        assert_eq!(emulator.program_counter, 0x206);
        assert_eq!(emulator.stack(), &[0x202]);
        emulator.step().unwrap(); // Return to 202
        assert_eq!(emulator.program_counter, 0x202);
        assert!(emulator.stack().is_empty());
    }

    #[test]
    fn call_pushes_the_next_address() {
        let mut emulator = emulator_with(&[0x23, 0x00]);
        emulator.memory.write_block(0x300, &[0x00, 0xEE]).unwrap();

        emulator.step().unwrap();
        assert_eq!(emulator.stack(), &[0x202]);
        assert_eq!(emulator.program_counter, 0x300);

        emulator.step().unwrap();
        assert_eq!(emulator.program_counter, 0x202);
    }

    #[test]
    fn return_with_empty_stack_underflows() {
        let mut emulator = emulator_with(&[0x00, 0xEE]);
        assert_eq!(emulator.step(), Err(EmulatorError::StackUnderflow));
        assert_eq!(emulator.program_counter, 0x200);
    }

    #[test]
    fn call_with_full_stack_overflows() {
        // Calls itself forever
        let mut emulator = emulator_with(&[0x22, 0x00]);
        for _ in 0..STACK_SIZE {
            emulator.step().unwrap();
        }
        assert_eq!(emulator.step(), Err(EmulatorError::StackOverflow));
        assert_eq!(emulator.program_counter, 0x200);
        assert_eq!(emulator.stack_pointer, STACK_SIZE);
    }

    #[test]
    fn unknown_opcode_is_reported_and_pc_stays() {
        let mut emulator = emulator_with(&[0x50, 0x01]);
        assert_eq!(emulator.step(), Err(EmulatorError::UnknownOpcode(0x5001)));
        assert_eq!(emulator.program_counter, 0x200);
    }

    #[test]
    fn machine_call_does_nothing() {
        let mut emulator = emulator_with(&[0x03, 0x45]);
        assert_eq!(emulator.step().map(|step| step.progress), Ok(Progress::Executed));
        assert_eq!(emulator.program_counter, 0x202);
        assert_eq!(emulator.registers, [0; NUM_REGISTERS]);
    }

    #[test]
    fn pc_wraps_at_end_of_memory() {
        let mut emulator = Emulator::new();
        emulator.memory.write_block(0xFFE, &[0x61, 0x07]).unwrap();
        emulator.program_counter = 0xFFE;
        emulator.step().unwrap();
        assert_eq!(emulator.registers[1], 7);
        assert_eq!(emulator.program_counter, 0x000);
    }

    #[test_case(0x3A08, 0x08, 0x00 => 0x204 ; "skip if equal to constant")]
    #[test_case(0x3A08, 0x09, 0x00 => 0x202 ; "no skip if not equal to constant")]
    #[test_case(0x4A08, 0x09, 0x00 => 0x204 ; "skip if not equal to constant")]
    #[test_case(0x4A08, 0x08, 0x00 => 0x202 ; "no skip if equal to constant")]
    #[test_case(0x5AB0, 0x42, 0x42 => 0x204 ; "skip if registers equal")]
    #[test_case(0x5AB0, 0x42, 0x43 => 0x202 ; "no skip if registers differ")]
    #[test_case(0x9AB0, 0x42, 0x43 => 0x204 ; "skip if registers differ")]
    #[test_case(0x9AB0, 0x42, 0x42 => 0x202 ; "no skip if registers equal")]
    fn conditional_skips(word: u16, va: u8, vb: u8) -> u16 {
        let mut emulator = emulator_with(&word.to_be_bytes());
        emulator.registers[0xA] = va;
        emulator.registers[0xB] = vb;
        emulator.step().unwrap();
        emulator.program_counter
    }

    #[test_case(0x8AB0, 0x0F, 0xF0 => 0xF0 ; "assign")]
    #[test_case(0x8AB1, 0x0C, 0x0A => 0x0E ; "or")]
    #[test_case(0x8AB2, 0x0C, 0x0A => 0x08 ; "and")]
    #[test_case(0x8AB3, 0x0C, 0x0A => 0x06 ; "xor")]
    fn logic_leaves_the_flag_alone(word: u16, va: u8, vb: u8) -> u8 {
        let mut emulator = emulator_with(&word.to_be_bytes());
        emulator.registers[0xA] = va;
        emulator.registers[0xB] = vb;
        emulator.registers[FLAG] = 0x55;
        emulator.step().unwrap();
        assert_eq!(emulator.registers[FLAG], 0x55);
        emulator.registers[0xA]
    }

    #[test_case(0x8AB4, 0xFF, 0x01 => (0x00, 1) ; "add with carry")]
    #[test_case(0x8AB4, 0x10, 0x20 => (0x30, 0) ; "add without carry")]
    #[test_case(0x8AB5, 0x01, 0x02 => (0xFF, 0) ; "sub with borrow")]
    #[test_case(0x8AB5, 0x05, 0x03 => (0x02, 1) ; "sub without borrow")]
    #[test_case(0x8AB5, 0x05, 0x05 => (0x00, 0) ; "sub equal")]
    #[test_case(0x8AB7, 0x02, 0x01 => (0xFF, 0) ; "reverse sub with borrow")]
    #[test_case(0x8AB7, 0x03, 0x05 => (0x02, 1) ; "reverse sub without borrow")]
    #[test_case(0x8AB6, 0x05, 0x00 => (0x02, 1) ; "shift right out a one")]
    #[test_case(0x8AB6, 0x04, 0xFF => (0x02, 0) ; "shift right ignores vy")]
    #[test_case(0x8ABE, 0x81, 0x00 => (0x02, 1) ; "shift left out a one")]
    #[test_case(0x8ABE, 0x41, 0x00 => (0x82, 0) ; "shift left out a zero")]
    fn arithmetic_sets_result_and_flag(word: u16, va: u8, vb: u8) -> (u8, u8) {
        let mut emulator = emulator_with(&word.to_be_bytes());
        emulator.registers[0xA] = va;
        emulator.registers[0xB] = vb;
        emulator.step().unwrap();
        (emulator.registers[0xA], emulator.registers[FLAG])
    }

    #[test]
    fn flag_wins_when_vf_is_the_target() {
        let mut emulator = emulator_with(&[0x8F, 0x14]);
        emulator.registers[FLAG] = 0xFF;
        emulator.registers[1] = 0x01;
        emulator.step().unwrap();
        assert_eq!(emulator.registers[FLAG], 1);
    }

    #[test]
    fn add_constant_wraps_without_flag() {
        let mut emulator = emulator_with(&[0x73, 0x02]);
        emulator.registers[3] = 0xFF;
        emulator.step().unwrap();
        assert_eq!(emulator.registers[3], 0x01);
        assert_eq!(emulator.registers[FLAG], 0);
    }

    #[test]
    fn jump_with_offset_adds_v0() {
        let mut emulator = emulator_with(&[0xB3, 0x00]);
        emulator.registers[0] = 0x10;
        emulator.step().unwrap();
        assert_eq!(emulator.program_counter, 0x310);
    }

    #[test]
    fn random_is_masked_by_constant() {
        let mut emulator = emulator_with(&[0xC1, 0x0F, 0xC2, 0x00]);
        emulator.registers[2] = 0xAA;
        emulator.step().unwrap();
        emulator.step().unwrap();
        assert!(emulator.registers[1] <= 0x0F);
        assert_eq!(emulator.registers[2], 0);
    }

    #[test]
    fn same_seed_gives_same_random_numbers() {
        let program = [0xC1, 0xFF, 0xC2, 0xFF, 0xC3, 0xFF];
        let mut first = emulator_with(&program);
        let mut second = emulator_with(&program);
        for _ in 0..3 {
            first.step().unwrap();
            second.step().unwrap();
        }
        assert_eq!(first.registers, second.registers);
    }

    #[test]
    fn bcd_of_157() {
        let mut emulator = emulator_with(&[0xA3, 0x00, 0xF5, 0x33]);
        emulator.registers[5] = 157;
        emulator.step().unwrap();
        emulator.step().unwrap();
        assert_eq!(emulator.memory.read(0x300), Ok(1));
        assert_eq!(emulator.memory.read(0x301), Ok(5));
        assert_eq!(emulator.memory.read(0x302), Ok(7));
        assert_eq!(emulator.i, 0x300);
    }

    #[test]
    fn registers_are_dumped_and_loaded_through_i() {
        let mut emulator = Emulator::new();
        emulator.registers[..4].copy_from_slice(&[1, 2, 3, 4]);
        emulator.i = 0x400;
        emulator.execute_single(Instruction::RegDump(Reg(2))).unwrap();
        assert_eq!(emulator.memory.read(0x402), Ok(3));
        assert_eq!(emulator.memory.read(0x403), Ok(0));
        assert_eq!(emulator.i, 0x400);

        emulator.registers = [0; NUM_REGISTERS];
        emulator.execute_single(Instruction::RegLoad(Reg(3))).unwrap();
        assert_eq!(&emulator.registers[..5], &[1, 2, 3, 0, 0]);
    }

    #[test]
    fn register_dump_wraps_past_end_of_memory() {
        let mut emulator = Emulator::new();
        emulator.registers[..2].copy_from_slice(&[0xAA, 0xBB]);
        emulator.i = 0xFFF;
        emulator.execute_single(Instruction::RegDump(Reg(1))).unwrap();
        assert_eq!(emulator.memory.read(0xFFF), Ok(0xAA));
        assert_eq!(emulator.memory.read(0x000), Ok(0xBB));
    }

    #[test]
    fn add_to_i_wraps_at_16_bits() {
        let mut emulator = Emulator::new();
        emulator.i = 0xFFFF;
        emulator.registers[4] = 2;
        emulator.execute_single(Instruction::AddRegToI(Reg(4))).unwrap();
        assert_eq!(emulator.i, 0x0001);
        assert_eq!(emulator.registers[FLAG], 0);
    }

    #[test]
    fn font_sprite_address() {
        let mut emulator = Emulator::new();
        emulator.registers[0] = 0xA;
        emulator.execute_single(Instruction::SetIToSpriteAddrVx(Reg(0))).unwrap();
        assert_eq!(emulator.i, font::FONT_START + 50);
    }

    #[test]
    fn draw_reports_collision_in_vf() {
        // Draw the "0" glyph twice at (V1, V2)
        let mut emulator = emulator_with(&[0xD1, 0x25, 0xD1, 0x25]);
        emulator.registers[1] = 60;
        emulator.registers[2] = 30;
        emulator.registers[FLAG] = 1;

        emulator.step().unwrap();
        assert_eq!(emulator.registers[FLAG], 0);
        assert!(emulator.display.get(60, 30));
        assert!(emulator.display.get(63, 30));
        assert!(emulator.display.get(60, 0)); // Wrapped to the top
        assert!(emulator.display.is_dirty());

        emulator.step().unwrap();
        assert_eq!(emulator.registers[FLAG], 1);
        assert!(emulator.display.rows().all(|row| row.iter().all(|pixel| !pixel)));
    }

    #[test]
    fn clear_screen_clears_screen() {
        let mut emulator = emulator_with(&[0x00, 0xE0]);
        emulator.display.draw_sprite(0, 0, &[0xFF]);
        emulator.display.mark_clean();
        emulator.step().unwrap();
        assert!(!emulator.display.get(0, 0));
        assert!(emulator.display.is_dirty());
    }

    #[test_case(0xE19E, true => 0x204 ; "skip if pressed and pressed")]
    #[test_case(0xE19E, false => 0x202 ; "skip if pressed and released")]
    #[test_case(0xE1A1, true => 0x202 ; "skip if released and pressed")]
    #[test_case(0xE1A1, false => 0x204 ; "skip if released and released")]
    fn key_skips(word: u16, pressed: bool) -> u16 {
        let mut emulator = emulator_with(&word.to_be_bytes());
        emulator.registers[1] = 0xB;
        emulator.keypad.set_pressed(0xB, pressed).unwrap();
        emulator.step().unwrap();
        emulator.program_counter
    }

    #[test]
    fn key_skip_on_register_above_f_is_invalid() {
        let mut emulator = emulator_with(&[0xE1, 0x9E]);
        emulator.registers[1] = 0x10;
        assert_eq!(emulator.step(), Err(EmulatorError::InvalidKey(0x10)));
    }

    #[test]
    fn timers_tick_on_a_step_with_an_invalid_key() {
        let mut emulator = emulator_with(&[0xE1, 0x9E]);
        emulator.registers[1] = 0x10;
        emulator.delay_timer = 5;
        emulator.sound_timer = 1;
        assert_eq!(emulator.step(), Err(EmulatorError::InvalidKey(0x10)));
        assert_eq!(emulator.delay_timer, 4);
        assert_eq!(emulator.sound_timer, 0);
        assert_eq!(emulator.program_counter, 0x202);
    }

    #[test]
    fn wait_for_key_retries_until_pressed() {
        let mut emulator = emulator_with(&[0xF3, 0x0A]);
        emulator.delay_timer = 5;

        for _ in 0..3 {
            let step = emulator.step().unwrap();
            assert_eq!(step.progress, Progress::AwaitingKey);
            assert_eq!(emulator.program_counter, 0x200);
        }
        assert_eq!(emulator.delay_timer, 2);

        emulator.keypad.set_pressed(0x9, true).unwrap();
        assert_eq!(emulator.step().map(|step| step.progress), Ok(Progress::Executed));
        assert_eq!(emulator.registers[3], 0x9);
        assert_eq!(emulator.program_counter, 0x202);
    }

    #[test]
    fn delay_timer_counts_down_to_zero() {
        // Set the delay timer to 2, then read it back twice
        let mut emulator = emulator_with(&[0x60, 0x02, 0xF0, 0x15, 0xF1, 0x07, 0xF2, 0x07]);
        for _ in 0..4 {
            emulator.step().unwrap();
        }
        assert_eq!(emulator.registers[1], 1);
        assert_eq!(emulator.registers[2], 0);
        assert_eq!(emulator.delay_timer, 0);
    }

    #[test]
    fn sound_timer_at_one_beeps_once() {
        let mut emulator = emulator_with(&[0x60, 0x00, 0x60, 0x00]);
        emulator.sound_timer = 1;

        let step = emulator.step().unwrap();
        assert!(step.tone);
        assert_eq!(emulator.sound_timer, 0);

        let step = emulator.step().unwrap();
        assert!(!step.tone);
    }

    #[test]
    fn sound_timer_set_by_instruction_beeps_when_it_runs_out() {
        let mut emulator = emulator_with(&[0x60, 0x03, 0xF0, 0x18, 0x12, 0x04]);
        let tones: Vec<bool> = (0..5).map(|_| emulator.step().unwrap().tone).collect();
        assert_eq!(tones, vec![false, false, false, true, false]);
    }

    #[test]
    fn execute_many_runs_in_order() {
        let mut emulator = Emulator::new();
        emulator
            .execute_many(&[
                Instruction::Goto(Addr(0x250)),
                Instruction::SetRegToConst(Reg(0xA), Const(35)),
                Instruction::SetRegToReg(Reg(0xB), Reg(0xA)),
            ])
            .unwrap();
        assert_eq!(emulator.program_counter, 0x250);
        assert_eq!(emulator.registers[0xB], 35);
    }

    proptest! {
        #[test]
        fn add_wraps_and_flags_carry(a in any::<u8>(), b in any::<u8>()) {
            let mut emulator = emulator_with(&[0x81, 0x24]);
            emulator.registers[1] = a;
            emulator.registers[2] = b;
            emulator.step().unwrap();
            prop_assert_eq!(emulator.registers[1], a.wrapping_add(b));
            prop_assert_eq!(emulator.registers[FLAG], (a as u16 + b as u16 > 255) as u8);
        }

        #[test]
        fn sub_wraps_and_flags_not_borrow(a in any::<u8>(), b in any::<u8>()) {
            let mut emulator = emulator_with(&[0x81, 0x25]);
            emulator.registers[1] = a;
            emulator.registers[2] = b;
            emulator.step().unwrap();
            prop_assert_eq!(emulator.registers[1], a.wrapping_sub(b));
            prop_assert_eq!(emulator.registers[FLAG], (a > b) as u8);
        }

        #[test]
        fn bcd_digits_rebuild_the_value(value in any::<u8>()) {
            let mut emulator = Emulator::new();
            emulator.registers[0] = value;
            emulator.i = 0x500;
            emulator.execute_single(Instruction::SetIToBcdOfReg(Reg(0))).unwrap();
            let digits: Vec<u8> = (0x500..0x503).map(|a| emulator.memory.read(a).unwrap()).collect();
            prop_assert!(digits.iter().all(|d| *d < 10));
            prop_assert_eq!(digits[0] as u16 * 100 + digits[1] as u16 * 10 + digits[2] as u16, value as u16);
        }
    }
}
