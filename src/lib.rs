/*!

A CHIP-8 interpreter as specified at https://en.wikipedia.org/wiki/CHIP-8.

# Crossterm Frontend

If you want to try the emulator on some programs, there is a ready-to-use implementation
you can run by using `cargo run --release --bin crossterm_frontend -- <program>`.
The keypad is mapped to the left side of a QWERTY keyboard, and `Esc` quits.

```text
CHIP-8 keypad    Keyboard
1 2 3 C          1 2 3 4
4 5 6 D          Q W E R
7 8 9 E          A S D F
A 0 B F          Z X C V
```

There is also `no_frontend`, which runs a program for a number of steps
and prints the final screen as text.

# Library

If you are not interested in handling input and output,
then you can use `Emulator::new()` to get an emulator to work with.

The main way of running a program is to load instructions as bytes.

```rust
use chip_8::emulator::{Emulator, Progress};

let mut emulator = Emulator::new();

// Load a program at address 0x200.
let clear_display = [0x00, 0xE0];
emulator.load(&clear_display)?;
let step = emulator.step()?; // Will now clear the display
assert_eq!(step.progress, Progress::Executed);
assert_eq!(emulator.program_counter(), 0x202);
# Ok::<(), chip_8::emulator::EmulatorError>(())
```

Alternatively, you can experiment by executing instructions manually.

```rust
use chip_8::emulator::Emulator;
use chip_8::emulator::instruction::{Instruction, Reg, Const, Addr};

let mut emulator = Emulator::new();

// Execute instructions manually
emulator.execute_single(Instruction::ClearScreen)?;

// Or many sequentially
emulator.execute_many(&[
    Instruction::Goto(Addr(0x250)),
    Instruction::SetRegToConst(Reg(0xA), Const(35)),
    Instruction::SetRegToReg(Reg(0xB), Reg(0xA))
])?;
assert_eq!(emulator.registers()[0xB], 35);
# Ok::<(), chip_8::emulator::EmulatorError>(())
```

Programs that go wrong report it, rather than carrying on with garbage state.

```rust
use chip_8::emulator::{Emulator, EmulatorError};

let mut emulator = Emulator::new();
emulator.load(&[0x00, 0xEE])?; // Return, without a call
assert_eq!(emulator.step(), Err(EmulatorError::StackUnderflow));
# Ok::<(), EmulatorError>(())
```

## Custom input and output

To get keypresses and show the screen, you must implement `EmulatorInput` and `EmulatorOutput`,
which represent somewhere to get keyboard input from and a screen respectively.
Take a look at `src/emulator/input.rs` and `src/emulator/output.rs` to see how to implement this,
then hand them to a `Driver`, which steps the emulator and shuttles state between them.

```ignore
use chip_8::emulator::Driver;

let mut driver = Driver::with_io(MyInput::new(), MyOutput::new());
driver.load(&program)?;
driver.run(|| false)?;
```

You can then implement the emulator using your own custom frontend, as done with crossterm in crossterm_frontend.
*/

pub mod emulator;
pub mod util;
