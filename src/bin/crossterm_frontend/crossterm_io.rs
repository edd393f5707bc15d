use chip_8::emulator::display::{Display, SCREEN_HEIGHT, SCREEN_WIDTH};
use chip_8::emulator::input::{EmulatorInput, Keypad};
use chip_8::emulator::output::EmulatorOutput;

use super::key_manager::KeyManager;

use crossterm::event::KeyCode;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use std::io::{stdout, Stdout, Write};

pub struct CrosstermInput<'a> {
    key_manager: &'a KeyManager,
}

impl CrosstermInput<'_> {
    pub fn new(key_manager: &KeyManager) -> CrosstermInput {
        CrosstermInput { key_manager }
    }
}

impl EmulatorInput for CrosstermInput<'_> {
    fn update(&mut self, keypad: &mut Keypad) {
        keypad.release_all();
        for key in self.key_manager.held_keys().into_iter().filter_map(key_to_u8) {
            if let Err(error) = keypad.set_pressed(key, true) {
                log::warn!("{}", error);
            }
        }
    }
}

/// Draws the screen inside a box, two characters per pixel.
pub struct CrosstermOutput {
    stdout: Stdout,
    cells: [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT],
}

impl CrosstermOutput {
    pub fn new() -> crossterm::Result<CrosstermOutput> {
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))?;
        terminal::enable_raw_mode()?;

        let bottom = SCREEN_HEIGHT as u16 + 1;
        let right = 2 * SCREEN_WIDTH as u16 + 1;
        for y in 0..=bottom {
            for x in 0..=right {
                let c = match (x, y) {
                    (0, 0) => '┏',
                    (x, 0) if x == right => '┓',
                    (0, y) if y == bottom => '┗',
                    (x, y) if x == right && y == bottom => '┛',
                    (_, 0) => '━',
                    (_, y) if y == bottom => '━',
                    (0, _) => '┃',
                    (x, _) if x == right => '┃',
                    _ => continue,
                };
                queue!(stdout, cursor::MoveTo(x, y), Print(c))?;
            }
        }
        stdout.flush()?;

        Ok(CrosstermOutput {
            stdout,
            cells: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
        })
    }

    /// Redraw the pixels that changed since the last frame.
    fn draw(&mut self, display: &Display) -> crossterm::Result<()> {
        for (y, row) in display.rows().enumerate() {
            for (x, pixel) in row.iter().enumerate() {
                let cell = &mut self.cells[y][x];
                if *cell != *pixel {
                    *cell = *pixel;
                    queue!(
                        self.stdout,
                        cursor::MoveTo(2 * x as u16 + 1, y as u16 + 1),
                        Print(if *pixel { "██" } else { "  " })
                    )?;
                }
            }
        }
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for CrosstermOutput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(self.stdout, LeaveAlternateScreen, cursor::Show);
    }
}

impl EmulatorOutput for CrosstermOutput {
    fn present(&mut self, display: &Display) {
        if let Err(error) = self.draw(display) {
            log::error!("Could not draw frame: {}", error);
        }
    }

    fn beep(&mut self) {
        // The terminal bell
        let _ = write!(self.stdout, "\x07").and_then(|_| self.stdout.flush());
    }
}

/// Map the left side of a QWERTY keyboard to the hexadecimal keypad.
fn key_to_u8(key: KeyCode) -> Option<u8> {
    let c = match key {
        KeyCode::Char(c) => c.to_ascii_lowercase(),
        _ => return None,
    };
    let key = match c {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xC,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xD,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xE,
        'z' => 0xA,
        'x' => 0x0,
        'c' => 0xB,
        'v' => 0xF,
        _ => return None,
    };
    Some(key)
}
