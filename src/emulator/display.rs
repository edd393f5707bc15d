use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
type Screen = [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT];
const EMPTY_SCREEN: Screen = [[false; SCREEN_WIDTH]; SCREEN_HEIGHT];

/// The monochrome frame buffer sprites are drawn to.
///
/// Every mutation marks the buffer as dirty, and whoever presents the
/// frame is expected to call [`Display::mark_clean`] afterwards.
#[derive(Clone)]
pub struct Display {
    screen: Screen,
    dirty: bool,
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.screen {
            for c in row.iter() {
                write!(f, "{}", if *c { "#" } else { " " })?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl Display {

    pub fn new() -> Display {
        Display {
            screen: EMPTY_SCREEN,
            dirty: false,
        }
    }

    /// Turn every pixel off.
    pub fn clear(&mut self) {
        self.screen = EMPTY_SCREEN;
        self.dirty = true;
    }

    /// XOR a sprite onto the screen with its top left corner at `(x, y)`.
    /// Each byte is one row of 8 pixels, most significant bit to the left.
    /// Coordinates wrap around the edges of the screen.
    ///
    /// Returns true if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row_no, row) in sprite.iter().enumerate() {
            let py = (y + row_no) % SCREEN_HEIGHT;
            for col in 0..8 {
                if (*row >> (7 - col)) & 1 == 0 {
                    continue;
                }
                let px = (x + col) % SCREEN_WIDTH;
                let pixel = &mut self.screen[py][px];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }
        self.dirty = true;
        collision
    }

    /// Whether the pixel at `(x, y)` is lit. Out of range coordinates are off.
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.screen
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    /// Rows of pixels, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool; SCREEN_WIDTH]> {
        self.screen.iter()
    }

    /// Whether the buffer changed since it was last presented.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
