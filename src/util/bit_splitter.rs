/// A structure for easily splitting an instruction word
/// into the fields used by the CHIP-8 instruction set.
///
/// ```text
/// [op][x][y][n]
///        [ nn ]
///     [  nnn  ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSplitter(u8, u8);

impl BitSplitter {

    pub fn from_u16(value: u16) -> BitSplitter {
        BitSplitter((value >> 8) as u8, (value & 0x00FF) as u8)
    }

    pub fn new(left: u8, right: u8) -> BitSplitter {
        BitSplitter(left, right)
    }

    /// Left-shift the first u8-component 8 bits,
    /// then take bitwise or with the second component
    /// in order to store the components in a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.0 as u16) << 8) | self.1 as u16
    }

    /// All four nibbles, most significant first.
    pub fn as_four_u8(&self) -> (u8, u8, u8, u8) {
        (self.op(), self.x(), self.y(), self.n())
    }

    /// The instruction family, bits 12-15.
    pub fn op(&self) -> u8 {
        self.0 >> 4
    }

    /// First register operand, bits 8-11.
    pub fn x(&self) -> u8 {
        self.0 & 0x0F
    }

    /// Second register operand, bits 4-7.
    pub fn y(&self) -> u8 {
        self.1 >> 4
    }

    pub fn n(&self) -> u8 {
        self.1 & 0x0F
    }

    pub fn nn(&self) -> u8 {
        self.1
    }

    pub fn nnn(&self) -> u16 {
        self.as_u16() & 0x0FFF
    }
}
