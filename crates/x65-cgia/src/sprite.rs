//! Sprite registers and the per-line row latch.

/// One 8-pixel-wide, 1 bpp sprite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sprite {
    /// Horizontal position, 9-bit.
    pub x: u16,
    /// First line, 9-bit.
    pub y: u16,
    /// Height in lines.
    pub height: u8,
    /// Palette index of set pixels.
    pub color: u8,
    /// Offset of the first row within the DMA bank.
    pub data_addr: u16,
    /// Row fetched for the line being drawn, MSB leftmost.
    pub row: u8,
}

impl Sprite {
    /// True when `line` falls inside the sprite.
    #[must_use]
    pub fn covers_line(&self, line: u16) -> bool {
        line >= self.y && line < self.y + u16::from(self.height)
    }

    /// Whether the sprite has a set pixel at beam position `x`.
    #[must_use]
    pub fn pixel(&self, x: u16) -> bool {
        x.checked_sub(self.x)
            .filter(|&dx| dx < 8)
            .is_some_and(|dx| self.row & (0x80 >> dx) != 0)
    }

    /// Register read, `reg` in 0..8.
    #[must_use]
    pub fn read(&self, reg: u8) -> u8 {
        match reg & 7 {
            0 => self.x as u8,
            1 => (self.x >> 8) as u8 & 1,
            2 => self.y as u8,
            3 => (self.y >> 8) as u8 & 1,
            4 => self.height,
            5 => self.color,
            6 => self.data_addr as u8,
            _ => (self.data_addr >> 8) as u8,
        }
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        let v = u16::from(value);
        match reg & 7 {
            0 => self.x = (self.x & 0x100) | v,
            1 => self.x = (self.x & 0xFF) | ((v & 1) << 8),
            2 => self.y = (self.y & 0x100) | v,
            3 => self.y = (self.y & 0xFF) | ((v & 1) << 8),
            4 => self.height = value,
            5 => self.color = value,
            6 => self.data_addr = (self.data_addr & 0xFF00) | v,
            _ => self.data_addr = (self.data_addr & 0x00FF) | (v << 8),
        }
    }
}
