//! X65 CGIA (Color Graphic Interface Adaptor).
//!
//! The CGIA runs its own beam over a 400 × 262 raster, draws a 384 × 240
//! visible area into an ARGB framebuffer and fetches display data from
//! shared RAM through [`DmaBus`], independently of the CPU's bus cycle.
//!
//! # Timing
//!
//! - 400 ticks per line, one pixel per tick for ticks 0-383
//! - 262 lines per frame, lines 0-239 visible
//! - bitmap byte fetched every 8 visible ticks
//! - sprite rows fetched at ticks 384-387 for the following line
//!
//! # Registers ($00-$3F)
//!
//! | Reg     | Name          | Description                                  |
//! |---------|---------------|----------------------------------------------|
//! | $00     | MODE          | bit0 display enable, bit1 bitmap enable      |
//! | $01     | BG_COLOR      | bitmap 0 pixels                              |
//! | $02     | FG_COLOR      | bitmap 1 pixels                              |
//! | $03     | BORDER_COLOR  | whole screen while the display is disabled   |
//! | $04     | DMA_BANK      | bank of bitmap and sprite data               |
//! | $06-$07 | BITMAP_ADDR   | bitmap offset in the DMA bank                |
//! | $08-$09 | RASTER        | current line (read-only)                     |
//! | $0A-$0B | INT_RASTER    | raster compare line, 9-bit                   |
//! | $0C     | INT_ENABLE    | bit0 raster, bit1 vblank                     |
//! | $0D     | INT_STATUS    | bit0 raster, bit1 vblank, bit7 any enabled; write 1 to acknowledge |
//! | $0E     | COLL_SS       | sprite-sprite collisions, cleared by reading |
//! | $0F     | COLL_SP       | sprite-bitmap collisions, cleared by reading |
//! | $10     | SPRITE_ENABLE | bits 0-3                                     |
//! | $20+8n  | SPRITE n      | X (9-bit), Y (9-bit), HEIGHT, COLOR, DATA_ADDR |
//!
//! Unused low bits read as 1 in MODE, INT_RASTER hi, INT_ENABLE and
//! SPRITE_ENABLE. Unmapped slots read `$FF`.

mod palette;
mod sprite;

use emu_core::{DmaBus, Observable, Pins, Value};

pub use palette::PALETTE;
pub use sprite::Sprite;

/// Beam ticks per raster line.
pub const TICKS_PER_LINE: u16 = 400;
/// Raster lines per frame.
pub const LINES_PER_FRAME: u16 = 262;
/// Ticks per frame.
pub const TICKS_PER_FRAME: u64 = TICKS_PER_LINE as u64 * LINES_PER_FRAME as u64;
/// Visible width in pixels.
pub const FB_WIDTH: u32 = 384;
/// Visible height in lines.
pub const FB_HEIGHT: u32 = 240;
/// Number of hardware sprites.
pub const SPRITES: usize = 4;

/// Bitmap bytes per line.
const BYTES_PER_LINE: u16 = 48;
/// First line of vertical blank.
const VBLANK_LINE: u16 = 240;
/// First sprite fetch tick.
const SPRITE_FETCH: u16 = 384;

pub const MODE_DISPLAY: u8 = 0x01;
pub const MODE_BITMAP: u8 = 0x02;
pub const INT_RASTER: u8 = 0x01;
pub const INT_VBLANK: u8 = 0x02;

/// CGIA construction options. Geometry is fixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CgiaConfig {}

/// Registers, beam position and latches: everything except the framebuffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CgiaState {
    pub mode: u8,
    pub bg_color: u8,
    pub fg_color: u8,
    pub border_color: u8,
    pub dma_bank: u8,
    pub bitmap_addr: u16,
    pub int_raster: u16,
    pub int_enable: u8,
    pub int_status: u8,
    pub coll_ss: u8,
    pub coll_sp: u8,
    pub sprite_enable: u8,
    pub sprites: [Sprite; SPRITES],
    /// Beam line.
    pub line: u16,
    /// Beam tick within the line.
    pub tick: u16,
    /// Completed frames.
    pub frame: u64,
    /// Bitmap byte being shifted out.
    bitmap_byte: u8,
    frame_complete: bool,
}

/// CGIA video chip.
pub struct Cgia {
    state: CgiaState,
    framebuffer: Vec<u32>,
}

impl Cgia {
    #[must_use]
    pub fn new(_config: CgiaConfig) -> Self {
        Self {
            state: CgiaState::default(),
            framebuffer: vec![PALETTE[0]; (FB_WIDTH * FB_HEIGHT) as usize],
        }
    }

    /// Power-on registers and beam. The framebuffer keeps its last image.
    pub fn reset(&mut self) {
        self.state = CgiaState::default();
    }

    #[must_use]
    pub fn state(&self) -> &CgiaState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CgiaState {
        &mut self.state
    }

    pub fn restore(&mut self, state: &CgiaState) {
        self.state = state.clone();
    }

    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        FB_WIDTH
    }

    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        FB_HEIGHT
    }

    /// True once per completed frame; reading clears it.
    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.state.frame_complete)
    }

    /// True while an enabled interrupt is pending.
    #[must_use]
    pub fn int_active(&self) -> bool {
        self.state.int_status & self.state.int_enable != 0
    }

    /// Advance the beam one tick, servicing a register access if selected.
    pub fn tick<B: DmaBus + ?Sized>(&mut self, mut pins: Pins, dma: &B) -> Pins {
        let (line, x) = (self.state.line, self.state.tick);

        if x == 0 {
            if line == self.state.int_raster {
                self.state.int_status |= INT_RASTER;
            }
            if line == VBLANK_LINE {
                self.state.int_status |= INT_VBLANK;
            }
        }

        if line < FB_HEIGHT as u16 && x < FB_WIDTH as u16 {
            self.draw_pixel(line, x, dma);
        } else if (SPRITE_FETCH..SPRITE_FETCH + SPRITES as u16).contains(&x) {
            self.fetch_sprite_row(usize::from(x - SPRITE_FETCH), dma);
        }

        if pins.any(Pins::CS_CGIA) {
            let reg = pins.addr16() as u8;
            if pins.is_read() {
                pins = pins.with_data(self.read(reg));
            } else {
                self.write(reg, pins.data());
            }
        }

        self.advance_beam();
        pins.with(Pins::CGIA_INT, self.int_active())
    }

    fn advance_beam(&mut self) {
        let s = &mut self.state;
        s.tick += 1;
        if s.tick < TICKS_PER_LINE {
            return;
        }
        s.tick = 0;
        s.line += 1;
        if s.line == LINES_PER_FRAME {
            s.line = 0;
            s.frame += 1;
            s.frame_complete = true;
        }
    }

    fn dma_addr(&self, offset: u16) -> u32 {
        (u32::from(self.state.dma_bank) << 16) | u32::from(offset)
    }

    fn draw_pixel<B: DmaBus + ?Sized>(&mut self, line: u16, x: u16, dma: &B) {
        let index = usize::from(line) * FB_WIDTH as usize + usize::from(x);
        let s = &self.state;
        if s.mode & MODE_DISPLAY == 0 {
            self.framebuffer[index] = PALETTE[usize::from(s.border_color)];
            return;
        }

        if x % 8 == 0 {
            self.state.bitmap_byte = if s.mode & MODE_BITMAP != 0 {
                let offset = s.bitmap_addr.wrapping_add(line * BYTES_PER_LINE + x / 8);
                dma.fetch_byte(self.dma_addr(offset))
            } else {
                0
            };
        }

        let s = &mut self.state;
        let bitmap = s.bitmap_byte & (0x80 >> (x % 8)) != 0;
        let hits = (0..SPRITES)
            .filter(|&n| s.sprite_enable & (1 << n) != 0 && s.sprites[n].pixel(x))
            .fold(0u8, |acc, n| acc | (1 << n));

        if hits.count_ones() >= 2 {
            s.coll_ss |= hits;
        }
        if bitmap {
            s.coll_sp |= hits;
        }

        let color = if hits != 0 {
            s.sprites[hits.trailing_zeros() as usize].color
        } else if bitmap {
            s.fg_color
        } else {
            s.bg_color
        };
        self.framebuffer[index] = PALETTE[usize::from(color)];
    }

    /// Latch sprite `n`'s row for the next line, or blank it if the sprite
    /// is disabled or not on that line.
    fn fetch_sprite_row<B: DmaBus + ?Sized>(&mut self, n: usize, dma: &B) {
        let next = (self.state.line + 1) % LINES_PER_FRAME;
        let sprite = self.state.sprites[n];
        let row = if self.state.sprite_enable & (1 << n) != 0 && sprite.covers_line(next) {
            let offset = sprite.data_addr.wrapping_add(next - sprite.y);
            dma.fetch_byte(self.dma_addr(offset))
        } else {
            0
        };
        self.state.sprites[n].row = row;
    }

    fn status(&self) -> u8 {
        let any = if self.int_active() { 0x80 } else { 0 };
        self.state.int_status | any
    }

    /// Register read. The collision registers clear when read.
    pub fn read(&mut self, reg: u8) -> u8 {
        let s = &mut self.state;
        match reg & 0x3F {
            0x00 => s.mode | 0xFC,
            0x01 => s.bg_color,
            0x02 => s.fg_color,
            0x03 => s.border_color,
            0x04 => s.dma_bank,
            0x06 => s.bitmap_addr as u8,
            0x07 => (s.bitmap_addr >> 8) as u8,
            0x08 => s.line as u8,
            0x09 => (s.line >> 8) as u8,
            0x0A => s.int_raster as u8,
            0x0B => (s.int_raster >> 8) as u8 | 0xFE,
            0x0C => s.int_enable | 0xFC,
            0x0D => self.status(),
            0x0E => std::mem::take(&mut s.coll_ss),
            0x0F => std::mem::take(&mut s.coll_sp),
            0x10 => s.sprite_enable | 0xF0,
            r @ 0x20..=0x3F => s.sprites[usize::from((r - 0x20) >> 3)].read(r & 7),
            _ => 0xFF,
        }
    }

    /// Register write. Read-only registers ignore it.
    pub fn write(&mut self, reg: u8, value: u8) {
        let s = &mut self.state;
        match reg & 0x3F {
            0x00 => s.mode = value & (MODE_DISPLAY | MODE_BITMAP),
            0x01 => s.bg_color = value,
            0x02 => s.fg_color = value,
            0x03 => s.border_color = value,
            0x04 => s.dma_bank = value,
            0x06 => s.bitmap_addr = (s.bitmap_addr & 0xFF00) | u16::from(value),
            0x07 => s.bitmap_addr = (s.bitmap_addr & 0x00FF) | (u16::from(value) << 8),
            0x0A => s.int_raster = (s.int_raster & 0x100) | u16::from(value),
            0x0B => s.int_raster = (s.int_raster & 0xFF) | (u16::from(value & 1) << 8),
            0x0C => s.int_enable = value & (INT_RASTER | INT_VBLANK),
            0x0D => s.int_status &= !value,
            0x10 => s.sprite_enable = value & 0x0F,
            r @ 0x20..=0x3F => s.sprites[usize::from((r - 0x20) >> 3)].write(r & 7, value),
            _ => {}
        }
    }
}

impl Default for Cgia {
    fn default() -> Self {
        Self::new(CgiaConfig::default())
    }
}

impl Observable for Cgia {
    fn query(&self, path: &str) -> Option<Value> {
        let s = &self.state;
        match path {
            "mode" => return Some(s.mode.into()),
            "bg_color" => return Some(s.bg_color.into()),
            "fg_color" => return Some(s.fg_color.into()),
            "border_color" => return Some(s.border_color.into()),
            "dma_bank" => return Some(s.dma_bank.into()),
            "bitmap_addr" => return Some(s.bitmap_addr.into()),
            "raster" => return Some(s.line.into()),
            "tick" => return Some(s.tick.into()),
            "frame" => return Some(s.frame.into()),
            "int_raster" => return Some(s.int_raster.into()),
            "int_enable" => return Some(s.int_enable.into()),
            "int_status" => return Some(self.status().into()),
            "coll_ss" => return Some(s.coll_ss.into()),
            "coll_sp" => return Some(s.coll_sp.into()),
            "sprite_enable" => return Some(s.sprite_enable.into()),
            _ => {}
        }
        let (n, field) = path.strip_prefix("sprite.")?.split_once('.')?;
        let sprite = s.sprites.get(n.parse::<usize>().ok()?)?;
        match field {
            "x" => Some(sprite.x.into()),
            "y" => Some(sprite.y.into()),
            "height" => Some(sprite.height.into()),
            "color" => Some(sprite.color.into()),
            "data_addr" => Some(sprite.data_addr.into()),
            _ => None,
        }
    }

    /// Sprite fields are queried as `sprite.<n>.<field>`.
    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "mode",
            "bg_color",
            "fg_color",
            "border_color",
            "dma_bank",
            "bitmap_addr",
            "raster",
            "tick",
            "frame",
            "int_raster",
            "int_enable",
            "int_status",
            "coll_ss",
            "coll_sp",
            "sprite_enable",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_masks() {
        let mut cgia = Cgia::default();
        cgia.write(0x00, 0x00);
        assert_eq!(cgia.read(0x00), 0xFC);
        cgia.write(0x0B, 0xFF);
        assert_eq!(cgia.read(0x0B), 0xFF);
        cgia.write(0x0B, 0x00);
        assert_eq!(cgia.read(0x0B), 0xFE);
        cgia.write(0x0C, 0x00);
        assert_eq!(cgia.read(0x0C), 0xFC);
        cgia.write(0x10, 0x01);
        assert_eq!(cgia.read(0x10), 0xF1);
        assert_eq!(cgia.read(0x05), 0xFF);
        assert_eq!(cgia.read(0x1F), 0xFF);
    }

    #[test]
    fn raster_register_is_read_only() {
        let mut cgia = Cgia::default();
        cgia.state_mut().line = 0x105;
        cgia.write(0x08, 0x00);
        cgia.write(0x09, 0x00);
        assert_eq!((cgia.read(0x08), cgia.read(0x09)), (0x05, 0x01));
    }

    #[test]
    fn collisions_clear_on_read() {
        let mut cgia = Cgia::default();
        cgia.state_mut().coll_ss = 0x03;
        cgia.state_mut().coll_sp = 0x04;
        cgia.write(0x0E, 0x00);
        assert_eq!(cgia.read(0x0E), 0x03);
        assert_eq!(cgia.read(0x0E), 0x00);
        assert_eq!(cgia.read(0x0F), 0x04);
        assert_eq!(cgia.read(0x0F), 0x00);
    }

    #[test]
    fn query_does_not_clear_collisions() {
        let mut cgia = Cgia::default();
        cgia.state_mut().coll_ss = 0x03;
        assert_eq!(cgia.query("coll_ss"), Some(Value::U8(0x03)));
        assert_eq!(cgia.read(0x0E), 0x03);
    }

    #[test]
    fn status_reports_enabled_pending() {
        let mut cgia = Cgia::default();
        cgia.state_mut().int_status = INT_VBLANK;
        assert_eq!(cgia.read(0x0D), 0x02);
        cgia.write(0x0C, INT_VBLANK);
        assert_eq!(cgia.read(0x0D), 0x82);
        cgia.write(0x0D, INT_VBLANK);
        assert_eq!(cgia.read(0x0D), 0x00);
    }

    #[test]
    fn sprite_registers_are_windowed() {
        let mut cgia = Cgia::default();
        cgia.write(0x3D, 0x77);
        assert_eq!(cgia.state().sprites[3].color, 0x77);
        assert_eq!(cgia.query("sprite.3.color"), Some(Value::U8(0x77)));
        assert_eq!(cgia.query("sprite.4.color"), None);
    }
}
