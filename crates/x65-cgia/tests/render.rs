//! Beam, DMA and interrupt behaviour over whole lines and frames.

use emu_core::Pins;
use x65_cgia::{
    Cgia, FB_WIDTH, INT_RASTER, INT_VBLANK, MODE_BITMAP, MODE_DISPLAY, PALETTE, TICKS_PER_FRAME,
    TICKS_PER_LINE,
};

struct Rig {
    cgia: Cgia,
    ram: Vec<u8>,
}

impl Rig {
    fn new() -> Self {
        Self { cgia: Cgia::default(), ram: vec![0; 0x2_0000] }
    }

    fn write(&mut self, reg: u8, value: u8) {
        let pins = Pins::new()
            .with_address(0xFF00 | u32::from(reg))
            .set(Pins::CS_CGIA | Pins::VDA)
            .with_data(value);
        self.cgia.tick(pins, &self.ram[..]);
    }

    fn read(&mut self, reg: u8) -> u8 {
        let pins = Pins::new()
            .with_address(0xFF00 | u32::from(reg))
            .set(Pins::CS_CGIA | Pins::RW | Pins::VDA);
        self.cgia.tick(pins, &self.ram[..]).data()
    }

    /// Tick until the beam is back at the start of line 0.
    fn to_frame_start(&mut self) {
        while self.cgia.state().line != 0 || self.cgia.state().tick != 0 {
            self.cgia.tick(Pins::new(), &self.ram[..]);
        }
    }

    fn run(&mut self, ticks: u64) -> Pins {
        let mut pins = Pins::new();
        for _ in 0..ticks {
            pins = self.cgia.tick(Pins::new(), &self.ram[..]);
        }
        pins
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        self.cgia.framebuffer()[(y * FB_WIDTH + x) as usize]
    }
}

#[test]
fn bitmap_pixels_come_from_dma() {
    let mut rig = Rig::new();
    rig.ram[0x1_1000] = 0b1000_0001;
    rig.ram[0x1_1000 + 48] = 0b0100_0000;
    rig.write(0x04, 0x01);
    rig.write(0x06, 0x00);
    rig.write(0x07, 0x10);
    rig.write(0x01, 0x00);
    rig.write(0x02, 0xE0);
    rig.write(0x00, MODE_DISPLAY | MODE_BITMAP);
    rig.to_frame_start();
    rig.run(u64::from(TICKS_PER_LINE) * 2);

    let (fg, bg) = (PALETTE[0xE0], PALETTE[0x00]);
    assert_eq!(rig.pixel(0, 0), fg);
    assert_eq!(rig.pixel(1, 0), bg);
    assert_eq!(rig.pixel(7, 0), fg);
    assert_eq!(rig.pixel(8, 0), bg);
    assert_eq!(rig.pixel(0, 1), bg);
    assert_eq!(rig.pixel(1, 1), fg);
}

#[test]
fn disabled_display_shows_border() {
    let mut rig = Rig::new();
    rig.write(0x03, 0x1C);
    rig.write(0x00, 0x00);
    rig.to_frame_start();
    rig.run(TICKS_PER_FRAME);
    assert_eq!(rig.pixel(0, 0), PALETTE[0x1C]);
    assert_eq!(rig.pixel(383, 239), PALETTE[0x1C]);
}

#[test]
fn sprites_draw_with_priority_and_collide() {
    let mut rig = Rig::new();
    rig.ram[0x2000] = 0xFF;
    rig.ram[0x2100] = 0xFF;
    // Bitmap pixel 7 of line 1.
    rig.ram[48] = 0x01;

    // Sprite 0: x 0, y 1, one line, colour $E0, data $2000.
    for (reg, value) in [(0x20, 0), (0x22, 1), (0x24, 1), (0x25, 0xE0), (0x26, 0x00), (0x27, 0x20)] {
        rig.write(reg, value);
    }
    // Sprite 1: x 4, y 1, one line, colour $03, data $2100.
    for (reg, value) in [(0x28, 4), (0x2A, 1), (0x2C, 1), (0x2D, 0x03), (0x2E, 0x00), (0x2F, 0x21)] {
        rig.write(reg, value);
    }
    rig.write(0x10, 0x03);
    rig.write(0x02, 0xFF);
    rig.write(0x00, MODE_DISPLAY | MODE_BITMAP);
    rig.to_frame_start();
    rig.run(u64::from(TICKS_PER_LINE) * 2);

    assert_eq!(rig.pixel(0, 0), PALETTE[0x00]);
    assert_eq!(rig.pixel(0, 1), PALETTE[0xE0]);
    assert_eq!(rig.pixel(5, 1), PALETTE[0xE0]);
    assert_eq!(rig.pixel(9, 1), PALETTE[0x03]);
    assert_eq!(rig.pixel(12, 1), PALETTE[0x00]);
    assert_eq!(rig.pixel(0, 2), PALETTE[0x00]);

    assert_eq!(rig.read(0x0E), 0x03);
    assert_eq!(rig.read(0x0F), 0x03);
    assert_eq!(rig.read(0x0E), 0x00);
}

#[test]
fn raster_interrupt_starts_on_the_compare_line() {
    let mut rig = Rig::new();
    rig.write(0x0A, 10);
    rig.to_frame_start();
    // Two register ticks: acknowledge what the last frame raised, then enable.
    rig.write(0x0D, 0xFF);
    rig.write(0x0C, INT_RASTER);

    assert!(!rig.run(u64::from(TICKS_PER_LINE) * 10 - 2).any(Pins::CGIA_INT));
    assert!(rig.run(1).any(Pins::CGIA_INT));
    assert_eq!(rig.read(0x0D), 0x80 | INT_RASTER);

    rig.write(0x0D, INT_RASTER);
    assert!(!rig.run(1).any(Pins::CGIA_INT));
}

#[test]
fn vblank_interrupt_at_line_240() {
    let mut rig = Rig::new();
    rig.run(1);
    rig.to_frame_start();
    rig.write(0x0D, 0xFF);
    rig.write(0x0C, INT_VBLANK);

    assert!(!rig.run(u64::from(TICKS_PER_LINE) * 240 - 2).any(Pins::CGIA_INT));
    assert!(rig.run(1).any(Pins::CGIA_INT));
    assert_eq!(rig.read(0x08), 240);
}

#[test]
fn frames_complete_every_262_lines() {
    let mut rig = Rig::new();
    rig.run(1);
    rig.to_frame_start();
    assert!(rig.cgia.take_frame_complete());
    let frame = rig.cgia.state().frame;

    rig.run(TICKS_PER_FRAME - 1);
    assert!(!rig.cgia.take_frame_complete());
    rig.run(1);
    assert!(rig.cgia.take_frame_complete());
    assert!(!rig.cgia.take_frame_complete());
    assert_eq!(rig.cgia.state().frame, frame + 1);
}
