//! Fixed 256-colour palette, 3-3-2 RGB.

const fn scale(value: u32, max: u32) -> u32 {
    value * 255 / max
}

const fn build() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let r = scale((i as u32 >> 5) & 7, 7);
        let g = scale((i as u32 >> 2) & 7, 7);
        let b = scale(i as u32 & 3, 3);
        table[i] = 0xFF00_0000 | (r << 16) | (g << 8) | b;
        i += 1;
    }
    table
}

/// ARGB32 colour for each palette index.
pub static PALETTE: [u32; 256] = build();
