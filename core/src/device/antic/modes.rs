//! Mode-line generators.
//!
//! Sixteen playfield decoders, one per display-list opcode nibble. Each
//! consumes the scanbuffer bytes fetched for the line and emits one
//! pre-computed colour index per half-colour-clock. Character modes
//! additionally fetch glyph data through the active character generator.

use crate::core::bus::AdrSpace;
use crate::device::gtia::pcc;

/// Static properties of one mode-line kind.
#[derive(Clone, Copy, Debug)]
pub struct ModeLine {
    /// Scan lines per mode line.
    pub scan_lines: u8,
    /// Left-shift converting the width units to the byte count;
    /// 0 = no playfield DMA (blank).
    pub shift: u8,
    /// Character mode: glyph DMA per scan line.
    pub char_mode: bool,
    /// Hires mode producing half-colour-clock pixels and colour fiddling.
    pub fiddling: bool,
}

const fn mode(scan_lines: u8, shift: u8, char_mode: bool, fiddling: bool) -> ModeLine {
    ModeLine { scan_lines, shift, char_mode, fiddling }
}

/// Mode table indexed by the opcode low nibble. Entries 0 and 1 (blank
/// lines and jumps) never reach the generator.
pub const MODE_LINES: [ModeLine; 16] = [
    mode(1, 0, false, false),  // 0: blank
    mode(1, 0, false, false),  // 1: jump
    mode(8, 3, true, true),    // 2: 40-char hires text
    mode(10, 3, true, true),   // 3: 40-char text with descenders
    mode(8, 3, true, false),   // 4: 40-char five-colour text
    mode(16, 3, true, false),  // 5: ditto, double height
    mode(8, 2, true, false),   // 6: 20-char coloured text
    mode(16, 2, true, false),  // 7: ditto, double height
    mode(8, 1, false, false),  // 8: 40x24 four-colour bitmap
    mode(4, 1, false, false),  // 9: 80x48 two-colour bitmap
    mode(4, 2, false, false),  // A: 80x48 four-colour bitmap
    mode(2, 2, false, false),  // B: 160x96 two-colour bitmap
    mode(1, 2, false, false),  // C: 160x192 two-colour bitmap
    mode(2, 3, false, false),  // D: 160x96 four-colour bitmap
    mode(1, 3, false, false),  // E: 160x192 four-colour bitmap
    mode(1, 3, false, true),   // F: 320x192 hires bitmap
];

/// Character generator wiring. Two variants exist because the 40-char
/// modes ignore more character-base bits than the 20-char modes.
#[derive(Clone, Copy, Debug, Default)]
pub struct CharacterGenerator {
    pub base: u16,
    /// 7 to display characters upside down, 0 otherwise.
    pub upside_down: u8,
    /// Codes matching this mask display inverted.
    pub invert_mask: u8,
    /// Codes matching this mask display blank.
    pub blank_mask: u8,
}

// Four-colour pixel decode common to the multi-colour modes.
const BITPAIR_COLORS: [u8; 4] = [
    pcc::BACKGROUND,
    pcc::PLAYFIELD_0,
    pcc::PLAYFIELD_1,
    pcc::PLAYFIELD_2,
];

/// Decode one scan line of one mode into pre-computed colour indices.
///
/// `scan` holds the fetched playfield bytes, `out` receives
/// `bytes * hcc_per_byte` half-colour-clocks. Character modes read glyph
/// data from `ram` through `chargen`.
pub fn generate_mode_line(
    mode: u8,
    scan: &[u8],
    ram: &dyn AdrSpace,
    chargen: &CharacterGenerator,
    subline: u8,
    out: &mut [u8],
) {
    match mode {
        2 | 3 => {
            // Hires text: glyph bit set selects the fiddled PF1 slot over
            // a PF2 backdrop.
            for (i, &code) in scan.iter().enumerate() {
                let glyph = hires_glyph(mode, code, ram, chargen, subline);
                let cell = &mut out[i * 8..i * 8 + 8];
                for (bit, slot) in cell.iter_mut().enumerate() {
                    *slot = if glyph & (0x80 >> bit) != 0 {
                        pcc::PLAYFIELD_1_FIDDLED
                    } else {
                        pcc::PLAYFIELD_2
                    };
                }
            }
        }
        4 | 5 => {
            // Five-colour text: bit pairs select the playfield, with the
            // character code's top bit flipping the 11 pair to PF3.
            let row = glyph_row(mode, subline, chargen);
            for (i, &code) in scan.iter().enumerate() {
                let glyph = ram.read(
                    chargen
                        .base
                        .wrapping_add(u16::from(code & 0x7F) * 8 + u16::from(row)),
                );
                let cell = &mut out[i * 8..i * 8 + 8];
                for pair in 0..4 {
                    let bits = (glyph >> (6 - pair * 2)) & 0x03;
                    let color = if bits == 3 && code & 0x80 != 0 {
                        pcc::PLAYFIELD_3
                    } else {
                        BITPAIR_COLORS[usize::from(bits)]
                    };
                    cell[pair * 2] = color;
                    cell[pair * 2 + 1] = color;
                }
            }
        }
        6 | 7 => {
            // 20-char text: one colour per character from the code's top
            // two bits.
            let row = glyph_row(mode, subline, chargen);
            for (i, &code) in scan.iter().enumerate() {
                let glyph = ram.read(
                    chargen
                        .base
                        .wrapping_add(u16::from(code & 0x3F) * 8 + u16::from(row)),
                );
                let color = pcc::PLAYFIELD_0 + (code >> 6);
                let cell = &mut out[i * 16..i * 16 + 16];
                for bit in 0..8 {
                    let slot = if glyph & (0x80 >> bit) != 0 {
                        color
                    } else {
                        pcc::BACKGROUND
                    };
                    cell[bit * 2] = slot;
                    cell[bit * 2 + 1] = slot;
                }
            }
        }
        8 | 0xA => bitmap_pairs(scan, out, if mode == 8 { 8 } else { 4 }),
        9 => bitmap_bits(scan, out, 4, pcc::PLAYFIELD_0),
        0xB | 0xC => bitmap_bits(scan, out, 2, pcc::PLAYFIELD_0),
        0xD | 0xE => bitmap_pairs(scan, out, 2),
        0xF => {
            // Hires bitmap, fiddled like the hires text modes.
            for (i, &byte) in scan.iter().enumerate() {
                let cell = &mut out[i * 8..i * 8 + 8];
                for (bit, slot) in cell.iter_mut().enumerate() {
                    *slot = if byte & (0x80 >> bit) != 0 {
                        pcc::PLAYFIELD_1_FIDDLED
                    } else {
                        pcc::PLAYFIELD_2
                    };
                }
            }
        }
        _ => out.fill(pcc::BACKGROUND),
    }
}

/// Glyph byte of the hires text modes, after blank/invert masking. Mode 3
/// moves the bottom rows of the lowercase quadrant into the two extra
/// scan lines.
fn hires_glyph(
    mode: u8,
    code: u8,
    ram: &dyn AdrSpace,
    chargen: &CharacterGenerator,
    subline: u8,
) -> u8 {
    let lowercase = mode == 3 && code & 0x60 == 0x60;
    let row = match (mode, subline) {
        (3, 0 | 1) if lowercase => return 0,
        (3, 8 | 9) if lowercase => subline - 8,
        (3, 8 | 9) => return 0,
        _ => subline & 7,
    } ^ chargen.upside_down;

    let mut glyph = ram.read(
        chargen
            .base
            .wrapping_add(u16::from(code & 0x7F) * 8 + u16::from(row)),
    );
    if code & chargen.blank_mask != 0 {
        glyph = 0;
    }
    if code & chargen.invert_mask != 0 {
        glyph = !glyph;
    }
    glyph
}

fn glyph_row(mode: u8, subline: u8, chargen: &CharacterGenerator) -> u8 {
    // The double-height modes show each glyph row twice.
    let row = if mode == 5 || mode == 7 {
        (subline >> 1) & 7
    } else {
        subline & 7
    };
    row ^ chargen.upside_down
}

/// Bitmap modes with two-bit pixels, `hcc` half-colour-clocks per pixel.
fn bitmap_pairs(scan: &[u8], out: &mut [u8], hcc: usize) {
    for (i, &byte) in scan.iter().enumerate() {
        let cell = &mut out[i * hcc * 4..(i + 1) * hcc * 4];
        for pair in 0..4 {
            let bits = (byte >> (6 - pair * 2)) & 0x03;
            let color = BITPAIR_COLORS[usize::from(bits)];
            cell[pair * hcc..(pair + 1) * hcc].fill(color);
        }
    }
}

/// Bitmap modes with one-bit pixels, `hcc` half-colour-clocks per pixel.
fn bitmap_bits(scan: &[u8], out: &mut [u8], hcc: usize, color: u8) {
    for (i, &byte) in scan.iter().enumerate() {
        let cell = &mut out[i * hcc * 8..(i + 1) * hcc * 8];
        for bit in 0..8 {
            let slot = if byte & (0x80 >> bit) != 0 {
                color
            } else {
                pcc::BACKGROUND
            };
            cell[bit * hcc..(bit + 1) * hcc].fill(slot);
        }
    }
}
