#![allow(dead_code)]

use colleen_core::device::antic::{DISPLAY_WIDTH, ScanlineHandoff};
use colleen_core::device::gtia::Gtia;
use colleen_core::display::FrameSink;

/// Drive one merger scanline, applying `(cycle, offset, value)` register
/// writes as the beam passes, and return the finished output line.
pub fn merge_line(
    gtia: &mut Gtia,
    playfield: &[u8; DISPLAY_WIDTH],
    fiddling: bool,
    ypos: u16,
    player_dma: [u8; 5],
    writes: &[(usize, u8, u8)],
) -> Vec<u8> {
    let handoff = ScanlineHandoff {
        playfield: &playfield[..],
        player_dma,
        fiddling,
        ypos,
    };
    gtia.begin_scanline(&handoff);
    for cycle in 0..114 {
        gtia.advance_to(cycle);
        for &(c, offset, value) in writes {
            if c == cycle {
                gtia.write(offset, value);
            }
        }
    }
    let mut sink = FrameSink::new(DISPLAY_WIDTH, 312);
    gtia.finish_scanline(&mut sink);
    sink.line(usize::from(ypos)).to_vec()
}

/// A playfield window filled with one colour index.
pub fn flat_playfield(index: u8) -> [u8; DISPLAY_WIDTH] {
    [index; DISPLAY_WIDTH]
}
