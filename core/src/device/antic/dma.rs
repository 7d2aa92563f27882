//! DMA slot allocation for the display-list controller.
//!
//! All video DMA lands on fixed cycle slots within the 114-cycle line:
//! missile graphics on cycle 0, the display-list opcode on cycle 1, player
//! graphics on cycles 2-5, display-list operands on 6-7, memory refresh
//! every fourth cycle from 25, and the playfield on one of three per-width
//! schedules. Horizontal scrolling fetches with the next wider schedule.

use crate::core::timing::CycleArbiter;

use super::PlayfieldWidth;

/// A contiguous run of DMA cycles.
#[derive(Clone, Copy, Debug)]
pub struct DmaSlot {
    pub first: usize,
    pub count: usize,
}

/// Missile graphics fetch.
pub const MISSILE_FETCH: DmaSlot = DmaSlot { first: 0, count: 1 };
/// Display-list opcode fetch.
pub const DLIST_FETCH: DmaSlot = DmaSlot { first: 1, count: 1 };
/// Player graphics fetches.
pub const PLAYER_FETCH: DmaSlot = DmaSlot { first: 2, count: 4 };
/// Display-list operand fetches (jump target / memory scan pointer).
pub const DLIST_OPERAND_FETCH: DmaSlot = DmaSlot { first: 6, count: 2 };

/// First memory-refresh slot; nine refreshes follow every four cycles.
pub const REFRESH_FIRST: usize = 25;
pub const REFRESH_STRIDE: usize = 4;
pub const REFRESH_COUNT: usize = 9;

/// Playfield fetch schedule of one width/density combination.
///
/// `first_cycle` carries the name fetches at `stride` cycle intervals;
/// character modes fetch the glyph half a stride later. `start_hcc` is
/// where byte 0 of the fetched data lands in display coordinates.
#[derive(Clone, Copy, Debug)]
pub struct DmaGenerator {
    pub bytes: usize,
    pub first_cycle: usize,
    pub stride: usize,
    pub start_hcc: i32,
    pub width_hcc: usize,
}

impl DmaGenerator {
    /// Half-colour-clocks of display each fetched byte produces.
    pub fn hcc_per_byte(&self) -> usize {
        self.width_hcc / self.bytes
    }

    /// Reserve the name fetch slots.
    pub fn reserve_playfield(&self, arbiter: &mut CycleArbiter) {
        arbiter.reserve_stride(self.first_cycle, self.stride, self.bytes);
    }

    /// Reserve the glyph fetch slots of a character mode, interleaved
    /// half a stride after the name fetches.
    pub fn reserve_character(&self, arbiter: &mut CycleArbiter) {
        arbiter.reserve_stride(self.first_cycle + self.stride / 2, self.stride, self.bytes);
    }
}

/// Fetch schedule for a playfield width and mode density. `shift`
/// converts the width to the byte count (narrow/normal/wide fetch
/// `4/5/6 << shift` bytes). Returns `None` with playfield DMA off.
pub fn generator(width: PlayfieldWidth, shift: u8) -> Option<DmaGenerator> {
    let units = match width {
        PlayfieldWidth::None => return None,
        PlayfieldWidth::Narrow => 4usize,
        PlayfieldWidth::Normal => 5,
        PlayfieldWidth::Wide => 6,
    };
    let bytes = units << shift;
    let width_hcc = units << 6;
    let stride = 16 >> shift;
    // Fetch windows are centred on the display; at full density they run
    // 30-92 (narrow), 22-100 (normal) and 14-108 (wide).
    let first_cycle = match width {
        PlayfieldWidth::Narrow => 30,
        PlayfieldWidth::Normal => 22,
        PlayfieldWidth::Wide => 14,
        PlayfieldWidth::None => unreachable!(),
    };
    Some(DmaGenerator {
        bytes,
        first_cycle,
        stride,
        start_hcc: ((super::DISPLAY_WIDTH - width_hcc) / 2) as i32,
        width_hcc,
    })
}

/// Schedule used when the opcode enables horizontal scrolling: the next
/// wider playfield, displaced so the scroll register sweeps the data one
/// half-colour-clock at a time.
pub fn scrolled_generator(width: PlayfieldWidth, shift: u8) -> Option<DmaGenerator> {
    let wider = match width {
        PlayfieldWidth::None => PlayfieldWidth::None,
        PlayfieldWidth::Narrow => PlayfieldWidth::Normal,
        PlayfieldWidth::Normal | PlayfieldWidth::Wide => PlayfieldWidth::Wide,
    };
    generator(wider, shift)
}

/// Player/missile DMA address generator. Two variants: single-line
/// resolution fetches a fresh byte per scanline, double-line every other.
#[derive(Clone, Copy, Debug)]
pub struct PmDmaGenerator {
    pub missile_base: u16,
    pub player_base: [u16; 4],
    /// Displacement applied to the Y position: 0 or 1.
    pub ypos_shift: u8,
}

impl PmDmaGenerator {
    /// Single-line resolution: a 2 KiB block, one byte per object per line.
    pub fn single_line(pmbase: u8) -> Self {
        let base = u16::from(pmbase & 0xF8) << 8;
        Self {
            missile_base: base + 0x300,
            player_base: [base + 0x400, base + 0x500, base + 0x600, base + 0x700],
            ypos_shift: 0,
        }
    }

    /// Double-line resolution: a 1 KiB block, one byte per object pair of
    /// lines.
    pub fn double_line(pmbase: u8) -> Self {
        let base = u16::from(pmbase & 0xFC) << 8;
        Self {
            missile_base: base + 0x180,
            player_base: [base + 0x200, base + 0x280, base + 0x300, base + 0x380],
            ypos_shift: 1,
        }
    }

    pub fn missile_addr(&self, ypos: u16) -> u16 {
        self.missile_base.wrapping_add(ypos >> self.ypos_shift)
    }

    pub fn player_addr(&self, player: usize, ypos: u16) -> u16 {
        self.player_base[player].wrapping_add(ypos >> self.ypos_shift)
    }
}
