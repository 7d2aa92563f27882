//! Display-generator matrix.
//!
//! One of eleven post-processing variants is active per scanline, selected
//! from the priority-control register bits 6..7, the fiddling flag of the
//! current mode line and the chip generation. The merger dispatches on the
//! enum per clock; the lookup tables below are the variants' fixed data.

use super::pcc;

/// Intermediate lookup step of the processed modes: one 16-entry table per
/// half-colour-clock of a CPU cycle, mapping the pre-computed colour index
/// to a partial nibble. The four outputs are ORed into the mode's input
/// value.
pub type IntermediateLut = [[u8; 16]; 4];

/// The eleven post-processing variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Mode00Unfiddled,
    Mode00Fiddled,
    Mode00Artefacted,
    Mode40Unfiddled,
    Mode40Fiddled,
    Mode80Unfiddled,
    Mode80Fiddled,
    ModeC0Unfiddled,
    ModeC0Fiddled,
    StrangeUnfiddled,
    StrangeFiddled,
}

// Collision bits generated for player-playfield collisions indexed by the
// playfield colour index, unfiddled colours.
pub static COLLISION_UNFIDDLED: [u8; 16] = [
    0x00, 0x00, 0x00, 0x00, // these slots are used up by player collisions
    0x01, 0x02, 0x04, 0x08, // collisions with playfields 0,1,2,3
    0x00, 0x02, 0x02, 0x02, // collisions with background, and fiddled colour
    0x00, 0x00, 0x00, 0x00,
];

// The same with fiddled access. Only hits on playfield one are detected,
// and they are reported as collisions with playfield two.
pub static COLLISION_FIDDLED: [u8; 16] = [
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x04, 0x00, 0x00,
    0x00, 0x04, 0x04, 0x04,
    0x00, 0x00, 0x00, 0x00,
];

pub static COLLISION_NONE: [u8; 16] = [0; 16];

// Table entries for the first and second half-colour-clock are identical
// since both pixels always agree on unfiddled modes.
pub static LUT_UNFIDDLED: IntermediateLut = [
    [
        0x00, 0x00, 0x00, 0x00, // these slots are used up by players
        0x00, 0x04, 0x08, 0x0C, // PF 0,1,2,3
        0x00, 0x04, 0x04, 0x04, // BK, fiddled, artifact, artifact
        0x00, 0x00, 0x00, 0x00, // player combined colours and background
    ],
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x04, 0x08, 0x0C,
        0x00, 0x04, 0x04, 0x04,
        0x00, 0x00, 0x00, 0x00,
    ],
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x01, 0x02, 0x03,
        0x00, 0x01, 0x01, 0x01,
        0x00, 0x00, 0x00, 0x00,
    ],
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x01, 0x02, 0x03,
        0x00, 0x01, 0x01, 0x01,
        0x00, 0x00, 0x00, 0x00,
    ],
];

// Tables for all four half-colour-clocks of a CPU cycle in fiddled modes:
// each half-colour-clock contributes one bit of the nibble.
pub static LUT_FIDDLED: IntermediateLut = [
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x08, 0x00, 0x00,
        0x00, 0x08, 0x08, 0x08,
        0x00, 0x00, 0x00, 0x00,
    ],
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x04, 0x00, 0x00,
        0x00, 0x04, 0x04, 0x04,
        0x00, 0x00, 0x00, 0x00,
    ],
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x02, 0x00, 0x00,
        0x00, 0x02, 0x02, 0x02,
        0x00, 0x00, 0x00, 0x00,
    ],
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x01, 0x00, 0x00,
        0x00, 0x01, 0x01, 0x01,
        0x00, 0x00, 0x00, 0x00,
    ],
];

// Unfiddled table of the 0x80 mode. The 0x10 entries mark an all-background
// upper pair, which resolves differently: PF1 followed by background maps
// to background, not to PF0.
pub static LUT_80_UNFIDDLED: IntermediateLut = [
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x04, 0x08, 0x0C,
        0x00, 0x04, 0x04, 0x04,
        0x00, 0x00, 0x00, 0x00,
    ],
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x04, 0x08, 0x0C,
        0x00, 0x04, 0x04, 0x04,
        0x00, 0x00, 0x00, 0x00,
    ],
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x01, 0x02, 0x03,
        0x10, 0x01, 0x01, 0x01,
        0x00, 0x00, 0x00, 0x10,
    ],
    [
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x01, 0x02, 0x03,
        0x10, 0x01, 0x01, 0x01,
        0x00, 0x00, 0x00, 0x10,
    ],
];

// Translates 0x80-mode nibble indices into pre-computed colour indices.
// The upper sixteen entries apply when the upper pair of half-colour-clocks
// was background: the combination PF1,BG resolves to BG, not PF0.
pub static XLATE_80: [u8; 32] = [
    pcc::PLAYER_0, pcc::PLAYER_1, pcc::PLAYER_2, pcc::PLAYER_3,
    pcc::PLAYFIELD_0, pcc::PLAYFIELD_1, pcc::PLAYFIELD_2, pcc::PLAYFIELD_3,
    pcc::BACKGROUND, pcc::BACKGROUND, pcc::BACKGROUND, pcc::BACKGROUND,
    pcc::PLAYFIELD_0, pcc::PLAYFIELD_1, pcc::PLAYFIELD_2, pcc::PLAYFIELD_3,
    pcc::PLAYER_0, pcc::PLAYER_1, pcc::PLAYER_2, pcc::PLAYER_3,
    pcc::BACKGROUND, pcc::BACKGROUND, pcc::BACKGROUND, pcc::BACKGROUND,
    pcc::BACKGROUND, pcc::BACKGROUND, pcc::BACKGROUND, pcc::BACKGROUND,
    pcc::BACKGROUND, pcc::BACKGROUND, pcc::BACKGROUND, pcc::BACKGROUND,
];

// Additional overlay bits generated by the playfield in the 0x80 mode,
// where the playfield itself can use player colours and priorities.
pub static PLAYER_MASK_80: [u8; 16] = [
    0x01, 0x02, 0x04, 0x08,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
];

// Strange-mode remapping: once a processed mode has been switched off
// mid-line, the playfield nibble pairs address PF0..PF3 directly and the
// background keeps only the background/frame distinction.
pub static STRANGE_NIBBLE_MAP: [u8; 4] = [
    pcc::PLAYFIELD_0,
    pcc::PLAYFIELD_1,
    pcc::PLAYFIELD_2,
    pcc::PLAYFIELD_3,
];
