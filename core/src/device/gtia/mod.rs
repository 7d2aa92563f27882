//! Colour / player-missile merger ("GTIA")
//!
//! The television interface chip of the Atari 8-bit line. It receives one
//! scanline of playfield colour indices plus the player/missile DMA bytes
//! from the display-list controller, overlays the eight player/missile
//! shifters, resolves priorities, accumulates collisions, applies the
//! colour table and pushes the finished line to the video sink.
//!
//! # Write registers (offsets 0x00-0x1F, mirrored every 32 bytes)
//!
//! | Offset    | Name    | Description                                    |
//! |-----------|---------|------------------------------------------------|
//! | 0x00-0x03 | HPOSP0-3| Player horizontal position                     |
//! | 0x04-0x07 | HPOSM0-3| Missile horizontal position                    |
//! | 0x08-0x0B | SIZEP0-3| Player size (2 bits)                           |
//! | 0x0C      | SIZEM   | Missile sizes (2 bits per missile)             |
//! | 0x0D-0x10 | GRAFP0-3| Player graphics shift register                 |
//! | 0x11      | GRAFM   | Missile graphics (2 bits per missile)          |
//! | 0x12-0x15 | COLPM0-3| Player colour (hue/value)                      |
//! | 0x16-0x19 | COLPF0-3| Playfield colour (bit 0 ignored)               |
//! | 0x1A      | COLBK   | Background colour (bit 0 ignored)              |
//! | 0x1B      | PRIOR   | Priority control                               |
//! | 0x1C      | VDELAY  | Vertical delay (bits 0-3 missiles, 4-7 players)|
//! | 0x1D      | GRACTL  | P/M DMA receive enables, trigger latch         |
//! | 0x1E      | HITCLR  | Collision clear (strobe)                       |
//! | 0x1F      | CONSOL  | Console speaker, 5200 keypad select            |
//!
//! # Read registers
//!
//! | Offset    | Name    | Description                                    |
//! |-----------|---------|------------------------------------------------|
//! | 0x00-0x03 | M0PF-M3PF | Missile-playfield collisions                 |
//! | 0x04-0x07 | P0PF-P3PF | Player-playfield collisions                  |
//! | 0x08-0x0B | M0PL-M3PL | Missile-player collisions                    |
//! | 0x0C-0x0F | P0PL-P3PL | Player-player collisions                     |
//! | 0x10-0x13 | TRIG0-3 | Joystick triggers (negative logic, latchable)  |
//! | 0x14      | PAL     | Video standard flag                            |
//! | 0x1F      | CONSOL  | Console switches (negative logic)              |

pub mod generator;
pub mod object;
pub mod palette;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::device::antic::{DISPLAY_WIDTH, ScanlineHandoff, VBI_START};
use crate::device::postprocessor::{Postprocessor, PostprocessorMode};
use crate::display::{PackedRgb, VideoSink};
use crate::snapshot::Snapshot;
use self::generator::{
    COLLISION_FIDDLED, COLLISION_NONE, COLLISION_UNFIDDLED, DisplayMode, IntermediateLut,
    LUT_80_UNFIDDLED, LUT_FIDDLED, LUT_UNFIDDLED, PLAYER_MASK_80, STRANGE_NIBBLE_MAP, XLATE_80,
};
use self::object::{PM_SCANLINE_SIZE, PmObject};

/// Pre-computed colour slots: the internal colour table carries more names
/// than there are hardware registers.
pub mod pcc {
    pub const PLAYER_0: u8 = 0;
    pub const PLAYER_1: u8 = 1;
    pub const PLAYER_2: u8 = 2;
    pub const PLAYER_3: u8 = 3;
    pub const PLAYFIELD_0: u8 = 4;
    pub const PLAYFIELD_1: u8 = 5;
    pub const PLAYFIELD_2: u8 = 6;
    pub const PLAYFIELD_3: u8 = 7;
    pub const BACKGROUND: u8 = 8;
    /// PF1 with the hue of PF2, used by the hires modes.
    pub const PLAYFIELD_1_FIDDLED: u8 = 9;
    /// Artifacted hires colour for a 01 transition.
    pub const PLAYFIELD_ARTIFACT_1: u8 = 10;
    /// Artifacted hires colour for a 10 transition.
    pub const PLAYFIELD_ARTIFACT_2: u8 = 11;
    pub const PLAYER_0_OR_1: u8 = 12;
    pub const PLAYER_2_OR_3: u8 = 13;
    /// Always black, the result of a priority conflict.
    pub const BLACK: u8 = 14;
    pub const BACKGROUND_MASK: u8 = 15;
    pub const ENTRIES: usize = 16;
}

/// CPU cycle at which the merger starts consuming the line; the variant
/// active here wins the line (earlier priority writes update the initial
/// priority instead). 96 cycles of four half-colour-clocks each cover the
/// full 384-wide display.
pub const MERGE_START_CYCLE: usize = 16;

// GRACTL bits
const GRACTL_MISSILE_DMA: u8 = 0x01;
const GRACTL_PLAYER_DMA: u8 = 0x02;
const GRACTL_TRIG_LATCH: u8 = 0x04;

// PRIOR bits 0-3 select the ordering, bit 4 turns the missiles into a
// fifth player coloured like PF3, bit 5 merges the player colour pairs.
const PRIOR_MISSILE_PF3: u8 = 0x10;
const PRIOR_MERGE_PLAYERS: u8 = 0x20;
const PRIOR_MODE_MASK: u8 = 0xC0;

const PLAYER_COLOR_LOOKUP_SIZE: usize = 32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChipGeneration {
    /// Original chip without the processed modes.
    Ctia,
    /// The 400/800 revision.
    Gtia1,
    /// The XL-series revision.
    #[default]
    Gtia2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoStandard {
    #[default]
    Pal,
    Ntsc,
}

/// Which collisions an object or playfield may cause, for the collision
/// report masks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionReport {
    None,
    Players,
    Missiles,
    #[default]
    All,
}

impl CollisionReport {
    fn players(self) -> bool {
        matches!(self, Self::Players | Self::All)
    }

    fn missiles(self) -> bool {
        matches!(self, Self::Missiles | Self::All)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GtiaConfig {
    pub video: VideoStandard,
    pub chip_generation: ChipGeneration,
    /// Emulate COLPF1 colour artifacts in the hires modes.
    pub artifacts: bool,
    pub postprocessing: PostprocessorMode,
    /// Half-colour-clocks of pre-fetch before a repositioned object can
    /// retrigger.
    pub player_position_delay: i32,
    /// Ditto for resizing the object.
    pub player_resize_delay: i32,
    /// Ditto for rewriting the graphics register.
    pub player_reshape_delay: i32,
    pub player_collisions: [CollisionReport; 4],
    pub playfield_collisions: [CollisionReport; 4],
    /// External colour map replacing the built-in PAL/NTSC maps.
    pub palette_file: Option<PathBuf>,
}

impl Default for GtiaConfig {
    fn default() -> Self {
        Self {
            video: VideoStandard::default(),
            chip_generation: ChipGeneration::default(),
            artifacts: false,
            postprocessing: PostprocessorMode::default(),
            player_position_delay: 12,
            player_resize_delay: 6,
            player_reshape_delay: 6,
            player_collisions: [CollisionReport::All; 4],
            playfield_collisions: [CollisionReport::All; 4],
            palette_file: None,
        }
    }
}

pub struct Gtia {
    /// Colour lookup table, indexed by the pre-computed colour slots.
    color_lookup: [u8; pcc::ENTRIES],

    players: [PmObject; 4],
    missiles: [PmObject; 4],

    /// PRIOR as currently visible, and the value latched at line start.
    prior: u8,
    initial_prior: u8,
    /// Fiddling state of the current scanline.
    fiddling: bool,

    /// GRACTL is evaluated per line; the shadow is what the current line
    /// sees. Disabling a bit reaches the shadow immediately.
    gractl: u8,
    gractl_shadow: u8,
    vert_delay: u8,
    missile_pf3: bool,

    speaker: bool,
    /// Active keypad line output for the 5200 wiring.
    active_input: u8,
    console_keys: u8,

    triggers: [bool; 4],
    trig_latched: [u8; 4],

    /// Beam position of the merge in half-colour-clocks, and the CPU cycle
    /// the board last advanced us to.
    hpos: i32,
    current_cycle: usize,
    ypos: u16,

    chip_generation: ChipGeneration,
    artifacts: bool,
    ntsc: bool,
    pm_reaction: i32,
    pm_resize: i32,
    pm_shape: i32,

    // Priority engine lookups, rebuilt on every PRIOR write. Indexed by the
    // 5-bit overlay bitmask (players 0-3 plus missiles-as-fifth-player).
    player0_lookup: [u8; PLAYER_COLOR_LOOKUP_SIZE],
    player2_lookup: [u8; PLAYER_COLOR_LOOKUP_SIZE],
    player4_lookup: [u8; PLAYER_COLOR_LOOKUP_SIZE],
    player0_lookup_pf01: [u8; PLAYER_COLOR_LOOKUP_SIZE],
    player2_lookup_pf01: [u8; PLAYER_COLOR_LOOKUP_SIZE],
    player4_lookup_pf01: [u8; PLAYER_COLOR_LOOKUP_SIZE],
    player0_lookup_pf23: [u8; PLAYER_COLOR_LOOKUP_SIZE],
    player2_lookup_pf23: [u8; PLAYER_COLOR_LOOKUP_SIZE],
    player4_lookup_pf23: [u8; PLAYER_COLOR_LOOKUP_SIZE],
    playfield01_mask: [u8; PLAYER_COLOR_LOOKUP_SIZE],
    playfield23_mask: [u8; PLAYER_COLOR_LOOKUP_SIZE],

    /// Artifact hue mixer: bit 0 selects the artifact colour, bits 1-4 the
    /// background hue; the output is the effective hue.
    hue_mix: [u8; 32],

    /// Player/missile overlay for the current line, one bitmask per
    /// half-colour-clock.
    pm_target: [u8; PM_SCANLINE_SIZE],
    /// Playfield colour indices of the current line (taken by value from
    /// the display-list controller's handoff).
    playfield_line: [u8; DISPLAY_WIDTH],
    /// Finished output colours of the current line.
    line_out: [u8; DISPLAY_WIDTH],

    display_mode: DisplayMode,
    // Delay lines of the artifacting and 0x80-mode generators.
    art_last: u8,
    art_other: u8,
    delay_80: u8,

    color_map: [PackedRgb; 256],
    post: Postprocessor,
}

impl Gtia {
    pub fn new(config: &GtiaConfig) -> Self {
        let ntsc = config.video == VideoStandard::Ntsc;
        let mut gtia = Self {
            color_lookup: [0; pcc::ENTRIES],
            players: [
                PmObject::new(0x01),
                PmObject::new(0x02),
                PmObject::new(0x04),
                PmObject::new(0x08),
            ],
            missiles: [
                PmObject::new(0x10),
                PmObject::new(0x20),
                PmObject::new(0x40),
                PmObject::new(0x80),
            ],
            prior: 0,
            initial_prior: 0,
            fiddling: false,
            gractl: 0,
            gractl_shadow: 0,
            vert_delay: 0,
            missile_pf3: false,
            speaker: false,
            active_input: 0,
            console_keys: 0x0F,
            triggers: [false; 4],
            trig_latched: [1; 4],
            hpos: 0,
            current_cycle: 0,
            ypos: 0,
            chip_generation: config.chip_generation,
            artifacts: config.artifacts,
            ntsc,
            pm_reaction: config.player_position_delay,
            pm_resize: config.player_resize_delay,
            pm_shape: config.player_reshape_delay,
            player0_lookup: [0; PLAYER_COLOR_LOOKUP_SIZE],
            player2_lookup: [0; PLAYER_COLOR_LOOKUP_SIZE],
            player4_lookup: [0; PLAYER_COLOR_LOOKUP_SIZE],
            player0_lookup_pf01: [0; PLAYER_COLOR_LOOKUP_SIZE],
            player2_lookup_pf01: [0; PLAYER_COLOR_LOOKUP_SIZE],
            player4_lookup_pf01: [0; PLAYER_COLOR_LOOKUP_SIZE],
            player0_lookup_pf23: [0; PLAYER_COLOR_LOOKUP_SIZE],
            player2_lookup_pf23: [0; PLAYER_COLOR_LOOKUP_SIZE],
            player4_lookup_pf23: [0; PLAYER_COLOR_LOOKUP_SIZE],
            playfield01_mask: [0; PLAYER_COLOR_LOOKUP_SIZE],
            playfield23_mask: [0; PLAYER_COLOR_LOOKUP_SIZE],
            hue_mix: [0; 32],
            pm_target: [0; PM_SCANLINE_SIZE],
            playfield_line: [pcc::BACKGROUND; DISPLAY_WIDTH],
            line_out: [0; DISPLAY_WIDTH],
            display_mode: DisplayMode::Mode00Unfiddled,
            art_last: 0,
            art_other: 0,
            delay_80: 0,
            color_map: if ntsc {
                palette::NTSC_COLOR_MAP
            } else {
                palette::PAL_COLOR_MAP
            },
            post: Postprocessor::new(config.postprocessing),
        };
        gtia.set_collision_reporting(&config.player_collisions, &config.playfield_collisions);
        if let Some(path) = &config.palette_file {
            if let Err(e) = gtia.load_palette_from(path) {
                log::warn!("keeping built-in palette: {e}");
            }
        }
        gtia.cold_reset();
        gtia
    }

    /// Warm reset: object positions and control registers clear, the
    /// colour table survives.
    pub fn warm_reset(&mut self) {
        self.setup_artifacting();
        for obj in self.players.iter_mut().chain(self.missiles.iter_mut()) {
            obj.reset();
        }
        self.fiddling = false;
        self.initial_prior = 0;
        self.prior = 0;
        self.update_priority_engine(0);
        self.pick_mode_generator(0);
        self.gractl = 0;
        self.gractl_shadow = 0;
        self.vert_delay = 0;
        self.hpos = 0;
        self.current_cycle = 0;
        self.post.reset();
    }

    /// Cold reset: a warm reset that also clears the colour table.
    pub fn cold_reset(&mut self) {
        self.color_lookup = [0; pcc::ENTRIES];
        self.warm_reset();
    }

    // -----------------------------------------------------------------
    // Register file
    // -----------------------------------------------------------------

    /// Read a register. Only address bits 0-4 are decoded.
    pub fn read(&mut self, offset: u8) -> u8 {
        match offset & 0x1F {
            0x00..=0x03 => {
                let m = &self.missiles[usize::from(offset & 0x03)];
                m.collision_playfield & m.playfield_col_mask
            }
            0x04..=0x07 => {
                let p = &self.players[usize::from(offset & 0x03)];
                p.collision_playfield & p.playfield_col_mask
            }
            0x08..=0x0B => {
                // Self-collisions are masked out on read.
                let m = &self.missiles[usize::from(offset & 0x03)];
                m.collision_player & m.player_col_mask & !m.display_mask
            }
            0x0C..=0x0F => {
                let p = &self.players[usize::from(offset & 0x03)];
                p.collision_player & p.player_col_mask & !p.display_mask
            }
            0x10..=0x13 => self.trig_read(usize::from(offset & 0x03)),
            0x14 => {
                if self.ntsc {
                    0x0F
                } else {
                    0x01
                }
            }
            0x1F => self.console_keys & !self.active_input,
            _ => {
                // The remaining offsets pull the top nibble low on the
                // later generations.
                if self.chip_generation == ChipGeneration::Ctia {
                    0xFF
                } else {
                    0x0F
                }
            }
        }
    }

    /// Write a register. Only address bits 0-4 are decoded.
    pub fn write(&mut self, offset: u8, val: u8) {
        match offset & 0x1F {
            0x00..=0x03 => self.write_player_hpos(usize::from(offset & 0x03), val),
            0x04..=0x07 => self.write_missile_hpos(usize::from(offset & 0x03), val),
            0x08..=0x0B => self.write_player_size(usize::from(offset & 0x03), val),
            0x0C => self.write_missile_sizes(val),
            0x0D..=0x10 => self.write_player_graphics(usize::from((offset - 0x0D) & 0x03), val),
            0x11 => self.write_missile_graphics(val),
            0x12..=0x15 => self.write_player_color(usize::from((offset - 0x12) & 0x03), val),
            0x16..=0x19 => self.write_playfield_color(usize::from((offset - 0x16) & 0x03), val),
            0x1A => self.write_background_color(val),
            0x1B => self.write_prior(val),
            0x1C => self.vert_delay = val,
            0x1D => self.write_gractl(val),
            0x1E => self.hit_clear(),
            0x1F => self.write_console(val),
            _ => {}
        }
    }

    fn trig_read(&self, n: usize) -> u8 {
        if self.gractl & GRACTL_TRIG_LATCH != 0 {
            self.trig_latched[n]
        } else if self.triggers[n] {
            0
        } else {
            1
        }
    }

    fn write_player_hpos(&mut self, n: usize, val: u8) {
        let newpos = (i32::from(val) - 0x20) << 1;
        let reload = self.hpos + self.pm_reaction;
        // The nearest position at which the repositioned object could
        // still trigger on this line.
        if newpos >= reload {
            self.players[n].retrigger(&mut self.pm_target, 8, val, reload);
        } else {
            self.players[n].reposition(val);
        }
    }

    fn write_missile_hpos(&mut self, n: usize, val: u8) {
        let newpos = (i32::from(val) - 0x20) << 1;
        let reload = self.hpos + self.pm_reaction;
        if newpos >= reload {
            self.missiles[n].retrigger(&mut self.pm_target, 2, val, reload);
        } else {
            self.missiles[n].reposition(val);
        }
    }

    fn write_player_size(&mut self, n: usize, val: u8) {
        let retrigger = self.hpos + self.pm_resize;
        let p = &self.players[n];
        if retrigger < p.decoded_position {
            self.players[n].remove_right_of(&mut self.pm_target, 8, retrigger);
            self.players[n].resize(val);
            self.players[n].render(&mut self.pm_target, 8);
        } else if retrigger >= p.decoded_position + (16 << p.decoded_size) {
            // Already drawn completely; nothing changes on this line.
            self.players[n].resize(val);
        } else {
            self.players[n].retrigger_size(&mut self.pm_target, 8, val, retrigger);
        }
    }

    fn write_missile_sizes(&mut self, val: u8) {
        let retrigger = self.hpos + self.pm_resize;
        let mut val = val;
        // Bits 0-1 size missile 0, and so on upwards.
        for n in 0..4 {
            let m = &self.missiles[n];
            if retrigger < m.decoded_position {
                self.missiles[n].remove_right_of(&mut self.pm_target, 2, retrigger);
                self.missiles[n].resize(val);
                self.missiles[n].render(&mut self.pm_target, 2);
            } else if retrigger >= m.decoded_position + (4 << m.decoded_size) {
                self.missiles[n].resize(val);
            } else {
                self.missiles[n].retrigger_size(&mut self.pm_target, 2, val, retrigger);
            }
            val >>= 2;
        }
    }

    fn write_player_graphics(&mut self, n: usize, val: u8) {
        let retrigger = self.hpos + self.pm_shape;
        let p = &self.players[n];
        if retrigger < p.decoded_position {
            self.players[n].remove_right_of(&mut self.pm_target, 8, retrigger);
            self.players[n].reshape(val);
            self.players[n].render(&mut self.pm_target, 8);
        } else {
            // Either already drawn completely, or partially on the screen.
            // The shifter is not reloaded mid-object; only the register
            // copy changes, visible from the next line on.
            self.players[n].reshape(val);
        }
    }

    fn write_missile_graphics(&mut self, val: u8) {
        let retrigger = self.hpos + self.pm_shape;
        // Missile 0 takes the least significant bits; the renderer shifts
        // from the top of the register.
        let mut shift = 6;
        for n in 0..4 {
            let graphics = (val << shift) & 0xC0;
            if retrigger < self.missiles[n].decoded_position {
                self.missiles[n].remove_right_of(&mut self.pm_target, 2, retrigger);
                self.missiles[n].reshape(graphics);
                self.missiles[n].render(&mut self.pm_target, 2);
            } else {
                self.missiles[n].reshape(graphics);
            }
            shift -= 2;
        }
    }

    fn write_player_color(&mut self, n: usize, val: u8) {
        self.color_lookup[usize::from(pcc::PLAYER_0) + n] = val & 0xFE;
        // Maintain the merged colours for the player pair combinations.
        self.color_lookup[usize::from(pcc::PLAYER_0_OR_1)] =
            self.color_lookup[usize::from(pcc::PLAYER_0)]
                | self.color_lookup[usize::from(pcc::PLAYER_1)];
        self.color_lookup[usize::from(pcc::PLAYER_2_OR_3)] =
            self.color_lookup[usize::from(pcc::PLAYER_2)]
                | self.color_lookup[usize::from(pcc::PLAYER_3)];
    }

    fn write_playfield_color(&mut self, n: usize, val: u8) {
        self.color_lookup[usize::from(pcc::PLAYFIELD_0) + n] = val & 0xFE;
        // The fiddled colour takes its value from register 1 and its hue
        // from register 2.
        if n == 1 || n == 2 {
            self.color_lookup[usize::from(pcc::PLAYFIELD_1_FIDDLED)] =
                (self.color_lookup[usize::from(pcc::PLAYFIELD_1)] & 0x0F)
                    | (self.color_lookup[usize::from(pcc::PLAYFIELD_2)] & 0xF0);
        }
    }

    fn write_background_color(&mut self, val: u8) {
        self.color_lookup[usize::from(pcc::BACKGROUND)] = val & 0xFE;
        self.color_lookup[usize::from(pcc::BACKGROUND_MASK)] = val & 0xFE;
    }

    fn write_prior(&mut self, val: u8) {
        if val != self.prior {
            self.update_priority_engine(val);
            // Up to cycle 15 the write still defines the line's mode;
            // later it only applies to the remainder, and clearing a
            // processed mode switches into the strange variant.
            if self.current_cycle < MERGE_START_CYCLE
                && self.chip_generation != ChipGeneration::Ctia
            {
                self.initial_prior = val & PRIOR_MODE_MASK;
            }
            self.prior = val;
            self.pick_mode_generator(val);
        }
    }

    fn write_gractl(&mut self, val: u8) {
        self.gractl = val;
        // Disabling DMA receive must reach the shadow immediately so a
        // P/M register write shortly after is not overwritten by stale
        // DMA data.
        self.gractl_shadow &= val;
        if val & GRACTL_TRIG_LATCH == 0 {
            for (latch, &pressed) in self.trig_latched.iter_mut().zip(&self.triggers) {
                *latch = if pressed { 0 } else { 1 };
            }
        }
    }

    fn hit_clear(&mut self) {
        for obj in self.players.iter_mut().chain(self.missiles.iter_mut()) {
            obj.collision_player = 0;
            obj.collision_playfield = 0;
        }
    }

    fn write_console(&mut self, val: u8) {
        self.speaker = val & 0x08 == 0;
        // The 5200 uses the low bits to select the active keypad line; a
        // one-bit pulls the matching input down.
        self.active_input = val & 0x07;
    }

    // -----------------------------------------------------------------
    // Host wiring
    // -----------------------------------------------------------------

    /// Joystick trigger input. Latched low while GRACTL bit 2 is set.
    pub fn set_trigger(&mut self, n: usize, pressed: bool) {
        if n < 4 {
            self.triggers[n] = pressed;
            if pressed {
                self.trig_latched[n] = 0;
            }
        }
    }

    /// Console switch input, active-low (bits 0-2: Start/Select/Option).
    pub fn set_console_keys(&mut self, keys: u8) {
        self.console_keys = keys;
    }

    pub fn speaker(&self) -> bool {
        self.speaker
    }

    pub fn color_map(&self) -> &[PackedRgb; 256] {
        &self.color_map
    }

    pub fn chip_generation(&self) -> ChipGeneration {
        self.chip_generation
    }

    /// Replace the colour map from a raw 768-byte RGB palette file. On
    /// failure the previous map stays active.
    pub fn load_palette_from(&mut self, path: &Path) -> Result<(), palette::PaletteLoadError> {
        self.color_map = palette::load_palette(path)?;
        Ok(())
    }

    /// Configure which collisions each object and playfield may report.
    pub fn set_collision_reporting(
        &mut self,
        players: &[CollisionReport; 4],
        playfields: &[CollisionReport; 4],
    ) {
        let mut plpl = 0u8;
        let mut plml = 0u8;
        let mut pfpl = 0u8;
        let mut pfml = 0u8;
        for i in 0..4 {
            if players[i].players() {
                plpl |= 1 << i;
            }
            if players[i].missiles() {
                plml |= 1 << i;
            }
            if playfields[i].players() {
                pfpl |= 1 << i;
            }
            if playfields[i].missiles() {
                pfml |= 1 << i;
            }
        }
        for i in 0..4 {
            self.players[i].player_col_mask = plpl;
            self.players[i].playfield_col_mask = pfpl;
            self.missiles[i].player_col_mask = plml;
            self.missiles[i].playfield_col_mask = pfml;
        }
    }

    // -----------------------------------------------------------------
    // Priority engine
    // -----------------------------------------------------------------

    /// Rebuild the priority lookups from a priority-control value. Writing
    /// the same value twice yields the same tables as writing it once.
    fn update_priority_engine(&mut self, pri: u8) {
        self.missile_pf3 = pri & PRIOR_MISSILE_PF3 != 0;

        // Decode the ordering bits into pairwise "beats" relations.
        let mut pfbeatspl = false; // playfield in front of players 0,1
        let mut plbeatspf = false; // players 2,3 in front of playfield 0,1
        let mut pl02beatspl = true; // players 0,2 in front of players 1,3
        let mut pf23beatspl = false;
        let mut pl23beatspf = false;
        let mut pf01beatspl = false;
        let mut pl01beatspf = false;

        if pri & PRIOR_MERGE_PLAYERS != 0 {
            pl02beatspl = false;
        }
        if pri & 0x01 != 0 {
            // All players in front of the playfield.
            pl01beatspf = true;
            pl23beatspf = true;
            plbeatspf = true;
        }
        if pri & 0x02 != 0 {
            // Players 0,1 in front of the playfield in front of players 2,3.
            pl01beatspf = true;
            pf23beatspl = true;
        }
        if pri & 0x04 != 0 {
            // Playfield in front of all players.
            pf01beatspl = true;
            pf23beatspl = true;
            pfbeatspl = true;
        }
        if pri & 0x08 != 0 {
            // Playfield 0,1 in front of players in front of playfield 2,3.
            pf01beatspl = true;
            pl23beatspf = true;
        }

        for pm_pixel in 0..PLAYER_COLOR_LOOKUP_SIZE {
            let mut pl0 = pcc::BLACK; // black = priority conflict
            let mut pl2 = pcc::BLACK;
            let mut pl4 = pcc::BLACK;

            if pm_pixel & 0x08 != 0 {
                pl2 = pcc::PLAYER_3;
            }
            if pm_pixel & 0x04 != 0 {
                pl2 = if pm_pixel & 0x08 != 0 && !pl02beatspl {
                    pcc::PLAYER_2_OR_3
                } else {
                    pcc::PLAYER_2
                };
            }
            if pm_pixel & 0x02 != 0 {
                pl2 = pcc::BLACK; // player 1 beats the 2,3 pair
                pl0 = pcc::PLAYER_1;
            }
            if pm_pixel & 0x01 != 0 {
                pl2 = pcc::BLACK;
                pl0 = if pm_pixel & 0x02 != 0 && !pl02beatspl {
                    pcc::PLAYER_0_OR_1
                } else {
                    pcc::PLAYER_0
                };
            }
            if pm_pixel & 0x10 != 0 {
                // Missiles combined into the fifth player take PF3.
                pl4 = pcc::PLAYFIELD_3;
                if pm_pixel & 0x03 != 0 && !pfbeatspl {
                    pl4 = pcc::BLACK;
                }
                if pm_pixel & 0x0C != 0 && pl23beatspf {
                    pl4 = pcc::BLACK;
                }
                if pf23beatspl {
                    pl2 = pcc::BLACK;
                }
                if pfbeatspl {
                    pl0 = pcc::BLACK;
                }
            }

            // Colours in front of the background.
            self.player0_lookup[pm_pixel] = pl0;
            self.player2_lookup[pm_pixel] = pl2;
            self.player4_lookup[pm_pixel] = pl4;

            // Colours in front of the playfields: beaten layers turn
            // black so the resolver can simply OR them in.
            self.player0_lookup_pf01[pm_pixel] = if pf01beatspl { pcc::BLACK } else { pl0 };
            self.player2_lookup_pf01[pm_pixel] = if !plbeatspf { pcc::BLACK } else { pl2 };
            self.player4_lookup_pf01[pm_pixel] = pl4;
            self.player0_lookup_pf23[pm_pixel] = if pfbeatspl { pcc::BLACK } else { pl0 };
            self.player2_lookup_pf23[pm_pixel] = if pf23beatspl { pcc::BLACK } else { pl2 };
            self.player4_lookup_pf23[pm_pixel] = pl4;

            // Masks that clear the playfield when a higher-priority
            // object is present.
            let mut mask = 0xFF;
            if pm_pixel & 0x03 != 0 && pl01beatspf {
                mask = 0;
            }
            if pm_pixel & 0x0C != 0 && plbeatspf {
                mask = 0;
            }
            if pm_pixel & 0x10 != 0 && (pfbeatspl || (!pf01beatspl && pm_pixel & 0x03 == 0)) {
                mask = 0;
            }
            self.playfield01_mask[pm_pixel] = mask;

            let mut mask = 0xFF;
            if pm_pixel & 0x03 != 0 && !pfbeatspl {
                mask = 0;
            }
            if pm_pixel & 0x0C != 0 && pl23beatspf {
                mask = 0;
            }
            if pm_pixel & 0x10 != 0 {
                mask = 0;
            }
            self.playfield23_mask[pm_pixel] = mask;
        }
    }

    /// Resolve one half-colour-clock: playfield colour index, overlay
    /// bitmask and the decoded playfield colour in, final colour out.
    fn pixel_color(&self, pf_pixel: u8, pm_pixel: u8, pf_color: u8) -> u8 {
        // Missiles either merge into the fifth player or share the
        // priority of their player.
        let pm = usize::from(if pm_pixel & 0xF0 != 0 && self.missile_pf3 {
            (pm_pixel & 0x0F) | 0x10
        } else {
            (pm_pixel & 0x0F) | (pm_pixel >> 4)
        });

        let mut pfcol = pf_color;
        match pf_pixel {
            pcc::PLAYFIELD_0 | pcc::PLAYFIELD_1 => {
                pfcol &= self.playfield01_mask[pm];
                pfcol |= self.color_lookup[usize::from(self.player0_lookup_pf01[pm])];
                pfcol |= self.color_lookup[usize::from(self.player2_lookup_pf01[pm])];
                pfcol |= self.color_lookup[usize::from(self.player4_lookup_pf01[pm])];
            }
            pcc::PLAYFIELD_1_FIDDLED
            | pcc::PLAYFIELD_ARTIFACT_1
            | pcc::PLAYFIELD_ARTIFACT_2
            | pcc::PLAYFIELD_2
            | pcc::PLAYFIELD_3 => {
                // The fiddled colour is first understood as PF2 and shares
                // its priority.
                if pf_pixel != pcc::PLAYFIELD_2 && pf_pixel != pcc::PLAYFIELD_3 {
                    pfcol = self.color_lookup[usize::from(pcc::PLAYFIELD_2)];
                }
                pfcol &= self.playfield23_mask[pm];
                pfcol |= self.color_lookup[usize::from(self.player0_lookup_pf23[pm])];
                pfcol |= self.color_lookup[usize::from(self.player2_lookup_pf23[pm])];
                pfcol |= self.color_lookup[usize::from(self.player4_lookup_pf23[pm])];
            }
            _ => {
                // Background: players are always visible here.
                pfcol = 0;
                pfcol |= self.color_lookup[usize::from(self.player0_lookup[pm])];
                pfcol |= self.color_lookup[usize::from(self.player2_lookup[pm])];
                pfcol |= self.color_lookup[usize::from(self.player4_lookup[pm])];
            }
        }

        // Colour fiddling keeps the value nibble of the fiddled slot.
        if pf_pixel == pcc::PLAYFIELD_1_FIDDLED {
            pfcol = (pfcol & 0xF0)
                | (self.color_lookup[usize::from(pcc::PLAYFIELD_1_FIDDLED)] & 0x0F);
        }
        pfcol
    }

    /// Accumulate collision bits for one half-colour-clock.
    fn update_collisions(&mut self, pf: u8, pl: u8, collision_mask: &[u8; 16]) {
        // Depending on the display variant, not all colours can collide.
        let pf_bits = collision_mask[usize::from(pf)];
        for i in 0..4 {
            if pl & self.players[i].display_mask != 0 {
                self.players[i].collision_player |= pl; // self masked on read
                self.players[i].collision_playfield |= pf_bits;
            }
            if pl & self.missiles[i].display_mask != 0 {
                self.missiles[i].collision_player |= pl;
                self.missiles[i].collision_playfield |= pf_bits;
            }
        }
    }

    // -----------------------------------------------------------------
    // Display generator matrix
    // -----------------------------------------------------------------

    /// Pick the post-processing variant for PRIOR bits 6..7, the fiddling
    /// flag and the chip generation. CTIA has no processed modes.
    fn pick_mode_generator(&mut self, prior: u8) {
        let mode = if self.chip_generation == ChipGeneration::Ctia {
            0
        } else {
            prior & PRIOR_MODE_MASK
        };
        self.display_mode = match mode {
            0x00 => {
                if self.chip_generation != ChipGeneration::Ctia
                    && self.initial_prior & PRIOR_MODE_MASK != 0
                {
                    // A processed mode was switched off mid-line.
                    if self.fiddling {
                        DisplayMode::StrangeFiddled
                    } else {
                        DisplayMode::StrangeUnfiddled
                    }
                } else if self.fiddling {
                    if self.artifacts {
                        DisplayMode::Mode00Artefacted
                    } else {
                        DisplayMode::Mode00Fiddled
                    }
                } else {
                    DisplayMode::Mode00Unfiddled
                }
            }
            0x40 => {
                if self.fiddling {
                    DisplayMode::Mode40Fiddled
                } else {
                    DisplayMode::Mode40Unfiddled
                }
            }
            0x80 => {
                if self.fiddling {
                    DisplayMode::Mode80Fiddled
                } else {
                    DisplayMode::Mode80Unfiddled
                }
            }
            _ => {
                if self.fiddling {
                    DisplayMode::ModeC0Fiddled
                } else {
                    DisplayMode::ModeC0Unfiddled
                }
            }
        };
        // Remember that a processed mode was active at some point of the
        // line, even if switched off again.
        self.initial_prior |= self.prior;
    }

    /// Artifact base colours per chip generation and the hue mixer table.
    fn setup_artifacting(&mut self) {
        let (art1, art2) = match self.chip_generation {
            ChipGeneration::Ctia => (0x80, 0xC0),
            ChipGeneration::Gtia1 => (0xA0, 0x40),
            ChipGeneration::Gtia2 => (0x90, 0x20),
        };
        self.color_lookup[usize::from(pcc::PLAYFIELD_ARTIFACT_1)] = art1;
        self.color_lookup[usize::from(pcc::PLAYFIELD_ARTIFACT_2)] = art2;

        // Black & white backgrounds take the base colours directly.
        self.hue_mix[0] = art1;
        self.hue_mix[1] = art2;

        // Coloured backgrounds mix: the average of the artifact hue and
        // the background hue, folded back into the hue circle.
        for hue in 1..16i32 {
            for idx in 0..2usize {
                let base = i32::from(
                    self.color_lookup[usize::from(pcc::PLAYFIELD_ARTIFACT_1) + idx],
                );
                let center = (base - 0x50) & 0xF0;
                let color1 = (base - center) & 0xF0;
                let color2 = ((hue << 4) - center) & 0xF0;
                let delta = (color2 - color1) >> 1;
                let mut color = delta + color1 + center;
                if color >= 0x100 {
                    color -= 0xF0;
                }
                self.hue_mix[idx + (hue << 1) as usize] = (color & 0xF0) as u8;
            }
        }
    }

    // -----------------------------------------------------------------
    // Scanline pipeline
    // -----------------------------------------------------------------

    /// Accept the display-list controller's scanline handoff and set up
    /// the line: latch the GRACTL shadow and initial priority, reload the
    /// shifters from DMA data (honouring vertical delay), render the
    /// overlay and pick the display variant.
    pub fn begin_scanline(&mut self, handoff: &ScanlineHandoff<'_>) {
        self.gractl_shadow = self.gractl;
        if self.chip_generation != ChipGeneration::Ctia {
            self.initial_prior = self.prior & PRIOR_MODE_MASK;
        }
        self.ypos = handoff.ypos;
        if self.ypos == VBI_START {
            self.post.vertical_blank();
        }
        self.fiddling = handoff.fiddling;
        self.pick_mode_generator(self.prior);

        // Delay lines restart from the background at the left edge.
        self.art_last = pcc::BACKGROUND;
        self.art_other = 0;
        self.delay_80 = pcc::BACKGROUND;

        let odd_line = handoff.ypos & 1 != 0;
        if self.gractl_shadow & GRACTL_PLAYER_DMA != 0 {
            for i in 0..4 {
                // With the delay bit set, the shifter reloads on odd
                // lines only.
                if odd_line || self.vert_delay & (0x10 << i) == 0 {
                    self.players[i].reshape(handoff.player_dma[i]);
                }
            }
        }
        if self.gractl_shadow & GRACTL_MISSILE_DMA != 0 {
            let mut shift = 6;
            for i in 0..4 {
                if odd_line || self.vert_delay & (1 << i) == 0 {
                    self.missiles[i].reshape((handoff.player_dma[4] << shift) & 0xC0);
                }
                shift -= 2;
            }
        }

        self.pm_target.fill(0);
        for p in &self.players {
            p.render(&mut self.pm_target, 8);
        }
        for m in &self.missiles {
            m.render(&mut self.pm_target, 2);
        }

        self.playfield_line.copy_from_slice(handoff.playfield);
        self.hpos = 0;
        self.current_cycle = 0;
    }

    /// Merge output up to the given CPU cycle. Register writes on that
    /// cycle are visible from the matching half-colour-clock onward.
    pub fn advance_to(&mut self, cycle: usize) {
        self.current_cycle = cycle;
        let target = ((cycle as i32 - MERGE_START_CYCLE as i32) * 4).clamp(0, DISPLAY_WIDTH as i32);
        while self.hpos < target {
            let x = self.hpos as usize;
            self.process_clock(x);
            self.hpos += 4;
        }
    }

    /// Merge the remainder of the line and push it through the
    /// postprocessor into the sink. Off-screen lines are dropped.
    pub fn finish_scanline(&mut self, sink: &mut dyn VideoSink) {
        while self.hpos < DISPLAY_WIDTH as i32 {
            let x = self.hpos as usize;
            self.process_clock(x);
            self.hpos += 4;
        }
        if self.ypos < VBI_START {
            self.post
                .push_line(usize::from(self.ypos), &self.line_out, &self.color_map, sink);
        }
    }

    /// Current beam position of the merge in half-colour-clocks.
    pub fn beam_hpos(&self) -> i32 {
        self.hpos
    }

    /// The merged output of the current line, for inspection.
    pub fn output_line(&self) -> &[u8] {
        &self.line_out
    }

    /// The player/missile overlay of the current line, for inspection.
    pub fn overlay_line(&self) -> &[u8] {
        &self.pm_target[..DISPLAY_WIDTH]
    }

    fn process_clock(&mut self, x: usize) {
        debug_assert!(x + 4 <= DISPLAY_WIDTH);
        match self.display_mode {
            DisplayMode::Mode00Unfiddled => self.clock_unprocessed(x, &COLLISION_UNFIDDLED),
            DisplayMode::Mode00Fiddled => self.clock_unprocessed(x, &COLLISION_FIDDLED),
            DisplayMode::Mode00Artefacted => self.clock_artefacted(x),
            DisplayMode::Mode40Unfiddled => self.clock_mode40(x, &LUT_UNFIDDLED),
            DisplayMode::Mode40Fiddled => self.clock_mode40(x, &LUT_FIDDLED),
            DisplayMode::Mode80Unfiddled => self.clock_mode80(x, &LUT_80_UNFIDDLED),
            DisplayMode::Mode80Fiddled => self.clock_mode80(x, &LUT_FIDDLED),
            DisplayMode::ModeC0Unfiddled => self.clock_modec0(x, &LUT_UNFIDDLED),
            DisplayMode::ModeC0Fiddled => self.clock_modec0(x, &LUT_FIDDLED),
            DisplayMode::StrangeUnfiddled => self.clock_strange(x, &LUT_UNFIDDLED),
            DisplayMode::StrangeFiddled => self.clock_strange(x, &LUT_FIDDLED),
        }
    }

    /// Unprocessed modes: colour lookup per half-colour-clock, priority
    /// engine only where the overlay is populated.
    fn clock_unprocessed(&mut self, x: usize, collision_mask: &[u8; 16]) {
        let pf: [u8; 4] = self.playfield_line[x..x + 4].try_into().unwrap_or([0; 4]);
        let pm: [u8; 4] = self.pm_target[x..x + 4].try_into().unwrap_or([0; 4]);

        if pm == [0; 4] {
            // Fast and most frequent choice.
            for j in 0..4 {
                self.line_out[x + j] = self.color_lookup[usize::from(pf[j])];
            }
            return;
        }
        for j in 0..4 {
            self.line_out[x + j] = if pm[j] != 0 {
                self.update_collisions(pf[j], pm[j], collision_mask);
                self.pixel_color(pf[j], pm[j], self.color_lookup[usize::from(pf[j])])
            } else {
                self.color_lookup[usize::from(pf[j])]
            };
        }
    }

    /// Unprocessed fiddled mode with composite artifacting: 01 and 10
    /// transitions of the hires signal produce the artifact hues.
    fn clock_artefacted(&mut self, x: usize) {
        for j in 0..4 {
            let pf = self.playfield_line[x + j];
            let pm = self.pm_target[x + j];
            self.art_last = (self.art_last << 4) | pf;

            let back = if pm != 0 {
                self.update_collisions(pf, pm, &COLLISION_FIDDLED);
                self.pixel_color(pf, pm, self.color_lookup[usize::from(pf)])
            } else {
                self.color_lookup[usize::from(pf)]
            };

            let is_edge = self.art_last == ((pcc::PLAYFIELD_1_FIDDLED << 4) | pcc::PLAYFIELD_2)
                || self.art_last == ((pcc::PLAYFIELD_2 << 4) | pcc::PLAYFIELD_1_FIDDLED);
            self.line_out[x + j] = if is_edge {
                // The value difference across the edge generates the
                // signal in the colour carrier; no difference, no
                // artifact.
                let diff = i32::from(back & 0x0F) - i32::from(self.art_other & 0x0F);
                if diff != 0 {
                    let sign = usize::from(diff < 0);
                    let idx = usize::from((back & 0xF0) >> 3) | (sign ^ (j & 1));
                    // Hue from the mixer, value from the edge average.
                    self.hue_mix[idx]
                        .wrapping_add(((self.art_other & 0x0F) + (back & 0x0F)) >> 1)
                } else {
                    back
                }
            } else {
                back
            };
            self.art_other = back;
        }
    }

    /// 0x40 processed mode: sixteen luminances on the background hue.
    /// Players always take priority; no playfield collisions.
    fn clock_mode40(&mut self, x: usize, lut: &IntermediateLut) {
        let pf: [u8; 4] = self.playfield_line[x..x + 4].try_into().unwrap_or([0; 4]);
        let playfield = lut[0][usize::from(pf[0])]
            | lut[1][usize::from(pf[1])]
            | lut[2][usize::from(pf[2])]
            | lut[3][usize::from(pf[3])];

        for j in 0..4 {
            let pm = self.pm_target[x + j];
            self.line_out[x + j] = if pm != 0 {
                self.update_collisions(playfield, pm, &COLLISION_NONE);
                let mut bgcolor = self.color_lookup[usize::from(pcc::BACKGROUND)];
                let mut playdat = pm;
                // The missiles as fifth player do not overlay, they mix.
                if pm & 0xF0 != 0 && self.missile_pf3 {
                    bgcolor = self.color_lookup[usize::from(pcc::PLAYFIELD_3)];
                    playdat &= 0x0F;
                }
                if playdat != 0 {
                    self.pixel_color(pcc::BACKGROUND, pm, playfield | bgcolor)
                } else {
                    playfield | bgcolor
                }
            } else {
                playfield | self.color_lookup[usize::from(pcc::BACKGROUND)]
            };
        }
    }

    /// 0x80 processed mode: indexed colours through the one-colour-clock
    /// delay line; the playfield may resolve to player colours and then
    /// shares their priority.
    fn clock_mode80(&mut self, x: usize, lut: &IntermediateLut) {
        let pf: [u8; 4] = self.playfield_line[x..x + 4].try_into().unwrap_or([0; 4]);
        // The first colour clock still shows the previous value.
        self.playfield_line[x] = self.delay_80;
        self.playfield_line[x + 1] = self.delay_80;
        let oc = XLATE_80[usize::from(
            lut[0][usize::from(pf[0])]
                | lut[1][usize::from(pf[1])]
                | lut[2][usize::from(pf[2])]
                | lut[3][usize::from(pf[3])],
        )];
        self.delay_80 = oc;
        self.playfield_line[x + 2] = oc;
        self.playfield_line[x + 3] = oc;

        for j in 0..4 {
            let pfj = self.playfield_line[x + j];
            let pm = self.pm_target[x + j];
            self.line_out[x + j] = if pm != 0 {
                self.update_collisions(pfj, pm, &COLLISION_UNFIDDLED);
                self.pixel_color(
                    pfj,
                    pm | PLAYER_MASK_80[usize::from(pfj)],
                    self.color_lookup[usize::from(pfj)],
                )
            } else {
                self.color_lookup[usize::from(pfj)]
            };
        }
    }

    /// 0xC0 processed mode: hue from the bitmap, value from the
    /// background. Hue zero stays dark.
    fn clock_modec0(&mut self, x: usize, lut: &IntermediateLut) {
        let pf: [u8; 4] = self.playfield_line[x..x + 4].try_into().unwrap_or([0; 4]);
        let playfield = lut[0][usize::from(pf[0])]
            | lut[1][usize::from(pf[1])]
            | lut[2][usize::from(pf[2])]
            | lut[3][usize::from(pf[3])];

        let hue_from = |base: u8, lookup: &[u8; pcc::ENTRIES]| {
            let hue = playfield << 4;
            if hue != 0 {
                hue | lookup[usize::from(base)]
            } else {
                hue | (lookup[usize::from(base)] & 0xF0)
            }
        };

        for j in 0..4 {
            let pm = self.pm_target[x + j];
            let hue = hue_from(pcc::BACKGROUND, &self.color_lookup);
            self.line_out[x + j] = if pm != 0 {
                self.update_collisions(playfield, pm, &COLLISION_NONE);
                let mut hue = hue;
                let mut playdat = pm;
                if pm & 0xF0 != 0 && self.missile_pf3 {
                    hue = hue_from(pcc::PLAYFIELD_3, &self.color_lookup);
                    playdat &= 0x0F;
                }
                if playdat != 0 {
                    self.pixel_color(pcc::BACKGROUND, pm, hue)
                } else {
                    hue
                }
            } else {
                hue
            };
        }
    }

    /// The strange fallback, active once a processed mode has been
    /// disabled mid-line: only the background/frame distinction survives
    /// and the nibble pairs remap onto PF0..PF3.
    fn clock_strange(&mut self, x: usize, lut: &IntermediateLut) {
        let pf: [u8; 4] = self.playfield_line[x..x + 4].try_into().unwrap_or([0; 4]);
        // The playfield is aligned to colour-clock pairs, so testing the
        // first pixel suffices.
        if pf[0] == pcc::BACKGROUND {
            for j in 0..4 {
                self.playfield_line[x + j] = pcc::BACKGROUND;
            }
        } else {
            let combined = lut[0][usize::from(pf[0])]
                | lut[1][usize::from(pf[1])]
                | lut[2][usize::from(pf[2])]
                | lut[3][usize::from(pf[3])];
            let hi = STRANGE_NIBBLE_MAP[usize::from(combined >> 2)];
            let lo = STRANGE_NIBBLE_MAP[usize::from(combined & 0x03)];
            self.playfield_line[x] = hi;
            self.playfield_line[x + 1] = hi;
            self.playfield_line[x + 2] = lo;
            self.playfield_line[x + 3] = lo;
        }

        for j in 0..4 {
            let pfj = self.playfield_line[x + j];
            let pm = self.pm_target[x + j];
            self.line_out[x + j] = if pm != 0 {
                self.update_collisions(pfj, pm, &COLLISION_UNFIDDLED);
                self.pixel_color(pcc::BACKGROUND, pm, self.color_lookup[usize::from(pfj)])
            } else {
                self.color_lookup[usize::from(pfj)]
            };
        }
    }

    // -----------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------

    pub fn save_state(&self, sn: &mut Snapshot) {
        for i in 0..4 {
            sn.define(
                &format!("Player{i}Color"),
                u32::from(self.color_lookup[usize::from(pcc::PLAYER_0) + i]),
            );
            sn.define(
                &format!("Playfield{i}Color"),
                u32::from(self.color_lookup[usize::from(pcc::PLAYFIELD_0) + i]),
            );
            sn.define(
                &format!("Player{i}Graphics"),
                u32::from(self.players[i].graphics),
            );
            sn.define(&format!("Player{i}Size"), u32::from(self.players[i].size));
            sn.define(&format!("Player{i}HPos"), u32::from(self.players[i].hpos));
            sn.define(&format!("Missile{i}HPos"), u32::from(self.missiles[i].hpos));
        }
        sn.define(
            "PlayfieldBackgroundColor",
            u32::from(self.color_lookup[usize::from(pcc::BACKGROUND)]),
        );
        let missile_graphics = (self.missiles[0].graphics >> 6)
            | (self.missiles[1].graphics >> 4)
            | (self.missiles[2].graphics >> 2)
            | self.missiles[3].graphics;
        sn.define("MissileGraphics", u32::from(missile_graphics));
        let missile_sizes = self.missiles[0].size
            | (self.missiles[1].size << 2)
            | (self.missiles[2].size << 4)
            | (self.missiles[3].size << 6);
        sn.define("MissileSizes", u32::from(missile_sizes));
        sn.define("Prior", u32::from(self.prior));
        sn.define("GraCtl", u32::from(self.gractl));
        sn.define("VDelay", u32::from(self.vert_delay));
        sn.define("Speaker", u32::from(self.speaker));
        sn.define("ChipGeneration", self.chip_generation as u32);
    }

    /// Re-apply a snapshot through the register write paths so every
    /// derived table is rebuilt. Collision registers are not stored.
    pub fn load_state(&mut self, sn: &Snapshot) {
        self.chip_generation = match sn.get_or("ChipGeneration", ChipGeneration::Gtia2 as u32) {
            0 => ChipGeneration::Ctia,
            1 => ChipGeneration::Gtia1,
            _ => ChipGeneration::Gtia2,
        };
        self.setup_artifacting();
        for i in 0..4 {
            self.write_player_color(i, sn.get_or(&format!("Player{i}Color"), 0) as u8);
            self.write_playfield_color(i, sn.get_or(&format!("Playfield{i}Color"), 0) as u8);
            self.players[i].reshape(sn.get_or(&format!("Player{i}Graphics"), 0) as u8);
            self.write_player_size(i, sn.get_or(&format!("Player{i}Size"), 0) as u8);
            self.write_player_hpos(i, sn.get_or(&format!("Player{i}HPos"), 0) as u8);
            self.write_missile_hpos(i, sn.get_or(&format!("Missile{i}HPos"), 0) as u8);
        }
        self.write_background_color(sn.get_or("PlayfieldBackgroundColor", 0) as u8);
        self.write_missile_graphics(sn.get_or("MissileGraphics", 0) as u8);
        self.write_missile_sizes(sn.get_or("MissileSizes", 0) as u8);
        let prior = sn.get_or("Prior", 0) as u8;
        self.update_priority_engine(prior);
        self.prior = prior;
        self.pick_mode_generator(prior);
        self.write_gractl(sn.get_or("GraCtl", 0) as u8);
        self.gractl_shadow = self.gractl;
        self.vert_delay = sn.get_or("VDelay", 0) as u8;
        self.speaker = sn.get_or("Speaker", 0) != 0;
        self.hit_clear();
    }
}
