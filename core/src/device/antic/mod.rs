//! Display-list DMA controller ("ANTIC")
//!
//! Fetches the display-list program, runs playfield and player/missile DMA
//! against its own view of memory, decodes mode lines into a buffer of
//! pre-computed colour indices and hands the finished scanline to the
//! colour/player-missile merger. Raises the display-list and vertical-blank
//! NMIs and steals the DMA cycles from the CPU through the arbiter.
//!
//! The pipeline is scanline oriented: playfield data is DMA'd into an
//! internal scanbuffer at the start of the mode line, each scan line is
//! decoded from that buffer, and the merger consumes the result while the
//! CPU runs the rest of the line's cycles.
//!
//! # Registers (offset & 0x0F)
//!
//! | Offset | Write  | Read   |
//! |--------|--------|--------|
//! | 0x00   | DMACTL | —      |
//! | 0x01   | CHACTL | —      |
//! | 0x02   | DLISTL | —      |
//! | 0x03   | DLISTH | —      |
//! | 0x04   | HSCROL | —      |
//! | 0x05   | VSCROL | —      |
//! | 0x07   | PMBASE | —      |
//! | 0x09   | CHBASE | —      |
//! | 0x0A   | WSYNC  | —      |
//! | 0x0B   | —      | VCOUNT |
//! | 0x0C   | —      | PENH   |
//! | 0x0D   | —      | PENV   |
//! | 0x0E   | NMIEN  | —      |
//! | 0x0F   | NMIRES | NMIST  |

pub mod dma;
pub mod modes;

use serde::{Deserialize, Serialize};

use crate::core::bus::AdrSpace;
use crate::core::timing::CycleArbiter;
use crate::device::gtia::{VideoStandard, pcc};
use crate::snapshot::Snapshot;
use self::dma::{
    DLIST_FETCH, DLIST_OPERAND_FETCH, MISSILE_FETCH, PLAYER_FETCH, PmDmaGenerator, REFRESH_COUNT,
    REFRESH_FIRST, REFRESH_STRIDE,
};
use self::modes::{CharacterGenerator, MODE_LINES, generate_mode_line};

/// Data fill-in is displaced by this many half-colour-clocks for
/// convenient horizontal scrolling.
pub const FILL_IN_OFFSET: usize = 32;
/// Additional scrolling slack for player/missile placement.
pub const PLAYER_MISSILE_OFFSET: usize = 64;
/// Generated width of a scanline in half-colour-clocks.
pub const DISPLAY_WIDTH: usize = 384;
/// Modulo from one buffered row to the next.
pub const DISPLAY_MODULO: usize = DISPLAY_WIDTH + FILL_IN_OFFSET + PLAYER_MISSILE_OFFSET;
/// First generated scan line.
pub const DISPLAY_START: u16 = 8;
/// Line at which the vertical blank begins.
pub const VBI_START: u16 = 248;
pub const DISPLAY_HEIGHT: u16 = 248;
pub const NTSC_TOTAL: u16 = 262;
pub const PAL_TOTAL: u16 = 312;
/// Lines visible in a window.
pub const WINDOW_HEIGHT: u16 = DISPLAY_HEIGHT - DISPLAY_START;
/// Half-colour-clocks visible in a window.
pub const WINDOW_WIDTH: usize = DISPLAY_WIDTH - 32;

// NMI status/enable bits
pub const NMI_DLI: u8 = 0x80;
pub const NMI_VBI: u8 = 0x40;
pub const NMI_RESET_KEY: u8 = 0x20;

// DMACTL bits
const DMACTL_WIDTH_MASK: u8 = 0x03;
const DMACTL_MISSILE_DMA: u8 = 0x04;
const DMACTL_PLAYER_DMA: u8 = 0x08;
const DMACTL_PM_HIRES: u8 = 0x10;
const DMACTL_DLIST_DMA: u8 = 0x20;

// CHACTL bits
const CHACTL_BLANK: u8 = 0x01;
const CHACTL_INVERT: u8 = 0x02;
const CHACTL_UPSIDE_DOWN: u8 = 0x04;

// Display-list opcode bits
const IR_MODE_MASK: u8 = 0x0F;
const IR_HSCROLL: u8 = 0x10;
const IR_VSCROLL: u8 = 0x20;
const IR_LOAD_SCAN: u8 = 0x40;
const IR_DLI: u8 = 0x80;
const IR_JUMP_WAIT_VBL: u8 = 0x40;

/// Playfield DMA window width from DMACTL bits 0-1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayfieldWidth {
    None,
    Narrow,
    Normal,
    Wide,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnticConfig {
    pub video: VideoStandard,
}

/// One finished scanline, handed by value to the merger.
pub struct ScanlineHandoff<'a> {
    /// Pre-computed colour indices of the display window.
    pub playfield: &'a [u8],
    /// Player 0-3 and missile DMA bytes fetched for this line.
    pub player_dma: [u8; 5],
    /// The line was produced by a hires (fiddled) mode.
    pub fiddling: bool,
    pub ypos: u16,
}

/// Display-list interpreter state, advanced once per scanline.
#[derive(Clone, Copy, Debug)]
enum DlState {
    /// Fetch the next instruction at the start of the coming line.
    Fetch,
    /// Inside a run of blank lines.
    Blank { lines: u8, dli: bool },
    /// Inside a mode line; the opcode is latched until the boundary.
    Mode { ir: u8, line: u8, count: u8 },
    /// A jump-and-wait instruction idles until the vertical blank.
    WaitVbl,
}

pub struct Antic {
    // Register file
    dlist_pc: u16,
    dlist_shadow: u16,
    pf_base: u16,
    pm_base: u8,
    ch_base: u8,
    dma_ctrl: u8,
    char_ctrl: u8,
    hscroll: u8,
    vscroll: u8,
    nmi_enable: u8,
    nmi_status: u8,
    light_pen_h: u8,
    light_pen_v: u8,

    nmi_pending: bool,
    ypos: u16,
    total_lines: u16,
    frame: u64,

    state: DlState,
    /// Instruction byte of the previous line, kept to recover mode
    /// parameters after mid-line register writes.
    prev_ir: u8,
    vscroll_active: bool,
    /// The playfield bytes of the current mode line still need fetching.
    scan_fetch_pending: bool,

    /// DMA'd playfield data of the active mode line.
    scan_buffer: [u8; 64],
    scan_bytes: usize,
    /// The constructed display line.
    line_buffer: [u8; DISPLAY_MODULO],
    player_dma: [u8; 5],
    fiddling_line: bool,

    char20: CharacterGenerator,
    char40: CharacterGenerator,
    pm_single: PmDmaGenerator,
    pm_double: PmDmaGenerator,
}

impl Antic {
    pub fn new(config: &AnticConfig) -> Self {
        let total_lines = match config.video {
            VideoStandard::Ntsc => NTSC_TOTAL,
            VideoStandard::Pal => PAL_TOTAL,
        };
        let mut antic = Self {
            dlist_pc: 0,
            dlist_shadow: 0,
            pf_base: 0,
            pm_base: 0,
            ch_base: 0,
            dma_ctrl: 0,
            char_ctrl: 0,
            hscroll: 0,
            vscroll: 0,
            nmi_enable: 0,
            nmi_status: 0,
            light_pen_h: 0,
            light_pen_v: 0,
            nmi_pending: false,
            ypos: 0,
            total_lines,
            frame: 0,
            state: DlState::Fetch,
            prev_ir: 0,
            vscroll_active: false,
            scan_fetch_pending: false,
            scan_buffer: [0; 64],
            scan_bytes: 0,
            line_buffer: [pcc::BACKGROUND; DISPLAY_MODULO],
            player_dma: [0; 5],
            fiddling_line: false,
            char20: CharacterGenerator::default(),
            char40: CharacterGenerator::default(),
            pm_single: PmDmaGenerator::single_line(0),
            pm_double: PmDmaGenerator::double_line(0),
        };
        antic.cold_reset();
        antic
    }

    /// Cold reset clears the full register file.
    pub fn cold_reset(&mut self) {
        self.warm_reset();
        self.nmi_enable = 0;
    }

    /// Warm reset; the NMI enable mask survives.
    pub fn warm_reset(&mut self) {
        self.dlist_pc = 0;
        self.dlist_shadow = 0;
        self.pf_base = 0;
        self.write_dmactl(0);
        self.write_chactl(0);
        self.write_chbase(0);
        self.write_pmbase(0);
        self.hscroll = 0;
        self.vscroll = 0;
        self.nmi_status = 0;
        self.nmi_pending = false;
        self.ypos = 0;
        self.frame = 0;
        self.state = DlState::Fetch;
        self.prev_ir = 0;
        self.vscroll_active = false;
        self.scan_fetch_pending = false;
        self.scan_bytes = 0;
        self.player_dma = [0; 5];
        self.fiddling_line = false;
    }

    // -----------------------------------------------------------------
    // Register file
    // -----------------------------------------------------------------

    pub fn read(&mut self, offset: u8) -> u8 {
        match offset & 0x0F {
            0x0B => (self.ypos >> 1) as u8,
            0x0C => self.light_pen_h,
            0x0D => self.light_pen_v,
            // Status in the top bits; the unused lines float high.
            0x0F => self.nmi_status | 0x1F,
            _ => 0xFF,
        }
    }

    /// Register write. WSYNC needs the arbiter and the current cycle to
    /// place the halt.
    pub fn write(&mut self, offset: u8, val: u8, arbiter: &mut CycleArbiter, cycle: usize) {
        match offset & 0x0F {
            0x00 => self.write_dmactl(val),
            0x01 => self.write_chactl(val),
            0x02 => {
                self.dlist_pc = (self.dlist_pc & 0xFF00) | u16::from(val);
                self.dlist_shadow = self.dlist_pc;
            }
            0x03 => {
                self.dlist_pc = (self.dlist_pc & 0x00FF) | (u16::from(val) << 8);
                self.dlist_shadow = self.dlist_pc;
            }
            0x04 => self.hscroll = val & 0x0F,
            0x05 => self.vscroll = val & 0x0F,
            0x07 => self.write_pmbase(val),
            0x09 => self.write_chbase(val),
            0x0A => arbiter.wsync_strobe(cycle),
            0x0E => self.nmi_enable = val & 0xE0,
            0x0F => self.nmi_status = 0,
            _ => {}
        }
    }

    fn write_dmactl(&mut self, val: u8) {
        self.dma_ctrl = val;
    }

    fn write_chactl(&mut self, val: u8) {
        self.char_ctrl = val;
        for chargen in [&mut self.char20, &mut self.char40] {
            chargen.blank_mask = if val & CHACTL_BLANK != 0 { 0x80 } else { 0 };
            chargen.invert_mask = if val & CHACTL_INVERT != 0 { 0x80 } else { 0 };
            chargen.upside_down = if val & CHACTL_UPSIDE_DOWN != 0 { 7 } else { 0 };
        }
    }

    fn write_chbase(&mut self, val: u8) {
        self.ch_base = val;
        // The 40-char modes ignore one more base bit than the 20-char
        // modes.
        self.char40.base = u16::from(val & 0xFC) << 8;
        self.char20.base = u16::from(val & 0xFE) << 8;
    }

    fn write_pmbase(&mut self, val: u8) {
        self.pm_base = val;
        self.pm_single = PmDmaGenerator::single_line(val);
        self.pm_double = PmDmaGenerator::double_line(val);
    }

    // -----------------------------------------------------------------
    // NMI generation
    // -----------------------------------------------------------------

    fn raise_nmi(&mut self, source: u8) {
        self.nmi_status |= source;
        if self.nmi_enable & source != 0 {
            self.nmi_pending = true;
        }
    }

    /// The reset-key NMI, wired on the models with the console key line.
    pub fn raise_reset_key_nmi(&mut self) {
        self.raise_nmi(NMI_RESET_KEY);
    }

    /// Consume the pending NMI edge for delivery to the CPU.
    pub fn take_pending_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    pub fn nmi_line(&self) -> bool {
        self.nmi_pending
    }

    // -----------------------------------------------------------------
    // Scanline pipeline
    // -----------------------------------------------------------------

    pub fn current_ypos(&self) -> u16 {
        self.ypos
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Top of the display list, for the debugger.
    pub fn display_list(&self) -> u16 {
        self.dlist_shadow
    }

    /// The most recently fetched display-list instruction byte, kept so
    /// mode parameters can be recovered after mid-line register writes.
    pub fn previous_instruction(&self) -> u8 {
        self.prev_ir
    }

    pub fn set_light_pen(&mut self, h: u8, v: u8) {
        self.light_pen_h = h;
        self.light_pen_v = v;
    }

    /// Begin a scanline: reset the cycle mask, reserve refresh and DMA
    /// slots, advance the display list and build the line buffer.
    pub fn start_scanline(&mut self, ram: &dyn AdrSpace, arbiter: &mut CycleArbiter) {
        arbiter.begin_line();
        for k in 0..REFRESH_COUNT {
            arbiter.reserve_refresh(REFRESH_FIRST + k * REFRESH_STRIDE);
        }

        if self.ypos == VBI_START {
            self.raise_nmi(NMI_VBI);
            if matches!(self.state, DlState::WaitVbl) {
                self.state = DlState::Fetch;
            }
        }

        self.line_buffer.fill(pcc::BACKGROUND);
        self.fiddling_line = false;

        if self.ypos >= DISPLAY_START && self.ypos < VBI_START {
            self.fetch_player_missiles(ram, arbiter);
            if self.dma_ctrl & DMACTL_DLIST_DMA != 0 {
                self.run_display_list(ram, arbiter);
            }
        }
    }

    /// The finished line for the merger. Valid between `start_scanline`
    /// and `end_scanline`.
    pub fn line_handoff(&self) -> ScanlineHandoff<'_> {
        ScanlineHandoff {
            playfield: &self.line_buffer[FILL_IN_OFFSET..FILL_IN_OFFSET + DISPLAY_WIDTH],
            player_dma: self.player_dma,
            fiddling: self.fiddling_line,
            ypos: self.ypos,
        }
    }

    /// Close the scanline: bump the vertical counter.
    pub fn end_scanline(&mut self) {
        self.ypos += 1;
        if self.ypos >= self.total_lines {
            self.ypos = 0;
            self.frame += 1;
        }
    }

    fn playfield_width(&self) -> PlayfieldWidth {
        match self.dma_ctrl & DMACTL_WIDTH_MASK {
            0 => PlayfieldWidth::None,
            1 => PlayfieldWidth::Narrow,
            2 => PlayfieldWidth::Normal,
            _ => PlayfieldWidth::Wide,
        }
    }

    fn bump_dlist_pc(&mut self) {
        // The display-list counter carries within its 1 KiB page.
        self.dlist_pc = (self.dlist_pc & 0xFC00) | (self.dlist_pc.wrapping_add(1) & 0x03FF);
    }

    fn bump_scan_pointer(&mut self) {
        // The memory scan counter carries within a 4 KiB block.
        self.pf_base = (self.pf_base & 0xF000) | (self.pf_base.wrapping_add(1) & 0x0FFF);
    }

    fn run_display_list(&mut self, ram: &dyn AdrSpace, arbiter: &mut CycleArbiter) {
        if matches!(self.state, DlState::Fetch) {
            self.fetch_instruction(ram, arbiter);
        }

        match self.state {
            DlState::Blank { lines, dli } => {
                if lines <= 1 {
                    if dli {
                        self.raise_nmi(NMI_DLI);
                    }
                    self.state = DlState::Fetch;
                } else {
                    self.state = DlState::Blank { lines: lines - 1, dli };
                }
            }
            DlState::Mode { ir, line, count } => {
                self.render_mode_line(ram, arbiter, ir, line);
                if line + 1 >= count {
                    if ir & IR_DLI != 0 {
                        self.raise_nmi(NMI_DLI);
                    }
                    self.state = DlState::Fetch;
                } else {
                    self.state = DlState::Mode { ir, line: line + 1, count };
                }
            }
            DlState::Fetch | DlState::WaitVbl => {}
        }
    }

    /// Fetch and decode the next display-list instruction.
    fn fetch_instruction(&mut self, ram: &dyn AdrSpace, arbiter: &mut CycleArbiter) {
        arbiter.reserve(DLIST_FETCH.first, DLIST_FETCH.count);
        let ir = ram.read(self.dlist_pc);
        self.bump_dlist_pc();
        self.prev_ir = ir;

        match ir & IR_MODE_MASK {
            0x00 => {
                // Blank lines, count in bits 4-6.
                self.state = DlState::Blank {
                    lines: ((ir >> 4) & 0x07) + 1,
                    dli: ir & IR_DLI != 0,
                };
            }
            0x01 => {
                arbiter.reserve(DLIST_OPERAND_FETCH.first, DLIST_OPERAND_FETCH.count);
                let lo = ram.read(self.dlist_pc);
                self.bump_dlist_pc();
                let hi = ram.read(self.dlist_pc);
                self.dlist_pc = u16::from_le_bytes([lo, hi]);
                self.dlist_shadow = self.dlist_pc;
                if ir & IR_JUMP_WAIT_VBL != 0 {
                    if ir & IR_DLI != 0 {
                        self.raise_nmi(NMI_DLI);
                    }
                    self.state = DlState::WaitVbl;
                } else {
                    // A plain jump spends its line blank.
                    self.state = DlState::Blank {
                        lines: 1,
                        dli: ir & IR_DLI != 0,
                    };
                }
            }
            mode => {
                if ir & IR_LOAD_SCAN != 0 {
                    arbiter.reserve(DLIST_OPERAND_FETCH.first, DLIST_OPERAND_FETCH.count);
                    let lo = ram.read(self.dlist_pc);
                    self.bump_dlist_pc();
                    let hi = ram.read(self.dlist_pc);
                    self.bump_dlist_pc();
                    self.pf_base = u16::from_le_bytes([lo, hi]);
                }

                let desc = MODE_LINES[usize::from(mode)];
                let mut count = desc.scan_lines;
                let mut first = 0;
                let vs = ir & IR_VSCROLL != 0;
                // Vertical scrolling stretches the region boundaries: the
                // entering mode line starts at VSCROL, the leaving one
                // ends there.
                if vs && !self.vscroll_active {
                    first = self.vscroll;
                } else if !vs && self.vscroll_active {
                    count = self.vscroll + 1;
                }
                self.vscroll_active = vs;
                if first >= count {
                    first = count - 1;
                }
                self.scan_fetch_pending = true;
                self.state = DlState::Mode { ir, line: first, count };
            }
        }
    }

    fn fetch_player_missiles(&mut self, ram: &dyn AdrSpace, arbiter: &mut CycleArbiter) {
        let pm = if self.dma_ctrl & DMACTL_PM_HIRES != 0 {
            self.pm_single
        } else {
            self.pm_double
        };
        let missiles = self.dma_ctrl & DMACTL_MISSILE_DMA != 0;
        let players = self.dma_ctrl & DMACTL_PLAYER_DMA != 0;
        // Missile DMA runs whenever any player/missile DMA is on.
        if missiles || players {
            arbiter.reserve(MISSILE_FETCH.first, MISSILE_FETCH.count);
            self.player_dma[4] = ram.read(pm.missile_addr(self.ypos));
        }
        if players {
            arbiter.reserve(PLAYER_FETCH.first, PLAYER_FETCH.count);
            for p in 0..4 {
                self.player_dma[p] = ram.read(pm.player_addr(p, self.ypos));
            }
        }
    }

    /// Build one scan line of the active mode line into the line buffer.
    fn render_mode_line(&mut self, ram: &dyn AdrSpace, arbiter: &mut CycleArbiter, ir: u8, line: u8) {
        let mode = ir & IR_MODE_MASK;
        let desc = MODE_LINES[usize::from(mode)];
        let width = self.playfield_width();
        let scrolled = ir & IR_HSCROLL != 0;

        let Some(borders) = dma::generator(width, desc.shift) else {
            return; // playfield DMA off: the line stays background
        };
        let fetch = if scrolled {
            dma::scrolled_generator(width, desc.shift).unwrap_or(borders)
        } else {
            borders
        };

        // Playfield bytes are fetched on the first displayed sub-line and
        // reused for the rest of the mode line.
        if self.scan_fetch_pending {
            self.scan_fetch_pending = false;
            fetch.reserve_playfield(arbiter);
            self.scan_bytes = fetch.bytes.min(self.scan_buffer.len());
            for k in 0..self.scan_bytes {
                self.scan_buffer[k] = ram.read(self.pf_base);
                self.bump_scan_pointer();
            }
        }
        // Character modes fetch glyph data on every sub-line.
        if desc.char_mode {
            fetch.reserve_character(arbiter);
        }

        let mut strip = [pcc::BACKGROUND; DISPLAY_WIDTH];
        let strip_len = fetch.bytes * fetch.hcc_per_byte();
        let chargen = if desc.shift == 3 {
            &self.char40
        } else {
            &self.char20
        };
        generate_mode_line(
            mode,
            &self.scan_buffer[..self.scan_bytes.min(fetch.bytes)],
            ram,
            chargen,
            line,
            &mut strip[..strip_len],
        );

        // Place the strip, clipped to the unscrolled borders. The scroll
        // register sweeps the scrolled data one half-colour-clock per
        // step towards the left.
        let start = if scrolled {
            fetch.start_hcc + 16 - i32::from(self.hscroll)
        } else {
            fetch.start_hcc
        };
        let clip_lo = borders.start_hcc;
        let clip_hi = borders.start_hcc + borders.width_hcc as i32;
        for (k, &color) in strip[..strip_len].iter().enumerate() {
            let x = start + k as i32;
            if x >= clip_lo && x < clip_hi {
                self.line_buffer[(FILL_IN_OFFSET as i32 + x) as usize] = color;
            }
        }
        self.fiddling_line = desc.fiddling;
    }

    // -----------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------

    pub fn save_state(&self, sn: &mut Snapshot) {
        sn.define("DListPC", u32::from(self.dlist_pc));
        sn.define("DMACtrl", u32::from(self.dma_ctrl));
        sn.define("CharCtrl", u32::from(self.char_ctrl));
        sn.define("CharBase", u32::from(self.ch_base));
        sn.define("PMBase", u32::from(self.pm_base));
        sn.define("HScroll", u32::from(self.hscroll));
        sn.define("VScroll", u32::from(self.vscroll));
        sn.define("NMIEnable", u32::from(self.nmi_enable));
    }

    pub fn load_state(&mut self, sn: &Snapshot) {
        self.dlist_pc = sn.get_or("DListPC", 0) as u16;
        self.dlist_shadow = self.dlist_pc;
        self.write_dmactl(sn.get_or("DMACtrl", 0) as u8);
        self.write_chactl(sn.get_or("CharCtrl", 0) as u8);
        self.write_chbase(sn.get_or("CharBase", 0) as u8);
        self.write_pmbase(sn.get_or("PMBase", 0) as u8);
        self.hscroll = sn.get_or("HScroll", 0) as u8 & 0x0F;
        self.vscroll = sn.get_or("VScroll", 0) as u8 & 0x0F;
        self.nmi_enable = sn.get_or("NMIEnable", 0) as u8 & 0xE0;
    }
}
