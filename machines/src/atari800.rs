use serde::{Deserialize, Serialize};

use colleen_core::core::bus::{Bus, BusMaster, InterruptState};
use colleen_core::core::machine::{GuestFault, InputButton, Machine};
use colleen_core::core::timing::{CYCLES_PER_SCANLINE, CycleArbiter};
use colleen_core::cpu::HostCpu;
use colleen_core::device::antic::{
    Antic, AnticConfig, DISPLAY_HEIGHT, DISPLAY_START, DISPLAY_WIDTH, NTSC_TOTAL, PAL_TOTAL,
    WINDOW_HEIGHT,
};
use colleen_core::device::gtia::{Gtia, GtiaConfig, VideoStandard, palette};
use colleen_core::device::postprocessor::PostprocessorMode;
use colleen_core::display::{FrameSink, VideoSink};
use colleen_core::snapshot::Snapshot;

// ---------------------------------------------------------------------------
// Input button IDs
// ---------------------------------------------------------------------------
pub const INPUT_START: u8 = 0;
pub const INPUT_SELECT: u8 = 1;
pub const INPUT_OPTION: u8 = 2;
pub const INPUT_TRIGGER0: u8 = 3;
pub const INPUT_TRIGGER1: u8 = 4;
pub const INPUT_TRIGGER2: u8 = 5;
pub const INPUT_TRIGGER3: u8 = 6;
pub const INPUT_RESET_KEY: u8 = 7;

const ATARI_INPUT_MAP: &[InputButton] = &[
    InputButton { id: INPUT_START, name: "Start" },
    InputButton { id: INPUT_SELECT, name: "Select" },
    InputButton { id: INPUT_OPTION, name: "Option" },
    InputButton { id: INPUT_TRIGGER0, name: "Trigger 1" },
    InputButton { id: INPUT_TRIGGER1, name: "Trigger 2" },
    InputButton { id: INPUT_TRIGGER2, name: "Trigger 3" },
    InputButton { id: INPUT_TRIGGER3, name: "Trigger 4" },
    InputButton { id: INPUT_RESET_KEY, name: "Reset" },
];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Atari800Config {
    /// Video standard of the machine; the chips follow it.
    pub video: VideoStandard,
    /// Cycle at which a WSYNC halt releases the CPU.
    pub wsync_release_slot: usize,
    pub gtia: GtiaConfig,
}

impl Default for Atari800Config {
    fn default() -> Self {
        Self {
            video: VideoStandard::default(),
            wsync_release_slot: colleen_core::core::timing::WSYNC_RELEASE_SLOT,
            gtia: GtiaConfig::default(),
        }
    }
}

/// Per-line cycle accounting. Every scanline satisfies
/// `executed + stolen == 114`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineStats {
    pub executed: usize,
    pub stolen: usize,
}

/// The chip complement of the board: 64 KiB RAM, the display-list
/// controller, the merger and the cycle arbiter.
///
/// The CPU reads and writes through the [`Bus`] impl (which decodes the
/// chip register windows); the display chips fetch through their own raw
/// view of RAM.
pub struct Board {
    pub ram: Box<[u8; 0x10000]>,
    pub antic: Antic,
    pub gtia: Gtia,
    pub arbiter: CycleArbiter,
    cycle: usize,
    events: Vec<GuestFault>,
}

impl Board {
    pub fn new(config: &Atari800Config) -> Self {
        let mut gtia_config = config.gtia.clone();
        gtia_config.video = config.video;
        let antic_config = AnticConfig { video: config.video };
        let mut arbiter = CycleArbiter::new();
        arbiter.set_release_slot(config.wsync_release_slot);
        Self {
            ram: Box::new([0u8; 0x10000]),
            antic: Antic::new(&antic_config),
            gtia: Gtia::new(&gtia_config),
            arbiter,
            cycle: 0,
            events: Vec::new(),
        }
    }

    /// Run one complete scanline: display-list DMA and line construction,
    /// 114 interleaved merge/CPU cycles, then the handoff to the sink.
    pub fn run_scanline(&mut self, cpu: &mut dyn HostCpu, sink: &mut dyn VideoSink) -> LineStats {
        self.antic.start_scanline(&*self.ram, &mut self.arbiter);
        self.gtia.begin_scanline(&self.antic.line_handoff());

        let mut stats = LineStats::default();
        for cycle in 0..CYCLES_PER_SCANLINE {
            self.cycle = cycle;
            // Merge up to this cycle first: a register write during the
            // cycle is visible from the matching half-colour-clock on.
            self.gtia.advance_to(cycle);
            if self.antic.take_pending_nmi() {
                cpu.signal_nmi();
            }
            if self.arbiter.is_busy(cycle) {
                stats.stolen += 1;
            } else {
                cpu.execute_cycle(self);
                stats.executed += 1;
            }
        }

        self.gtia.finish_scanline(sink);
        self.antic.end_scanline();
        self.cycle = 0;
        stats
    }

    /// Queue a guest fault for the enclosing driver. Core state is not
    /// affected.
    pub fn report_guest_fault(&mut self, fault: GuestFault) {
        log::warn!("guest fault: {fault:?}");
        self.events.push(fault);
    }

    pub fn take_guest_faults(&mut self) -> Vec<GuestFault> {
        std::mem::take(&mut self.events)
    }

    pub fn current_cycle(&self) -> usize {
        self.cycle
    }
}

impl Bus for Board {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        match addr {
            // Merger registers, mirrored every 32 bytes.
            0xD000..=0xD0FF => self.gtia.read((addr & 0x1F) as u8),
            // Display-list controller, mirrored every 16 bytes.
            0xD400..=0xD4FF => self.antic.read((addr & 0x0F) as u8),
            // Chip space outside the graphics subsystem floats high.
            0xD100..=0xD3FF | 0xD500..=0xD7FF => 0xFF,
            _ => self.ram[addr as usize],
        }
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        match addr {
            0xD000..=0xD0FF => self.gtia.write((addr & 0x1F) as u8, data),
            0xD400..=0xD4FF => {
                let cycle = self.cycle;
                self.antic.write((addr & 0x0F) as u8, data, &mut self.arbiter, cycle);
            }
            0xD100..=0xD3FF | 0xD500..=0xD7FF => {}
            _ => self.ram[addr as usize] = data,
        }
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        self.arbiter.is_busy(self.cycle)
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState {
            nmi: self.antic.nmi_line(),
            irq: false,
        }
    }

    fn beam_position(&self) -> (u16, usize) {
        (self.antic.current_ypos(), self.cycle)
    }
}

/// Atari 800 class home computer, graphics subsystem only.
///
/// The CPU is pluggable: anything implementing [`HostCpu`] becomes the
/// bus master for the cycles the video DMA leaves free.
pub struct Atari800<C: HostCpu> {
    cpu: C,
    board: Board,
    sink: FrameSink,
    config: Atari800Config,
    console_keys: u8,
    last_line: LineStats,
}

impl<C: HostCpu> Atari800<C> {
    pub fn new(config: Atari800Config, cpu: C) -> Self {
        let true_color = config.gtia.postprocessing != PostprocessorMode::None;
        let sink = if true_color {
            FrameSink::new_true_color(DISPLAY_WIDTH, usize::from(DISPLAY_HEIGHT))
        } else {
            FrameSink::new(DISPLAY_WIDTH, usize::from(DISPLAY_HEIGHT))
        };
        Self {
            board: Board::new(&config),
            cpu,
            sink,
            config,
            console_keys: 0x0F,
            last_line: LineStats::default(),
        }
    }

    pub fn total_lines(&self) -> u16 {
        match self.config.video {
            VideoStandard::Ntsc => NTSC_TOTAL,
            VideoStandard::Pal => PAL_TOTAL,
        }
    }

    pub fn run_scanline(&mut self) -> LineStats {
        self.last_line = self.board.run_scanline(&mut self.cpu, &mut self.sink);
        self.last_line
    }

    pub fn last_line_stats(&self) -> LineStats {
        self.last_line
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    pub fn frame(&self) -> &FrameSink {
        &self.sink
    }

    pub fn save_state(&self) -> Snapshot {
        let mut sn = Snapshot::new();
        self.board.antic.save_state(&mut sn);
        self.board.gtia.save_state(&mut sn);
        sn
    }

    pub fn load_state(&mut self, sn: &Snapshot) {
        self.board.antic.load_state(sn);
        self.board.gtia.load_state(sn);
    }

    /// Warm reset: colour registers and the NMI enable mask survive.
    pub fn warm_reset(&mut self) {
        self.board.antic.warm_reset();
        self.board.gtia.warm_reset();
    }

    /// Power-on reset.
    pub fn cold_reset(&mut self) {
        self.board.antic.cold_reset();
        self.board.gtia.cold_reset();
        self.board.ram.fill(0);
        self.cpu.reset();
    }
}

impl<C: HostCpu> Machine for Atari800<C> {
    fn display_size(&self) -> (u32, u32) {
        (DISPLAY_WIDTH as u32, u32::from(WINDOW_HEIGHT))
    }

    fn run_frame(&mut self) {
        for _ in 0..self.total_lines() {
            self.run_scanline();
        }
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        let (width, height) = self.display_size();
        let w = width as usize;
        let map = self.board.gtia.color_map();

        for screen_y in 0..height as usize {
            let y = screen_y + usize::from(DISPLAY_START);
            for x in 0..w {
                let rgb = match self.sink.rgb_line(y) {
                    Some(line) => line[x],
                    None => map[usize::from(self.sink.line(y)[x])],
                };
                let off = (screen_y * w + x) * 3;
                buffer[off] = palette::red(rgb);
                buffer[off + 1] = palette::green(rgb);
                buffer[off + 2] = palette::blue(rgb);
            }
        }
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        match button {
            // Console keys are active-low.
            INPUT_START..=INPUT_OPTION => {
                let bit = 1u8 << button;
                if pressed {
                    self.console_keys &= !bit;
                } else {
                    self.console_keys |= bit;
                }
                self.board.gtia.set_console_keys(self.console_keys);
            }
            INPUT_TRIGGER0..=INPUT_TRIGGER3 => {
                self.board
                    .gtia
                    .set_trigger(usize::from(button - INPUT_TRIGGER0), pressed);
            }
            INPUT_RESET_KEY => {
                if pressed {
                    self.board.antic.raise_reset_key_nmi();
                }
            }
            _ => {}
        }
    }

    fn input_map(&self) -> &[InputButton] {
        ATARI_INPUT_MAP
    }

    fn reset(&mut self) {
        self.cold_reset();
    }
}
