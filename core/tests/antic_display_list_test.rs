use colleen_core::core::timing::CycleArbiter;
use colleen_core::device::antic::{
    Antic, AnticConfig, DISPLAY_START, DISPLAY_WIDTH, FILL_IN_OFFSET, NMI_DLI, NMI_RESET_KEY,
    NMI_VBI, NTSC_TOTAL, VBI_START,
};
use colleen_core::device::gtia::{VideoStandard, pcc};


fn ntsc_antic() -> Antic {
    Antic::new(&AnticConfig {
        video: VideoStandard::Ntsc,
    })
}

fn ram_64k() -> Box<[u8; 0x10000]> {
    Box::new([0u8; 0x10000])
}

/// Write a register outside the scanline loop (cycle 0).
fn poke(antic: &mut Antic, arbiter: &mut CycleArbiter, offset: u8, val: u8) {
    antic.write(offset, val, arbiter, 0);
}

/// Run one scanline and return (playfield window, stolen cycle count).
fn run_line(antic: &mut Antic, ram: &[u8; 0x10000], arbiter: &mut CycleArbiter) -> (Vec<u8>, usize) {
    antic.start_scanline(ram, arbiter);
    let line = antic.line_handoff().playfield.to_vec();
    let stolen = arbiter.stolen_count();
    antic.end_scanline();
    (line, stolen)
}

/// Install a display list at 0x1000 and a basic register setup: display
/// list DMA on, normal playfield width.
fn setup(antic: &mut Antic, arbiter: &mut CycleArbiter, ram: &mut [u8; 0x10000], dlist: &[u8]) {
    ram[0x1000..0x1000 + dlist.len()].copy_from_slice(dlist);
    poke(antic, arbiter, 0x02, 0x00); // DLISTL
    poke(antic, arbiter, 0x03, 0x10); // DLISTH
    poke(antic, arbiter, 0x00, 0x22); // DMACTL: dlist + normal width
}

// ===== Blank display list =====

#[test]
fn test_blank_display_list_stays_background() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();
    let mut ram = ram_64k();

    // 29 x 8 blank lines, then jump-and-wait back to the start of the
    // list; the wait idles out the rest of the display.
    let mut dlist = vec![0x70u8; 29];
    dlist.extend_from_slice(&[0x41, 0x00, 0x10]);
    setup(&mut antic, &mut arbiter, &mut ram, &dlist);

    for _ in 0..NTSC_TOTAL {
        let (line, _) = run_line(&mut antic, &ram, &mut arbiter);
        assert!(
            line.iter().all(|&c| c == pcc::BACKGROUND),
            "blank display must stay background"
        );
    }
}

#[test]
fn test_vertical_blank_nmi_once_per_frame() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();
    let mut ram = ram_64k();

    let mut dlist = vec![0x70u8; 29];
    dlist.extend_from_slice(&[0x41, 0x00, 0x10]);
    setup(&mut antic, &mut arbiter, &mut ram, &dlist);
    poke(&mut antic, &mut arbiter, 0x0E, NMI_VBI);

    let mut nmis = 0;
    for _ in 0..u32::from(NTSC_TOTAL) * 3 {
        antic.start_scanline(&*ram, &mut arbiter);
        if antic.take_pending_nmi() {
            nmis += 1;
        }
        antic.end_scanline();
    }
    assert_eq!(nmis, 3, "one vertical blank per frame");
}

// ===== Jump and wait-for-vertical-blank =====

#[test]
fn test_wait_vbl_consumes_no_playfield_cycles() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();
    let mut ram = ram_64k();

    // One mode line, then wait for vertical blank.
    setup(
        &mut antic,
        &mut arbiter,
        &mut ram,
        &[0x42, 0x00, 0x20, 0x41, 0x00, 0x10],
    );

    // Skip the off-screen lines.
    for _ in 0..DISPLAY_START {
        run_line(&mut antic, &ram, &mut arbiter);
    }
    // The mode line runs its 8 sub-lines (plus its jump line), then the
    // wait begins.
    for _ in 0..9 {
        run_line(&mut antic, &ram, &mut arbiter);
    }
    let (line, stolen) = run_line(&mut antic, &ram, &mut arbiter);
    assert!(line.iter().all(|&c| c == pcc::BACKGROUND));
    // Memory refresh is the only DMA left during the wait.
    assert!(stolen <= 9, "waiting line stole {stolen} cycles");
}

#[test]
fn test_wait_vbl_resumes_after_vertical_blank() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();
    let mut ram = ram_64k();

    // Mode F line of solid pixels, then wait-and-jump back.
    ram[0x2000..0x2000 + 40].fill(0xFF);
    setup(
        &mut antic,
        &mut arbiter,
        &mut ram,
        &[0x4F, 0x00, 0x20, 0x41, 0x00, 0x10],
    );

    let mut mode_lines_per_frame = [0u32; 2];
    for frame in 0..2 {
        for _ in 0..NTSC_TOTAL {
            let (line, _) = run_line(&mut antic, &ram, &mut arbiter);
            if line.iter().any(|&c| c != pcc::BACKGROUND) {
                mode_lines_per_frame[frame] += 1;
            }
        }
    }
    assert_eq!(mode_lines_per_frame, [1, 1], "one mode line each frame");
}

// ===== Load memory scan =====

#[test]
fn test_load_memory_scan_sets_playfield_base() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();
    let mut ram = ram_64k();

    // Mode F with LMS pointing at 0x3400; pixel data there, none at zero.
    ram[0x3400..0x3400 + 40].fill(0xFF);
    setup(
        &mut antic,
        &mut arbiter,
        &mut ram,
        &[0x4F, 0x00, 0x34, 0x41, 0x00, 0x10],
    );

    for _ in 0..DISPLAY_START {
        run_line(&mut antic, &ram, &mut arbiter);
    }
    let (line, _) = run_line(&mut antic, &ram, &mut arbiter);
    // Normal width: 320 half-colour-clocks centred in the window.
    assert_eq!(line[32], pcc::PLAYFIELD_1_FIDDLED);
    assert_eq!(line[351], pcc::PLAYFIELD_1_FIDDLED);
    assert_eq!(line[0], pcc::BACKGROUND);
    assert_eq!(line[352], pcc::BACKGROUND);
}

// ===== Display-list interrupts =====

#[test]
fn test_dli_raised_on_last_sub_line() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();
    let mut ram = ram_64k();

    // Mode 2 with the interrupt bit, then wait.
    setup(
        &mut antic,
        &mut arbiter,
        &mut ram,
        &[0xC2, 0x00, 0x20, 0x41, 0x00, 0x10],
    );
    poke(&mut antic, &mut arbiter, 0x0E, NMI_DLI);

    let mut dli_lines = Vec::new();
    for _ in 0..NTSC_TOTAL {
        antic.start_scanline(&*ram, &mut arbiter);
        if antic.take_pending_nmi() {
            dli_lines.push(antic.current_ypos());
        }
        antic.end_scanline();
    }
    // Mode 2 occupies lines 8..16; the interrupt fires on its last
    // sub-line.
    assert_eq!(dli_lines, vec![DISPLAY_START + 7]);
}

#[test]
fn test_dli_requires_enable_bit() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();
    let mut ram = ram_64k();

    setup(
        &mut antic,
        &mut arbiter,
        &mut ram,
        &[0xC2, 0x00, 0x20, 0x41, 0x00, 0x10],
    );

    let mut fired = false;
    for _ in 0..NTSC_TOTAL {
        antic.start_scanline(&*ram, &mut arbiter);
        fired |= antic.take_pending_nmi();
        antic.end_scanline();
    }
    assert!(!fired, "masked interrupts must not reach the CPU");
    // The status bit is latched regardless.
    assert_ne!(antic.read(0x0F) & NMI_DLI, 0);
}

// ===== NMI status handling =====

#[test]
fn test_nmi_status_cleared_only_by_reset_register() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();

    antic.raise_reset_key_nmi();
    assert_ne!(antic.read(0x0F) & NMI_RESET_KEY, 0);
    // Reading does not clear.
    assert_ne!(antic.read(0x0F) & NMI_RESET_KEY, 0);

    poke(&mut antic, &mut arbiter, 0x0F, 0x00); // NMIRES
    assert_eq!(antic.read(0x0F) & 0xE0, 0);
}

#[test]
fn test_vcount_tracks_ypos() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();
    let ram = ram_64k();

    assert_eq!(antic.read(0x0B), 0);
    for _ in 0..100 {
        run_line(&mut antic, &ram, &mut arbiter);
    }
    assert_eq!(antic.read(0x0B), 50);
}

// ===== DMA accounting =====

#[test]
fn test_mode_line_steals_playfield_cycles() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();
    let mut ram = ram_64k();

    setup(
        &mut antic,
        &mut arbiter,
        &mut ram,
        &[0x42, 0x00, 0x20, 0x41, 0x00, 0x10],
    );

    for _ in 0..DISPLAY_START {
        run_line(&mut antic, &ram, &mut arbiter);
    }
    // First sub-line: instruction + scan pointer + 40 name + 40 glyph
    // fetches; refresh finds no free slack inside the fetch window.
    let (_, first) = run_line(&mut antic, &ram, &mut arbiter);
    // Later sub-lines fetch glyphs only.
    let (_, later) = run_line(&mut antic, &ram, &mut arbiter);
    assert!(first > later, "name fetches happen once per mode line");
    assert!(first >= 80, "hires text line steals most of the bus");
    assert!(later >= 40);
}

#[test]
fn test_player_missile_dma_slots() {
    let mut antic = ntsc_antic();
    let mut arbiter = CycleArbiter::new();
    let mut ram = ram_64k();

    let mut dlist = vec![0x70u8; 29];
    dlist.extend_from_slice(&[0x41, 0x00, 0x10]);
    setup(&mut antic, &mut arbiter, &mut ram, &dlist);
    poke(&mut antic, &mut arbiter, 0x07, 0x20); // PMBASE
    poke(&mut antic, &mut arbiter, 0x00, 0x2E); // + missile and player DMA

    for _ in 0..DISPLAY_START {
        run_line(&mut antic, &ram, &mut arbiter);
    }
    antic.start_scanline(&*ram, &mut arbiter);
    assert!(arbiter.is_busy(0), "missile fetch at cycle 0");
    for cycle in 2..6 {
        assert!(arbiter.is_busy(cycle), "player fetch at cycle {cycle}");
    }
    antic.end_scanline();
}

#[test]
fn test_playfield_window_placement() {
    for (width_bits, lo, hi) in [(0x01u8, 64usize, 320usize), (0x02, 32, 352), (0x03, 0, 384)] {
        let mut antic = ntsc_antic();
        let mut arbiter = CycleArbiter::new();
        let mut ram = ram_64k();

        ram[0x2000..0x2000 + 48].fill(0xFF);
        setup(
            &mut antic,
            &mut arbiter,
            &mut ram,
            &[0x4F, 0x00, 0x20, 0x41, 0x00, 0x10],
        );
        poke(&mut antic, &mut arbiter, 0x00, 0x20 | width_bits);

        for _ in 0..DISPLAY_START {
            run_line(&mut antic, &ram, &mut arbiter);
        }
        let (line, _) = run_line(&mut antic, &ram, &mut arbiter);
        for x in 0..DISPLAY_WIDTH {
            let expected = if x >= lo && x < hi {
                pcc::PLAYFIELD_1_FIDDLED
            } else {
                pcc::BACKGROUND
            };
            assert_eq!(line[x], expected, "width {width_bits:#x} at x={x}");
        }
    }
}

#[test]
fn test_fill_in_offset_constant() {
    // The line buffer keeps 32 half-colour-clocks of scroll padding ahead
    // of the display window.
    assert_eq!(FILL_IN_OFFSET, 32);
}

#[test]
fn test_vbi_start_position() {
    assert_eq!(VBI_START, 248);
}
