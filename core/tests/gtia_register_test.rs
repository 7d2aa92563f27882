use colleen_core::device::antic::ScanlineHandoff;
use colleen_core::device::gtia::{ChipGeneration, CollisionReport, Gtia, GtiaConfig, pcc};

mod common;
use common::{flat_playfield, merge_line};

// ===== Colour registers =====

#[test]
fn test_playfield_colors_mask_bit_zero() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x16, 0x35); // COLPF0 with bit 0 set
    gtia.write(0x1A, 0x77); // COLBK with bit 0 set

    let pf = merge_line(&mut gtia, &flat_playfield(pcc::PLAYFIELD_0), false, 50, [0; 5], &[]);
    assert_eq!(pf[100], 0x34, "playfield colour drops bit 0");

    let bk = merge_line(&mut gtia, &flat_playfield(pcc::BACKGROUND), false, 50, [0; 5], &[]);
    assert_eq!(bk[100], 0x76, "background colour drops bit 0");
}

#[test]
fn test_fiddled_slot_combines_pf1_value_with_pf2_hue() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x17, 0x3C); // COLPF1: value 0xC
    gtia.write(0x18, 0x52); // COLPF2: hue 0x5

    let line = merge_line(
        &mut gtia,
        &flat_playfield(pcc::PLAYFIELD_1_FIDDLED),
        true,
        50,
        [0; 5],
        &[],
    );
    assert_eq!(line[100], 0x5C);

    // Updating either register refreshes the mix.
    gtia.write(0x18, 0x92);
    let line = merge_line(
        &mut gtia,
        &flat_playfield(pcc::PLAYFIELD_1_FIDDLED),
        true,
        50,
        [0; 5],
        &[],
    );
    assert_eq!(line[100], 0x9C);
}

// ===== Collisions =====

fn gtia_with_player_over(playfield_index: u8) -> Gtia {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x0D, 0xFF); // GRAFP0
    gtia.write(0x00, 0x50); // HPOSP0
    merge_line(
        &mut gtia,
        &flat_playfield(playfield_index),
        false,
        50,
        [0; 5],
        &[],
    );
    gtia
}

#[test]
fn test_player_playfield_collision_bits() {
    for (index, bit) in [
        (pcc::PLAYFIELD_0, 0x01u8),
        (pcc::PLAYFIELD_1, 0x02),
        (pcc::PLAYFIELD_2, 0x04),
        (pcc::PLAYFIELD_3, 0x08),
    ] {
        let mut gtia = gtia_with_player_over(index);
        assert_eq!(gtia.read(0x04), bit, "playfield index {index}");
    }
}

#[test]
fn test_background_never_collides() {
    let mut gtia = gtia_with_player_over(pcc::BACKGROUND);
    assert_eq!(gtia.read(0x04), 0);
}

#[test]
fn test_player_player_collision_masks_self() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x0D, 0xFF);
    gtia.write(0x0E, 0xFF);
    gtia.write(0x00, 0x50);
    gtia.write(0x01, 0x50); // player 1 on top of player 0

    merge_line(&mut gtia, &flat_playfield(pcc::BACKGROUND), false, 50, [0; 5], &[]);

    assert_eq!(gtia.read(0x0C), 0x02, "player 0 sees player 1 only");
    assert_eq!(gtia.read(0x0D), 0x01, "player 1 sees player 0 only");
}

#[test]
fn test_missile_player_collision() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x0D, 0xFF);
    gtia.write(0x00, 0x50);
    gtia.write(0x11, 0x03); // missile 0
    gtia.write(0x04, 0x52); // inside the player

    merge_line(&mut gtia, &flat_playfield(pcc::BACKGROUND), false, 50, [0; 5], &[]);

    assert_eq!(gtia.read(0x08) & 0x01, 0x01, "missile 0 hits player 0");
    assert_eq!(gtia.read(0x0C) & 0x01, 0, "players do not record missiles");
}

#[test]
fn test_hit_clear_strobe() {
    let mut gtia = gtia_with_player_over(pcc::PLAYFIELD_2);
    assert_ne!(gtia.read(0x04), 0);
    gtia.write(0x1E, 0x00); // HITCLR
    assert_eq!(gtia.read(0x04), 0);
    assert_eq!(gtia.read(0x0C), 0);
}

#[test]
fn test_collision_reporting_masks() {
    let mut gtia = Gtia::new(&GtiaConfig {
        playfield_collisions: [CollisionReport::None; 4],
        ..GtiaConfig::default()
    });
    gtia.write(0x0D, 0xFF);
    gtia.write(0x00, 0x50);
    merge_line(&mut gtia, &flat_playfield(pcc::PLAYFIELD_2), false, 50, [0; 5], &[]);

    assert_eq!(gtia.read(0x04), 0, "reporting disabled by configuration");
}

#[test]
fn test_offscreen_object_never_collides() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x0D, 0xFF);
    gtia.write(0x00, 0x00); // decoded position far left of the border

    merge_line(&mut gtia, &flat_playfield(pcc::PLAYFIELD_2), false, 50, [0; 5], &[]);

    assert_eq!(gtia.read(0x04), 0);
    assert!(gtia.overlay_line().iter().all(|&b| b == 0));
}

// ===== Vertical delay =====

fn begin_with_dma(gtia: &mut Gtia, ypos: u16, player_dma: [u8; 5]) {
    let playfield = flat_playfield(pcc::BACKGROUND);
    let handoff = ScanlineHandoff {
        playfield: &playfield[..],
        player_dma,
        fiddling: false,
        ypos,
    };
    gtia.begin_scanline(&handoff);
}

#[test]
fn test_vertical_delay_gates_dma_reload_to_odd_lines() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x1D, 0x02); // GRACTL: receive player DMA
    gtia.write(0x00, 0x50); // position player 0 on screen
    gtia.write(0x1C, 0x10); // VDELAY: player 0 delayed

    // Even line: the reload is suppressed, the shifter keeps its old
    // (empty) graphics.
    begin_with_dma(&mut gtia, 50, [0xFF, 0, 0, 0, 0]);
    assert!(gtia.overlay_line().iter().all(|&b| b & 0x01 == 0));

    // Odd line: the reload happens.
    begin_with_dma(&mut gtia, 51, [0xFF, 0, 0, 0, 0]);
    assert!(gtia.overlay_line().iter().any(|&b| b & 0x01 != 0));
}

#[test]
fn test_dma_reload_requires_gractl() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x00, 0x50);

    begin_with_dma(&mut gtia, 51, [0xFF, 0, 0, 0, 0]);
    assert!(
        gtia.overlay_line().iter().all(|&b| b == 0),
        "without GRACTL the DMA byte is ignored"
    );
}

#[test]
fn test_missile_dma_unpacks_two_bit_fields() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x1D, 0x01); // GRACTL: receive missile DMA
    gtia.write(0x04, 0x40); // missile 0 at decoded 64
    gtia.write(0x05, 0x50); // missile 1 at decoded 96

    // Missile byte: bits 0-1 missile 0, bits 2-3 missile 1.
    begin_with_dma(&mut gtia, 51, [0, 0, 0, 0, 0b0000_0111]);

    let overlay = gtia.overlay_line();
    assert_ne!(overlay[64] & 0x10, 0, "missile 0 shows both bits");
    assert_ne!(overlay[66] & 0x10, 0);
    // Missile 1 got only its low field bit: the right half of the shape.
    assert_eq!(overlay[96] & 0x20, 0);
    assert_ne!(overlay[98] & 0x20, 0);
}

// ===== Triggers, console, flags =====

#[test]
fn test_trigger_reads_negative_logic() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    assert_eq!(gtia.read(0x10), 1);
    gtia.set_trigger(0, true);
    assert_eq!(gtia.read(0x10), 0);
    gtia.set_trigger(0, false);
    assert_eq!(gtia.read(0x10), 1);
}

#[test]
fn test_trigger_latch() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x1D, 0x04); // GRACTL: latch triggers
    gtia.set_trigger(0, true);
    gtia.set_trigger(0, false);
    assert_eq!(gtia.read(0x10), 0, "latched low after a press");

    gtia.write(0x1D, 0x00); // unlatch
    assert_eq!(gtia.read(0x10), 1);
}

#[test]
fn test_console_register() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    assert!(!gtia.speaker());
    gtia.write(0x1F, 0x00); // speaker bit low = on
    assert!(gtia.speaker());
    gtia.write(0x1F, 0x08);
    assert!(!gtia.speaker());

    gtia.set_console_keys(0x0D); // one key down (active low)
    assert_eq!(gtia.read(0x1F), 0x0D);
    // The keypad select output pulls further lines low.
    gtia.write(0x1F, 0x08 | 0x05);
    assert_eq!(gtia.read(0x1F), 0x08);
}

#[test]
fn test_pal_flag_read() {
    let mut pal = Gtia::new(&GtiaConfig::default());
    assert_eq!(pal.read(0x14), 0x01);

    let mut ntsc = Gtia::new(&GtiaConfig {
        video: colleen_core::device::gtia::VideoStandard::Ntsc,
        ..GtiaConfig::default()
    });
    assert_eq!(ntsc.read(0x14), 0x0F);
}

#[test]
fn test_unmapped_reads_by_generation() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    assert_eq!(gtia.read(0x15), 0x0F, "later generations pull the top nibble low");

    let mut ctia = Gtia::new(&GtiaConfig {
        chip_generation: ChipGeneration::Ctia,
        ..GtiaConfig::default()
    });
    assert_eq!(ctia.read(0x15), 0xFF);
}

// ===== Reset behaviour =====

#[test]
fn test_warm_reset_preserves_colors() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x1A, 0x46);
    gtia.warm_reset();

    let line = merge_line(&mut gtia, &flat_playfield(pcc::BACKGROUND), false, 50, [0; 5], &[]);
    assert_eq!(line[100], 0x46, "warm reset keeps the colour table");
}

#[test]
fn test_cold_reset_clears_colors() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x1A, 0x46);
    gtia.cold_reset();

    let line = merge_line(&mut gtia, &flat_playfield(pcc::BACKGROUND), false, 50, [0; 5], &[]);
    assert_eq!(line[100], 0x00);
}
