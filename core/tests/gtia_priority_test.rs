use colleen_core::device::gtia::{ChipGeneration, Gtia, GtiaConfig, pcc};

mod common;
use common::{flat_playfield, merge_line};

const COL_P0: u8 = 0x34;
const COL_P1: u8 = 0x56;
const COL_PF0: u8 = 0x12;
const COL_PF2: u8 = 0x78;
const COL_PF3: u8 = 0x9A;
const COL_BK: u8 = 0x02;

/// A merger with distinct colours in every register and player 0 parked
/// over the middle of the line.
fn gtia_with_player() -> Gtia {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x12, COL_P0); // COLPM0
    gtia.write(0x13, COL_P1); // COLPM1
    gtia.write(0x16, COL_PF0); // COLPF0
    gtia.write(0x17, 0x36); // COLPF1
    gtia.write(0x18, COL_PF2); // COLPF2
    gtia.write(0x19, COL_PF3); // COLPF3
    gtia.write(0x1A, COL_BK); // COLBK
    gtia.write(0x0D, 0xFF); // GRAFP0
    gtia.write(0x00, 0x50); // HPOSP0: decoded 96
    gtia
}

// ===== Basic orderings =====

#[test]
fn test_player_over_playfield() {
    let mut gtia = gtia_with_player();
    gtia.write(0x1B, 0x01); // players in front

    let playfield = flat_playfield(pcc::PLAYFIELD_0);
    let line = merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);

    assert_eq!(line[100], COL_P0, "player in front of playfield");
    assert_eq!(line[200], COL_PF0, "playfield elsewhere");
}

#[test]
fn test_playfield_over_player() {
    let mut gtia = gtia_with_player();
    gtia.write(0x1B, 0x04); // playfield in front

    let playfield = flat_playfield(pcc::PLAYFIELD_0);
    let line = merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);

    assert_eq!(line[100], COL_PF0, "playfield hides the player");
}

#[test]
fn test_player_visible_over_background_in_all_orderings() {
    for prior in [0x01u8, 0x02, 0x04, 0x08] {
        let mut gtia = gtia_with_player();
        gtia.write(0x1B, prior);

        let playfield = flat_playfield(pcc::BACKGROUND);
        let line = merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);

        assert_eq!(line[100], COL_P0, "prior {prior:#04x}");
        assert_eq!(line[200], COL_BK);
    }
}

#[test]
fn test_split_ordering_player_between_playfields() {
    // Playfield 0,1 in front of players in front of playfield 2,3.
    let mut gtia = gtia_with_player();
    gtia.write(0x1B, 0x08);

    let mut playfield = flat_playfield(pcc::PLAYFIELD_2);
    for slot in playfield.iter_mut().take(150) {
        *slot = pcc::PLAYFIELD_0;
    }
    let line = merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);

    assert_eq!(line[100], COL_PF0, "PF0 beats the player");
    // Player 0 occupies 96..112; over PF2 it wins.
    let mut gtia = gtia_with_player();
    gtia.write(0x1B, 0x08);
    let playfield = flat_playfield(pcc::PLAYFIELD_2);
    let line = merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);
    assert_eq!(line[100], COL_P0, "player beats PF2");
}

#[test]
fn test_conflicting_stack_resolves_to_front_player() {
    // Ordering 0x02: players 0,1 in front of the playfield, playfield
    // 2,3 in front of players 2,3. With players 0 and 2 stacked over
    // PF2, player 2 is beaten and player 0 shows alone.
    let mut gtia = gtia_with_player();
    gtia.write(0x0F, 0xFF); // GRAFP2
    gtia.write(0x02, 0x50); // HPOSP2 on top of player 0
    gtia.write(0x14, 0x7A); // COLPM2
    gtia.write(0x1B, 0x02);

    let playfield = flat_playfield(pcc::PLAYFIELD_2);
    let line = merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);

    assert_eq!(line[100], COL_P0);
}

// ===== Merged player colours =====

#[test]
fn test_merge_players_ors_colors() {
    let mut gtia = gtia_with_player();
    gtia.write(0x0E, 0xFF); // GRAFP1
    gtia.write(0x01, 0x50); // HPOSP1 on top of player 0
    gtia.write(0x1B, 0x21); // merge pairs + players in front

    let playfield = flat_playfield(pcc::BACKGROUND);
    let line = merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);

    assert_eq!(line[100], COL_P0 | COL_P1, "pair colours OR together");
}

#[test]
fn test_player0_beats_player1_without_merge() {
    let mut gtia = gtia_with_player();
    gtia.write(0x0E, 0xFF);
    gtia.write(0x01, 0x50);
    gtia.write(0x1B, 0x01);

    let playfield = flat_playfield(pcc::BACKGROUND);
    let line = merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);

    assert_eq!(line[100], COL_P0);
}

// ===== Missiles =====

#[test]
fn test_missile_takes_player_color() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x12, COL_P0);
    gtia.write(0x11, 0x03); // GRAFM: missile 0 bits
    gtia.write(0x04, 0x50); // HPOSM0
    gtia.write(0x1B, 0x01);

    let playfield = flat_playfield(pcc::BACKGROUND);
    let line = merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);

    assert_eq!(line[96], COL_P0, "missile shares its player's colour");
}

#[test]
fn test_missile_as_fifth_player_takes_pf3() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x12, COL_P0);
    gtia.write(0x19, COL_PF3);
    gtia.write(0x11, 0x03);
    gtia.write(0x04, 0x50);
    gtia.write(0x1B, 0x11); // missiles as fifth player

    let playfield = flat_playfield(pcc::BACKGROUND);
    let line = merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);

    assert_eq!(line[96], COL_PF3);
}

// ===== Idempotence =====

#[test]
fn test_priority_rebuild_is_idempotent() {
    let playfield = flat_playfield(pcc::PLAYFIELD_2);

    let mut once = gtia_with_player();
    once.write(0x1B, 0x02);
    let line_once = merge_line(&mut once, &playfield, false, 50, [0; 5], &[]);

    let mut twice = gtia_with_player();
    twice.write(0x1B, 0x02);
    twice.write(0x1B, 0x02); // second write of the same value
    let line_twice = merge_line(&mut twice, &playfield, false, 50, [0; 5], &[]);

    assert_eq!(line_once, line_twice);
}

// ===== Mid-line mode changes =====

#[test]
fn test_prior_change_before_cycle_16_sets_line_mode() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x17, 0x36);
    gtia.write(0x18, COL_PF2);
    gtia.write(0x19, COL_PF3);
    gtia.write(0x1B, 0x40);

    // Clearing the processed mode before cycle 16 makes the whole line
    // unprocessed, no strange fallback.
    let playfield = flat_playfield(pcc::PLAYFIELD_1_FIDDLED);
    let line = merge_line(&mut gtia, &playfield, true, 50, [0; 5], &[(4, 0x1B, 0x00)]);

    let fiddled = (COL_PF2 & 0xF0) | (0x36 & 0x0F);
    assert_eq!(line[100], fiddled, "plain fiddled output");
    assert_eq!(line[300], fiddled);
}

#[test]
fn test_disabling_processed_mode_mid_line_enters_strange_mode() {
    let mut gtia = Gtia::new(&GtiaConfig::default());
    gtia.write(0x17, 0x36);
    gtia.write(0x18, COL_PF2);
    gtia.write(0x19, COL_PF3);
    gtia.write(0x1B, 0x40);

    // All-ones hires nibbles remap to PF3 in the strange fallback.
    let playfield = flat_playfield(pcc::PLAYFIELD_1_FIDDLED);
    let line = merge_line(&mut gtia, &playfield, true, 50, [0; 5], &[(30, 0x1B, 0x00)]);

    // The write lands at half-colour-clock 56.
    assert_eq!(line[100], COL_PF3, "strange remap after the switch");
    assert_eq!(line[300], COL_PF3);
    let fiddled = (COL_PF2 & 0xF0) | (0x36 & 0x0F);
    assert_ne!(line[100], fiddled, "not the unprocessed fiddled colour");
}

#[test]
fn test_ctia_has_no_processed_modes() {
    let mut gtia = Gtia::new(&GtiaConfig {
        chip_generation: ChipGeneration::Ctia,
        ..GtiaConfig::default()
    });
    gtia.write(0x17, 0x36);
    gtia.write(0x18, COL_PF2);
    gtia.write(0x1B, 0x40); // ignored on this generation

    let playfield = flat_playfield(pcc::PLAYFIELD_1_FIDDLED);
    let line = merge_line(&mut gtia, &playfield, true, 50, [0; 5], &[]);

    let fiddled = (COL_PF2 & 0xF0) | (0x36 & 0x0F);
    assert_eq!(line[100], fiddled);
}

// ===== Collision suppression in processed modes =====

#[test]
fn test_processed_modes_suppress_playfield_collisions() {
    for prior in [0x40u8, 0xC0] {
        let mut gtia = gtia_with_player();
        gtia.write(0x1B, prior);

        let playfield = flat_playfield(pcc::PLAYFIELD_1_FIDDLED);
        merge_line(&mut gtia, &playfield, true, 50, [0; 5], &[]);

        assert_eq!(
            gtia.read(0x04),
            0,
            "prior {prior:#04x} must not collide with the playfield"
        );
    }
}

#[test]
fn test_unprocessed_mode_detects_playfield_collisions() {
    let mut gtia = gtia_with_player();
    gtia.write(0x1B, 0x00);

    let playfield = flat_playfield(pcc::PLAYFIELD_2);
    merge_line(&mut gtia, &playfield, false, 50, [0; 5], &[]);

    assert_ne!(gtia.read(0x04) & 0x04, 0, "player 0 collides with PF2");
}
