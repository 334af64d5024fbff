//! Scenario tests driving a whole session through `tick`

use glam::Vec2;
use midnight_meowathon::sim::{
    ActorReport, Contact, GameSession, LayoutRegistry, MovementIntent, PowerUpId, StagePhase,
    StageResult, TickInput, tick,
};
use midnight_meowathon::{GameEvent, Rank, StageAdvance, Tuning};

const LAYOUTS: &str = r#"{
    "story": {
        "1": {
            "name": "test room",
            "catStart": {"x": 100, "y": 450},
            "platforms": [
                {"x": 200, "y": 400, "w": 100, "h": 10},
                {"x": 500, "y": 300, "w": 100, "h": 10, "kind": "crumbling"},
                {"x": 650, "y": 450, "w": 80, "h": 10, "kind": "comfy"},
                {"x": 100, "y": 300, "w": 80, "h": 10, "kind": "bouncy"}
            ],
            "items": [
                {"x": 200, "y": 380, "type": "vase", "scale": 1},
                {"x": 500, "y": 280, "type": "book", "scale": 1},
                {"x": 520, "y": 280, "type": "pen", "scale": 1}
            ],
            "timeLimit": 60,
            "softZones": [{"x": 400, "y": 520, "w": 200, "h": 60}],
            "moonbeam": {"startX": 100, "endX": 700, "y": 0, "width": 80, "cycleTime": 30000}
        }
    },
    "gathering": {
        "kuro": {
            "name": "kuro",
            "catStart": {"x": 400, "y": 450},
            "platforms": [{"x": 400, "y": 500, "w": 760, "h": 10}],
            "items": [
                {"x": 300, "y": 480, "type": "clock", "scale": 0.7},
                {"x": 500, "y": 480, "type": "mug", "scale": 0.8}
            ]
        }
    },
    "bosses": [{"id": "kuro", "difficulty": 1, "targetTime": 22.5}]
}"#;

/// Break position clear of the soft zone and, early on, of the moonbeam
const PLAIN_SPOT: Vec2 = Vec2::new(600.0, 540.0);

fn session() -> GameSession {
    let layouts = LayoutRegistry::from_json(LAYOUTS).unwrap();
    let mut session = GameSession::new(42, Tuning::default(), layouts).unwrap();
    session.start_story_stage().unwrap();
    session
}

fn advance(session: &mut GameSession, delta_ms: f64) {
    tick(
        session,
        &TickInput {
            delta_ms,
            ..TickInput::default()
        },
    );
}

/// Touch an item, let it wobble off, and land it at `at`
fn knock_down(session: &mut GameSession, item: u32, at: Vec2) {
    session.on_item_touched(item);
    advance(session, 400.0);
    session.on_item_ground_contact(item, 0, Some(at));
}

fn stage_result(events: &[GameEvent]) -> Option<&StageResult> {
    events.iter().find_map(|e| match e {
        GameEvent::StageCleared(result) => Some(result),
        _ => None,
    })
}

#[test]
fn test_clearing_every_item_banks_the_total() {
    let mut session = session();
    knock_down(&mut session, 1, PLAIN_SPOT);
    knock_down(&mut session, 2, PLAIN_SPOT);
    knock_down(&mut session, 3, PLAIN_SPOT);

    let events = session.drain_events();
    let broken: Vec<(u64, bool)> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::ItemBroken {
                score_delta,
                was_domino_bonus,
                ..
            } => Some((*score_delta, *was_domino_bonus)),
            _ => None,
        })
        .collect();
    // 229, 65, then 14 plus the domino bonus on the third quick break
    assert_eq!(broken, vec![(229, false), (65, false), (514, true)]);

    let result = stage_result(&events).unwrap();
    assert_eq!(
        *result,
        StageResult {
            stage: 1,
            score: 808,
            time_bonus: 590,
            survival_bonus: 500,
            combo_bonus: 150,
            total: 2048,
            max_combo: 3,
            time_up: false,
            advance: Some(StageAdvance {
                continue_run: true,
                completed: false,
                ending: false,
            }),
        }
    );
    assert_eq!(session.phase(), Some(StagePhase::Cleared));
    assert_eq!(session.progress.current_stage(), 2);
    assert_eq!(session.progress.total_score(), 2048);
    assert!(session.progress.is_feature_unlocked());
}

#[test]
fn test_item_lifecycle_events() {
    let mut session = session();
    // Ground contact before the item falls is ignored
    session.on_item_ground_contact(1, 0, Some(PLAIN_SPOT));
    assert_eq!(session.score(), 0);

    session.on_item_touched(1);
    session.on_item_touched(1);
    advance(&mut session, 200.0);
    advance(&mut session, 200.0);
    let events = session.drain_events();
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::ItemDislodged { item: 1 }))
            .count(),
        1
    );
    let falling = events
        .iter()
        .find_map(|e| match e {
            GameEvent::ItemFalling { item: 1, velocity, heavy } => Some((*velocity, *heavy)),
            _ => None,
        })
        .unwrap();
    // Facing right: U[20, 60] sideways, fixed upward kick, vase is heavy
    assert!((20.0..=60.0).contains(&falling.0.0));
    assert_eq!(falling.0.1, -60.0);
    assert!(falling.1);
}

#[test]
fn test_moonbeam_and_soft_zone() {
    let mut session = session();
    // Beam center sits at x=116 after 400 ms
    knock_down(&mut session, 1, Vec2::new(116.0, 300.0));
    let events = session.drain_events();
    assert!(events.contains(&GameEvent::ItemBroken {
        item: 1,
        score_delta: 344,
        was_in_moonbeam: true,
        was_domino_bonus: false,
    }));
    assert_eq!(session.noise(), 18.0);

    // Pen noise halved inside the soft zone
    knock_down(&mut session, 3, Vec2::new(400.0, 540.0));
    let expected = 18.0 - 1.2 + 1.5;
    assert!((session.noise() - expected).abs() < 1e-9);
}

#[test]
fn test_detection_fails_stage_once() {
    let mut session = session();
    session.stage.as_mut().unwrap().noise.set_level(95.0);
    knock_down(&mut session, 1, PLAIN_SPOT);

    let events = session.drain_events();
    assert_eq!(events.iter().filter(|e| **e == GameEvent::Detected).count(), 1);
    assert!(events.contains(&GameEvent::StageFailed {
        score: 229,
        max_combo: 1,
    }));
    assert!(session.is_detected());
    assert_eq!(session.phase(), Some(StagePhase::Detected));

    // Stage is over: further input is ignored
    knock_down(&mut session, 2, PLAIN_SPOT);
    assert_eq!(session.score(), 229);
    assert!(session.drain_events().is_empty());
    assert_eq!(session.progress.stages_cleared(), 0);
}

#[test]
fn test_thunder_silences_break_noise() {
    let mut session = session();
    session.add_power_up(PowerUpId::Thunder);
    session.stage.as_mut().unwrap().noise.set_level(50.0);

    let output = tick(
        &mut session,
        &TickInput {
            delta_ms: 16.0,
            ability: true,
            ..TickInput::default()
        },
    );
    assert_eq!(output.bounce_velocity, None);
    assert!(session.thunder_status().active);
    assert!(!session.request_thunder());

    let before = session.noise();
    knock_down(&mut session, 1, PLAIN_SPOT);
    assert_eq!(session.score(), 229);
    // Only decay moved the meter
    assert!((session.noise() - (before - 1.2)).abs() < 1e-9);

    advance(&mut session, 10_000.0);
    let events = session.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::ThunderStateChanged { active: false, .. })));
    assert!(!session.thunder_status().active);
    assert!(!session.request_thunder());
}

#[test]
fn test_fish_heals_before_break_noise() {
    let mut session = session();
    session.add_power_up(PowerUpId::Fish);
    session.stage.as_mut().unwrap().noise.set_level(10.0);
    knock_down(&mut session, 3, PLAIN_SPOT);
    // 10 - 1.2 decay - 5 heal + 3 pen
    assert!((session.noise() - 6.8).abs() < 1e-9);
}

#[test]
fn test_crumbling_platform_drops_its_items() {
    let mut session = session();
    tick(
        &mut session,
        &TickInput {
            delta_ms: 16.0,
            contacts: vec![
                Contact::PlatformLanded {
                    platform: 2,
                    impact_velocity: 100.0,
                },
                Contact::PlatformLanded {
                    platform: 2,
                    impact_velocity: 100.0,
                },
            ],
            ..TickInput::default()
        },
    );
    let events = session.drain_events();
    assert!(events.contains(&GameEvent::PlatformCrumbleWarning { platform: 2 }));
    assert!(events.contains(&GameEvent::PlatformCollapseScheduled { platform: 2 }));
    // Two soft landings
    assert!((session.noise() - 4.0).abs() < 1e-9);

    advance(&mut session, 1_999.0);
    assert!(!session.stage.as_ref().unwrap().hazards.platform(2).unwrap().collapsed);
    advance(&mut session, 1.0);
    let events = session.drain_events();
    assert!(events.contains(&GameEvent::PlatformCollapsed { platform: 2 }));
    let dropped: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::ItemFalling { item, .. } => Some(*item),
            _ => None,
        })
        .collect();
    assert_eq!(dropped, vec![2, 3]);

    // The wreck is gone: a stale contact against it breaks nothing
    session.on_item_ground_contact(3, 2, None);
    assert_eq!(session.score(), 0);
    assert!(!session.stage.as_ref().unwrap().item(3).unwrap().is_broken());
    assert!(session.drain_events().is_empty());

    // Already falling: breaks without being touched
    session.on_item_ground_contact(2, 0, Some(PLAIN_SPOT));
    assert!(session.score() > 0);
    session.on_item_ground_contact(3, 0, Some(PLAIN_SPOT));
    assert!(session.stage.as_ref().unwrap().item(3).unwrap().is_broken());

    // Landing on the wreck does nothing
    assert_eq!(session.on_platform_landed(2, 100.0), None);
}

#[test]
fn test_bouncy_and_hard_landing() {
    let mut session = session();
    let output = tick(
        &mut session,
        &TickInput {
            delta_ms: 16.0,
            contacts: vec![Contact::PlatformLanded {
                platform: 4,
                impact_velocity: 500.0,
            }],
            ..TickInput::default()
        },
    );
    assert_eq!(output.bounce_velocity, Some(-450.0));
    assert_eq!(session.noise(), 4.0);
    assert!(session.drain_events().contains(&GameEvent::PlatformBounced {
        platform: 4,
        velocity: -450.0,
    }));
}

#[test]
fn test_comfy_stun_blocks_movement() {
    let mut session = session();
    session.on_platform_landed(3, 100.0);
    assert!(session.drain_events().contains(&GameEvent::ActorStunned { platform: 3 }));

    let walk = TickInput {
        delta_ms: 16.0,
        movement: MovementIntent { axis: 1.0, jump: false },
        actor: Some(ActorReport {
            position: Vec2::new(650.0, 440.0),
            on_ground: true,
            wall: None,
        }),
        ..TickInput::default()
    };
    assert_eq!(tick(&mut session, &walk).movement.velocity_x, None);

    advance(&mut session, 1_500.0);
    assert!(session.drain_events().contains(&GameEvent::StunEnded));
    assert_eq!(tick(&mut session, &walk).movement.velocity_x, Some(280.0));
}

#[test]
fn test_time_up_counts_as_clear() {
    let mut session = session();
    advance(&mut session, 60_000.0);
    let events = session.drain_events();
    let result = stage_result(&events).unwrap();
    assert!(result.time_up);
    assert_eq!(result.time_bonus, 0);
    assert_eq!(result.total, 500);
    assert_eq!(session.phase(), Some(StagePhase::Cleared));
}

#[test]
fn test_restart_resets_stage_but_keeps_power_ups() {
    let mut session = session();
    session.add_power_up(PowerUpId::Bell);
    knock_down(&mut session, 1, PLAIN_SPOT);
    assert!(session.score() > 0);

    session.restart().unwrap();
    assert_eq!(session.score(), 0);
    assert_eq!(session.noise(), 0.0);
    assert_eq!(session.combo(), (0, 0));
    assert_eq!(session.stage.as_ref().unwrap().remaining_items(), 3);
    assert!(session.powerups.has_power_up(PowerUpId::Bell));
}

#[test]
fn test_fifth_clear_plays_ending() {
    let mut session = session();
    let mut endings = Vec::new();
    for _ in 0..5 {
        session.start_story_stage().unwrap();
        for item in 1..=3 {
            knock_down(&mut session, item, PLAIN_SPOT);
        }
        let events = session.drain_events();
        endings.push(events.contains(&GameEvent::AllStagesCleared));
    }
    assert_eq!(endings, vec![false, false, false, false, true]);
    assert_eq!(session.progress.current_stage(), 1);
}

#[test]
fn test_time_attack_win_records_best() {
    let mut session = session();
    session.progress.complete_stage(100);
    session.start_time_attack("kuro").unwrap();
    session.add_power_up(PowerUpId::Bell);

    knock_down(&mut session, 1, PLAIN_SPOT);
    knock_down(&mut session, 2, PLAIN_SPOT);
    let events = session.drain_events();

    // Flat scores: clock 300 + mug 80, power-ups ignored, no noise
    assert_eq!(session.score(), 380);
    assert_eq!(session.noise(), 0.0);
    assert!(events.contains(&GameEvent::TimeAttackFinished {
        boss: "kuro".to_string(),
        time: 0.8,
        win: true,
        rank: Rank::S,
        new_best: true,
    }));
    assert_eq!(session.best_times.get("kuro"), Some(0.8));
    assert_eq!(
        session.phase(),
        Some(StagePhase::Finished {
            win: true,
            rank: Rank::S
        })
    );
}

#[test]
fn test_time_attack_over_target_is_rank_d() {
    let mut session = session();
    session.progress.complete_stage(100);
    session.start_time_attack("kuro").unwrap();

    advance(&mut session, 22_500.0);
    assert_eq!(session.phase(), Some(StagePhase::Playing));
    advance(&mut session, 16.0);
    assert_eq!(
        session.phase(),
        Some(StagePhase::Finished {
            win: false,
            rank: Rank::D
        })
    );
    assert!(session.best_times.get("kuro").is_none());
}

#[test]
fn test_combo_lapse_is_published() {
    let mut session = session();
    knock_down(&mut session, 1, PLAIN_SPOT);
    assert_eq!(session.combo(), (1, 1));
    session.drain_events();

    // 80 frames of 16 ms
    advance(&mut session, 1_279.0);
    assert_eq!(session.combo(), (1, 1));
    advance(&mut session, 1.0);
    assert_eq!(session.combo(), (0, 1));
    assert!(session
        .drain_events()
        .contains(&GameEvent::ComboChanged { count: 0, max: 1 }));
}
