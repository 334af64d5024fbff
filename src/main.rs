//! Midnight Meowathon native driver
//!
//! Replays a scripted input tape against the rules engine and logs the
//! published events. Rendering and physics live in the web front end; this
//! binary stands in for them.

use std::cell::RefCell;
use std::rc::Rc;

use midnight_meowathon::persistence::{self, MemoryStorage};
use midnight_meowathon::sim::{
    ActorReport, Contact, GameSession, LayoutRegistry, MovementIntent, PowerUpId, TickInput, tick,
};
use midnight_meowathon::{EventBus, GameEvent, Result, Tuning};

/// Nominal frame time of the replay (ms)
const FRAME_MS: f64 = 16.0;

fn main() {
    env_logger::init();
    log::info!("Midnight Meowathon (native) starting...");

    if let Err(e) = run() {
        log::error!("Replay failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let tuning_json = std::env::args()
        .nth(1)
        .and_then(|path| match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Could not read tuning file {}: {}", path, e);
                None
            }
        });
    let tuning = Tuning::load_or_default(tuning_json.as_deref());

    let mut session = GameSession::new(0x6d656f77, tuning, LayoutRegistry::embedded()?)?;
    let mut storage = MemoryStorage::new();
    persistence::load_session(&storage, &mut session);

    let broken = Rc::new(RefCell::new(0u32));
    let mut bus = EventBus::new();
    bus.subscribe(|event: &GameEvent| match event {
        GameEvent::StageCleared(result) => println!(
            "Stage {} cleared: {} + {} time + {} survival + {} combo = {}",
            result.stage,
            result.score,
            result.time_bonus,
            result.survival_bonus,
            result.combo_bonus,
            result.total
        ),
        GameEvent::StageFailed { score, .. } => println!("Detected! Stage failed with {}", score),
        GameEvent::TimeAttackFinished {
            boss,
            time,
            win,
            rank,
            ..
        } => println!(
            "Time attack vs {}: {:.2}s, {} (rank {})",
            boss,
            time,
            if *win { "win" } else { "loss" },
            rank
        ),
        other => log::debug!("{:?}", other),
    });
    let counter = broken.clone();
    bus.subscribe(move |event: &GameEvent| {
        if let GameEvent::ItemBroken { .. } = event {
            *counter.borrow_mut() += 1;
        }
    });

    // Story stage 1 with thunder held in reserve
    session.add_power_up(PowerUpId::Thunder);
    session.start_story_stage()?;
    play_stage(&mut session, &mut bus, true);

    // Then a time-attack run, if the clear unlocked it
    if session.progress.is_feature_unlocked() {
        session.start_time_attack("kuro")?;
        play_stage(&mut session, &mut bus, false);
    }

    persistence::save_session(&mut storage, &session)?;
    println!(
        "{} items broken, total score {}, next stage {}",
        broken.borrow(),
        session.progress.total_score(),
        session.progress.current_stage()
    );
    Ok(())
}

/// Walk to every item, knock it off and let it land
fn play_stage(session: &mut GameSession, bus: &mut EventBus, use_thunder: bool) {
    let Some(stage) = session.stage.as_ref() else {
        return;
    };
    let targets: Vec<(u32, f32, f32)> = stage
        .items
        .iter()
        .map(|i| (i.id, i.pos.x, i.pos.y))
        .collect();
    let wobble_frames = (session.tuning.wobble_ms / FRAME_MS).ceil() as u32 + 1;

    for (n, (item, x, y)) in targets.into_iter().enumerate() {
        let report = ActorReport {
            position: glam::Vec2::new(x, y),
            on_ground: true,
            wall: None,
        };
        let first = TickInput {
            delta_ms: FRAME_MS,
            movement: MovementIntent {
                axis: 1.0,
                jump: false,
            },
            actor: Some(report),
            ability: use_thunder && n == 0,
            contacts: vec![
                Contact::PlatformLanded {
                    platform: 0,
                    impact_velocity: 120.0,
                },
                Contact::ItemTouched { item },
            ],
        };
        tick(session, &first);

        for _ in 0..wobble_frames {
            tick(
                session,
                &TickInput {
                    delta_ms: FRAME_MS,
                    ..TickInput::default()
                },
            );
        }
        tick(
            session,
            &TickInput {
                delta_ms: FRAME_MS,
                contacts: vec![Contact::ItemGroundContact {
                    item,
                    platform: 0,
                    position: None,
                }],
                ..TickInput::default()
            },
        );
        bus.publish_all(session.drain_events());
        if !session.stage.as_ref().is_some_and(|s| s.is_playing()) {
            break;
        }
    }
}
