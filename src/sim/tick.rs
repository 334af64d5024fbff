//! Tick-driven rules update
//!
//! The driver calls [`tick`] once per frame with the time delta and the
//! contacts the physics layer resolved during that frame. Countdowns advance
//! first, then discrete events are applied in the order given. The contact
//! handlers are also callable directly on [`GameSession`].

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::actor::{ActorReport, MovementIntent, MovementOutcome};
use super::catalog::EffectKey;
use super::noise::NoiseOutcome;
use super::powerup::PowerUpEngine;
use super::state::{GameSession, StageMode, StagePhase, StageResult, StageState};
use crate::events::{EventQueue, GameEvent};
use crate::progression::StoryProgress;
use crate::time_attack::{BestTimes, Rank};
use crate::tuning::Tuning;

/// A contact resolved by the physics layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Contact {
    ItemTouched {
        item: u32,
    },
    ItemGroundContact {
        item: u32,
        platform: u32,
        /// Where the item hit; defaults to the item's x on the platform top
        position: Option<Vec2>,
    },
    PlatformLanded {
        platform: u32,
        impact_velocity: f64,
    },
}

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Time since the previous tick (ms)
    pub delta_ms: f64,
    pub movement: MovementIntent,
    /// Actor contact state as resolved by physics; `None` skips movement
    pub actor: Option<ActorReport>,
    /// Ability button (thunder)
    pub ability: bool,
    pub contacts: Vec<Contact>,
}

/// Commands for the physics layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub movement: MovementOutcome,
    /// Upward velocity from a bouncy landing this tick
    pub bounce_velocity: Option<f64>,
}

/// Advance the session by one tick
pub fn tick(session: &mut GameSession, input: &TickInput) -> TickOutput {
    let mut output = TickOutput::default();
    if !session.stage.as_ref().is_some_and(|s| s.is_playing()) {
        return output;
    }

    advance_timers(session, input.delta_ms);

    if input.ability {
        session.request_thunder();
    }
    if let Some(report) = input.actor.as_ref() {
        output.movement = session.apply_movement(&input.movement, report);
    }
    for contact in &input.contacts {
        match *contact {
            Contact::ItemTouched { item } => session.on_item_touched(item),
            Contact::ItemGroundContact {
                item,
                platform,
                position,
            } => session.on_item_ground_contact(item, platform, position),
            Contact::PlatformLanded {
                platform,
                impact_velocity,
            } => {
                if let Some(v) = session.on_platform_landed(platform, impact_velocity) {
                    output.bounce_velocity = Some(v);
                }
            }
        }
    }
    output
}

/// Countdowns, decay, wobbles and the stage clock
fn advance_timers(session: &mut GameSession, delta_ms: f64) {
    let GameSession {
        stage,
        powerups,
        events,
        rng,
        tuning,
        progress,
        ..
    } = session;
    let Some(stage) = stage.as_mut() else {
        return;
    };
    stage.elapsed_ms += delta_ms;

    if stage.is_story() {
        if powerups.tick(delta_ms) {
            push_thunder_state(powerups, events);
        }
        stage.noise.decay(delta_ms);
        if stage.combo.tick(delta_ms) {
            events.push(GameEvent::ComboChanged {
                count: 0,
                max: stage.combo.max_count(),
            });
        }
    }

    let hazard_tick = stage.hazards.tick(delta_ms);
    for platform_id in hazard_tick.collapsed {
        events.push(GameEvent::PlatformCollapsed {
            platform: platform_id,
        });
        // Anything resting on the platform goes down with it
        let Some(support) = stage.hazards.platform(platform_id).map(|p| p.support_region()) else {
            continue;
        };
        for item in &mut stage.items {
            if item.bounds().intersects(&support) && item.drop_now() {
                events.push(GameEvent::ItemFalling {
                    item: item.id,
                    velocity: (0.0, 0.0),
                    heavy: item.base_score >= tuning.heavy_item_score,
                });
            }
        }
    }
    if hazard_tick.stun_ended {
        events.push(GameEvent::StunEnded);
    }

    stage.actor.tick(delta_ms);
    let facing = stage.actor.facing;
    for item in &mut stage.items {
        if item.tick(delta_ms) {
            let vx = facing * rng.random_range(20..=60) as f32;
            events.push(GameEvent::ItemFalling {
                item: item.id,
                velocity: (vx, -60.0),
                heavy: item.base_score >= tuning.heavy_item_score,
            });
        }
    }

    let time_over = match &stage.mode {
        StageMode::Story { .. } => stage.remaining_secs() == 0,
        StageMode::TimeAttack(rules) => stage.elapsed_secs() > rules.target_time(),
    };
    if time_over {
        if stage.is_story() {
            log::info!("Time up on stage '{}'", stage.name);
            finish_story_stage(stage, progress, tuning, events, true);
        } else {
            time_attack_over(stage, events);
        }
    }
}

impl GameSession {
    /// Ability button: try to start the thunder silence
    pub fn request_thunder(&mut self) -> bool {
        if !self
            .stage
            .as_ref()
            .is_some_and(|s| s.is_playing() && s.is_story())
        {
            return false;
        }
        if !self.powerups.activate_thunder() {
            return false;
        }
        push_thunder_state(&self.powerups, &mut self.events);
        true
    }

    /// Movement intent plus physics contact state to velocity commands
    pub fn apply_movement(
        &mut self,
        intent: &MovementIntent,
        report: &ActorReport,
    ) -> MovementOutcome {
        let GameSession {
            stage,
            powerups,
            neutral_powerups,
            events,
            tuning,
            ..
        } = self;
        let Some(stage) = stage.as_mut().filter(|s| s.is_playing()) else {
            return MovementOutcome::default();
        };
        let story = stage.is_story();
        let powerups = if story { &*powerups } else { &*neutral_powerups };

        let outcome = stage
            .actor
            .apply(intent, report, &stage.hazards, powerups, tuning);
        if story && outcome.noise > 0.0 {
            add_noise(stage, powerups, events, outcome.noise);
        }
        outcome
    }

    /// First contact between the actor and an item starts its wobble
    pub fn on_item_touched(&mut self, item_id: u32) {
        let GameSession {
            stage,
            events,
            tuning,
            ..
        } = self;
        let Some(stage) = stage.as_mut().filter(|s| s.is_playing()) else {
            return;
        };
        match stage.item_mut(item_id) {
            Some(item) => {
                if item.touch(tuning.wobble_ms) {
                    events.push(GameEvent::ItemDislodged { item: item_id });
                }
            }
            None => log::warn!("Touch on unknown item {}", item_id),
        }
    }

    /// A falling item hit a platform or the floor: the only place items
    /// break and score
    pub fn on_item_ground_contact(&mut self, item_id: u32, platform_id: u32, position: Option<Vec2>) {
        let GameSession {
            stage,
            powerups,
            events,
            tuning,
            progress,
            best_times,
            ..
        } = self;
        let Some(stage) = stage.as_mut().filter(|s| s.is_playing()) else {
            return;
        };
        let platform = stage.hazards.platform(platform_id);
        if platform.is_some_and(|p| p.collapsed) {
            log::debug!("Item {} hit collapsed platform {}, ignored", item_id, platform_id);
            return;
        }
        let platform_top = platform.map(|p| p.rect.min.y);
        let Some(item) = stage.item_mut(item_id) else {
            log::warn!("Ground contact for unknown item {}", item_id);
            return;
        };
        if !item.ground_contact() {
            return;
        }
        let (base_score, base_noise, item_pos) = (item.base_score, item.base_noise, item.pos);
        let pos = position.unwrap_or_else(|| Vec2::new(item_pos.x, platform_top.unwrap_or(item_pos.y)));

        if !stage.is_story() {
            // Time attack: flat score, nothing else
            stage.combo.award(base_score as u64);
            events.push(GameEvent::ItemBroken {
                item: item_id,
                score_delta: base_score as u64,
                was_in_moonbeam: false,
                was_domino_bonus: false,
            });
            events.push(GameEvent::ScoreChanged {
                score: stage.combo.score(),
            });
            if stage.remaining_items() == 0 {
                finish_time_attack(stage, best_times, events);
            }
            return;
        }

        let in_moonbeam = stage.hazards.in_moonbeam(pos, stage.elapsed_ms);
        let now_ms = stage.elapsed_ms;
        let scored = stage
            .combo
            .on_item_break(base_score, in_moonbeam, now_ms, powerups);
        log::debug!(
            "Item {} broke for {} (combo {}{})",
            item_id,
            scored.total(),
            scored.combo,
            if scored.was_domino_bonus() { ", domino" } else { "" }
        );
        events.push(GameEvent::ItemBroken {
            item: item_id,
            score_delta: scored.total(),
            was_in_moonbeam: in_moonbeam,
            was_domino_bonus: scored.was_domino_bonus(),
        });
        events.push(GameEvent::ScoreChanged {
            score: stage.combo.score(),
        });
        events.push(GameEvent::ComboChanged {
            count: stage.combo.count(),
            max: stage.combo.max_count(),
        });

        // Heal lands before the break's own noise, thunder or not
        if let Some(heal) = powerups
            .effect_value(EffectKey::NoiseHealOnBreak)
            .and_then(|v| v.as_f64())
            .filter(|h| *h > 0.0)
        {
            stage.noise.heal(heal);
            events.push(GameEvent::NoiseChanged {
                level: stage.noise.level(),
            });
        }
        let noise = base_noise * stage.hazards.noise_factor(pos);
        add_noise(stage, powerups, events, noise);

        if stage.is_playing() && stage.remaining_items() == 0 {
            finish_story_stage(stage, progress, tuning, events, false);
        }
    }

    /// The actor landed on a platform. Returns the bounce velocity, if any.
    pub fn on_platform_landed(&mut self, platform_id: u32, impact_velocity: f64) -> Option<f64> {
        let GameSession {
            stage,
            powerups,
            neutral_powerups,
            events,
            tuning,
            ..
        } = self;
        let stage = stage.as_mut().filter(|s| s.is_playing())?;
        let story = stage.is_story();
        let powerups = if story { &*powerups } else { &*neutral_powerups };

        let outcome = stage.hazards.on_platform_landed(platform_id, powerups)?;
        if outcome.collapsed {
            return None;
        }
        stage.actor.on_landed();

        if let Some(velocity) = outcome.bounce_velocity {
            events.push(GameEvent::PlatformBounced {
                platform: platform_id,
                velocity,
            });
        }
        if outcome.crumble_warning {
            events.push(GameEvent::PlatformCrumbleWarning {
                platform: platform_id,
            });
        }
        if outcome.collapse_scheduled {
            events.push(GameEvent::PlatformCollapseScheduled {
                platform: platform_id,
            });
        }
        if outcome.stunned {
            events.push(GameEvent::ActorStunned {
                platform: platform_id,
            });
        }

        if story {
            let noise = if impact_velocity > tuning.hard_landing_velocity {
                tuning.hard_landing_noise
            } else {
                tuning.landing_noise
            };
            add_noise(stage, powerups, events, noise);
        }
        outcome.bounce_velocity
    }
}

fn push_thunder_state(powerups: &PowerUpEngine, events: &mut EventQueue) {
    let status = powerups.thunder_status();
    events.push(GameEvent::ThunderStateChanged {
        active: status.active,
        remaining: status.remaining,
        cooldown: status.cooldown,
    });
}

/// Feed noise into the meter; reaching the cap fails the stage
fn add_noise(stage: &mut StageState, powerups: &PowerUpEngine, events: &mut EventQueue, amount: f64) {
    match stage.noise.add_noise(amount, powerups) {
        NoiseOutcome::Silenced => {}
        NoiseOutcome::Changed { level } => events.push(GameEvent::NoiseChanged { level }),
        NoiseOutcome::Detected { level } => {
            events.push(GameEvent::NoiseChanged { level });
            events.push(GameEvent::Detected);
            if stage.is_playing() {
                stage.phase = StagePhase::Detected;
                log::info!(
                    "Stage '{}' failed with {} points",
                    stage.name,
                    stage.combo.score()
                );
                events.push(GameEvent::StageFailed {
                    score: stage.combo.score(),
                    max_combo: stage.combo.max_count(),
                });
            }
        }
    }
}

/// Story victory: tally bonuses and bank the total
fn finish_story_stage(
    state: &mut StageState,
    progress: &mut StoryProgress,
    tuning: &Tuning,
    events: &mut EventQueue,
    time_up: bool,
) {
    let StageMode::Story { stage } = state.mode else {
        return;
    };
    let score = state.combo.score();
    let max_combo = state.combo.max_count();
    let time_bonus = state.remaining_secs() as u64 * tuning.time_bonus_per_sec;
    let survival_bonus = tuning.survival_bonus;
    let combo_bonus = max_combo as u64 * tuning.max_combo_bonus;
    let total = score + time_bonus + survival_bonus + combo_bonus;

    state.phase = StagePhase::Cleared;
    let advance = progress.complete_stage(total);
    log::info!("Stage {} cleared: {} total", stage, total);

    events.push(GameEvent::StageCleared(StageResult {
        stage,
        score,
        time_bonus,
        survival_bonus,
        combo_bonus,
        total,
        max_combo,
        time_up,
        advance: Some(advance),
    }));
    if advance.ending {
        events.push(GameEvent::AllStagesCleared);
    }
}

/// Every item broken in a time-attack run
fn finish_time_attack(state: &mut StageState, best_times: &mut BestTimes, events: &mut EventQueue) {
    let StageMode::TimeAttack(rules) = &state.mode else {
        return;
    };
    let time = state.elapsed_secs();
    let win = rules.check_win(time);
    let rank = rules.rank(time);
    let boss = rules.boss().id.clone();
    let new_best = best_times.record(&boss, time);

    state.phase = StagePhase::Finished { win, rank };
    log::info!("Time attack vs {} finished in {:.2}s: rank {}", boss, time, rank);
    events.push(GameEvent::TimeAttackFinished {
        boss,
        time,
        win,
        rank,
        new_best,
    });
}

/// Target time exceeded before every item broke
fn time_attack_over(state: &mut StageState, events: &mut EventQueue) {
    let StageMode::TimeAttack(rules) = &state.mode else {
        return;
    };
    let boss = rules.boss().id.clone();
    let time = state.elapsed_secs();
    state.phase = StagePhase::Finished {
        win: false,
        rank: Rank::D,
    };
    log::info!("Time attack vs {} ran past the target", boss);
    events.push(GameEvent::TimeAttackFinished {
        boss,
        time,
        win: false,
        rank: Rank::D,
        new_best: false,
    });
}
