//! Session and stage state
//!
//! A [`GameSession`] owns every engine for one player: the power-up set and
//! story progress persist across stages, everything in [`StageState`] is
//! rebuilt when a stage starts or restarts.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::actor::ActorState;
use super::catalog::{PowerUpCatalog, PowerUpId};
use super::combo::ComboScoreEngine;
use super::hazard::HazardStateMachine;
use super::item::BreakableItem;
use super::layout::LayoutRegistry;
use super::noise::NoiseMeter;
use super::powerup::{PowerUpEngine, ThunderStatus};
use crate::consts::MAX_STAGE;
use crate::error::{EngineError, Result};
use crate::events::{EventQueue, GameEvent};
use crate::progression::{ProgressSnapshot, StageAdvance, StoryProgress};
use crate::time_attack::{BestTimes, Rank, TimeAttackRules};
use crate::tuning::Tuning;

/// What kind of run the current stage belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum StageMode {
    Story { stage: u32 },
    TimeAttack(TimeAttackRules),
}

/// Current phase of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagePhase {
    Playing,
    /// Noise hit the cap (story loss)
    Detected,
    /// Story victory: every item broken or the clock ran out
    Cleared,
    /// Time-attack run over
    Finished { win: bool, rank: Rank },
}

/// Result screen numbers for a story victory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResult {
    pub stage: u32,
    pub score: u64,
    pub time_bonus: u64,
    pub survival_bonus: u64,
    pub combo_bonus: u64,
    pub total: u64,
    pub max_combo: u32,
    /// Cleared by the clock rather than by breaking everything
    pub time_up: bool,
    pub advance: Option<StageAdvance>,
}

/// Everything reset by a stage start or restart
#[derive(Debug, Clone)]
pub struct StageState {
    pub mode: StageMode,
    pub name: String,
    pub phase: StagePhase,
    pub elapsed_ms: f64,
    pub time_limit_secs: u32,
    pub combo: ComboScoreEngine,
    pub noise: NoiseMeter,
    pub hazards: HazardStateMachine,
    /// Sorted by id
    pub items: Vec<BreakableItem>,
    pub actor: ActorState,
}

impl StageState {
    pub fn is_playing(&self) -> bool {
        self.phase == StagePhase::Playing
    }

    pub fn is_story(&self) -> bool {
        matches!(self.mode, StageMode::Story { .. })
    }

    /// Whole seconds left on the story clock
    pub fn remaining_secs(&self) -> u32 {
        let spent = (self.elapsed_ms / 1000.0).floor().max(0.0) as u64;
        (self.time_limit_secs as u64).saturating_sub(spent) as u32
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ms / 1000.0
    }

    pub fn remaining_items(&self) -> usize {
        self.items.iter().filter(|i| !i.is_broken()).count()
    }

    pub fn item(&self, id: u32) -> Option<&BreakableItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub(crate) fn item_mut(&mut self, id: u32) -> Option<&mut BreakableItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }
}

/// One player's session
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Session seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    pub layouts: LayoutRegistry,
    pub powerups: PowerUpEngine,
    /// Empty set used where power-ups do not apply (time attack)
    pub(crate) neutral_powerups: PowerUpEngine,
    pub progress: StoryProgress,
    pub best_times: BestTimes,
    pub stage: Option<StageState>,
    pub(crate) events: EventQueue,
}

impl GameSession {
    /// Create a session. Fails on invalid tuning, or if the layouts have no
    /// usable story stage or a boss without an arena.
    pub fn new(seed: u64, tuning: Tuning, layouts: LayoutRegistry) -> Result<Self> {
        tuning.validate()?;
        layouts.validate(MAX_STAGE)?;
        let catalog = PowerUpCatalog::standard()?;
        log::info!("Session created (seed {})", seed);
        Ok(Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            layouts,
            powerups: PowerUpEngine::new(catalog.clone()),
            neutral_powerups: PowerUpEngine::new(catalog),
            progress: StoryProgress::new(),
            best_times: BestTimes::new(),
            stage: None,
            events: EventQueue::new(),
        })
    }

    /// Session on the embedded layouts and default balance
    pub fn with_defaults(seed: u64) -> Result<Self> {
        Self::new(seed, Tuning::default(), LayoutRegistry::embedded()?)
    }

    /// Start the story stage the progress points at
    pub fn start_story_stage(&mut self) -> Result<()> {
        self.start_stage(self.progress.current_stage())
    }

    /// Start story stage `stage` (unknown stages fall back to stage 1)
    pub fn start_stage(&mut self, stage: u32) -> Result<()> {
        let built = self.layouts.story_layout(stage)?.build(&self.tuning, true);
        log::info!(
            "Stage {} '{}' started: {} items, {}s",
            stage,
            built.name,
            built.items.len(),
            built.time_limit_secs
        );
        self.stage = Some(StageState {
            mode: StageMode::Story { stage },
            name: built.name,
            phase: StagePhase::Playing,
            elapsed_ms: 0.0,
            time_limit_secs: built.time_limit_secs,
            combo: ComboScoreEngine::new(&self.tuning),
            noise: NoiseMeter::new(self.tuning.max_noise, self.tuning.noise_decay_per_sec),
            hazards: HazardStateMachine::new(
                built.platforms,
                built.zones,
                built.moonbeam,
                &self.tuning,
            ),
            items: built.items,
            actor: ActorState::new(built.cat_start),
        });
        Ok(())
    }

    /// Start a time-attack run against `boss`. Requires the unlock.
    pub fn start_time_attack(&mut self, boss: &str) -> Result<()> {
        if !self.progress.is_feature_unlocked() {
            log::warn!("Time attack requested before it was unlocked");
            return Err(EngineError::FeatureLocked);
        }
        let rules = TimeAttackRules::for_boss(boss, self.layouts.bosses())?;
        let built = self.layouts.gathering_layout(boss)?.build(&self.tuning, false);
        log::info!(
            "Time attack vs {} started: {} items, target {:.2}s",
            boss,
            built.items.len(),
            rules.target_time()
        );
        self.stage = Some(StageState {
            mode: StageMode::TimeAttack(rules),
            name: built.name,
            phase: StagePhase::Playing,
            elapsed_ms: 0.0,
            time_limit_secs: built.time_limit_secs,
            combo: ComboScoreEngine::new(&self.tuning),
            noise: NoiseMeter::new(self.tuning.max_noise, self.tuning.noise_decay_per_sec),
            hazards: HazardStateMachine::new(built.platforms, built.zones, None, &self.tuning),
            items: built.items,
            actor: ActorState::new(built.cat_start),
        });
        Ok(())
    }

    /// Rebuild the current stage from scratch. Power-ups and progress carry.
    pub fn restart(&mut self) -> Result<()> {
        let Some(stage) = self.stage.as_ref() else {
            return self.start_story_stage();
        };
        match stage.mode.clone() {
            StageMode::Story { stage } => self.start_stage(stage),
            StageMode::TimeAttack(rules) => self.start_time_attack(&rules.boss().id),
        }
    }

    /// Abandon the story run: progress and power-ups are cleared
    pub fn reset_story(&mut self) {
        self.progress.reset();
        self.powerups.reset();
        self.stage = None;
        log::info!("Story progress reset");
    }

    pub fn add_power_up(&mut self, id: PowerUpId) -> bool {
        self.powerups.add_power_up(id)
    }

    /// Draw `count` distinct power-ups to offer between stages
    pub fn offer_power_ups(&mut self, count: usize) -> Vec<PowerUpId> {
        self.powerups.random_power_ups(count, &mut self.rng)
    }

    /// Take every event recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    pub fn pending_events(&self) -> &EventQueue {
        &self.events
    }

    // === HUD accessors ===

    pub fn phase(&self) -> Option<StagePhase> {
        self.stage.as_ref().map(|s| s.phase)
    }

    pub fn score(&self) -> u64 {
        self.stage.as_ref().map_or(0, |s| s.combo.score())
    }

    pub fn noise(&self) -> f64 {
        self.stage.as_ref().map_or(0.0, |s| s.noise.level())
    }

    pub fn is_detected(&self) -> bool {
        self.stage.as_ref().is_some_and(|s| s.noise.is_detected())
    }

    /// (count, max)
    pub fn combo(&self) -> (u32, u32) {
        self.stage
            .as_ref()
            .map_or((0, 0), |s| (s.combo.count(), s.combo.max_count()))
    }

    pub fn thunder_status(&self) -> ThunderStatus {
        self.powerups.thunder_status()
    }

    pub fn actor_position(&self) -> Option<Vec2> {
        self.stage.as_ref().map(|s| s.actor.position)
    }

    // === Persistence ===

    /// Progress blob including the power-up set
    pub fn progress_snapshot(&self) -> ProgressSnapshot {
        self.progress.snapshot(self.powerups.snapshot())
    }

    pub fn restore_progress(&mut self, snapshot: &ProgressSnapshot) {
        self.progress.restore(snapshot);
        self.powerups.restore(&snapshot.power_ups);
        log::info!(
            "Progress restored: stage {}, {} power-ups",
            self.progress.current_stage(),
            self.powerups.active().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_stage_has_floor_and_items() {
        let mut session = GameSession::with_defaults(7).unwrap();
        assert_eq!(session.phase(), None);
        session.start_story_stage().unwrap();

        let stage = session.stage.as_ref().unwrap();
        assert_eq!(stage.mode, StageMode::Story { stage: 1 });
        assert_eq!(stage.time_limit_secs, 90);
        assert_eq!(stage.remaining_secs(), 90);
        assert!(stage.hazards.platform(0).is_some());
        assert!(stage.remaining_items() > 0);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_remaining_seconds_floor() {
        let mut session = GameSession::with_defaults(7).unwrap();
        session.start_stage(5).unwrap();
        let stage = session.stage.as_mut().unwrap();
        assert_eq!(stage.time_limit_secs, 65);
        stage.elapsed_ms = 1999.0;
        assert_eq!(stage.remaining_secs(), 64);
        stage.elapsed_ms = 70_000.0;
        assert_eq!(stage.remaining_secs(), 0);
    }

    #[test]
    fn test_time_attack_locked_until_first_clear() {
        let mut session = GameSession::with_defaults(7).unwrap();
        assert!(matches!(
            session.start_time_attack("kuro"),
            Err(EngineError::FeatureLocked)
        ));

        session.progress.complete_stage(100);
        session.start_time_attack("kuro").unwrap();
        assert!(!session.stage.as_ref().unwrap().is_story());
        assert!(matches!(
            session.start_time_attack("tama"),
            Err(EngineError::UnknownBoss(_))
        ));
    }

    #[test]
    fn test_restart_keeps_power_ups() {
        let mut session = GameSession::with_defaults(7).unwrap();
        session.start_stage(3).unwrap();
        assert!(session.add_power_up(PowerUpId::Bell));
        session.stage.as_mut().unwrap().elapsed_ms = 5000.0;

        session.restart().unwrap();
        let stage = session.stage.as_ref().unwrap();
        assert_eq!(stage.mode, StageMode::Story { stage: 3 });
        assert_eq!(stage.elapsed_ms, 0.0);
        assert!(session.powerups.has_power_up(PowerUpId::Bell));
    }

    #[test]
    fn test_offers_are_seeded() {
        let mut a = GameSession::with_defaults(99).unwrap();
        let mut b = GameSession::with_defaults(99).unwrap();
        let offer = a.offer_power_ups(3);
        assert_eq!(offer.len(), 3);
        assert_eq!(offer, b.offer_power_ups(3));
    }

    #[test]
    fn test_progress_round_trip_through_session() {
        let mut session = GameSession::with_defaults(1).unwrap();
        session.add_power_up(PowerUpId::Catnip);
        session.progress.complete_stage(2500);
        let snapshot = session.progress_snapshot();

        session.reset_story();
        assert!(session.powerups.active().is_empty());
        session.restore_progress(&snapshot);
        assert_eq!(session.progress.current_stage(), 2);
        assert_eq!(session.powerups.active(), &[PowerUpId::Catnip]);
    }

    #[test]
    fn test_no_stage_layouts_is_fatal() {
        let layouts =
            LayoutRegistry::from_json(r#"{"story": {}, "gathering": {}, "bosses": []}"#).unwrap();
        assert!(matches!(
            GameSession::new(1, Tuning::default(), layouts),
            Err(EngineError::NoStageLayouts)
        ));
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let tuning = Tuning {
            combo_bonus_period: 0,
            ..Tuning::default()
        };
        assert!(matches!(
            GameSession::new(1, tuning, LayoutRegistry::embedded().unwrap()),
            Err(EngineError::InvalidTuning(_))
        ));
    }
}
