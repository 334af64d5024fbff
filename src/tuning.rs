//! Game balance tuning
//!
//! Every number the rules engine uses lives here so balance can be adjusted
//! from data. Loaded from JSON; missing fields take the shipped defaults.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Balance values for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    // === Combo / score ===
    /// Combo window in 16 ms frames
    pub base_combo_window: f64,
    /// Score multiplier added per combo step
    pub combo_step: f64,
    /// Every Nth combo count pays a flat bonus
    pub combo_bonus_period: u32,
    /// Flat bonus per combo count on those steps
    pub combo_bonus_per_count: u64,
    /// Max gap between breaks that still chains a domino (ms)
    pub domino_window_ms: f64,
    /// Breaks needed to pay a domino bonus
    pub domino_chain_length: u32,
    pub domino_bonus: u64,
    pub moonbeam_multiplier: f64,

    // === Noise ===
    pub max_noise: f64,
    /// Continuous decay (per second)
    pub noise_decay_per_sec: f64,
    /// Break noise factor inside a soft zone
    pub soft_zone_factor: f64,
    pub landing_noise: f64,
    pub hard_landing_noise: f64,
    /// Impact velocity above which a landing counts as hard
    pub hard_landing_velocity: f64,
    pub jump_noise: f64,
    pub wall_kick_noise: f64,
    /// Added every tick the actor walks on the ground
    pub walk_noise: f64,

    // === Hazards ===
    pub crumble_delay_ms: f64,
    pub stun_ms: f64,
    pub slow_zone_factor: f64,
    pub bounce_velocity: f64,

    // === Actor ===
    pub base_speed: f64,
    pub jump_velocity: f64,
    pub wall_kick_velocity_x: f64,
    pub wall_kick_velocity_y: f64,
    pub wall_kick_cooldown_ms: f64,

    // === Items ===
    /// Wobble before a touched item starts to fall (ms)
    pub wobble_ms: f64,
    /// Items worth at least this much request slow motion when they fall
    pub heavy_item_score: u32,
    pub fallback_item_score: u32,
    pub fallback_item_noise: f64,

    // === Stage ===
    pub default_time_limit_secs: u32,
    pub time_bonus_per_sec: u64,
    pub survival_bonus: u64,
    pub max_combo_bonus: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Combo / score
            base_combo_window: 80.0,
            combo_step: 0.15,
            combo_bonus_period: 5,
            combo_bonus_per_count: 25,
            domino_window_ms: 1000.0,
            domino_chain_length: 3,
            domino_bonus: 500,
            moonbeam_multiplier: 1.5,

            // Noise
            max_noise: 100.0,
            noise_decay_per_sec: 3.0,
            soft_zone_factor: 0.5,
            landing_noise: 2.0,
            hard_landing_noise: 4.0,
            hard_landing_velocity: 400.0,
            jump_noise: 1.5,
            wall_kick_noise: 1.0,
            walk_noise: 0.004,

            // Hazards
            crumble_delay_ms: 2000.0,
            stun_ms: 1500.0,
            slow_zone_factor: 0.5,
            bounce_velocity: 450.0,

            // Actor
            base_speed: 280.0,
            jump_velocity: 500.0,
            wall_kick_velocity_x: 400.0,
            wall_kick_velocity_y: 480.0,
            wall_kick_cooldown_ms: 120.0,

            // Items (3 wobble swings of 60 ms out and back)
            wobble_ms: 360.0,
            heavy_item_score: 100,
            fallback_item_score: 50,
            fallback_item_noise: 8.0,

            // Stage
            default_time_limit_secs: 90,
            time_bonus_per_sec: 10,
            survival_bonus: 500,
            max_combo_bonus: 50,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidTuning(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Parse tuning, falling back to defaults on any problem
    pub fn load_or_default(json: Option<&str>) -> Self {
        match json.map(Self::from_json) {
            Some(Ok(tuning)) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Some(Err(e)) => {
                log::warn!("Ignoring tuning overrides: {}", e);
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Reject values that would break engine invariants
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("baseComboWindow", self.base_combo_window),
            ("comboStep", self.combo_step),
            ("dominoWindowMs", self.domino_window_ms),
            ("moonbeamMultiplier", self.moonbeam_multiplier),
            ("maxNoise", self.max_noise),
            ("noiseDecayPerSec", self.noise_decay_per_sec),
            ("softZoneFactor", self.soft_zone_factor),
            ("crumbleDelayMs", self.crumble_delay_ms),
            ("stunMs", self.stun_ms),
            ("slowZoneFactor", self.slow_zone_factor),
            ("wobbleMs", self.wobble_ms),
            ("wallKickCooldownMs", self.wall_kick_cooldown_ms),
        ];
        for (name, value) in finite {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidTuning(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        if self.max_noise <= 0.0 {
            return Err(EngineError::InvalidTuning("maxNoise must be positive".into()));
        }
        if self.combo_bonus_period == 0 || self.domino_chain_length == 0 {
            return Err(EngineError::InvalidTuning(
                "comboBonusPeriod and dominoChainLength must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
