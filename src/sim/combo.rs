//! Combo and score accumulation
//!
//! Each break extends the combo window and scales the item's score by the
//! combo depth. Every fifth step pays a flat bonus, and three breaks in
//! quick succession pay the domino bonus.

use serde::{Deserialize, Serialize};

use super::catalog::Multiplier;
use super::powerup::PowerUpEngine;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    pub count: u32,
    pub max_count: u32,
    /// Remaining window in 16 ms frames
    pub timer: f64,
    pub chain_count: u32,
    pub last_break_ms: Option<f64>,
}

/// Score breakdown for a single break
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakScore {
    pub item_score: u64,
    /// Periodic combo bonus (0 unless this step is a multiple of the period)
    pub combo_bonus: u64,
    pub domino_bonus: u64,
    pub combo: u32,
    pub in_moonbeam: bool,
}

impl BreakScore {
    pub fn total(&self) -> u64 {
        self.item_score + self.combo_bonus + self.domino_bonus
    }

    pub fn was_domino_bonus(&self) -> bool {
        self.domino_bonus > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ComboRules {
    base_window: f64,
    step: f64,
    bonus_period: u32,
    bonus_per_count: u64,
    domino_window_ms: f64,
    chain_length: u32,
    domino_bonus: u64,
    moonbeam_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboScoreEngine {
    state: ComboState,
    score: u64,
    rules: ComboRules,
}

impl ComboScoreEngine {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            state: ComboState::default(),
            score: 0,
            rules: ComboRules {
                base_window: tuning.base_combo_window,
                step: tuning.combo_step,
                bonus_period: tuning.combo_bonus_period,
                bonus_per_count: tuning.combo_bonus_per_count,
                domino_window_ms: tuning.domino_window_ms,
                chain_length: tuning.domino_chain_length,
                domino_bonus: tuning.domino_bonus,
                moonbeam_multiplier: tuning.moonbeam_multiplier,
            },
        }
    }

    pub fn state(&self) -> &ComboState {
        &self.state
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn count(&self) -> u32 {
        self.state.count
    }

    pub fn max_count(&self) -> u32 {
        self.state.max_count
    }

    /// Register a break at `now_ms` (session clock) and award its score
    pub fn on_item_break(
        &mut self,
        base_score: u32,
        in_moonbeam: bool,
        now_ms: f64,
        powerups: &PowerUpEngine,
    ) -> BreakScore {
        let rules = &self.rules;
        let state = &mut self.state;

        state.count += 1;
        state.max_count = state.max_count.max(state.count);
        state.timer = rules.base_window * powerups.multiplier(Multiplier::ComboTime);

        let combo_mult = 1.0 + state.count as f64 * rules.step;
        let beam_mult = if in_moonbeam {
            rules.moonbeam_multiplier
        } else {
            1.0
        };
        let item_score = (base_score as f64
            * powerups.multiplier(Multiplier::Score)
            * combo_mult
            * beam_mult)
            .floor()
            .max(0.0) as u64;

        let combo_bonus = if state.count % rules.bonus_period == 0 {
            state.count as u64 * rules.bonus_per_count
        } else {
            0
        };

        // Chain resets to 1 on a slow break but to 0 after paying out
        let chained = state
            .last_break_ms
            .is_some_and(|last| now_ms - last <= rules.domino_window_ms);
        state.chain_count = if chained { state.chain_count + 1 } else { 1 };
        state.last_break_ms = Some(now_ms);
        let domino_bonus = if state.chain_count >= rules.chain_length {
            state.chain_count = 0;
            rules.domino_bonus
        } else {
            0
        };

        let result = BreakScore {
            item_score,
            combo_bonus,
            domino_bonus,
            combo: state.count,
            in_moonbeam,
        };
        self.score += result.total();
        result
    }

    /// Flat award outside the combo system (time-attack scoring)
    pub fn award(&mut self, points: u64) {
        self.score += points;
    }

    /// Run down the combo window. Returns true if the combo lapsed.
    pub fn tick(&mut self, delta_ms: f64) -> bool {
        if self.state.timer > 0.0 {
            self.state.timer -= delta_ms / 16.0;
        }
        if self.state.timer <= 0.0 && self.state.count > 0 {
            self.state.count = 0;
            return true;
        }
        false
    }

    /// Per-stage reset
    pub fn reset(&mut self) {
        self.state = ComboState::default();
        self.score = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::catalog::{PowerUpCatalog, PowerUpId};

    fn powerups() -> PowerUpEngine {
        PowerUpEngine::new(PowerUpCatalog::standard().unwrap())
    }

    #[test]
    fn test_score_formula() {
        let pu = powerups();
        let mut combo = ComboScoreEngine::new(&Tuning::default());
        // 200 * 1.15 lands just under 230 in binary floating point
        let first = combo.on_item_break(200, false, 0.0, &pu);
        assert_eq!(first.item_score, 229);
        assert_eq!(first.combo, 1);
        let second = combo.on_item_break(200, false, 5000.0, &pu);
        assert_eq!(second.item_score, 260);
        assert_eq!(combo.score(), 489);
    }

    #[test]
    fn test_moonbeam_and_score_multiplier() {
        let mut pu = powerups();
        pu.add_power_up(PowerUpId::Bell);
        let mut combo = ComboScoreEngine::new(&Tuning::default());
        // 80 * 2 * 1.15 * 1.5 = 276
        let s = combo.on_item_break(80, true, 0.0, &pu);
        assert_eq!(s.item_score, 276);
        assert!(s.in_moonbeam);
    }

    #[test]
    fn test_fifth_break_pays_combo_bonus() {
        let pu = powerups();
        let mut combo = ComboScoreEngine::new(&Tuning::default());
        let mut bonuses = Vec::new();
        for i in 0..5 {
            // 2s apart: no domino chains
            let s = combo.on_item_break(10, false, i as f64 * 2000.0, &pu);
            bonuses.push(s.combo_bonus);
            combo.tick(100.0);
        }
        assert_eq!(combo.count(), 5);
        assert_eq!(bonuses, vec![0, 0, 0, 0, 125]);
    }

    #[test]
    fn test_domino_chain() {
        let pu = powerups();
        let mut combo = ComboScoreEngine::new(&Tuning::default());
        let times = [0.0, 400.0, 800.0, 1200.0, 1600.0, 2000.0, 5000.0];
        let dominos: Vec<bool> = times
            .iter()
            .map(|t| combo.on_item_break(10, false, *t, &pu).was_domino_bonus())
            .collect();
        assert_eq!(dominos, vec![false, false, true, false, false, true, false]);
        assert_eq!(combo.state().chain_count, 1);
    }

    #[test]
    fn test_slow_break_restarts_chain_at_one() {
        let pu = powerups();
        let mut combo = ComboScoreEngine::new(&Tuning::default());
        combo.on_item_break(10, false, 0.0, &pu);
        combo.on_item_break(10, false, 500.0, &pu);
        combo.on_item_break(10, false, 3000.0, &pu);
        assert_eq!(combo.state().chain_count, 1);
        assert_eq!(combo.state().last_break_ms, Some(3000.0));
    }

    #[test]
    fn test_combo_lapses_after_window() {
        let pu = powerups();
        let mut combo = ComboScoreEngine::new(&Tuning::default());
        combo.on_item_break(10, false, 0.0, &pu);
        combo.on_item_break(10, false, 2000.0, &pu);
        // Window is 80 frames of 16 ms = 1280 ms
        assert!(!combo.tick(1200.0));
        assert_eq!(combo.count(), 2);
        assert!(combo.tick(100.0));
        assert_eq!(combo.count(), 0);
        assert_eq!(combo.max_count(), 2);
        assert!(!combo.tick(16.0));
    }

    #[test]
    fn test_cat_toy_doubles_window() {
        let mut pu = powerups();
        pu.add_power_up(PowerUpId::CatToy);
        let mut combo = ComboScoreEngine::new(&Tuning::default());
        combo.on_item_break(10, false, 0.0, &pu);
        assert_eq!(combo.state().timer, 160.0);
        assert!(!combo.tick(2000.0));
        assert!(combo.tick(600.0));
    }
}
