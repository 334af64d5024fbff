//! Active power-up set and the thunder ability
//!
//! Up to five power-ups can be held at once. Their multipliers compose by
//! product; the thunder ability is a time-gated silence with a cooldown.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::catalog::{EffectKey, EffectValue, Multiplier, PowerUpCatalog, PowerUpId};
use crate::consts::MAX_POWER_UPS;

/// Thunder ability state (seconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThunderStatus {
    pub active: bool,
    pub remaining: f64,
    pub cooldown: f64,
}

/// Persisted shape of the power-up state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PowerUpSnapshot {
    pub active_power_ups: Vec<String>,
    pub thunder_cooldown: f64,
}

/// Tracks the active power-up set for one story run
#[derive(Debug, Clone)]
pub struct PowerUpEngine {
    catalog: PowerUpCatalog,
    /// Activation order matters for first-match value lookups
    active: Vec<PowerUpId>,
    thunder: ThunderStatus,
}

impl PowerUpEngine {
    pub fn new(catalog: PowerUpCatalog) -> Self {
        Self {
            catalog,
            active: Vec::with_capacity(MAX_POWER_UPS),
            thunder: ThunderStatus::default(),
        }
    }

    pub fn catalog(&self) -> &PowerUpCatalog {
        &self.catalog
    }

    pub fn active(&self) -> &[PowerUpId] {
        &self.active
    }

    /// Add a power-up. Duplicates are allowed and compound.
    pub fn add_power_up(&mut self, id: PowerUpId) -> bool {
        if self.active.len() >= MAX_POWER_UPS {
            log::warn!("Maximum power-ups reached, rejecting {}", id.as_str());
            return false;
        }
        if !self.catalog.contains(id) {
            log::warn!("Invalid power-up ID: {}", id.as_str());
            return false;
        }
        self.active.push(id);
        true
    }

    /// Add by wire name (offers and save data arrive as strings)
    pub fn add_power_up_named(&mut self, name: &str) -> bool {
        match PowerUpId::from_name(name) {
            Some(id) => self.add_power_up(id),
            None => {
                log::warn!("Invalid power-up ID: {}", name);
                false
            }
        }
    }

    pub fn has_power_up(&self, id: PowerUpId) -> bool {
        self.active.contains(&id)
    }

    fn active_definitions(&self) -> impl Iterator<Item = &super::catalog::PowerUpDefinition> {
        self.active.iter().filter_map(|id| self.catalog.get(*id))
    }

    /// Composite multiplier over every active entry (1.0 with none)
    pub fn multiplier(&self, kind: Multiplier) -> f64 {
        self.active_definitions()
            .map(|def| def.multiplier_factor(kind))
            .product()
    }

    pub fn has_effect(&self, key: EffectKey) -> bool {
        self.effect_value(key).is_some()
    }

    /// First active entry, in activation order, exposing `key`
    pub fn effect_value(&self, key: EffectKey) -> Option<EffectValue> {
        self.active_definitions().find_map(|def| def.value(key))
    }

    fn effect_number(&self, key: EffectKey) -> f64 {
        self.effect_value(key)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    /// Try to start the silence. No side effects on failure.
    pub fn activate_thunder(&mut self) -> bool {
        if !self.has_power_up(PowerUpId::Thunder) {
            return false;
        }
        if self.thunder.cooldown > 0.0 {
            return false;
        }

        self.thunder = ThunderStatus {
            active: true,
            remaining: self.effect_number(EffectKey::SilentDuration),
            cooldown: self.effect_number(EffectKey::Cooldown),
        };
        log::info!(
            "Thunder active for {:.1}s (cooldown {:.1}s)",
            self.thunder.remaining,
            self.thunder.cooldown
        );
        true
    }

    /// Advance timers. Returns true when the silence ended this tick.
    pub fn tick(&mut self, delta_ms: f64) -> bool {
        let dt = delta_ms / 1000.0;
        if self.thunder.cooldown > 0.0 {
            self.thunder.cooldown -= dt;
        }
        if self.thunder.active {
            self.thunder.remaining -= dt;
            if self.thunder.remaining <= 0.0 {
                self.thunder.active = false;
                return true;
            }
        }
        false
    }

    pub fn is_thunder_active(&self) -> bool {
        self.thunder.active
    }

    /// Copy of the thunder state with timers clamped at 0 for the HUD
    pub fn thunder_status(&self) -> ThunderStatus {
        ThunderStatus {
            remaining: self.thunder.remaining.max(0.0),
            cooldown: self.thunder.cooldown.max(0.0),
            ..self.thunder
        }
    }

    /// Draw `count` distinct ids from the whole catalog in shuffled order
    pub fn random_power_ups<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<PowerUpId> {
        let mut ids: Vec<PowerUpId> = self.catalog.ids().collect();
        ids.shuffle(rng);
        ids.truncate(count);
        ids
    }

    pub fn snapshot(&self) -> PowerUpSnapshot {
        PowerUpSnapshot {
            active_power_ups: self.active.iter().map(|id| id.as_str().to_string()).collect(),
            thunder_cooldown: self.thunder.cooldown,
        }
    }

    /// Restore from save data. Unknown ids are dropped.
    pub fn restore(&mut self, snapshot: &PowerUpSnapshot) {
        self.reset();
        for name in &snapshot.active_power_ups {
            self.add_power_up_named(name);
        }
        if snapshot.thunder_cooldown.is_finite() {
            self.thunder.cooldown = snapshot.thunder_cooldown;
        }
    }

    pub fn reset(&mut self) {
        self.active.clear();
        self.thunder = ThunderStatus::default();
    }
}
