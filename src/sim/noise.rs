//! Noise / detection meter
//!
//! Bounded to [0, cap]. Reaching the cap latches a one-shot detection.

use serde::{Deserialize, Serialize};

use super::catalog::Multiplier;
use super::powerup::PowerUpEngine;

/// Result of feeding noise into the meter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseOutcome {
    /// Thunder silence swallowed the noise
    Silenced,
    Changed { level: f64 },
    /// The cap was reached for the first time this stage
    Detected { level: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseMeter {
    level: f64,
    cap: f64,
    decay_per_sec: f64,
    detected: bool,
}

impl NoiseMeter {
    pub fn new(cap: f64, decay_per_sec: f64) -> Self {
        Self {
            level: 0.0,
            cap,
            decay_per_sec,
            detected: false,
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }

    /// Set the level directly (stage scripting and tests), clamped
    pub fn set_level(&mut self, level: f64) {
        self.level = level.clamp(0.0, self.cap);
    }

    /// Add noise scaled by the active noise multiplier. No-op while silenced.
    pub fn add_noise(&mut self, amount: f64, powerups: &PowerUpEngine) -> NoiseOutcome {
        if powerups.is_thunder_active() {
            return NoiseOutcome::Silenced;
        }
        let scaled = amount * powerups.multiplier(Multiplier::Noise);
        self.level = (self.level + scaled).clamp(0.0, self.cap);

        if self.level >= self.cap && !self.detected {
            self.detected = true;
            log::info!("Owner woke up (noise {:.1})", self.level);
            return NoiseOutcome::Detected { level: self.level };
        }
        NoiseOutcome::Changed { level: self.level }
    }

    /// Remove noise regardless of thunder state (fish heal)
    pub fn heal(&mut self, amount: f64) {
        self.level = (self.level - amount).max(0.0);
    }

    /// Continuous decay; runs whether or not thunder is active
    pub fn decay(&mut self, delta_ms: f64) {
        self.level = (self.level - self.decay_per_sec * delta_ms / 1000.0).max(0.0);
    }

    /// Per-stage reset
    pub fn reset(&mut self) {
        self.level = 0.0;
        self.detected = false;
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
    fn test_decay_default_rate() {
        let mut meter = NoiseMeter::new(100.0, 3.0);
        meter.set_level(40.0);
        meter.decay(1000.0);
        assert_eq!(meter.level(), 37.0);

        meter.decay(60_000.0);
        assert_eq!(meter.level(), 0.0);
    }

    #[test]
    fn test_noise_multiplier_applies() {
        let mut pu = powerups();
        pu.add_power_up(PowerUpId::Bell);
        let mut meter = NoiseMeter::new(100.0, 3.0);
        assert_eq!(
            meter.add_noise(10.0, &pu),
            NoiseOutcome::Changed { level: 20.0 }
        );
    }

    #[test]
    fn test_detection_is_one_shot() {
        let pu = powerups();
        let mut meter = NoiseMeter::new(100.0, 3.0);
        meter.add_noise(90.0, &pu);
        assert_eq!(
            meter.add_noise(30.0, &pu),
            NoiseOutcome::Detected { level: 100.0 }
        );
        assert!(meter.is_detected());
        assert_eq!(
            meter.add_noise(5.0, &pu),
            NoiseOutcome::Changed { level: 100.0 }
        );

        meter.reset();
        assert!(!meter.is_detected());
        assert_eq!(meter.level(), 0.0);
    }

    #[test]
    fn test_thunder_silences_but_decay_runs() {
        let mut pu = powerups();
        pu.add_power_up(PowerUpId::Thunder);
        assert!(pu.activate_thunder());

        let mut meter = NoiseMeter::new(100.0, 3.0);
        meter.set_level(50.0);
        assert_eq!(meter.add_noise(80.0, &pu), NoiseOutcome::Silenced);
        assert_eq!(meter.level(), 50.0);

        meter.decay(2000.0);
        assert_eq!(meter.level(), 44.0);
    }

    #[test]
    fn test_heal_floors_at_zero() {
        let mut meter = NoiseMeter::new(100.0, 3.0);
        meter.set_level(3.0);
        meter.heal(5.0);
        assert_eq!(meter.level(), 0.0);
    }
}
