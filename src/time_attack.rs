//! Time-attack ("gathering") ranking
//!
//! A run against a boss cat is won by breaking everything faster than the
//! boss's target time. Best times are kept per boss.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Letter grade for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
    D,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
        };
        f.write_str(letter)
    }
}

/// A time-attack opponent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BossProfile {
    pub id: String,
    /// 1 (easiest) ..= 4
    pub difficulty: u32,
    /// Seconds to beat
    pub target_time: f64,
}

/// Win and rank rules against one boss
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAttackRules {
    boss: BossProfile,
}

impl TimeAttackRules {
    pub fn new(boss: BossProfile) -> Self {
        Self { boss }
    }

    /// Look up `id` among `bosses`
    pub fn for_boss(id: &str, bosses: &[BossProfile]) -> Result<Self> {
        bosses
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .map(Self::new)
            .ok_or_else(|| EngineError::UnknownBoss(id.to_string()))
    }

    pub fn boss(&self) -> &BossProfile {
        &self.boss
    }

    pub fn target_time(&self) -> f64 {
        self.boss.target_time
    }

    pub fn check_win(&self, player_time: f64) -> bool {
        player_time < self.boss.target_time
    }

    /// Positive when slower than the target
    pub fn time_difference(&self, player_time: f64) -> f64 {
        player_time - self.boss.target_time
    }

    pub fn rank(&self, player_time: f64) -> Rank {
        let diff = self.boss.target_time - player_time;
        if diff >= 10.0 {
            Rank::S
        } else if diff >= 5.0 {
            Rank::A
        } else if diff >= 0.0 {
            Rank::B
        } else if diff >= -5.0 {
            Rank::C
        } else {
            Rank::D
        }
    }
}

/// Best clear time per boss id (seconds)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BestTimes {
    times: BTreeMap<String, f64>,
}

impl BestTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, boss: &str) -> Option<f64> {
        self.times.get(boss).copied()
    }

    /// Record `time` if it beats the current best. Ties do not count.
    pub fn record(&mut self, boss: &str, time: f64) -> bool {
        if !time.is_finite() {
            return false;
        }
        match self.times.get(boss) {
            Some(best) if time >= *best => false,
            _ => {
                self.times.insert(boss.to_string(), time);
                log::info!("New best time for {}: {:.2}s", boss, time);
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.times.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}
