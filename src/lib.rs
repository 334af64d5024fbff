//! Midnight Meowathon - rules engine for a cat-breaks-everything platformer
//!
//! Core modules:
//! - `sim`: Deterministic rules engine (power-ups, noise, combos, hazards, items)
//! - `events`: Typed domain events and the publish/subscribe bus
//! - `progression`: Story-mode stage sequencing and unlocks
//! - `time_attack`: Boss time-attack ranking and best times
//! - `persistence`: Save/load of the persisted state blob
//! - `tuning`: Data-driven game balance

pub mod error;
pub mod events;
pub mod persistence;
pub mod progression;
pub mod sim;
pub mod time_attack;
pub mod tuning;

pub use error::{EngineError, Result};
pub use events::{EventBus, EventQueue, EventSubscriber, GameEvent};
pub use progression::{StageAdvance, StoryProgress};
pub use time_attack::{BestTimes, BossProfile, Rank, TimeAttackRules};
pub use tuning::Tuning;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// World configuration constants
pub mod consts {
    /// Playfield dimensions (pixels)
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 550.0;

    /// Implicit floor added under every story stage
    pub const FLOOR_Y: f32 = WORLD_HEIGHT - 5.0;
    pub const FLOOR_WIDTH: f32 = WORLD_WIDTH - 20.0;
    pub const FLOOR_THICKNESS: f32 = 10.0;

    /// Unscaled breakable sprite edge length
    pub const ITEM_SIZE: f32 = 32.0;
    /// How far above a platform an item may sit and still be carried by it
    pub const SUPPORT_MARGIN: f32 = 24.0;

    /// Number of story stages before the run wraps back to stage 1
    pub const MAX_STAGE: u32 = 5;
    /// Maximum simultaneously active power-ups
    pub const MAX_POWER_UPS: usize = 5;
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Build from a center point and full size (layout data is center-based)
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Point containment, edges inclusive
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Overlap test, touching edges count
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Grow the top edge upward (screen y points down)
    pub fn extend_up(&self, amount: f32) -> Self {
        Self {
            min: Vec2::new(self.min.x, self.min.y - amount),
            max: self.max,
        }
    }
}
