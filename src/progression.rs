//! Story-mode progression
//!
//! Stage sequencing, cumulative score and the one-way time-attack unlock.
//! Persisted by the caller through [`ProgressSnapshot`].

use serde::{Deserialize, Serialize};

use crate::consts::MAX_STAGE;
use crate::sim::powerup::PowerUpSnapshot;

/// Outcome of completing a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageAdvance {
    /// The run goes on (always true; the story loops)
    pub continue_run: bool,
    /// Every stage of the run has been cleared
    pub completed: bool,
    /// Play the ending before returning to stage 1
    pub ending: bool,
}

/// Persisted progress blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub current_stage: u32,
    pub total_score: u64,
    pub stages_cleared: u32,
    #[serde(alias = "gatheringUnlocked")]
    pub feature_unlocked: bool,
    pub power_ups: PowerUpSnapshot,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            current_stage: 1,
            total_score: 0,
            stages_cleared: 0,
            feature_unlocked: false,
            power_ups: PowerUpSnapshot::default(),
        }
    }
}

/// Story run progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryProgress {
    current_stage: u32,
    max_stage: u32,
    total_score: u64,
    stages_cleared: u32,
    feature_unlocked: bool,
}

impl Default for StoryProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryProgress {
    pub fn new() -> Self {
        Self::with_max_stage(MAX_STAGE)
    }

    pub fn with_max_stage(max_stage: u32) -> Self {
        Self {
            current_stage: 1,
            max_stage: max_stage.max(1),
            total_score: 0,
            stages_cleared: 0,
            feature_unlocked: false,
        }
    }

    pub fn current_stage(&self) -> u32 {
        self.current_stage
    }

    pub fn max_stage(&self) -> u32 {
        self.max_stage
    }

    pub fn total_score(&self) -> u64 {
        self.total_score
    }

    pub fn stages_cleared(&self) -> u32 {
        self.stages_cleared
    }

    pub fn is_feature_unlocked(&self) -> bool {
        self.feature_unlocked
    }

    /// Bank a cleared stage and move to the next one, wrapping after the last
    pub fn complete_stage(&mut self, score: u64) -> StageAdvance {
        self.total_score += score;
        self.stages_cleared += 1;
        // One clear is enough; never reverts short of reset()
        self.feature_unlocked = true;

        if self.current_stage < self.max_stage {
            self.current_stage += 1;
            log::info!("Stage cleared, advancing to stage {}", self.current_stage);
            StageAdvance {
                continue_run: true,
                completed: false,
                ending: false,
            }
        } else {
            self.current_stage = 1;
            log::info!("All {} stages cleared (total {})", self.max_stage, self.total_score);
            StageAdvance {
                continue_run: true,
                completed: true,
                ending: true,
            }
        }
    }

    /// Start over. Clears the unlock too.
    pub fn reset(&mut self) {
        *self = Self::with_max_stage(self.max_stage);
    }

    pub fn snapshot(&self, power_ups: PowerUpSnapshot) -> ProgressSnapshot {
        ProgressSnapshot {
            current_stage: self.current_stage,
            total_score: self.total_score,
            stages_cleared: self.stages_cleared,
            feature_unlocked: self.feature_unlocked,
            power_ups,
        }
    }

    /// Restore from save data; out-of-range stages fall back to stage 1
    pub fn restore(&mut self, snapshot: &ProgressSnapshot) {
        self.current_stage = if (1..=self.max_stage).contains(&snapshot.current_stage) {
            snapshot.current_stage
        } else {
            log::warn!("Saved stage {} out of range, using 1", snapshot.current_stage);
            1
        };
        self.total_score = snapshot.total_score;
        self.stages_cleared = snapshot.stages_cleared;
        self.feature_unlocked = snapshot.feature_unlocked;
    }
}
