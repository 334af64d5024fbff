//! Actor (cat) movement rules
//!
//! Physics integration is external; this turns movement intent plus the
//! physics-reported contact state into velocity commands and noise.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::{EffectKey, Multiplier};
use super::hazard::HazardStateMachine;
use super::powerup::PowerUpEngine;
use crate::tuning::Tuning;

/// Joystick dead zone on the movement axis
pub const AXIS_DEAD_ZONE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallSide {
    Left,
    Right,
}

/// Contact state resolved by the physics layer for this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActorReport {
    pub position: Vec2,
    pub on_ground: bool,
    /// Wall the actor is pressed against while airborne
    pub wall: Option<WallSide>,
}

impl Default for ActorReport {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            on_ground: true,
            wall: None,
        }
    }
}

/// Player intent for this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementIntent {
    /// -1 (left) ..= 1 (right)
    pub axis: f32,
    /// Edge-triggered jump press
    pub jump: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpKind {
    Ground,
    WallKick,
    Double,
}

/// Velocity commands for the physics layer, plus noise produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementOutcome {
    /// `None` leaves horizontal velocity to friction
    pub velocity_x: Option<f64>,
    pub velocity_y: Option<f64>,
    pub jump: Option<JumpKind>,
    pub noise: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorState {
    pub position: Vec2,
    /// 1 = right, -1 = left
    pub facing: f32,
    pub on_ground: bool,
    pub wall_kick_cooldown_ms: f64,
    pub double_jump_used: bool,
}

impl ActorState {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            facing: 1.0,
            on_ground: true,
            wall_kick_cooldown_ms: 0.0,
            double_jump_used: false,
        }
    }

    pub fn can_wall_kick(&self) -> bool {
        self.wall_kick_cooldown_ms <= 0.0
    }

    pub fn tick(&mut self, delta_ms: f64) {
        if self.wall_kick_cooldown_ms > 0.0 {
            self.wall_kick_cooldown_ms = (self.wall_kick_cooldown_ms - delta_ms).max(0.0);
        }
    }

    /// Landing restores the double jump
    pub fn on_landed(&mut self) {
        self.double_jump_used = false;
        self.on_ground = true;
    }

    pub fn apply(
        &mut self,
        intent: &MovementIntent,
        report: &ActorReport,
        hazards: &HazardStateMachine,
        powerups: &PowerUpEngine,
        tuning: &Tuning,
    ) -> MovementOutcome {
        self.position = report.position;
        self.on_ground = report.on_ground;
        let mut out = MovementOutcome::default();

        let direction = if intent.axis < -AXIS_DEAD_ZONE {
            -1.0
        } else if intent.axis > AXIS_DEAD_ZONE {
            1.0
        } else {
            0.0
        };
        // Stunned actors ignore horizontal input entirely
        if direction != 0.0 && !hazards.is_stunned() {
            let speed = tuning.base_speed
                * powerups.multiplier(Multiplier::Speed)
                * hazards.speed_factor(report.position);
            out.velocity_x = Some(speed * direction as f64);
            self.facing = direction;
            if report.on_ground {
                out.noise += tuning.walk_noise;
            }
        }

        if intent.jump {
            let jump_mult = powerups.multiplier(Multiplier::Jump);
            if report.on_ground {
                out.velocity_y = Some(-tuning.jump_velocity * jump_mult);
                out.jump = Some(JumpKind::Ground);
                out.noise += tuning.jump_noise;
            } else if let (Some(wall), true) = (report.wall, self.can_wall_kick()) {
                // Kick away from the wall
                let away = match wall {
                    WallSide::Left => 1.0,
                    WallSide::Right => -1.0,
                };
                out.velocity_x = Some(tuning.wall_kick_velocity_x * away);
                out.velocity_y = Some(-tuning.wall_kick_velocity_y * jump_mult);
                out.jump = Some(JumpKind::WallKick);
                out.noise += tuning.wall_kick_noise;
                self.facing = away as f32;
                self.wall_kick_cooldown_ms = tuning.wall_kick_cooldown_ms;
            } else if powerups.has_effect(EffectKey::DoubleJump) && !self.double_jump_used {
                out.velocity_y = Some(-tuning.jump_velocity * jump_mult);
                out.jump = Some(JumpKind::Double);
                self.double_jump_used = true;
            }
        }
        out
    }
}
