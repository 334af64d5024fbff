//! Special platforms and zones
//!
//! Platforms react to the actor landing on them (bounce, crumble, comfy
//! stun). Zones modify breaks and movement by position. All timers are plain
//! countdowns advanced by [`HazardStateMachine::tick`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::Multiplier;
use super::powerup::PowerUpEngine;
use crate::consts::{SUPPORT_MARGIN, WORLD_HEIGHT};
use crate::tuning::Tuning;
use crate::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlatformKind {
    #[default]
    Normal,
    Bouncy,
    /// Survives one landing, collapses after the second plus a delay
    Crumbling,
    /// Stuns horizontal movement on landing
    Comfy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub kind: PlatformKind,
    pub rect: Rect,
    /// Only ever increases
    pub land_count: u32,
    /// Pending collapse countdown (ms)
    pub collapse_timer_ms: Option<f64>,
    pub collapsed: bool,
}

impl Platform {
    pub fn new(id: u32, kind: PlatformKind, rect: Rect) -> Self {
        Self {
            id,
            kind,
            rect,
            land_count: 0,
            collapse_timer_ms: None,
            collapsed: false,
        }
    }

    /// Region whose contents are carried by this platform
    pub fn support_region(&self) -> Rect {
        self.rect.extend_up(SUPPORT_MARGIN)
    }
}

/// What a landing did
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformOutcome {
    /// Upward velocity to apply instead of normal landing physics
    pub bounce_velocity: Option<f64>,
    pub crumble_warning: bool,
    pub collapse_scheduled: bool,
    pub stunned: bool,
    /// Platform is already gone; landing ignored
    pub collapsed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoneKind {
    /// Halves break noise
    Soft,
    /// Halves horizontal speed
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub rect: Rect,
}

/// Beam sweeping back and forth across the stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moonbeam {
    pub start_x: f32,
    pub end_x: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// Full there-and-back period (ms)
    pub cycle_ms: f64,
}

impl Moonbeam {
    pub fn new(start_x: f32, end_x: f32, top: f32, width: f32, cycle_ms: f64) -> Self {
        Self {
            start_x,
            end_x,
            top,
            width,
            height: WORLD_HEIGHT - top,
            cycle_ms,
        }
    }

    /// Beam center at `elapsed_ms`, moving linearly start -> end -> start
    pub fn center_x(&self, elapsed_ms: f64) -> f32 {
        if self.cycle_ms <= 0.0 {
            return self.start_x;
        }
        let phase = elapsed_ms.rem_euclid(self.cycle_ms) / self.cycle_ms;
        let t = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
        self.start_x + (self.end_x - self.start_x) * t as f32
    }

    pub fn bounds(&self, elapsed_ms: f64) -> Rect {
        let cx = self.center_x(elapsed_ms);
        Rect {
            min: Vec2::new(cx - self.width / 2.0, self.top),
            max: Vec2::new(cx + self.width / 2.0, self.top + self.height),
        }
    }

    pub fn contains(&self, p: Vec2, elapsed_ms: f64) -> bool {
        self.bounds(elapsed_ms).contains(p)
    }
}

/// Timer-driven changes from one hazard tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HazardTick {
    pub collapsed: Vec<u32>,
    pub stun_ended: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HazardRules {
    crumble_delay_ms: f64,
    stun_ms: f64,
    bounce_velocity: f64,
    soft_zone_factor: f64,
    slow_zone_factor: f64,
}

/// Per-stage hazard state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardStateMachine {
    /// Sorted by id
    platforms: Vec<Platform>,
    zones: Vec<Zone>,
    moonbeam: Option<Moonbeam>,
    stun_remaining_ms: f64,
    rules: HazardRules,
}

impl HazardStateMachine {
    pub fn new(
        mut platforms: Vec<Platform>,
        zones: Vec<Zone>,
        moonbeam: Option<Moonbeam>,
        tuning: &Tuning,
    ) -> Self {
        platforms.sort_by_key(|p| p.id);
        Self {
            platforms,
            zones,
            moonbeam,
            stun_remaining_ms: 0.0,
            rules: HazardRules {
                crumble_delay_ms: tuning.crumble_delay_ms,
                stun_ms: tuning.stun_ms,
                bounce_velocity: tuning.bounce_velocity,
                soft_zone_factor: tuning.soft_zone_factor,
                slow_zone_factor: tuning.slow_zone_factor,
            },
        }
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn platform(&self, id: u32) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id == id)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn moonbeam(&self) -> Option<&Moonbeam> {
        self.moonbeam.as_ref()
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_remaining_ms > 0.0
    }

    pub fn stun_remaining_ms(&self) -> f64 {
        self.stun_remaining_ms.max(0.0)
    }

    /// React to the actor landing on `id`. `None` for unknown platforms.
    pub fn on_platform_landed(
        &mut self,
        id: u32,
        powerups: &PowerUpEngine,
    ) -> Option<PlatformOutcome> {
        let Some(platform) = self.platforms.iter_mut().find(|p| p.id == id) else {
            log::warn!("Landing on unknown platform {}", id);
            return None;
        };
        let mut outcome = PlatformOutcome::default();
        if platform.collapsed {
            outcome.collapsed = true;
            return Some(outcome);
        }

        match platform.kind {
            PlatformKind::Normal => {}
            PlatformKind::Bouncy => {
                let jump = powerups.multiplier(Multiplier::Jump);
                outcome.bounce_velocity = Some(-self.rules.bounce_velocity * jump);
            }
            PlatformKind::Crumbling => {
                platform.land_count += 1;
                match platform.land_count {
                    1 => outcome.crumble_warning = true,
                    2 => {
                        platform.collapse_timer_ms = Some(self.rules.crumble_delay_ms);
                        outcome.collapse_scheduled = true;
                        log::debug!("Platform {} will collapse", id);
                    }
                    _ => {}
                }
            }
            PlatformKind::Comfy => {
                if self.stun_remaining_ms <= 0.0 {
                    self.stun_remaining_ms = self.rules.stun_ms;
                    outcome.stunned = true;
                }
            }
        }
        Some(outcome)
    }

    /// Advance collapse and stun countdowns
    pub fn tick(&mut self, delta_ms: f64) -> HazardTick {
        let mut result = HazardTick::default();

        for platform in &mut self.platforms {
            if let Some(timer) = platform.collapse_timer_ms.as_mut() {
                *timer -= delta_ms;
                if *timer <= 0.0 {
                    platform.collapse_timer_ms = None;
                    platform.collapsed = true;
                    result.collapsed.push(platform.id);
                    log::debug!("Platform {} collapsed", platform.id);
                }
            }
        }

        if self.stun_remaining_ms > 0.0 {
            self.stun_remaining_ms -= delta_ms;
            if self.stun_remaining_ms <= 0.0 {
                self.stun_remaining_ms = 0.0;
                result.stun_ended = true;
            }
        }
        result
    }

    fn in_zone(&self, kind: ZoneKind, p: Vec2) -> bool {
        self.zones.iter().any(|z| z.kind == kind && z.rect.contains(p))
    }

    pub fn in_soft_zone(&self, p: Vec2) -> bool {
        self.in_zone(ZoneKind::Soft, p)
    }

    pub fn in_slow_zone(&self, p: Vec2) -> bool {
        self.in_zone(ZoneKind::Slow, p)
    }

    pub fn in_moonbeam(&self, p: Vec2, elapsed_ms: f64) -> bool {
        self.moonbeam.is_some_and(|m| m.contains(p, elapsed_ms))
    }

    /// Break-noise factor at `p`
    pub fn noise_factor(&self, p: Vec2) -> f64 {
        if self.in_soft_zone(p) {
            self.rules.soft_zone_factor
        } else {
            1.0
        }
    }

    /// Horizontal speed factor at `p`
    pub fn speed_factor(&self, p: Vec2) -> f64 {
        if self.in_slow_zone(p) {
            self.rules.slow_zone_factor
        } else {
            1.0
        }
    }
}
