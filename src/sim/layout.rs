//! Stage layouts
//!
//! Story stages and time-attack arenas are data, embedded from
//! `assets/layouts.json`. Rects in the data are center-based.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hazard::{Moonbeam, Platform, PlatformKind, Zone, ZoneKind};
use super::item::{BreakableItem, ItemKind};
use crate::consts::{FLOOR_THICKNESS, FLOOR_WIDTH, FLOOR_Y, WORLD_WIDTH};
use crate::error::{EngineError, Result};
use crate::time_attack::BossProfile;
use crate::tuning::Tuning;
use crate::Rect;

const EMBEDDED_LAYOUTS: &str = include_str!("../../assets/layouts.json");

/// Id reserved for the implicit story floor
pub const FLOOR_PLATFORM_ID: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectSpec {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectSpec {
    fn to_rect(self) -> Rect {
        Rect::from_center(Vec2::new(self.x, self.y), Vec2::new(self.w, self.h))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpec {
    #[serde(flatten)]
    pub rect: RectSpec,
    #[serde(default)]
    pub kind: PlatformKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonbeamSpec {
    pub start_x: f32,
    pub end_x: f32,
    pub y: f32,
    pub width: f32,
    /// Full sweep period (ms)
    pub cycle_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageLayout {
    pub name: String,
    pub cat_start: Point,
    pub platforms: Vec<PlatformSpec>,
    pub items: Vec<ItemSpec>,
    /// Seconds; the tuning default applies when absent
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub soft_zones: Vec<RectSpec>,
    #[serde(default)]
    pub slow_zones: Vec<RectSpec>,
    #[serde(default)]
    pub moonbeam: Option<MoonbeamSpec>,
}

/// Runtime objects built from a layout
#[derive(Debug, Clone)]
pub struct BuiltStage {
    pub name: String,
    pub cat_start: Vec2,
    pub time_limit_secs: u32,
    pub platforms: Vec<Platform>,
    pub zones: Vec<Zone>,
    pub moonbeam: Option<Moonbeam>,
    pub items: Vec<BreakableItem>,
}

impl StageLayout {
    /// Instantiate platforms, zones and items. Platform ids start at 1 in
    /// layout order; the optional floor takes id 0. Item ids start at 1.
    pub fn build(&self, tuning: &Tuning, with_floor: bool) -> BuiltStage {
        let mut platforms = Vec::with_capacity(self.platforms.len() + 1);
        if with_floor {
            platforms.push(Platform::new(
                FLOOR_PLATFORM_ID,
                PlatformKind::Normal,
                Rect::from_center(
                    Vec2::new(WORLD_WIDTH / 2.0, FLOOR_Y),
                    Vec2::new(FLOOR_WIDTH, FLOOR_THICKNESS),
                ),
            ));
        }
        platforms.extend(
            self.platforms
                .iter()
                .enumerate()
                .map(|(i, p)| Platform::new(i as u32 + 1, p.kind, p.rect.to_rect())),
        );

        let zones = self
            .soft_zones
            .iter()
            .map(|r| Zone {
                kind: ZoneKind::Soft,
                rect: r.to_rect(),
            })
            .chain(self.slow_zones.iter().map(|r| Zone {
                kind: ZoneKind::Slow,
                rect: r.to_rect(),
            }))
            .collect();

        let moonbeam = self
            .moonbeam
            .map(|m| Moonbeam::new(m.start_x, m.end_x, m.y, m.width, m.cycle_time));

        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let kind = ItemKind::from_name(&spec.kind);
                if kind == ItemKind::Unknown {
                    log::warn!(
                        "Unknown item type '{}' in layout '{}', using generic properties",
                        spec.kind,
                        self.name
                    );
                }
                BreakableItem::new(
                    i as u32 + 1,
                    kind,
                    Vec2::new(spec.x, spec.y),
                    spec.scale,
                    kind.props_or_fallback(tuning),
                )
            })
            .collect();

        BuiltStage {
            name: self.name.clone(),
            cat_start: Vec2::new(self.cat_start.x, self.cat_start.y),
            time_limit_secs: self.time_limit.unwrap_or(tuning.default_time_limit_secs),
            platforms,
            zones,
            moonbeam,
            items,
        }
    }
}

/// All stage layouts and boss profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegistry {
    story: BTreeMap<u32, StageLayout>,
    gathering: BTreeMap<String, StageLayout>,
    bosses: Vec<BossProfile>,
}

impl LayoutRegistry {
    /// Layouts shipped with the crate
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_LAYOUTS)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(json).map_err(EngineError::Layout)?;
        log::info!(
            "Loaded {} story stages, {} arenas, {} bosses",
            registry.story.len(),
            registry.gathering.len(),
            registry.bosses.len()
        );
        Ok(registry)
    }

    pub fn bosses(&self) -> &[BossProfile] {
        &self.bosses
    }

    pub fn boss(&self, id: &str) -> Option<&BossProfile> {
        self.bosses.iter().find(|b| b.id == id)
    }

    /// Story stage layout, falling back to stage 1 for unknown stages
    pub fn story_layout(&self, stage: u32) -> Result<&StageLayout> {
        if let Some(layout) = self.story.get(&stage) {
            return Ok(layout);
        }
        log::warn!("No layout for stage {}, falling back to stage 1", stage);
        self.story.get(&1).ok_or(EngineError::NoStageLayouts)
    }

    pub fn gathering_layout(&self, boss: &str) -> Result<&StageLayout> {
        self.gathering
            .get(boss)
            .ok_or_else(|| EngineError::NoLayoutForBoss(boss.to_string()))
    }

    /// Check stages `1..=max_stage` and that every boss has an arena.
    /// Missing later stages are only warned about; they fall back at runtime.
    pub fn validate(&self, max_stage: u32) -> Result<()> {
        if !self.story.contains_key(&1) {
            return Err(EngineError::NoStageLayouts);
        }
        for stage in 2..=max_stage {
            if !self.story.contains_key(&stage) {
                log::warn!("Stage {} has no layout", stage);
            }
        }
        for boss in &self.bosses {
            if !self.gathering.contains_key(&boss.id) {
                return Err(EngineError::NoLayoutForBoss(boss.id.clone()));
            }
        }
        Ok(())
    }
}
