//! Breakable household items
//!
//! Lifecycle: idle -> dislodged (wobbling) -> falling -> broken. Broken is
//! terminal and is the only point where an item scores.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::ITEM_SIZE;
use crate::tuning::Tuning;
use crate::Rect;

/// Item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Vase,
    Book,
    Clock,
    Plant,
    Lamp,
    Mug,
    Frame,
    Remote,
    Pen,
    CanFood,
    /// Type name not in the property table
    Unknown,
}

/// Base score and noise of an item type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemProps {
    pub score: u32,
    pub noise: f64,
}

impl ItemKind {
    const NAMED: [ItemKind; 10] = [
        ItemKind::Vase,
        ItemKind::Book,
        ItemKind::Clock,
        ItemKind::Plant,
        ItemKind::Lamp,
        ItemKind::Mug,
        ItemKind::Frame,
        ItemKind::Remote,
        ItemKind::Pen,
        ItemKind::CanFood,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Vase => "vase",
            ItemKind::Book => "book",
            ItemKind::Clock => "clock",
            ItemKind::Plant => "plant",
            ItemKind::Lamp => "lamp",
            ItemKind::Mug => "mug",
            ItemKind::Frame => "frame",
            ItemKind::Remote => "remote",
            ItemKind::Pen => "pen",
            ItemKind::CanFood => "canFood",
            ItemKind::Unknown => "unknown",
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::NAMED
            .into_iter()
            .find(|k| k.as_str() == name)
            .unwrap_or(ItemKind::Unknown)
    }

    pub fn props(&self) -> Option<ItemProps> {
        let (score, noise) = match self {
            ItemKind::Vase => (200, 18.0),
            ItemKind::Book => (50, 6.0),
            ItemKind::Clock => (300, 22.0),
            ItemKind::Plant => (150, 12.0),
            ItemKind::Lamp => (180, 15.0),
            ItemKind::Mug => (80, 9.0),
            ItemKind::Frame => (120, 11.0),
            ItemKind::Remote => (30, 5.0),
            ItemKind::Pen => (10, 3.0),
            ItemKind::CanFood => (60, 8.0),
            ItemKind::Unknown => return None,
        };
        Some(ItemProps { score, noise })
    }

    /// Properties, or the generic fallback for unknown types
    pub fn props_or_fallback(&self, tuning: &Tuning) -> ItemProps {
        self.props().unwrap_or(ItemProps {
            score: tuning.fallback_item_score,
            noise: tuning.fallback_item_noise,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ItemState {
    Idle,
    Dislodged { wobble_ms: f64 },
    Falling,
    Broken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakableItem {
    pub id: u32,
    pub kind: ItemKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub base_score: u32,
    pub base_noise: f64,
    pub state: ItemState,
}

impl BreakableItem {
    pub fn new(id: u32, kind: ItemKind, pos: Vec2, scale: f32, props: ItemProps) -> Self {
        Self {
            id,
            kind,
            pos,
            size: Vec2::splat(ITEM_SIZE * scale),
            base_score: props.score,
            base_noise: props.noise,
            state: ItemState::Idle,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    pub fn is_broken(&self) -> bool {
        self.state == ItemState::Broken
    }

    /// First contact with the actor starts the wobble. Re-contact is ignored.
    pub fn touch(&mut self, wobble_ms: f64) -> bool {
        if self.state != ItemState::Idle {
            return false;
        }
        self.state = ItemState::Dislodged { wobble_ms };
        true
    }

    /// Run the wobble down. Returns true when the item starts falling.
    pub fn tick(&mut self, delta_ms: f64) -> bool {
        if let ItemState::Dislodged { wobble_ms } = &mut self.state {
            *wobble_ms -= delta_ms;
            if *wobble_ms <= 0.0 {
                self.state = ItemState::Falling;
                return true;
            }
        }
        false
    }

    /// Lose support immediately (platform collapse)
    pub fn drop_now(&mut self) -> bool {
        match self.state {
            ItemState::Idle | ItemState::Dislodged { .. } => {
                self.state = ItemState::Falling;
                true
            }
            ItemState::Falling | ItemState::Broken => false,
        }
    }

    /// Ground contact breaks a falling item, exactly once
    pub fn ground_contact(&mut self) -> bool {
        if self.state != ItemState::Falling {
            return false;
        }
        self.state = ItemState::Broken;
        true
    }
}
