//! Domain events published by the rules engine
//!
//! The engine never calls into rendering or audio. It records what happened
//! in an [`EventQueue`]; the driver drains the queue once per tick and hands
//! the batch to an [`EventBus`], which fans it out to subscribers.

use serde::{Deserialize, Serialize};

use crate::sim::state::StageResult;
use crate::time_attack::Rank;

/// Something the presentation layer may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged { score: u64 },
    ComboChanged { count: u32, max: u32 },
    NoiseChanged { level: f64 },
    /// Noise reached the cap (fires once per stage)
    Detected,
    ThunderStateChanged { active: bool, remaining: f64, cooldown: f64 },
    ItemDislodged { item: u32 },
    ItemFalling { item: u32, velocity: (f32, f32), heavy: bool },
    ItemBroken {
        item: u32,
        score_delta: u64,
        was_in_moonbeam: bool,
        was_domino_bonus: bool,
    },
    PlatformBounced { platform: u32, velocity: f64 },
    PlatformCrumbleWarning { platform: u32 },
    PlatformCollapseScheduled { platform: u32 },
    PlatformCollapsed { platform: u32 },
    ActorStunned { platform: u32 },
    StunEnded,
    StageCleared(StageResult),
    StageFailed { score: u64, max_combo: u32 },
    AllStagesCleared,
    TimeAttackFinished {
        boss: String,
        time: f64,
        win: bool,
        rank: Rank,
        new_best: bool,
    },
}

/// Ordered buffer of events produced during one or more ticks
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: GameEvent) {
        log::debug!("event: {:?}", event);
        self.events.push(event);
    }

    /// Take every pending event, oldest first
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }
}

/// Receiver of published events
pub trait EventSubscriber {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> EventSubscriber for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Fan-out of events to every registered subscriber, in registration order
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Box<dyn EventSubscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: impl EventSubscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn publish(&mut self, event: &GameEvent) {
        for subscriber in &mut self.subscribers {
            subscriber.on_event(event);
        }
    }

    /// Publish a drained batch
    pub fn publish_all(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.publish(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
