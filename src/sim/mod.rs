//! Deterministic rules engine
//!
//! All gameplay rules live here. This module must be pure and deterministic:
//! - Explicit time deltas only, countdowns are plain fields
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, physics or platform dependencies

pub mod actor;
pub mod catalog;
pub mod combo;
pub mod hazard;
pub mod item;
pub mod layout;
pub mod noise;
pub mod powerup;
pub mod state;
pub mod tick;

pub use actor::{ActorReport, ActorState, JumpKind, MovementIntent, MovementOutcome, WallSide};
pub use catalog::{Effect, EffectKey, EffectValue, Multiplier, PowerUpCatalog, PowerUpDefinition, PowerUpId, Rarity};
pub use combo::{BreakScore, ComboScoreEngine, ComboState};
pub use hazard::{HazardStateMachine, Moonbeam, Platform, PlatformKind, PlatformOutcome, Zone, ZoneKind};
pub use item::{BreakableItem, ItemKind, ItemProps, ItemState};
pub use layout::{LayoutRegistry, StageLayout};
pub use noise::{NoiseMeter, NoiseOutcome};
pub use powerup::{PowerUpEngine, PowerUpSnapshot, ThunderStatus};
pub use state::{GameSession, StageMode, StagePhase, StageResult, StageState};
pub use tick::{Contact, TickInput, TickOutput, tick};
