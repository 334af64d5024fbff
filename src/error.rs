//! Error types for the rules engine.
//!
//! Rejected gameplay operations (full power-up slots, ability on cooldown)
//! are not errors; they return `false`/`None` and log a warning. Only
//! conditions that prevent a session from starting surface here.

/// Main error type for the engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("No stage layouts available")]
    NoStageLayouts,

    #[error("No time-attack layout for boss: {0}")]
    NoLayoutForBoss(String),

    #[error("Unknown boss: {0}")]
    UnknownBoss(String),

    #[error("Time attack is locked until a story stage is cleared")]
    FeatureLocked,

    #[error("Invalid power-up catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("Layout data error: {0}")]
    Layout(#[source] serde_json::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
