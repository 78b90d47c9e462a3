//! Error taxonomy for the simulation core.
//!
//! Data-integrity faults end the current game. Resolution faults cost one
//! at-bat (the state machine substitutes a generic out). Store faults are
//! logged and never interrupt play.
use thiserror::Error;

/// Roster or lineup problems that make a game impossible to continue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrityFault {
    #[error("team {team} has an empty lineup")]
    EmptyLineup { team: String },
    #[error("team {team} has no pitcher available")]
    NoPitcher { team: String },
    #[error("unknown team id {0}")]
    UnknownTeam(String),
    #[error("{player}: attribute {field} is outside the 1-10 scale")]
    AttributeOutOfRange { player: String, field: &'static str },
}

/// Fatal, game-level errors surfaced to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("data integrity fault: {0}")]
    DataIntegrity(#[from] IntegrityFault),
    #[error("game is already over")]
    GameOver,
    #[error("game exceeded {0} at-bats without finishing")]
    RunawayGame(u32),
}

/// Recoverable failure to resolve a single at-bat.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown outcome code {0:?}")]
    UnknownCode(String),
    #[error("resolver unavailable: {0}")]
    Unavailable(String),
    #[error("malformed resolver response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Persistence failures from a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store payload invalid: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store backend failed: {0}")]
    Backend(String),
}

/// Configuration invariant violations.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be between {min:.3} and {max:.3} (got {value:.3})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} minimum {min:.3} exceeds maximum {max:.3}")]
    MinExceedsMax {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("regulation innings must be at least 1")]
    ZeroInnings,
    #[error("speed thresholds invalid (fast above {fast}, medium above {medium})")]
    SpeedThresholds { fast: u8, medium: u8 },
    #[error("configuration JSON invalid: {0}")]
    Parse(String),
}
