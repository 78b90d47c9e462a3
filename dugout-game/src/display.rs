//! One-way presentation seam.
//!
//! The engine pushes messages and snapshots; it never reads from a sink.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::GameSnapshot;

/// Classification attached to every play-by-play message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Strikeout,
    Walk,
    HitByPitch,
    Single,
    Double,
    Triple,
    HomeRun,
    Out,
    GameEvent,
    GameOver,
    GameError,
}

impl OutcomeCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strikeout => "strikeout",
            Self::Walk => "walk",
            Self::HitByPitch => "hit_by_pitch",
            Self::Single => "single",
            Self::Double => "double",
            Self::Triple => "triple",
            Self::HomeRun => "home_run",
            Self::Out => "out",
            Self::GameEvent => "game_event",
            Self::GameOver => "game_over",
            Self::GameError => "game_error",
        }
    }
}

impl fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver for play-by-play and state snapshots.
pub trait DisplaySink {
    fn report_outcome(&mut self, message: &str, category: OutcomeCategory);

    /// Called after each meaningful state change. Defaults to ignoring it.
    fn report_snapshot(&mut self, _snapshot: &GameSnapshot) {}
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn report_outcome(&mut self, _message: &str, _category: OutcomeCategory) {}
}

/// Sink that keeps every message in memory.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    pub entries: Vec<(String, OutcomeCategory)>,
    pub snapshots: usize,
}

impl LogBuffer {
    /// Messages carrying the given category.
    pub fn with_category(&self, category: OutcomeCategory) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, cat)| *cat == category)
            .map(|(message, _)| message.as_str())
    }

    #[must_use]
    pub fn last_message(&self) -> Option<&str> {
        self.entries.last().map(|(message, _)| message.as_str())
    }
}

impl DisplaySink for LogBuffer {
    fn report_outcome(&mut self, message: &str, category: OutcomeCategory) {
        self.entries.push((message.to_string(), category));
    }

    fn report_snapshot(&mut self, _snapshot: &GameSnapshot) {
        self.snapshots += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_buffer_filters_by_category() {
        let mut sink = LogBuffer::default();
        sink.report_outcome("Change Side.", OutcomeCategory::GameEvent);
        sink.report_outcome("Aaron Judge STRIKES OUT!", OutcomeCategory::Strikeout);
        assert_eq!(
            sink.with_category(OutcomeCategory::GameEvent).collect::<Vec<_>>(),
            vec!["Change Side."]
        );
        assert_eq!(sink.last_message(), Some("Aaron Judge STRIKES OUT!"));
        assert_eq!(OutcomeCategory::HitByPitch.to_string(), "hit_by_pitch");
    }
}
