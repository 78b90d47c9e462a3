//! Static roster definitions consumed by the engine.
//!
//! Definitions are read-only input: the engine copies them into per-game
//! structures at the start of every game and never writes back.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::IntegrityFault;
use crate::rating::{BatterAttributes, PitcherAttributes};

/// Pitching role on a staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitcherRole {
    Starter,
    Reliever,
    Closer,
}

impl PitcherRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Reliever => "reliever",
            Self::Closer => "closer",
        }
    }

    /// Label used in play-by-play substitution messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Starter => "Starter",
            Self::Reliever => "Reliever",
            Self::Closer => "Closer",
        }
    }
}

impl fmt::Display for PitcherRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PitcherRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starter" | "sp" => Ok(Self::Starter),
            "reliever" | "rp" => Ok(Self::Reliever),
            "closer" | "cl" => Ok(Self::Closer),
            _ => Err(()),
        }
    }
}

/// A batter as it appears on the static roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatterDef {
    pub name: String,
    pub position: String,
    #[serde(flatten)]
    pub attributes: BatterAttributes,
}

/// A pitcher as it appears on the static roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitcherDef {
    pub name: String,
    pub role: PitcherRole,
    #[serde(flatten)]
    pub attributes: PitcherAttributes,
    pub max_stamina: u32,
}

/// Starter rotation plus the single reliever and closer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffDef {
    #[serde(default)]
    pub rotation: Vec<PitcherDef>,
    #[serde(default)]
    pub reliever: Option<PitcherDef>,
    #[serde(default)]
    pub closer: Option<PitcherDef>,
}

/// Full static definition of a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDef {
    pub id: String,
    pub name: String,
    /// Batting order; wraps circularly during a game.
    pub batters: Vec<BatterDef>,
    #[serde(default)]
    pub bench: Vec<BatterDef>,
    pub pitchers: StaffDef,
}

impl TeamDef {
    /// Check the definition can field a game.
    ///
    /// # Errors
    ///
    /// Returns `IntegrityFault` when the lineup or rotation is empty or an
    /// attribute sits outside the rating scale.
    pub fn validate(&self) -> Result<(), IntegrityFault> {
        if self.batters.is_empty() {
            return Err(IntegrityFault::EmptyLineup {
                team: self.id.clone(),
            });
        }
        if self.pitchers.rotation.is_empty() {
            return Err(IntegrityFault::NoPitcher {
                team: self.id.clone(),
            });
        }
        for batter in &self.batters {
            if let Some(field) = batter.attributes.out_of_range() {
                return Err(IntegrityFault::AttributeOutOfRange {
                    player: batter.name.clone(),
                    field,
                });
            }
        }
        for pitcher in self.pitchers.all() {
            if let Some(field) = pitcher.attributes.out_of_range() {
                return Err(IntegrityFault::AttributeOutOfRange {
                    player: pitcher.name.clone(),
                    field,
                });
            }
        }
        Ok(())
    }
}

impl StaffDef {
    /// Every pitcher on the staff, rotation first.
    pub fn all(&self) -> impl Iterator<Item = &PitcherDef> {
        self.rotation
            .iter()
            .chain(self.reliever.iter())
            .chain(self.closer.iter())
    }
}

/// Collection of team definitions as stored in `teams.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterBook {
    pub teams: Vec<TeamDef>,
}

impl RosterBook {
    /// Parse a roster book from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON does not match the roster layout.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Built-in rosters shipped with the crate.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static BOOK: OnceLock<RosterBook> = OnceLock::new();
        BOOK.get_or_init(|| {
            Self::from_json(include_str!("../assets/teams.json")).expect("valid built-in rosters")
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TeamDef> {
        self.teams
            .iter()
            .find(|team| team.id.eq_ignore_ascii_case(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.teams.iter().map(|team| team.id.as_str())
    }

    /// Index the book by team id.
    #[must_use]
    pub fn by_id(&self) -> HashMap<&str, &TeamDef> {
        self.teams.iter().map(|team| (team.id.as_str(), team)).collect()
    }
}
