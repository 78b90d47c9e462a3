//! Per-game mutable player structures.
//!
//! Built fresh from a `TeamDef` at the start of every game so game stats
//! never accumulate onto the static roster.
use serde::{Deserialize, Serialize};

use crate::numbers::ratio;
use crate::outcome::PlateEvent;
use crate::rating::{BatterAttributes, PitcherAttributes};
use crate::roster::{BatterDef, PitcherDef, PitcherRole, StaffDef};

/// A batter in the current game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batter {
    pub name: String,
    pub position: String,
    pub attributes: BatterAttributes,
    pub ovr: u8,
    pub line: BattingLine,
    /// Outcome codes in plate-appearance order.
    pub history: Vec<String>,
}

impl Batter {
    #[must_use]
    pub fn from_def(def: &BatterDef) -> Self {
        Self {
            name: def.name.clone(),
            position: def.position.clone(),
            attributes: def.attributes,
            ovr: def.attributes.ovr(),
            line: BattingLine::default(),
            history: Vec::new(),
        }
    }

    /// Book a plate appearance. Walks and hit-by-pitch are not at-bats.
    pub fn record(&mut self, event: PlateEvent, rbi: u32) {
        if event.counts_as_at_bat() {
            self.line.at_bats += 1;
        }
        if event.is_hit() {
            self.line.hits += 1;
        }
        if event == PlateEvent::HomeRun {
            self.line.home_runs += 1;
        }
        self.line.rbi += rbi;
        self.history.push(event.code().to_string());
    }

    /// Hits-for-at-bats summary such as `2-4`.
    #[must_use]
    pub fn performance(&self) -> String {
        format!("{}-{}", self.line.hits, self.line.at_bats)
    }

    #[must_use]
    pub fn has_activity(&self) -> bool {
        !self.history.is_empty()
    }
}

/// Counting stats for a batter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattingLine {
    pub at_bats: u32,
    pub hits: u32,
    pub home_runs: u32,
    pub rbi: u32,
}

impl BattingLine {
    #[must_use]
    pub fn average(&self) -> f64 {
        ratio(self.hits, self.at_bats)
    }
}

/// A pitcher in the current game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pitcher {
    pub name: String,
    pub role: PitcherRole,
    pub attributes: PitcherAttributes,
    pub ovr: u8,
    pub max_stamina: f64,
    pub current_stamina: f64,
    pub line: PitchingLine,
}

impl Pitcher {
    #[must_use]
    pub fn from_def(def: &PitcherDef) -> Self {
        let max_stamina = f64::from(def.max_stamina);
        Self {
            name: def.name.clone(),
            role: def.role,
            attributes: def.attributes,
            ovr: def.attributes.ovr(def.max_stamina),
            max_stamina,
            current_stamina: max_stamina,
            line: PitchingLine::default(),
        }
    }

    /// `current_stamina / max_stamina`, zero for a pitcher with no stamina pool.
    #[must_use]
    pub fn stamina_fraction(&self) -> f64 {
        if self.max_stamina <= 0.0 {
            return 0.0;
        }
        self.current_stamina / self.max_stamina
    }

    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.current_stamina > 0.0
    }

    /// Reduce stamina, keeping it inside `[0, max_stamina]`.
    pub fn drain(&mut self, amount: f64) {
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        self.current_stamina = (self.current_stamina - amount).clamp(0.0, self.max_stamina);
    }

    #[must_use]
    pub const fn has_activity(&self) -> bool {
        self.line.outs_recorded > 0 || self.line.strikeouts > 0 || self.line.runs_allowed > 0
    }
}

/// Counting stats for a pitcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchingLine {
    pub outs_recorded: u32,
    pub strikeouts: u32,
    pub runs_allowed: u32,
}

/// Reference to a pitcher on a staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitcherSlot {
    Rotation(usize),
    Reliever,
    Closer,
}

/// A team's pitchers for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub rotation: Vec<Pitcher>,
    pub reliever: Option<Pitcher>,
    pub closer: Option<Pitcher>,
}

impl Staff {
    #[must_use]
    pub fn from_def(def: &StaffDef) -> Self {
        Self {
            rotation: def.rotation.iter().map(Pitcher::from_def).collect(),
            reliever: def.reliever.as_ref().map(Pitcher::from_def),
            closer: def.closer.as_ref().map(Pitcher::from_def),
        }
    }

    #[must_use]
    pub fn get(&self, slot: PitcherSlot) -> Option<&Pitcher> {
        match slot {
            PitcherSlot::Rotation(index) => self.rotation.get(index),
            PitcherSlot::Reliever => self.reliever.as_ref(),
            PitcherSlot::Closer => self.closer.as_ref(),
        }
    }

    #[must_use]
    pub fn get_mut(&mut self, slot: PitcherSlot) -> Option<&mut Pitcher> {
        match slot {
            PitcherSlot::Rotation(index) => self.rotation.get_mut(index),
            PitcherSlot::Reliever => self.reliever.as_mut(),
            PitcherSlot::Closer => self.closer.as_mut(),
        }
    }

    /// Starter for the given rotation pointer, wrapping past the end.
    #[must_use]
    pub fn starter_slot(&self, starter_index: usize) -> Option<PitcherSlot> {
        if self.rotation.is_empty() {
            return None;
        }
        Some(PitcherSlot::Rotation(starter_index % self.rotation.len()))
    }

    /// Every pitcher with its slot, rotation first.
    pub fn iter(&self) -> impl Iterator<Item = (PitcherSlot, &Pitcher)> {
        self.rotation
            .iter()
            .enumerate()
            .map(|(index, pitcher)| (PitcherSlot::Rotation(index), pitcher))
            .chain(self.reliever.iter().map(|p| (PitcherSlot::Reliever, p)))
            .chain(self.closer.iter().map(|p| (PitcherSlot::Closer, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RosterBook;

    fn yankees_staff() -> Staff {
        let team = RosterBook::builtin().get("NYY").expect("yankees");
        Staff::from_def(&team.pitchers)
    }

    #[test]
    fn pitcher_starts_fresh_and_drain_floors_at_zero() {
        let mut staff = yankees_staff();
        let cole = staff.get_mut(PitcherSlot::Rotation(0)).expect("cole");
        assert!((cole.current_stamina - 100.0).abs() < f64::EPSILON);
        cole.drain(3.5);
        assert!((cole.stamina_fraction() - 0.965).abs() < 1e-9);
        cole.drain(500.0);
        assert!(cole.current_stamina.abs() < f64::EPSILON);
        assert!(!cole.is_fresh());
        cole.drain(-10.0);
        assert!(cole.current_stamina.abs() < f64::EPSILON);
    }

    #[test]
    fn starter_slot_wraps_rotation() {
        let staff = yankees_staff();
        assert_eq!(staff.starter_slot(7), Some(PitcherSlot::Rotation(2)));
        assert_eq!(staff.get(PitcherSlot::Closer).map(|p| p.role), Some(PitcherRole::Closer));
        assert_eq!(staff.iter().count(), 7);
    }

    #[test]
    fn batter_record_tracks_line_and_history() {
        let team = RosterBook::builtin().get("LAD").expect("dodgers");
        let mut betts = Batter::from_def(&team.batters[0]);
        betts.record(PlateEvent::Single, 0);
        betts.record(PlateEvent::Walk, 1);
        betts.record(PlateEvent::HomeRun, 2);
        betts.record(PlateEvent::Strikeout, 0);
        assert_eq!(betts.line.at_bats, 3);
        assert_eq!(betts.line.hits, 2);
        assert_eq!(betts.line.home_runs, 1);
        assert_eq!(betts.line.rbi, 3);
        assert_eq!(betts.history, vec!["1B", "BB", "HR", "K"]);
        assert_eq!(betts.performance(), "2-3");
        assert!((betts.line.average() - 2.0 / 3.0).abs() < 1e-9);
    }
}
