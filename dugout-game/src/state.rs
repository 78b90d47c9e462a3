//! Per-game state: teams, bases, inning progression and read-only views.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::BASE_COUNT;
use crate::error::IntegrityFault;
use crate::player::{Batter, Pitcher, PitcherSlot, Staff};
use crate::roster::TeamDef;

/// Which club a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Away,
    Home,
}

impl Side {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Away => Self::Home,
            Self::Home => Self::Away,
        }
    }
}

/// Top or bottom of an inning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfInning {
    Top,
    Bottom,
}

impl HalfInning {
    /// The side at the plate in this half.
    #[must_use]
    pub const fn batting(self) -> Side {
        match self {
            Self::Top => Side::Away,
            Self::Bottom => Side::Home,
        }
    }

    #[must_use]
    pub const fn fielding(self) -> Side {
        self.batting().opposite()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for HalfInning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a single game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    NotStarted,
    InProgress,
    GameOver,
}

/// A batter standing on a base, referenced by lineup slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    pub lineup_slot: usize,
    pub speed: u8,
}

/// First, second and third base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bases([Option<Runner>; BASE_COUNT]);

impl Bases {
    #[must_use]
    pub const fn from_slots(slots: [Option<Runner>; BASE_COUNT]) -> Self {
        Self(slots)
    }

    /// Runner on `base` (0 = first). Out-of-range bases are empty.
    #[must_use]
    pub fn get(&self, base: usize) -> Option<Runner> {
        self.0.get(base).copied().flatten()
    }

    pub fn place(&mut self, base: usize, runner: Runner) {
        if let Some(slot) = self.0.get_mut(base) {
            *slot = Some(runner);
        }
    }

    pub fn take(&mut self, base: usize) -> Option<Runner> {
        self.0.get_mut(base).and_then(Option::take)
    }

    pub fn clear(&mut self) {
        self.0 = [None; BASE_COUNT];
    }

    #[must_use]
    pub fn occupied(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.occupied() == BASE_COUNT
    }

    pub fn iter(&self) -> impl Iterator<Item = &Option<Runner>> {
        self.0.iter()
    }
}

/// A club's state for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub lineup: Vec<Batter>,
    pub staff: Staff,
    /// Runs per inning; starts at regulation length and grows in extras.
    pub line_score: Vec<u32>,
    pub runs: u32,
    pub hits: u32,
    pub errors: u32,
    pub batter_index: usize,
    pub current_pitcher: Option<PitcherSlot>,
    /// Starting pitcher of record for win/loss attribution.
    pub starter: Option<PitcherSlot>,
}

impl Team {
    /// Fresh per-game copy of a roster definition.
    #[must_use]
    pub fn from_def(def: &TeamDef, starter_index: usize, regulation: u32) -> Self {
        let staff = Staff::from_def(&def.pitchers);
        let starter = staff.starter_slot(starter_index);
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            lineup: def.batters.iter().map(Batter::from_def).collect(),
            staff,
            line_score: vec![0; usize::try_from(regulation).unwrap_or(9)],
            runs: 0,
            hits: 0,
            errors: 0,
            batter_index: 0,
            current_pitcher: starter,
            starter,
        }
    }

    #[must_use]
    pub fn current_batter(&self) -> Option<&Batter> {
        self.lineup.get(self.batter_index)
    }

    /// Move to the next batter, wrapping at the end of the order.
    pub fn advance_lineup(&mut self) {
        if !self.lineup.is_empty() {
            self.batter_index = (self.batter_index + 1) % self.lineup.len();
        }
    }

    #[must_use]
    pub fn current_pitcher(&self) -> Option<&Pitcher> {
        self.current_pitcher.and_then(|slot| self.staff.get(slot))
    }

    pub fn current_pitcher_mut(&mut self) -> Option<&mut Pitcher> {
        let slot = self.current_pitcher?;
        self.staff.get_mut(slot)
    }

    #[must_use]
    pub fn starter(&self) -> Option<&Pitcher> {
        self.starter.and_then(|slot| self.staff.get(slot))
    }

    /// Batting-side check before an at-bat.
    ///
    /// # Errors
    ///
    /// Returns `IntegrityFault::EmptyLineup` when no batter can come up.
    pub fn require_batter(&self) -> Result<&Batter, IntegrityFault> {
        self.current_batter().ok_or_else(|| IntegrityFault::EmptyLineup {
            team: self.id.clone(),
        })
    }

    /// Fielding-side check before an at-bat.
    ///
    /// # Errors
    ///
    /// Returns `IntegrityFault::NoPitcher` when no pitcher is on the mound.
    pub fn require_pitcher(&self) -> Result<&Pitcher, IntegrityFault> {
        self.current_pitcher().ok_or_else(|| IntegrityFault::NoPitcher {
            team: self.id.clone(),
        })
    }

    /// Credit runs to `inning` (1-based), growing the line score for extras.
    pub fn add_runs(&mut self, inning: u32, runs: u32) {
        let Ok(index) = usize::try_from(inning.saturating_sub(1)) else {
            return;
        };
        if self.line_score.len() <= index {
            self.line_score.resize(index + 1, 0);
        }
        self.line_score[index] += runs;
        self.runs += runs;
    }

    /// Make sure the line score has a cell for `inning`.
    pub fn open_inning(&mut self, inning: u32) {
        let len = usize::try_from(inning).unwrap_or(0);
        if self.line_score.len() < len {
            self.line_score.resize(len, 0);
        }
    }

    #[must_use]
    pub fn line(&self) -> TeamLine {
        TeamLine {
            id: self.id.clone(),
            name: self.name.clone(),
            innings: self.line_score.clone(),
            runs: self.runs,
            hits: self.hits,
            errors: self.errors,
        }
    }
}

/// Complete mutable state for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub regulation: u32,
    pub inning: u32,
    pub half: HalfInning,
    pub outs: u8,
    pub bases: Bases,
    pub phase: GamePhase,
    pub away: Team,
    pub home: Team,
    pub at_bats: u32,
    pub aggregated: bool,
    #[serde(skip)]
    pub fault: Option<IntegrityFault>,
}

impl GameState {
    #[must_use]
    pub fn new(away: Team, home: Team, regulation: u32) -> Self {
        Self {
            regulation,
            inning: 1,
            half: HalfInning::Top,
            outs: 0,
            bases: Bases::default(),
            phase: GamePhase::NotStarted,
            away,
            home,
            at_bats: 0,
            aggregated: false,
            fault: None,
        }
    }

    #[must_use]
    pub const fn team(&self, side: Side) -> &Team {
        match side {
            Side::Away => &self.away,
            Side::Home => &self.home,
        }
    }

    pub fn team_mut(&mut self, side: Side) -> &mut Team {
        match side {
            Side::Away => &mut self.away,
            Side::Home => &mut self.home,
        }
    }

    #[must_use]
    pub const fn batting(&self) -> &Team {
        self.team(self.half.batting())
    }

    #[must_use]
    pub const fn fielding(&self) -> &Team {
        self.team(self.half.fielding())
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver)
    }

    /// Absolute run differential.
    #[must_use]
    pub const fn run_gap(&self) -> u32 {
        self.away.runs.abs_diff(self.home.runs)
    }

    /// Winning side, `None` while tied.
    #[must_use]
    pub const fn leader(&self) -> Option<Side> {
        if self.home.runs > self.away.runs {
            Some(Side::Home)
        } else if self.away.runs > self.home.runs {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// Innings played so far, counting the current one.
    #[must_use]
    pub const fn innings_played(&self) -> u32 {
        self.inning
    }

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let batting = self.batting();
        let pitcher = self.fielding().current_pitcher();
        let runner_names = |base: usize| {
            self.bases
                .get(base)
                .and_then(|runner| batting.lineup.get(runner.lineup_slot))
                .map(|batter| batter.name.clone())
        };
        GameSnapshot {
            inning: self.inning,
            half: self.half,
            outs: self.outs,
            phase: self.phase,
            away_runs: self.away.runs,
            home_runs: self.home.runs,
            bases: [runner_names(0), runner_names(1), runner_names(2)],
            batter: batting.current_batter().map(|b| b.name.clone()),
            pitcher: pitcher.map(|p| p.name.clone()),
            pitcher_stamina: pitcher.map(Pitcher::stamina_fraction),
        }
    }

    #[must_use]
    pub fn box_score(&self) -> BoxScore {
        BoxScore {
            away: self.away.line(),
            home: self.home.line(),
            innings: self
                .away
                .line_score
                .len()
                .max(self.home.line_score.len()),
        }
    }
}

/// Read-only view pushed to display sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub inning: u32,
    pub half: HalfInning,
    pub outs: u8,
    pub phase: GamePhase,
    pub away_runs: u32,
    pub home_runs: u32,
    /// Runner names on first, second and third.
    pub bases: [Option<String>; BASE_COUNT],
    pub batter: Option<String>,
    pub pitcher: Option<String>,
    pub pitcher_stamina: Option<f64>,
}

/// One team's row in a box score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLine {
    pub id: String,
    pub name: String,
    pub innings: Vec<u32>,
    pub runs: u32,
    pub hits: u32,
    pub errors: u32,
}

/// Line scores for both teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxScore {
    pub away: TeamLine,
    pub home: TeamLine,
    pub innings: usize,
}

impl fmt::Display for BoxScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12}", "")?;
        for inning in 1..=self.innings {
            write!(f, "{inning:>3}")?;
        }
        writeln!(f, "  {:>3}{:>3}{:>3}", "R", "H", "E")?;
        for line in [&self.away, &self.home] {
            write!(f, "{:<12}", line.name)?;
            for inning in 0..self.innings {
                match line.innings.get(inning) {
                    Some(runs) => write!(f, "{runs:>3}")?,
                    None => write!(f, "{:>3}", "-")?,
                }
            }
            writeln!(f, "  {:>3}{:>3}{:>3}", line.runs, line.hits, line.errors)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RosterBook;

    fn fresh_state() -> GameState {
        let book = RosterBook::builtin();
        let away = Team::from_def(book.get("NYY").expect("nyy"), 0, 9);
        let home = Team::from_def(book.get("LAD").expect("lad"), 6, 9);
        GameState::new(away, home, 9)
    }

    #[test]
    fn teams_start_with_rotation_pointer() {
        let state = fresh_state();
        assert_eq!(state.away.starter, Some(PitcherSlot::Rotation(0)));
        assert_eq!(state.home.starter, Some(PitcherSlot::Rotation(1)));
        assert_eq!(state.home.starter().map(|p| p.name.as_str()), Some("Tyler Glasnow"));
        assert_eq!(state.away.line_score.len(), 9);
        assert_eq!(state.batting().id, "NYY");
        assert_eq!(state.fielding().id, "LAD");
    }

    #[test]
    fn add_runs_extends_line_score() {
        let mut state = fresh_state();
        state.home.add_runs(3, 2);
        state.home.add_runs(11, 1);
        assert_eq!(state.home.line_score.len(), 11);
        assert_eq!(state.home.line_score[2], 2);
        assert_eq!(state.home.runs, 3);
        assert_eq!(state.leader(), Some(Side::Home));
        assert_eq!(state.run_gap(), 3);
        assert_eq!(state.box_score().innings, 11);
    }

    #[test]
    fn lineup_wraps() {
        let mut state = fresh_state();
        state.away.batter_index = 8;
        state.away.advance_lineup();
        assert_eq!(state.away.batter_index, 0);
    }

    #[test]
    fn missing_players_are_integrity_faults() {
        let mut state = fresh_state();
        state.away.lineup.clear();
        state.home.current_pitcher = None;
        assert!(matches!(
            state.away.require_batter(),
            Err(IntegrityFault::EmptyLineup { .. })
        ));
        assert!(matches!(
            state.home.require_pitcher(),
            Err(IntegrityFault::NoPitcher { .. })
        ));
    }

    #[test]
    fn snapshot_names_runners() {
        let mut state = fresh_state();
        state.bases.place(
            1,
            Runner {
                lineup_slot: 2,
                speed: 6,
            },
        );
        let snapshot = state.snapshot();
        assert_eq!(snapshot.bases[1].as_deref(), Some("Aaron Judge"));
        assert_eq!(snapshot.batter.as_deref(), Some("Trent Grisham"));
        assert_eq!(snapshot.pitcher.as_deref(), Some("Tyler Glasnow"));
    }

    #[test]
    fn box_score_renders_both_rows() {
        let mut state = fresh_state();
        state.away.add_runs(1, 2);
        let rendered = state.box_score().to_string();
        assert!(rendered.contains("Yankees"));
        assert!(rendered.contains("Dodgers"));
        assert_eq!(rendered.lines().count(), 3);
    }
}
