//! End-of-game aggregation: team records, rotation pointers, career stats.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{CAREER_STATS_KEY, TEAM_RECORDS_KEY};
use crate::error::StoreError;
use crate::numbers::{count_to_f64, ratio};
use crate::state::{GameState, Side, Team};
use crate::store::{KeyValueStore, load_or, save_as};

/// Persisted standing for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub name: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    /// Rotation pointer for the next game.
    #[serde(default)]
    pub starter_index: usize,
}

impl TeamRecord {
    #[must_use]
    pub fn win_pct(&self) -> f64 {
        ratio(self.wins, self.wins + self.losses)
    }
}

/// Team id to record.
pub type TeamRecords = BTreeMap<String, TeamRecord>;

/// Career tallies for one player. Batting and pitching share one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerLine {
    pub at_bats: u32,
    pub hits: u32,
    pub home_runs: u32,
    pub rbi: u32,
    pub outs_recorded: u32,
    pub runs_allowed: u32,
    pub strikeouts: u32,
    pub wins: u32,
    pub losses: u32,
}

impl CareerLine {
    /// Batting average (hits per at-bat).
    #[must_use]
    pub fn average(&self) -> f64 {
        ratio(self.hits, self.at_bats)
    }

    /// Innings pitched in baseball notation, e.g. `6.2` for 20 outs.
    #[must_use]
    pub fn innings_pitched(&self) -> String {
        format!("{}.{}", self.outs_recorded / 3, self.outs_recorded % 3)
    }
}

/// Team id to player name to career line.
pub type CareerStats = BTreeMap<String, BTreeMap<String, CareerLine>>;

/// Result of a finished, aggregated game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub away: String,
    pub home: String,
    pub away_runs: u32,
    pub home_runs: u32,
    pub innings: u32,
    pub winner: Option<Side>,
    pub winning_pitcher: Option<String>,
    pub losing_pitcher: Option<String>,
}

impl GameSummary {
    /// Id of the winning team, if any.
    #[must_use]
    pub fn winner_id(&self) -> Option<&str> {
        self.winner.map(|side| match side {
            Side::Away => self.away.as_str(),
            Side::Home => self.home.as_str(),
        })
    }
}

/// Load team records, falling back to empty.
#[must_use]
pub fn load_team_records<S: KeyValueStore + ?Sized>(store: &S) -> TeamRecords {
    load_or(store, TEAM_RECORDS_KEY, TeamRecords::new())
}

/// Load career stats, falling back to empty.
#[must_use]
pub fn load_career_stats<S: KeyValueStore + ?Sized>(store: &S) -> CareerStats {
    load_or(store, CAREER_STATS_KEY, CareerStats::new())
}

/// Starter pointer for `team_id`, zero when no record exists.
#[must_use]
pub fn starter_index(records: &TeamRecords, team_id: &str) -> usize {
    records.get(team_id).map_or(0, |record| record.starter_index)
}

/// Apply a finished game to the records in place.
pub fn apply_team_records(records: &mut TeamRecords, state: &GameState) {
    let winner = state.leader();
    for side in [Side::Away, Side::Home] {
        let team = state.team(side);
        let record = records.entry(team.id.clone()).or_default();
        record.name.clone_from(&team.name);
        match winner {
            Some(w) if w == side => record.wins += 1,
            Some(_) => record.losses += 1,
            None => {}
        }
        let rotation = team.staff.rotation.len().max(1);
        record.starter_index = (record.starter_index + 1) % rotation;
    }
}

/// Fold every active player's game line into career totals.
pub fn apply_career_stats(career: &mut CareerStats, state: &GameState) {
    let winner = state.leader();
    for side in [Side::Away, Side::Home] {
        let team = state.team(side);
        let decision = winner.map(|w| w == side);
        fold_team(career.entry(team.id.clone()).or_default(), team, decision);
    }
}

fn fold_team(lines: &mut BTreeMap<String, CareerLine>, team: &Team, won: Option<bool>) {
    for batter in team.lineup.iter().filter(|b| b.has_activity()) {
        let line = lines.entry(batter.name.clone()).or_default();
        line.at_bats += batter.line.at_bats;
        line.hits += batter.line.hits;
        line.home_runs += batter.line.home_runs;
        line.rbi += batter.line.rbi;
    }
    for (slot, pitcher) in team.staff.iter() {
        let is_starter = team.starter == Some(slot);
        if !pitcher.has_activity() && !is_starter {
            continue;
        }
        let line = lines.entry(pitcher.name.clone()).or_default();
        line.outs_recorded += pitcher.line.outs_recorded;
        line.runs_allowed += pitcher.line.runs_allowed;
        line.strikeouts += pitcher.line.strikeouts;
        if is_starter {
            match won {
                Some(true) => line.wins += 1,
                Some(false) => line.losses += 1,
                None => {}
            }
        }
    }
}

/// Summarize a finished game without touching any store.
#[must_use]
pub fn summarize(state: &GameState) -> GameSummary {
    let winner = state.leader();
    let starter_name = |side: Side| state.team(side).starter().map(|p| p.name.clone());
    GameSummary {
        away: state.away.id.clone(),
        home: state.home.id.clone(),
        away_runs: state.away.runs,
        home_runs: state.home.runs,
        innings: state.innings_played(),
        winner,
        winning_pitcher: winner.and_then(starter_name),
        losing_pitcher: winner.map(Side::opposite).and_then(starter_name),
    }
}

/// Finalize a finished game exactly once.
///
/// Returns `Ok(None)` for a game that is still running, ended on a data
/// integrity fault, or was already aggregated. The aggregated flag is set
/// before anything is written, so a failed save is not retried on a second
/// call.
///
/// # Errors
///
/// Returns the first `StoreError` hit while saving; both saves are always
/// attempted.
pub fn aggregate_game<S: KeyValueStore + ?Sized>(
    state: &mut GameState,
    store: &mut S,
) -> Result<Option<GameSummary>, StoreError> {
    if state.aggregated || !state.is_over() || state.fault.is_some() {
        return Ok(None);
    }
    state.aggregated = true;

    let mut records = load_team_records(store);
    apply_team_records(&mut records, state);
    let mut career = load_career_stats(store);
    apply_career_stats(&mut career, state);

    let summary = summarize(state);
    log::info!(
        "final: {} {} - {} {} ({} innings)",
        summary.away,
        summary.away_runs,
        summary.home_runs,
        summary.home,
        summary.innings
    );

    let records_saved = save_as(store, TEAM_RECORDS_KEY, &records);
    if let Err(err) = &records_saved {
        log::warn!("failed to save team records: {err}");
    }
    let career_saved = save_as(store, CAREER_STATS_KEY, &career);
    if let Err(err) = &career_saved {
        log::warn!("failed to save career stats: {err}");
    }
    records_saved?;
    career_saved?;
    Ok(Some(summary))
}

/// Batch totals across many games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesTotals {
    pub games: usize,
    pub away_wins: u32,
    pub home_wins: u32,
    pub ties: u32,
    pub total_runs: u32,
    pub total_innings: u32,
    pub extra_inning_games: u32,
}

impl SeriesTotals {
    #[must_use]
    pub fn from_summaries(summaries: &[GameSummary], regulation: u32) -> Self {
        let mut totals = Self {
            games: summaries.len(),
            ..Self::default()
        };
        for summary in summaries {
            match summary.winner {
                Some(Side::Away) => totals.away_wins += 1,
                Some(Side::Home) => totals.home_wins += 1,
                None => totals.ties += 1,
            }
            totals.total_runs += summary.away_runs + summary.home_runs;
            totals.total_innings += summary.innings;
            if summary.innings > regulation {
                totals.extra_inning_games += 1;
            }
        }
        totals
    }

    #[must_use]
    pub fn runs_per_game(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        f64::from(self.total_runs) / count_to_f64(self.games)
    }

    #[must_use]
    pub fn average_innings(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        f64::from(self.total_innings) / count_to_f64(self.games)
    }

    #[must_use]
    pub fn home_win_pct(&self) -> f64 {
        ratio(self.home_wins, self.home_wins + self.away_wins)
    }
}
