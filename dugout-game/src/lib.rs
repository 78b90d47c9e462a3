//! Dugout Game Engine
//!
//! Platform-agnostic core of a turn-based baseball simulator: outcome model,
//! baserunning, bullpen management, inning state machine and end-of-game
//! aggregation. No UI, storage or network code is required by the core.

pub mod baserunning;
pub mod config;
pub mod constants;
pub mod display;
pub mod error;
pub mod fatigue;
pub mod game;
pub mod numbers;
pub mod outcome;
pub mod player;
pub mod rating;
pub mod records;
pub mod rng;
pub mod roster;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use baserunning::{Advancement, advance_runners};
pub use config::{BaseRates, BullpenConfig, Caps, Effects, SimConfig, SpeedConfig, StaminaConfig};
pub use display::{DisplaySink, LogBuffer, NullSink, OutcomeCategory};
pub use error::{ConfigError, GameError, IntegrityFault, ResolveError, StoreError};
pub use game::{AtBatReport, Game, RunStatus, Substitution};
#[cfg(feature = "remote")]
pub use outcome::HttpResolver;
pub use outcome::{
    LocalResolver, OutFlavor, Outcome, OutcomeResolver, PlateEvent, ProbabilityTable,
    ScriptedResolver, WireCode,
};
pub use player::{Batter, Pitcher, PitcherSlot, Staff};
pub use rating::{BatterAttributes, OvrTier, PitcherAttributes};
pub use records::{
    CareerLine, CareerStats, GameSummary, SeriesTotals, TeamRecord, TeamRecords, aggregate_game,
};
pub use rng::{RngBundle, ScriptedRolls};
pub use roster::{BatterDef, PitcherDef, PitcherRole, RosterBook, StaffDef, TeamDef};
pub use state::{BoxScore, GamePhase, GameSnapshot, GameState, HalfInning, Side};
pub use store::{KeyValueStore, MemoryStore};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Read-only source of team definitions.
pub trait RosterProvider {
    /// Look up a team by id.
    fn team_by_id(&self, id: &str) -> Option<&TeamDef>;

    /// Every id this provider can serve, in display order.
    fn team_ids(&self) -> Vec<String>;
}

impl RosterProvider for RosterBook {
    fn team_by_id(&self, id: &str) -> Option<&TeamDef> {
        self.get(id)
    }

    fn team_ids(&self) -> Vec<String> {
        self.ids().map(str::to_string).collect()
    }
}

impl<P: RosterProvider + ?Sized> RosterProvider for &P {
    fn team_by_id(&self, id: &str) -> Option<&TeamDef> {
        (**self).team_by_id(id)
    }

    fn team_ids(&self) -> Vec<String> {
        (**self).team_ids()
    }
}

/// A game that reached the end and went through aggregation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlayedGame {
    pub seed: u64,
    pub summary: GameSummary,
    pub box_score: BoxScore,
    /// False when the store rejected the records update.
    pub persisted: bool,
}

/// Results of a back-to-back batch.
#[derive(Debug, Default)]
pub struct SeriesReport {
    pub games: Vec<PlayedGame>,
    /// Game number (0-based) and the error that stopped it.
    pub failures: Vec<(usize, GameError)>,
}

impl SeriesReport {
    #[must_use]
    pub fn summaries(&self) -> Vec<GameSummary> {
        self.games.iter().map(|played| played.summary.clone()).collect()
    }

    #[must_use]
    pub fn totals(&self, regulation: u32) -> SeriesTotals {
        SeriesTotals::from_summaries(&self.summaries(), regulation)
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Main game engine: roster lookup, persisted records, game creation and
/// aggregation.
pub struct GameEngine<P, S>
where
    P: RosterProvider,
    S: KeyValueStore,
{
    rosters: P,
    store: S,
    config: SimConfig,
}

impl<P, S> GameEngine<P, S>
where
    P: RosterProvider,
    S: KeyValueStore,
{
    /// Create a new engine with the provided rosters, store and tuning.
    pub const fn new(rosters: P, store: S, config: SimConfig) -> Self {
        Self {
            rosters,
            store,
            config,
        }
    }

    pub const fn rosters(&self) -> &P {
        &self.rosters
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Persisted team records (empty when none exist yet).
    #[must_use]
    pub fn team_records(&self) -> TeamRecords {
        records::load_team_records(&self.store)
    }

    /// Persisted career stats (empty when none exist yet).
    #[must_use]
    pub fn career_stats(&self) -> CareerStats {
        records::load_career_stats(&self.store)
    }

    fn lookup(&self, id: &str) -> Result<&TeamDef, GameError> {
        let def = self
            .rosters
            .team_by_id(id)
            .ok_or_else(|| IntegrityFault::UnknownTeam(id.to_string()))?;
        if let Err(fault) = def.validate() {
            log::warn!("roster {id} is incomplete: {fault}");
        }
        Ok(def)
    }

    /// Start a game with the local outcome model, each side opening with the
    /// starter its persisted rotation pointer names.
    ///
    /// # Errors
    ///
    /// Returns `GameError::DataIntegrity` when either team id is unknown.
    pub fn create_game(&self, away: &str, home: &str, seed: u64) -> Result<Game, GameError> {
        let resolver = LocalResolver::new(self.config.clone());
        self.create_game_with(away, home, seed, resolver)
    }

    /// Like [`GameEngine::create_game`] with a caller-supplied resolver.
    ///
    /// # Errors
    ///
    /// Returns `GameError::DataIntegrity` when either team id is unknown.
    pub fn create_game_with<R: OutcomeResolver>(
        &self,
        away: &str,
        home: &str,
        seed: u64,
        resolver: R,
    ) -> Result<Game<R>, GameError> {
        let away_def = self.lookup(away)?;
        let home_def = self.lookup(home)?;
        let records = self.team_records();
        let starters = (
            records::starter_index(&records, &away_def.id),
            records::starter_index(&records, &home_def.id),
        );
        Ok(Game::new(
            away_def,
            home_def,
            starters,
            self.config.clone(),
            resolver,
            seed,
        ))
    }

    /// Aggregate a finished game into the store.
    ///
    /// Returns `None` when there is nothing to aggregate: the game is still
    /// running, faulted, or was already finished. Store failures are logged
    /// and reported through [`PlayedGame::persisted`].
    pub fn finish_game<R: OutcomeResolver>(&mut self, game: &mut Game<R>) -> Option<PlayedGame> {
        let seed = game.rngs().seed();
        let (summary, persisted) = match aggregate_game(game.state_mut(), &mut self.store) {
            Ok(Some(summary)) => (summary, true),
            Ok(None) => return None,
            Err(err) => {
                log::warn!("game finished but records were not saved: {err}");
                (records::summarize(game.state()), false)
            }
        };
        Some(PlayedGame {
            seed,
            summary,
            box_score: game.box_score(),
            persisted,
        })
    }

    /// Create, play and aggregate one game.
    ///
    /// # Errors
    ///
    /// Returns the `GameError` that stopped the game. Faulted or abandoned
    /// games are not aggregated.
    pub fn play_game(
        &mut self,
        away: &str,
        home: &str,
        seed: u64,
        sink: &mut dyn DisplaySink,
    ) -> Result<PlayedGame, GameError> {
        let mut game = self.create_game(away, home, seed)?;
        game.play_to_completion(sink, |_| false)?;
        self.finish_game(&mut game).ok_or(GameError::GameOver)
    }

    /// Play `games` games back to back. Each game picks up the rotation
    /// pointers saved by the one before it.
    ///
    /// Game `i` uses a seed derived from `seed` and `i`, so a batch is
    /// reproducible as a whole. A failed game is recorded and the batch
    /// moves on.
    pub fn simulate_series(
        &mut self,
        away: &str,
        home: &str,
        games: usize,
        seed: u64,
        sink: &mut dyn DisplaySink,
    ) -> SeriesReport {
        let mut report = SeriesReport::default();
        for (index, game_seed) in series_game_seeds(seed, games).into_iter().enumerate() {
            match self.play_game(away, home, game_seed, sink) {
                Ok(played) => report.games.push(played),
                Err(err) => {
                    log::error!("game {index} of {away} at {home} failed: {err}");
                    report.failures.push((index, err));
                }
            }
        }
        report
    }

    /// Wipe team records and career stats.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the store cannot be cleared.
    pub fn reset_all(&mut self) -> Result<(), StoreError> {
        log::info!("clearing team records and career stats");
        self.store.clear()
    }
}

/// Per-game seeds for a series, drawn from a ChaCha20 stream keyed by `seed`.
///
/// A longer series shares its prefix with a shorter one from the same seed.
#[must_use]
pub fn series_game_seeds(seed: u64, games: usize) -> Vec<u64> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..games).map(|_| rng.next_u64()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> GameEngine<&'static RosterBook, MemoryStore> {
        GameEngine::new(
            RosterBook::builtin(),
            MemoryStore::new(),
            SimConfig::default_config().clone(),
        )
    }

    #[test]
    fn unknown_team_is_an_integrity_fault() {
        let engine = engine();
        let err = engine.create_game("BOS", "LAD", 1).err().expect("unknown id");
        assert_eq!(
            err,
            GameError::DataIntegrity(IntegrityFault::UnknownTeam("BOS".to_string()))
        );
    }

    #[test]
    fn played_game_is_persisted() {
        let mut engine = engine();
        let played = engine
            .play_game("NYY", "LAD", 42, &mut NullSink)
            .expect("game completes");
        assert!(played.persisted);
        assert!(played.summary.innings >= 9);
        assert_ne!(played.summary.away_runs, played.summary.home_runs);

        let records = engine.team_records();
        assert_eq!(records["NYY"].starter_index, 1);
        assert_eq!(records["LAD"].starter_index, 1);
        assert_eq!(records["NYY"].wins + records["LAD"].wins, 1);
        assert!(!engine.career_stats()["NYY"].is_empty());
    }

    #[test]
    fn series_walks_the_rotation() {
        let mut engine = engine();
        let report = engine.simulate_series("NYY", "LAD", 6, 7, &mut NullSink);
        assert!(!report.has_failures());
        assert_eq!(report.games.len(), 6);
        let records = engine.team_records();
        assert_eq!(records["NYY"].starter_index, 6 % 5);
        assert_eq!(records["NYY"].wins + records["NYY"].losses, 6);
        let totals = report.totals(9);
        assert_eq!(totals.games, 6);
        assert_eq!(totals.ties, 0);
    }

    #[test]
    fn second_game_opens_with_next_starter() {
        let mut engine = engine();
        engine.play_game("NYY", "LAD", 3, &mut NullSink).expect("first");
        let game = engine.create_game("NYY", "LAD", 4).expect("second");
        let starter = game.state().away.starter().expect("starter");
        assert_eq!(starter.name, "Max Fried");
    }

    #[test]
    fn reset_all_forgets_records() {
        let mut engine = engine();
        engine.play_game("LAD", "NYY", 9, &mut NullSink).expect("game");
        assert!(!engine.team_records().is_empty());
        engine.reset_all().expect("clear");
        assert!(engine.team_records().is_empty());
        assert!(engine.career_stats().is_empty());
    }

    #[test]
    fn series_seeds_are_distinct_and_stable() {
        let seeds = series_game_seeds(5, 4);
        assert_eq!(seeds, series_game_seeds(5, 4));
        assert_eq!(series_game_seeds(5, 2), seeds[..2]);
        assert_ne!(seeds[0], seeds[1]);
        assert_ne!(seeds, series_game_seeds(6, 4));
    }
}
