use colored::Colorize;
use dugout_game::{
    DisplaySink, GameEngine, GameError, KeyValueStore, NullSink, OutcomeCategory, PlayedGame,
    RosterProvider, SeriesTotals, series_game_seeds,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// What a batch run should play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub away: String,
    pub home: String,
    pub games: usize,
    pub master_seed: u64,
}

/// One completed game with its wall-clock cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub index: usize,
    #[serde(flatten)]
    pub played: PlayedGame,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// A game that stopped on an engine error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameFailure {
    pub index: usize,
    pub seed: u64,
    pub error: String,
}

/// Everything a report needs about a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub away: String,
    pub home: String,
    pub master_seed: u64,
    pub games: Vec<GameRecord>,
    pub failures: Vec<GameFailure>,
    pub totals: SeriesTotals,
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

impl BatchResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Mean time per completed game.
    #[must_use]
    pub fn average_duration(&self) -> Duration {
        if self.games.is_empty() {
            return Duration::ZERO;
        }
        self.games.iter().map(|g| g.duration).sum::<Duration>()
            / u32::try_from(self.games.len()).unwrap_or(u32::MAX)
    }
}

/// Prints play-by-play to stdout, colored by category.
#[derive(Debug, Default)]
pub struct PlayByPlaySink;

impl DisplaySink for PlayByPlaySink {
    fn report_outcome(&mut self, message: &str, category: OutcomeCategory) {
        let line = match category {
            OutcomeCategory::HomeRun => message.bright_magenta().bold(),
            OutcomeCategory::Single | OutcomeCategory::Double | OutcomeCategory::Triple => {
                message.green()
            }
            OutcomeCategory::Walk | OutcomeCategory::HitByPitch => message.cyan(),
            OutcomeCategory::Strikeout | OutcomeCategory::Out => message.normal(),
            OutcomeCategory::GameEvent => message.yellow(),
            OutcomeCategory::GameOver => message.bright_white().bold(),
            OutcomeCategory::GameError => message.red().bold(),
        };
        println!("  {line}");
    }
}

pub struct BatchRunner {
    verbose: bool,
    play_by_play: bool,
}

impl BatchRunner {
    pub const fn new(verbose: bool, play_by_play: bool) -> Self {
        Self {
            verbose,
            play_by_play,
        }
    }

    pub fn run<P, S>(&self, engine: &mut GameEngine<P, S>, plan: &BatchPlan) -> BatchResult
    where
        P: RosterProvider,
        S: KeyValueStore,
    {
        let start = Instant::now();
        let mut games = Vec::with_capacity(plan.games);
        let mut failures = Vec::new();
        log::info!(
            "batch {} at {}: {} games from master seed {}",
            plan.away,
            plan.home,
            plan.games,
            plan.master_seed
        );

        for (index, seed) in series_game_seeds(plan.master_seed, plan.games)
            .into_iter()
            .enumerate()
        {
            let game_start = Instant::now();
            match self.play_one(engine, plan, seed) {
                Ok(played) => {
                    let duration = game_start.elapsed();
                    if self.verbose {
                        let summary = &played.summary;
                        println!(
                            "  {} Game {} (seed {seed}): {} {} - {} {} in {} ({duration:?})",
                            "✓".green(),
                            index + 1,
                            summary.away,
                            summary.away_runs,
                            summary.home_runs,
                            summary.home,
                            summary.innings,
                        );
                    }
                    games.push(GameRecord {
                        index,
                        played,
                        duration,
                    });
                }
                Err(err) => {
                    eprintln!(
                        "  {} Game {} (seed {seed}) failed: {}",
                        "✗".red(),
                        index + 1,
                        err.to_string().red()
                    );
                    failures.push(GameFailure {
                        index,
                        seed,
                        error: err.to_string(),
                    });
                }
            }
        }

        let summaries: Vec<_> = games.iter().map(|g| g.played.summary.clone()).collect();
        BatchResult {
            away: plan.away.clone(),
            home: plan.home.clone(),
            master_seed: plan.master_seed,
            totals: SeriesTotals::from_summaries(&summaries, engine.config().innings),
            games,
            failures,
            total_duration: start.elapsed(),
        }
    }

    fn play_one<P, S>(
        &self,
        engine: &mut GameEngine<P, S>,
        plan: &BatchPlan,
        seed: u64,
    ) -> Result<PlayedGame, GameError>
    where
        P: RosterProvider,
        S: KeyValueStore,
    {
        if self.play_by_play {
            engine.play_game(&plan.away, &plan.home, seed, &mut PlayByPlaySink)
        } else {
            engine.play_game(&plan.away, &plan.home, seed, &mut NullSink)
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
