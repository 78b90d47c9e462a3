//! Game state machine.
//!
//! A [`Game`] owns its state, configuration, outcome resolver and random
//! streams. Callers drive it one at-bat at a time or through the batch
//! helpers; each call either applies a whole at-bat or nothing.
use serde::{Deserialize, Serialize};

use crate::baserunning::advance_runners;
use crate::config::SimConfig;
use crate::constants::{MAX_AT_BATS_PER_GAME, OUTS_PER_HALF};
use crate::display::{DisplaySink, OutcomeCategory};
use crate::error::{GameError, IntegrityFault};
use crate::fatigue::{Situation, drain_amount, select_pitcher};
use crate::outcome::{LocalResolver, OutFlavor, Outcome, OutcomeResolver, PlateEvent};
use crate::player::PitcherSlot;
use crate::rng::RngBundle;
use crate::roster::TeamDef;
use crate::state::{BoxScore, GamePhase, GameState, HalfInning, Runner, Side, Team};

/// Pitching change made before an at-bat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub team: String,
    pub slot: PitcherSlot,
    pub pitcher: String,
}

/// Everything that happened during one at-bat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtBatReport {
    pub inning: u32,
    pub half: HalfInning,
    pub batter: String,
    pub pitcher: String,
    pub outcome: Outcome,
    pub runs: u32,
    pub rbi: u32,
    pub substitution: Option<Substitution>,
    /// The resolver failed and a generic out was substituted.
    pub resolver_fault: bool,
    pub half_inning_ended: bool,
    pub game_over: bool,
}

/// How a batch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Stopped,
}

/// One game in progress.
#[derive(Debug)]
pub struct Game<R = LocalResolver> {
    state: GameState,
    config: SimConfig,
    resolver: R,
    rngs: RngBundle,
}

impl Game<LocalResolver> {
    /// Build a game using the in-process outcome model.
    #[must_use]
    pub fn local(
        away: &TeamDef,
        home: &TeamDef,
        starters: (usize, usize),
        config: SimConfig,
        seed: u64,
    ) -> Self {
        let resolver = LocalResolver::new(config.clone());
        Self::new(away, home, starters, config, resolver, seed)
    }
}

impl<R: OutcomeResolver> Game<R> {
    /// Copy both rosters into fresh per-game structures.
    ///
    /// `starters` holds the away and home rotation pointers.
    #[must_use]
    pub fn new(
        away: &TeamDef,
        home: &TeamDef,
        starters: (usize, usize),
        config: SimConfig,
        resolver: R,
        seed: u64,
    ) -> Self {
        let away_team = Team::from_def(away, starters.0, config.innings);
        let home_team = Team::from_def(home, starters.1, config.innings);
        Self::from_state(
            GameState::new(away_team, home_team, config.innings),
            config,
            resolver,
            RngBundle::from_user_seed(seed),
        )
    }

    /// Resume from an existing state, e.g. a hand-built scenario.
    #[must_use]
    pub fn from_state(
        state: GameState,
        config: SimConfig,
        resolver: R,
        rngs: RngBundle,
    ) -> Self {
        Self {
            state,
            config,
            resolver,
            rngs,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable access for scenario setup.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub const fn rngs(&self) -> &RngBundle {
        &self.rngs
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.state.is_over()
    }

    #[must_use]
    pub fn box_score(&self) -> BoxScore {
        self.state.box_score()
    }

    /// Move from `NotStarted` to `InProgress`. No-op once started.
    pub fn start(&mut self, sink: &mut dyn DisplaySink) {
        if self.state.phase != GamePhase::NotStarted {
            return;
        }
        self.state.phase = GamePhase::InProgress;
        let away_starter = self.state.away.starter().map_or("nobody", |p| p.name.as_str());
        let home_starter = self.state.home.starter().map_or("nobody", |p| p.name.as_str());
        log::info!(
            "game start: {} ({away_starter}) at {} ({home_starter}), seed {}",
            self.state.away.id,
            self.state.home.id,
            self.rngs.seed()
        );
        let message = format!(
            "Play ball! {} at {}. {away_starter} vs {home_starter}.",
            self.state.away.name, self.state.home.name
        );
        sink.report_outcome(&message, OutcomeCategory::GameEvent);
        sink.report_snapshot(&self.state.snapshot());
    }

    /// Resolve one at-bat.
    ///
    /// # Errors
    ///
    /// Returns `GameError::GameOver` when the game already ended,
    /// `GameError::DataIntegrity` when no batter or pitcher can be found
    /// (the game is ended and marked faulted), and `GameError::RunawayGame`
    /// when the at-bat ceiling is hit.
    pub fn play_at_bat(&mut self, sink: &mut dyn DisplaySink) -> Result<AtBatReport, GameError> {
        if self.state.is_over() {
            return Err(GameError::GameOver);
        }
        self.start(sink);
        if self.state.at_bats >= MAX_AT_BATS_PER_GAME {
            self.state.phase = GamePhase::GameOver;
            log::error!("game abandoned after {MAX_AT_BATS_PER_GAME} at-bats");
            sink.report_outcome("Game abandoned.", OutcomeCategory::GameError);
            return Err(GameError::RunawayGame(MAX_AT_BATS_PER_GAME));
        }
        if let Err(fault) = self.check_integrity() {
            return Err(self.fault(fault, sink));
        }

        let substitution = self.run_bullpen_policy(sink);

        let inning = self.state.inning;
        let half = self.state.half;
        let batting_side = half.batting();
        let fielding_side = half.fielding();

        let (outcome, resolver_fault, batter_name, pitcher_name, runner) = {
            let batting = self.state.team(batting_side);
            let fielding = self.state.team(fielding_side);
            let batter = batting.require_batter()?;
            let pitcher = fielding.require_pitcher()?;
            let mut plate_rng = self.rngs.plate();
            let (outcome, resolver_fault) =
                match self.resolver.resolve(batter, pitcher, &mut *plate_rng) {
                    Ok(outcome) => (outcome, false),
                    Err(err) => {
                        log::warn!("outcome resolver failed for {}: {err}", batter.name);
                        let flavor = OutFlavor::GroundsOut;
                        (Outcome::new(PlateEvent::Out(flavor), &batter.name), true)
                    }
                };
            let runner = Runner {
                lineup_slot: batting.batter_index,
                speed: batter.attributes.speed,
            };
            (
                outcome,
                resolver_fault,
                batter.name.clone(),
                pitcher.name.clone(),
                runner,
            )
        };
        let event = outcome.event;

        let drain = drain_amount(&self.config.stamina, &mut *self.rngs.bullpen());
        let advancement = advance_runners(
            event,
            runner,
            &self.state.bases,
            &self.config.speed,
            &mut *self.rngs.basepaths(),
        );

        self.state.at_bats += 1;
        self.state.bases = advancement.bases.clone();
        self.state.outs += advancement.outs;
        {
            let batting = self.state.team_mut(batting_side);
            batting.add_runs(inning, advancement.runs);
            if event.is_hit() {
                batting.hits += 1;
            }
            if let Some(batter) = batting.lineup.get_mut(runner.lineup_slot) {
                batter.record(event, advancement.rbi);
            }
            batting.advance_lineup();
        }
        if let Some(pitcher) = self.state.team_mut(fielding_side).current_pitcher_mut() {
            pitcher.drain(drain);
            pitcher.line.outs_recorded += u32::from(advancement.outs);
            pitcher.line.runs_allowed += advancement.runs;
            if event == PlateEvent::Strikeout {
                pitcher.line.strikeouts += 1;
            }
        }

        log::debug!(
            "{half} {inning}: {batter_name} vs {pitcher_name} -> {} ({} runs, {} outs)",
            event.code(),
            advancement.runs,
            self.state.outs
        );
        let message = match advancement.runs {
            0 => outcome.description.clone(),
            1 => format!("{} (1 run scored!)", outcome.description),
            runs => format!("{} ({runs} runs scored!)", outcome.description),
        };
        if resolver_fault {
            sink.report_outcome(
                &format!("No call on {batter_name}'s at-bat; scored as an out."),
                OutcomeCategory::GameEvent,
            );
        }
        sink.report_outcome(&message, event.category());

        if advancement.runs > 0 {
            self.check_walk_off(sink);
        }
        let mut half_inning_ended = false;
        if !self.state.is_over() && self.state.outs >= OUTS_PER_HALF {
            self.change_half_inning(sink);
            half_inning_ended = true;
        }
        sink.report_snapshot(&self.state.snapshot());

        Ok(AtBatReport {
            inning,
            half,
            batter: batter_name,
            pitcher: pitcher_name,
            outcome,
            runs: advancement.runs,
            rbi: advancement.rbi,
            substitution,
            resolver_fault,
            half_inning_ended,
            game_over: self.state.is_over(),
        })
    }

    /// Play until the current half-inning changes or the game ends.
    ///
    /// # Errors
    ///
    /// Propagates any fatal error from [`Game::play_at_bat`].
    pub fn play_half_inning(
        &mut self,
        sink: &mut dyn DisplaySink,
    ) -> Result<Vec<AtBatReport>, GameError> {
        let mut reports = Vec::new();
        loop {
            let report = self.play_at_bat(sink)?;
            let done = report.half_inning_ended || report.game_over;
            reports.push(report);
            if done {
                return Ok(reports);
            }
        }
    }

    /// Play until the game ends or `stop_requested` returns true.
    ///
    /// The predicate is checked between at-bats, so stopping never leaves a
    /// partially applied play.
    ///
    /// # Errors
    ///
    /// Propagates any fatal error from [`Game::play_at_bat`].
    pub fn play_to_completion<F>(
        &mut self,
        sink: &mut dyn DisplaySink,
        mut stop_requested: F,
    ) -> Result<RunStatus, GameError>
    where
        F: FnMut(&GameState) -> bool,
    {
        while !self.state.is_over() {
            if stop_requested(&self.state) {
                log::info!("simulation stopped in inning {}", self.state.inning);
                return Ok(RunStatus::Stopped);
            }
            self.play_at_bat(sink)?;
        }
        Ok(RunStatus::Completed)
    }

    fn check_integrity(&self) -> Result<(), IntegrityFault> {
        self.state.batting().require_batter()?;
        self.state.fielding().require_pitcher()?;
        Ok(())
    }

    fn fault(&mut self, fault: IntegrityFault, sink: &mut dyn DisplaySink) -> GameError {
        log::error!("game halted: {fault}");
        sink.report_outcome(&format!("Game halted: {fault}."), OutcomeCategory::GameError);
        self.state.phase = GamePhase::GameOver;
        self.state.fault = Some(fault.clone());
        GameError::DataIntegrity(fault)
    }

    fn run_bullpen_policy(&mut self, sink: &mut dyn DisplaySink) -> Option<Substitution> {
        let situation = Situation {
            inning: self.state.inning,
            regulation: self.state.regulation,
            run_gap: self.state.run_gap(),
        };
        let fielding = self.state.team_mut(self.state.half.fielding());
        let slot = select_pitcher(fielding, situation, &self.config.bullpen)?;
        fielding.current_pitcher = Some(slot);
        let pitcher = fielding.staff.get(slot)?;
        let message = format!(
            "{} brings in {} {}.",
            fielding.name,
            pitcher.role.label(),
            pitcher.name
        );
        log::info!("{message}");
        sink.report_outcome(&message, OutcomeCategory::GameEvent);
        Some(Substitution {
            team: fielding.id.clone(),
            slot,
            pitcher: pitcher.name.clone(),
        })
    }

    fn check_walk_off(&mut self, sink: &mut dyn DisplaySink) {
        let state = &self.state;
        if state.half == HalfInning::Bottom
            && state.inning >= state.regulation
            && state.home.runs > state.away.runs
        {
            let message = format!(
                "{} walk it off with a score of {} - {}!",
                state.home.name, state.home.runs, state.away.runs
            );
            self.finish(&message, sink);
        }
    }

    fn change_half_inning(&mut self, sink: &mut dyn DisplaySink) {
        self.state.outs = 0;
        self.state.bases.clear();
        sink.report_outcome("Change Side.", OutcomeCategory::GameEvent);

        match self.state.half {
            HalfInning::Top => {
                self.state.half = HalfInning::Bottom;
                // Home already ahead going into the last half: no need to bat.
                if self.state.inning >= self.state.regulation
                    && self.state.home.runs > self.state.away.runs
                {
                    self.finish_with_winner(Side::Home, sink);
                }
            }
            HalfInning::Bottom => {
                let inning = self.state.inning + 1;
                if inning > self.state.regulation {
                    // Final half stays on the books; the inning counter only
                    // moves when play continues.
                    if let Some(winner) = self.state.leader() {
                        self.finish_with_winner(winner, sink);
                        return;
                    }
                    let message = format!(
                        "Extra innings! Tied {} - {} heading into inning {inning}.",
                        self.state.away.runs, self.state.home.runs
                    );
                    log::info!("{message}");
                    sink.report_outcome(&message, OutcomeCategory::GameEvent);
                }
                self.state.half = HalfInning::Top;
                self.state.inning = inning;
                self.state.away.open_inning(inning);
                self.state.home.open_inning(inning);
            }
        }
    }

    fn finish_with_winner(&mut self, winner: Side, sink: &mut dyn DisplaySink) {
        let won = self.state.team(winner);
        let lost = self.state.team(winner.opposite());
        let message = format!("{} win {} - {}!", won.name, won.runs, lost.runs);
        self.finish(&message, sink);
    }

    fn finish(&mut self, message: &str, sink: &mut dyn DisplaySink) {
        self.state.phase = GamePhase::GameOver;
        log::info!(
            "game over after {} innings: {} {} - {} {}",
            self.state.inning,
            self.state.away.id,
            self.state.away.runs,
            self.state.home.runs,
            self.state.home.id
        );
        sink.report_outcome(message, OutcomeCategory::GameOver);
    }
}
