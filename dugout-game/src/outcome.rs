//! At-bat outcome model.
//!
//! Converts a batter/pitcher matchup into a probability table and samples a
//! single plate event from it. The sampling step sits behind
//! [`OutcomeResolver`] so a remote backend can replace the local algorithm.
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::config::SimConfig;
use crate::constants::{
    CODE_DOUBLE, CODE_HIT_BY_PITCH, CODE_HOME_RUN, CODE_IN_PLAY_OUT, CODE_OUT, CODE_SINGLE,
    CODE_STRIKEOUT, CODE_TRIPLE, CODE_WALK, RATING_NEUTRAL,
};
use crate::display::OutcomeCategory;
use crate::error::ResolveError;
use crate::player::{Batter, Pitcher};
use crate::rating::{BatterAttributes, PitcherAttributes};

#[cfg(feature = "remote")]
pub mod remote;
#[cfg(feature = "remote")]
pub use remote::HttpResolver;

/// Cosmetic descriptor for a ball put in play for an out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutFlavor {
    GroundsOut,
    FliesOut,
    LinesOut,
    PopsUp,
}

impl OutFlavor {
    pub const ALL: [Self; 4] = [Self::GroundsOut, Self::FliesOut, Self::LinesOut, Self::PopsUp];

    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::GroundsOut => "grounds out",
            Self::FliesOut => "flies out",
            Self::LinesOut => "lines out",
            Self::PopsUp => "pops up",
        }
    }

    /// Pick a flavor uniformly with a single unit roll.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll: f64 = rng.r#gen();
        let index = (roll * 4.0) as usize;
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }
}

/// Closed set of plate-appearance results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateEvent {
    Strikeout,
    Walk,
    HitByPitch,
    Single,
    Double,
    Triple,
    HomeRun,
    Out(OutFlavor),
}

impl PlateEvent {
    /// Bases the batter is awarded; zero for outs.
    #[must_use]
    pub const fn bases_advanced(self) -> u8 {
        match self {
            Self::Walk | Self::HitByPitch | Self::Single => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::HomeRun => 4,
            Self::Strikeout | Self::Out(_) => 0,
        }
    }

    #[must_use]
    pub const fn is_out(self) -> bool {
        matches!(self, Self::Strikeout | Self::Out(_))
    }

    #[must_use]
    pub const fn is_hit(self) -> bool {
        matches!(
            self,
            Self::Single | Self::Double | Self::Triple | Self::HomeRun
        )
    }

    /// Walks and hit-by-pitch advance runners only when forced.
    #[must_use]
    pub const fn is_forced_award(self) -> bool {
        matches!(self, Self::Walk | Self::HitByPitch)
    }

    #[must_use]
    pub const fn counts_as_at_bat(self) -> bool {
        !self.is_forced_award()
    }

    /// History code recorded on the batter.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Strikeout => CODE_STRIKEOUT,
            Self::Walk => CODE_WALK,
            Self::HitByPitch => CODE_HIT_BY_PITCH,
            Self::Single => CODE_SINGLE,
            Self::Double => CODE_DOUBLE,
            Self::Triple => CODE_TRIPLE,
            Self::HomeRun => CODE_HOME_RUN,
            Self::Out(_) => CODE_OUT,
        }
    }

    #[must_use]
    pub const fn category(self) -> OutcomeCategory {
        match self {
            Self::Strikeout => OutcomeCategory::Strikeout,
            Self::Walk => OutcomeCategory::Walk,
            Self::HitByPitch => OutcomeCategory::HitByPitch,
            Self::Single => OutcomeCategory::Single,
            Self::Double => OutcomeCategory::Double,
            Self::Triple => OutcomeCategory::Triple,
            Self::HomeRun => OutcomeCategory::HomeRun,
            Self::Out(_) => OutcomeCategory::Out,
        }
    }

    /// Play-by-play line for this event.
    #[must_use]
    pub fn describe(self, batter: &str) -> String {
        match self {
            Self::Strikeout => format!("{batter} STRIKES OUT!"),
            Self::Walk => format!("{batter} draws a WALK."),
            Self::HitByPitch => format!("{batter} is HIT BY A PITCH."),
            Self::Single => format!("{batter} hits a SINGLE!"),
            Self::Double => format!("{batter} hits a DOUBLE!"),
            Self::Triple => format!("{batter} hits a TRIPLE!"),
            Self::HomeRun => format!("HOME RUN for {batter}!!"),
            Self::Out(flavor) => format!("{batter} {}.", flavor.verb()),
        }
    }
}

/// Outcome codes spoken by remote resolvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireCode {
    Single,
    Double,
    Triple,
    HomeRun,
    Walk,
    HitByPitch,
    Strikeout,
    InPlayOut,
}

impl WireCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => CODE_SINGLE,
            Self::Double => CODE_DOUBLE,
            Self::Triple => CODE_TRIPLE,
            Self::HomeRun => CODE_HOME_RUN,
            Self::Walk => CODE_WALK,
            Self::HitByPitch => CODE_HIT_BY_PITCH,
            Self::Strikeout => CODE_STRIKEOUT,
            Self::InPlayOut => CODE_IN_PLAY_OUT,
        }
    }

    /// Map onto the engine taxonomy; in-play outs take the supplied flavor.
    #[must_use]
    pub const fn into_event(self, flavor: OutFlavor) -> PlateEvent {
        match self {
            Self::Single => PlateEvent::Single,
            Self::Double => PlateEvent::Double,
            Self::Triple => PlateEvent::Triple,
            Self::HomeRun => PlateEvent::HomeRun,
            Self::Walk => PlateEvent::Walk,
            Self::HitByPitch => PlateEvent::HitByPitch,
            Self::Strikeout => PlateEvent::Strikeout,
            Self::InPlayOut => PlateEvent::Out(flavor),
        }
    }
}

impl FromStr for WireCode {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            CODE_SINGLE => Ok(Self::Single),
            CODE_DOUBLE => Ok(Self::Double),
            CODE_TRIPLE => Ok(Self::Triple),
            CODE_HOME_RUN => Ok(Self::HomeRun),
            CODE_WALK => Ok(Self::Walk),
            CODE_HIT_BY_PITCH => Ok(Self::HitByPitch),
            CODE_STRIKEOUT => Ok(Self::Strikeout),
            CODE_IN_PLAY_OUT => Ok(Self::InPlayOut),
            _ => Err(ResolveError::UnknownCode(s.to_string())),
        }
    }
}

impl fmt::Display for WireCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved plate appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub event: PlateEvent,
    pub description: String,
}

impl Outcome {
    #[must_use]
    pub fn new(event: PlateEvent, batter: &str) -> Self {
        Self {
            event,
            description: event.describe(batter),
        }
    }

    #[must_use]
    pub const fn bases_advanced(&self) -> u8 {
        self.event.bases_advanced()
    }
}

/// Pitcher power and control after velocity bonus and fatigue penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectivePitching {
    pub power: f64,
    pub control: f64,
}

impl EffectivePitching {
    #[must_use]
    pub fn compute(attributes: &PitcherAttributes, stamina_fraction: f64, cfg: &SimConfig) -> Self {
        let stamina = &cfg.stamina;
        let velocity_delta = f64::from(attributes.velocity) - RATING_NEUTRAL;
        let mut power = f64::from(attributes.power) + velocity_delta * stamina.velocity_power_bonus;
        let mut control =
            f64::from(attributes.control) + velocity_delta * stamina.velocity_control_bonus;

        let penalty = if stamina_fraction < stamina.low_threshold {
            stamina.low_penalty
        } else if stamina_fraction < stamina.medium_threshold {
            stamina.medium_penalty
        } else {
            0.0
        };
        power -= penalty;
        control -= penalty;

        Self {
            power: power.max(1.0),
            control: control.max(1.0),
        }
    }
}

/// Normalized five-way distribution for one at-bat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityTable {
    pub strikeout: f64,
    pub walk: f64,
    pub home_run: f64,
    pub other_hit: f64,
    pub out: f64,
}

/// First-stage sample before hit type and out flavor are decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOutcome {
    Strikeout,
    Walk,
    HomeRun,
    OtherHit,
    Out,
}

impl ProbabilityTable {
    /// Build the table for a matchup.
    #[must_use]
    pub fn compute(
        batter: &BatterAttributes,
        pitcher: &PitcherAttributes,
        stamina_fraction: f64,
        cfg: &SimConfig,
    ) -> Self {
        let effective = EffectivePitching::compute(pitcher, stamina_fraction, cfg);
        let fx = &cfg.effects;
        let caps = &cfg.caps;
        let delta = |value: u8| f64::from(value) - RATING_NEUTRAL;
        let power_delta = effective.power - RATING_NEUTRAL;

        let strikeout = cfg.base_rates.strikeout
            + power_delta * fx.pitcher_power_on_strikeout
            + delta(pitcher.velocity) * fx.velocity_on_strikeout
            + delta(pitcher.technique) * fx.technique_on_strikeout
            + delta(batter.contact) * fx.contact_on_strikeout;
        let walk = cfg.base_rates.walk + (RATING_NEUTRAL - effective.control) * fx.control_on_walk;
        let home_run = cfg.base_rates.home_run
            + delta(batter.power) * fx.batter_power_on_home_run
            + power_delta * fx.pitcher_power_on_home_run
            + delta(pitcher.technique) * fx.technique_on_home_run;
        let other_hit = cfg.base_rates.other_hit
            + delta(batter.hit_rate) * fx.hit_rate_on_hit
            + power_delta * fx.pitcher_power_on_hit
            + delta(pitcher.velocity) * fx.velocity_on_hit;

        let mut rates = [
            caps.strikeout.clamp(strikeout),
            caps.walk.clamp(walk),
            caps.home_run.clamp(home_run),
            caps.other_hit.clamp(other_hit),
        ];

        let sum: f64 = rates.iter().sum();
        if sum > caps.sum_cap {
            let scale = caps.sum_cap / sum;
            rates.iter_mut().for_each(|rate| *rate *= scale);
        }

        let sum: f64 = rates.iter().sum();
        let mut out = 1.0 - sum;
        if out < caps.out_min {
            out = caps.out_min;
            if sum > 0.0 {
                let scale = (1.0 - out) / sum;
                rates.iter_mut().for_each(|rate| *rate *= scale);
            }
        }

        let total: f64 = rates.iter().sum::<f64>() + out;
        if total <= 0.0 {
            return Self {
                strikeout: 0.0,
                walk: 0.0,
                home_run: 0.0,
                other_hit: 0.0,
                out: 1.0,
            };
        }
        let [strikeout, walk, home_run, other_hit] = rates.map(|rate| rate / total);
        Self {
            strikeout,
            walk,
            home_run,
            other_hit,
            out: out / total,
        }
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.strikeout + self.walk + self.home_run + self.other_hit + self.out
    }

    /// Inverse-CDF lookup in the fixed order strikeout, walk, home run, other hit, out.
    #[must_use]
    pub fn sample(&self, roll: f64) -> RawOutcome {
        let mut cumulative = self.strikeout;
        if roll < cumulative {
            return RawOutcome::Strikeout;
        }
        cumulative += self.walk;
        if roll < cumulative {
            return RawOutcome::Walk;
        }
        cumulative += self.home_run;
        if roll < cumulative {
            return RawOutcome::HomeRun;
        }
        cumulative += self.other_hit;
        if roll < cumulative {
            return RawOutcome::OtherHit;
        }
        RawOutcome::Out
    }
}

/// Resolves one at-bat into an outcome.
///
/// Implementations must not touch stamina or stats; the state machine owns
/// those updates.
pub trait OutcomeResolver {
    /// Resolve a single plate appearance.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError` when the backend cannot produce an outcome. The
    /// caller substitutes a generic out.
    fn resolve(
        &mut self,
        batter: &Batter,
        pitcher: &Pitcher,
        rng: &mut dyn RngCore,
    ) -> Result<Outcome, ResolveError>;
}

/// Reference resolver running the probability model in-process.
#[derive(Debug, Clone, Default)]
pub struct LocalResolver {
    config: SimConfig,
}

impl LocalResolver {
    #[must_use]
    pub const fn new(config: SimConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Sample an event for the matchup without building a description.
    pub fn sample_event<R: Rng + ?Sized>(
        &self,
        batter: &Batter,
        pitcher: &Pitcher,
        rng: &mut R,
    ) -> PlateEvent {
        let table = ProbabilityTable::compute(
            &batter.attributes,
            &pitcher.attributes,
            pitcher.stamina_fraction(),
            &self.config,
        );
        match table.sample(rng.r#gen()) {
            RawOutcome::Strikeout => PlateEvent::Strikeout,
            RawOutcome::Walk => PlateEvent::Walk,
            RawOutcome::HomeRun => PlateEvent::HomeRun,
            RawOutcome::OtherHit => self.hit_type(batter.attributes.speed, rng),
            RawOutcome::Out => PlateEvent::Out(OutFlavor::pick(rng)),
        }
    }

    fn hit_type<R: Rng + ?Sized>(&self, speed: u8, rng: &mut R) -> PlateEvent {
        let speed_cfg = &self.config.speed;
        if rng.r#gen::<f64>() < speed_cfg.double_chance {
            return PlateEvent::Double;
        }
        let stretch = speed_cfg.stretch_chance(speed);
        if stretch > 0.0 && rng.r#gen::<f64>() < stretch {
            return PlateEvent::Double;
        }
        PlateEvent::Single
    }
}

impl OutcomeResolver for LocalResolver {
    fn resolve(
        &mut self,
        batter: &Batter,
        pitcher: &Pitcher,
        rng: &mut dyn RngCore,
    ) -> Result<Outcome, ResolveError> {
        let event = self.sample_event(batter, pitcher, rng);
        Ok(Outcome::new(event, &batter.name))
    }
}

/// Resolver that replays a fixed list of events, then fails.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResolver {
    events: VecDeque<PlateEvent>,
}

impl ScriptedResolver {
    #[must_use]
    pub fn new<I>(events: I) -> Self
    where
        I: IntoIterator<Item = PlateEvent>,
    {
        Self {
            events: events.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl OutcomeResolver for ScriptedResolver {
    fn resolve(
        &mut self,
        batter: &Batter,
        _pitcher: &Pitcher,
        _rng: &mut dyn RngCore,
    ) -> Result<Outcome, ResolveError> {
        self.events
            .pop_front()
            .map(|event| Outcome::new(event, &batter.name))
            .ok_or_else(|| ResolveError::Unavailable("script exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRolls;
    use crate::roster::RosterBook;

    const GRID: [u8; 3] = [1, 5, 10];
    const EPSILON: f64 = 1e-9;

    fn all_matchups() -> impl Iterator<Item = (BatterAttributes, PitcherAttributes)> {
        GRID.into_iter().flat_map(|bp| {
            GRID.into_iter().flat_map(move |hr| {
                GRID.into_iter().flat_map(move |ct| {
                    GRID.into_iter().flat_map(move |sp| {
                        GRID.into_iter().flat_map(move |pp| {
                            GRID.into_iter().flat_map(move |ve| {
                                GRID.into_iter().flat_map(move |co| {
                                    GRID.into_iter().map(move |te| {
                                        (
                                            BatterAttributes::new(bp, hr, ct, sp),
                                            PitcherAttributes::new(pp, ve, co, te),
                                        )
                                    })
                                })
                            })
                        })
                    })
                })
            })
        })
    }

    #[test]
    fn tables_sum_to_one_and_respect_caps() {
        let cfg = SimConfig::default();
        for (batter, pitcher) in all_matchups() {
            for fraction in [1.0, 0.45, 0.2, 0.0] {
                let table = ProbabilityTable::compute(&batter, &pitcher, fraction, &cfg);
                assert!((table.sum() - 1.0).abs() < EPSILON, "{table:?}");
                assert!(table.strikeout <= cfg.caps.strikeout.max + EPSILON);
                assert!(table.walk <= cfg.caps.walk.max + EPSILON);
                assert!(table.home_run <= cfg.caps.home_run.max + EPSILON);
                assert!(table.other_hit <= cfg.caps.other_hit.max + EPSILON);
                assert!(table.out >= cfg.caps.out_min - EPSILON);
                for rate in [table.strikeout, table.walk, table.home_run, table.other_hit] {
                    assert!(rate >= 0.0);
                }
            }
        }
    }

    #[test]
    fn neutral_matchup_keeps_base_rates() {
        let cfg = SimConfig::default();
        let table = ProbabilityTable::compute(
            &BatterAttributes::default(),
            &PitcherAttributes::default(),
            1.0,
            &cfg,
        );
        assert!((table.strikeout - 0.21).abs() < EPSILON);
        assert!((table.walk - 0.08).abs() < EPSILON);
        assert!((table.home_run - 0.04).abs() < EPSILON);
        assert!((table.other_hit - 0.265).abs() < EPSILON);
        assert!((table.out - 0.405).abs() < EPSILON);
    }

    #[test]
    fn fatigue_penalties_degrade_effective_stuff() {
        let cfg = SimConfig::default();
        let attrs = PitcherAttributes::new(8, 7, 6, 5);
        let fresh = EffectivePitching::compute(&attrs, 1.0, &cfg);
        let tired = EffectivePitching::compute(&attrs, 0.45, &cfg);
        let gassed = EffectivePitching::compute(&attrs, 0.1, &cfg);
        assert!((fresh.power - 9.0).abs() < EPSILON);
        assert!((fresh.control - 6.4).abs() < EPSILON);
        assert!((tired.power - 7.5).abs() < EPSILON);
        assert!((gassed.power - 7.0).abs() < EPSILON);

        let weak = EffectivePitching::compute(&PitcherAttributes::new(1, 1, 1, 1), 0.0, &cfg);
        assert!((weak.power - 1.0).abs() < EPSILON);
        assert!((weak.control - 1.0).abs() < EPSILON);
    }

    #[test]
    fn sampling_walks_the_cdf_in_order() {
        let table = ProbabilityTable {
            strikeout: 0.2,
            walk: 0.1,
            home_run: 0.05,
            other_hit: 0.25,
            out: 0.4,
        };
        assert_eq!(table.sample(0.0), RawOutcome::Strikeout);
        assert_eq!(table.sample(0.25), RawOutcome::Walk);
        assert_eq!(table.sample(0.32), RawOutcome::HomeRun);
        assert_eq!(table.sample(0.5), RawOutcome::OtherHit);
        assert_eq!(table.sample(0.99), RawOutcome::Out);
    }

    #[test]
    fn local_resolver_follows_scripted_rolls() {
        let team = RosterBook::builtin().get("NYY").expect("yankees");
        let batter = Batter::from_def(&team.batters[0]);
        let pitcher = Pitcher::from_def(&team.pitchers.rotation[0]);
        let mut resolver = LocalResolver::default();

        let mut rolls = ScriptedRolls::new([0.0]);
        let outcome = resolver
            .resolve(&batter, &pitcher, &mut rolls)
            .expect("local resolver never fails");
        assert_eq!(outcome.event, PlateEvent::Strikeout);
        assert_eq!(outcome.description, "Trent Grisham STRIKES OUT!");

        // Out, then flavor index 1.
        let mut rolls = ScriptedRolls::new([0.999, 0.3]);
        let outcome = resolver.resolve(&batter, &pitcher, &mut rolls).expect("out");
        assert_eq!(outcome.event, PlateEvent::Out(OutFlavor::FliesOut));
        assert_eq!(outcome.description, "Trent Grisham flies out.");
    }

    #[test]
    fn other_hit_resolves_double_or_stretch() {
        let team = RosterBook::builtin().get("NYY").expect("yankees");
        let pitcher = Pitcher::from_def(&team.pitchers.rotation[4]);
        let fast = Batter::from_def(&team.batters[0]);
        let resolver = LocalResolver::default();
        let table = ProbabilityTable::compute(
            &fast.attributes,
            &pitcher.attributes,
            1.0,
            resolver.config(),
        );
        let hit_roll = table.strikeout + table.walk + table.home_run + table.other_hit / 2.0;

        let mut rolls = ScriptedRolls::new([hit_roll, 0.1]);
        assert_eq!(resolver.sample_event(&fast, &pitcher, &mut rolls), PlateEvent::Double);

        // Speed 8 stretches on a roll under 0.40.
        let mut rolls = ScriptedRolls::new([hit_roll, 0.9, 0.3]);
        assert_eq!(resolver.sample_event(&fast, &pitcher, &mut rolls), PlateEvent::Double);

        let mut rolls = ScriptedRolls::new([hit_roll, 0.9, 0.6]);
        assert_eq!(resolver.sample_event(&fast, &pitcher, &mut rolls), PlateEvent::Single);
    }

    #[test]
    fn wire_codes_map_to_events() {
        let event = "hbp"
            .parse::<WireCode>()
            .expect("known code")
            .into_event(OutFlavor::GroundsOut);
        assert_eq!(event, PlateEvent::HitByPitch);
        assert_eq!(
            "IPO".parse::<WireCode>().map(|c| c.into_event(OutFlavor::PopsUp)).ok(),
            Some(PlateEvent::Out(OutFlavor::PopsUp))
        );
        assert!(matches!(
            "GIDP".parse::<WireCode>(),
            Err(ResolveError::UnknownCode(code)) if code == "GIDP"
        ));
    }

    #[test]
    fn bases_advanced_and_descriptions() {
        assert_eq!(PlateEvent::Walk.bases_advanced(), 1);
        assert_eq!(PlateEvent::Triple.bases_advanced(), 3);
        assert_eq!(PlateEvent::HomeRun.bases_advanced(), 4);
        assert_eq!(PlateEvent::Out(OutFlavor::LinesOut).bases_advanced(), 0);
        assert_eq!(PlateEvent::HomeRun.describe("Aaron Judge"), "HOME RUN for Aaron Judge!!");
        assert_eq!(PlateEvent::Triple.describe("Ohtani"), "Ohtani hits a TRIPLE!");
        assert!(!PlateEvent::HitByPitch.counts_as_at_bat());
    }

    #[test]
    fn scripted_resolver_errors_when_exhausted() {
        let team = RosterBook::builtin().get("LAD").expect("dodgers");
        let batter = Batter::from_def(&team.batters[0]);
        let pitcher = Pitcher::from_def(&team.pitchers.rotation[0]);
        let mut resolver = ScriptedResolver::new([PlateEvent::Single]);
        let mut rolls = ScriptedRolls::default();
        assert!(resolver.resolve(&batter, &pitcher, &mut rolls).is_ok());
        assert!(matches!(
            resolver.resolve(&batter, &pitcher, &mut rolls),
            Err(ResolveError::Unavailable(_))
        ));
    }
}
