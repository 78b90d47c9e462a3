//! Runner advancement and run scoring for a single plate event.
//!
//! Runners are always processed from third base down to first so a lead
//! runner vacates a base before the trailing runner is placed.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::SpeedConfig;
use crate::constants::BASE_COUNT;
use crate::outcome::PlateEvent;
use crate::state::{Bases, Runner};

/// Lineup slots of runners who crossed the plate on one play.
pub type Scorers = SmallVec<[usize; 4]>;

/// Result of applying one event to the bases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advancement {
    pub bases: Bases,
    pub runs: u32,
    pub rbi: u32,
    pub outs: u8,
    pub scorers: Scorers,
}

impl Advancement {
    fn unchanged(bases: &Bases, outs: u8) -> Self {
        Self {
            bases: bases.clone(),
            runs: 0,
            rbi: 0,
            outs,
            scorers: Scorers::new(),
        }
    }

    fn score(&mut self, runner: Runner) {
        self.runs += 1;
        self.scorers.push(runner.lineup_slot);
    }
}

/// Apply `event` for `batter` to the current bases.
///
/// Every run that scores on the play is credited to the batter as an RBI.
pub fn advance_runners<R: Rng + ?Sized>(
    event: PlateEvent,
    batter: Runner,
    bases: &Bases,
    speed: &SpeedConfig,
    rng: &mut R,
) -> Advancement {
    let mut result = match event {
        PlateEvent::Strikeout | PlateEvent::Out(_) => return Advancement::unchanged(bases, 1),
        PlateEvent::Walk | PlateEvent::HitByPitch => force_advance(batter, bases),
        PlateEvent::HomeRun => clear_the_bases(batter, bases),
        PlateEvent::Single | PlateEvent::Double | PlateEvent::Triple => {
            hit_advance(event, batter, bases, speed, rng)
        }
    };
    result.rbi = result.runs;
    result
}

fn force_advance(batter: Runner, bases: &Bases) -> Advancement {
    let mut result = Advancement::unchanged(bases, 0);
    let mut incoming = Some(batter);
    for base in 0..BASE_COUNT {
        let Some(runner) = incoming else {
            break;
        };
        incoming = result.bases.take(base);
        result.bases.place(base, runner);
    }
    if let Some(forced_home) = incoming {
        result.score(forced_home);
    }
    result
}

fn clear_the_bases(batter: Runner, bases: &Bases) -> Advancement {
    let mut result = Advancement::unchanged(&Bases::default(), 0);
    for base in (0..BASE_COUNT).rev() {
        if let Some(runner) = bases.get(base) {
            result.score(runner);
        }
    }
    result.score(batter);
    result
}

fn hit_advance<R: Rng + ?Sized>(
    event: PlateEvent,
    batter: Runner,
    bases: &Bases,
    speed: &SpeedConfig,
    rng: &mut R,
) -> Advancement {
    let advance = usize::from(event.bases_advanced());
    let bonus_eligible = matches!(event, PlateEvent::Single | PlateEvent::Double);
    let mut result = Advancement::unchanged(&Bases::default(), 0);

    for base in (0..BASE_COUNT).rev() {
        let Some(runner) = bases.get(base) else {
            continue;
        };
        let baseline = base + advance;
        let mut target = baseline;
        if bonus_eligible {
            let chance = speed.extra_base_chance(runner.speed);
            if chance > 0.0 && rng.r#gen::<f64>() < chance {
                target += 1;
            }
        }
        if target >= BASE_COUNT {
            result.score(runner);
            continue;
        }
        let landing = (baseline..=target)
            .rev()
            .find(|candidate| result.bases.get(*candidate).is_none())
            .unwrap_or(baseline);
        result.bases.place(landing, runner);
    }

    result.bases.place(advance - 1, batter);
    result
}
