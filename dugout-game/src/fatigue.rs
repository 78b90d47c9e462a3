//! Pitcher stamina drain and bullpen substitution policy.
use rand::Rng;

use crate::config::{BullpenConfig, StaminaConfig};
use crate::numbers::floor_f64_to_u32;
use crate::player::{Pitcher, PitcherSlot};
use crate::state::Team;

/// Game situation the bullpen policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Situation {
    pub inning: u32,
    pub regulation: u32,
    pub run_gap: u32,
}

impl Situation {
    /// Late innings with a small margin.
    #[must_use]
    pub fn is_late_and_close(&self, cfg: &BullpenConfig) -> bool {
        let window_start = self.regulation.saturating_sub(cfg.closer_innings_from_end);
        self.inning >= window_start && self.run_gap <= cfg.closer_score_margin
    }
}

/// Whether `pitcher` pitching from `slot` has reached their limit.
#[must_use]
pub fn is_fatigued(slot: PitcherSlot, pitcher: &Pitcher, cfg: &BullpenConfig) -> bool {
    let fraction = pitcher.stamina_fraction();
    let outs = pitcher.line.outs_recorded;
    match slot {
        PitcherSlot::Rotation(_) => {
            fraction < cfg.starter_fatigue_fraction || outs >= cfg.starter_out_limit
        }
        PitcherSlot::Reliever => {
            fraction < cfg.reliever_fatigue_fraction || outs >= cfg.reliever_out_limit
        }
        PitcherSlot::Closer => false,
    }
}

/// Pick the pitcher who should face the next batter.
///
/// Returns `Some(slot)` only when a change is committed: the candidate is a
/// different pitcher and still has stamina. Otherwise the current pitcher
/// stays in, tired or not.
#[must_use]
pub fn select_pitcher(team: &Team, situation: Situation, cfg: &BullpenConfig) -> Option<PitcherSlot> {
    let current_slot = team.current_pitcher?;
    let current = team.staff.get(current_slot)?;

    let closer_ready = team.staff.closer.as_ref().is_some_and(Pitcher::is_fresh);
    let candidate = if situation.is_late_and_close(cfg)
        && closer_ready
        && current_slot != PitcherSlot::Closer
    {
        Some(PitcherSlot::Closer)
    } else if is_fatigued(current_slot, current, cfg) {
        fallback_for(current_slot, team)
    } else {
        None
    }?;

    let fresh = team.staff.get(candidate).is_some_and(Pitcher::is_fresh);
    (candidate != current_slot && fresh).then_some(candidate)
}

fn fallback_for(slot: PitcherSlot, team: &Team) -> Option<PitcherSlot> {
    let has_reliever = team.staff.reliever.is_some();
    let has_closer = team.staff.closer.is_some();
    match slot {
        PitcherSlot::Rotation(_) if has_reliever => Some(PitcherSlot::Reliever),
        PitcherSlot::Rotation(_) if has_closer => Some(PitcherSlot::Closer),
        PitcherSlot::Reliever if has_closer => Some(PitcherSlot::Closer),
        PitcherSlot::Reliever => Some(PitcherSlot::Reliever),
        PitcherSlot::Rotation(_) | PitcherSlot::Closer => None,
    }
}

/// Stamina cost of one batter faced: `drain_min` plus a uniform whole step.
pub fn drain_amount<R: Rng + ?Sized>(cfg: &StaminaConfig, rng: &mut R) -> f64 {
    let steps = floor_f64_to_u32(cfg.drain_max - cfg.drain_min);
    let roll: f64 = rng.r#gen();
    let step = floor_f64_to_u32(roll * f64::from(steps + 1)).min(steps);
    cfg.drain_min + f64::from(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRolls;
    use crate::roster::RosterBook;

    fn yankees() -> Team {
        Team::from_def(RosterBook::builtin().get("NYY").expect("nyy"), 0, 9)
    }

    const EARLY: Situation = Situation {
        inning: 3,
        regulation: 9,
        run_gap: 0,
    };

    fn set_fraction(team: &mut Team, slot: PitcherSlot, fraction: f64) {
        let pitcher = team.staff.get_mut(slot).expect("slot exists");
        pitcher.current_stamina = pitcher.max_stamina * fraction;
    }

    #[test]
    fn tired_starter_gives_way_to_reliever() {
        let mut team = yankees();
        set_fraction(&mut team, PitcherSlot::Rotation(0), 0.20);
        assert_eq!(
            select_pitcher(&team, EARLY, &BullpenConfig::default()),
            Some(PitcherSlot::Reliever)
        );
    }

    #[test]
    fn fresh_starter_stays_in() {
        let team = yankees();
        assert_eq!(select_pitcher(&team, EARLY, &BullpenConfig::default()), None);
    }

    #[test]
    fn out_limit_triggers_change() {
        let mut team = yankees();
        team.staff.rotation[0].line.outs_recorded = 18;
        assert_eq!(
            select_pitcher(&team, EARLY, &BullpenConfig::default()),
            Some(PitcherSlot::Reliever)
        );
    }

    #[test]
    fn starter_falls_back_to_closer_without_reliever() {
        let mut team = yankees();
        team.staff.reliever = None;
        set_fraction(&mut team, PitcherSlot::Rotation(0), 0.1);
        assert_eq!(
            select_pitcher(&team, EARLY, &BullpenConfig::default()),
            Some(PitcherSlot::Closer)
        );
    }

    #[test]
    fn tired_reliever_hands_to_closer() {
        let mut team = yankees();
        team.current_pitcher = Some(PitcherSlot::Reliever);
        team.staff.reliever.as_mut().expect("reliever").line.outs_recorded = 6;
        assert_eq!(
            select_pitcher(&team, EARLY, &BullpenConfig::default()),
            Some(PitcherSlot::Closer)
        );
    }

    #[test]
    fn exhausted_bullpen_keeps_current_pitcher() {
        let mut team = yankees();
        set_fraction(&mut team, PitcherSlot::Rotation(0), 0.1);
        set_fraction(&mut team, PitcherSlot::Reliever, 0.0);
        assert_eq!(select_pitcher(&team, EARLY, &BullpenConfig::default()), None);
    }

    #[test]
    fn closer_enters_late_and_close() {
        let team = yankees();
        let late = Situation {
            inning: 8,
            regulation: 9,
            run_gap: 3,
        };
        assert_eq!(
            select_pitcher(&team, late, &BullpenConfig::default()),
            Some(PitcherSlot::Closer)
        );
        let blowout = Situation { run_gap: 4, ..late };
        assert_eq!(select_pitcher(&team, blowout, &BullpenConfig::default()), None);

        let mut closing = yankees();
        closing.current_pitcher = Some(PitcherSlot::Closer);
        assert_eq!(select_pitcher(&closing, late, &BullpenConfig::default()), None);
    }

    #[test]
    fn drain_stays_on_whole_steps() {
        let cfg = StaminaConfig::default();
        let mut rolls = ScriptedRolls::new([0.0, 0.5, 0.999]);
        assert!((drain_amount(&cfg, &mut rolls) - 2.5).abs() < f64::EPSILON);
        assert!((drain_amount(&cfg, &mut rolls) - 3.5).abs() < f64::EPSILON);
        assert!((drain_amount(&cfg, &mut rolls) - 4.5).abs() < f64::EPSILON);
    }
}
