//! Tunable simulation parameters.
//!
//! Every field has a serde default so override files only need the values
//! they change. The shipped defaults live in `assets/sim.json`.
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::ConfigError;

/// Root configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Regulation innings per game.
    #[serde(default = "SimConfig::default_innings")]
    pub innings: u32,
    #[serde(default)]
    pub base_rates: BaseRates,
    #[serde(default)]
    pub effects: Effects,
    #[serde(default)]
    pub caps: Caps,
    #[serde(default)]
    pub stamina: StaminaConfig,
    #[serde(default)]
    pub speed: SpeedConfig,
    #[serde(default)]
    pub bullpen: BullpenConfig,
}

impl SimConfig {
    #[must_use]
    pub const fn default_innings() -> u32 {
        9
    }

    /// Configuration embedded with the crate.
    #[must_use]
    pub fn default_config() -> &'static Self {
        static CONFIG: OnceLock<SimConfig> = OnceLock::new();
        CONFIG.get_or_init(|| {
            serde_json::from_str(include_str!("../assets/sim.json"))
                .expect("valid built-in simulation config")
        })
    }

    /// Parse an override document and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and any validation
    /// error raised by [`SimConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates its documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.innings == 0 {
            return Err(ConfigError::ZeroInnings);
        }
        self.base_rates.validate()?;
        self.caps.validate()?;
        self.stamina.validate()?;
        self.speed.validate()?;
        self.bullpen.validate()?;
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            innings: Self::default_innings(),
            base_rates: BaseRates::default(),
            effects: Effects::default(),
            caps: Caps::default(),
            stamina: StaminaConfig::default(),
            speed: SpeedConfig::default(),
            bullpen: BullpenConfig::default(),
        }
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min: 0.0,
            max: 1.0,
            value,
        });
    }
    Ok(())
}

/// Starting probabilities before attribute adjustments. Generic out is the residual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseRates {
    pub strikeout: f64,
    pub walk: f64,
    pub home_run: f64,
    pub other_hit: f64,
}

impl BaseRates {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit("base_rates.strikeout", self.strikeout)?;
        check_unit("base_rates.walk", self.walk)?;
        check_unit("base_rates.home_run", self.home_run)?;
        check_unit("base_rates.other_hit", self.other_hit)?;
        let sum = self.strikeout + self.walk + self.home_run + self.other_hit;
        check_unit("base_rates.sum", sum)
    }
}

impl Default for BaseRates {
    fn default() -> Self {
        Self {
            strikeout: 0.21,
            walk: 0.08,
            home_run: 0.04,
            other_hit: 0.265,
        }
    }
}

/// Linear coefficients applied per point of `(attribute - 5)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effects {
    pub pitcher_power_on_strikeout: f64,
    pub velocity_on_strikeout: f64,
    pub technique_on_strikeout: f64,
    pub contact_on_strikeout: f64,
    /// Applied per point effective control sits below 5.
    pub control_on_walk: f64,
    pub batter_power_on_home_run: f64,
    pub pitcher_power_on_home_run: f64,
    pub technique_on_home_run: f64,
    pub hit_rate_on_hit: f64,
    pub pitcher_power_on_hit: f64,
    pub velocity_on_hit: f64,
}

impl Default for Effects {
    fn default() -> Self {
        Self {
            pitcher_power_on_strikeout: 0.024,
            velocity_on_strikeout: 0.020,
            technique_on_strikeout: 0.008,
            contact_on_strikeout: -0.033,
            control_on_walk: 0.023,
            batter_power_on_home_run: 0.017,
            pitcher_power_on_home_run: -0.0023,
            technique_on_home_run: -0.013,
            hit_rate_on_hit: 0.022,
            pitcher_power_on_hit: -0.015,
            velocity_on_hit: -0.015,
        }
    }
}

/// Inclusive clamp for a single rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateBounds {
    pub min: f64,
    pub max: f64,
}

impl RateBounds {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        check_unit(field, self.min)?;
        check_unit(field, self.max)?;
        if self.min > self.max {
            return Err(ConfigError::MinExceedsMax {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Probability clamps applied after attribute adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caps {
    #[serde(default = "Caps::default_strikeout")]
    pub strikeout: RateBounds,
    #[serde(default = "Caps::default_walk")]
    pub walk: RateBounds,
    #[serde(default = "Caps::default_home_run")]
    pub home_run: RateBounds,
    #[serde(default = "Caps::default_other_hit")]
    pub other_hit: RateBounds,
    /// Floor for the generic-out probability.
    #[serde(default = "Caps::default_out_min")]
    pub out_min: f64,
    /// Ceiling for the sum of the four non-out rates.
    #[serde(default = "Caps::default_sum_cap")]
    pub sum_cap: f64,
}

impl Caps {
    const fn default_strikeout() -> RateBounds {
        RateBounds::new(0.05, 0.50)
    }

    const fn default_walk() -> RateBounds {
        RateBounds::new(0.02, 0.30)
    }

    const fn default_home_run() -> RateBounds {
        RateBounds::new(0.005, 0.10)
    }

    const fn default_other_hit() -> RateBounds {
        RateBounds::new(0.05, 0.40)
    }

    const fn default_out_min() -> f64 {
        0.10
    }

    const fn default_sum_cap() -> f64 {
        0.95
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.strikeout.validate("caps.strikeout")?;
        self.walk.validate("caps.walk")?;
        self.home_run.validate("caps.home_run")?;
        self.other_hit.validate("caps.other_hit")?;
        if !(0.0..1.0).contains(&self.out_min) {
            return Err(ConfigError::RangeViolation {
                field: "caps.out_min",
                min: 0.0,
                max: 1.0,
                value: self.out_min,
            });
        }
        if self.sum_cap <= 0.0 || self.sum_cap > 1.0 {
            return Err(ConfigError::RangeViolation {
                field: "caps.sum_cap",
                min: 0.0,
                max: 1.0,
                value: self.sum_cap,
            });
        }
        Ok(())
    }
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            strikeout: Self::default_strikeout(),
            walk: Self::default_walk(),
            home_run: Self::default_home_run(),
            other_hit: Self::default_other_hit(),
            out_min: Self::default_out_min(),
            sum_cap: Self::default_sum_cap(),
        }
    }
}

/// Velocity bonuses, fatigue penalties and the per-at-bat drain range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaminaConfig {
    pub velocity_power_bonus: f64,
    pub velocity_control_bonus: f64,
    pub medium_threshold: f64,
    pub medium_penalty: f64,
    pub low_threshold: f64,
    pub low_penalty: f64,
    pub drain_min: f64,
    pub drain_max: f64,
}

impl StaminaConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit("stamina.medium_threshold", self.medium_threshold)?;
        check_unit("stamina.low_threshold", self.low_threshold)?;
        if self.low_threshold > self.medium_threshold {
            return Err(ConfigError::MinExceedsMax {
                field: "stamina thresholds",
                min: self.low_threshold,
                max: self.medium_threshold,
            });
        }
        if self.drain_min < 0.0 {
            return Err(ConfigError::RangeViolation {
                field: "stamina.drain_min",
                min: 0.0,
                max: self.drain_max,
                value: self.drain_min,
            });
        }
        if self.drain_min > self.drain_max {
            return Err(ConfigError::MinExceedsMax {
                field: "stamina drain",
                min: self.drain_min,
                max: self.drain_max,
            });
        }
        Ok(())
    }
}

impl Default for StaminaConfig {
    fn default() -> Self {
        Self {
            velocity_power_bonus: 0.5,
            velocity_control_bonus: 0.2,
            medium_threshold: 0.50,
            medium_penalty: 1.5,
            low_threshold: 0.32,
            low_penalty: 2.0,
            drain_min: 2.5,
            drain_max: 4.5,
        }
    }
}

/// Hit-type and extra-base probabilities keyed on runner speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Chance an other-hit lands as a double before any stretch roll.
    pub double_chance: f64,
    pub stretch_fast: f64,
    pub stretch_medium: f64,
    pub runner_extra_fast: f64,
    pub runner_extra_medium: f64,
    /// Speed strictly above this is fast.
    pub fast_above: u8,
    /// Speed strictly above this (and not fast) is medium.
    pub medium_above: u8,
}

impl SpeedConfig {
    /// Stretch chance for a batter who singled.
    #[must_use]
    pub fn stretch_chance(&self, speed: u8) -> f64 {
        self.tiered(speed, self.stretch_fast, self.stretch_medium)
    }

    /// Extra-base chance for a runner already on base.
    #[must_use]
    pub fn extra_base_chance(&self, speed: u8) -> f64 {
        self.tiered(speed, self.runner_extra_fast, self.runner_extra_medium)
    }

    fn tiered(&self, speed: u8, fast: f64, medium: f64) -> f64 {
        if speed > self.fast_above {
            fast
        } else if speed > self.medium_above {
            medium
        } else {
            0.0
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_unit("speed.double_chance", self.double_chance)?;
        check_unit("speed.stretch_fast", self.stretch_fast)?;
        check_unit("speed.stretch_medium", self.stretch_medium)?;
        check_unit("speed.runner_extra_fast", self.runner_extra_fast)?;
        check_unit("speed.runner_extra_medium", self.runner_extra_medium)?;
        if self.medium_above > self.fast_above {
            return Err(ConfigError::SpeedThresholds {
                fast: self.fast_above,
                medium: self.medium_above,
            });
        }
        Ok(())
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            double_chance: 0.25,
            stretch_fast: 0.40,
            stretch_medium: 0.20,
            runner_extra_fast: 0.40,
            runner_extra_medium: 0.20,
            fast_above: 7,
            medium_above: 5,
        }
    }
}

/// Substitution thresholds for the bullpen policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BullpenConfig {
    pub starter_fatigue_fraction: f64,
    pub starter_out_limit: u32,
    pub reliever_fatigue_fraction: f64,
    pub reliever_out_limit: u32,
    /// Closer becomes available from inning `innings - closer_innings_from_end`.
    pub closer_innings_from_end: u32,
    pub closer_score_margin: u32,
}

impl BullpenConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit(
            "bullpen.starter_fatigue_fraction",
            self.starter_fatigue_fraction,
        )?;
        check_unit(
            "bullpen.reliever_fatigue_fraction",
            self.reliever_fatigue_fraction,
        )
    }
}

impl Default for BullpenConfig {
    fn default() -> Self {
        Self {
            starter_fatigue_fraction: 0.35,
            starter_out_limit: 18,
            reliever_fatigue_fraction: 0.30,
            reliever_out_limit: 6,
            closer_innings_from_end: 1,
            closer_score_margin: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_matches_defaults() {
        let embedded = SimConfig::default_config();
        assert_eq!(embedded, &SimConfig::default());
        embedded.validate().expect("embedded config validates");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let cfg: SimConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(cfg, SimConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = SimConfig::from_json(r#"{"innings": 7, "speed": {"stretch_fast": 0.5}}"#)
            .expect("override parses");
        assert_eq!(cfg.innings, 7);
        assert!((cfg.speed.stretch_fast - 0.5).abs() < f64::EPSILON);
        assert!((cfg.speed.stretch_medium - 0.20).abs() < f64::EPSILON);
        assert_eq!(cfg.caps, Caps::default());
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let cfg = SimConfig {
            caps: Caps {
                walk: RateBounds::new(0.4, 0.1),
                ..Caps::default()
            },
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MinExceedsMax { field, .. }) if field == "caps.walk"
        ));
    }

    #[test]
    fn validate_rejects_zero_innings_and_bad_json() {
        assert_eq!(
            SimConfig::from_json(r#"{"innings": 0}"#),
            Err(ConfigError::ZeroInnings)
        );
        assert!(matches!(
            SimConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn speed_tiers_are_exclusive() {
        let speed = SpeedConfig::default();
        assert!((speed.stretch_chance(8) - 0.40).abs() < f64::EPSILON);
        assert!((speed.stretch_chance(7) - 0.20).abs() < f64::EPSILON);
        assert!(speed.stretch_chance(5).abs() < f64::EPSILON);
        assert!((speed.extra_base_chance(10) - 0.40).abs() < f64::EPSILON);
    }
}
