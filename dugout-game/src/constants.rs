//! Named constants for the Dugout simulation core.
//!
//! Tunable probabilities live in `SimConfig`; the values here describe the
//! fixed shape of the game (rating scale, OVR weights, storage keys).

// Store keys ---------------------------------------------------------------
pub const TEAM_RECORDS_KEY: &str = "dugout.team_records";
pub const CAREER_STATS_KEY: &str = "dugout.player_stats";

// Rating scale -------------------------------------------------------------
pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 10;
/// Midpoint every linear attribute effect is measured against.
pub const RATING_NEUTRAL: f64 = 5.0;

// OVR weights --------------------------------------------------------------
pub(crate) const OVR_BATTER_POWER: f64 = 2.8;
pub(crate) const OVR_BATTER_HIT_RATE: f64 = 2.8;
pub(crate) const OVR_BATTER_CONTACT: f64 = 2.2;
pub(crate) const OVR_BATTER_SPEED: f64 = 1.2;
pub(crate) const OVR_BATTER_SCALE: f64 = 1.0;
pub(crate) const OVR_BATTER_BASE: f64 = 25.0;

pub(crate) const OVR_PITCHER_POWER: f64 = 3.0;
pub(crate) const OVR_PITCHER_VELOCITY: f64 = 3.0;
pub(crate) const OVR_PITCHER_CONTROL: f64 = 2.5;
pub(crate) const OVR_PITCHER_TECHNIQUE: f64 = 1.5;
pub(crate) const OVR_PITCHER_STAMINA: f64 = 0.5;
pub(crate) const OVR_PITCHER_STAMINA_DIVISOR: f64 = 10.0;
pub(crate) const OVR_PITCHER_SCALE: f64 = 1.0;
pub(crate) const OVR_PITCHER_BASE: f64 = 14.0;

pub const OVR_MAX: u8 = 99;

// OVR tier ceilings (inclusive) --------------------------------------------
pub(crate) const OVR_TIER_GRAY: u8 = 73;
pub(crate) const OVR_TIER_BLUE: u8 = 80;
pub(crate) const OVR_TIER_RED: u8 = 87;
pub(crate) const OVR_TIER_GREEN: u8 = 94;

// Game shape ---------------------------------------------------------------
pub const OUTS_PER_HALF: u8 = 3;
pub const BASE_COUNT: usize = 3;
/// Hard ceiling on at-bats in one game so a broken resolver cannot spin forever.
pub const MAX_AT_BATS_PER_GAME: u32 = 2_000;

// History codes ------------------------------------------------------------
pub(crate) const CODE_STRIKEOUT: &str = "K";
pub(crate) const CODE_WALK: &str = "BB";
pub(crate) const CODE_HIT_BY_PITCH: &str = "HBP";
pub(crate) const CODE_SINGLE: &str = "1B";
pub(crate) const CODE_DOUBLE: &str = "2B";
pub(crate) const CODE_TRIPLE: &str = "3B";
pub(crate) const CODE_HOME_RUN: &str = "HR";
pub(crate) const CODE_OUT: &str = "OUT";
pub(crate) const CODE_IN_PLAY_OUT: &str = "IPO";
