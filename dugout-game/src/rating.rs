//! Attribute blocks and the derived overall rating (OVR).
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    OVR_BATTER_BASE, OVR_BATTER_CONTACT, OVR_BATTER_HIT_RATE, OVR_BATTER_POWER, OVR_BATTER_SCALE,
    OVR_BATTER_SPEED, OVR_MAX, OVR_PITCHER_BASE, OVR_PITCHER_CONTROL, OVR_PITCHER_POWER,
    OVR_PITCHER_SCALE, OVR_PITCHER_STAMINA, OVR_PITCHER_STAMINA_DIVISOR, OVR_PITCHER_TECHNIQUE,
    OVR_PITCHER_VELOCITY, OVR_TIER_BLUE, OVR_TIER_GRAY, OVR_TIER_GREEN, OVR_TIER_RED, RATING_MAX,
    RATING_MIN,
};
use crate::numbers::round_f64_to_u8;

/// Batting attributes on the 1-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatterAttributes {
    pub power: u8,
    pub hit_rate: u8,
    pub contact: u8,
    pub speed: u8,
}

impl BatterAttributes {
    #[must_use]
    pub const fn new(power: u8, hit_rate: u8, contact: u8, speed: u8) -> Self {
        Self {
            power,
            hit_rate,
            contact,
            speed,
        }
    }

    /// Overall rating derived from the weighted attributes.
    #[must_use]
    pub fn ovr(&self) -> u8 {
        let weighted = OVR_BATTER_POWER * f64::from(self.power)
            + OVR_BATTER_HIT_RATE * f64::from(self.hit_rate)
            + OVR_BATTER_CONTACT * f64::from(self.contact)
            + OVR_BATTER_SPEED * f64::from(self.speed);
        round_f64_to_u8(OVR_BATTER_BASE + OVR_BATTER_SCALE * weighted, OVR_MAX)
    }

    /// Name of the first attribute outside the rating scale, if any.
    #[must_use]
    pub fn out_of_range(&self) -> Option<&'static str> {
        [
            ("power", self.power),
            ("hit_rate", self.hit_rate),
            ("contact", self.contact),
            ("speed", self.speed),
        ]
        .into_iter()
        .find(|(_, value)| !(RATING_MIN..=RATING_MAX).contains(value))
        .map(|(name, _)| name)
    }
}

impl Default for BatterAttributes {
    fn default() -> Self {
        Self::new(5, 5, 5, 5)
    }
}

/// Pitching attributes on the 1-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitcherAttributes {
    pub power: u8,
    pub velocity: u8,
    pub control: u8,
    pub technique: u8,
}

impl PitcherAttributes {
    #[must_use]
    pub const fn new(power: u8, velocity: u8, control: u8, technique: u8) -> Self {
        Self {
            power,
            velocity,
            control,
            technique,
        }
    }

    /// Overall rating; stamina contributes a small share scaled per ten units.
    #[must_use]
    pub fn ovr(&self, max_stamina: u32) -> u8 {
        let weighted = OVR_PITCHER_POWER * f64::from(self.power)
            + OVR_PITCHER_VELOCITY * f64::from(self.velocity)
            + OVR_PITCHER_CONTROL * f64::from(self.control)
            + OVR_PITCHER_TECHNIQUE * f64::from(self.technique)
            + OVR_PITCHER_STAMINA * (f64::from(max_stamina) / OVR_PITCHER_STAMINA_DIVISOR);
        round_f64_to_u8(OVR_PITCHER_BASE + OVR_PITCHER_SCALE * weighted, OVR_MAX)
    }

    #[must_use]
    pub fn out_of_range(&self) -> Option<&'static str> {
        [
            ("power", self.power),
            ("velocity", self.velocity),
            ("control", self.control),
            ("technique", self.technique),
        ]
        .into_iter()
        .find(|(_, value)| !(RATING_MIN..=RATING_MAX).contains(value))
        .map(|(name, _)| name)
    }
}

impl Default for PitcherAttributes {
    fn default() -> Self {
        Self::new(5, 5, 5, 5)
    }
}

/// Color tier used when presenting an OVR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OvrTier {
    Gray,
    Blue,
    Red,
    Green,
    Golden,
}

impl OvrTier {
    #[must_use]
    pub const fn from_ovr(ovr: u8) -> Self {
        if ovr <= OVR_TIER_GRAY {
            Self::Gray
        } else if ovr <= OVR_TIER_BLUE {
            Self::Blue
        } else if ovr <= OVR_TIER_RED {
            Self::Red
        } else if ovr <= OVR_TIER_GREEN {
            Self::Green
        } else {
            Self::Golden
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Green => "green",
            Self::Golden => "golden",
        }
    }
}

impl fmt::Display for OvrTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batter_ovr_matches_weighted_sum() {
        // 25 + 2.8*7 + 2.8*6 + 2.2*5 + 1.2*8 = 82.0
        assert_eq!(BatterAttributes::new(7, 6, 5, 8).ovr(), 82);
        // 25 + 14 + 14 + 11 + 6 = 70
        assert_eq!(BatterAttributes::default().ovr(), 70);
    }

    #[test]
    fn ovr_is_capped_at_ninety_nine() {
        assert_eq!(BatterAttributes::new(10, 9, 7, 6).ovr(), 99);
        assert_eq!(PitcherAttributes::new(10, 10, 10, 10).ovr(100), 99);
    }

    #[test]
    fn pitcher_ovr_counts_stamina() {
        // 14 + 15 + 15 + 12.5 + 7.5 + 0.5*5 = 66.5 -> 67 (round half away from zero)
        assert_eq!(PitcherAttributes::default().ovr(50), 67);
        assert!(PitcherAttributes::default().ovr(100) > PitcherAttributes::default().ovr(50));
    }

    #[test]
    fn tiers_follow_inclusive_ceilings() {
        assert_eq!(OvrTier::from_ovr(73), OvrTier::Gray);
        assert_eq!(OvrTier::from_ovr(74), OvrTier::Blue);
        assert_eq!(OvrTier::from_ovr(87), OvrTier::Red);
        assert_eq!(OvrTier::from_ovr(94), OvrTier::Green);
        assert_eq!(OvrTier::from_ovr(95), OvrTier::Golden);
        assert_eq!(OvrTier::Golden.to_string(), "golden");
    }

    #[test]
    fn out_of_range_names_offending_attribute() {
        assert_eq!(BatterAttributes::new(5, 0, 5, 5).out_of_range(), Some("hit_rate"));
        assert_eq!(PitcherAttributes::new(5, 5, 11, 5).out_of_range(), Some("control"));
        assert_eq!(BatterAttributes::default().out_of_range(), None);
    }
}
