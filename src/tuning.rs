//! Data-driven game balance
//!
//! Defaults match the shipped cabinet; a JSON file can override any subset.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::STARTING_COINS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Claw travel per tick per held direction
    pub claw_speed: f32,
    /// Half-width of the x travel range
    pub limit_x: f32,
    /// Half-depth of the z travel range
    pub limit_z: f32,
    /// Claw height while idle
    pub rest_height: f32,
    /// Claw height at the bottom of a drop
    pub grab_height: f32,
    pub coin_flight_secs: f32,
    pub lowering_secs: f32,
    pub rising_secs: f32,
    /// Balance given to new accounts
    pub starting_coins: u32,
    /// Claw position at session start
    pub initial_claw: [f32; 3],
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            claw_speed: 0.01,
            limit_x: 0.4,
            limit_z: 0.25,
            rest_height: 2.7,
            grab_height: 2.0,
            coin_flight_secs: 1.0,
            lowering_secs: 2.0,
            rising_secs: 3.0,
            starting_coins: STARTING_COINS,
            initial_claw: [-0.4, 2.7, 0.2],
        }
    }
}

impl Tuning {
    /// Parse overrides from JSON and validate the result
    pub fn from_json(json: &str) -> Result<Self, String> {
        let tuning: Self = serde_json::from_str(json).map_err(|e| e.to_string())?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the round driver can't work with
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("claw_speed", self.claw_speed),
            ("limit_x", self.limit_x),
            ("limit_z", self.limit_z),
            ("coin_flight_secs", self.coin_flight_secs),
            ("lowering_secs", self.lowering_secs),
            ("rising_secs", self.rising_secs),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{} must be positive, got {}", name, value));
            }
        }
        if self.grab_height > self.rest_height {
            return Err(format!(
                "grab_height {} is above rest_height {}",
                self.grab_height, self.rest_height
            ));
        }
        Ok(())
    }

    /// Initial claw position, clamped into the travel range
    pub fn initial_claw(&self) -> Vec3 {
        let [x, y, z] = self.initial_claw;
        Vec3::new(
            x.clamp(-self.limit_x, self.limit_x),
            y,
            z.clamp(-self.limit_z, self.limit_z),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{ "limit_z": 0.4, "starting_coins": 25 }"#).unwrap();
        assert_eq!(tuning.limit_z, 0.4);
        assert_eq!(tuning.starting_coins, 25);
        assert_eq!(tuning.limit_x, 0.4);
        assert_eq!(tuning.lowering_secs, 2.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Tuning::from_json(r#"{ "rising_secs": 0 }"#).is_err());
        assert!(Tuning::from_json(r#"{ "claw_speed": -0.01 }"#).is_err());
        assert!(Tuning::from_json(r#"{ "grab_height": 3.0 }"#).is_err());
        assert!(Tuning::from_json("not json").is_err());
    }

    #[test]
    fn test_initial_claw_is_clamped() {
        let tuning = Tuning {
            initial_claw: [-0.4, 2.7, 0.3],
            ..Default::default()
        };
        let pos = tuning.initial_claw();
        assert_eq!(pos.x, -0.4);
        assert_eq!(pos.z, 0.25);
    }
}
