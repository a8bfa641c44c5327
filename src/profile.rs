//! Fan control profiles
//!
//! A [`Profile`] is the per-fan policy derived from configured
//! [`ProfileSettings`]. It either pins the fan to a fixed speed or maps the
//! primary temperature linearly onto the fan's own `[min, max]` range.

use crate::config::ProfileSettings;
use crate::errors::{FanProfileError, Result};
use serde::{Deserialize, Serialize};

/// Control policy attached to a single fan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    manual: bool,
    speed: i64,
    k: f64,
    c: f64,
}

impl Profile {
    /// Build the profile for a fan whose output range is `[min, max]`.
    ///
    /// Linear coefficients are only derived (and the temperature bounds only
    /// validated) when the settings ask for temperature-driven control.
    pub fn derive(settings: &ProfileSettings, min: i64, max: i64) -> Result<Self> {
        let mut profile = Self::fixed(settings.manual, settings.speed);

        if profile.follows_temperature() {
            let (high, low) = (settings.high_temp, settings.low_temp);
            if high < 0 || low < 0 || high <= low {
                return Err(FanProfileError::InvalidProfileBounds {
                    high_temp: high,
                    low_temp: low,
                });
            }
            let k = (max as f64 - min as f64) / (high as f64 - low as f64);
            profile.k = k;
            profile.c = min as f64 - k * low as f64;
        }

        Ok(profile)
    }

    /// A profile without linear coefficients
    pub fn fixed(manual: bool, speed: i64) -> Self {
        Self {
            manual,
            speed,
            k: 0.0,
            c: 0.0,
        }
    }

    pub fn manual(&self) -> bool {
        self.manual
    }

    pub fn speed(&self) -> i64 {
        self.speed
    }

    /// Linear coefficients `(k, c)` of `target = k * temperature + c`
    pub fn coefficients(&self) -> (f64, f64) {
        (self.k, self.c)
    }

    /// Value the fan's manual register should hold under this profile
    pub fn manual_flag(&self) -> i64 {
        i64::from(self.manual)
    }

    /// Whether the target depends on the primary temperature
    pub fn follows_temperature(&self) -> bool {
        self.manual && self.speed == 0
    }

    /// Compute the output target for a fan with range `[min, max]`.
    ///
    /// Returns `None` when the profile leaves the fan under automatic control.
    pub fn target(&self, temperature: i64, min: i64, max: i64) -> Option<i64> {
        if !self.manual {
            return None;
        }

        let target = if self.speed == 0 {
            (self.k * temperature as f64 + self.c).ceil() as i64
        } else if self.speed < 0 {
            max
        } else {
            self.speed
        };

        Some(clamp_output(target, min, max))
    }
}

/// Clamp `value` into `[min, max]`, applying the upper bound first
pub fn clamp_output(value: i64, min: i64, max: i64) -> i64 {
    value.min(max).max(min)
}
