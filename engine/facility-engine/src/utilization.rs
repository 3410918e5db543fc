//! Open-play utilization: off-peak solver and opening ramp

use serde::Serialize;
use tracing::warn;

use crate::config::{FacilityConfig, OpenPlayConfig, RampConfig};

/// Off-peak utilization plus any note about clamping
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SolvedUtilization {
    pub offpeak: f64,

    /// Blended open-play utilization the chosen off-peak level gives
    pub overall: f64,
    pub warning: Option<String>,
}

impl SolvedUtilization {
    fn new(offpeak: f64, prime_utilization: f64, prime_share: f64, warning: Option<String>) -> Self {
        Self { offpeak, overall: overall_utilization(prime_utilization, offpeak, prime_share), warning }
    }
}

/// Solve `overall = s·u_prime + (1 − s)·u_off` for `u_off`, clamped to bounds
pub fn solve_offpeak_utilization(
    overall_target: f64,
    prime_utilization: f64,
    prime_share: f64,
    min: f64,
    max: f64,
) -> SolvedUtilization {
    if prime_share >= 1.0 {
        let message = "Prime share is 100%, no off-peak hours to utilize".to_string();
        return SolvedUtilization::new(0.0, prime_utilization, prime_share, Some(message));
    }

    let raw = (overall_target - prime_share * prime_utilization) / (1.0 - prime_share);
    if raw < min {
        let message = format!("Solved off-peak utilization {:.1}% below minimum {:.0}%, clamping", raw * 100.0, min * 100.0);
        warn!("{}", message);
        SolvedUtilization::new(min, prime_utilization, prime_share, Some(message))
    } else if raw > max {
        let message = format!("Solved off-peak utilization {:.1}% above maximum {:.0}%, clamping", raw * 100.0, max * 100.0);
        warn!("{}", message);
        SolvedUtilization::new(max, prime_utilization, prime_share, Some(message))
    } else {
        SolvedUtilization::new(raw, prime_utilization, prime_share, None)
    }
}

/// Blend prime and off-peak utilization by prime share
pub fn overall_utilization(prime_utilization: f64, offpeak_utilization: f64, prime_share: f64) -> f64 {
    prime_share * prime_utilization + (1.0 - prime_share) * offpeak_utilization
}

/// Steady-state off-peak utilization: configured value or the solver's answer
pub fn resolve_offpeak(open_play: &OpenPlayConfig, prime_share: f64) -> SolvedUtilization {
    match open_play.offpeak_utilization {
        Some(fixed) => SolvedUtilization::new(fixed, open_play.prime_utilization, prime_share, None),
        None => solve_offpeak_utilization(
            open_play.target_overall_utilization,
            open_play.prime_utilization,
            prime_share,
            open_play.offpeak_min,
            open_play.offpeak_max,
        ),
    }
}

/// Operating levels for one month of the opening ramp
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct RampLevels {
    /// 0..=1 progress toward steady state
    pub factor: f64,
    pub league_fill_rate: f64,
    pub prime_utilization: f64,
    pub offpeak_utilization: f64,
}

impl RampLevels {
    /// Levels once the ramp is complete
    pub fn steady(config: &FacilityConfig, offpeak_utilization: f64) -> Self {
        Self {
            factor: 1.0,
            league_fill_rate: config.league.fill_rate,
            prime_utilization: config.open_play.prime_utilization,
            offpeak_utilization,
        }
    }

    /// Levels for month index `month` (0-based)
    pub fn for_month(config: &FacilityConfig, offpeak_utilization: f64, month: u32) -> Self {
        let steady = Self::steady(config, offpeak_utilization);
        steady.ramped(&config.ramp, month)
    }

    fn ramped(self, ramp: &RampConfig, month: u32) -> Self {
        if month + 1 >= ramp.months {
            return self;
        }
        let factor = (month + 1) as f64 / ramp.months as f64;
        let floor = ramp.fill_rate_floor.min(self.league_fill_rate);
        Self {
            factor,
            league_fill_rate: floor + (self.league_fill_rate - floor) * factor,
            prime_utilization: self.prime_utilization
                * (ramp.prime_utilization_start + (1.0 - ramp.prime_utilization_start) * factor),
            offpeak_utilization: self.offpeak_utilization
                * (ramp.offpeak_utilization_start + (1.0 - ramp.offpeak_utilization_start) * factor),
        }
    }
}
