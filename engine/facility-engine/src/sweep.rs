//! Parallel sensitivity sweeps
//!
//! Each variant clones the base configuration, changes one parameter and runs
//! the full projection on its own. Variants share nothing, so they run on the
//! rayon pool and come back in input order.

use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::config::FacilityConfig;
use crate::error::{ConfigValidationError, EngineError, Result};
use crate::money::Money;

/// Parameters a sweep can vary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepParameter {
    MemberCap,
    LoanApr,
    PrimeUtilization,
    LeagueFillRate,
    LeagueMemberShare,
    Courts,
    RentMonthly,
}

impl SweepParameter {
    pub const ALL: [SweepParameter; 7] = [
        SweepParameter::MemberCap,
        SweepParameter::LoanApr,
        SweepParameter::PrimeUtilization,
        SweepParameter::LeagueFillRate,
        SweepParameter::LeagueMemberShare,
        SweepParameter::Courts,
        SweepParameter::RentMonthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SweepParameter::MemberCap => "member-cap",
            SweepParameter::LoanApr => "loan-apr",
            SweepParameter::PrimeUtilization => "prime-utilization",
            SweepParameter::LeagueFillRate => "league-fill-rate",
            SweepParameter::LeagueMemberShare => "league-member-share",
            SweepParameter::Courts => "courts",
            SweepParameter::RentMonthly => "rent-monthly",
        }
    }

    /// Write `value` into a configuration
    pub fn apply(&self, config: &mut FacilityConfig, value: f64) {
        match self {
            SweepParameter::MemberCap => config.membership.member_cap = value.max(0.0).round() as u32,
            SweepParameter::LoanApr => config.financing.apr = value,
            SweepParameter::PrimeUtilization => config.open_play.prime_utilization = value,
            SweepParameter::LeagueFillRate => config.league.fill_rate = value,
            SweepParameter::LeagueMemberShare => config.league.member_share = value,
            SweepParameter::Courts => config.facility.courts = value.max(0.0).round() as u32,
            SweepParameter::RentMonthly => config.costs.rent_monthly = value,
        }
    }
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepParameter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        SweepParameter::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| ConfigValidationError::invalid("sweep parameter", format!("unknown parameter {s}")).into())
    }
}

/// Headline results for one variant
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SweepOutcome {
    pub value: f64,
    pub year1_ebitda: Option<Money>,
    pub final_year_ebitda: Option<Money>,
    pub ending_cash: Option<Money>,
    pub min_dscr: Option<f64>,
    pub revpach: Option<f64>,
    pub rev_per_utilized_hour: Option<f64>,
    pub guardrails_passed: bool,

    /// Set when the variant's configuration was rejected
    pub error: Option<String>,
}

impl SweepOutcome {
    fn failed(value: f64, error: &EngineError) -> Self {
        Self {
            value,
            year1_ebitda: None,
            final_year_ebitda: None,
            ending_cash: None,
            min_dscr: None,
            revpach: None,
            rev_per_utilized_hour: None,
            guardrails_passed: false,
            error: Some(error.to_string()),
        }
    }
}

/// Evaluate one variant
pub fn evaluate(base: &FacilityConfig, parameter: SweepParameter, value: f64) -> SweepOutcome {
    let mut config = base.clone();
    parameter.apply(&mut config, value);
    match crate::compute(&config) {
        Ok(bundle) => {
            let statements = &bundle.statements;
            SweepOutcome {
                value,
                year1_ebitda: statements.year(1).map(|y| y.ebitda),
                final_year_ebitda: statements.years.last().map(|y| y.ebitda),
                ending_cash: statements.months.last().map(|m| m.cash),
                min_dscr: statements.years.iter().filter_map(|y| y.min_dscr).reduce(f64::min),
                revpach: Some(bundle.revpach()),
                rev_per_utilized_hour: Some(bundle.rev_per_utilized_hour()),
                guardrails_passed: bundle.guardrails.passed(),
                error: None,
            }
        }
        Err(e) => SweepOutcome::failed(value, &e),
    }
}

/// Evaluate every value in parallel, preserving input order
pub fn sweep(base: &FacilityConfig, parameter: SweepParameter, values: &[f64]) -> Vec<SweepOutcome> {
    info!("Sweeping {} over {} values", parameter, values.len());
    values.par_iter().map(|value| evaluate(base, parameter, *value)).collect()
}

/// `count` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}
