//! Guardrail validator
//!
//! A fixed battery of checks run against a finished projection. Each check is
//! independent, reads its inputs only, and reports PASS, FAIL or WARN with the
//! measured value and the threshold it was held to. Findings never abort a run.

use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::allocation::TimeAllocation;
use crate::capital::CapitalStack;
use crate::config::FacilityConfig;
use crate::metrics::annual_revpach;
use crate::money::{decimal, to_f64};
use crate::projection::FinancialStatementSeries;
use crate::rates::{Bucket, RateTable};
use crate::revenue::RevenueBreakdown;

const HOURS_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GuardrailStatus {
    Pass,
    Fail,
    Warn,
}

impl fmt::Display for GuardrailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GuardrailStatus::Pass => "PASS",
            GuardrailStatus::Fail => "FAIL",
            GuardrailStatus::Warn => "WARN",
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GuardrailCheck {
    pub name: String,
    pub status: GuardrailStatus,
    pub measured: f64,
    pub threshold: f64,
    pub detail: String,
}

impl GuardrailCheck {
    fn new(name: &str, status: GuardrailStatus, measured: f64, threshold: f64, detail: impl Into<String>) -> Self {
        Self { name: name.to_string(), status, measured, threshold, detail: detail.into() }
    }

    /// PASS when `holds`, otherwise `failing`
    fn judged(name: &str, holds: bool, failing: GuardrailStatus, measured: f64, threshold: f64, detail: impl Into<String>) -> Self {
        let status = if holds { GuardrailStatus::Pass } else { failing };
        Self::new(name, status, measured, threshold, detail)
    }
}

/// Outcome of the guardrail battery
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GuardrailReport {
    pub checks: Vec<GuardrailCheck>,
}

impl GuardrailReport {
    /// No check failed (warnings allowed)
    pub fn passed(&self) -> bool {
        !self.has_failures()
    }

    pub fn has_failures(&self) -> bool {
        self.count(GuardrailStatus::Fail) > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.count(GuardrailStatus::Warn) > 0
    }

    pub fn count(&self, status: GuardrailStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn get(&self, name: &str) -> Option<&GuardrailCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn failures(&self) -> impl Iterator<Item = &GuardrailCheck> {
        self.checks.iter().filter(|c| c.status == GuardrailStatus::Fail)
    }
}

/// Everything the battery reads
pub struct GuardrailInputs<'a> {
    pub config: &'a FacilityConfig,
    pub allocation: &'a TimeAllocation,
    pub revenue: &'a RevenueBreakdown,
    pub statements: &'a FinancialStatementSeries,
    pub capital: &'a CapitalStack,
}

fn utilized_hours(inputs: &GuardrailInputs) -> GuardrailCheck {
    let worst = inputs
        .revenue
        .monthly
        .iter()
        .max_by(|a, b| (a.utilized_hours - a.available_hours).total_cmp(&(b.utilized_hours - b.available_hours)));
    match worst {
        Some(m) => GuardrailCheck::judged(
            "utilized_hours",
            m.utilized_hours <= m.available_hours + HOURS_EPSILON,
            GuardrailStatus::Fail,
            m.utilized_hours,
            m.available_hours,
            format!("tightest month {}", m.month),
        ),
        None => GuardrailCheck::new("utilized_hours", GuardrailStatus::Pass, 0.0, 0.0, "no months projected"),
    }
}

fn league_within_prime(inputs: &GuardrailInputs) -> GuardrailCheck {
    let alloc = inputs.allocation;
    GuardrailCheck::judged(
        "league_hours",
        alloc.league_prime_hours <= alloc.prime_hours + HOURS_EPSILON,
        GuardrailStatus::Fail,
        alloc.league_prime_hours,
        alloc.prime_hours,
        format!("{} league blocks per week", alloc.league_blocks),
    )
}

fn prime_capacity(inputs: &GuardrailInputs) -> GuardrailCheck {
    let worst = inputs
        .revenue
        .monthly
        .iter()
        .max_by(|a, b| (a.booked_prime_hours - a.prime_hours).total_cmp(&(b.booked_prime_hours - b.prime_hours)));
    match worst {
        Some(m) => GuardrailCheck::judged(
            "prime_capacity",
            m.booked_prime_hours <= m.prime_hours + HOURS_EPSILON,
            GuardrailStatus::Fail,
            m.booked_prime_hours,
            m.prime_hours,
            format!("league + corporate + tournament prime hours, tightest month {}", m.month),
        ),
        None => GuardrailCheck::new("prime_capacity", GuardrailStatus::Pass, 0.0, 0.0, "no months projected"),
    }
}

fn league_weeks(inputs: &GuardrailInputs) -> GuardrailCheck {
    let target = inputs.config.league.active_weeks_per_year;
    let tolerance = inputs.config.guardrails.league_weeks_tolerance;

    let mut years: Vec<f64> = inputs
        .revenue
        .monthly
        .chunks(12)
        .filter(|year| year.len() == 12)
        .map(|year| year.iter().map(|m| m.league_weeks).sum())
        .collect();
    if years.is_empty() {
        years.push(inputs.config.seasonality.league_weeks_per_month.iter().sum());
    }

    let worst = years.iter().copied().max_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs())).unwrap_or(target);
    GuardrailCheck::judged(
        "league_weeks",
        (worst - target).abs() <= tolerance,
        GuardrailStatus::Fail,
        worst,
        target,
        format!("±{tolerance} weeks per projection year"),
    )
}

fn member_cap(inputs: &GuardrailInputs) -> GuardrailCheck {
    let cap = inputs.config.membership.member_cap;
    let peak = inputs.statements.months.iter().map(|m| m.members).max().unwrap_or(0);
    GuardrailCheck::judged(
        "member_cap",
        peak <= cap,
        GuardrailStatus::Fail,
        peak as f64,
        cap as f64,
        "peak members across the projection",
    )
}

fn revpach_band(inputs: &GuardrailInputs) -> GuardrailCheck {
    let g = &inputs.config.guardrails;
    let value = annual_revpach(inputs.revenue.annual_total(), inputs.allocation.total_hours);
    let inside = value >= g.revpach_min && value <= g.revpach_max;
    let threshold = if value < g.revpach_min { g.revpach_min } else { g.revpach_max };
    GuardrailCheck::judged(
        "revpach",
        inside,
        GuardrailStatus::Warn,
        value,
        threshold,
        format!("watchlist band ${:.0}-${:.0}", g.revpach_min, g.revpach_max),
    )
}

fn balance_identity(inputs: &GuardrailInputs) -> GuardrailCheck {
    let tolerance = inputs.config.guardrails.balance_tolerance;
    let gap = inputs.statements.max_balance_gap();
    GuardrailCheck::judged(
        "balance_sheet",
        gap <= decimal(tolerance),
        GuardrailStatus::Fail,
        to_f64(gap),
        tolerance,
        "max |assets − (liabilities + equity)|",
    )
}

fn zero_price_audit(inputs: &GuardrailInputs) -> GuardrailCheck {
    let rates = RateTable::from_config(inputs.config);
    let weekly = &inputs.revenue.weekly;
    let mut leaked = 0.0;
    let mut offenders = Vec::new();
    let zero = rates.zero_priced();
    for (tier, bucket) in &zero {
        let court = match bucket {
            Bucket::Prime => &weekly.court_prime,
            Bucket::OffPeak => &weekly.court_offpeak,
        };
        let revenue = court.tier_revenue.get(tier).copied().unwrap_or(0.0);
        if revenue != 0.0 {
            leaked += revenue.abs();
            offenders.push(format!("{tier}/{bucket}"));
        }
    }
    let detail = if offenders.is_empty() {
        format!("{} zero-priced tier/bucket pairs", zero.len())
    } else {
        format!("non-zero revenue from {}", offenders.join(", "))
    };
    GuardrailCheck::judged("zero_price_audit", offenders.is_empty(), GuardrailStatus::Fail, leaked, 0.0, detail)
}

fn sources_and_uses(inputs: &GuardrailInputs) -> GuardrailCheck {
    let tolerance = inputs.config.guardrails.balance_tolerance;
    let gap = inputs.capital.gap();
    GuardrailCheck::judged(
        "sources_uses",
        gap.abs() <= decimal(tolerance),
        GuardrailStatus::Fail,
        to_f64(gap),
        0.0,
        format!("sources {:.0} vs uses {:.0}", inputs.capital.total_sources(), inputs.capital.total_uses()),
    )
}

fn debt_coverage(inputs: &GuardrailInputs) -> GuardrailCheck {
    let min_dscr = inputs.config.guardrails.min_dscr;
    let year = inputs.statements.year(2).or_else(|| inputs.statements.years.last());
    match year.and_then(|y| y.min_dscr.map(|d| (y.year, d))) {
        Some((year, dscr)) => GuardrailCheck::judged(
            "dscr",
            dscr >= min_dscr,
            GuardrailStatus::Warn,
            dscr,
            min_dscr,
            format!("minimum monthly DSCR in year {year}"),
        ),
        None => GuardrailCheck::new("dscr", GuardrailStatus::Pass, 0.0, min_dscr, "no debt service"),
    }
}

/// Allocation and solver notes surfaced as warnings
fn advisories(inputs: &GuardrailInputs) -> Vec<GuardrailCheck> {
    let mut checks: Vec<GuardrailCheck> = inputs
        .allocation
        .warnings
        .iter()
        .map(|w| {
            GuardrailCheck::new(
                &format!("{}_capacity", w.channel),
                GuardrailStatus::Warn,
                w.requested_hours,
                w.available_hours,
                w.message.clone(),
            )
        })
        .collect();

    if let Some(message) = &inputs.revenue.offpeak_utilization.warning {
        checks.push(GuardrailCheck::new(
            "offpeak_utilization",
            GuardrailStatus::Warn,
            inputs.revenue.offpeak_utilization.overall,
            inputs.config.open_play.target_overall_utilization,
            message.clone(),
        ));
    }
    checks
}

/// Run every guardrail
pub fn validate(inputs: &GuardrailInputs) -> GuardrailReport {
    let mut checks = vec![
        utilized_hours(inputs),
        league_within_prime(inputs),
        prime_capacity(inputs),
        league_weeks(inputs),
        member_cap(inputs),
        revpach_band(inputs),
        balance_identity(inputs),
        zero_price_audit(inputs),
        sources_and_uses(inputs),
        debt_coverage(inputs),
    ];
    checks.extend(advisories(inputs));

    for check in checks.iter().filter(|c| c.status != GuardrailStatus::Pass) {
        warn!(
            "Guardrail {} {}: measured {:.2} vs threshold {:.2} ({})",
            check.name, check.status, check.measured, check.threshold, check.detail
        );
    }

    GuardrailReport { checks }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(checks: Vec<GuardrailCheck>) -> GuardrailReport {
        GuardrailReport { checks }
    }

    #[test]
    fn test_report_aggregation() {
        let r = report(vec![
            GuardrailCheck::new("a", GuardrailStatus::Pass, 1.0, 2.0, ""),
            GuardrailCheck::new("b", GuardrailStatus::Warn, 40.0, 35.0, ""),
        ]);
        assert!(r.passed());
        assert!(r.has_warnings());
        assert_eq!(r.count(GuardrailStatus::Pass), 1);
        assert_eq!(r.get("b").map(|c| c.status), Some(GuardrailStatus::Warn));

        let r = report(vec![GuardrailCheck::new("c", GuardrailStatus::Fail, 3.0, 2.0, "")]);
        assert!(r.has_failures());
        assert!(!r.passed());
        assert_eq!(r.failures().count(), 1);
    }

    #[test]
    fn test_judged_status() {
        let pass = GuardrailCheck::judged("x", true, GuardrailStatus::Warn, 1.0, 1.0, "");
        assert_eq!(pass.status, GuardrailStatus::Pass);
        let warn = GuardrailCheck::judged("x", false, GuardrailStatus::Warn, 1.0, 1.0, "");
        assert_eq!(warn.status, GuardrailStatus::Warn);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&GuardrailStatus::Warn).unwrap(), "\"WARN\"");
        assert_eq!(GuardrailStatus::Fail.to_string(), "FAIL");
    }

    fn recheck(bundle: &crate::ProjectionBundle, config: &FacilityConfig) -> GuardrailReport {
        validate(&GuardrailInputs {
            config,
            allocation: &bundle.allocation,
            revenue: &bundle.revenue,
            statements: &bundle.statements,
            capital: &bundle.capital,
        })
    }

    #[test]
    fn test_default_year_two_coverage_warns() {
        let config = FacilityConfig::default();
        let bundle = crate::compute(&config).unwrap();
        let year2 = bundle.statements.year(2).and_then(|y| y.min_dscr).unwrap();

        let check = bundle.guardrails.get("dscr").unwrap();
        assert_eq!(check.status, GuardrailStatus::Warn);
        assert_eq!(check.measured, year2);
        assert_eq!(check.threshold, 1.25);
        assert!(check.measured < check.threshold);
        assert_eq!(check.detail, "minimum monthly DSCR in year 2");
    }

    #[test]
    fn test_coverage_above_minimum_passes() {
        let config = FacilityConfig::default();
        let mut bundle = crate::compute(&config).unwrap();
        bundle.statements.years[1].min_dscr = Some(1.6);
        let check = recheck(&bundle, &config).get("dscr").cloned().unwrap();
        assert_eq!(check.status, GuardrailStatus::Pass);
        assert_eq!(check.measured, 1.6);
    }

    #[test]
    fn test_no_debt_service_passes_coverage() {
        let mut config = FacilityConfig::default();
        config.financing.owner_equity = 2_000_000.0;
        let bundle = crate::compute(&config).unwrap();
        let check = bundle.guardrails.get("dscr").unwrap();
        assert_eq!(check.status, GuardrailStatus::Pass);
        assert_eq!(check.detail, "no debt service");
        assert_eq!(check.measured, 0.0);
        assert_eq!(check.threshold, 1.25);
    }

    #[test]
    fn test_league_weeks_outside_tolerance_fail() {
        let config = FacilityConfig::default();
        let mut bundle = crate::compute(&config).unwrap();
        assert_eq!(bundle.guardrails.get("league_weeks").map(|c| c.status), Some(GuardrailStatus::Pass));

        for month in &mut bundle.revenue.monthly {
            month.league_weeks = 5.0;
        }
        let report = recheck(&bundle, &config);
        let check = report.get("league_weeks").unwrap();
        assert_eq!(check.status, GuardrailStatus::Fail);
        assert_eq!(check.measured, 60.0);
        assert_eq!(check.threshold, 46.0);
        assert!(report.has_failures());
    }

    #[test]
    fn test_zero_price_audit_reports_leaked_tier() {
        let config = FacilityConfig::default();
        let mut bundle = crate::compute(&config).unwrap();
        assert_eq!(bundle.guardrails.get("zero_price_audit").map(|c| c.status), Some(GuardrailStatus::Pass));

        bundle.revenue.weekly.court_offpeak.tier_revenue.insert("player".to_string(), 12.5);
        let report = recheck(&bundle, &config);
        let check = report.get("zero_price_audit").unwrap();
        assert_eq!(check.status, GuardrailStatus::Fail);
        assert_eq!(check.measured, 12.5);
        assert_eq!(check.threshold, 0.0);
        assert_eq!(check.detail, "non-zero revenue from player/off-peak");
    }
}
