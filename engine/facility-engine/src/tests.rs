//! Scenario and property tests for the full projection pipeline

use std::collections::BTreeMap;

use chrono::Weekday;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::allocation::allocate;
use crate::config::{FacilityConfig, PrimeWindow, ScheduleConfig};
use crate::finance::{annuity_payment, member_count};
use crate::guardrails::GuardrailStatus;
use crate::rates::{Bucket, RateCategory, RateTable};
use crate::revenue::{league_weekly_players, monthly_normalized_players};
use crate::{compute, EngineError};

/// Seven equal evening windows giving a 24% prime share on 4 courts × 14 h
fn config_with_prime_share_24() -> FacilityConfig {
    let days = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    let mut config = FacilityConfig::default();
    config.schedule = ScheduleConfig { prime_windows: days.iter().map(|d| PrimeWindow::new(*d, 17.0, 20.36)).collect() };
    config
}

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn test_prime_hours_per_month_at_24_percent_share() {
        let config = config_with_prime_share_24();
        let alloc = allocate(&config).unwrap();
        assert!((alloc.prime_share() - 0.24).abs() < 1e-9);
        // 1 680 court-hours per 30 days × 24%
        let monthly = alloc.prime_hours_for_days(30.0);
        assert!((monthly - 403.0).abs() <= 1.0, "prime hours/month {monthly}");
        assert!(compute(&config).is_ok());
    }

    #[test]
    fn test_league_players_for_sixty_blocks() {
        let weekly = league_weekly_players(60, 4, 4, 0.9);
        assert_eq!(weekly.round(), 864.0);
        let monthly = monthly_normalized_players(weekly, 4.33, 6.0);
        assert!((monthly - 624.0).abs() <= 5.0, "monthly players {monthly}");
    }

    #[test]
    fn test_sixty_blocks_clamped_to_prime_supply() {
        let mut config = FacilityConfig::default();
        config.league.blocks_per_week = Some(60);
        let bundle = compute(&config).unwrap();

        assert_eq!(bundle.allocation.league_blocks, 22);
        assert!(bundle.allocation.league_prime_hours <= bundle.allocation.prime_hours);
        assert_eq!(bundle.guardrails.get("league_capacity").map(|c| c.status), Some(GuardrailStatus::Warn));
        assert!(bundle.guardrails.passed());
    }

    #[test]
    fn test_reference_loan_payment() {
        let payment = annuity_payment(dec!(934925), 0.09, 120);
        assert!((payment - dec!(11843)).abs() <= dec!(5), "payment {payment}");

        let bundle = compute(&FacilityConfig::default()).unwrap();
        assert_eq!(bundle.capital.loan, dec!(934925));
        assert_eq!(bundle.statements.loan_payment, payment);
    }

    #[test]
    fn test_members_above_cap_clamp_every_month() {
        let mut config = FacilityConfig::default();
        config.membership.start_members = 400;
        let bundle = compute(&config).unwrap();

        assert!(bundle.statements.months.iter().all(|m| m.members == 350));
        assert_eq!(bundle.guardrails.get("member_cap").map(|c| c.status), Some(GuardrailStatus::Pass));
    }

    #[test]
    fn test_corporate_plus_league_over_prime_is_an_error() {
        let mut config = FacilityConfig::default();
        config.league.blocks_per_week = Some(22);
        config.corporate.prime_events_per_year = 52.0;
        match compute(&config) {
            Err(EngineError::OverAllocation { bucket, requested, available }) => {
                assert_eq!(bucket, Bucket::Prime);
                assert!(requested > available);
            }
            other => panic!("Expected OverAllocation, got {:?}", other.map(|_| ())),
        }
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[test]
    fn test_compute_is_idempotent() {
        let config = FacilityConfig::default();
        let first = serde_json::to_string(&compute(&config).unwrap()).unwrap();
        let second = serde_json::to_string(&compute(&config).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_run_has_no_failures() {
        let bundle = compute(&FacilityConfig::default()).unwrap();
        let failures: Vec<_> = bundle.guardrails.failures().map(|c| c.name.clone()).collect();
        assert!(failures.is_empty(), "failed guardrails: {failures:?}");
        assert_eq!(bundle.statements.months.len(), 24);
        assert!(bundle.guardrails.checks.len() >= 10);
    }

    #[test]
    fn test_revpach_outside_band_only_warns() {
        let mut config = FacilityConfig::default();
        config.guardrails.revpach_min = 500.0;
        config.guardrails.revpach_max = 600.0;
        let bundle = compute(&config).unwrap();
        let check = bundle.guardrails.get("revpach").unwrap();
        assert_eq!(check.status, GuardrailStatus::Warn);
        assert_eq!(check.threshold, 500.0);
        assert!(bundle.guardrails.passed());
    }

    #[test]
    fn test_unbalanced_capital_fails_sources_uses() {
        let mut config = FacilityConfig::default();
        config.financing.loan_amount = Some(500_000.0);
        let bundle = compute(&config).unwrap();
        assert_eq!(bundle.guardrails.get("sources_uses").map(|c| c.status), Some(GuardrailStatus::Fail));
        // The balance sheet still balances
        assert_eq!(bundle.guardrails.get("balance_sheet").map(|c| c.status), Some(GuardrailStatus::Pass));
    }

    #[test]
    fn test_invalid_fraction_rejected_before_any_work() {
        let mut config = FacilityConfig::default();
        config.open_play.prime_utilization = 1.1;
        assert!(compute(&config).unwrap_err().is_config_error());
    }

    #[test]
    fn test_metrics_series_matches_statements() {
        let bundle = compute(&FacilityConfig::default()).unwrap();
        let series = bundle.metrics_series();
        assert_eq!(series.len(), 24);
        for (metrics, statement) in series.iter().zip(&bundle.statements.months) {
            assert_eq!(metrics.month, statement.month);
            let parts = metrics.membership_revenue + metrics.dropins + metrics.programming + metrics.ancillary;
            assert_eq!(parts, metrics.total_revenue);
        }
    }

    #[test]
    fn test_rev_per_utilized_hour_exceeds_revpach() {
        let bundle = compute(&FacilityConfig::default()).unwrap();
        let per_utilized = bundle.rev_per_utilized_hour();
        assert!(per_utilized.is_finite());
        // Utilized hours are a subset of available hours
        assert!(per_utilized >= bundle.revpach());
    }

    #[test]
    fn test_auto_fitted_league_sells_fewer_seats() {
        let mut config = FacilityConfig::default();
        config.league.courts_used = 8;
        let bundle = compute(&config).unwrap();

        assert_eq!(bundle.allocation.league_courts_used, 6);
        let league = &bundle.revenue.weekly.league;
        // 14 blocks × 6 courts × 4 players
        assert_eq!(league.seats, 336.0);
        assert_eq!(bundle.guardrails.get("league_capacity").map(|c| c.status), Some(GuardrailStatus::Warn));
    }

    #[test]
    fn test_short_horizon() {
        let mut config = FacilityConfig::default();
        config.membership.months = 6;
        let bundle = compute(&config).unwrap();
        assert_eq!(bundle.statements.months.len(), 6);
        assert_eq!(bundle.statements.years.len(), 1);
        assert_eq!(bundle.guardrails.get("league_weeks").map(|c| c.status), Some(GuardrailStatus::Pass));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #[test]
        fn allocation_never_overbooks(
            courts in 4u32..10,
            hours_per_day in 8.0f64..18.0,
            blocks in proptest::option::of(0u32..80),
            prime_events in 0.0f64..40.0,
            offpeak_events in 0.0f64..60.0,
        ) {
            let mut config = FacilityConfig::default();
            config.facility.courts = courts;
            config.facility.hours_per_day = hours_per_day;
            config.league.blocks_per_week = blocks;
            config.corporate.prime_events_per_year = prime_events;
            config.corporate.offpeak_events_per_year = offpeak_events;

            match allocate(&config) {
                Ok(alloc) => {
                    prop_assert!(alloc.league_prime_hours <= alloc.prime_hours + 1e-9);
                    prop_assert!(alloc.open_prime_hours >= 0.0);
                    prop_assert!(alloc.open_offpeak_hours >= 0.0);
                    for bucket in Bucket::ALL {
                        let used = alloc.booked_hours(bucket) + alloc.open_hours(bucket);
                        prop_assert!((used - alloc.bucket_hours(bucket)).abs() < 1e-6);
                    }
                }
                Err(e) => {
                    let over = matches!(e, EngineError::OverAllocation { .. });
                    prop_assert!(over, "unexpected {:?}", e);
                }
            }
        }

        #[test]
        fn members_never_exceed_cap(
            cap in 0u32..500,
            start in 0u32..600,
            target in 1u32..600,
            rate in 0.01f64..2.0,
            month in 0u32..120,
        ) {
            let mut config = FacilityConfig::default();
            config.membership.member_cap = cap;
            config.membership.start_members = start;
            config.membership.target_members = target;
            config.membership.growth_rate = rate;
            prop_assert!(member_count(&config.membership, month) <= cap);
            if month > 0 {
                prop_assert!(member_count(&config.membership, month - 1) <= member_count(&config.membership, month));
            }
        }

        #[test]
        fn balance_sheet_always_balances(
            apr in 0.0f64..0.15,
            owner_equity in 0.0f64..2_000_000.0,
            rent in 10_000.0f64..60_000.0,
            loan in proptest::option::of(0.0f64..1_500_000.0),
            tax_rate in 0.0f64..0.4,
        ) {
            let mut config = FacilityConfig::default();
            config.financing.apr = apr;
            config.financing.owner_equity = owner_equity;
            config.financing.loan_amount = loan;
            config.financing.tax_rate = tax_rate;
            config.costs.rent_monthly = rent;

            let bundle = compute(&config).unwrap();
            prop_assert_eq!(bundle.statements.max_balance_gap(), Decimal::ZERO);
            for m in &bundle.statements.months {
                prop_assert_eq!(m.dscr.is_none(), m.debt_service().is_zero());
            }
        }

        #[test]
        fn revenue_stays_under_ceilings(
            prime_util in 0.0f64..=1.0,
            member_share in 0.0f64..=1.0,
            fill in 0.0f64..=1.0,
            league_share in 0.0f64..=1.0,
        ) {
            let mut config = FacilityConfig::default();
            config.open_play.prime_utilization = prime_util;
            config.open_play.member_share_prime = member_share;
            config.open_play.member_share_offpeak = member_share;
            config.league.fill_rate = fill;
            config.league.member_share = league_share;

            let bundle = compute(&config).unwrap();
            prop_assert!(bundle.revenue.weekly.ceilings.iter().all(|c| c.holds()));
            for month in &bundle.revenue.monthly {
                prop_assert!(month.utilized_hours <= month.available_hours + 1e-6);
            }
        }

        #[test]
        fn blended_rate_moves_monotonically_with_tier_weight(
            tier in 0usize..3,
            w1 in 0.0f64..=1.0,
            w2 in 0.0f64..=1.0,
        ) {
            let config = FacilityConfig::default();
            let rates = RateTable::from_config(&config);
            let (lo, hi) = if w1 <= w2 { (w1, w2) } else { (w2, w1) };

            // Reweight one tier, keep the others in proportion
            let mix_at = |w: f64| -> BTreeMap<String, f64> {
                let base = config.pricing.tiers[tier].mix;
                config
                    .pricing
                    .tiers
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        let share = if i == tier { w } else { (1.0 - w) * t.mix / (1.0 - base) };
                        (t.name.clone(), share)
                    })
                    .collect()
            };
            let blended = |w: f64| rates.blended_member_rate(RateCategory::CourtPerHour, Bucket::Prime, &mix_at(w)).unwrap();

            let tier_rate = rates.rate(RateCategory::CourtPerHour, &config.pricing.tiers[tier].name, Bucket::Prime).unwrap();
            let others = blended(0.0);
            let delta = blended(hi) - blended(lo);

            // Direction follows the tier's rate against the rest
            prop_assert!(delta * (tier_rate - others) >= -1e-9);
            // Continuous: bounded by the weight change times the rate spread
            prop_assert!(delta.abs() <= (hi - lo) * (tier_rate - others).abs() + 1e-9);
        }
    }
}

#[test]
fn test_prime_share_helper_fixture() {
    let config = config_with_prime_share_24();
    assert_eq!(config.schedule.prime_windows.len(), 7);
    assert!(config.validate().is_ok());
}
