//! # Comparable Metrics
//!
//! Density metrics (RevPACH and revenue per utilized hour) and a monthly series shaped like the historical actuals, so an
//! external comparator can line projected and recorded months up by label.
//!
//! Channel mapping onto the historical columns:
//! - `dropins`: open-play court rental (prime + off-peak)
//! - `programming`: leagues and tournaments
//! - `ancillary`: corporate events and retail share

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::money::Money;
use crate::projection::{FinancialStatementSeries, MonthlyStatement};

/// Revenue per available court-hour
pub fn revpach(revenue: f64, available_court_hours: f64) -> f64 {
    if available_court_hours > 0.0 {
        revenue / available_court_hours
    } else {
        0.0
    }
}

/// Steady-state RevPACH: annual variable revenue over 52 weeks of court-hours
pub fn annual_revpach(annual_variable_revenue: f64, weekly_court_hours: f64) -> f64 {
    revpach(annual_variable_revenue, weekly_court_hours * 52.0)
}

/// Revenue per court-hour actually played or booked
pub fn rev_per_utilized_hour(revenue: f64, utilized_court_hours: f64) -> f64 {
    if utilized_court_hours > 0.0 {
        revenue / utilized_court_hours
    } else {
        0.0
    }
}

/// Steady-state revenue per utilized hour over 52 weeks of utilized court-hours
pub fn annual_rev_per_utilized_hour(annual_variable_revenue: f64, weekly_utilized_hours: f64) -> f64 {
    rev_per_utilized_hour(annual_variable_revenue, weekly_utilized_hours * 52.0)
}

/// One projected month in historical-actuals shape
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyMetrics {
    pub month: String,
    pub total_revenue: Money,
    pub membership_revenue: Money,
    pub dropins: Money,
    pub programming: Money,
    pub ancillary: Money,
}

impl From<&MonthlyStatement> for MonthlyMetrics {
    fn from(statement: &MonthlyStatement) -> Self {
        let channels = &statement.channels;
        Self {
            month: statement.month.clone(),
            total_revenue: statement.total_revenue,
            membership_revenue: statement.membership_revenue,
            dropins: channels.court(),
            programming: channels.league + channels.tournament,
            ancillary: channels.corporate + channels.retail,
        }
    }
}

/// A recorded month, deserializable from tabular rows with the same headers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalActual {
    pub month: String,
    pub total_revenue: Money,
    pub membership_revenue: Money,
    pub dropins: Money,
    pub programming: Money,
    pub ancillary: Money,
}

/// Projected and recorded figures for the same month
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlignedMonth {
    pub month: String,
    pub projected: MonthlyMetrics,
    pub actual: HistoricalActual,
}

pub fn metrics_series(statements: &FinancialStatementSeries) -> Vec<MonthlyMetrics> {
    statements.months.iter().map(MonthlyMetrics::from).collect()
}

/// Pair projected months with actuals by month label, in projection order
///
/// Months present on only one side are dropped.
pub fn align_with_actuals(projected: &[MonthlyMetrics], actuals: &[HistoricalActual]) -> Vec<AlignedMonth> {
    let by_month: HashMap<&str, &HistoricalActual> = actuals.iter().map(|a| (a.month.as_str(), a)).collect();
    projected
        .iter()
        .filter_map(|p| {
            by_month.get(p.month.as_str()).map(|actual| AlignedMonth {
                month: p.month.clone(),
                projected: p.clone(),
                actual: (*actual).clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn metrics(month: &str, total: Money) -> MonthlyMetrics {
        MonthlyMetrics {
            month: month.to_string(),
            total_revenue: total,
            membership_revenue: Decimal::ZERO,
            dropins: Decimal::ZERO,
            programming: Decimal::ZERO,
            ancillary: Decimal::ZERO,
        }
    }

    fn actual(month: &str, total: Money) -> HistoricalActual {
        HistoricalActual {
            month: month.to_string(),
            total_revenue: total,
            membership_revenue: Decimal::ZERO,
            dropins: Decimal::ZERO,
            programming: Decimal::ZERO,
            ancillary: Decimal::ZERO,
        }
    }

    #[test]
    fn test_revpach() {
        assert_eq!(revpach(3_920.0, 392.0), 10.0);
        assert_eq!(revpach(100.0, 0.0), 0.0);
        assert!((annual_revpach(392.0 * 52.0 * 30.0, 392.0) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_rev_per_utilized_hour() {
        assert_eq!(rev_per_utilized_hour(5_000.0, 200.0), 25.0);
        assert_eq!(rev_per_utilized_hour(5_000.0, 0.0), 0.0);
        // Same revenue over fewer played hours is denser than over available hours
        let annual = 392.0 * 52.0 * 30.0;
        assert!((annual_rev_per_utilized_hour(annual, 196.0) - 60.0).abs() < 1e-12);
        assert!(annual_rev_per_utilized_hour(annual, 196.0) > annual_revpach(annual, 392.0));
    }

    #[test]
    fn test_actuals_deserialize_from_rows() {
        let rows = r#"[
            {"month": "2026-08", "total_revenue": 90000.0, "membership_revenue": 20000.0,
             "dropins": 30000.0, "programming": 25000.0, "ancillary": 15000.0}
        ]"#;
        let actuals: Vec<HistoricalActual> = serde_json::from_str(rows).unwrap();
        assert_eq!(actuals[0].month, "2026-08");
        assert_eq!(actuals[0].dropins, dec!(30000));
        assert_eq!(actuals[0].total_revenue, dec!(90000));
    }

    #[test]
    fn test_align_by_month_label() {
        let projected = vec![metrics("2026-08", dec!(1)), metrics("2026-09", dec!(2)), metrics("2026-10", dec!(3))];
        let actuals = vec![actual("2026-10", dec!(30)), actual("2026-08", dec!(10))];
        let aligned = align_with_actuals(&projected, &actuals);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].month, "2026-08");
        assert_eq!(aligned[0].actual.total_revenue, dec!(10));
        assert_eq!(aligned[1].projected.total_revenue, dec!(3));
    }
}
