//! Weekly-to-monthly scaling
//!
//! Court, corporate and tournament figures scale by calendar weeks in the month.
//! League revenue scales by active league weeks, which must add up to the
//! configured annual total.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::config::FacilityConfig;
use crate::error::{ConfigValidationError, EngineError, Result};

/// Allowed gap between scheduled and configured league weeks per year
pub const LEAGUE_WEEKS_TOLERANCE: f64 = 0.5;

/// Calendar facts for one projected month
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthSlot {
    /// 0-based projection month
    pub index: u32,

    /// "YYYY-MM"
    pub label: String,

    /// 0-based calendar month (0 = January)
    pub calendar_month: usize,

    pub weeks: f64,
    pub league_weeks: f64,

    /// Days in the calendar month
    pub days: u32,
}

impl MonthSlot {
    /// 0-based projection year
    pub fn year_index(&self) -> u32 {
        self.index / 12
    }
}

/// Check that league weeks fit each month and reconcile with the annual target
pub fn reconcile(config: &FacilityConfig) -> Result<()> {
    let seasonality = &config.seasonality;
    for (month, (league, weeks)) in seasonality
        .league_weeks_per_month
        .iter()
        .zip(seasonality.weeks_per_month.iter())
        .enumerate()
    {
        if *league > *weeks + 1e-9 {
            return Err(EngineError::ScalingReconciliation {
                detail: format!("calendar month {} schedules more league weeks than it has", month + 1),
                expected: *weeks,
                actual: *league,
            });
        }
    }

    let scheduled: f64 = seasonality.league_weeks_per_month.iter().sum();
    let expected = config.league.active_weeks_per_year;
    if (scheduled - expected).abs() > LEAGUE_WEEKS_TOLERANCE {
        return Err(EngineError::ScalingReconciliation {
            detail: "league weeks per year".to_string(),
            expected,
            actual: scheduled,
        });
    }
    Ok(())
}

fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}

/// Calendar slots for every projected month
pub fn month_slots(config: &FacilityConfig) -> Result<Vec<MonthSlot>> {
    let start = config.membership.start_date;
    (0..config.membership.months)
        .map(|index| -> Result<MonthSlot> {
            let date = start.checked_add_months(Months::new(index)).ok_or_else(|| {
                ConfigValidationError::invalid("membership.start_date", "projection runs past the supported calendar")
            })?;
            let calendar_month = date.month0() as usize;
            Ok(MonthSlot {
                index,
                label: date.format("%Y-%m").to_string(),
                calendar_month,
                weeks: config.seasonality.weeks_per_month[calendar_month],
                league_weeks: config.seasonality.league_weeks_per_month[calendar_month],
                days: days_in_month(date),
            })
        })
        .collect()
}
