//! # FacilityEngine
//!
//! Financial projection engine for an indoor multi-court sports facility.
//!
//! One call to [`compute`] turns an immutable [`FacilityConfig`] into a
//! [`ProjectionBundle`]: the weekly court-hour allocation, revenue by channel,
//! operating costs, a monthly statement series and the guardrail report.
//! Computation is pure and synchronous; identical configurations give identical
//! bundles.

pub mod allocation;
pub mod capital;
pub mod cli;
pub mod config;
pub mod costs;
pub mod debug_view;
pub mod error;
pub mod finance;
pub mod guardrails;
pub mod metrics;
pub mod money;
pub mod projection;
pub mod rates;
pub mod reference;
pub mod revenue;
pub mod schedule;
pub mod seasonality;
pub mod sweep;
pub mod utilization;

#[cfg(test)]
mod tests;

use serde::Serialize;
use tracing::info;

pub use allocation::TimeAllocation;
pub use capital::CapitalStack;
pub use config::FacilityConfig;
pub use costs::CostBreakdown;
pub use debug_view::DebugView;
pub use error::{ConfigValidationError, EngineError, Result};
pub use guardrails::{GuardrailReport, GuardrailStatus};
pub use metrics::{HistoricalActual, MonthlyMetrics};
pub use money::Money;
pub use projection::FinancialStatementSeries;
pub use rates::{Bucket, RateCategory, RateTable};
pub use revenue::RevenueBreakdown;

/// Current version of the FacilityEngine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything one run produces
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectionBundle {
    pub allocation: TimeAllocation,
    pub capital: CapitalStack,
    pub revenue: RevenueBreakdown,
    pub costs: CostBreakdown,
    pub statements: FinancialStatementSeries,
    pub guardrails: GuardrailReport,
}

impl ProjectionBundle {
    /// Monthly series with the historical actuals' field names
    pub fn metrics_series(&self) -> Vec<MonthlyMetrics> {
        metrics::metrics_series(&self.statements)
    }

    /// Steady-state revenue per available court-hour
    pub fn revpach(&self) -> f64 {
        metrics::annual_revpach(self.revenue.annual_total(), self.allocation.total_hours)
    }

    /// Steady-state revenue per court-hour played or booked
    pub fn rev_per_utilized_hour(&self) -> f64 {
        metrics::annual_rev_per_utilized_hour(self.revenue.annual_total(), self.revenue.weekly.utilized_hours)
    }

    pub fn debug_view(&self) -> DebugView<'_> {
        DebugView::new(&self.allocation, &self.revenue)
    }
}

/// Run the full projection for one configuration
pub fn compute(config: &FacilityConfig) -> Result<ProjectionBundle> {
    config.validate()?;
    info!(
        "Projecting {} courts over {} months from {}",
        config.facility.courts, config.membership.months, config.membership.start_date
    );

    let allocation = allocation::allocate(config)?;
    let revenue = revenue::compute(config, &allocation)?;
    let costs = costs::compute(config, &revenue);
    let capital = capital::size(&config.financing);
    let statements = projection::project(config, &capital, &revenue, &costs);
    let guardrails = guardrails::validate(&guardrails::GuardrailInputs {
        config,
        allocation: &allocation,
        revenue: &revenue,
        statements: &statements,
        capital: &capital,
    });

    info!(
        "Projection complete: {} guardrails passed, {} warnings, {} failures",
        guardrails.count(GuardrailStatus::Pass),
        guardrails.count(GuardrailStatus::Warn),
        guardrails.count(GuardrailStatus::Fail)
    );

    Ok(ProjectionBundle { allocation, capital, revenue, costs, statements, guardrails })
}
