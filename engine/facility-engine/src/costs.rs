//! Operating cost model: escalating fixed costs, variable costs and staffing

use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;
use tracing::debug;

use crate::config::{CostConfig, FacilityConfig};
use crate::money::{cents, decimal, money, Money};
use crate::revenue::{MonthlyRevenue, RevenueBreakdown};

/// Costs for one projected month
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyCosts {
    pub index: u32,
    pub month: String,
    pub rent: Money,
    pub other_fixed: Money,
    pub variable: Money,
    pub staffing: Money,
}

impl MonthlyCosts {
    pub fn fixed(&self) -> Money {
        self.rent + self.other_fixed
    }

    pub fn total(&self) -> Money {
        self.fixed() + self.variable + self.staffing
    }

    /// EBITDA given all revenue booked in the month
    pub fn ebitda(&self, total_revenue: Money) -> Money {
        total_revenue - self.total()
    }
}

/// Operating costs over the projection
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CostBreakdown {
    pub monthly: Vec<MonthlyCosts>,
}

impl CostBreakdown {
    pub fn total(&self) -> Money {
        self.monthly.iter().map(MonthlyCosts::total).sum()
    }
}

/// base × (1 + escalator)^floor(m / 12), in cents
pub fn escalated(base: f64, escalator: f64, month: u32) -> Money {
    cents(money(base) * (Decimal::ONE + decimal(escalator)).powu(u64::from(month / 12)))
}

/// Rent for month `m`, zero during the abatement period
pub fn rent(costs: &CostConfig, month: u32) -> Money {
    if month < costs.rent_abatement_months {
        Decimal::ZERO
    } else {
        escalated(costs.rent_monthly, costs.rent_escalator, month)
    }
}

/// Costs for one month given that month's channel revenue and utilized hours
pub fn month_costs(costs: &CostConfig, revenue: &MonthlyRevenue) -> MonthlyCosts {
    MonthlyCosts {
        index: revenue.index,
        month: revenue.month.clone(),
        rent: rent(costs, revenue.index),
        other_fixed: escalated(costs.other_fixed_monthly, costs.other_fixed_escalator, revenue.index),
        variable: cents(decimal(costs.variable_cost_pct) * revenue.booked.total()),
        staffing: money(costs.staff_cost_per_utilized_hour * revenue.utilized_hours),
    }
}

/// Cost breakdown for every projected month
pub fn compute(config: &FacilityConfig, revenue: &RevenueBreakdown) -> CostBreakdown {
    let monthly: Vec<MonthlyCosts> = revenue.monthly.iter().map(|m| month_costs(&config.costs, m)).collect();
    if let Some(first) = monthly.first() {
        debug!("Month 0 costs: fixed {:.0}, variable {:.0}, staffing {:.0}", first.fixed(), first.variable, first.staffing);
    }
    CostBreakdown { monthly }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fixed_costs_escalate_yearly() {
        let costs = CostConfig::default();
        assert_eq!(rent(&costs, 0), dec!(37000));
        assert_eq!(rent(&costs, 11), dec!(37000));
        assert_eq!(rent(&costs, 12), dec!(38110));
        assert_eq!(escalated(23_000.0, 0.03, 24), dec!(24400.70));
    }

    #[test]
    fn test_rent_abatement() {
        let costs = CostConfig { rent_abatement_months: 3, ..CostConfig::default() };
        assert_eq!(rent(&costs, 0), Decimal::ZERO);
        assert_eq!(rent(&costs, 2), Decimal::ZERO);
        assert_eq!(rent(&costs, 3), dec!(37000));
    }

    #[test]
    fn test_variable_and_staffing_follow_revenue() {
        let config = FacilityConfig::default();
        let alloc = allocate(&config).unwrap();
        let revenue = crate::revenue::compute(&config, &alloc).unwrap();
        let costs = compute(&config, &revenue);

        assert_eq!(costs.monthly.len(), revenue.monthly.len());
        let month = &revenue.monthly[10];
        let cost = &costs.monthly[10];
        assert_eq!(cost.variable, (dec!(0.15) * month.booked.total()).round_dp(2));
        assert_eq!(cost.staffing, money(5.0 * month.utilized_hours));
        assert_eq!(cost.ebitda(dec!(100000)), dec!(100000) - cost.total());
        assert_eq!(cost.total() - cost.fixed() - cost.staffing, cost.variable);
    }
}
