//! Finance projector
//!
//! Steps a month-by-month state machine from opening day to the end of the
//! horizon: members and dues, P&L, loan service, tax with loss carryforward,
//! cash and a balance sheet that balances by construction. The series stops at
//! the configured horizon.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::capital::CapitalStack;
use crate::config::FacilityConfig;
use crate::costs::CostBreakdown;
use crate::finance::{amortize, annuity_payment, depreciation, member_count, members_by_tier, membership_revenue, TaxLedger};
use crate::money::{to_f64, Money};
use crate::revenue::{BookedRevenue, RevenueBreakdown};

/// P&L, cash flow and balance sheet for one month
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyStatement {
    pub index: u32,
    pub month: String,

    pub members: u32,
    pub members_by_tier: BTreeMap<String, u32>,

    pub channels: BookedRevenue,
    pub membership_revenue: Money,
    pub total_revenue: Money,

    pub fixed_costs: Money,
    pub variable_costs: Money,
    pub staffing_costs: Money,
    pub ebitda: Money,

    pub depreciation: Money,
    pub interest: Money,
    pub principal: Money,
    pub pre_tax_income: Money,
    pub tax: Money,
    pub net_income: Money,
    pub nol_balance: Money,

    pub cash: Money,
    pub net_ppe: Money,
    pub debt_balance: Money,
    pub contributed_capital: Money,
    pub retained_earnings: Money,

    /// (EBITDA − tax) / debt service; `None` once the loan is retired
    pub dscr: Option<f64>,
}

impl MonthlyStatement {
    pub fn debt_service(&self) -> Money {
        self.interest + self.principal
    }

    pub fn total_assets(&self) -> Money {
        self.cash + self.net_ppe
    }

    pub fn total_liabilities(&self) -> Money {
        self.debt_balance
    }

    pub fn equity(&self) -> Money {
        self.contributed_capital + self.retained_earnings
    }

    /// assets − (liabilities + equity)
    pub fn balance_gap(&self) -> Money {
        self.total_assets() - (self.total_liabilities() + self.equity())
    }
}

/// Roll-up of one projection year
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct YearSummary {
    /// 1-based
    pub year: u32,
    pub months: u32,
    pub revenue: Money,
    pub membership_revenue: Money,
    pub ebitda: Money,
    pub net_income: Money,
    pub debt_service: Money,
    pub min_dscr: Option<f64>,
    pub avg_dscr: Option<f64>,
    pub ending_cash: Money,
    pub ending_members: u32,

    /// First month in the year with EBITDA ≥ 0
    pub break_even_month: Option<String>,
}

/// Full financial projection
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FinancialStatementSeries {
    pub opening_cash: Money,
    pub loan_payment: Money,
    pub months: Vec<MonthlyStatement>,
    pub years: Vec<YearSummary>,
}

impl FinancialStatementSeries {
    pub fn year(&self, year: u32) -> Option<&YearSummary> {
        self.years.iter().find(|y| y.year == year)
    }

    /// First month with EBITDA ≥ 0
    pub fn break_even_month(&self) -> Option<&MonthlyStatement> {
        self.months.iter().find(|m| m.ebitda >= Decimal::ZERO)
    }

    pub fn max_balance_gap(&self) -> Money {
        self.months.iter().map(|m| m.balance_gap().abs()).max().unwrap_or(Decimal::ZERO)
    }
}

fn summarize(year: u32, months: &[MonthlyStatement]) -> YearSummary {
    let dscrs: Vec<f64> = months.iter().filter_map(|m| m.dscr).collect();
    let min_dscr = dscrs.iter().copied().reduce(f64::min);
    let avg_dscr = if dscrs.is_empty() { None } else { Some(dscrs.iter().sum::<f64>() / dscrs.len() as f64) };
    let last = months.last();

    YearSummary {
        year,
        months: months.len() as u32,
        revenue: months.iter().map(|m| m.total_revenue).sum(),
        membership_revenue: months.iter().map(|m| m.membership_revenue).sum(),
        ebitda: months.iter().map(|m| m.ebitda).sum(),
        net_income: months.iter().map(|m| m.net_income).sum(),
        debt_service: months.iter().map(|m| m.debt_service()).sum(),
        min_dscr,
        avg_dscr,
        ending_cash: last.map(|m| m.cash).unwrap_or_default(),
        ending_members: last.map(|m| m.members).unwrap_or_default(),
        break_even_month: months.iter().find(|m| m.ebitda >= Decimal::ZERO).map(|m| m.month.clone()),
    }
}

/// Run the monthly projection
pub fn project(
    config: &FacilityConfig,
    capital: &CapitalStack,
    revenue: &RevenueBreakdown,
    costs: &CostBreakdown,
) -> FinancialStatementSeries {
    let financing = &config.financing;
    let horizon = revenue.monthly.len() as u32;
    let loan = amortize(capital.loan, financing.apr, financing.term_months, horizon);
    let loan_payment = annuity_payment(capital.loan, financing.apr, financing.term_months);
    let mut tax = TaxLedger::new(financing.tax_rate, financing.nol_carryforward_start);

    let opening_cash = capital.opening_cash();
    let mut cash = opening_cash;
    let mut net_ppe = capital.capex_total;
    let mut retained_earnings = Decimal::ZERO;

    let mut months = Vec::with_capacity(revenue.monthly.len());
    for ((rev, cost), payment) in revenue.monthly.iter().zip(&costs.monthly).zip(&loan) {
        let members = member_count(&config.membership, rev.index);
        let by_tier = members_by_tier(members, &config.pricing.tiers);
        let membership_revenue = membership_revenue(members, &config.pricing.tiers);

        let total_revenue = rev.booked.total() + membership_revenue;
        let ebitda = cost.ebitda(total_revenue);
        let dep = depreciation(&financing.capex, rev.index);
        let pre_tax_income = ebitda - payment.interest - dep;
        let tax_due = tax.apply(pre_tax_income);
        let net_income = pre_tax_income - tax_due;

        cash += net_income + dep - payment.principal;
        net_ppe -= dep;
        retained_earnings += net_income;

        let debt_service = payment.debt_service();
        let dscr = if debt_service > Decimal::ZERO { Some(to_f64((ebitda - tax_due) / debt_service)) } else { None };

        months.push(MonthlyStatement {
            index: rev.index,
            month: rev.month.clone(),
            members,
            members_by_tier: by_tier.into_iter().collect(),
            channels: rev.booked,
            membership_revenue,
            total_revenue,
            fixed_costs: cost.fixed(),
            variable_costs: cost.variable,
            staffing_costs: cost.staffing,
            ebitda,
            depreciation: dep,
            interest: payment.interest,
            principal: payment.principal,
            pre_tax_income,
            tax: tax_due,
            net_income,
            nol_balance: tax.nol,
            cash,
            net_ppe,
            debt_balance: payment.balance,
            contributed_capital: capital.contributed_capital(),
            retained_earnings,
            dscr,
        });
    }

    let years: Vec<YearSummary> =
        months.chunks(12).enumerate().map(|(i, chunk)| summarize(i as u32 + 1, chunk)).collect();

    for year in &years {
        debug!(
            "Year {}: revenue {:.0}, EBITDA {:.0}, net income {:.0}, ending cash {:.0}",
            year.year, year.revenue, year.ebitda, year.net_income, year.ending_cash
        );
    }
    if let Some(last) = months.last() {
        info!("Projected {} months, ending cash {:.0}, {} members", months.len(), last.cash, last.members);
    }

    FinancialStatementSeries { opening_cash, loan_payment, months, years }
}
