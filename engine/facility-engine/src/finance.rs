//! Loan amortization, depreciation and tax helpers

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::config::{CapexItem, MembershipConfig, TierDefinition};
use crate::money::{cents, decimal, money, Money};

/// Level monthly payment for an annuity loan, in cents
///
/// `PMT = P × r / (1 − (1+r)^−n)` with `r = apr / 12`. Once `(1+r)^n` leaves
/// the decimal range the discount term is zero and the payment is interest
/// only. A zero rate repays the principal in equal parts.
pub fn annuity_payment(principal: Money, apr: f64, term_months: u32) -> Money {
    if principal <= Decimal::ZERO || term_months == 0 {
        return Decimal::ZERO;
    }
    let n = Decimal::from(term_months);
    let r = decimal(apr) / dec!(12);
    if r <= Decimal::ZERO {
        return cents(principal / n);
    }
    let discount = (Decimal::ONE + r).checked_powu(u64::from(term_months)).map_or(Decimal::ZERO, |g| Decimal::ONE / g);
    let denominator = Decimal::ONE - discount;
    if denominator <= Decimal::ZERO {
        return cents(principal / n);
    }
    cents(principal * r / denominator)
}

/// One month of loan activity
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct LoanPayment {
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

impl LoanPayment {
    pub fn debt_service(&self) -> Money {
        self.interest + self.principal
    }
}

/// Monthly amortization schedule for `months` months
///
/// Months after payoff have zero debt service. The final term month retires
/// whatever balance rounding left behind.
pub fn amortize(principal: Money, apr: f64, term_months: u32, months: u32) -> Vec<LoanPayment> {
    let payment = annuity_payment(principal, apr, term_months);
    let rate = decimal(apr) / dec!(12);
    let mut balance = principal.max(Decimal::ZERO);
    (0..months)
        .map(|month| {
            if balance <= Decimal::ZERO || month >= term_months {
                return LoanPayment { interest: Decimal::ZERO, principal: Decimal::ZERO, balance };
            }
            let interest = cents(balance * rate);
            let principal = if month + 1 == term_months {
                balance
            } else {
                (payment - interest).max(Decimal::ZERO).min(balance)
            };
            balance -= principal;
            LoanPayment { interest, principal, balance }
        })
        .collect()
}

/// Depreciation of one item in month `m`; the last month takes the rounding remainder
fn item_depreciation(item: &CapexItem, month: u32) -> Money {
    let life = item.useful_life_months;
    if life == 0 || month >= life {
        return Decimal::ZERO;
    }
    let amount = money(item.amount);
    let per_month = cents(amount / Decimal::from(life));
    if month + 1 == life {
        amount - per_month * Decimal::from(life - 1)
    } else {
        per_month
    }
}

/// Straight-line depreciation across capex items for month `m`
///
/// An item depreciates for exactly its useful life, so book value never goes
/// negative.
pub fn depreciation(items: &[CapexItem], month: u32) -> Money {
    items.iter().map(|item| item_depreciation(item, month)).sum()
}

/// Income tax with a net-operating-loss carryforward
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct TaxLedger {
    pub rate: Decimal,
    pub nol: Money,
}

impl TaxLedger {
    pub fn new(rate: f64, opening_nol: f64) -> Self {
        Self { rate: decimal(rate), nol: money(opening_nol).max(Decimal::ZERO) }
    }

    /// Tax due on this month's pre-tax income; losses grow the carryforward
    pub fn apply(&mut self, pre_tax_income: Money) -> Money {
        if pre_tax_income <= Decimal::ZERO {
            self.nol -= pre_tax_income;
            return Decimal::ZERO;
        }
        let offset = self.nol.min(pre_tax_income);
        self.nol -= offset;
        cents(self.rate * (pre_tax_income - offset))
    }
}

/// Members in month `m` on the logistic ramp, clamped at the cap
pub fn member_count(membership: &MembershipConfig, month: u32) -> u32 {
    let ramp = membership.target_members as f64
        / (1.0 + (-membership.growth_rate * (month as f64 - membership.midpoint_month)).exp());
    let members = ramp.max(membership.start_members as f64).min(membership.member_cap as f64);
    members.round() as u32
}

/// Split members across tiers by mix; rounding remainder goes to the last tier
pub fn members_by_tier(members: u32, tiers: &[TierDefinition]) -> Vec<(String, u32)> {
    let mut remaining = members;
    let mut split = Vec::with_capacity(tiers.len());
    for (i, tier) in tiers.iter().enumerate() {
        let count = if i + 1 == tiers.len() {
            remaining
        } else {
            ((members as f64 * tier.mix).round() as u32).min(remaining)
        };
        remaining -= count;
        split.push((tier.name.clone(), count));
    }
    split
}

/// Monthly dues across tiers
pub fn membership_revenue(members: u32, tiers: &[TierDefinition]) -> Money {
    members_by_tier(members, tiers)
        .iter()
        .zip(tiers)
        .map(|((_, count), tier)| Decimal::from(*count) * money(tier.monthly_fee))
        .sum()
}
