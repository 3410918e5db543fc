//! Sources and uses of funds at opening

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::config::FinancingConfig;
use crate::money::{money, Money};

/// One line of the uses table
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UseOfFunds {
    pub name: String,
    pub amount: Money,
}

/// Opening capital structure
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CapitalStack {
    pub uses: Vec<UseOfFunds>,
    pub capex_total: Money,
    pub working_capital: Money,
    pub owner_equity: Money,
    pub ti_allowance: Money,
    pub loan: Money,

    /// True when the loan was sized to close the gap rather than configured
    pub loan_sized: bool,
}

impl CapitalStack {
    pub fn total_uses(&self) -> Money {
        self.capex_total + self.working_capital
    }

    pub fn total_sources(&self) -> Money {
        self.owner_equity + self.ti_allowance + self.loan
    }

    /// Sources minus uses; zero when the stack balances
    pub fn gap(&self) -> Money {
        self.total_sources() - self.total_uses()
    }

    /// Cash on the balance sheet after capex is spent
    pub fn opening_cash(&self) -> Money {
        self.total_sources() - self.capex_total
    }

    /// Capital that stays in equity (owner contribution plus TI allowance)
    pub fn contributed_capital(&self) -> Money {
        self.owner_equity + self.ti_allowance
    }
}

/// Build the capital stack, sizing the loan when none is configured
pub fn size(financing: &FinancingConfig) -> CapitalStack {
    let mut uses: Vec<UseOfFunds> = financing
        .capex
        .iter()
        .map(|item| UseOfFunds { name: item.name.clone(), amount: money(item.amount) })
        .collect();
    let working_capital = money(financing.working_capital_reserve);
    uses.push(UseOfFunds { name: "working_capital".to_string(), amount: working_capital });

    let capex_total: Money = financing.capex.iter().map(|item| money(item.amount)).sum();
    let owner_equity = money(financing.owner_equity);
    let ti_allowance = money(financing.ti_allowance);
    let needed = capex_total + working_capital - owner_equity - ti_allowance;
    let (loan, loan_sized) = match financing.loan_amount {
        Some(amount) => (money(amount), false),
        None => (needed.max(Decimal::ZERO), true),
    };

    debug!("Capital stack: uses {:.0}, loan {:.0} (sized: {})", capex_total + working_capital, loan, loan_sized);

    CapitalStack { uses, capex_total, working_capital, owner_equity, ti_allowance, loan, loan_sized }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_loan_sized_to_close_gap() {
        let stack = size(&FinancingConfig::default());
        assert!(stack.loan_sized);
        assert_eq!(stack.loan, dec!(934925));
        assert_eq!(stack.gap(), Decimal::ZERO);
        assert_eq!(stack.opening_cash(), dec!(200000));
        assert_eq!(stack.uses.len(), 5);
    }

    #[test]
    fn test_configured_loan_is_kept() {
        let financing = FinancingConfig { loan_amount: Some(800_000.0), ..FinancingConfig::default() };
        let stack = size(&financing);
        assert!(!stack.loan_sized);
        assert_eq!(stack.loan, dec!(800000));
        assert!(stack.gap() < Decimal::ZERO);
    }

    #[test]
    fn test_overfunded_project_needs_no_loan() {
        let financing = FinancingConfig { owner_equity: 2_000_000.0, ..FinancingConfig::default() };
        let stack = size(&financing);
        assert_eq!(stack.loan, Decimal::ZERO);
        assert!(stack.gap() > Decimal::ZERO);
    }
}
