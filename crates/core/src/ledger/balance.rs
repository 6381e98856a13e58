//! Current-account and cash balance calculations.
//!
//! Balances are always derived from the movement streams; nothing stores a
//! running total.

use arqon_shared::types::money::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::{AccountDirection, CashDirection, CashMovement, CurrentAccountMovement};

impl CurrentAccountMovement {
    /// Signed effect on the customer's balance: debit `+`, credit `-`.
    #[must_use]
    pub fn balance_change(&self) -> Decimal {
        match self.direction {
            AccountDirection::Debit => self.amount,
            AccountDirection::Credit => -self.amount,
        }
    }
}

/// What a customer owes: `round2(Σ debit - Σ credit)`. Empty input gives 0.00.
///
/// Positive means the customer owes money.
///
/// # Errors
///
/// Returns `BalanceOverflow` if the totals exceed the decimal range.
pub fn balance(movements: &[CurrentAccountMovement]) -> Result<Decimal, LedgerError> {
    Ok(AccountBalance::from_movements(movements)?.balance)
}

fn add(total: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    total.checked_add(amount).ok_or(LedgerError::BalanceOverflow)
}

/// Debit and credit totals of a current account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// `debit_total - credit_total`, 2 dp.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Totals a set of movements. Order does not matter.
    ///
    /// # Errors
    ///
    /// Returns `BalanceOverflow` if a total exceeds the decimal range.
    pub fn from_movements(movements: &[CurrentAccountMovement]) -> Result<Self, LedgerError> {
        let mut debit = Decimal::ZERO;
        let mut credit = Decimal::ZERO;
        for movement in movements {
            match movement.direction {
                AccountDirection::Debit => debit = add(debit, movement.amount)?,
                AccountDirection::Credit => credit = add(credit, movement.amount)?,
            }
        }
        let debit_total = round_money(debit);
        let credit_total = round_money(credit);
        let balance = debit_total
            .checked_sub(credit_total)
            .ok_or(LedgerError::BalanceOverflow)?;
        Ok(Self {
            debit_total,
            credit_total,
            balance: round_money(balance),
        })
    }
}

/// A movement together with the balance right after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// The movement.
    #[serde(flatten)]
    pub movement: CurrentAccountMovement,
    /// Balance before this movement.
    pub previous_balance: Decimal,
    /// Balance after this movement.
    pub current_balance: Decimal,
}

/// Orders movements by `(created_at, id)` ascending and accumulates the
/// balance. Input order is irrelevant.
///
/// # Errors
///
/// Returns `BalanceOverflow` if the running balance leaves the decimal range.
pub fn running_balance(
    movements: &[CurrentAccountMovement],
) -> Result<Vec<StatementLine>, LedgerError> {
    let mut sorted: Vec<&CurrentAccountMovement> = movements.iter().collect();
    sorted.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

    let mut current = Decimal::ZERO;
    sorted
        .into_iter()
        .map(|movement| {
            let previous_balance = current;
            current = round_money(add(current, movement.balance_change())?);
            Ok(StatementLine {
                movement: movement.clone(),
                previous_balance,
                current_balance: current,
            })
        })
        .collect()
}

/// Income and expense totals of a set of cash movements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashSummary {
    /// Total income.
    pub income: Decimal,
    /// Total expense.
    pub expense: Decimal,
    /// `income - expense`, 2 dp.
    pub balance: Decimal,
}

impl CashSummary {
    /// Totals a set of cash movements.
    ///
    /// # Errors
    ///
    /// Returns `BalanceOverflow` if a total exceeds the decimal range.
    pub fn from_movements(movements: &[CashMovement]) -> Result<Self, LedgerError> {
        let (income, expense) = movements.iter().try_fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, expense), m| match m.direction {
                CashDirection::Income => Ok::<_, LedgerError>((add(income, m.amount)?, expense)),
                CashDirection::Expense => Ok((income, add(expense, m.amount)?)),
            },
        )?;
        let balance = income
            .checked_sub(expense)
            .ok_or(LedgerError::BalanceOverflow)?;
        Ok(Self {
            income: round_money(income),
            expense: round_money(expense),
            balance: round_money(balance),
        })
    }
}
