//! Loan amortization.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::models::{Loan, LoanStatus};

/// Returns the factor applied to monthly figures for one payroll period.
///
/// Every period is treated as semi-monthly regardless of its length, so the
/// factor is 0.5.
pub fn semi_monthly_factor() -> Decimal {
    Decimal::new(5, 1)
}

/// The installment owed for one period.
///
/// `amount × monthly_payment_percent / 100 × period_factor`, never negative.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{installment, semi_monthly_factor};
/// use payroll_engine::models::Loan;
/// use rust_decimal::Decimal;
///
/// let loan = Loan::new("user_001", Decimal::new(12000, 0), Decimal::new(20, 0), 10);
/// assert_eq!(installment(&loan, semi_monthly_factor()), Decimal::new(1200, 0));
/// ```
pub fn installment(loan: &Loan, period_factor: Decimal) -> Decimal {
    let amount = loan.amount * loan.monthly_payment_percent / Decimal::ONE_HUNDRED * period_factor;
    amount.max(Decimal::ZERO)
}

/// The outcome of applying one installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPayment {
    /// The amount actually taken, never more than the balance.
    pub applied: Decimal,
    /// Balance after the payment.
    pub new_balance: Decimal,
    /// True when the balance reached zero.
    pub completed: bool,
}

/// Computes the effect of an installment on a loan without mutating it.
pub fn apply_payment(loan: &Loan, installment: Decimal) -> LoanPayment {
    let installment = installment.max(Decimal::ZERO);
    let balance = loan.balance.max(Decimal::ZERO);
    let new_balance = (balance - installment).max(Decimal::ZERO);
    LoanPayment {
        applied: balance - new_balance,
        new_balance,
        completed: new_balance.is_zero(),
    }
}

/// Applies an installment to an active loan.
///
/// Completing the loan sets it to `Completed` and archives it at `at`.
/// Returns `None` and leaves the loan untouched when it is not active, so a
/// loan completes exactly once.
pub fn record_payment(loan: &mut Loan, installment: Decimal, at: NaiveDateTime) -> Option<LoanPayment> {
    if !loan.is_active() {
        return None;
    }

    let payment = apply_payment(loan, installment);
    loan.balance = payment.new_balance;
    if payment.completed {
        loan.status = LoanStatus::Completed;
        loan.archived_at = Some(at);
        tracing::info!(loan_id = %loan.id, user_id = %loan.user_id, "Loan fully repaid");
    }
    Some(payment)
}
