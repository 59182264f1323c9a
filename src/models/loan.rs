//! Employee loans repaid through payroll.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// Being amortized.
    Active,
    /// Fully repaid.
    Completed,
    /// Written off; no longer amortized.
    Defaulted,
}

/// A loan amortized by payroll releases.
///
/// `balance` never goes below zero. The loan completes exactly when a
/// payment brings the balance to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Loan identifier.
    pub id: Uuid,
    /// The borrower.
    pub user_id: String,
    /// Principal.
    pub amount: Decimal,
    /// Remaining balance.
    pub balance: Decimal,
    /// Percentage of the principal repaid per month.
    pub monthly_payment_percent: Decimal,
    /// Agreed term.
    pub term_months: u32,
    /// Current status.
    pub status: LoanStatus,
    /// Set when the loan completes.
    #[serde(default)]
    pub archived_at: Option<NaiveDateTime>,
}

impl Loan {
    /// Creates an active loan with the full principal outstanding.
    pub fn new(
        user_id: impl Into<String>,
        amount: Decimal,
        monthly_payment_percent: Decimal,
        term_months: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            amount,
            balance: amount,
            monthly_payment_percent,
            term_months,
            status: LoanStatus::Active,
            archived_at: None,
        }
    }

    /// Whether the loan is still amortized.
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active && self.archived_at.is_none()
    }
}
