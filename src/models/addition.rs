//! Additive pay such as overload, bonus and overtime.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The category of an addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdditionKind {
    /// Teaching or work overload.
    Overload,
    /// One-off bonus.
    Bonus,
    /// Approved overtime pay.
    Overtime,
    /// Anything else.
    Other,
}

/// An amount added to one user's gross pay for the period it falls in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addition {
    /// Addition identifier.
    pub id: Uuid,
    /// The user receiving the addition.
    pub user_id: String,
    /// The category.
    pub kind: AdditionKind,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// The amount added.
    pub amount: Decimal,
    /// Civil time the addition applies to.
    pub applied_at: NaiveDateTime,
}
