//! Standing deduction types and their per-user instances.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a deduction type computes its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationType {
    /// A fixed amount per period.
    Fixed,
    /// A percentage of the period's salary basis.
    Percentage,
}

/// A configured kind of deduction.
///
/// Mandatory types apply to every active user in every period. Other types
/// only apply through explicit [`Deduction`] instances.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{CalculationType, DeductionType};
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let sss = DeductionType {
///     id: Uuid::new_v4(),
///     name: "SSS".to_string(),
///     calculation_type: CalculationType::Percentage,
///     amount: None,
///     percentage_value: Some(Decimal::new(45, 1)),
///     is_mandatory: true,
///     is_active: true,
/// };
/// assert!(sss.applies_every_period());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionType {
    /// Type identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Fixed or percentage.
    pub calculation_type: CalculationType,
    /// Amount for fixed types.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Percentage of the salary basis for percentage types.
    #[serde(default)]
    pub percentage_value: Option<Decimal>,
    /// Evergreen deduction applied to everyone.
    pub is_mandatory: bool,
    /// Inactive types are ignored.
    pub is_active: bool,
}

impl DeductionType {
    /// True for active mandatory types.
    pub fn applies_every_period(&self) -> bool {
        self.is_mandatory && self.is_active
    }
}

/// A deduction applied to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    /// Instance identifier.
    pub id: Uuid,
    /// The user being deducted.
    pub user_id: String,
    /// The type this instance belongs to.
    pub deduction_type_id: Uuid,
    /// Amount recorded when the instance was applied.
    pub amount: Decimal,
    /// Civil time the instance was applied.
    pub applied_at: NaiveDateTime,
    /// Set when a release consumed the instance.
    #[serde(default)]
    pub archived_at: Option<NaiveDateTime>,
}

impl Deduction {
    /// Creates an unarchived instance.
    pub fn new(
        user_id: impl Into<String>,
        deduction_type_id: Uuid,
        amount: Decimal,
        applied_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            deduction_type_id,
            amount,
            applied_at,
            archived_at: None,
        }
    }

    /// Whether a release has consumed this instance.
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}
