//! Personnel and the salary basis their type carries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A personnel classification with a monthly basic salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelType {
    /// Type identifier.
    pub id: Uuid,
    /// Display name, e.g. "Instructor I".
    pub name: String,
    /// Monthly basic salary.
    pub basic_salary: Decimal,
    /// Inactive types are excluded from payroll.
    pub is_active: bool,
}

/// A user on the payroll.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{Personnel, PersonnelType};
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let personnel = Personnel {
///     user_id: "user_001".to_string(),
///     name: "Maria Santos".to_string(),
///     is_active: true,
///     personnel_type: PersonnelType {
///         id: Uuid::new_v4(),
///         name: "Registrar Staff".to_string(),
///         basic_salary: Decimal::new(30000, 0),
///         is_active: true,
///     },
/// };
/// assert!(personnel.is_on_payroll());
/// assert_eq!(personnel.monthly_basic(), Decimal::new(30000, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personnel {
    /// The user identifier.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Deactivated users are excluded from payroll and the absence sweep.
    pub is_active: bool,
    /// The user's classification.
    pub personnel_type: PersonnelType,
}

impl Personnel {
    /// Active user with an active personnel type.
    pub fn is_on_payroll(&self) -> bool {
        self.is_active && self.personnel_type.is_active
    }

    /// The monthly salary basis.
    pub fn monthly_basic(&self) -> Decimal {
        self.personnel_type.basic_salary
    }
}
