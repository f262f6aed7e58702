//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures of ledger operations (bad input,
/// missing records). Storage concerns belong to the store crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A submitted value failed validation (empty required field, negative or
    /// non-finite number).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A fractional quantity was submitted for a unit counted in whole numbers.
    #[error("quantity {quantity} is not a whole number of {unit}")]
    InvalidUnitQuantity { unit: String, quantity: f64 },

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The operation referenced a record that is not in the ledger.
    #[error("record not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_unit_quantity(unit: impl Into<String>, quantity: f64) -> Self {
        Self::InvalidUnitQuantity {
            unit: unit.into(),
            quantity,
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(id: impl core::fmt::Display) -> Self {
        Self::NotFound(id.to_string())
    }

    /// `true` for [`DomainError::NotFound`].
    ///
    /// Callers deleting a record treat this as "already gone".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
