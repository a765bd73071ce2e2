//! Domain models for the library catalog and loan lifecycle.
//!
//! # Responsibility
//! - Define canonical records persisted by the repository layer.
//! - Define validated input shapes (`New*` / `*Patch`) for write paths.
//!
//! # Invariants
//! - Every entity is identified by a stable integer id assigned by storage.
//! - Write inputs are validated before any SQL mutation runs.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod author;
pub mod book;
pub mod loan;
pub mod member;

/// Validation error shared by all write-path input models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is missing or blank.
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
    /// Email value does not look like an address.
    InvalidEmail(String),
    /// A partial update carries no fields at all.
    EmptyUpdate { entity: &'static str },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { entity, field } => {
                write!(f, "{entity}.{field} must not be empty")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::EmptyUpdate { entity } => {
                write!(f, "{entity} update requires at least one field")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_non_empty(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { entity, field });
    }
    Ok(())
}
