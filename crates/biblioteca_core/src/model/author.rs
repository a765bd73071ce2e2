//! Author domain model.

use crate::model::{require_non_empty, ValidationError};
use serde::{Deserialize, Serialize};

/// Stable identifier for an author row.
pub type AuthorId = i64;

/// Canonical author record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub nationality: Option<String>,
}

/// Input for creating an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    pub nationality: Option<String>,
}

impl NewAuthor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("author", "name", &self.name)
    }
}

/// Partial update for an author. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorPatch {
    pub name: Option<String>,
    pub nationality: Option<String>,
}

impl AuthorPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_none() && self.nationality.is_none() {
            return Err(ValidationError::EmptyUpdate { entity: "author" });
        }
        if let Some(name) = &self.name {
            require_non_empty("author", "name", name)?;
        }
        Ok(())
    }
}
