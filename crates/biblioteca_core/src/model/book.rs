//! Book domain model.
//!
//! # Invariants
//! - `available_count` counts units currently loanable; it is only ever
//!   moved by the loan write paths or set directly by catalog CRUD.
//! - The non-negative bound is mirrored by a CHECK constraint in storage.

use crate::model::author::AuthorId;
use crate::model::{require_non_empty, ValidationError};
use serde::{Deserialize, Serialize};

/// Stable identifier for a book row.
pub type BookId = i64;

/// Canonical book record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub author_id: AuthorId,
    pub available_count: u32,
}

/// Input for creating a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub author_id: AuthorId,
    pub available_count: u32,
}

impl NewBook {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("book", "title", &self.title)
    }
}

/// Partial update for a book. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub author_id: Option<AuthorId>,
    pub available_count: Option<u32>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.publication_year.is_none()
            && self.genre.is_none()
            && self.author_id.is_none()
            && self.available_count.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate { entity: "book" });
        }
        if let Some(title) = &self.title {
            require_non_empty("book", "title", title)?;
        }
        Ok(())
    }
}
