//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/API orchestration.
//!
//! # Invariants
//! - Repository writes validate input models before SQL mutations.
//! - Repository APIs return semantic errors (`*NotFound`, `Duplicate`) in
//!   addition to DB transport errors.

use crate::db::DbError;
use crate::model::author::AuthorId;
use crate::model::book::BookId;
use crate::model::member::MemberId;
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod author_repo;
pub mod book_repo;
pub mod loan_repo;
pub mod member_repo;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error for catalog (author/book/member) persistence operations.
#[derive(Debug)]
pub enum CatalogError {
    /// Input model failed validation; nothing was written.
    Validation(ValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Referenced or targeted author does not exist.
    AuthorNotFound(AuthorId),
    /// Targeted book does not exist.
    BookNotFound(BookId),
    /// Targeted member does not exist.
    MemberNotFound(MemberId),
    /// A storage-level UNIQUE constraint rejected the write.
    Duplicate {
        entity: &'static str,
        field: &'static str,
    },
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::AuthorNotFound(id) => write!(f, "author not found: {id}"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::Duplicate { entity, field } => {
                write!(f, "a {entity} with this {field} already exists")
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CatalogError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for CatalogError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
