//! Core domain logic for Biblioteca.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::author::{Author, AuthorId, AuthorPatch, NewAuthor};
pub use model::book::{Book, BookId, BookPatch, NewBook};
pub use model::loan::{Loan, LoanId, LoanReceipt, ReturnReceipt};
pub use model::member::{Member, MemberId, MemberPatch, NewMember};
pub use model::ValidationError;
pub use repo::author_repo::{AuthorRepository, SqliteAuthorRepository};
pub use repo::book_repo::{BookDetail, BookRepository, SqliteBookRepository};
pub use repo::loan_repo::{
    BookLoanRecord, LoanDetail, LoanError, LoanRepository, LoanResult, MemberLoanRecord,
    SqliteLoanRepository,
};
pub use repo::member_repo::{MemberRepository, SqliteMemberRepository};
pub use repo::{CatalogError, CatalogResult};
pub use service::loan_service::LoanService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
