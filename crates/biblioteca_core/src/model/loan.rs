//! Loan domain model.
//!
//! # Invariants
//! - A loan with `return_date = None` is open; once a return date is set the
//!   loan is closed and never reopens.
//! - For any book: initial stock == `available_count` + open loans against it.

use crate::model::book::BookId;
use crate::model::member::MemberId;
use serde::{Deserialize, Serialize};

/// Stable identifier for a loan row.
pub type LoanId = i64;

/// Canonical loan record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub book_id: BookId,
    pub member_id: MemberId,
    /// ISO `YYYY-MM-DD`, set by storage when the loan is created.
    pub loan_date: String,
    /// ISO `YYYY-MM-DD`; `None` while the loan is open.
    pub return_date: Option<String>,
}

impl Loan {
    /// Returns whether this loan is still out.
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Result of a successful loan creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReceipt {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub member_id: MemberId,
    pub loan_date: String,
}

/// Result of a successful loan return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub return_date: String,
}
