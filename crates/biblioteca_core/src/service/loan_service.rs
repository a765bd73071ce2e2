//! Loan use-case service.
//!
//! # Responsibility
//! - Provide the single entry point for loan creation and return.
//! - Emit `loan_create` / `loan_return` diagnostic events.
//!
//! # Invariants
//! - Service APIs never bypass the repository's transactional write paths.
//! - A rejected operation logs `status=rejected`; a store failure logs
//!   `status=error`; neither leaves partial state behind (the repository
//!   guarantees rollback before the error surfaces).

use crate::model::book::BookId;
use crate::model::loan::{Loan, LoanId, LoanReceipt, ReturnReceipt};
use crate::model::member::MemberId;
use crate::repo::loan_repo::{
    BookLoanRecord, LoanDetail, LoanError, LoanRepository, LoanResult, MemberLoanRecord,
};
use log::{error, info, warn};

/// Use-case service wrapper for the loan lifecycle.
pub struct LoanService<R: LoanRepository> {
    repo: R,
}

impl<R: LoanRepository> LoanService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loans one unit of a book to a member.
    ///
    /// # Contract
    /// - Succeeds only if the book exists with at least one available unit
    ///   and the member exists.
    /// - On success exactly one open loan row exists and the book's
    ///   availability dropped by one; on any error nothing changed.
    pub fn create_loan(&mut self, book_id: BookId, member_id: MemberId) -> LoanResult<LoanReceipt> {
        match self.repo.create_loan(book_id, member_id) {
            Ok(receipt) => {
                info!(
                    "event=loan_create module=loan status=ok loan_id={} book_id={book_id} member_id={member_id}",
                    receipt.loan_id
                );
                Ok(receipt)
            }
            Err(err) => {
                log_rejection("loan_create", &err, &format!("book_id={book_id} member_id={member_id}"));
                Err(err)
            }
        }
    }

    /// Closes an open loan and restores the book's availability.
    ///
    /// # Contract
    /// - Succeeds only once per loan; repeat attempts are rejected with
    ///   `AlreadyReturned` and change nothing.
    pub fn return_loan(&mut self, loan_id: LoanId) -> LoanResult<ReturnReceipt> {
        match self.repo.return_loan(loan_id) {
            Ok(receipt) => {
                info!(
                    "event=loan_return module=loan status=ok loan_id={loan_id} book_id={} return_date={}",
                    receipt.book_id, receipt.return_date
                );
                Ok(receipt)
            }
            Err(err) => {
                log_rejection("loan_return", &err, &format!("loan_id={loan_id}"));
                Err(err)
            }
        }
    }

    /// Gets one raw loan row by id.
    pub fn get_loan(&self, loan_id: LoanId) -> LoanResult<Option<Loan>> {
        self.repo.get_loan(loan_id)
    }

    /// Lists all loans joined with book/author/member details.
    pub fn list_loans(&self) -> LoanResult<Vec<LoanDetail>> {
        self.repo.list_loans()
    }

    /// Lists the loan history of one member.
    pub fn list_member_loans(&self, member_id: MemberId) -> LoanResult<Vec<MemberLoanRecord>> {
        self.repo.list_member_loans(member_id)
    }

    /// Lists the loan history of one book.
    pub fn list_book_loans(&self, book_id: BookId) -> LoanResult<Vec<BookLoanRecord>> {
        self.repo.list_book_loans(book_id)
    }
}

fn log_rejection(event: &str, err: &LoanError, context: &str) {
    match err {
        LoanError::Db(_) | LoanError::UninitializedConnection { .. } => {
            error!("event={event} module=loan status=error {context} error={err}");
        }
        LoanError::BookNotFound(_)
        | LoanError::MemberNotFound(_)
        | LoanError::LoanNotFound(_)
        | LoanError::NoCopiesAvailable(_)
        | LoanError::AlreadyReturned(_) => {
            warn!("event={event} module=loan status=rejected {context} reason={}", reason(err));
        }
    }
}

fn reason(err: &LoanError) -> &'static str {
    match err {
        LoanError::BookNotFound(_) => "book_not_found",
        LoanError::MemberNotFound(_) => "member_not_found",
        LoanError::LoanNotFound(_) => "loan_not_found",
        LoanError::NoCopiesAvailable(_) => "no_copies",
        LoanError::AlreadyReturned(_) => "already_returned",
        LoanError::Db(_) | LoanError::UninitializedConnection { .. } => "store_failure",
    }
}
