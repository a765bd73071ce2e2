//! Loan repository: the only write path for loan rows and book availability.
//!
//! # Responsibility
//! - Create and close loans inside immediate-mode transactions.
//! - Provide joined loan read models for listings and histories.
//!
//! # Invariants
//! - `books.available_count` and `loans` rows are mutated together or not at
//!   all; every error path rolls the transaction back.
//! - Both write operations begin with `TransactionBehavior::Immediate`, so
//!   the database write lock is held before the first precondition read.
//!   Two racing writers therefore serialize, and the loser re-reads state
//!   the winner already committed.
//! - Availability is never cached; each attempt re-reads the book row.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::book::BookId;
use crate::model::loan::{Loan, LoanId, LoanReceipt, ReturnReceipt};
use crate::model::member::MemberId;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LoanResult<T> = Result<T, LoanError>;

/// Errors from loan persistence and query operations.
#[derive(Debug)]
pub enum LoanError {
    /// Underlying SQLite/bootstrap error. The transaction is already rolled
    /// back when this surfaces.
    Db(DbError),
    /// Referenced book does not exist.
    BookNotFound(BookId),
    /// Referenced member does not exist.
    MemberNotFound(MemberId),
    /// Targeted loan does not exist.
    LoanNotFound(LoanId),
    /// The book exists but every unit is out on open loans.
    NoCopiesAvailable(BookId),
    /// The loan was already closed by an earlier return.
    AlreadyReturned(LoanId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for LoanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::LoanNotFound(id) => write!(f, "loan not found: {id}"),
            Self::NoCopiesAvailable(id) => {
                write!(f, "no copies of book {id} are available for loan")
            }
            Self::AlreadyReturned(id) => write!(f, "loan {id} has already been returned"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "loan repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for LoanError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for LoanError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LoanError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read model for the full loan listing: loan joined with book, author and
/// member details.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LoanDetail {
    pub loan_id: LoanId,
    pub loan_date: String,
    pub return_date: Option<String>,
    pub book_title: String,
    pub book_genre: Option<String>,
    pub author_name: String,
    pub member_name: String,
    pub member_national_id: String,
    pub member_email: String,
}

/// Read model for one member's loan history.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MemberLoanRecord {
    pub loan_id: LoanId,
    pub loan_date: String,
    pub return_date: Option<String>,
    pub book_title: String,
    pub book_genre: Option<String>,
    pub author_name: String,
}

/// Read model for one book's loan history.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BookLoanRecord {
    pub loan_id: LoanId,
    pub loan_date: String,
    pub return_date: Option<String>,
    pub member_name: String,
    pub member_national_id: String,
    pub member_email: String,
}

/// Repository interface for the loan lifecycle and loan queries.
pub trait LoanRepository {
    /// Creates an open loan and decrements the book's availability by one.
    fn create_loan(&mut self, book_id: BookId, member_id: MemberId) -> LoanResult<LoanReceipt>;
    /// Closes an open loan and restores the book's availability by one.
    fn return_loan(&mut self, loan_id: LoanId) -> LoanResult<ReturnReceipt>;
    /// Gets one raw loan row by id.
    fn get_loan(&self, loan_id: LoanId) -> LoanResult<Option<Loan>>;
    /// Lists all loans joined with book/author/member details.
    fn list_loans(&self) -> LoanResult<Vec<LoanDetail>>;
    /// Lists the loan history of one member.
    fn list_member_loans(&self, member_id: MemberId) -> LoanResult<Vec<MemberLoanRecord>>;
    /// Lists the loan history of one book.
    fn list_book_loans(&self, book_id: BookId) -> LoanResult<Vec<BookLoanRecord>>;
}

/// SQLite-backed loan repository.
#[derive(Debug)]
pub struct SqliteLoanRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteLoanRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> LoanResult<Self> {
        let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(LoanError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl LoanRepository for SqliteLoanRepository<'_> {
    fn create_loan(&mut self, book_id: BookId, member_id: MemberId) -> LoanResult<LoanReceipt> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Availability is read under the write lock; a racing creation on the
        // last copy cannot also observe it.
        let available: Option<u32> = tx
            .query_row(
                "SELECT available_count FROM books WHERE id = ?1;",
                [book_id],
                |row| row.get(0),
            )
            .optional()?;
        let available = available.ok_or(LoanError::BookNotFound(book_id))?;
        if available == 0 {
            return Err(LoanError::NoCopiesAvailable(book_id));
        }

        let member_exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM members WHERE id = ?1);",
            [member_id],
            |row| row.get(0),
        )?;
        if member_exists == 0 {
            return Err(LoanError::MemberNotFound(member_id));
        }

        tx.execute(
            "INSERT INTO loans (book_id, member_id, loan_date)
             VALUES (?1, ?2, date('now'));",
            params![book_id, member_id],
        )?;
        let loan_id = tx.last_insert_rowid();
        let loan_date: String = tx.query_row(
            "SELECT loan_date FROM loans WHERE id = ?1;",
            [loan_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "UPDATE books SET available_count = available_count - 1 WHERE id = ?1;",
            [book_id],
        )?;

        tx.commit()?;

        Ok(LoanReceipt {
            loan_id,
            book_id,
            member_id,
            loan_date,
        })
    }

    fn return_loan(&mut self, loan_id: LoanId) -> LoanResult<ReturnReceipt> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let loan: Option<(BookId, Option<String>)> = tx
            .query_row(
                "SELECT book_id, return_date FROM loans WHERE id = ?1;",
                [loan_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (book_id, existing_return_date) = loan.ok_or(LoanError::LoanNotFound(loan_id))?;
        if existing_return_date.is_some() {
            return Err(LoanError::AlreadyReturned(loan_id));
        }

        tx.execute(
            "UPDATE loans SET return_date = date('now') WHERE id = ?1;",
            [loan_id],
        )?;
        let return_date: String = tx.query_row(
            "SELECT return_date FROM loans WHERE id = ?1;",
            [loan_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "UPDATE books SET available_count = available_count + 1 WHERE id = ?1;",
            [book_id],
        )?;

        tx.commit()?;

        Ok(ReturnReceipt {
            loan_id,
            book_id,
            return_date,
        })
    }

    fn get_loan(&self, loan_id: LoanId) -> LoanResult<Option<Loan>> {
        let loan = self
            .conn
            .query_row(
                "SELECT id, book_id, member_id, loan_date, return_date
                 FROM loans
                 WHERE id = ?1;",
                [loan_id],
                parse_loan_row,
            )
            .optional()?;
        Ok(loan)
    }

    fn list_loans(&self) -> LoanResult<Vec<LoanDetail>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                l.id,
                l.loan_date,
                l.return_date,
                b.title AS book_title,
                b.genre AS book_genre,
                a.name AS author_name,
                m.name AS member_name,
                m.national_id AS member_national_id,
                m.email AS member_email
             FROM loans l
             INNER JOIN books b ON b.id = l.book_id
             INNER JOIN authors a ON a.id = b.author_id
             INNER JOIN members m ON m.id = l.member_id
             ORDER BY l.loan_date DESC, l.id DESC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut loans = Vec::new();
        while let Some(row) = rows.next()? {
            loans.push(LoanDetail {
                loan_id: row.get("id")?,
                loan_date: row.get("loan_date")?,
                return_date: row.get("return_date")?,
                book_title: row.get("book_title")?,
                book_genre: row.get("book_genre")?,
                author_name: row.get("author_name")?,
                member_name: row.get("member_name")?,
                member_national_id: row.get("member_national_id")?,
                member_email: row.get("member_email")?,
            });
        }
        Ok(loans)
    }

    fn list_member_loans(&self, member_id: MemberId) -> LoanResult<Vec<MemberLoanRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                l.id,
                l.loan_date,
                l.return_date,
                b.title AS book_title,
                b.genre AS book_genre,
                a.name AS author_name
             FROM loans l
             INNER JOIN books b ON b.id = l.book_id
             INNER JOIN authors a ON a.id = b.author_id
             WHERE l.member_id = ?1
             ORDER BY l.loan_date DESC, l.id DESC;",
        )?;
        let mut rows = stmt.query([member_id])?;
        let mut loans = Vec::new();
        while let Some(row) = rows.next()? {
            loans.push(MemberLoanRecord {
                loan_id: row.get("id")?,
                loan_date: row.get("loan_date")?,
                return_date: row.get("return_date")?,
                book_title: row.get("book_title")?,
                book_genre: row.get("book_genre")?,
                author_name: row.get("author_name")?,
            });
        }
        Ok(loans)
    }

    fn list_book_loans(&self, book_id: BookId) -> LoanResult<Vec<BookLoanRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                l.id,
                l.loan_date,
                l.return_date,
                m.name AS member_name,
                m.national_id AS member_national_id,
                m.email AS member_email
             FROM loans l
             INNER JOIN members m ON m.id = l.member_id
             WHERE l.book_id = ?1
             ORDER BY l.loan_date DESC, l.id DESC;",
        )?;
        let mut rows = stmt.query([book_id])?;
        let mut loans = Vec::new();
        while let Some(row) = rows.next()? {
            loans.push(BookLoanRecord {
                loan_id: row.get("id")?,
                loan_date: row.get("loan_date")?,
                return_date: row.get("return_date")?,
                member_name: row.get("member_name")?,
                member_national_id: row.get("member_national_id")?,
                member_email: row.get("member_email")?,
            });
        }
        Ok(loans)
    }
}

fn parse_loan_row(row: &Row<'_>) -> rusqlite::Result<Loan> {
    Ok(Loan {
        id: row.get("id")?,
        book_id: row.get("book_id")?,
        member_id: row.get("member_id")?,
        loan_date: row.get("loan_date")?,
        return_date: row.get("return_date")?,
    })
}
