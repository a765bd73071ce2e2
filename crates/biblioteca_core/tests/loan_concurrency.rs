//! Races over one database file, each thread owning its own connection.
//! These tests pin the overbooking guarantees: simultaneous writers must
//! serialize on the store's write lock, never double-spend a copy and never
//! double-close a loan.

use biblioteca_core::db::open_db;
use biblioteca_core::{
    AuthorRepository, BookRepository, LoanError, LoanRepository, MemberRepository, NewAuthor,
    NewBook, NewMember, SqliteAuthorRepository, SqliteBookRepository, SqliteLoanRepository,
    SqliteMemberRepository,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn two_racing_creations_on_the_last_copy_yield_one_loan() {
    let (_dir, path) = temp_db_path();
    let conn = open_db(&path).unwrap();
    let (book_id, member_ids) = seed_catalog(&conn, 1, 2);
    drop(conn);

    let results = race(&path, 2, move |i, conn| {
        let mut repo = SqliteLoanRepository::try_new(conn)?;
        repo.create_loan(book_id, member_ids[i])
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one creation must win: {results:?}");
    let unavailable = results
        .iter()
        .filter(|r| matches!(r, Err(LoanError::NoCopiesAvailable(_))))
        .count();
    assert_eq!(unavailable, 1, "the loser must see NoCopiesAvailable: {results:?}");

    let conn = open_db(&path).unwrap();
    assert_eq!(available_count(&conn, book_id), 0);
    assert_conserved(&conn, book_id, 1);
}

#[test]
fn stock_of_three_admits_exactly_three_of_four_racing_creations() {
    let (_dir, path) = temp_db_path();
    let conn = open_db(&path).unwrap();
    let (book_id, member_ids) = seed_catalog(&conn, 3, 4);
    drop(conn);

    let results = race(&path, 4, move |i, conn| {
        let mut repo = SqliteLoanRepository::try_new(conn)?;
        repo.create_loan(book_id, member_ids[i])
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 3, "stock bounds the winners: {results:?}");
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(LoanError::NoCopiesAvailable(_)))));

    let conn = open_db(&path).unwrap();
    assert_eq!(available_count(&conn, book_id), 0);
    assert_conserved(&conn, book_id, 3);
}

#[test]
fn two_racing_returns_close_the_loan_once() {
    let (_dir, path) = temp_db_path();
    let mut conn = open_db(&path).unwrap();
    let (book_id, member_ids) = seed_catalog(&conn, 1, 1);
    let loan_id = {
        let mut repo = SqliteLoanRepository::try_new(&mut conn).unwrap();
        repo.create_loan(book_id, member_ids[0]).unwrap().loan_id
    };
    drop(conn);

    let results = race(&path, 2, move |_, conn| {
        let mut repo = SqliteLoanRepository::try_new(conn)?;
        repo.return_loan(loan_id)
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one return must win: {results:?}");
    let already_returned = results
        .iter()
        .filter(|r| matches!(r, Err(LoanError::AlreadyReturned(_))))
        .count();
    assert_eq!(already_returned, 1, "the loser must see AlreadyReturned: {results:?}");

    let conn = open_db(&path).unwrap();
    // Incremented exactly once despite two attempts.
    assert_eq!(available_count(&conn, book_id), 1);
    assert_conserved(&conn, book_id, 1);
}

/// Spawns `threads` workers against the database at `path`, released by a
/// shared barrier, and collects each worker's outcome in thread order.
fn race<T, F>(path: &Path, threads: usize, op: F) -> Vec<Result<T, LoanError>>
where
    T: Send + std::fmt::Debug + 'static,
    F: Fn(usize, &mut Connection) -> Result<T, LoanError> + Clone + Send + 'static,
{
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let path = path.to_path_buf();
            let barrier = Arc::clone(&barrier);
            let op = op.clone();
            thread::spawn(move || {
                let mut conn = open_db(&path).map_err(LoanError::from)?;
                barrier.wait();
                op(i, &mut conn)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().expect("race worker panicked"))
        .collect()
}

fn temp_db_path() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("biblioteca.db");
    (dir, path)
}

fn seed_catalog(conn: &Connection, stock: u32, members: usize) -> (i64, Vec<i64>) {
    let author = SqliteAuthorRepository::new(conn)
        .create_author(&NewAuthor {
            name: "Ursula K. Le Guin".to_string(),
            nationality: Some("American".to_string()),
        })
        .unwrap();
    let book = SqliteBookRepository::new(conn)
        .create_book(&NewBook {
            title: "The Dispossessed".to_string(),
            publication_year: Some(1974),
            genre: Some("Science fiction".to_string()),
            author_id: author.id,
            available_count: stock,
        })
        .unwrap();

    let member_repo = SqliteMemberRepository::new(conn);
    let member_ids = (0..members)
        .map(|i| {
            member_repo
                .create_member(&NewMember {
                    name: format!("Member {i}"),
                    national_id: format!("0000000{i}X"),
                    phone: None,
                    email: format!("member{i}@example.org"),
                    address: None,
                })
                .unwrap()
                .id
        })
        .collect();

    (book.id, member_ids)
}

fn available_count(conn: &Connection, book_id: i64) -> u32 {
    conn.query_row(
        "SELECT available_count FROM books WHERE id = ?1;",
        [book_id],
        |row| row.get(0),
    )
    .unwrap()
}

fn open_loan_count(conn: &Connection, book_id: i64) -> u32 {
    conn.query_row(
        "SELECT COUNT(*) FROM loans WHERE book_id = ?1 AND return_date IS NULL;",
        [book_id],
        |row| row.get(0),
    )
    .unwrap()
}

fn assert_conserved(conn: &Connection, book_id: i64, initial_stock: u32) {
    assert_eq!(
        available_count(conn, book_id) + open_loan_count(conn, book_id),
        initial_stock,
        "conserved quantity violated for book {book_id}"
    );
}
