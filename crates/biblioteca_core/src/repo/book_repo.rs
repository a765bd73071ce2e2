//! Book repository contract and SQLite implementation.
//!
//! # Invariants
//! - Creating or re-homing a book requires the referenced author to exist.
//! - Book reads join the owning author (catalog listings always show it).

use crate::model::author::AuthorId;
use crate::model::book::{Book, BookId, BookPatch, NewBook};
use crate::repo::{CatalogError, CatalogResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const BOOK_DETAIL_SELECT_SQL: &str = "SELECT
    b.id,
    b.title,
    b.publication_year,
    b.genre,
    b.author_id,
    b.available_count,
    a.name AS author_name,
    a.nationality AS author_nationality
FROM books b
INNER JOIN authors a ON a.id = b.author_id";

/// Read model for book listings: the book joined with its author.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BookDetail {
    pub id: BookId,
    pub title: String,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub author_id: AuthorId,
    pub available_count: u32,
    pub author_name: String,
    pub author_nationality: Option<String>,
}

/// Repository interface for book CRUD operations.
pub trait BookRepository {
    fn create_book(&self, input: &NewBook) -> CatalogResult<Book>;
    fn get_book(&self, id: BookId) -> CatalogResult<Option<BookDetail>>;
    fn list_books(&self) -> CatalogResult<Vec<BookDetail>>;
    fn update_book(&self, id: BookId, patch: &BookPatch) -> CatalogResult<()>;
    fn delete_book(&self, id: BookId) -> CatalogResult<()>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn author_exists(&self, author_id: AuthorId) -> CatalogResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM authors WHERE id = ?1);",
            [author_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn create_book(&self, input: &NewBook) -> CatalogResult<Book> {
        input.validate()?;

        if !self.author_exists(input.author_id)? {
            return Err(CatalogError::AuthorNotFound(input.author_id));
        }

        self.conn.execute(
            "INSERT INTO books (title, publication_year, genre, author_id, available_count)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                input.title.as_str(),
                input.publication_year,
                input.genre.as_deref(),
                input.author_id,
                input.available_count,
            ],
        )?;

        Ok(Book {
            id: self.conn.last_insert_rowid(),
            title: input.title.clone(),
            publication_year: input.publication_year,
            genre: input.genre.clone(),
            author_id: input.author_id,
            available_count: input.available_count,
        })
    }

    fn get_book(&self, id: BookId) -> CatalogResult<Option<BookDetail>> {
        let book = self
            .conn
            .query_row(
                &format!("{BOOK_DETAIL_SELECT_SQL} WHERE b.id = ?1;"),
                [id],
                parse_book_detail_row,
            )
            .optional()?;
        Ok(book)
    }

    fn list_books(&self) -> CatalogResult<Vec<BookDetail>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOK_DETAIL_SELECT_SQL} ORDER BY b.id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(parse_book_detail_row(row)?);
        }
        Ok(books)
    }

    fn update_book(&self, id: BookId, patch: &BookPatch) -> CatalogResult<()> {
        patch.validate()?;

        if let Some(author_id) = patch.author_id {
            if !self.author_exists(author_id)? {
                return Err(CatalogError::AuthorNotFound(author_id));
            }
        }

        let changed = self.conn.execute(
            "UPDATE books
             SET
                title = COALESCE(?1, title),
                publication_year = COALESCE(?2, publication_year),
                genre = COALESCE(?3, genre),
                author_id = COALESCE(?4, author_id),
                available_count = COALESCE(?5, available_count)
             WHERE id = ?6;",
            params![
                patch.title.as_deref(),
                patch.publication_year,
                patch.genre.as_deref(),
                patch.author_id,
                patch.available_count,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(CatalogError::BookNotFound(id));
        }

        Ok(())
    }

    fn delete_book(&self, id: BookId) -> CatalogResult<()> {
        let changed = self.conn.execute("DELETE FROM books WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(CatalogError::BookNotFound(id));
        }

        Ok(())
    }
}

fn parse_book_detail_row(row: &Row<'_>) -> rusqlite::Result<BookDetail> {
    Ok(BookDetail {
        id: row.get("id")?,
        title: row.get("title")?,
        publication_year: row.get("publication_year")?,
        genre: row.get("genre")?,
        author_id: row.get("author_id")?,
        available_count: row.get("available_count")?,
        author_name: row.get("author_name")?,
        author_nationality: row.get("author_nationality")?,
    })
}
