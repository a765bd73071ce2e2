//! Author repository contract and SQLite implementation.

use crate::model::author::{Author, AuthorId, AuthorPatch, NewAuthor};
use crate::repo::{CatalogError, CatalogResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const AUTHOR_SELECT_SQL: &str = "SELECT id, name, nationality FROM authors";

/// Repository interface for author CRUD operations.
pub trait AuthorRepository {
    fn create_author(&self, input: &NewAuthor) -> CatalogResult<Author>;
    fn get_author(&self, id: AuthorId) -> CatalogResult<Option<Author>>;
    fn list_authors(&self) -> CatalogResult<Vec<Author>>;
    fn update_author(&self, id: AuthorId, patch: &AuthorPatch) -> CatalogResult<()>;
    fn delete_author(&self, id: AuthorId) -> CatalogResult<()>;
}

/// SQLite-backed author repository.
pub struct SqliteAuthorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthorRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AuthorRepository for SqliteAuthorRepository<'_> {
    fn create_author(&self, input: &NewAuthor) -> CatalogResult<Author> {
        input.validate()?;

        self.conn.execute(
            "INSERT INTO authors (name, nationality) VALUES (?1, ?2);",
            params![input.name.as_str(), input.nationality.as_deref()],
        )?;

        Ok(Author {
            id: self.conn.last_insert_rowid(),
            name: input.name.clone(),
            nationality: input.nationality.clone(),
        })
    }

    fn get_author(&self, id: AuthorId) -> CatalogResult<Option<Author>> {
        let author = self
            .conn
            .query_row(
                &format!("{AUTHOR_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_author_row,
            )
            .optional()?;
        Ok(author)
    }

    fn list_authors(&self) -> CatalogResult<Vec<Author>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AUTHOR_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut authors = Vec::new();
        while let Some(row) = rows.next()? {
            authors.push(parse_author_row(row)?);
        }
        Ok(authors)
    }

    fn update_author(&self, id: AuthorId, patch: &AuthorPatch) -> CatalogResult<()> {
        patch.validate()?;

        let changed = self.conn.execute(
            "UPDATE authors
             SET
                name = COALESCE(?1, name),
                nationality = COALESCE(?2, nationality)
             WHERE id = ?3;",
            params![patch.name.as_deref(), patch.nationality.as_deref(), id],
        )?;

        if changed == 0 {
            return Err(CatalogError::AuthorNotFound(id));
        }

        Ok(())
    }

    fn delete_author(&self, id: AuthorId) -> CatalogResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM authors WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(CatalogError::AuthorNotFound(id));
        }

        Ok(())
    }
}

fn parse_author_row(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get("id")?,
        name: row.get("name")?,
        nationality: row.get("nationality")?,
    })
}
