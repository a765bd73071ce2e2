//! Member repository contract and SQLite implementation.
//!
//! # Invariants
//! - `national_id` and `email` uniqueness violations are reported as
//!   `CatalogError::Duplicate`, never as raw SQLite errors.
//! - `registered_on` is assigned by storage at insert and never updated.

use crate::model::member::{Member, MemberId, MemberPatch, NewMember};
use crate::repo::{CatalogError, CatalogResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const MEMBER_SELECT_SQL: &str = "SELECT
    id,
    name,
    national_id,
    phone,
    email,
    address,
    registered_on
FROM members";

/// Repository interface for member CRUD operations.
pub trait MemberRepository {
    fn create_member(&self, input: &NewMember) -> CatalogResult<Member>;
    fn get_member(&self, id: MemberId) -> CatalogResult<Option<Member>>;
    fn list_members(&self) -> CatalogResult<Vec<Member>>;
    fn update_member(&self, id: MemberId, patch: &MemberPatch) -> CatalogResult<()>;
    fn delete_member(&self, id: MemberId) -> CatalogResult<()>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn create_member(&self, input: &NewMember) -> CatalogResult<Member> {
        input.validate()?;

        self.conn
            .execute(
                "INSERT INTO members (name, national_id, phone, email, address, registered_on)
                 VALUES (?1, ?2, ?3, ?4, ?5, date('now'));",
                params![
                    input.name.as_str(),
                    input.national_id.as_str(),
                    input.phone.as_deref(),
                    input.email.as_str(),
                    input.address.as_deref(),
                ],
            )
            .map_err(map_unique_violation)?;

        let id = self.conn.last_insert_rowid();
        let member = self
            .conn
            .query_row(
                &format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_member_row,
            )
            .optional()?;

        member.ok_or(CatalogError::MemberNotFound(id))
    }

    fn get_member(&self, id: MemberId) -> CatalogResult<Option<Member>> {
        let member = self
            .conn
            .query_row(
                &format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_member_row,
            )
            .optional()?;
        Ok(member)
    }

    fn list_members(&self) -> CatalogResult<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn update_member(&self, id: MemberId, patch: &MemberPatch) -> CatalogResult<()> {
        patch.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE members
                 SET
                    name = COALESCE(?1, name),
                    national_id = COALESCE(?2, national_id),
                    phone = COALESCE(?3, phone),
                    email = COALESCE(?4, email),
                    address = COALESCE(?5, address)
                 WHERE id = ?6;",
                params![
                    patch.name.as_deref(),
                    patch.national_id.as_deref(),
                    patch.phone.as_deref(),
                    patch.email.as_deref(),
                    patch.address.as_deref(),
                    id,
                ],
            )
            .map_err(map_unique_violation)?;

        if changed == 0 {
            return Err(CatalogError::MemberNotFound(id));
        }

        Ok(())
    }

    fn delete_member(&self, id: MemberId) -> CatalogResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM members WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(CatalogError::MemberNotFound(id));
        }

        Ok(())
    }
}

fn parse_member_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get("id")?,
        name: row.get("name")?,
        national_id: row.get("national_id")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        address: row.get("address")?,
        registered_on: row.get("registered_on")?,
    })
}

fn map_unique_violation(err: rusqlite::Error) -> CatalogError {
    if let rusqlite::Error::SqliteFailure(code, Some(message)) = &err {
        if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            let field = if message.contains("members.national_id") {
                "national_id"
            } else if message.contains("members.email") {
                "email"
            } else {
                "unique field"
            };
            return CatalogError::Duplicate {
                entity: "member",
                field,
            };
        }
    }
    err.into()
}
