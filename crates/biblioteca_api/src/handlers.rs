//! REST handlers: thin translation between HTTP and core operations.
//!
//! # Invariants
//! - Core errors map 1:1 to status codes; nothing is swallowed.
//! - Store failures answer with a generic 500 body; the transaction is
//!   already rolled back by the time the response is produced.

use actix_web::{web, HttpResponse};
use biblioteca_core::{
    core_version, AuthorPatch, AuthorRepository, BookId, BookPatch, BookRepository, CatalogError,
    LoanError, LoanService, MemberId, MemberPatch, MemberRepository, NewAuthor, NewBook,
    NewMember, SqliteAuthorRepository, SqliteBookRepository, SqliteLoanRepository,
    SqliteMemberRepository,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

/// Configure all API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Status
            .route("/status", web::get().to(status))
            // Authors
            .route("/authors", web::get().to(list_authors))
            .route("/authors", web::post().to(create_author))
            .route("/authors/{id}", web::get().to(get_author))
            .route("/authors/{id}", web::put().to(update_author))
            .route("/authors/{id}", web::delete().to(delete_author))
            // Books
            .route("/books", web::get().to(list_books))
            .route("/books", web::post().to(create_book))
            .route("/books/{id}", web::get().to(get_book))
            .route("/books/{id}", web::put().to(update_book))
            .route("/books/{id}", web::delete().to(delete_book))
            // Members
            .route("/members", web::get().to(list_members))
            .route("/members", web::post().to(create_member))
            .route("/members/{id}", web::get().to(get_member))
            .route("/members/{id}", web::put().to(update_member))
            .route("/members/{id}", web::delete().to(delete_member))
            // Loans
            .route("/loans", web::get().to(list_loans))
            .route("/loans", web::post().to(create_loan))
            .route("/loans/{id}/return", web::post().to(return_loan))
            .route("/loans/member/{id}", web::get().to(member_loan_history))
            .route("/loans/book/{id}", web::get().to(book_loan_history)),
    );
}

/// Explicit request body for loan creation.
#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    pub book_id: BookId,
    pub member_id: MemberId,
}

// ── Helpers ─────────────────────────────────────────────────────────

fn with_conn<F>(state: &AppState, f: F) -> HttpResponse
where
    F: FnOnce(&mut Connection) -> HttpResponse,
{
    match state.conn.lock() {
        Ok(mut conn) => f(&mut conn),
        Err(_) => {
            log::error!("event=api_error module=api status=error error=poisoned_connection_lock");
            internal_error()
        }
    }
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "error": "internal server error"
    }))
}

fn catalog_error_response(err: CatalogError) -> HttpResponse {
    match &err {
        CatalogError::Validation(_) => HttpResponse::BadRequest().json(json!({
            "error": err.to_string()
        })),
        CatalogError::AuthorNotFound(_)
        | CatalogError::BookNotFound(_)
        | CatalogError::MemberNotFound(_) => HttpResponse::NotFound().json(json!({
            "error": err.to_string()
        })),
        CatalogError::Duplicate { .. } => HttpResponse::Conflict().json(json!({
            "error": err.to_string()
        })),
        CatalogError::Db(_) => {
            log::error!("event=api_error module=api status=error error={err}");
            internal_error()
        }
    }
}

fn loan_error_response(err: LoanError) -> HttpResponse {
    match &err {
        LoanError::BookNotFound(_)
        | LoanError::MemberNotFound(_)
        | LoanError::LoanNotFound(_) => HttpResponse::NotFound().json(json!({
            "error": err.to_string()
        })),
        LoanError::NoCopiesAvailable(_) | LoanError::AlreadyReturned(_) => {
            HttpResponse::BadRequest().json(json!({
                "error": err.to_string()
            }))
        }
        LoanError::Db(_) | LoanError::UninitializedConnection { .. } => {
            log::error!("event=api_error module=api status=error error={err}");
            internal_error()
        }
    }
}

// ── Status ──────────────────────────────────────────────────────────

async fn status() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": core_version()
    }))
}

// ── Authors ─────────────────────────────────────────────────────────

async fn list_authors(state: web::Data<AppState>) -> HttpResponse {
    with_conn(&state, |conn| {
        match SqliteAuthorRepository::new(conn).list_authors() {
            Ok(authors) => HttpResponse::Ok().json(authors),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn create_author(state: web::Data<AppState>, body: web::Json<NewAuthor>) -> HttpResponse {
    with_conn(&state, |conn| {
        match SqliteAuthorRepository::new(conn).create_author(&body) {
            Ok(author) => HttpResponse::Created().json(author),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn get_author(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    with_conn(&state, |conn| {
        match SqliteAuthorRepository::new(conn).get_author(id) {
            Ok(Some(author)) => HttpResponse::Ok().json(author),
            Ok(None) => catalog_error_response(CatalogError::AuthorNotFound(id)),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn update_author(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<AuthorPatch>,
) -> HttpResponse {
    let id = path.into_inner();
    with_conn(&state, |conn| {
        let repo = SqliteAuthorRepository::new(conn);
        match repo.update_author(id, &body).and_then(|()| repo.get_author(id)) {
            Ok(Some(author)) => HttpResponse::Ok().json(author),
            Ok(None) => catalog_error_response(CatalogError::AuthorNotFound(id)),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn delete_author(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    with_conn(&state, |conn| {
        match SqliteAuthorRepository::new(conn).delete_author(id) {
            Ok(()) => HttpResponse::Ok().json(json!({ "deleted": id })),
            Err(err) => catalog_error_response(err),
        }
    })
}

// ── Books ───────────────────────────────────────────────────────────

async fn list_books(state: web::Data<AppState>) -> HttpResponse {
    with_conn(&state, |conn| {
        match SqliteBookRepository::new(conn).list_books() {
            Ok(books) => HttpResponse::Ok().json(books),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn create_book(state: web::Data<AppState>, body: web::Json<NewBook>) -> HttpResponse {
    with_conn(&state, |conn| {
        match SqliteBookRepository::new(conn).create_book(&body) {
            Ok(book) => HttpResponse::Created().json(book),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn get_book(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    with_conn(&state, |conn| {
        match SqliteBookRepository::new(conn).get_book(id) {
            Ok(Some(book)) => HttpResponse::Ok().json(book),
            Ok(None) => catalog_error_response(CatalogError::BookNotFound(id)),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn update_book(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<BookPatch>,
) -> HttpResponse {
    let id = path.into_inner();
    with_conn(&state, |conn| {
        let repo = SqliteBookRepository::new(conn);
        match repo.update_book(id, &body).and_then(|()| repo.get_book(id)) {
            Ok(Some(book)) => HttpResponse::Ok().json(book),
            Ok(None) => catalog_error_response(CatalogError::BookNotFound(id)),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn delete_book(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    with_conn(&state, |conn| {
        match SqliteBookRepository::new(conn).delete_book(id) {
            Ok(()) => HttpResponse::Ok().json(json!({ "deleted": id })),
            Err(err) => catalog_error_response(err),
        }
    })
}

// ── Members ─────────────────────────────────────────────────────────

async fn list_members(state: web::Data<AppState>) -> HttpResponse {
    with_conn(&state, |conn| {
        match SqliteMemberRepository::new(conn).list_members() {
            Ok(members) => HttpResponse::Ok().json(members),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn create_member(state: web::Data<AppState>, body: web::Json<NewMember>) -> HttpResponse {
    with_conn(&state, |conn| {
        match SqliteMemberRepository::new(conn).create_member(&body) {
            Ok(member) => HttpResponse::Created().json(member),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn get_member(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    with_conn(&state, |conn| {
        match SqliteMemberRepository::new(conn).get_member(id) {
            Ok(Some(member)) => HttpResponse::Ok().json(member),
            Ok(None) => catalog_error_response(CatalogError::MemberNotFound(id)),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn update_member(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<MemberPatch>,
) -> HttpResponse {
    let id = path.into_inner();
    with_conn(&state, |conn| {
        let repo = SqliteMemberRepository::new(conn);
        match repo.update_member(id, &body).and_then(|()| repo.get_member(id)) {
            Ok(Some(member)) => HttpResponse::Ok().json(member),
            Ok(None) => catalog_error_response(CatalogError::MemberNotFound(id)),
            Err(err) => catalog_error_response(err),
        }
    })
}

async fn delete_member(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    with_conn(&state, |conn| {
        match SqliteMemberRepository::new(conn).delete_member(id) {
            Ok(()) => HttpResponse::Ok().json(json!({ "deleted": id })),
            Err(err) => catalog_error_response(err),
        }
    })
}

// ── Loans ───────────────────────────────────────────────────────────

async fn list_loans(state: web::Data<AppState>) -> HttpResponse {
    with_conn(&state, |conn| {
        let repo = match SqliteLoanRepository::try_new(conn) {
            Ok(repo) => repo,
            Err(err) => return loan_error_response(err),
        };
        match LoanService::new(repo).list_loans() {
            Ok(loans) => HttpResponse::Ok().json(loans),
            Err(err) => loan_error_response(err),
        }
    })
}

async fn create_loan(
    state: web::Data<AppState>,
    body: web::Json<CreateLoanRequest>,
) -> HttpResponse {
    with_conn(&state, |conn| {
        let repo = match SqliteLoanRepository::try_new(conn) {
            Ok(repo) => repo,
            Err(err) => return loan_error_response(err),
        };
        match LoanService::new(repo).create_loan(body.book_id, body.member_id) {
            Ok(receipt) => HttpResponse::Created().json(receipt),
            Err(err) => loan_error_response(err),
        }
    })
}

async fn return_loan(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let loan_id = path.into_inner();
    with_conn(&state, |conn| {
        let repo = match SqliteLoanRepository::try_new(conn) {
            Ok(repo) => repo,
            Err(err) => return loan_error_response(err),
        };
        match LoanService::new(repo).return_loan(loan_id) {
            Ok(receipt) => HttpResponse::Ok().json(receipt),
            Err(err) => loan_error_response(err),
        }
    })
}

async fn member_loan_history(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let member_id = path.into_inner();
    with_conn(&state, |conn| {
        let repo = match SqliteLoanRepository::try_new(conn) {
            Ok(repo) => repo,
            Err(err) => return loan_error_response(err),
        };
        match LoanService::new(repo).list_member_loans(member_id) {
            Ok(loans) if loans.is_empty() => HttpResponse::NotFound().json(json!({
                "error": format!("no loans found for member {member_id}")
            })),
            Ok(loans) => HttpResponse::Ok().json(loans),
            Err(err) => loan_error_response(err),
        }
    })
}

async fn book_loan_history(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let book_id = path.into_inner();
    with_conn(&state, |conn| {
        let repo = match SqliteLoanRepository::try_new(conn) {
            Ok(repo) => repo,
            Err(err) => return loan_error_response(err),
        };
        match LoanService::new(repo).list_book_loans(book_id) {
            Ok(loans) if loans.is_empty() => HttpResponse::NotFound().json(json!({
                "error": format!("no loans found for book {book_id}")
            })),
            Ok(loans) => HttpResponse::Ok().json(loans),
            Err(err) => loan_error_response(err),
        }
    })
}
