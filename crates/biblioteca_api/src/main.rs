//! HTTP API server for Biblioteca.
//!
//! # Responsibility
//! - Translate REST calls into repository/service operations.
//! - Own runtime configuration (bind address, database path, logging).
//!
//! # Invariants
//! - Each worker owns its own SQLite connection; cross-worker write ordering
//!   is arbitrated by the store's locking, never by in-process state.

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use biblioteca_core::db::open_db;
use biblioteca_core::{default_log_level, init_logging};
use rusqlite::Connection;
use std::sync::Mutex;

mod handlers;

/// Per-worker application state handed to every handler.
pub struct AppState {
    pub conn: Mutex<Connection>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let host = env_or("BIBLIOTECA_HOST", "127.0.0.1");
    let port: u16 = std::env::var("BIBLIOTECA_PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);
    let db_path = env_or("BIBLIOTECA_DB", "biblioteca.db");

    if let Err(err) = init_file_logging() {
        eprintln!("logging disabled: {err}");
    }

    // Fail fast on a broken database before any worker starts.
    open_db(&db_path).map_err(|err| std::io::Error::other(err.to_string()))?;

    println!("biblioteca_api listening on http://{host}:{port} (db={db_path})");
    log::info!("event=api_start module=api status=ok host={host} port={port} db={db_path}");

    HttpServer::new(move || {
        let conn = open_db(&db_path).expect("database was opened at startup");
        App::new()
            .app_data(web::Data::new(AppState {
                conn: Mutex::new(conn),
            }))
            .wrap(Cors::permissive())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

fn init_file_logging() -> Result<(), String> {
    let level = env_or("BIBLIOTECA_LOG_LEVEL", default_log_level());
    let log_dir = match std::env::var("BIBLIOTECA_LOG_DIR") {
        Ok(dir) => dir,
        Err(_) => {
            let cwd = std::env::current_dir().map_err(|err| err.to_string())?;
            cwd.join("logs").to_string_lossy().into_owned()
        }
    };
    init_logging(&level, &log_dir)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
