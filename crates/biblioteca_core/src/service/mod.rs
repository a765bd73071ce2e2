//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep API surfaces decoupled from storage details.
//!
//! Catalog CRUD needs no orchestration beyond its repositories; only the
//! loan lifecycle carries a service layer.

pub mod loan_service;
