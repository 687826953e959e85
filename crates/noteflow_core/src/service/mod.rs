//! Use-case services built on repository contracts.
//!
//! # Responsibility
//! - Enforce tree and validation invariants above the repository layer.
//! - Keep business flows independent from SQLite details.

pub mod conversation_service;
pub mod note_service;
pub mod settings_service;
