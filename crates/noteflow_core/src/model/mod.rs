//! Domain model for the NoteFlow store.
//!
//! # Responsibility
//! - Define canonical records for notes, AI conversation messages, app
//!   settings and per-note edit history.
//! - Keep validation/normalization rules next to the data they guard.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Timestamps are Unix epoch milliseconds.

pub mod conversation;
pub mod history;
pub mod note;
pub mod settings;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns current wall-clock time in epoch milliseconds.
///
/// Falls back to `0` if the system clock is before the Unix epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
