//! Data access for notes, the AI conversation log and settings.
//!
//! Each repository borrows a migrated [`Connection`] and refuses to start on
//! one whose schema does not match this build.

pub mod conversation_repo;
pub mod note_repo;
pub mod settings_repo;

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::note::NoteId;
use rusqlite::Connection;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    /// A stored row cannot be mapped back to a model value.
    InvalidData(String),
    /// Connection is at a different schema version than this build.
    SchemaVersion { expected: u32, found: u32 },
    /// Table or column the repository needs is absent.
    SchemaMismatch(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "corrupt row: {message}"),
            Self::SchemaVersion { expected, found } => write!(
                f,
                "connection is at schema v{found}, repositories need v{expected}"
            ),
            Self::SchemaMismatch(message) => write!(f, "schema mismatch: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Checks the schema version, then that `table` carries every column in
/// `columns`.
pub(crate) fn ensure_table_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected = latest_version();
    let found = current_user_version(conn)?;
    if found != expected {
        return Err(RepoError::SchemaVersion { expected, found });
    }

    let present = column_names(conn, table)?;
    if present.is_empty() {
        return Err(RepoError::SchemaMismatch(format!("table `{table}` missing")));
    }
    if let Some(column) = columns.iter().find(|column| !present.contains(**column)) {
        return Err(RepoError::SchemaMismatch(format!(
            "column `{table}.{column}` missing"
        )));
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("{column} holds non-uuid `{value}`")))
}

/// Empty for a table that does not exist.
fn column_names(conn: &Connection, table: &str) -> RepoResult<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}
