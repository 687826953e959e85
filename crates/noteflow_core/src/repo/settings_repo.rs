//! Key/value settings repository.
//!
//! # Invariants
//! - Each `AppSettings` field is stored under one fixed key.
//! - Missing keys load as the field's default.
//! - `save_settings` writes all keys in one transaction.

use super::{ensure_table_ready, RepoError, RepoResult};
use crate::model::settings::{AppSettings, Theme};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::HashMap;

const KEY_API_KEY: &str = "api_key";
const KEY_THEME: &str = "theme";
const KEY_FONT_SIZE: &str = "font_size";
const KEY_LINE_HEIGHT: &str = "line_height";
const KEY_SHOW_WELCOME: &str = "show_welcome";

/// Repository interface for application settings.
pub trait SettingsRepository {
    fn load_settings(&self) -> RepoResult<AppSettings>;
    fn save_settings(&self, settings: &AppSettings) -> RepoResult<()>;
}

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "settings", &["key", "value"])?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn load_settings(&self) -> RepoResult<AppSettings> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings;")?;
        let mut rows = stmt.query([])?;
        let mut values: HashMap<String, String> = HashMap::new();
        while let Some(row) = rows.next()? {
            values.insert(row.get(0)?, row.get(1)?);
        }

        let defaults = AppSettings::default();
        Ok(AppSettings {
            api_key: values.remove(KEY_API_KEY).unwrap_or(defaults.api_key),
            theme: match values.remove(KEY_THEME) {
                Some(text) => Theme::parse(&text).ok_or_else(|| {
                    RepoError::InvalidData(format!("invalid theme `{text}` in settings"))
                })?,
                None => defaults.theme,
            },
            font_size: parse_value(values.remove(KEY_FONT_SIZE), KEY_FONT_SIZE)?
                .unwrap_or(defaults.font_size),
            line_height: parse_value(values.remove(KEY_LINE_HEIGHT), KEY_LINE_HEIGHT)?
                .unwrap_or(defaults.line_height),
            show_welcome: parse_value(values.remove(KEY_SHOW_WELCOME), KEY_SHOW_WELCOME)?
                .unwrap_or(defaults.show_welcome),
        })
    }

    fn save_settings(&self, settings: &AppSettings) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let entries = [
            (KEY_API_KEY, settings.api_key.clone()),
            (KEY_THEME, settings.theme.as_str().to_string()),
            (KEY_FONT_SIZE, settings.font_size.to_string()),
            (KEY_LINE_HEIGHT, settings.line_height.to_string()),
            (KEY_SHOW_WELCOME, settings.show_welcome.to_string()),
        ];
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
) -> RepoResult<Option<T>> {
    value
        .map(|text| {
            text.parse::<T>().map_err(|_| {
                RepoError::InvalidData(format!("invalid value `{text}` for settings.{key}"))
            })
        })
        .transpose()
}
