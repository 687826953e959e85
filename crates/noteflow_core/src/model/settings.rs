//! Application settings model.
//!
//! # Invariants
//! - Missing persisted keys fall back to `AppSettings::default()`.
//! - `font_size` and `line_height` stay inside the validated ranges.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const FONT_SIZE_MIN: u32 = 8;
pub const FONT_SIZE_MAX: u32 = 72;
pub const LINE_HEIGHT_MIN_EXCLUSIVE: f64 = 0.5;
pub const LINE_HEIGHT_MAX: f64 = 4.0;

/// UI color theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// Flat user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Key forwarded to the hosted AI service. Empty means "use server default".
    pub api_key: String,
    pub theme: Theme,
    pub font_size: u32,
    pub line_height: f64,
    pub show_welcome: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            theme: Theme::System,
            font_size: 16,
            line_height: 1.6,
            show_welcome: true,
        }
    }
}

/// Partial settings update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub line_height: Option<f64>,
    #[serde(default)]
    pub show_welcome: Option<bool>,
}

/// Settings value rejected by validation.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsValidationError {
    FontSizeOutOfRange(u32),
    LineHeightOutOfRange(f64),
}

impl Display for SettingsValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FontSizeOutOfRange(value) => write!(
                f,
                "font size {value} is outside {FONT_SIZE_MIN}..={FONT_SIZE_MAX}"
            ),
            Self::LineHeightOutOfRange(value) => write!(
                f,
                "line height {value} is outside ({LINE_HEIGHT_MIN_EXCLUSIVE}, {LINE_HEIGHT_MAX}]"
            ),
        }
    }
}

impl Error for SettingsValidationError {}

impl AppSettings {
    /// Returns a copy with `patch` merged on top.
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        Self {
            api_key: patch
                .api_key
                .as_ref()
                .map(|value| value.trim().to_string())
                .unwrap_or_else(|| self.api_key.clone()),
            theme: patch.theme.unwrap_or(self.theme),
            font_size: patch.font_size.unwrap_or(self.font_size),
            line_height: patch.line_height.unwrap_or(self.line_height),
            show_welcome: patch.show_welcome.unwrap_or(self.show_welcome),
        }
    }

    /// Validates numeric display settings.
    pub fn validate(&self) -> Result<(), SettingsValidationError> {
        if !(FONT_SIZE_MIN..=FONT_SIZE_MAX).contains(&self.font_size) {
            return Err(SettingsValidationError::FontSizeOutOfRange(self.font_size));
        }
        if !self.line_height.is_finite()
            || self.line_height <= LINE_HEIGHT_MIN_EXCLUSIVE
            || self.line_height > LINE_HEIGHT_MAX
        {
            return Err(SettingsValidationError::LineHeightOutOfRange(
                self.line_height,
            ));
        }
        Ok(())
    }
}
