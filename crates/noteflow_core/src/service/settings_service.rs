//! Settings use-case service.

use crate::model::settings::{AppSettings, SettingsPatch, SettingsValidationError};
use crate::repo::settings_repo::SettingsRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for settings use-cases.
#[derive(Debug)]
pub enum SettingsError {
    Validation(SettingsValidationError),
    Repo(RepoError),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<SettingsValidationError> for SettingsError {
    fn from(value: SettingsValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for SettingsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Settings facade.
pub struct SettingsService<R: SettingsRepository> {
    repo: R,
}

impl<R: SettingsRepository> SettingsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads current settings (defaults for never-saved keys).
    pub fn get(&self) -> Result<AppSettings, SettingsError> {
        self.repo.load_settings().map_err(Into::into)
    }

    /// Merges `patch` into stored settings, validates and persists.
    ///
    /// Nothing is written when validation fails.
    pub fn update(&self, patch: &SettingsPatch) -> Result<AppSettings, SettingsError> {
        let merged = self.repo.load_settings()?.merged(patch);
        merged.validate()?;
        self.repo.save_settings(&merged)?;
        info!(
            "event=settings_update module=settings_service status=ok theme={} has_api_key={}",
            merged.theme.as_str(),
            !merged.api_key.is_empty()
        );
        Ok(merged)
    }
}
