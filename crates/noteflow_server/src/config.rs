//! Server configuration.
//!
//! Every option can come from a flag or a `NOTEFLOW_*` environment variable.
//! Paths left unset resolve under the platform data directory.

use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR_NAME: &str = "noteflow";
const DB_FILE_NAME: &str = "noteflow.sqlite3";
const LOG_DIR_NAME: &str = "logs";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_AI_BASE_URL: &str = "http://127.0.0.1:8000/v1";
pub const DEFAULT_CHAT_MODEL: &str = "glm-4.5";
pub const DEFAULT_VISION_MODEL: &str = "glm-4.5v";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Parser)]
#[command(name = "noteflow", version, about = "NoteFlow note store and AI gateway")]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    #[arg(long, env = "NOTEFLOW_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// SQLite database file.
    #[arg(long, env = "NOTEFLOW_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Directory for rolling log files.
    #[arg(long, env = "NOTEFLOW_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// trace | debug | info | warn | error
    #[arg(long, env = "NOTEFLOW_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Base URL of the OpenAI-compatible AI service.
    #[arg(long, env = "NOTEFLOW_AI_BASE_URL", default_value = DEFAULT_AI_BASE_URL)]
    pub ai_base_url: String,

    /// Fallback API key used when neither the request nor stored settings
    /// carry one.
    #[arg(long, env = "NOTEFLOW_AI_API_KEY", hide_env_values = true)]
    pub ai_api_key: Option<String>,

    #[arg(long, env = "NOTEFLOW_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub chat_model: String,

    #[arg(long, env = "NOTEFLOW_VISION_MODEL", default_value = DEFAULT_VISION_MODEL)]
    pub vision_model: String,

    /// Per-request timeout for AI calls, in seconds.
    #[arg(long, env = "NOTEFLOW_AI_TIMEOUT_SECS", default_value_t = DEFAULT_AI_TIMEOUT_SECS)]
    pub ai_timeout_secs: u64,
}

impl ServerConfig {
    /// Database path, defaulting to `<data dir>/noteflow/noteflow.sqlite3`.
    pub fn resolved_db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => absolutize(path),
            None => app_data_dir().join(DB_FILE_NAME),
        }
    }

    /// Log directory, defaulting to `<data dir>/noteflow/logs`. Always
    /// absolute.
    pub fn resolved_log_dir(&self) -> PathBuf {
        match &self.log_dir {
            Some(path) => absolutize(path),
            None => app_data_dir().join(LOG_DIR_NAME),
        }
    }

    pub fn resolved_log_level(&self) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| noteflow_core::default_log_level().to_string())
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs.max(1))
    }

    /// Configured fallback key, ignoring blank values.
    pub fn fallback_api_key(&self) -> Option<&str> {
        self.ai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
