//! Process-wide file logging.
//!
//! [`init_logging`] starts one rolling `flexi_logger` backend per process;
//! warnings and errors are mirrored to stderr. Calling it again with the same
//! level and directory is a no-op, anything else is a [`LoggingError::Conflict`].
//!
//! Log lines carry metadata only (`event=... module=... status=...`). Note
//! bodies and API keys never reach the log; upstream text goes through
//! [`sanitize_log_value`] first.

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Once;

const LOG_BASENAME: &str = "noteflow";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: Once = Once::new();

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogConfig {
    level: LevelFilter,
    dir: PathBuf,
}

impl Display for LogConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in `{}`", level_name(self.level), self.dir.display())
    }
}

struct ActiveLogger {
    config: LogConfig,
    _handle: LoggerHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    InvalidDirectory(String),
    /// Logging already runs with another level or directory.
    Conflict { active: String, requested: String },
    Backend(String),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unknown log level `{level}` (use trace, debug, info, warn or error)"
            ),
            Self::InvalidDirectory(message) => write!(f, "bad log directory: {message}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already active as {active}; cannot switch to {requested}"
            ),
            Self::Backend(message) => write!(f, "logger backend failed: {message}"),
        }
    }
}

impl Error for LoggingError {}

/// Starts file logging at `level` under the absolute directory `log_dir`.
///
/// Never panics. Safe to call from several places with the same arguments.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<(), LoggingError> {
    let requested = LogConfig {
        level: parse_level(level)?,
        dir: checked_dir(log_dir)?,
    };

    let active = ACTIVE.get_or_try_init(|| start_backend(requested.clone()))?;
    if active.config != requested {
        return Err(LoggingError::Conflict {
            active: active.config.to_string(),
            requested: requested.to_string(),
        });
    }
    Ok(())
}

/// Active `(level, directory)`, if logging has been started.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (level_name(active.config.level), active.config.dir.clone()))
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Puts `value` on one line and caps it at `max_chars` characters, marking
/// truncation with `...`.
pub fn sanitize_log_value(value: &str, max_chars: usize) -> String {
    let mut chars = value
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c });
    let mut out: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        out.push_str("...");
    }
    out
}

fn start_backend(config: LogConfig) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&config.dir).map_err(|err| {
        LoggingError::InvalidDirectory(format!("`{}`: {err}", config.dir.display()))
    })?;

    let handle = Logger::try_with_str(level_name(config.level))
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(config.dir.as_path())
                .basename(LOG_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    PANIC_HOOK.call_once(install_panic_hook);

    info!(
        "event=app_start module=core status=ok os={} debug_build={} version={}",
        std::env::consts::OS,
        cfg!(debug_assertions),
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "event=logging_init module=core status=ok level={} log_dir={}",
        level_name(config.level),
        config.dir.display()
    );

    Ok(ActiveLogger {
        config,
        _handle: handle,
    })
}

fn parse_level(raw: &str) -> Result<LevelFilter, LoggingError> {
    let trimmed = raw.trim();
    let candidate = if trimmed.eq_ignore_ascii_case("warning") {
        "warn"
    } else {
        trimmed
    };
    match LevelFilter::from_str(candidate) {
        Ok(LevelFilter::Off) | Err(_) => Err(LoggingError::UnsupportedLevel(trimmed.to_string())),
        Ok(level) => Ok(level),
    }
}

fn level_name(level: LevelFilter) -> &'static str {
    match level {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}

fn checked_dir(dir: &Path) -> Result<PathBuf, LoggingError> {
    if dir.as_os_str().is_empty() {
        return Err(LoggingError::InvalidDirectory("path is empty".to_string()));
    }
    if dir.is_relative() {
        return Err(LoggingError::InvalidDirectory(format!(
            "`{}` is not absolute",
            dir.display()
        )));
    }
    Ok(dir.to_path_buf())
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |at| format!("{}:{}", at.file(), at.line()));
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            panic_message(info)
        );
        previous(info);
    }));
}

// Payloads can quote note text, so they are capped like any other value.
fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    sanitize_log_value(text, PANIC_PAYLOAD_CHARS)
}

#[cfg(test)]
mod tests {
    use super::{
        checked_dir, init_logging, logging_status, parse_level, sanitize_log_value, LoggingError,
    };
    use log::LevelFilter;
    use std::path::Path;

    #[test]
    fn levels_are_case_insensitive_and_accept_warning() {
        assert_eq!(parse_level("INFO"), Ok(LevelFilter::Info));
        assert_eq!(parse_level(" warning "), Ok(LevelFilter::Warn));
        assert_eq!(
            parse_level("verbose"),
            Err(LoggingError::UnsupportedLevel("verbose".to_string()))
        );
        assert!(parse_level("off").is_err());
    }

    #[test]
    fn log_dir_must_be_absolute() {
        let error = checked_dir(Path::new("logs/dev")).unwrap_err();
        assert!(error.to_string().contains("not absolute"));
        assert!(checked_dir(Path::new("")).is_err());
    }

    #[test]
    fn sanitize_flattens_and_truncates() {
        assert_eq!(sanitize_log_value("line1\nline2\rline3", 8), "line1 li...");
        assert_eq!(sanitize_log_value("short", 8), "short");
        assert_eq!(sanitize_log_value("exactly8", 8), "exactly8");
    }

    #[test]
    fn second_init_must_match_first() {
        let log_dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();

        init_logging("info", log_dir.path()).unwrap();
        init_logging("INFO", log_dir.path()).unwrap();

        let level_error = init_logging("debug", log_dir.path()).unwrap_err();
        assert!(matches!(level_error, LoggingError::Conflict { .. }));
        let dir_error = init_logging("info", other_dir.path()).unwrap_err();
        assert!(dir_error.to_string().contains("cannot switch"));

        let (level, dir) = logging_status().unwrap();
        assert_eq!(level, "info");
        assert_eq!(dir, log_dir.path());
    }
}
