//! Log output: logger setup, separators and diagnostic line formatting.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local};
use log::{LevelFilter, debug, error};
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};
use std::fmt::Display;
use std::path::{Path, PathBuf};

pub const LOG_FILE: &str = "wemo_setup.log";

/// Width taken by the `[LEVEL   ] ` prefix of each console line.
const PREFIX_WIDTH: usize = 11;
const DEFAULT_COLUMNS: usize = 80;

/// Sets up console logging for the given `-v` count.
///
/// - 0: info
/// - 1: debug for this crate, HTTP client chatter held at warn
/// - 2: debug everywhere
/// - 3+: as 2, and the log is also written to [`LOG_FILE`]
///
/// Also logs the startup environment at debug level.
///
/// # Returns
/// The log file path when one is written.
///
/// # Errors
/// Fails when the log file cannot be created or a logger is already set.
pub fn init_logger(verbose: u8) -> Result<Option<PathBuf>> {
    let level = if verbose == 0 {
        LevelFilter::Info
    } else {
        LevelFilter::Debug
    };

    let console = ConsoleAppender::builder()
        .target(Target::Stdout)
        .encoder(Box::new(PatternEncoder::new("{h([{l:<8}])} {m}{n}")))
        .build();

    let mut builder = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(console)));
    let mut root = Root::builder().appender("stdout");

    if verbose == 1 {
        builder = builder.logger(Logger::builder().build("ureq", LevelFilter::Warn));
    }

    let mut log_file = None;
    if verbose >= 3 {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("[{l:<8}] {m}{n}")))
            .append(false)
            .build(LOG_FILE)
            .with_context(|| format!("Failed to open log file: {}", LOG_FILE))?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
        log_file = Some(PathBuf::from(LOG_FILE));
    }

    let config = builder
        .build(root.build(level))
        .map_err(|e| anyhow!("Invalid logger configuration: {}", e))?;
    log4rs::init_config(config).context("Failed to initialize logger")?;

    log_environment(log_file.as_deref());
    Ok(log_file)
}

fn log_environment(log_file: Option<&Path>) {
    for line in environment_lines(chrono::Local::now(), log_file) {
        debug!("{}", line);
    }
}

/// Startup lines recorded at debug level: start time, version, platform,
/// working directory and log file.
fn environment_lines(started: DateTime<Local>, log_file: Option<&Path>) -> Vec<String> {
    let mut lines = vec![
        format!("logging started:  {}", started.format("%Y-%m-%d %H:%M:%S%.6f%:z")),
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        format!(
            "platform:  {} {} ({})",
            std::env::consts::OS,
            std::env::consts::ARCH,
            std::env::consts::FAMILY
        ),
    ];
    if let Ok(cwd) = std::env::current_dir() {
        lines.push(format!("current directory:  {}", cwd.display()));
    }
    if let Some(path) = log_file {
        let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        lines.push(format!("logging to file:  {}", resolved.display()));
    }
    lines
}

/// Dashes filling the terminal line after the level prefix.
pub fn separator() -> String {
    let columns = terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .unwrap_or(DEFAULT_COLUMNS);
    separator_for(columns)
}

/// Separator for a terminal `columns` wide.
pub fn separator_for(columns: usize) -> String {
    "-".repeat(columns.saturating_sub(PREFIX_WIDTH))
}

/// One diagnostic line, with the call name right-aligned.
pub fn result_line(name: &str, value: &dyn Display) -> String {
    format!("    {:>60}: {}", name, value)
}

/// Logs a command-ending failure.
pub fn critical(err: &dyn Display) {
    error!("CRITICAL: {}", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_environment_lines_start_with_local_time() {
        let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let lines = environment_lines(started, Some(Path::new(LOG_FILE)));

        assert!(lines[0].starts_with("logging started:  2024-03-09 14:05:07.000000"));
        assert_eq!(lines[1], format!("wemo-setup {}", env!("CARGO_PKG_VERSION")));
        assert!(lines[2].starts_with(&format!("platform:  {}", std::env::consts::OS)));
        assert!(lines.last().unwrap().starts_with("logging to file:  "));
        assert!(lines.last().unwrap().ends_with(LOG_FILE));
    }

    #[test]
    fn test_separator_width() {
        assert_eq!(separator_for(91), "-".repeat(80));
        assert_eq!(separator_for(5), "");
    }

    #[test]
    fn test_result_line_alignment() {
        let line = result_line("basicevent.GetFriendlyName[FriendlyName]", &"Lamp");
        assert!(line.starts_with("    "));
        assert!(line.ends_with(": Lamp"));
        assert_eq!(line.find(':').unwrap(), 4 + 60);
    }
}
