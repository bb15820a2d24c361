use std::fmt::Arguments;
use std::fs::{create_dir_all, metadata, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use once_cell::sync::Lazy;

/// Log file is truncated once it grows past this size (5 MB)
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum LogLevel {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl LogLevel {
    fn tag(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERR",
            LogLevel::Warn => "WRN",
            LogLevel::Info => "INF",
            LogLevel::Debug => "DBG",
        }
    }
}

pub struct Config {
    pub level: LogLevel,
    /// Nothing is written until a path is set
    pub path: Option<PathBuf>,
}

pub static GLOBAL_CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| {
    Mutex::new(Config {
        level: LogLevel::Info,
        path: None,
    })
});

/// Start writing log lines to `path`. The terminal is never written to since the TUI owns it.
pub fn init(path: impl AsRef<Path>, verbose: bool) {
    if let Ok(mut config) = GLOBAL_CONFIG.lock() {
        config.path = Some(path.as_ref().to_path_buf());
        config.level = if verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };
    }
}

pub fn set_log_level(level: LogLevel) {
    if let Ok(mut config) = GLOBAL_CONFIG.lock() {
        config.level = level;
    }
}

pub fn format_line(level: LogLevel, scope: &str, args: Arguments) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{}][{}][{}] {}", timestamp, level.tag(), scope, args)
}

pub fn log_message(level: LogLevel, scope: &str, args: Arguments) {
    let Ok(config) = GLOBAL_CONFIG.lock() else {
        return;
    };

    if level > config.level {
        return;
    }
    let Some(path) = config.path.as_ref() else {
        return;
    };

    // a broken log file must never take the typing test down with it
    let _ = write_line(path, &format_line(level, scope, args));
}

fn write_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let too_big = metadata(path)
        .map(|meta| meta.len() >= MAX_LOG_SIZE)
        .unwrap_or(false);

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(!too_big)
        .truncate(too_big)
        .open(path)?;

    writeln!(file, "{}", line)
}

#[macro_export]
macro_rules! tq_log {
    ($level:expr, $scope:expr, $($arg:tt)*) => {
        $crate::log::log_message($level, $scope, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! tq_info {
    ($scope:expr, $($arg:tt)*) => { $crate::tq_log!($crate::log::LogLevel::Info, $scope, $($arg)*) };
}

#[macro_export]
macro_rules! tq_warn {
    ($scope:expr, $($arg:tt)*) => { $crate::tq_log!($crate::log::LogLevel::Warn, $scope, $($arg)*) };
}

#[macro_export]
macro_rules! tq_error {
    ($scope:expr, $($arg:tt)*) => { $crate::tq_log!($crate::log::LogLevel::Error, $scope, $($arg)*) };
}

#[macro_export]
macro_rules! tq_debug {
    ($scope:expr, $($arg:tt)*) => { $crate::tq_log!($crate::log::LogLevel::Debug, $scope, $($arg)*) };
}
