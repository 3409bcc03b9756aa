//! Logging collaborator.
//!
//! The dispatcher logs through the [`Logger`] trait so tests can capture entries.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Sink for log entries.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// Appends timestamped entries to a file, or to stderr when no file is set.
pub struct FileLogger {
    log_path: Option<PathBuf>,
    min_level: Level,
}

impl FileLogger {
    /// Logs to `log_path`; debug entries are kept only when `debug` is set.
    pub fn new(log_path: Option<PathBuf>, debug: bool) -> Self {
        Self {
            log_path,
            min_level: if debug { Level::Debug } else { Level::Info },
        }
    }

    fn format_line(level: Level, message: &str) -> String {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        format!("[{}] {} {}", timestamp, level, message)
    }
}

impl Logger for FileLogger {
    fn log(&self, level: Level, message: &str) {
        if level < self.min_level {
            return;
        }

        let line = Self::format_line(level, message);
        match &self.log_path {
            Some(path) => {
                if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                    let _ = writeln!(file, "{}", line);
                }
            }
            None => eprintln!("{}", line),
        }
    }
}

/// Logger that keeps entries in memory.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryLogger {
    pub entries: std::sync::Mutex<Vec<(Level, String)>>,
}

#[cfg(test)]
impl MemoryLogger {
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

#[cfg(test)]
impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}
