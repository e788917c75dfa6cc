//! Session log file.
//!
//! Each launch truncates the previous session's log, so the file never holds
//! more than one run. Because of that, lines are stamped with seconds elapsed
//! since startup rather than wall-clock time; relative timestamps are what a
//! single-session trace is read with anyway.
//!
//! The file lives under the platform data directory (resolved with
//! `dirs-next`), e.g. `~/.local/share/BlendLab/session.log` on Linux. Call
//! the `log_info!` / `log_warn!` / `log_err!` macros from anywhere in the
//! crate; before `init` runs (and after a failed `init`) they are no-ops.

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

static LOGGER: OnceLock<Logger> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

struct Logger {
    file: Mutex<File>,
    started: Instant,
}

/// Append one stamped line to the session log.
///
/// Swallows I/O errors: logging must never take the application down.
pub fn log(level: Level, args: fmt::Arguments<'_>) {
    let Some(logger) = LOGGER.get() else {
        return;
    };
    let elapsed = logger.started.elapsed().as_secs_f64();
    if let Ok(mut file) = logger.file.lock() {
        let _ = writeln!(file, "[+{:9.3}s] {:5} {}", elapsed, level.tag(), args);
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Error, format_args!($($arg)*))
    };
}

/// Set up the session log. Call once at startup.
///
/// A log directory or file that cannot be created disables logging for the
/// run instead of aborting it. On success, panics are also hooked so their
/// messages land in the log before the default handler runs.
pub fn init() {
    let dir = dirs_next::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("BlendLab");
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("session log disabled, cannot create {}: {}", dir.display(), e);
        return;
    }

    let path = dir.join("session.log");
    // File::create truncates the previous session's log
    let file = match File::create(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("session log disabled, cannot open {}: {}", path.display(), e);
            return;
        }
    };

    let _ = LOGGER.set(Logger {
        file: Mutex::new(file),
        started: Instant::now(),
    });
    log_info!("BlendLab session started, log at {}", path.display());

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log(Level::Error, format_args!("panic: {}", info));
        default_hook(info);
    }));
}
