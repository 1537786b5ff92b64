//! Browser console logger for WASM hosts.
//!
//! Native hosts install whatever `log` backend they like.

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use web_sys::console;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        match record.level() {
            Level::Error | Level::Warn => console::warn_1(&line.into()),
            _ => console::log_1(&line.into()),
        }
    }

    fn flush(&self) {}
}

/// Route `log` records to the browser console. Fails if a logger is already set.
pub fn init_console_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
