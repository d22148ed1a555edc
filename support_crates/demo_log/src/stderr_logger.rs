//! A logging implementation which writes every record to stderr
use std::io::Write;

use log::{Level, Log, Metadata, Record, SetLoggerError};

pub struct StderrLogger {
    pub initial_log_level: Level,
}

impl StderrLogger {
    pub const fn new(max_log_level: Level) -> StderrLogger {
        StderrLogger {
            initial_log_level: max_log_level,
        }
    }

    /// Create a logger whose level is read from the environment variable `var`, falling back to `default`.
    pub fn from_env(var: &str, default: Level) -> StderrLogger {
        let level = std::env::var(var)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(default);
        StderrLogger::new(level)
    }

    pub fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self).map(|_| log::set_max_level(self.initial_log_level.to_level_filter()))
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let level_moji = match record.level() {
                Level::Error => "❌",
                Level::Warn => "⚠️",
                Level::Info => "ℹ️",
                Level::Debug => "🛠️",
                Level::Trace => "👣",
            };
            // write errors are ignored
            let _ = writeln!(
                std::io::stderr().lock(),
                "{}  {}: {}",
                level_moji,
                record.target(),
                record.args(),
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::StderrLogger;
    use log::Level;

    #[test]
    fn level_falls_back_to_default() {
        let logger = StderrLogger::from_env("DEMO_LOG_TEST_UNSET_VARIABLE", Level::Warn);
        assert_eq!(logger.initial_log_level, Level::Warn);
    }
}
