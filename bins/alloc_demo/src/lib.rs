//! Shared setup of the allocator demo programs
use demo_log::StderrLogger;
use log::Level;
use std::sync::OnceLock;

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger with the level taken from `ALLOC_DEMO_LOG` (default `info`).
pub fn init_logging() {
    let logger = LOGGER.get_or_init(|| StderrLogger::from_env("ALLOC_DEMO_LOG", Level::Info));
    if logger.install().is_err() {
        eprintln!("a logger was already installed");
    }
}
