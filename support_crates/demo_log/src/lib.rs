//! A log implementation for the allocator demo programs
mod stderr_logger;

pub use stderr_logger::StderrLogger;
