//! Shared utilities for dailyread: logging setup, tracing spans and
//! duration formatting.

pub mod logging;
pub mod spans;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use time::format_duration;
