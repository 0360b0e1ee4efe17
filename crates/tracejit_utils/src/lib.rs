//! Shared helpers: logging setup and wall-clock timing.

pub mod logger;
pub mod timer;

pub use logger::init_logging;
pub use timer::Stopwatch;
