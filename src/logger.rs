//! env_logger initialization.

use log::LevelFilter;

/// Initialize the logger with the specified level.
///
/// `RUST_LOG` still overrides the CLI level, so one-off debugging does
/// not require retyping the full command line.
pub fn init_logger(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
