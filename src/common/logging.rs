use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Initialize the logging system with timestamp, level, and message formatting.
///
/// Format: `[HH:MM:SS] [LEVEL] message`. `default_level` applies unless
/// `RUST_LOG` says otherwise.
pub fn init_logger(default_level: LevelFilter) {
    Builder::from_env(Env::default().default_filter_or(default_level.to_string()))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}
