use env_logger::{Builder, Env};
use log::info;
use std::io::Write;

/// Colored single-line logger. `RUST_LOG` overrides the default level, which
/// is `debug` outside production and `info` in it.
pub fn setup_logger(production: bool) {
    let default_level = if production { "info" } else { "debug" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));

    builder.format(move |buf, record| {
        let level_color = match record.level() {
            log::Level::Error => "\x1B[1;31m", // Bold Red
            log::Level::Warn => "\x1B[1;33m",  // Bold Yellow
            log::Level::Info => "\x1B[1;32m",  // Bold Green
            log::Level::Debug => "\x1B[1;36m", // Bold Cyan
            log::Level::Trace => "\x1B[1;35m", // Bold Magenta
        };
        let reset = "\x1B[0m";

        writeln!(
            buf,
            "[{}] {}{}{} [{}:{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            level_color,
            record.level(),
            reset,
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0),
            record.args()
        )
    });

    // A second call (tests, embedding) keeps the first logger.
    if builder.try_init().is_ok() {
        info!("Logger initialized (default level {})", default_level);
    }
}
