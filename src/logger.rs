use log::LevelFilter;
use env_logger::Builder;
use std::io::Write;
use chrono::Local;

/// Sets up the global logger. `RUST_LOG` still wins over `level` when set.
pub fn init(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .parse_default_env();

    if builder.try_init().is_err() {
        log::warn!("Logger was already initialized.");
        return;
    }

    log::debug!("Logger initialized at {}.", level);
}
