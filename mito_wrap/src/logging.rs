use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Log to stderr as `<time> [<LEVEL>] - <message>`. Does nothing if a logger
/// is already installed.
pub fn init_logging(level: LevelFilter) {
    let _ = Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .try_init();
}
