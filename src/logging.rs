use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize the logger with a format showing elapsed wall-clock time.
///
/// `verbosity` counts `-v` flags: 0 = warnings only, 1 = info, 2+ = debug.
/// Output format: `[  12.3s] LEVEL: message`, all on stderr so reports
/// written to stdout stay clean.
pub fn init_logger(verbosity: u8) {
    START_TIME.set(Instant::now()).ok();

    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format(|buf, record| {
            let elapsed = START_TIME.get().unwrap().elapsed();
            writeln!(
                buf,
                "[{:>7.1}s] {}: {}",
                elapsed.as_secs_f64(),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}
