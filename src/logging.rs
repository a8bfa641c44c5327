//! Logging setup for the fan profile application

use fern::Dispatch;
use log::LevelFilter;
use std::path::Path;

const LEVELS: [LevelFilter; 5] = [
    LevelFilter::Error,
    LevelFilter::Warn,
    LevelFilter::Info,
    LevelFilter::Debug,
    LevelFilter::Trace,
];

/// Level after raising `base` by one step per `-v`
pub fn level_for(verbosity: u8, base: LevelFilter) -> LevelFilter {
    let base = LEVELS.iter().position(|l| *l == base).unwrap_or(1);
    LEVELS[(base + verbosity as usize).min(LEVELS.len() - 1)]
}

/// Setup logging to stderr, and to `log_file` when given
pub fn setup(verbosity: u8, base: LevelFilter, log_file: Option<&Path>) -> Result<(), fern::InitError> {
    let mut dispatch = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level_for(verbosity, base))
        .chain(std::io::stderr());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}
