mod config;
mod error;
mod format;
mod log;

pub use config::{FORMAT_ENV, LEVEL_ENV, LoggerConfig};
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInstalled`] when called twice in the same process.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = log::filter(&cfg.level)?;
    match cfg.format {
        LoggerFormat::Text => log::install_text(filter, cfg),
        LoggerFormat::Json => log::install_json(filter, cfg),
        LoggerFormat::Journald => log::install_journald(filter),
    }
}
