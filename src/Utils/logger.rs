use chrono::Local;
use log::{LevelFilter, debug};
use simplelog::*;
use std::fs::File;

use crate::Utils::config::{ConfigError, LoggingConfig};

/// name of the log file for a run started now, log_<date>_<time>.txt
pub fn log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("log_{}.txt", date_and_time)
}

/// Installs the global logger: the terminal, and a log file when `log_to_file` is set.
/// A second call keeps the logger installed first.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let log_option: LevelFilter = config.level_filter()?;
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_option,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if config.log_to_file {
        let name = log_file_name();
        let file = File::create(&name).map_err(|source| ConfigError::Io {
            path: name.clone(),
            source,
        })?;
        loggers.push(WriteLogger::new(log_option, Config::default(), file));
    }
    let logger_instance = CombinedLogger::init(loggers);
    match logger_instance {
        Ok(()) => debug!("logging at level {}", log_option),
        Err(_) => debug!("logger already installed"),
    }
    Ok(())
}
