//! Logger setup for the `repo-linker` binary.
//!
//! Logs go to `./repo_linker.log` by default; `--verbose` mirrors them to stderr
//! so they do not interleave with the progress lines on stdout.

use std::fs::OpenOptions;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Destination for log output.
pub enum LogDestination<'a> {
    File(&'a Path),
    Terminal,
    Both(&'a Path),
    Off,
}

impl<'a> LogDestination<'a> {
    pub fn choose(file: Option<&'a Path>, verbose: bool) -> Self {
        match (file, verbose) {
            (Some(path), true) => LogDestination::Both(path),
            (Some(path), false) => LogDestination::File(path),
            (None, true) => LogDestination::Terminal,
            (None, false) => LogDestination::Off,
        }
    }
}

pub fn initialize(destination: LogDestination<'_>, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::Off => return,
        LogDestination::File(path) => match create_file_logger(path, level, config) {
            Some(file_logger) => vec![file_logger],
            None => return,
        },
        LogDestination::Terminal => vec![terminal_logger(level, config)],
        LogDestination::Both(path) => {
            let mut loggers = vec![terminal_logger(level, config.clone())];
            if let Some(file_logger) = create_file_logger(path, level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<dyn SharedLogger> {
    TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

fn create_file_logger(path: &Path, level: LevelFilter, config: Config) -> Option<Box<dyn SharedLogger>> {
    // Append so earlier runs stay available for troubleshooting.
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not open log file at {:?}: {}", path, err);
            None
        }
    }
}
