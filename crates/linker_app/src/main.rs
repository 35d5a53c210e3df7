use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use linker_logging::{linker_error, linker_info};
use log::LevelFilter;

mod cli;
mod commands;
mod config;
mod logging;
mod render;

use cli::{Cli, Commands, GlobalArgs};
use config::LinkerConfig;
use logging::LogDestination;

/// Usage and configuration problems; clap uses the same code for bad arguments.
const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            linker_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        // No config load: a broken config must not block writing a fresh one.
        Commands::InitConfig { path, force } => commands::init_config(path, force),
        Commands::Link(args) => commands::link(&setup(&cli.global)?, args),
        Commands::Check(args) => commands::check(&setup(&cli.global)?, args),
        Commands::Instructions { kind } => Ok(commands::instructions(kind.into())),
    }
}

/// Loads the config and starts logging according to it and the global flags.
fn setup(global: &GlobalArgs) -> Result<LinkerConfig> {
    let (config, source) = LinkerConfig::load(global.config.as_deref())?;
    let level = if global.verbose {
        LevelFilter::Debug
    } else {
        config.log.level_filter()?
    };
    let log_file = global.log_file.as_deref().or(config.log.file.as_deref());
    logging::initialize(LogDestination::choose(log_file, global.verbose), level);
    if let Some(source) = source {
        linker_info!("config loaded from {:?}", source);
    }
    Ok(config)
}
