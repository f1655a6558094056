mod cli;
mod logging;
mod reporter;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, SyncArgs, UniqCopierArgs};
use dotenv::dotenv;
use podsync::locate::{PodcastTimeLocator, SourceLocator};
use podsync::{AppConfig, CopierConfig, LocalFs, SyncConfig, SyncEngine, UniqCopier};
use reporter::CliReporter;
use std::io::{self, Write};
use std::process;
use tracing::{error, info, warn};

const EXIT_FATAL: i32 = 1;
const EXIT_FILE_ERRORS: i32 = 2;

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();
    let code = run();

    // process::exit skips destructors; flush the log file first.
    drop(guard);
    if code != 0 {
        process::exit(code);
    }
}

fn run() -> i32 {
    let config = match podsync::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return EXIT_FATAL;
        }
    };

    let args = Cli::parse();

    let outcome = match args.command {
        Some(Commands::Sync(args)) => run_sync(&config, args),
        Some(Commands::UniqCopier(args)) => run_uniq_copier(&config, args),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            println!("State file: {}", config.resolved_state_path().display());
            Ok(true)
        }
        None => print_help(&mut io::stdout()),
    };

    match outcome {
        Ok(true) => 0,
        Ok(false) => EXIT_FILE_ERRORS,
        Err(err) => {
            error!("Error: {:#}", err);
            EXIT_FATAL
        }
    }
}

fn print_help(out: &mut impl Write) -> Result<bool> {
    let help = Cli::command().render_long_help();
    writeln!(out, "{}", help).context("printing help")?;
    Ok(true)
}

/// Returns false when `--strict` is set and some file failed.
fn run_sync(config: &AppConfig, args: SyncArgs) -> Result<bool> {
    let source_dirs = match args.src {
        Some(src) => vec![src],
        None => {
            info!("Searching for the Podcast Time app's directory...");
            PodcastTimeLocator::from_env(&config.app_dir_marker)
                .locate()
                .context("locating the source directory")?
        }
    };

    let sync_config = SyncConfig {
        source_dirs,
        dest_dir: args.dest,
        state_path: args.state.unwrap_or_else(|| config.resolved_state_path()),
        extension: config.extension.clone(),
        ignore_patterns: config.ignore_patterns.clone(),
        dry_run: args.dry_run,
    };
    info!("Using run state {}", sync_config.state_path.display());

    let reporter = CliReporter::new();
    let report = SyncEngine::new(sync_config).run(&LocalFs, &reporter)?;

    for failure in &report.failures {
        warn!("Will retry next run: {}", failure);
    }
    Ok(!(args.strict && report.has_failures()))
}

fn run_uniq_copier(config: &AppConfig, args: UniqCopierArgs) -> Result<bool> {
    let copier_config = CopierConfig {
        src_dir: args.src,
        dest_dir: args.dest,
        extension: config.extension.clone(),
        ignore_patterns: config.ignore_patterns.clone(),
        print_dest_files: args.print_dest_files,
        print_dupe_notifications: args.print_dupe_notifications,
        print_new_files: !args.do_not_print_new_files_in_src_dir,
        dry_run: args.dry_run,
    };

    let reporter = CliReporter::new();
    let report = UniqCopier::new(copier_config).run(&LocalFs, &reporter)?;

    for failure in &report.failures {
        warn!("Not copied: {}", failure);
    }
    Ok(!(args.strict && report.has_failures()))
}
