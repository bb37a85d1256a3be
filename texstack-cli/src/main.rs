//! texstack command-line interface.
//!
//! Assembles texture containers from image files, describes them, and
//! exports their subresources back to common image formats.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use texstack::config::ConfigFile;
use texstack::logging::init_logging;
use tracing::warn;

use commands::config::ConfigCommands;
use commands::convert::ConvertArgs;
use commands::export::ExportArgs;
use commands::info::InfoArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "texstack")]
#[command(author, version, about = "Texture container assembly and export", long_about = None)]
struct Cli {
    /// Log at debug level regardless of config.ini
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble images into a container
    Convert(ConvertArgs),

    /// Write a container's subresources as image files
    Export(ExportArgs),

    /// Describe a container
    Info(InfoArgs),

    /// View or edit config.ini
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let (config, load_error) = match ConfigFile::load() {
        Ok(config) => (config, None),
        Err(e) => (ConfigFile::default(), Some(e)),
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let _guard = init_logging(level, config.logging.file.as_deref())?;
    if let Some(e) = load_error {
        warn!(error = %e, "Using default settings");
    }

    match cli.command {
        Commands::Convert(args) => commands::convert::run(args, &config),
        Commands::Export(args) => commands::export::run(args, &config),
        Commands::Info(args) => commands::info::run(args),
        Commands::Config { command } => commands::config::run(command, config),
    }
}
