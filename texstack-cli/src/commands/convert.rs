//! Convert command - assemble a container from images.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use texstack::config::ConfigFile;
use texstack::{Assembler, CodecRegistry, Container, LocalFileStore};
use tracing::debug;

use super::common::{default_container_path, format_size, FlagArgs};
use crate::error::CliError;

/// Arguments for the convert command.
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input images; one path discovers its siblings when the layout needs them
    #[arg(required = true, value_name = "IMAGE")]
    pub inputs: Vec<PathBuf>,

    /// Output container (defaults to the first input with a .txsk extension)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Treat the input as a container and append a re-encoded format to it
    #[arg(long, conflicts_with_all = ["texture_type", "array"])]
    pub append: bool,

    #[command(flatten)]
    pub flags: FlagArgs,
}

/// Run the convert command.
pub fn run(args: ConvertArgs, config: &ConfigFile) -> Result<(), CliError> {
    let flags = args.flags.resolve(config);
    debug!(flags = flags.bits(), "Resolved conversion flags");

    let store = Arc::new(LocalFileStore::new());
    let assembler = Assembler::new(CodecRegistry::with_defaults(), store.clone());
    let first = &args.inputs[0];

    let container = if args.append {
        if args.inputs.len() != 1 {
            return Err(CliError::Config(
                "--append takes exactly one container".to_string(),
            ));
        }
        let source = Container::load(first, store.as_ref())?;
        assembler.append_format(&source, &flags)?
    } else if args.inputs.len() == 1 {
        assembler.convert_path(first, &flags)?
    } else {
        assembler.convert_paths(&args.inputs, &flags)?
    };

    let output = args
        .output
        .unwrap_or_else(|| default_container_path(first));
    container.save(&output, store.as_ref())?;

    let info = container.info();
    println!("Wrote {}", output.display());
    println!(
        "  {} {}×{}, depth {}, {} layers, {} mips",
        info.texture_type, info.width, info.height, info.depth, info.layers, info.mips
    );
    println!("  Formats: {}", info.formats.join(", "));
    println!("  Data:    {}", format_size(info.data_bytes));
    Ok(())
}
