//! Info command - describe a container file.

use std::path::PathBuf;

use clap::Args;
use texstack::{Container, LocalFileStore};

use super::common::format_size;
use crate::error::CliError;

/// Arguments for the info command.
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Container file to describe
    #[arg(value_name = "CONTAINER")]
    pub container: PathBuf,

    /// Print the header as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> Result<(), CliError> {
    let container = Container::load(&args.container, &LocalFileStore::new())?;
    let info = container.info();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Container: {}", args.container.display());
    println!("  Type:    {}", info.texture_type);
    println!("  Size:    {}×{}", info.width, info.height);
    println!("  Depth:   {}", info.depth);
    println!("  Layers:  {}", info.layers);
    println!("  Mips:    {}", info.mips);
    println!(
        "  Memory:  {}{}{}{}",
        if info.memory_shared { "shared" } else { "local" },
        if info.memory_prefer { " (preferred)" } else { "" },
        if info.cpu_write { ", cpu write" } else { "" },
        if info.gpu_write { ", gpu write" } else { "" },
    );
    println!("  Data:    {}", format_size(info.data_bytes));
    println!("  Formats:");
    for (i, name) in info.formats.iter().enumerate() {
        println!("    [{}] {}", i, name);
    }
    Ok(())
}
