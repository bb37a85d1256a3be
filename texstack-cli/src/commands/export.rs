//! Export command - write a container's subresources as image files.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use texstack::config::ConfigFile;
use texstack::{CodecRegistry, Container, ExternalFormatExporter, LocalFileStore};

use super::common::default_export_base;
use crate::error::CliError;

/// Arguments for the export command.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Container file to export
    #[arg(value_name = "CONTAINER")]
    pub container: PathBuf,

    /// Base path for the images; suffixes and extensions are appended
    #[arg(short, long, value_name = "BASE")]
    pub output: Option<PathBuf>,

    /// Encoding quality in (0, 1]; 1 selects lossless encodings
    #[arg(short, long)]
    pub quality: Option<f32>,
}

/// Run the export command.
pub fn run(args: ExportArgs, config: &ConfigFile) -> Result<(), CliError> {
    let quality = args.quality.unwrap_or(config.export.quality);
    if !(quality > 0.0 && quality <= 1.0) {
        return Err(CliError::Config(format!(
            "quality {} is outside (0, 1]",
            quality
        )));
    }

    let store = Arc::new(LocalFileStore::new());
    let container = Container::load(&args.container, store.as_ref())?;
    let base = args.output.unwrap_or_else(|| {
        default_export_base(&args.container, config.export.output_dir.as_deref())
    });

    let exporter = ExternalFormatExporter::new(CodecRegistry::with_defaults(), store);
    let unsupported = exporter.to_disk(&container, &base, quality);

    let exported = container.formats().len() - unsupported.len();
    println!(
        "Exported {} of {} formats to {}*",
        exported,
        container.formats().len(),
        base.display()
    );
    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(CliError::ExportIncomplete(
            unsupported.iter().map(|f| f.name()).collect(),
        ))
    }
}
