//! Argument types and helpers shared across commands.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use texstack::config::ConfigFile;
use texstack::{MipFilter, PrimitiveKind, TextureDimension, TextureFlags};

/// Extension used for container files.
pub const CONTAINER_EXTENSION: &str = "txsk";

/// Texture type selection.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TypeArg {
    #[value(name = "1d")]
    OneD,
    #[value(name = "2d")]
    TwoD,
    #[value(name = "3d")]
    ThreeD,
    Cube,
    /// Multisample layers
    Ms,
}

impl From<TypeArg> for TextureDimension {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::OneD => TextureDimension::OneD,
            TypeArg::TwoD => TextureDimension::TwoD,
            TypeArg::ThreeD => TextureDimension::ThreeD,
            TypeArg::Cube => TextureDimension::Cube,
            TypeArg::Ms => TextureDimension::Multisample,
        }
    }
}

/// Channel layout selection.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ChannelsArg {
    R,
    Rg,
    Rgb,
    Rgba,
}

impl ChannelsArg {
    fn count(self) -> u8 {
        match self {
            ChannelsArg::R => 1,
            ChannelsArg::Rg => 2,
            ChannelsArg::Rgb => 3,
            ChannelsArg::Rgba => 4,
        }
    }
}

/// Primitive kind selection.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PrimitiveArg {
    Uint,
    Sint,
    Unorm,
    Snorm,
    Float,
}

impl From<PrimitiveArg> for PrimitiveKind {
    fn from(arg: PrimitiveArg) -> Self {
        match arg {
            PrimitiveArg::Uint => PrimitiveKind::Uint,
            PrimitiveArg::Sint => PrimitiveKind::Sint,
            PrimitiveArg::Unorm => PrimitiveKind::Unorm,
            PrimitiveArg::Snorm => PrimitiveKind::Snorm,
            PrimitiveArg::Float => PrimitiveKind::Float,
        }
    }
}

/// Mip filter selection.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FilterArg {
    Linear,
    Nearest,
    Min,
    Max,
}

impl From<FilterArg> for MipFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Linear => MipFilter::Linear,
            FilterArg::Nearest => MipFilter::Nearest,
            FilterArg::Min => MipFilter::Min,
            FilterArg::Max => MipFilter::Max,
        }
    }
}

/// Format and layout options; unset options fall back to `config.ini`.
#[derive(Debug, Clone, Default, Args)]
pub struct FlagArgs {
    /// Texture type
    #[arg(long = "type", value_enum)]
    pub texture_type: Option<TypeArg>,

    /// Treat inputs as array slices
    #[arg(long)]
    pub array: bool,

    /// Channel layout (inherited from the source when unset)
    #[arg(long, value_enum)]
    pub channels: Option<ChannelsArg>,

    /// Primitive kind (inherited from the source when unset)
    #[arg(long, value_enum)]
    pub primitive: Option<PrimitiveArg>,

    /// Bits per channel (inherited from the source when unset)
    #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(["8", "16", "32", "64"]))]
    pub bits: Option<String>,

    /// Mark 8-bit RGB/RGBA data as sRGB
    #[arg(long)]
    pub srgb: bool,

    /// Generate a full mip chain
    #[arg(long, conflicts_with = "no_mips")]
    pub mips: bool,

    /// Don't generate mips; mip levels come from file names
    #[arg(long)]
    pub no_mips: bool,

    /// Mip generation filter
    #[arg(long, value_enum)]
    pub mip_filter: Option<FilterArg>,
}

impl FlagArgs {
    /// Layer CLI options over the configured flags.
    pub fn resolve(&self, config: &ConfigFile) -> TextureFlags {
        let mut flags = config.to_flags();
        if let Some(t) = self.texture_type {
            flags.dimension = t.into();
        }
        flags.array |= self.array;
        if let Some(c) = self.channels {
            flags.channels = Some(c.count());
        }
        if let Some(p) = self.primitive {
            flags.primitive = Some(p.into());
        }
        if let Some(bits) = self.bits.as_deref().and_then(|b| b.parse().ok()) {
            flags.bits = Some(bits);
        }
        flags.srgb |= self.srgb;
        if self.mips {
            flags.generate_mips = true;
        }
        if self.no_mips {
            flags.generate_mips = false;
        }
        if let Some(f) = self.mip_filter {
            flags.mip_filter = f.into();
        }
        flags
    }
}

/// `input` with its extension replaced by the container extension.
pub fn default_container_path(input: &Path) -> PathBuf {
    input.with_extension(CONTAINER_EXTENSION)
}

/// Export base path: `dir/stem` when an output directory is configured,
/// otherwise the container path without its extension.
pub fn default_export_base(container: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stripped = container.with_extension("");
    match (output_dir, stripped.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => stripped,
    }
}

/// Human-readable byte size.
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let mut config = ConfigFile::default();
        config.convert.channels = Some(4);
        config.convert.generate_mips = true;

        let args = FlagArgs {
            texture_type: Some(TypeArg::Cube),
            channels: Some(ChannelsArg::Rg),
            bits: Some("16".to_string()),
            no_mips: true,
            ..FlagArgs::default()
        };
        let flags = args.resolve(&config);
        assert_eq!(flags.dimension, TextureDimension::Cube);
        assert_eq!(flags.channels, Some(2));
        assert_eq!(flags.bits, Some(16));
        assert!(!flags.generate_mips);
    }

    #[test]
    fn test_unset_args_keep_config() {
        let mut config = ConfigFile::default();
        config.convert.primitive = Some(PrimitiveKind::Float);
        config.convert.mip_filter = MipFilter::Max;
        let flags = FlagArgs::default().resolve(&config);
        assert_eq!(flags.primitive, Some(PrimitiveKind::Float));
        assert_eq!(flags.mip_filter, MipFilter::Max);
    }

    #[test]
    fn test_default_paths() {
        assert_eq!(
            default_container_path(Path::new("tex/albedo.png")),
            PathBuf::from("tex/albedo.txsk")
        );
        assert_eq!(
            default_export_base(Path::new("tex/albedo.txsk"), None),
            PathBuf::from("tex/albedo")
        );
        assert_eq!(
            default_export_base(Path::new("tex/albedo.txsk"), Some(Path::new("/out"))),
            PathBuf::from("/out/albedo")
        );
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }
}
