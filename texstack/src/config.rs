//! Configuration file support.
//!
//! Settings live in `config.ini` under the platform config directory
//! (`~/.config/texstack/config.ini` on Linux):
//!
//! ```ini
//! [convert]
//! type = 2d
//! array = false
//! channels = rgba
//! primitive =
//! bits =
//! srgb = false
//! generate_mips = true
//! compress = false
//! mip_filter = linear
//!
//! [export]
//! quality = 1.0
//! output_dir =
//!
//! [logging]
//! level = info
//! file =
//! ```
//!
//! Empty values mean "unset": format fields inherit from the source image and
//! paths fall back to their defaults. A missing file yields the defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::flags::{channels_from_name, MipFilter, TextureDimension, TextureFlags};
use crate::format::{PrimitiveKind, BIT_DEPTHS};

/// Errors from reading, writing or editing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// `[convert]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertSettings {
    pub dimension: TextureDimension,
    pub array: bool,
    pub channels: Option<u8>,
    pub primitive: Option<PrimitiveKind>,
    pub bits: Option<u8>,
    pub srgb: bool,
    pub generate_mips: bool,
    pub compress: bool,
    pub mip_filter: MipFilter,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        let flags = TextureFlags::no_compression();
        Self {
            dimension: flags.dimension,
            array: flags.array,
            channels: flags.channels,
            primitive: flags.primitive,
            bits: flags.bits,
            srgb: flags.srgb,
            generate_mips: flags.generate_mips,
            compress: flags.compress,
            mip_filter: flags.mip_filter,
        }
    }
}

/// `[export]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    /// Quality in (0, 1]; 1 selects lossless encodings.
    pub quality: f32,
    /// Directory for exported images; next to the container when unset.
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            quality: 1.0,
            output_dir: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default filter level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Optional log file; stderr only when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub convert: ConvertSettings,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`; a missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|props| props.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        self.to_ini().write_to_file(path).map_err(write_error)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini
    }

    /// Conversion flags described by the `[convert]` section.
    pub fn to_flags(&self) -> TextureFlags {
        let c = &self.convert;
        TextureFlags {
            dimension: c.dimension,
            array: c.array,
            generate_mips: c.generate_mips,
            compress: c.compress,
            srgb: c.srgb,
            channels: c.channels,
            primitive: c.primitive,
            bits: c.bits,
            mip_filter: c.mip_filter,
            ..TextureFlags::default()
        }
    }
}

/// Directory holding the configuration file.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("texstack")
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.ini")
}

/// Every settable `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    ConvertType,
    ConvertArray,
    ConvertChannels,
    ConvertPrimitive,
    ConvertBits,
    ConvertSrgb,
    ConvertGenerateMips,
    ConvertCompress,
    ConvertMipFilter,
    ExportQuality,
    ExportOutputDir,
    LoggingLevel,
    LoggingFile,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::ConvertType,
            ConfigKey::ConvertArray,
            ConfigKey::ConvertChannels,
            ConfigKey::ConvertPrimitive,
            ConfigKey::ConvertBits,
            ConfigKey::ConvertSrgb,
            ConfigKey::ConvertGenerateMips,
            ConfigKey::ConvertCompress,
            ConfigKey::ConvertMipFilter,
            ConfigKey::ExportQuality,
            ConfigKey::ExportOutputDir,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingFile,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::ConvertType
            | ConfigKey::ConvertArray
            | ConfigKey::ConvertChannels
            | ConfigKey::ConvertPrimitive
            | ConfigKey::ConvertBits
            | ConfigKey::ConvertSrgb
            | ConfigKey::ConvertGenerateMips
            | ConfigKey::ConvertCompress
            | ConfigKey::ConvertMipFilter => "convert",
            ConfigKey::ExportQuality | ConfigKey::ExportOutputDir => "export",
            ConfigKey::LoggingLevel | ConfigKey::LoggingFile => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::ConvertType => "type",
            ConfigKey::ConvertArray => "array",
            ConfigKey::ConvertChannels => "channels",
            ConfigKey::ConvertPrimitive => "primitive",
            ConfigKey::ConvertBits => "bits",
            ConfigKey::ConvertSrgb => "srgb",
            ConfigKey::ConvertGenerateMips => "generate_mips",
            ConfigKey::ConvertCompress => "compress",
            ConfigKey::ConvertMipFilter => "mip_filter",
            ConfigKey::ExportQuality => "quality",
            ConfigKey::ExportOutputDir => "output_dir",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingFile => "file",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as written to the file; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let c = &config.convert;
        match self {
            ConfigKey::ConvertType => c.dimension.name().to_string(),
            ConfigKey::ConvertArray => c.array.to_string(),
            ConfigKey::ConvertChannels => c
                .channels
                .map(|n| "rgba"[..n as usize].to_string())
                .unwrap_or_default(),
            ConfigKey::ConvertPrimitive => c
                .primitive
                .map(|p| p.suffix().to_ascii_lowercase())
                .unwrap_or_default(),
            ConfigKey::ConvertBits => c.bits.map(|b| b.to_string()).unwrap_or_default(),
            ConfigKey::ConvertSrgb => c.srgb.to_string(),
            ConfigKey::ConvertGenerateMips => c.generate_mips.to_string(),
            ConfigKey::ConvertCompress => c.compress.to_string(),
            ConfigKey::ConvertMipFilter => c.mip_filter.name().to_string(),
            ConfigKey::ExportQuality => config.export.quality.to_string(),
            ConfigKey::ExportOutputDir => path_value(&config.export.output_dir),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingFile => path_value(&config.logging.file),
        }
    }

    /// Parse `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        };
        let c = &mut config.convert;

        match self {
            ConfigKey::ConvertType => {
                c.dimension = TextureDimension::from_name(value)
                    .ok_or_else(|| invalid("expected 1d, 2d, 3d, cube or ms"))?;
            }
            ConfigKey::ConvertArray => c.array = parse_bool(value).ok_or_else(|| invalid(BOOL))?,
            ConfigKey::ConvertChannels => {
                c.channels = optional(value, |v| {
                    channels_from_name(v).ok_or_else(|| invalid("expected r, rg, rgb or rgba"))
                })?;
            }
            ConfigKey::ConvertPrimitive => {
                c.primitive = optional(value, |v| {
                    PrimitiveKind::from_name(v)
                        .ok_or_else(|| invalid("expected uint, sint, unorm, snorm or float"))
                })?;
            }
            ConfigKey::ConvertBits => {
                c.bits = optional(value, |v| {
                    v.parse::<u8>()
                        .ok()
                        .filter(|b| BIT_DEPTHS.contains(b))
                        .ok_or_else(|| invalid("expected 8, 16, 32 or 64"))
                })?;
            }
            ConfigKey::ConvertSrgb => c.srgb = parse_bool(value).ok_or_else(|| invalid(BOOL))?,
            ConfigKey::ConvertGenerateMips => {
                c.generate_mips = parse_bool(value).ok_or_else(|| invalid(BOOL))?;
            }
            ConfigKey::ConvertCompress => {
                c.compress = parse_bool(value).ok_or_else(|| invalid(BOOL))?;
            }
            ConfigKey::ConvertMipFilter => {
                c.mip_filter = MipFilter::from_name(value)
                    .ok_or_else(|| invalid("expected linear, nearest, min or max"))?;
            }
            ConfigKey::ExportQuality => {
                config.export.quality = value
                    .parse::<f32>()
                    .ok()
                    .filter(|q| *q > 0.0 && *q <= 1.0)
                    .ok_or_else(|| invalid("expected a number in (0, 1]"))?;
            }
            ConfigKey::ExportOutputDir => config.export.output_dir = optional_path(value),
            ConfigKey::LoggingLevel => {
                let level = value.to_ascii_lowercase();
                if !LEVELS.contains(&level.as_str()) {
                    return Err(invalid("expected trace, debug, info, warn or error"));
                }
                config.logging.level = level;
            }
            ConfigKey::LoggingFile => config.logging.file = optional_path(value),
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

const BOOL: &str = "expected true or false";
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn optional<T>(
    value: &str,
    parse: impl FnOnce(&str) -> Result<T, ConfigError>,
) -> Result<Option<T>, ConfigError> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}

fn path_value(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}
