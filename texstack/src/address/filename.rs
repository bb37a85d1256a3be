//! Subresource addressing from file names.
//!
//! When a texture is made of many files, each file's stem carries its
//! position. Parsing works from the end of the lower-cased stem towards the
//! start, peeling numeric groups off in this order:
//!
//! | Group  | Present when          | Error when missing        |
//! |--------|-----------------------|---------------------------|
//! | depth  | 3D                    | `INVALID_FILE_NAME_SLICE` |
//! | sample | multisample           | `INVALID_FILE_NAME_SLICE` |
//! | slice  | array                 | `INVALID_FILE_NAME_SLICE` |
//! | mip    | mips aren't generated | `INVALID_FILE_NAME_MIP`   |
//!
//! Each group is digits with an optional one-character separator (`.`, `_` or
//! `-`) before it. For cube maps the remainder must then end in a face token.
//!
//! Examples (cube array, mips supplied):
//! - `sky_right0-1.png` → face +x, mip 0, slice 1
//! - `sky-z.2.0.png` → face -z, mip 2, slice 0

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::types::{PathDescriptor, SubresourceKey};
use crate::error::{ConvertError, ConvertResult};
use crate::flags::{TextureDimension, TextureFlags};

/// Number of faces of a cube map.
pub const CUBE_FACES: u16 = 6;

/// Face tokens in face-index order; `right` and `+x` are face 0.
const FACE_TOKENS: [(&str, &str); 6] = [
    ("right", "+x"),
    ("left", "-x"),
    ("top", "+y"),
    ("bottom", "-y"),
    ("back", "+z"),
    ("front", "-z"),
];

/// Indices parsed out of one file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParsedName {
    pub face: u16,
    pub mip: u16,
    pub slice: u16,
    pub sample: u16,
    pub z: u16,
}

/// Trailing `[sep]digits` group.
fn index_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[._-]?(\d+)$").unwrap())
}

/// Trailing face token. Word tokens must start the stem or follow a
/// separator; axis tokens carry their own sign.
fn face_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:(?:^|[._-])(right|left|top|bottom|back|front)|([+-][xyz]))$").unwrap()
    })
}

/// Trailing separator stripped from a parsed prefix.
const SEPARATORS: [char; 3] = ['.', '_', '-'];

/// Which index groups a flag set requires.
#[derive(Debug, Clone, Copy)]
struct Groups {
    mip: bool,
    slice: bool,
    sample: bool,
    z: bool,
    face: bool,
}

impl Groups {
    fn for_flags(flags: &TextureFlags) -> Self {
        Self {
            mip: !flags.generate_mips,
            slice: flags.array,
            sample: flags.dimension == TextureDimension::Multisample,
            z: flags.dimension == TextureDimension::ThreeD,
            face: flags.dimension == TextureDimension::Cube,
        }
    }
}

/// Lower-cased file stem, or the whole file name if there's no extension.
fn stem_of(path: &Path) -> ConvertResult<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .ok_or_else(|| ConvertError::InvalidFilePath {
            path: path.to_path_buf(),
            reason: "path has no file name".to_string(),
        })
}

/// Strip one trailing index group from `rest`.
fn take_index<'s>(
    rest: &'s str,
    name: &str,
    missing: fn(String) -> ConvertError,
) -> ConvertResult<(&'s str, u16)> {
    let caps = index_pattern()
        .captures(rest)
        .ok_or_else(|| missing(name.to_string()))?;
    let whole = caps.get(0).map(|m| m.start()).unwrap_or(rest.len());
    let digits = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

    let value: u32 = digits
        .parse()
        .map_err(|_| ConvertError::InvalidResourceIndex(format!("{} in {}", digits, name)))?;
    if value >= SubresourceKey::SENTINEL as u32 {
        return Err(ConvertError::InvalidResourceIndex(format!(
            "index {} in {} is out of range",
            value, name
        )));
    }
    Ok((&rest[..whole], value as u16))
}

fn face_index(token: &str) -> Option<u16> {
    FACE_TOKENS
        .iter()
        .position(|(word, axis)| *word == token || *axis == token)
        .map(|i| i as u16)
}

/// Parse the indices of a single file name.
///
/// # Errors
///
/// - `INVALID_FILE_NAME_MIP` / `INVALID_FILE_NAME_SLICE` / `INVALID_FILE_NAME_FACE`
///   when a required group is missing
/// - `INVALID_RESOURCE_INDEX` when an index is the sentinel or larger
pub fn parse_file_name(path: &Path, flags: &TextureFlags) -> ConvertResult<ParsedName> {
    let stem = stem_of(path)?;
    let (_, parsed) = parse_stem(&stem, flags)?;
    Ok(parsed)
}

/// Whether `candidate` belongs to the image set named by `stem`: its name
/// parses under `flags` and what's left before the index groups is `stem`,
/// optionally followed by one separator.
pub fn is_sibling_of(candidate: &Path, stem: &str, flags: &TextureFlags) -> bool {
    let Ok(candidate_stem) = stem_of(candidate) else {
        return false;
    };
    match parse_stem(&candidate_stem, flags) {
        Ok((prefix, _)) => {
            let prefix = prefix.strip_suffix(&SEPARATORS[..]).unwrap_or(prefix);
            prefix == stem.to_lowercase()
        }
        Err(_) => false,
    }
}

/// Peel the index groups off a lower-cased stem, returning the leftover
/// prefix and the parsed indices.
fn parse_stem<'s>(stem: &'s str, flags: &TextureFlags) -> ConvertResult<(&'s str, ParsedName)> {
    let groups = Groups::for_flags(flags);
    let mut rest = stem;
    let mut parsed = ParsedName::default();

    if groups.z {
        (rest, parsed.z) = take_index(rest, stem, ConvertError::InvalidFileNameSlice)?;
    }
    if groups.sample {
        (rest, parsed.sample) = take_index(rest, stem, ConvertError::InvalidFileNameSlice)?;
    }
    if groups.slice {
        (rest, parsed.slice) = take_index(rest, stem, ConvertError::InvalidFileNameSlice)?;
    }
    if groups.mip {
        (rest, parsed.mip) = take_index(rest, stem, ConvertError::InvalidFileNameMip)?;
    }
    if groups.face {
        let caps = face_pattern()
            .captures(rest)
            .ok_or_else(|| ConvertError::InvalidFileNameFace(stem.to_string()))?;
        let token = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        parsed.face = token
            .and_then(face_index)
            .ok_or_else(|| ConvertError::InvalidFileNameFace(stem.to_string()))?;
        let start = caps.get(0).map(|m| m.start()).unwrap_or(rest.len());
        rest = &rest[..start];
    }

    Ok((rest, parsed))
}

/// Address a list of paths by their file names.
///
/// Layers are composed as `(slice * sample_count + sample) * face_count + face`
/// where `sample_count` is one more than the largest sample seen. For cube
/// maps every (slice, sample, z, mip) group must carry all six faces.
pub fn descriptors_from_names(
    paths: &[PathBuf],
    flags: &TextureFlags,
) -> ConvertResult<Vec<PathDescriptor>> {
    if paths.is_empty() {
        return Err(ConvertError::MissingPaths);
    }

    let parsed = paths
        .iter()
        .map(|p| parse_file_name(p, flags))
        .collect::<ConvertResult<Vec<_>>>()?;

    let is_cube = flags.dimension == TextureDimension::Cube;
    let face_count: u32 = if is_cube { CUBE_FACES as u32 } else { 1 };
    let sample_count = parsed.iter().map(|p| p.sample as u32).max().unwrap_or(0) + 1;

    if is_cube {
        let mut faces: BTreeMap<(u16, u16, u16, u16), BTreeSet<u16>> = BTreeMap::new();
        for p in &parsed {
            faces
                .entry((p.slice, p.sample, p.z, p.mip))
                .or_default()
                .insert(p.face);
        }
        for ((slice, sample, z, mip), present) in &faces {
            if present.len() != CUBE_FACES as usize {
                let missing: Vec<&str> = (0..CUBE_FACES)
                    .filter(|f| !present.contains(f))
                    .map(|f| FACE_TOKENS[f as usize].0)
                    .collect();
                return Err(ConvertError::MissingFace(format!(
                    "slice {} sample {} z {} mip {} lacks {}",
                    slice,
                    sample,
                    z,
                    mip,
                    missing.join(", ")
                )));
            }
        }
    }

    paths
        .iter()
        .zip(&parsed)
        .map(|(path, p)| {
            let layer = (p.slice as u32 * sample_count + p.sample as u32) * face_count
                + p.face as u32;
            if layer >= SubresourceKey::SENTINEL as u32 {
                return Err(ConvertError::InvalidResourceIndex(format!(
                    "layer {} of {} is out of range",
                    layer,
                    path.display()
                )));
            }
            Ok(PathDescriptor::new(
                path.clone(),
                SubresourceKey::new(p.z, layer as u16, p.mip),
            ))
        })
        .collect()
}
