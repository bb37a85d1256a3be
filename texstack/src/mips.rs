//! Mip chain generation.
//!
//! Each level is built from the previous one. Destination texel `(x, y, z)`
//! reads the source texels `2x..2x+1` (clamped to the source extent) along
//! every axis that shrinks; depth only shrinks for volume textures and array
//! layers are never mixed. Channels are filtered independently with no alpha
//! premultiplication, and sRGB data is filtered as stored.

use crate::address::{full_mip_count, mip_extent};
use crate::error::{ConvertError, ConvertResult};
use crate::flags::MipFilter;
use crate::format::{sample, PixelFormat};

/// Size of one mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Extent {
    fn texels(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    /// The next level down.
    fn halved(&self, volume: bool) -> Self {
        Self {
            width: mip_extent(self.width, 1),
            height: mip_extent(self.height, 1),
            depth: if volume {
                mip_extent(self.depth, 1)
            } else {
                self.depth
            },
        }
    }
}

/// Number of levels in the full chain of an extent.
pub fn mip_count(extent: Extent, volume: bool) -> u16 {
    let depth = if volume { extent.depth } else { 1 };
    full_mip_count(extent.width, extent.height, depth)
}

/// Build levels `1..count` from a base level holding `layers` images.
///
/// `base` is laid out `[layer][z][y][x][channel]`; each returned level uses
/// the same layout at its own extent.
pub fn generate_chain(
    base: &[u8],
    extent: Extent,
    layers: usize,
    format: &PixelFormat,
    filter: MipFilter,
    volume: bool,
    count: u16,
) -> ConvertResult<Vec<Vec<u8>>> {
    let expected = extent.texels() * layers * format.stride();
    if base.len() != expected {
        return Err(ConvertError::InvalidImageSize(format!(
            "base level holds {} bytes, expected {}",
            base.len(),
            expected
        )));
    }

    let mut levels: Vec<Vec<u8>> = Vec::with_capacity(count.saturating_sub(1) as usize);
    let mut src_extent = extent;
    for _ in 1..count {
        let src = levels.last().map(Vec::as_slice).unwrap_or(base);
        let (level, dst_extent) = downsample(src, src_extent, layers, format, filter, volume);
        levels.push(level);
        src_extent = dst_extent;
    }
    Ok(levels)
}

/// Halve one level.
fn downsample(
    src: &[u8],
    src_extent: Extent,
    layers: usize,
    format: &PixelFormat,
    filter: MipFilter,
    volume: bool,
) -> (Vec<u8>, Extent) {
    let dst_extent = src_extent.halved(volume);
    let stride = format.stride();
    let channel_bytes = format.channel_bytes();
    let channels = format.channels() as usize;

    let (sw, sh, sd) = (
        src_extent.width as usize,
        src_extent.height as usize,
        src_extent.depth as usize,
    );
    let (dw, dh, dd) = (
        dst_extent.width as usize,
        dst_extent.height as usize,
        dst_extent.depth as usize,
    );

    let mut dst = vec![0u8; dst_extent.texels() * layers * stride];
    let mut acc = vec![0f64; channels];

    for layer in 0..layers {
        for z in 0..dd {
            let zs = if volume {
                2 * z..(2 * z + 2).min(sd)
            } else {
                z..z + 1
            };
            for y in 0..dh {
                let ys = 2 * y..(2 * y + 2).min(sh);
                for x in 0..dw {
                    let xs = 2 * x..(2 * x + 2).min(sw);

                    let mut taken = 0usize;
                    for sz in zs.clone() {
                        for sy in ys.clone() {
                            for sx in xs.clone() {
                                let texel = (((layer * sd + sz) * sh + sy) * sw + sx) * stride;
                                for (c, slot) in acc.iter_mut().enumerate() {
                                    let at = texel + c * channel_bytes;
                                    let value =
                                        sample::read(format, &src[at..at + channel_bytes]);
                                    *slot = combine(filter, taken, *slot, value);
                                }
                                taken += 1;
                            }
                        }
                    }

                    let texel = (((layer * dd + z) * dh + y) * dw + x) * stride;
                    for (c, slot) in acc.iter().enumerate() {
                        let value = match filter {
                            MipFilter::Linear => slot / taken as f64,
                            _ => *slot,
                        };
                        let at = texel + c * channel_bytes;
                        sample::write(format, value, &mut dst[at..at + channel_bytes]);
                    }
                }
            }
        }
    }

    (dst, dst_extent)
}

/// Fold one sample into the running value for its channel.
fn combine(filter: MipFilter, taken: usize, current: f64, value: f64) -> f64 {
    if taken == 0 {
        return value;
    }
    match filter {
        MipFilter::Linear => current + value,
        MipFilter::Nearest => current,
        MipFilter::Min => current.min(value),
        MipFilter::Max => current.max(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PrimitiveKind;
    use proptest::prelude::*;

    fn r8() -> PixelFormat {
        PixelFormat::new(1, 8, PrimitiveKind::Unorm, false).unwrap()
    }

    fn extent(width: u32, height: u32, depth: u32) -> Extent {
        Extent {
            width,
            height,
            depth,
        }
    }

    fn chain(base: &[u8], e: Extent, filter: MipFilter) -> Vec<Vec<u8>> {
        let count = mip_count(e, false);
        generate_chain(base, e, 1, &r8(), filter, false, count).unwrap()
    }

    // ========================================================================
    // Filters
    // ========================================================================

    #[test]
    fn test_filters_on_2x2() {
        let base = [10, 20, 30, 41];
        let e = extent(2, 2, 1);
        assert_eq!(chain(&base, e, MipFilter::Linear), vec![vec![25]]);
        assert_eq!(chain(&base, e, MipFilter::Nearest), vec![vec![10]]);
        assert_eq!(chain(&base, e, MipFilter::Min), vec![vec![10]]);
        assert_eq!(chain(&base, e, MipFilter::Max), vec![vec![41]]);
    }

    #[test]
    fn test_linear_rounds_half_away_from_zero() {
        // mean 1.5 rounds to 2
        assert_eq!(chain(&[1, 2, 1, 2], extent(2, 2, 1), MipFilter::Linear), vec![vec![2]]);
    }

    #[test]
    fn test_odd_extent_clamps_footprint() {
        // 3×1: texel 0 averages [0, 10], texel 1 is just [90]
        let levels = chain(&[0, 10, 90], extent(3, 1, 1), MipFilter::Linear);
        assert_eq!(levels[0], vec![5, 90]);
        assert_eq!(levels[1], vec![48]);
    }

    #[test]
    fn test_layers_are_not_mixed() {
        let base = [0, 0, 0, 0, 200, 200, 200, 200];
        let e = extent(2, 2, 1);
        let levels = generate_chain(&base, e, 2, &r8(), MipFilter::Linear, false, 2).unwrap();
        assert_eq!(levels, vec![vec![0, 200]]);
    }

    #[test]
    fn test_volume_halves_depth() {
        // 1×1×4 volume
        let base = [0, 100, 200, 250];
        let e = extent(1, 1, 4);
        let count = mip_count(e, true);
        assert_eq!(count, 3);
        let levels = generate_chain(&base, e, 1, &r8(), MipFilter::Linear, true, count).unwrap();
        assert_eq!(levels, vec![vec![50, 225], vec![138]]);
    }

    #[test]
    fn test_float_and_signed_formats() {
        let f32x1 = PixelFormat::new(1, 32, PrimitiveKind::Float, false).unwrap();
        let base: Vec<u8> = [1.0f32, 2.0, 3.0, 4.5]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let levels =
            generate_chain(&base, extent(2, 2, 1), 1, &f32x1, MipFilter::Linear, false, 2).unwrap();
        assert_eq!(levels[0], 2.625f32.to_le_bytes().to_vec());

        let snorm = PixelFormat::new(1, 8, PrimitiveKind::Snorm, false).unwrap();
        let base = [(-100i8) as u8, (-50i8) as u8, 20, 30];
        let levels =
            generate_chain(&base, extent(2, 2, 1), 1, &snorm, MipFilter::Min, false, 2).unwrap();
        assert_eq!(levels[0], vec![(-100i8) as u8]);
    }

    #[test]
    fn test_wrong_base_size() {
        let err = generate_chain(&[0; 3], extent(2, 2, 1), 1, &r8(), MipFilter::Linear, false, 2)
            .unwrap_err();
        assert_eq!(err.code(), 0x09);
    }

    // ========================================================================
    // Properties
    // ========================================================================

    proptest! {
        #[test]
        fn prop_level_sizes_follow_halving_law(w in 1u32..40, h in 1u32..40) {
            let e = extent(w, h, 1);
            let base = vec![7u8; (w * h) as usize];
            let levels = chain(&base, e, MipFilter::Linear);
            prop_assert_eq!(levels.len() + 1, mip_count(e, false) as usize);
            for (i, level) in levels.iter().enumerate() {
                let m = i as u16 + 1;
                let expected = mip_extent(w, m) * mip_extent(h, m);
                prop_assert_eq!(level.len(), expected as usize);
                // constant input stays constant under every filter
                prop_assert!(level.iter().all(|&v| v == 7));
            }
        }
    }
}
