//! Vertex color and texture-word packing.

use crate::skeleton::Color;

/// Tint inherited from the scene graph: `0xRRGGBB` plus alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupColor {
    /// Packed `0xRRGGBB`.
    pub rgb: u32,
    /// Alpha in `[0, 1]`.
    pub alpha: f32,
}

impl GroupColor {
    /// Opaque white, the identity tint.
    pub const WHITE: Self = Self { rgb: 0x00FF_FFFF, alpha: 1.0 };

    /// Creates a group color.
    #[must_use]
    pub const fn new(rgb: u32, alpha: f32) -> Self {
        Self { rgb, alpha }
    }

    #[allow(clippy::cast_precision_loss)]
    fn channels(self) -> [f32; 4] {
        let channel = |shift: u32| ((self.rgb >> shift) & 0xFF) as f32 / 255.0;
        [channel(16), channel(8), channel(0), self.alpha]
    }
}

impl Default for GroupColor {
    fn default() -> Self {
        Self::WHITE
    }
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(value: f32) -> u32 {
    (value * 255.0).round() as u32
}

/// Packs `tint × group` as `0xAABBGGRR`.
///
/// Channels are neither clamped nor masked: a product above 1.0 spills into
/// the neighbouring channel. Negative products saturate to zero.
#[must_use]
pub fn pack_abgr(tint: Color, group: GroupColor) -> u32 {
    let [gr, gg, gb, ga] = group.channels();
    let r = to_byte(tint.r * gr);
    let g = to_byte(tint.g * gg);
    let b = to_byte(tint.b * gb);
    let a = to_byte(tint.a * ga);
    (a << 24) | (b << 16) | (g << 8) | r
}

/// Packs the per-vertex texture word: slot in the high half, round flag in bit 0.
#[inline]
#[must_use]
pub const fn pack_texture_and_round(texture_slot: u16, round_pixels: bool) -> u32 {
    ((texture_slot as u32) << 16) | round_pixels as u32
}
