//! Unclipped batch entry.

use skein_core::Poolable;

use super::color::{pack_abgr, pack_texture_and_round, GroupColor};
use super::{AttributeView, Batchable, VERTEX_STRIDE};
use crate::geometry_cache::{CachedGeometry, GeometryId};
use crate::renderable::RenderableId;
use crate::skeleton::{BlendMode, TextureId};

/// Pooled record of one visible region or mesh.
///
/// Holds only ids and flags. Geometry stays in the renderable's cache and is
/// borrowed through [`BatchableSlot::view`] at submission time.
#[derive(Debug, Default)]
pub struct BatchableSlot {
    renderable: Option<RenderableId>,
    geometry: Option<GeometryId>,
    texture: TextureId,
    blend_mode: BlendMode,
    round_pixels: bool,
    group: GroupColor,
}

impl Poolable for BatchableSlot {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl BatchableSlot {
    /// Binds the entry to one slot's cached geometry for this frame.
    pub fn set_data(
        &mut self,
        renderable: RenderableId,
        geometry: GeometryId,
        texture: TextureId,
        blend_mode: BlendMode,
        round_pixels: bool,
        group: GroupColor,
    ) {
        self.renderable = Some(renderable);
        self.geometry = Some(geometry);
        self.texture = texture;
        self.blend_mode = blend_mode;
        self.round_pixels = round_pixels;
        self.group = group;
    }

    /// Owning renderable, if bound.
    #[must_use]
    pub const fn renderable(&self) -> Option<RenderableId> {
        self.renderable
    }

    /// Cache entry, if bound.
    #[must_use]
    pub const fn geometry(&self) -> Option<GeometryId> {
        self.geometry
    }

    /// Borrows `geometry` into a packable view carrying this entry's state.
    #[must_use]
    pub fn view<'a>(&self, geometry: &'a CachedGeometry) -> SlotBatch<'a> {
        SlotBatch {
            geometry,
            texture: self.texture,
            blend_mode: self.blend_mode,
            round_pixels: self.round_pixels,
            group: self.group,
        }
    }
}

/// Borrowed, packable view of cached slot geometry.
#[derive(Clone, Copy, Debug)]
pub struct SlotBatch<'a> {
    geometry: &'a CachedGeometry,
    texture: TextureId,
    blend_mode: BlendMode,
    round_pixels: bool,
    group: GroupColor,
}

impl Batchable for SlotBatch<'_> {
    fn index_size(&self) -> usize {
        self.geometry.index_count()
    }

    fn vertex_size(&self) -> usize {
        self.geometry.vertex_count()
    }

    fn texture(&self) -> TextureId {
        self.texture
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    fn pack_index(&self, indices: &mut [u32], offset: usize, index_base: u32) {
        let target = &mut indices[offset..offset + self.geometry.index_count()];
        for (out, &index) in target.iter_mut().zip(self.geometry.indices()) {
            *out = u32::from(index) + index_base;
        }
    }

    fn pack_attributes(&self, attributes: &mut AttributeView<'_>, offset: usize, texture_slot: u16) {
        let color = pack_abgr(self.geometry.color, self.group);
        let texture_word = pack_texture_and_round(texture_slot, self.round_pixels);

        let positions = self.geometry.vertices().chunks_exact(2);
        let uvs = self.geometry.uvs().chunks_exact(2);
        for (i, (position, uv)) in positions.zip(uvs).enumerate() {
            attributes.write_vertex(
                offset + i * VERTEX_STRIDE,
                position[0],
                position[1],
                uv[0],
                uv[1],
                color,
                texture_word,
            );
        }
    }
}
