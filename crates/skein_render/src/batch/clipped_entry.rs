//! Clipped batch entry.

use skein_core::Poolable;

use super::color::{pack_abgr, pack_texture_and_round, GroupColor};
use super::{AttributeView, Batchable, VERTEX_STRIDE};
use crate::clipping::{ClippedView, CLIPPED_STRIDE, CLIPPED_UV_OFFSET};
use crate::renderable::RenderableId;
use crate::skeleton::{BlendMode, Color, TextureId};

/// Pooled entry owning a snapshot of clipper output.
#[derive(Debug)]
pub struct ClippedBatchableSlot {
    renderable: Option<RenderableId>,
    texture: TextureId,
    blend_mode: BlendMode,
    round_pixels: bool,
    group: GroupColor,
    color: Color,
    vertices: Vec<f32>,
    triangles: Vec<u16>,
    stride: usize,
}

impl Default for ClippedBatchableSlot {
    fn default() -> Self {
        Self {
            renderable: None,
            texture: TextureId::default(),
            blend_mode: BlendMode::Normal,
            round_pixels: false,
            group: GroupColor::WHITE,
            color: Color::WHITE,
            vertices: Vec::new(),
            triangles: Vec::new(),
            stride: CLIPPED_STRIDE,
        }
    }
}

impl Poolable for ClippedBatchableSlot {
    fn reset(&mut self) {
        self.renderable = None;
        self.texture = TextureId::default();
        self.blend_mode = BlendMode::Normal;
        self.round_pixels = false;
        self.group = GroupColor::WHITE;
        self.color = Color::WHITE;
        self.vertices.clear();
        self.triangles.clear();
        self.stride = CLIPPED_STRIDE;
    }
}

impl ClippedBatchableSlot {
    /// Sets per-frame state. `color` is the slot's combined tint.
    pub fn set_data(
        &mut self,
        renderable: RenderableId,
        texture: TextureId,
        blend_mode: BlendMode,
        round_pixels: bool,
        group: GroupColor,
        color: Color,
    ) {
        self.renderable = Some(renderable);
        self.texture = texture;
        self.blend_mode = blend_mode;
        self.round_pixels = round_pixels;
        self.group = group;
        self.color = color;
    }

    /// Copies the clipper's current output. Buffers keep their capacity.
    pub fn set_clipper(&mut self, view: ClippedView<'_>) {
        self.vertices.clear();
        self.vertices.extend_from_slice(view.vertices);
        self.triangles.clear();
        self.triangles.extend_from_slice(view.triangles);
        self.stride = view.stride;
    }

    /// Owning renderable, if bound.
    #[must_use]
    pub const fn renderable(&self) -> Option<RenderableId> {
        self.renderable
    }

    /// Owned clipped vertices.
    #[must_use]
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Owned clipped triangles.
    #[must_use]
    pub fn triangles(&self) -> &[u16] {
        &self.triangles
    }
}

impl Batchable for ClippedBatchableSlot {
    fn index_size(&self) -> usize {
        self.triangles.len()
    }

    fn vertex_size(&self) -> usize {
        if self.stride == 0 {
            return 0;
        }
        self.vertices.len() / self.stride
    }

    fn texture(&self) -> TextureId {
        self.texture
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    fn pack_index(&self, indices: &mut [u32], offset: usize, index_base: u32) {
        let target = &mut indices[offset..offset + self.triangles.len()];
        for (out, &index) in target.iter_mut().zip(&self.triangles) {
            *out = u32::from(index) + index_base;
        }
    }

    fn pack_attributes(&self, attributes: &mut AttributeView<'_>, offset: usize, texture_slot: u16) {
        let color = pack_abgr(self.color, self.group);
        let texture_word = pack_texture_and_round(texture_slot, self.round_pixels);

        for (i, vertex) in self.vertices.chunks_exact(self.stride.max(1)).enumerate() {
            if vertex.len() < CLIPPED_UV_OFFSET + 2 {
                break;
            }
            attributes.write_vertex(
                offset + i * VERTEX_STRIDE,
                vertex[0],
                vertex[1],
                vertex[CLIPPED_UV_OFFSET],
                vertex[CLIPPED_UV_OFFSET + 1],
                color,
                texture_word,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipping::CLIPPED_STRIDE_TWO_COLOR;

    fn clipped(stride: usize) -> (Vec<f32>, Vec<u16>) {
        let mut vertices = Vec::new();
        for (x, y, u, v) in [(0.0, 0.0, 0.0, 1.0), (4.0, 0.0, 1.0, 1.0), (0.0, 4.0, 0.0, 0.0)] {
            vertices.extend_from_slice(&[x, y, 1.0, 1.0, 1.0, 1.0, u, v]);
            vertices.resize(vertices.len() + stride - CLIPPED_STRIDE, 0.5);
        }
        (vertices, vec![0, 1, 2])
    }

    #[test]
    fn test_snapshot_survives_source_reuse() {
        let (mut vertices, triangles) = clipped(CLIPPED_STRIDE);
        let mut entry = ClippedBatchableSlot::default();
        entry.set_clipper(ClippedView { vertices: &vertices, triangles: &triangles, stride: CLIPPED_STRIDE });

        vertices.fill(9.0);
        assert_eq!(entry.vertices()[0], 0.0);
        assert_eq!(entry.vertex_size(), 3);
        assert_eq!(entry.index_size(), 3);
    }

    #[test]
    fn test_two_color_stride_reads_uv_at_offset() {
        let (vertices, triangles) = clipped(CLIPPED_STRIDE_TWO_COLOR);
        let mut entry = ClippedBatchableSlot::default();
        entry.set_data(RenderableId::next(), TextureId(1), BlendMode::Normal, false, GroupColor::WHITE, Color::WHITE);
        entry.set_clipper(ClippedView { vertices: &vertices, triangles: &triangles, stride: CLIPPED_STRIDE_TWO_COLOR });
        assert_eq!(entry.vertex_size(), 3);

        let mut words = vec![0u32; 3 * VERTEX_STRIDE];
        entry.pack_attributes(&mut AttributeView::new(&mut words), 0, 0);
        let second = &words[VERTEX_STRIDE..2 * VERTEX_STRIDE];
        assert_eq!(f32::from_bits(second[0]), 4.0);
        assert_eq!(f32::from_bits(second[2]), 1.0);
        assert_eq!(f32::from_bits(second[3]), 1.0);
        assert_eq!(second[4], 0xFFFF_FFFF);
    }

    #[test]
    fn test_indices_offset_by_base() {
        let (vertices, triangles) = clipped(CLIPPED_STRIDE);
        let mut entry = ClippedBatchableSlot::default();
        entry.set_clipper(ClippedView { vertices: &vertices, triangles: &triangles, stride: CLIPPED_STRIDE });

        let mut indices = vec![0u32; 3];
        entry.pack_index(&mut indices, 0, 100);
        assert_eq!(indices, [100, 101, 102]);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let (vertices, triangles) = clipped(CLIPPED_STRIDE);
        let mut entry = ClippedBatchableSlot::default();
        entry.set_clipper(ClippedView { vertices: &vertices, triangles: &triangles, stride: CLIPPED_STRIDE });
        let capacity = entry.vertices.capacity();

        entry.reset();
        assert!(entry.vertices().is_empty());
        assert!(entry.renderable().is_none());
        assert_eq!(entry.vertices.capacity(), capacity);
    }
}
