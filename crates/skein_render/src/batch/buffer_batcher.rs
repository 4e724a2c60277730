//! # Buffer Batcher
//!
//! CPU-side [`Batcher`] that packs every submitted entry into one attribute
//! buffer and one index buffer per frame, split into draw batches.
//!
//! ## Frame Flow
//!
//! ```text
//! begin_frame() ─▶ add_to_batch() × N ─▶ attributes_bytes() / indices() / batches()
//! ```
//!
//! A batch holds up to `max_textures` distinct textures and a single blend
//! mode. Buffers keep their capacity across frames.

use super::layout::BatchVertex;
use super::{AttributeView, Batchable, Batcher, VERTEX_STRIDE};
use crate::config::RenderConfig;
use crate::skeleton::{BlendMode, TextureId};

/// One draw call's worth of indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawBatch {
    /// Blend mode shared by every entry.
    pub blend_mode: BlendMode,
    /// Bound textures; an entry's texture slot indexes this list.
    pub textures: Vec<TextureId>,
    /// First index in the index buffer.
    pub index_start: usize,
    /// Number of indices.
    pub index_count: usize,
}

/// Packs entries into contiguous vertex and index buffers.
#[derive(Debug)]
pub struct BufferBatcher {
    max_textures: usize,
    attributes: Vec<u32>,
    indices: Vec<u32>,
    batches: Vec<DrawBatch>,
}

impl BufferBatcher {
    /// Creates a batcher with room for `initial_vertex_capacity` vertices.
    #[must_use]
    pub fn new(max_textures_per_batch: u16, initial_vertex_capacity: usize) -> Self {
        Self {
            max_textures: usize::from(max_textures_per_batch.max(1)),
            attributes: Vec::with_capacity(initial_vertex_capacity * VERTEX_STRIDE),
            indices: Vec::with_capacity(initial_vertex_capacity * 3 / 2),
            batches: Vec::new(),
        }
    }

    /// Creates a batcher from configuration.
    #[must_use]
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.max_textures_per_batch, config.initial_vertex_capacity)
    }

    /// Clears all buffers for a new frame.
    pub fn begin_frame(&mut self) {
        self.attributes.clear();
        self.indices.clear();
        self.batches.clear();
    }

    /// Packed attribute words.
    #[must_use]
    pub fn attributes(&self) -> &[u32] {
        &self.attributes
    }

    /// Packed attributes as bytes, ready for upload.
    #[must_use]
    pub fn attributes_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.attributes)
    }

    /// Packed attributes viewed as vertices.
    #[must_use]
    pub fn vertices(&self) -> &[BatchVertex] {
        bytemuck::cast_slice(&self.attributes)
    }

    /// Packed indices.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Draw batches in submission order.
    #[must_use]
    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    /// Number of packed vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.attributes.len() / VERTEX_STRIDE
    }

    /// Finds or assigns a texture slot, opening a new batch when the blend
    /// mode changes or the current batch is out of texture slots.
    #[allow(clippy::cast_possible_truncation)]
    fn texture_slot(&mut self, texture: TextureId, blend_mode: BlendMode) -> u16 {
        if let Some(batch) = self.batches.last_mut() {
            if batch.blend_mode == blend_mode {
                if let Some(slot) = batch.textures.iter().position(|&t| t == texture) {
                    return slot as u16;
                }
                if batch.textures.len() < self.max_textures {
                    batch.textures.push(texture);
                    return (batch.textures.len() - 1) as u16;
                }
            }
        }

        tracing::trace!(?blend_mode, batches = self.batches.len() + 1, "batch break");
        self.batches.push(DrawBatch {
            blend_mode,
            textures: vec![texture],
            index_start: self.indices.len(),
            index_count: 0,
        });
        0
    }
}

impl Default for BufferBatcher {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl Batcher for BufferBatcher {
    fn add_to_batch<B: Batchable + ?Sized>(&mut self, item: &B) {
        let texture_slot = self.texture_slot(item.texture(), item.blend_mode());

        let vertex_offset = self.attributes.len();
        let index_offset = self.indices.len();
        let index_base = u32::try_from(vertex_offset / VERTEX_STRIDE).unwrap_or(u32::MAX);

        self.attributes
            .resize(vertex_offset + item.vertex_size() * VERTEX_STRIDE, 0);
        self.indices.resize(index_offset + item.index_size(), 0);

        item.pack_index(&mut self.indices, index_offset, index_base);
        item.pack_attributes(
            &mut AttributeView::new(&mut self.attributes),
            vertex_offset,
            texture_slot,
        );

        if let Some(batch) = self.batches.last_mut() {
            batch.index_count += item.index_size();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A single triangle with fixed geometry.
    struct Triangle {
        texture: TextureId,
        blend_mode: BlendMode,
    }

    impl Triangle {
        fn new(texture: u32) -> Self {
            Self {
                texture: TextureId(texture),
                blend_mode: BlendMode::Normal,
            }
        }
    }

    impl Batchable for Triangle {
        fn index_size(&self) -> usize {
            3
        }

        fn vertex_size(&self) -> usize {
            3
        }

        fn texture(&self) -> TextureId {
            self.texture
        }

        fn blend_mode(&self) -> BlendMode {
            self.blend_mode
        }

        fn pack_index(&self, indices: &mut [u32], offset: usize, index_base: u32) {
            for i in 0..3 {
                indices[offset + i] = index_base + i as u32;
            }
        }

        fn pack_attributes(&self, attributes: &mut AttributeView<'_>, offset: usize, texture_slot: u16) {
            for i in 0..3 {
                attributes.write_vertex(offset + i * VERTEX_STRIDE, i as f32, 0.0, 0.0, 0.0, 0, u32::from(texture_slot) << 16);
            }
        }
    }

    #[test]
    fn test_index_base_advances() {
        let mut batcher = BufferBatcher::new(16, 64);
        batcher.add_to_batch(&Triangle::new(0));
        batcher.add_to_batch(&Triangle::new(0));

        assert_eq!(batcher.indices(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(batcher.vertex_count(), 6);
        assert_eq!(batcher.attributes_bytes().len(), 6 * 24);
        assert_eq!(batcher.batches().len(), 1);
        assert_eq!(batcher.batches()[0].index_count, 6);
    }

    #[test]
    fn test_textures_share_a_batch() {
        let mut batcher = BufferBatcher::new(16, 64);
        batcher.add_to_batch(&Triangle::new(4));
        batcher.add_to_batch(&Triangle::new(9));
        batcher.add_to_batch(&Triangle::new(4));

        assert_eq!(batcher.batches().len(), 1);
        assert_eq!(batcher.batches()[0].textures, vec![TextureId(4), TextureId(9)]);
        let slots: Vec<u16> = batcher.vertices().iter().map(BatchVertex::texture_slot).collect();
        assert_eq!(slots, [0, 0, 0, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_texture_overflow_breaks_batch() {
        let mut batcher = BufferBatcher::new(1, 64);
        batcher.add_to_batch(&Triangle::new(1));
        batcher.add_to_batch(&Triangle::new(2));

        let batches = batcher.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].index_start, 3);
        assert_eq!(batches[1].textures, vec![TextureId(2)]);
    }

    #[test]
    fn test_blend_change_breaks_batch() {
        let mut batcher = BufferBatcher::new(16, 64);
        batcher.add_to_batch(&Triangle::new(1));
        batcher.add_to_batch(&Triangle {
            texture: TextureId(1),
            blend_mode: BlendMode::Additive,
        });

        assert_eq!(batcher.batches().len(), 2);
        assert_eq!(batcher.batches()[1].blend_mode, BlendMode::Additive);
    }

    #[test]
    fn test_begin_frame_keeps_capacity() {
        let mut batcher = BufferBatcher::new(16, 0);
        for _ in 0..10 {
            batcher.add_to_batch(&Triangle::new(0));
        }
        let capacity = batcher.attributes.capacity();

        batcher.begin_frame();
        assert!(batcher.indices().is_empty());
        assert!(batcher.batches().is_empty());
        assert_eq!(batcher.attributes.capacity(), capacity);
    }
}
