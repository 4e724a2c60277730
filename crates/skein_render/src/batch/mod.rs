//! # Batch Entry Packing
//!
//! Converts cached or clipped slot geometry into interleaved vertex words
//! and offset indices for a [`Batcher`].
//!
//! ## Vertex Format
//!
//! Six 32-bit words per vertex:
//!
//! | Word | Content                                  |
//! |------|------------------------------------------|
//! | 0-1  | position `x, y` (f32 bits)               |
//! | 2-3  | texture coordinate `u, v` (f32 bits)     |
//! | 4    | color, `0xAABBGGRR`                      |
//! | 5    | `(texture_slot << 16) \| round_pixels`   |
//!
//! Two entry kinds exist. [`SlotBatch`] borrows its geometry from the
//! renderable's cache and costs nothing to build. [`ClippedBatchableSlot`]
//! owns a copy of clipper output, because the clipper overwrites its buffers
//! on every call.

mod buffer_batcher;
mod clipped_entry;
mod color;
mod layout;
mod slot_entry;

pub use buffer_batcher::{BufferBatcher, DrawBatch};
pub use clipped_entry::ClippedBatchableSlot;
pub use color::{pack_abgr, pack_texture_and_round, GroupColor};
pub use layout::BatchVertex;
pub use slot_entry::{BatchableSlot, SlotBatch};

use crate::skeleton::{BlendMode, TextureId};

/// Words per packed vertex.
pub const VERTEX_STRIDE: usize = 6;

/// Writable window into a batcher's attribute buffer.
pub struct AttributeView<'a> {
    words: &'a mut [u32],
}

impl<'a> AttributeView<'a> {
    /// Wraps a word buffer.
    pub fn new(words: &'a mut [u32]) -> Self {
        Self { words }
    }

    /// Length in words.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if the view holds no words.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Writes a float as its bit pattern.
    #[inline]
    pub fn set_f32(&mut self, index: usize, value: f32) {
        self.words[index] = value.to_bits();
    }

    /// Writes an integer word.
    #[inline]
    pub fn set_u32(&mut self, index: usize, value: u32) {
        self.words[index] = value;
    }

    /// Writes one full vertex starting at word `at`.
    #[inline]
    #[allow(clippy::too_many_arguments)]
    pub fn write_vertex(&mut self, at: usize, x: f32, y: f32, u: f32, v: f32, color: u32, texture_word: u32) {
        self.set_f32(at, x);
        self.set_f32(at + 1, y);
        self.set_f32(at + 2, u);
        self.set_f32(at + 3, v);
        self.set_u32(at + 4, color);
        self.set_u32(at + 5, texture_word);
    }

    /// Read access to the underlying words.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        self.words
    }
}

/// Something a [`Batcher`] can pack.
pub trait Batchable {
    /// Number of indices [`Batchable::pack_index`] writes.
    fn index_size(&self) -> usize;

    /// Number of vertices [`Batchable::pack_attributes`] writes.
    fn vertex_size(&self) -> usize;

    /// Texture sampled by every vertex.
    fn texture(&self) -> TextureId;

    /// Blend mode for the whole entry.
    fn blend_mode(&self) -> BlendMode;

    /// Writes `index_size` indices at `offset`, each shifted by `index_base`.
    fn pack_index(&self, indices: &mut [u32], offset: usize, index_base: u32);

    /// Writes `vertex_size` vertices starting at word `offset`.
    fn pack_attributes(&self, attributes: &mut AttributeView<'_>, offset: usize, texture_slot: u16);
}

/// Consumer of packed entries.
pub trait Batcher {
    /// Reserves space for `item` and packs it.
    fn add_to_batch<B: Batchable + ?Sized>(&mut self, item: &B);
}
