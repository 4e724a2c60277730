//! # Attachment Geometry Cache
//!
//! Per-renderable storage of world-space geometry, keyed by
//! (slot index, attachment name).
//!
//! ## Lifecycle
//!
//! - Entries are created on first sight of a key and never evicted
//! - The vertex buffer is sized once, to the attachment's vertex count
//! - Meshes whose UVs or indices disagree with their vertex count are never cached
//! - Index and UV lists are shared with the attachment, never copied
//! - The whole map is dropped when the owning renderable is destroyed
//!
//! The cache does not recompute anything on its own: the renderable writes
//! fresh world vertices into every referenced entry each frame.

use std::collections::HashMap;
use std::sync::Arc;

use crate::skeleton::{Attachment, AttachmentId, Color, TextureId};

/// Stable identity of a cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u32);

impl GeometryId {
    /// Position of the entry inside its cache.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Cached geometry for one (slot, attachment) pair.
#[derive(Debug)]
pub struct CachedGeometry {
    id: GeometryId,
    slot: usize,
    attachment: AttachmentId,
    vertices: Vec<f32>,
    indices: Arc<[u16]>,
    uvs: Arc<[f32]>,
    texture: TextureId,
    /// Combined skeleton, slot and attachment tint, refreshed every frame.
    pub color: Color,
    /// Slot's two-color tint, refreshed every frame.
    pub dark_color: Option<Color>,
    drawable: bool,
}

impl CachedGeometry {
    /// Entry identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> GeometryId {
        self.id
    }

    /// Slot index this entry belongs to.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// Attachment currently bound to the entry.
    #[inline]
    #[must_use]
    pub const fn attachment(&self) -> AttachmentId {
        self.attachment
    }

    /// World vertices, `x, y` per vertex.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Writable world vertices. The length never changes.
    #[inline]
    pub fn vertices_mut(&mut self) -> &mut [f32] {
        &mut self.vertices
    }

    /// Triangle indices shared with the attachment.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// UVs shared with the attachment, `u, v` per vertex.
    #[inline]
    #[must_use]
    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    /// Texture sampled by the attachment.
    #[inline]
    #[must_use]
    pub const fn texture(&self) -> TextureId {
        self.texture
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }

    /// Number of indices.
    #[inline]
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if the last world-vertex refresh wrote every vertex.
    #[inline]
    #[must_use]
    pub const fn is_drawable(&self) -> bool {
        self.drawable
    }

    pub(crate) fn set_drawable(&mut self, drawable: bool) {
        self.drawable = drawable;
    }

    /// Rebinds the entry to another attachment under the same key.
    ///
    /// The old vertex buffer is dropped and a fresh one allocated at the new
    /// size, so a buffer is never resized in place. See the cache-key
    /// collision decision in DESIGN.md.
    fn bind(&mut self, attachment_id: AttachmentId, shared: SharedGeometry) {
        self.attachment = attachment_id;
        self.indices = shared.indices;
        self.uvs = shared.uvs;
        self.texture = shared.texture;
        self.vertices = vec![0.0; shared.world_vertices_length];
        self.drawable = false;
    }
}

struct SharedGeometry {
    indices: Arc<[u16]>,
    uvs: Arc<[f32]>,
    texture: TextureId,
    world_vertices_length: usize,
}

impl SharedGeometry {
    fn of(attachment: &Attachment) -> Option<Self> {
        let (indices, uvs, texture) = match attachment {
            Attachment::Region(region) => (region.triangles(), region.uvs(), region.region.texture),
            Attachment::Mesh(mesh) => (mesh.triangles(), mesh.uvs(), mesh.region.texture),
            Attachment::Clipping(_) | Attachment::Point(_) | Attachment::BoundingBox(_) => {
                return None;
            }
        };
        let world_vertices_length = attachment.world_vertices_length();
        let vertex_count = world_vertices_length / 2;
        let consistent = world_vertices_length % 2 == 0
            && uvs.len() == world_vertices_length
            && indices.len() % 3 == 0
            && indices.iter().all(|&index| usize::from(index) < vertex_count);
        if !consistent {
            tracing::debug!(
                name = attachment.name(),
                floats = world_vertices_length,
                uvs = uvs.len(),
                indices = indices.len(),
                "mesh geometry inconsistent, not cached"
            );
            return None;
        }

        Some(Self {
            indices: Arc::clone(indices),
            uvs: Arc::clone(uvs),
            texture,
            world_vertices_length,
        })
    }
}

/// Geometry cache owned by one renderable.
#[derive(Debug, Default)]
pub struct AttachmentGeometryCache {
    /// slot index -> attachment name -> entry.
    keys: HashMap<usize, HashMap<String, GeometryId>>,
    entries: Vec<CachedGeometry>,
}

impl AttachmentGeometryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `attachment` in the slot at `slot_index`,
    /// creating it on first sight.
    ///
    /// Repeated calls with the same pair return the same id and leave the
    /// vertex buffer in place. If a different attachment object shows up
    /// under an existing name, the entry is rebound to it under the same id.
    ///
    /// Returns `None` for attachments that produce no triangles, and for
    /// meshes whose UV count differs from the vertex count or whose indices
    /// reach past the last vertex.
    pub fn get(
        &mut self,
        slot_index: usize,
        attachment_id: AttachmentId,
        attachment: &Attachment,
    ) -> Option<GeometryId> {
        if !attachment.is_renderable() {
            return None;
        }

        if let Some(id) = self.find(slot_index, attachment.name()) {
            let entry = &mut self.entries[id.index()];
            if entry.attachment != attachment_id {
                entry.bind(attachment_id, SharedGeometry::of(attachment)?);
            }
            return Some(id);
        }

        let shared = SharedGeometry::of(attachment)?;
        let id = GeometryId(u32::try_from(self.entries.len()).ok()?);
        self.entries.push(CachedGeometry {
            id,
            slot: slot_index,
            attachment: attachment_id,
            vertices: vec![0.0; shared.world_vertices_length],
            indices: shared.indices,
            uvs: shared.uvs,
            texture: shared.texture,
            color: Color::WHITE,
            dark_color: None,
            drawable: false,
        });
        self.keys
            .entry(slot_index)
            .or_default()
            .insert(attachment.name().to_owned(), id);
        Some(id)
    }

    /// Looks up an existing entry without creating one.
    #[must_use]
    pub fn find(&self, slot_index: usize, name: &str) -> Option<GeometryId> {
        self.keys.get(&slot_index)?.get(name).copied()
    }

    /// Resolves an entry.
    #[inline]
    #[must_use]
    pub fn entry(&self, id: GeometryId) -> Option<&CachedGeometry> {
        self.entries.get(id.index())
    }

    /// Resolves an entry mutably.
    #[inline]
    pub fn entry_mut(&mut self, id: GeometryId) -> Option<&mut CachedGeometry> {
        self.entries.get_mut(id.index())
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.entries.clear();
    }
}
