//! Attachment variants.
//!
//! Attachments are stored in the skeleton's arena and referenced from slots
//! by [`AttachmentId`]. Dispatch is a closed `match`, never a trait object.

use std::sync::Arc;

use skein_core::Handle;

use super::{Bone, Color};

/// Stable identity of an attachment inside a skeleton.
pub type AttachmentId = Handle<Attachment>;

/// Triangulation shared by every region attachment.
pub const QUAD_TRIANGLES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Number of world-vertex floats produced by a region attachment.
pub const QUAD_VERTEX_FLOATS: usize = 8;

/// Opaque texture identity. Residency is the batcher's concern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Sub-rectangle of a texture in normalized coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureRegion {
    /// Texture the region lives in.
    pub texture: TextureId,
    /// Left edge.
    pub u: f32,
    /// Top edge.
    pub v: f32,
    /// Right edge.
    pub u2: f32,
    /// Bottom edge.
    pub v2: f32,
}

impl TextureRegion {
    /// Region covering the whole texture.
    #[must_use]
    pub const fn full(texture: TextureId) -> Self {
        Self {
            texture,
            u: 0.0,
            v: 0.0,
            u2: 1.0,
            v2: 1.0,
        }
    }
}

/// Bone-space vertices, optionally weighted to several bones.
///
/// Unweighted data is `x, y` pairs relative to the slot's bone. Weighted data
/// follows the runtime layout: `bones` holds, per vertex, an influence count
/// followed by that many bone indices, and `vertices` holds an `x, y, weight`
/// triple per influence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexData {
    bones: Option<Vec<usize>>,
    vertices: Vec<f32>,
    world_vertices_length: usize,
}

impl VertexData {
    /// Creates vertex data bound to the slot's bone.
    #[must_use]
    pub fn unweighted(vertices: Vec<f32>) -> Self {
        let world_vertices_length = vertices.len();
        Self {
            bones: None,
            vertices,
            world_vertices_length,
        }
    }

    /// Creates vertex data weighted across bones.
    #[must_use]
    pub fn weighted(bones: Vec<usize>, vertices: Vec<f32>) -> Self {
        let mut vertex_count = 0;
        let mut i = 0;
        while i < bones.len() {
            i = i.saturating_add(bones[i]).saturating_add(1);
            vertex_count += 1;
        }
        Self {
            bones: Some(bones),
            vertices,
            world_vertices_length: vertex_count * 2,
        }
    }

    /// Number of floats written by [`VertexData::compute_world_vertices`].
    #[inline]
    #[must_use]
    pub const fn world_vertices_length(&self) -> usize {
        self.world_vertices_length
    }

    /// Returns true if the data is weighted to several bones.
    #[inline]
    #[must_use]
    pub const fn is_weighted(&self) -> bool {
        self.bones.is_some()
    }

    /// Transforms the vertices into skeleton space.
    ///
    /// `deform` holds per-vertex offsets from the slot (`x, y` per
    /// unweighted vertex or per weighted influence). A deform of any other
    /// length is ignored. `out` must hold at least `world_vertices_length`
    /// floats.
    ///
    /// Returns false if the data is malformed: an odd float count, a bone
    /// index outside `bones`, or influences missing from `vertices`. `out`
    /// is then partially written and must not be drawn.
    pub fn compute_world_vertices(
        &self,
        bones: &[Bone],
        slot_bone: &Bone,
        deform: &[f32],
        out: &mut [f32],
    ) -> bool {
        let count = self.world_vertices_length;
        if count % 2 != 0 || out.len() < count {
            return false;
        }

        let Some(weights) = &self.bones else {
            let local = if deform.len() == count { deform } else { &self.vertices };
            if local.len() < count {
                return false;
            }
            for (vertex, world) in local.chunks_exact(2).zip(out[..count].chunks_exact_mut(2)) {
                world[0] = vertex[0] * slot_bone.a + vertex[1] * slot_bone.b + slot_bone.world_x;
                world[1] = vertex[0] * slot_bone.c + vertex[1] * slot_bone.d + slot_bone.world_y;
            }
            return true;
        };

        let deform = if deform.len() == self.vertices.len() / 3 * 2 { deform } else { &[] };
        let mut influences = self.vertices.chunks_exact(3);
        let mut offsets = deform.chunks_exact(2);
        let mut v = 0;
        for world in out[..count].chunks_exact_mut(2) {
            let Some(&n) = weights.get(v) else {
                return false;
            };
            let Some(bone_indices) = weights.get(v + 1..).and_then(|rest| rest.get(..n)) else {
                return false;
            };
            v += n + 1;

            let (mut wx, mut wy) = (0.0, 0.0);
            for &bone_index in bone_indices {
                let (Some(bone), Some(influence)) = (bones.get(bone_index), influences.next()) else {
                    return false;
                };
                let (mut vx, mut vy, weight) = (influence[0], influence[1], influence[2]);
                if let Some(offset) = offsets.next() {
                    vx += offset[0];
                    vy += offset[1];
                }
                wx += (vx * bone.a + vy * bone.b + bone.world_x) * weight;
                wy += (vx * bone.c + vy * bone.d + bone.world_y) * weight;
            }
            world[0] = wx;
            world[1] = wy;
        }
        true
    }
}

/// A textured quad.
#[derive(Clone, Debug)]
pub struct RegionAttachment {
    /// Attachment name, unique within its slot.
    pub name: String,
    /// Texture region sampled by the quad.
    pub region: TextureRegion,
    /// Attachment tint.
    pub color: Color,
    width: f32,
    height: f32,
    offset: [f32; 8],
    uvs: Arc<[f32]>,
    triangles: Arc<[u16]>,
}

impl RegionAttachment {
    /// Creates a quad of `width` x `height` centered on its bone.
    #[must_use]
    pub fn new(name: impl Into<String>, region: TextureRegion, width: f32, height: f32) -> Self {
        let uvs: Arc<[f32]> = Arc::from(
            [
                region.u, region.v2, // BL
                region.u, region.v, // UL
                region.u2, region.v, // UR
                region.u2, region.v2, // BR
            ]
            .as_slice(),
        );
        let mut attachment = Self {
            name: name.into(),
            region,
            color: Color::WHITE,
            width,
            height,
            offset: [0.0; 8],
            uvs,
            triangles: Arc::from(QUAD_TRIANGLES.as_slice()),
        };
        attachment.set_transform(0.0, 0.0, 0.0, 1.0, 1.0);
        attachment
    }

    /// Places the quad relative to its bone. `rotation` is in degrees.
    pub fn set_transform(&mut self, x: f32, y: f32, rotation: f32, scale_x: f32, scale_y: f32) {
        let local_x = -self.width / 2.0 * scale_x;
        let local_y = -self.height / 2.0 * scale_y;
        let local_x2 = local_x + self.width * scale_x;
        let local_y2 = local_y + self.height * scale_y;

        let (sin, cos) = rotation.to_radians().sin_cos();
        let local_x_cos = local_x * cos + x;
        let local_x_sin = local_x * sin;
        let local_y_cos = local_y * cos + y;
        let local_y_sin = local_y * sin;
        let local_x2_cos = local_x2 * cos + x;
        let local_x2_sin = local_x2 * sin;
        let local_y2_cos = local_y2 * cos + y;
        let local_y2_sin = local_y2 * sin;

        self.offset = [
            local_x_cos - local_y_sin,
            local_y_cos + local_x_sin, // BL
            local_x_cos - local_y2_sin,
            local_y2_cos + local_x_sin, // UL
            local_x2_cos - local_y2_sin,
            local_y2_cos + local_x2_sin, // UR
            local_x2_cos - local_y_sin,
            local_y_cos + local_x2_sin, // BR
        ];
    }

    /// Shared UV list, `u, v` per corner.
    #[must_use]
    pub fn uvs(&self) -> &Arc<[f32]> {
        &self.uvs
    }

    /// Shared triangle list.
    #[must_use]
    pub fn triangles(&self) -> &Arc<[u16]> {
        &self.triangles
    }

    /// Transforms the quad corners through `bone` into `out[..8]`.
    pub fn compute_world_vertices(&self, bone: &Bone, out: &mut [f32]) {
        for (corner, world) in self.offset.chunks_exact(2).zip(out.chunks_exact_mut(2)) {
            world[0] = corner[0] * bone.a + corner[1] * bone.b + bone.world_x;
            world[1] = corner[0] * bone.c + corner[1] * bone.d + bone.world_y;
        }
    }
}

/// A textured, possibly weighted, triangle mesh.
#[derive(Clone, Debug)]
pub struct MeshAttachment {
    /// Attachment name, unique within its slot.
    pub name: String,
    /// Texture region the mesh UVs are mapped into.
    pub region: TextureRegion,
    /// Attachment tint.
    pub color: Color,
    /// Bone-space vertices.
    pub vertices: VertexData,
    uvs: Arc<[f32]>,
    triangles: Arc<[u16]>,
}

impl MeshAttachment {
    /// Creates a mesh. `region_uvs` are normalized to the region and get
    /// mapped into texture space here.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        region: TextureRegion,
        vertices: VertexData,
        region_uvs: &[f32],
        triangles: Vec<u16>,
    ) -> Self {
        let width = region.u2 - region.u;
        let height = region.v2 - region.v;
        let uvs: Vec<f32> = region_uvs
            .chunks_exact(2)
            .flat_map(|uv| [region.u + uv[0] * width, region.v + uv[1] * height])
            .collect();

        Self {
            name: name.into(),
            region,
            color: Color::WHITE,
            vertices,
            uvs: Arc::from(uvs),
            triangles: Arc::from(triangles),
        }
    }

    /// Shared UV list, `u, v` per vertex.
    #[must_use]
    pub fn uvs(&self) -> &Arc<[f32]> {
        &self.uvs
    }

    /// Shared triangle list.
    #[must_use]
    pub fn triangles(&self) -> &Arc<[u16]> {
        &self.triangles
    }
}

/// A clip polygon opened at its own slot.
#[derive(Clone, Debug)]
pub struct ClippingAttachment {
    /// Attachment name.
    pub name: String,
    /// Polygon vertices in bone space.
    pub vertices: VertexData,
    /// Slot index that closes the region. `None` clips to the end of the draw order.
    pub end_slot: Option<usize>,
}

impl ClippingAttachment {
    /// Creates a clipping attachment.
    #[must_use]
    pub fn new(name: impl Into<String>, vertices: VertexData, end_slot: Option<usize>) -> Self {
        Self {
            name: name.into(),
            vertices,
            end_slot,
        }
    }
}

/// A named point, used for effects anchoring. Never rendered.
#[derive(Clone, Debug)]
pub struct PointAttachment {
    /// Attachment name.
    pub name: String,
    /// Local x.
    pub x: f32,
    /// Local y.
    pub y: f32,
    /// Local rotation in degrees.
    pub rotation: f32,
}

/// A hit-test polygon. Never rendered.
#[derive(Clone, Debug)]
pub struct BoundingBoxAttachment {
    /// Attachment name.
    pub name: String,
    /// Polygon vertices in bone space.
    pub vertices: VertexData,
}

/// Anything a slot can hold.
#[derive(Clone, Debug)]
pub enum Attachment {
    /// Textured quad.
    Region(RegionAttachment),
    /// Textured mesh.
    Mesh(MeshAttachment),
    /// Clip region start.
    Clipping(ClippingAttachment),
    /// Anchor point.
    Point(PointAttachment),
    /// Hit-test polygon.
    BoundingBox(BoundingBoxAttachment),
}

impl Attachment {
    /// Attachment name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Region(a) => &a.name,
            Self::Mesh(a) => &a.name,
            Self::Clipping(a) => &a.name,
            Self::Point(a) => &a.name,
            Self::BoundingBox(a) => &a.name,
        }
    }

    /// Attachment tint. White for kinds without one.
    #[must_use]
    pub const fn color(&self) -> Color {
        match self {
            Self::Region(a) => a.color,
            Self::Mesh(a) => a.color,
            Self::Clipping(_) | Self::Point(_) | Self::BoundingBox(_) => Color::WHITE,
        }
    }

    /// Returns true for attachments that produce triangles.
    #[inline]
    #[must_use]
    pub const fn is_renderable(&self) -> bool {
        matches!(self, Self::Region(_) | Self::Mesh(_))
    }

    /// Number of world-vertex floats this attachment produces.
    #[must_use]
    pub const fn world_vertices_length(&self) -> usize {
        match self {
            Self::Region(_) => QUAD_VERTEX_FLOATS,
            Self::Mesh(a) => a.vertices.world_vertices_length(),
            Self::Clipping(a) => a.vertices.world_vertices_length(),
            Self::BoundingBox(a) => a.vertices.world_vertices_length(),
            Self::Point(_) => 0,
        }
    }
}
