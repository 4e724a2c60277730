//! # Posed Skeleton
//!
//! The skeleton model the pipeline reads every frame:
//! - Bones with a world affine `(a, b, c, d, world_x, world_y)`
//! - Slots holding at most one attachment and a tint
//! - A draw order of slot indices
//!
//! Animation evaluation lives outside this crate and reaches the skeleton
//! through [`PoseSource`]. The pipeline only reads post-pose state.

mod attachment;
mod pose;

pub use attachment::{
    Attachment, AttachmentId, BoundingBoxAttachment, ClippingAttachment, MeshAttachment,
    PointAttachment, RegionAttachment, TextureId, TextureRegion, VertexData, QUAD_TRIANGLES,
    QUAD_VERTEX_FLOATS,
};
pub use pose::{PoseSource, StaticPose};

use std::ops::Mul;

use skein_core::Arena;

use crate::error::{RenderError, RenderResult};

/// Linear RGBA color, channels nominally in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a color.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Mul for Color {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a)
    }
}

/// How a slot's pixels combine with the framebuffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Premultiplied source-over.
    #[default]
    Normal,
    /// Additive.
    Additive,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
}

/// A bone with its local pose and computed world affine.
#[derive(Clone, Debug)]
pub struct Bone {
    /// Bone name.
    pub name: String,
    parent: Option<usize>,

    /// Local x.
    pub x: f32,
    /// Local y.
    pub y: f32,
    /// Local rotation in degrees.
    pub rotation: f32,
    /// Local x scale.
    pub scale_x: f32,
    /// Local y scale.
    pub scale_y: f32,

    /// World affine, row 0 column 0.
    pub a: f32,
    /// World affine, row 0 column 1.
    pub b: f32,
    /// World affine, row 1 column 0.
    pub c: f32,
    /// World affine, row 1 column 1.
    pub d: f32,
    /// World translation x.
    pub world_x: f32,
    /// World translation y.
    pub world_y: f32,
}

impl Bone {
    /// Creates a bone at the origin with an identity world transform.
    #[must_use]
    pub fn new(name: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            world_x: 0.0,
            world_y: 0.0,
        }
    }

    /// Parent bone index.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// World rotation of the bone's x axis, in degrees.
    #[must_use]
    pub fn world_rotation_x(&self) -> f32 {
        self.c.atan2(self.a).to_degrees()
    }

    /// World scale along the bone's x axis.
    #[must_use]
    pub fn world_scale_x(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }

    /// World scale along the bone's y axis.
    #[must_use]
    pub fn world_scale_y(&self) -> f32 {
        (self.b * self.b + self.d * self.d).sqrt()
    }

    fn local_affine(&self) -> [f32; 4] {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        [cos * self.scale_x, -sin * self.scale_y, sin * self.scale_x, cos * self.scale_y]
    }
}

/// An attachment point on a bone.
#[derive(Clone, Debug)]
pub struct Slot {
    /// Slot name.
    pub name: String,
    /// Index of the owning bone.
    pub bone: usize,
    /// Tint.
    pub color: Color,
    /// Two-color tint, if the slot uses one.
    pub dark_color: Option<Color>,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Current attachment.
    pub attachment: Option<AttachmentId>,
    /// Per-vertex offsets for the current mesh attachment; empty for none.
    pub deform: Vec<f32>,
}

impl Slot {
    /// Creates an empty white slot on `bone`.
    #[must_use]
    pub fn new(name: impl Into<String>, bone: usize) -> Self {
        Self {
            name: name.into(),
            bone,
            color: Color::WHITE,
            dark_color: None,
            blend_mode: BlendMode::Normal,
            attachment: None,
            deform: Vec::new(),
        }
    }
}

/// A posed skeleton.
pub struct Skeleton {
    bones: Vec<Bone>,
    slots: Vec<Slot>,
    draw_order: Vec<usize>,
    attachments: Arena<Attachment>,
    /// Skeleton-wide tint.
    pub color: Color,
    /// Root x.
    pub x: f32,
    /// Root y.
    pub y: f32,
    /// Root x scale. Negative flips.
    pub scale_x: f32,
    /// Root y scale. Negative flips.
    pub scale_y: f32,
}

impl Skeleton {
    /// Creates an empty skeleton.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bones: Vec::new(),
            slots: Vec::new(),
            draw_order: Vec::new(),
            attachments: Arena::new(),
            color: Color::WHITE,
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Adds a bone under `parent` and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::BoneNotFound`] if `parent` names no bone.
    pub fn add_bone(&mut self, name: &str, parent: Option<&str>) -> RenderResult<usize> {
        let parent = parent.map(|parent| self.find_bone(parent)).transpose()?;
        self.bones.push(Bone::new(name, parent));
        Ok(self.bones.len() - 1)
    }

    /// Adds a slot on `bone` at the end of the draw order and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::BoneNotFound`] if `bone` names no bone.
    pub fn add_slot(&mut self, name: &str, bone: &str) -> RenderResult<usize> {
        let bone = self.find_bone(bone)?;
        self.slots.push(Slot::new(name, bone));
        let index = self.slots.len() - 1;
        self.draw_order.push(index);
        Ok(index)
    }

    /// Stores an attachment and returns its handle.
    pub fn add_attachment(&mut self, attachment: Attachment) -> AttachmentId {
        self.attachments.insert(attachment)
    }

    /// Removes an attachment. Slots still pointing at it render nothing.
    pub fn remove_attachment(&mut self, id: AttachmentId) -> Option<Attachment> {
        self.attachments.remove(id)
    }

    /// Resolves an attachment handle.
    #[inline]
    #[must_use]
    pub fn attachment(&self, id: AttachmentId) -> Option<&Attachment> {
        self.attachments.get(id)
    }

    /// Resolves an attachment handle mutably.
    #[inline]
    pub fn attachment_mut(&mut self, id: AttachmentId) -> Option<&mut Attachment> {
        self.attachments.get_mut(id)
    }

    /// All bones, parents before children.
    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Mutable bone access for the pose source.
    #[inline]
    pub fn bones_mut(&mut self) -> &mut [Bone] {
        &mut self.bones
    }

    /// All slots in setup order.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Mutable slot access for the pose source.
    #[inline]
    pub fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    /// Current draw order as slot indices.
    #[inline]
    #[must_use]
    pub fn draw_order(&self) -> &[usize] {
        &self.draw_order
    }

    /// Mutable draw order. Entries must be valid slot indices.
    #[inline]
    pub fn draw_order_mut(&mut self) -> &mut Vec<usize> {
        &mut self.draw_order
    }

    /// Finds a bone index by name.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::BoneNotFound`] if no bone has that name.
    pub fn find_bone(&self, name: &str) -> RenderResult<usize> {
        self.bones
            .iter()
            .position(|bone| bone.name == name)
            .ok_or_else(|| RenderError::BoneNotFound(name.to_owned()))
    }

    /// Finds a slot index by name.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SlotNotFound`] if no slot has that name.
    pub fn find_slot(&self, name: &str) -> RenderResult<usize> {
        self.slots
            .iter()
            .position(|slot| slot.name == name)
            .ok_or_else(|| RenderError::SlotNotFound(name.to_owned()))
    }

    /// Sets or clears the attachment of a named slot.
    ///
    /// Changing the attachment drops the slot's deform.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SlotNotFound`] if no slot has that name.
    pub fn set_attachment(
        &mut self,
        slot_name: &str,
        attachment: Option<AttachmentId>,
    ) -> RenderResult<()> {
        let index = self.find_slot(slot_name)?;
        let slot = &mut self.slots[index];
        if slot.attachment != attachment {
            slot.attachment = attachment;
            slot.deform.clear();
        }
        Ok(())
    }

    /// Returns the attachment currently held by a named slot.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SlotNotFound`] if no slot has that name.
    pub fn slot_attachment(&self, slot_name: &str) -> RenderResult<Option<&Attachment>> {
        let index = self.find_slot(slot_name)?;
        Ok(self.slot_attachment_at(index).map(|(_, attachment)| attachment))
    }

    /// Returns the live attachment of the slot at `index`.
    #[must_use]
    pub fn slot_attachment_at(&self, index: usize) -> Option<(AttachmentId, &Attachment)> {
        let id = self.slots.get(index)?.attachment?;
        self.attachments.get(id).map(|attachment| (id, attachment))
    }

    /// Recomputes every bone's world affine from its local pose.
    pub fn update_world_transform(&mut self) {
        for i in 0..self.bones.len() {
            let [la, lb, lc, ld] = self.bones[i].local_affine();
            let (x, y) = (self.bones[i].x, self.bones[i].y);

            let parent = self.bones[i].parent.map(|p| {
                let p = &self.bones[p];
                (p.a, p.b, p.c, p.d, p.world_x, p.world_y)
            });

            let bone = &mut self.bones[i];
            if let Some((pa, pb, pc, pd, px, py)) = parent {
                bone.world_x = pa * x + pb * y + px;
                bone.world_y = pc * x + pd * y + py;
                bone.a = pa * la + pb * lc;
                bone.b = pa * lb + pb * ld;
                bone.c = pc * la + pd * lc;
                bone.d = pc * lb + pd * ld;
            } else {
                let (sx, sy) = (self.scale_x, self.scale_y);
                bone.world_x = x * sx + self.x;
                bone.world_y = y * sy + self.y;
                bone.a = la * sx;
                bone.b = lb * sx;
                bone.c = lc * sy;
                bone.d = ld * sy;
            }
        }
    }

    /// Writes the world vertices of `attachment` as held by the slot at
    /// `slot_index` into `out`.
    ///
    /// Point attachments write nothing. Returns false if the slot or its
    /// bone is missing or the attachment's vertex data is malformed.
    pub fn compute_world_vertices(&self, slot_index: usize, attachment: &Attachment, out: &mut [f32]) -> bool {
        let Some(slot) = self.slots.get(slot_index) else {
            return false;
        };
        let Some(bone) = self.bones.get(slot.bone) else {
            return false;
        };
        match attachment {
            Attachment::Region(region) => {
                if out.len() < QUAD_VERTEX_FLOATS {
                    return false;
                }
                region.compute_world_vertices(bone, out);
                true
            }
            Attachment::Mesh(mesh) => {
                mesh.vertices.compute_world_vertices(&self.bones, bone, &slot.deform, out)
            }
            Attachment::Clipping(clip) => {
                clip.vertices.compute_world_vertices(&self.bones, bone, &[], out)
            }
            Attachment::BoundingBox(bounds) => {
                bounds.vertices.compute_world_vertices(&self.bones, bone, &[], out)
            }
            Attachment::Point(_) => true,
        }
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new()
    }
}
