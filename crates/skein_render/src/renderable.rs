//! # Skeleton Renderable
//!
//! One on-screen skeleton instance: the posed skeleton, its pose source,
//! and the per-instance state the render pipe reads every frame.
//!
//! ## Frame Contract
//!
//! ```text
//! tick(dt) / update(dt) ──▶ pose stale
//! apply_pose()          ──▶ pose applied, world transforms, change
//!                           detection, cache refresh, slot objects
//! apply_pose() again    ──▶ no-op until the next update
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::batch::GroupColor;
use crate::change_detector::PoseChangeDetector;
use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::geometry_cache::AttachmentGeometryCache;
use crate::skeleton::{Attachment, PoseSource, Skeleton};

static NEXT_RENDERABLE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique renderable identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderableId(u32);

impl RenderableId {
    /// Allocates a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_RENDERABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Handle to an external scene container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u32);

/// World transform handed to a slot object's container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotObjectTransform {
    /// World x of the slot's bone.
    pub x: f32,
    /// World y of the slot's bone.
    pub y: f32,
    /// World rotation in degrees.
    pub rotation: f32,
    /// World scale x.
    pub scale_x: f32,
    /// World scale y.
    pub scale_y: f32,
    /// Skeleton alpha times slot alpha.
    pub alpha: f32,
}

impl Default for SlotObjectTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            alpha: 1.0,
        }
    }
}

/// Receives containers that follow slots, in draw order.
pub trait SceneCollector {
    /// Collects `container` at its place in the draw order.
    fn collect_renderables(&mut self, container: ContainerId, transform: &SlotObjectTransform);
}

/// Axis-aligned bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Left edge.
    pub min_x: f32,
    /// Bottom edge.
    pub min_y: f32,
    /// Right edge.
    pub max_x: f32,
    /// Top edge.
    pub max_y: f32,
}

impl Bounds {
    /// Width.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Height.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    fn include(this: Option<Self>, x: f32, y: f32) -> Option<Self> {
        Some(match this {
            None => Self { min_x: x, min_y: y, max_x: x, max_y: y },
            Some(b) => Self {
                min_x: b.min_x.min(x),
                min_y: b.min_y.min(y),
                max_x: b.max_x.max(x),
                max_y: b.max_y.max(y),
            },
        })
    }
}

#[derive(Debug)]
struct SlotObject {
    container: ContainerId,
    transform: SlotObjectTransform,
}

/// A skeleton instance and its per-frame render state.
pub struct SkeletonRenderable<P: PoseSource> {
    id: RenderableId,
    skeleton: Skeleton,
    pose: P,
    cache: AttachmentGeometryCache,
    detector: PoseChangeDetector,
    slot_objects: HashMap<usize, SlotObject>,
    /// Tint inherited from the scene graph.
    pub group_color: GroupColor,
    /// Snap vertices to whole pixels in the shader.
    pub round_pixels: bool,
    /// Advance the pose from [`SkeletonRenderable::tick`].
    pub auto_update: bool,
    pose_applied: bool,
    attachments_dirty: bool,
    clip_bounds_warned: bool,
}

impl<P: PoseSource> SkeletonRenderable<P> {
    /// Wraps a skeleton and its pose source.
    #[must_use]
    pub fn new(skeleton: Skeleton, pose: P, config: &RenderConfig) -> Self {
        Self {
            id: RenderableId::next(),
            skeleton,
            pose,
            cache: AttachmentGeometryCache::new(),
            detector: PoseChangeDetector::new(),
            slot_objects: HashMap::new(),
            group_color: GroupColor::WHITE,
            round_pixels: config.round_pixels,
            auto_update: config.auto_update,
            pose_applied: false,
            attachments_dirty: false,
            clip_bounds_warned: false,
        }
    }

    /// Identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> RenderableId {
        self.id
    }

    /// Frame-clock entry point; advances the pose only with `auto_update`.
    pub fn tick(&mut self, delta: f32) {
        if self.auto_update {
            self.update(delta);
        }
    }

    /// Advances the pose source and marks the pose stale.
    pub fn update(&mut self, delta: f32) {
        self.pose.update(delta);
        self.pose_applied = false;
    }

    /// Returns true if the pose has been applied since the last update.
    #[must_use]
    pub const fn is_pose_applied(&self) -> bool {
        self.pose_applied
    }

    /// Applies the pose and refreshes everything derived from it.
    ///
    /// Returns true if the set of visible attachments changed. Does nothing
    /// and returns false if the pose is already applied.
    pub fn apply_pose(&mut self) -> bool {
        if self.pose_applied {
            return false;
        }
        self.pose_applied = true;

        self.pose.apply(&mut self.skeleton);
        self.skeleton.update_world_transform();

        let changed = self.detector.validate(&self.skeleton);
        if changed {
            self.attachments_dirty = true;
            tracing::debug!(
                renderable = self.id.raw(),
                attachments = self.detector.last_attachments().len(),
                "attachment set changed"
            );
        }

        self.refresh_geometry();
        self.refresh_slot_objects();
        changed
    }

    /// Returns and clears the attachment-set dirty flag.
    pub fn take_attachments_dirty(&mut self) -> bool {
        std::mem::take(&mut self.attachments_dirty)
    }

    fn refresh_geometry(&mut self) {
        let skeleton = &self.skeleton;
        for &slot_index in skeleton.draw_order() {
            let Some((attachment_id, attachment)) = skeleton.slot_attachment_at(slot_index) else {
                continue;
            };
            let Some(geometry) = self.cache.get(slot_index, attachment_id, attachment) else {
                continue;
            };
            let Some(entry) = self.cache.entry_mut(geometry) else {
                continue;
            };

            let drawable = skeleton.compute_world_vertices(slot_index, attachment, entry.vertices_mut());
            if !drawable {
                tracing::debug!(slot = slot_index, name = attachment.name(), "malformed vertex data skipped");
            }
            entry.set_drawable(drawable);
            let slot = &skeleton.slots()[slot_index];
            entry.color = skeleton.color * slot.color * attachment.color();
            entry.dark_color = slot.dark_color;
        }
    }

    fn refresh_slot_objects(&mut self) {
        let skeleton = &self.skeleton;
        for (&slot_index, object) in &mut self.slot_objects {
            let slot = &skeleton.slots()[slot_index];
            let bone = &skeleton.bones()[slot.bone];
            object.transform = SlotObjectTransform {
                x: bone.world_x,
                y: bone.world_y,
                rotation: bone.world_rotation_x(),
                scale_x: bone.world_scale_x(),
                scale_y: bone.world_scale_y(),
                alpha: skeleton.color.a * slot.color.a,
            };
        }
    }

    /// The skeleton.
    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Mutable skeleton access. Marks the pose stale.
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        self.pose_applied = false;
        &mut self.skeleton
    }

    /// The pose source.
    #[must_use]
    pub fn pose(&self) -> &P {
        &self.pose
    }

    /// Mutable pose source access. Marks the pose stale.
    pub fn pose_mut(&mut self) -> &mut P {
        self.pose_applied = false;
        &mut self.pose
    }

    /// The geometry cache.
    #[must_use]
    pub fn cache(&self) -> &AttachmentGeometryCache {
        &self.cache
    }

    /// Attaches `container` to a named slot, replacing any container there.
    /// A container follows at most one slot; it is detached from its
    /// previous slot first.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SlotNotFound`](crate::RenderError::SlotNotFound)
    /// if no slot has that name.
    pub fn add_slot_object(&mut self, slot_name: &str, container: ContainerId) -> RenderResult<()> {
        let slot_index = self.skeleton.find_slot(slot_name)?;
        self.detach_container(container);
        self.slot_objects.insert(
            slot_index,
            SlotObject {
                container,
                transform: SlotObjectTransform::default(),
            },
        );
        self.pose_applied = false;
        Ok(())
    }

    /// Detaches whatever container follows a named slot.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SlotNotFound`](crate::RenderError::SlotNotFound)
    /// if no slot has that name.
    pub fn remove_slot_object(&mut self, slot_name: &str) -> RenderResult<Option<ContainerId>> {
        let slot_index = self.skeleton.find_slot(slot_name)?;
        Ok(self.slot_objects.remove(&slot_index).map(|o| o.container))
    }

    /// Detaches `container` from whichever slot it follows.
    pub fn detach_container(&mut self, container: ContainerId) -> bool {
        let before = self.slot_objects.len();
        self.slot_objects.retain(|_, o| o.container != container);
        self.slot_objects.len() != before
    }

    /// Container following a named slot.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SlotNotFound`](crate::RenderError::SlotNotFound)
    /// if no slot has that name.
    pub fn slot_object(&self, slot_name: &str) -> RenderResult<Option<ContainerId>> {
        let slot_index = self.skeleton.find_slot(slot_name)?;
        Ok(self.slot_objects.get(&slot_index).map(|o| o.container))
    }

    /// Container and transform for the slot at `slot_index`.
    #[must_use]
    pub fn slot_object_at(&self, slot_index: usize) -> Option<(ContainerId, &SlotObjectTransform)> {
        self.slot_objects
            .get(&slot_index)
            .map(|o| (o.container, &o.transform))
    }

    /// Axis-aligned bounds of the posed region and mesh geometry.
    ///
    /// Clipping is not applied; the first clipping attachment seen logs a
    /// warning. Returns `None` if nothing is visible.
    pub fn bounds(&mut self) -> Option<Bounds> {
        self.apply_pose();

        let mut bounds = None;
        for &slot_index in self.skeleton.draw_order() {
            let Some((_, attachment)) = self.skeleton.slot_attachment_at(slot_index) else {
                continue;
            };
            if let Attachment::Clipping(_) = attachment {
                if !self.clip_bounds_warned {
                    self.clip_bounds_warned = true;
                    tracing::warn!(
                        renderable = self.id.raw(),
                        "clipping attachments are not applied to bounds"
                    );
                }
                continue;
            }
            let Some(entry) = self
                .cache
                .find(slot_index, attachment.name())
                .and_then(|id| self.cache.entry(id))
                .filter(|entry| entry.is_drawable())
            else {
                continue;
            };
            for point in entry.vertices().chunks_exact(2) {
                bounds = Bounds::include(bounds, point[0], point[1]);
            }
        }
        bounds
    }
}
