//! # Skeleton Render Pipe
//!
//! Turns a posed [`SkeletonRenderable`] into batch submissions, once per
//! frame per instance.
//!
//! ## Walk
//!
//! ```text
//! for slot in draw order:
//!     Clipping      ─▶ open clip region
//!     Region / Mesh ─▶ clip? ─▶ pooled entry ─▶ batcher
//!     slot object   ─▶ scene collector
//!     end of slot   ─▶ close region if this is its end slot
//! close any open region
//! ```
//!
//! Pooled entries are keyed by cache entry and held per renderable until
//! [`SkeletonRenderPipe::destroy_renderable`] returns them.

use std::collections::HashMap;

use skein_core::ObjectPool;

use crate::batch::{Batcher, BatchableSlot, ClippedBatchableSlot};
use crate::clipping::{ClipResult, Clipper, ClippingCoordinator};
use crate::config::RenderConfig;
use crate::geometry_cache::GeometryId;
use crate::renderable::{RenderableId, SceneCollector, SkeletonRenderable};
use crate::skeleton::{Attachment, PoseSource};
use crate::stats::RenderStats;

/// Pooled entries owned by one renderable.
#[derive(Debug, Default)]
struct RenderableEntries {
    slots: HashMap<GeometryId, BatchableSlot>,
    clipped: HashMap<GeometryId, ClippedBatchableSlot>,
}

/// Per-frame orchestrator for skeleton renderables.
pub struct SkeletonRenderPipe<C: Clipper> {
    coordinator: ClippingCoordinator<C>,
    slot_pool: ObjectPool<BatchableSlot>,
    clipped_pool: ObjectPool<ClippedBatchableSlot>,
    entries: HashMap<RenderableId, RenderableEntries>,
    stats: RenderStats,
}

impl<C: Clipper> SkeletonRenderPipe<C> {
    /// Creates a pipe around `clipper` with pools pre-warmed from `config`.
    #[must_use]
    pub fn new(clipper: C, config: &RenderConfig) -> Self {
        Self {
            coordinator: ClippingCoordinator::new(clipper),
            slot_pool: ObjectPool::with_capacity(config.pool_prewarm),
            clipped_pool: ObjectPool::with_capacity(config.pool_prewarm),
            entries: HashMap::new(),
            stats: RenderStats::default(),
        }
    }

    /// Applies the renderable's pose if stale and reports whether its
    /// visible attachment set changed since the last check.
    pub fn validate_renderable<P: PoseSource>(&mut self, renderable: &mut SkeletonRenderable<P>) -> bool {
        renderable.apply_pose();
        renderable.take_attachments_dirty()
    }

    /// Walks the renderable's draw order and submits every visible
    /// attachment to `batcher`. Slot objects go to `collector` at their
    /// place in the draw order.
    pub fn add_renderable<P, B, S>(
        &mut self,
        renderable: &mut SkeletonRenderable<P>,
        batcher: &mut B,
        collector: &mut S,
    ) where
        P: PoseSource,
        B: Batcher,
        S: SceneCollector,
    {
        if renderable.apply_pose() {
            self.stats.attachment_changes += 1;
        }
        self.stats.renderables += 1;

        let Self {
            coordinator,
            slot_pool,
            clipped_pool,
            entries,
            stats,
        } = self;

        let renderable: &SkeletonRenderable<P> = renderable;
        let id = renderable.id();
        let round_pixels = renderable.round_pixels;
        let group = renderable.group_color;
        let skeleton = renderable.skeleton();
        let cache = renderable.cache();
        let owned = entries.entry(id).or_default();

        for &slot_index in skeleton.draw_order() {
            match skeleton.slot_attachment_at(slot_index) {
                Some((_, Attachment::Clipping(clip))) => {
                    coordinator.start(skeleton, slot_index, clip);
                }
                Some((attachment_id, attachment @ (Attachment::Region(_) | Attachment::Mesh(_)))) => {
                    let geometry = cache
                        .find(slot_index, attachment.name())
                        .and_then(|g| cache.entry(g))
                        .filter(|g| g.attachment() == attachment_id && g.is_drawable());

                    if let Some(geometry) = geometry {
                        let blend_mode = skeleton.slots()[slot_index].blend_mode;
                        match coordinator.clip(
                            geometry.vertices(),
                            geometry.indices(),
                            geometry.uvs(),
                            geometry.color,
                            geometry.dark_color,
                        ) {
                            ClipResult::Passthrough => {
                                let entry = owned
                                    .slots
                                    .entry(geometry.id())
                                    .or_insert_with(|| slot_pool.acquire());
                                entry.set_data(
                                    id,
                                    geometry.id(),
                                    geometry.texture(),
                                    blend_mode,
                                    round_pixels,
                                    group,
                                );
                                batcher.add_to_batch(&entry.view(geometry));
                                stats.entries_submitted += 1;
                            }
                            ClipResult::Empty => {
                                tracing::trace!(slot = slot_index, name = attachment.name(), "clipped away");
                                stats.clipped_away += 1;
                            }
                            ClipResult::Clipped(view) => {
                                let entry = owned
                                    .clipped
                                    .entry(geometry.id())
                                    .or_insert_with(|| clipped_pool.acquire());
                                entry.set_data(
                                    id,
                                    geometry.texture(),
                                    blend_mode,
                                    round_pixels,
                                    group,
                                    geometry.color,
                                );
                                entry.set_clipper(view);
                                batcher.add_to_batch(&*entry);
                                stats.clipped_entries += 1;
                            }
                        }
                    }
                }
                Some((_, attachment)) => {
                    tracing::trace!(
                        slot = slot_index,
                        name = attachment.name(),
                        "skipping non-rendering attachment"
                    );
                }
                None => {}
            }

            if let Some((container, transform)) = renderable.slot_object_at(slot_index) {
                collector.collect_renderables(container, transform);
                stats.slot_objects_collected += 1;
            }

            coordinator.end_slot(slot_index);
        }

        coordinator.finish();
    }

    /// Returns every pooled entry held for `id` to the pools.
    pub fn destroy_renderable(&mut self, id: RenderableId) {
        let Some(owned) = self.entries.remove(&id) else {
            return;
        };
        tracing::debug!(
            renderable = id.raw(),
            entries = owned.slots.len() + owned.clipped.len(),
            "releasing batch entries"
        );
        self.slot_pool.release_all(owned.slots.into_values());
        self.clipped_pool.release_all(owned.clipped.into_values());
    }

    /// Number of renderables holding pooled entries.
    #[must_use]
    pub fn tracked_renderables(&self) -> usize {
        self.entries.len()
    }

    /// Batch entries currently checked out of both pools.
    #[must_use]
    pub fn outstanding_entries(&self) -> usize {
        self.slot_pool.outstanding() + self.clipped_pool.outstanding()
    }

    /// Clipping coordinator, for inspection between walks.
    #[must_use]
    pub fn coordinator(&self) -> &ClippingCoordinator<C> {
        &self.coordinator
    }

    /// Counters since the last [`SkeletonRenderPipe::begin_frame`].
    #[must_use]
    pub const fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Resets frame counters.
    pub fn begin_frame(&mut self) {
        self.stats = RenderStats::default();
    }
}
