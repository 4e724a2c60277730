//! # SKEIN Render
//!
//! Batching and clipping pipeline for posed 2D skeletons.
//!
//! Each frame, every visible region or mesh attachment of a
//! [`SkeletonRenderable`] is turned into a batch entry and packed into a
//! [`Batcher`]'s vertex and index buffers. Clipping attachments open
//! regions that later attachments are cut against.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       SkeletonRenderPipe                      │
//! ├───────────────────────────────────────────────────────────────┤
//! │  SkeletonRenderable                                           │
//! │  ├── PoseSource ──▶ Skeleton (bones, slots, draw order)       │
//! │  ├── PoseChangeDetector    (attachment set dirty flag)        │
//! │  └── AttachmentGeometryCache (world vertices per slot)        │
//! │                                                               │
//! │  ClippingCoordinator ──▶ Clipper (PolygonClipper)             │
//! │                                                               │
//! │  ObjectPool<BatchableSlot>        ──┐                         │
//! │  ObjectPool<ClippedBatchableSlot> ──┴──▶ Batcher              │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use skein_render::{
//!     Attachment, BufferBatcher, ContainerId, PolygonClipper, RegionAttachment, RenderConfig,
//!     SceneCollector, Skeleton, SkeletonRenderPipe, SkeletonRenderable, SlotObjectTransform,
//!     StaticPose, TextureId, TextureRegion,
//! };
//!
//! struct NoScene;
//! impl SceneCollector for NoScene {
//!     fn collect_renderables(&mut self, _: ContainerId, _: &SlotObjectTransform) {}
//! }
//!
//! let mut skeleton = Skeleton::new();
//! skeleton.add_bone("root", None)?;
//! skeleton.add_slot("body", "root")?;
//! let body = skeleton.add_attachment(Attachment::Region(RegionAttachment::new(
//!     "body",
//!     TextureRegion::full(TextureId(0)),
//!     32.0,
//!     32.0,
//! )));
//! skeleton.set_attachment("body", Some(body))?;
//!
//! let config = RenderConfig::default();
//! let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &config);
//! let mut pipe = SkeletonRenderPipe::new(PolygonClipper::new(), &config);
//! let mut batcher = BufferBatcher::from_config(&config);
//!
//! batcher.begin_frame();
//! pipe.add_renderable(&mut renderable, &mut batcher, &mut NoScene);
//! assert_eq!(batcher.vertex_count(), 4);
//! assert_eq!(batcher.indices(), &[0, 1, 2, 2, 3, 0]);
//! # Ok::<(), skein_render::RenderError>(())
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod change_detector;
pub mod clipping;
pub mod config;
pub mod error;
pub mod geometry_cache;
pub mod pipe;
pub mod renderable;
pub mod skeleton;
pub mod stats;

pub use batch::{
    AttributeView, BatchVertex, Batchable, BatchableSlot, Batcher, BufferBatcher,
    ClippedBatchableSlot, DrawBatch, GroupColor, SlotBatch, VERTEX_STRIDE,
};
pub use change_detector::PoseChangeDetector;
pub use clipping::{ClipResult, ClipState, ClippedView, Clipper, ClippingCoordinator, PolygonClipper};
pub use config::RenderConfig;
pub use error::{RenderError, RenderResult};
pub use geometry_cache::{AttachmentGeometryCache, CachedGeometry, GeometryId};
pub use pipe::SkeletonRenderPipe;
pub use renderable::{
    Bounds, ContainerId, RenderableId, SceneCollector, SkeletonRenderable, SlotObjectTransform,
};
pub use skeleton::{
    Attachment, AttachmentId, BlendMode, Bone, Color, MeshAttachment, PoseSource,
    RegionAttachment, Skeleton, Slot, StaticPose, TextureId, TextureRegion, VertexData,
};
pub use stats::RenderStats;
