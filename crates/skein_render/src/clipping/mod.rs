//! # Clip Region Coordination
//!
//! Walks clip markers embedded in the draw order and feeds renderable
//! geometry through a [`Clipper`] while a region is open.
//!
//! ## State Machine
//!
//! ```text
//!            clipping attachment
//!   ┌──────┐ ─────────────────────▶ ┌──────────┐
//!   │ Idle │                        │ Clipping │ ── region/mesh ──▶ clip_triangles
//!   └──────┘ ◀───────────────────── └──────────┘
//!        end slot reached, or end of walk
//! ```
//!
//! Exactly one region is open at a time. The end-of-walk reset runs
//! unconditionally, so malformed markers never leak a region into the next
//! frame.

mod polygon;

pub use polygon::PolygonClipper;

use crate::skeleton::{ClippingAttachment, Color, Skeleton};

/// Floats per clipped vertex without two-color tint: `x, y, r, g, b, a, u, v`.
pub const CLIPPED_STRIDE: usize = 8;
/// Floats per clipped vertex with two-color tint: adds `dr, dg, db, da`.
pub const CLIPPED_STRIDE_TWO_COLOR: usize = 12;
/// Offset of `u` inside a clipped vertex.
pub const CLIPPED_UV_OFFSET: usize = 6;

/// Triangle-against-polygon clipping service.
///
/// Output buffers belong to the clipper and are overwritten by the next
/// `clip_triangles` call; consumers copy what they need before that.
pub trait Clipper {
    /// Opens a region for the clip attachment in `slot_index`. `polygon`
    /// is the clip outline in world space, `x, y` per vertex.
    fn clip_start(&mut self, slot_index: usize, end_slot: Option<usize>, polygon: &[f32]);

    /// Clips indexed triangles (`x, y` vertices, `u, v` per vertex) against
    /// the open region.
    fn clip_triangles(
        &mut self,
        vertices: &[f32],
        triangles: &[u16],
        uvs: &[f32],
        light: Color,
        dark: Color,
        two_color: bool,
    );

    /// Output vertices of the last `clip_triangles` call.
    fn clipped_vertices(&self) -> &[f32];

    /// Output triangles of the last `clip_triangles` call.
    fn clipped_triangles(&self) -> &[u16];

    /// Floats per output vertex.
    fn clipped_vertex_stride(&self) -> usize;

    /// Returns true while a region is open.
    fn is_clipping(&self) -> bool;

    /// Closes the region if `slot_index` is its end slot.
    fn clip_end_with_slot(&mut self, slot_index: usize);

    /// Closes any open region.
    fn clip_end(&mut self);
}

/// Coordinator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipState {
    /// No region open.
    Idle,
    /// A region opened by the clip attachment in `slot` is active.
    Clipping {
        /// Slot holding the clip attachment.
        slot: usize,
    },
}

/// Borrowed view of clipper output. Valid until the next clip call.
#[derive(Clone, Copy, Debug)]
pub struct ClippedView<'a> {
    /// Interleaved vertices, `stride` floats each.
    pub vertices: &'a [f32],
    /// Triangle indices into `vertices`.
    pub triangles: &'a [u16],
    /// Floats per vertex.
    pub stride: usize,
}

/// Outcome of feeding geometry through the coordinator.
#[derive(Debug)]
pub enum ClipResult<'a> {
    /// No region is open; pack the geometry unclipped.
    Passthrough,
    /// The geometry lies entirely outside the region.
    Empty,
    /// Clipped geometry to pack instead of the original.
    Clipped(ClippedView<'a>),
}

/// Drives a [`Clipper`] across one draw-order walk.
pub struct ClippingCoordinator<C: Clipper> {
    clipper: C,
    state: ClipState,
    /// World-space clip outline scratch.
    polygon: Vec<f32>,
}

impl<C: Clipper> ClippingCoordinator<C> {
    /// Wraps a clipper.
    #[must_use]
    pub fn new(clipper: C) -> Self {
        Self {
            clipper,
            state: ClipState::Idle,
            polygon: Vec::new(),
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ClipState {
        self.state
    }

    /// Returns true while a region is open.
    #[inline]
    #[must_use]
    pub const fn is_clipping(&self) -> bool {
        matches!(self.state, ClipState::Clipping { .. })
    }

    /// The wrapped clipper.
    #[must_use]
    pub fn clipper(&self) -> &C {
        &self.clipper
    }

    /// Opens a region for `clip`, held by the slot at `slot_index`.
    ///
    /// Ignored while another region is open.
    pub fn start(&mut self, skeleton: &Skeleton, slot_index: usize, clip: &ClippingAttachment) {
        if self.is_clipping() {
            return;
        }

        self.polygon.clear();
        self.polygon.resize(clip.vertices.world_vertices_length(), 0.0);
        let Some(bone) = skeleton
            .slots()
            .get(slot_index)
            .and_then(|slot| skeleton.bones().get(slot.bone))
        else {
            return;
        };
        if !clip
            .vertices
            .compute_world_vertices(skeleton.bones(), bone, &[], &mut self.polygon)
        {
            tracing::debug!(slot = slot_index, name = %clip.name, "malformed clip outline ignored");
            return;
        }

        self.clipper.clip_start(slot_index, clip.end_slot, &self.polygon);
        if self.clipper.is_clipping() {
            self.state = ClipState::Clipping { slot: slot_index };
        }
    }

    /// Clips world-space triangles against the open region.
    ///
    /// While idle the clipper is not touched and the result is
    /// [`ClipResult::Passthrough`].
    pub fn clip(
        &mut self,
        vertices: &[f32],
        triangles: &[u16],
        uvs: &[f32],
        light: Color,
        dark: Option<Color>,
    ) -> ClipResult<'_> {
        if !self.is_clipping() {
            return ClipResult::Passthrough;
        }

        self.clipper.clip_triangles(
            vertices,
            triangles,
            uvs,
            light,
            dark.unwrap_or(Color::TRANSPARENT),
            dark.is_some(),
        );

        let view = ClippedView {
            vertices: self.clipper.clipped_vertices(),
            triangles: self.clipper.clipped_triangles(),
            stride: self.clipper.clipped_vertex_stride(),
        };
        if view.triangles.is_empty() {
            ClipResult::Empty
        } else {
            ClipResult::Clipped(view)
        }
    }

    /// Called after each slot of the walk; closes the region at its end slot.
    pub fn end_slot(&mut self, slot_index: usize) {
        if !self.is_clipping() {
            return;
        }
        self.clipper.clip_end_with_slot(slot_index);
        if !self.clipper.is_clipping() {
            self.state = ClipState::Idle;
        }
    }

    /// Closes any open region. Runs at the end of every walk.
    pub fn finish(&mut self) {
        self.clipper.clip_end();
        self.state = ClipState::Idle;
    }
}
