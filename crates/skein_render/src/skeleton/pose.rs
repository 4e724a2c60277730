//! Pose source seam.
//!
//! Timeline sampling and track mixing happen behind this trait. The
//! pipeline calls `update` when time advances and `apply` once per frame
//! before reading bones and slots.

use super::Skeleton;

/// Drives a skeleton's local pose.
pub trait PoseSource {
    /// Advances internal time by `delta` seconds.
    fn update(&mut self, delta: f32);

    /// Writes the current pose into the skeleton's bones and slots.
    fn apply(&mut self, skeleton: &mut Skeleton);
}

/// Leaves the skeleton in whatever pose it was built with.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticPose;

impl PoseSource for StaticPose {
    fn update(&mut self, _delta: f32) {}

    fn apply(&mut self, _skeleton: &mut Skeleton) {}
}
