//! Render pipe statistics.

/// Counters accumulated by the render pipe since the last
/// [`begin_frame`](crate::SkeletonRenderPipe::begin_frame).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Renderables walked.
    pub renderables: u32,
    /// Unclipped entries submitted to the batcher.
    pub entries_submitted: u32,
    /// Clipped entries submitted to the batcher.
    pub clipped_entries: u32,
    /// Attachments skipped because clipping removed every triangle.
    pub clipped_away: u32,
    /// Slot objects handed to the scene collector.
    pub slot_objects_collected: u32,
    /// Renderables whose visible attachment set changed.
    pub attachment_changes: u32,
}

impl RenderStats {
    /// Total entries submitted, clipped or not.
    #[must_use]
    pub fn total_entries(&self) -> u32 {
        self.entries_submitted + self.clipped_entries
    }

    /// Share of submitted entries that went through the clipper.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn clipped_ratio(&self) -> f32 {
        let total = self.total_entries();
        if total > 0 {
            self.clipped_entries as f32 / total as f32
        } else {
            0.0
        }
    }
}
