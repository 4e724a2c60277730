//! # Pose Change Detection
//!
//! Tracks the ordered set of attachments visible in the draw order and
//! reports when it changes between frames.
//!
//! Comparison is positional and by identity: the n-th non-empty slot in
//! the draw order is compared against the n-th attachment recorded last
//! frame. Handles compare as integers, so a swap is O(1) per position.
//!
//! A dirty result means upstream batch registrations must be rebuilt.
//! World vertices are refreshed every frame regardless.

use crate::skeleton::{AttachmentId, Skeleton};

/// Detects changes in the draw order's attachment list.
#[derive(Debug, Default)]
pub struct PoseChangeDetector {
    /// Attachments seen on the previous call, in draw order.
    last_attachments: Vec<AttachmentId>,
}

impl PoseChangeDetector {
    /// Creates a detector with an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares the current draw order against the previous call.
    ///
    /// Returns true if any position holds a different attachment or the
    /// number of attachments changed. The stored list is overwritten in
    /// place.
    pub fn validate(&mut self, skeleton: &Skeleton) -> bool {
        let mut dirty = false;
        let mut count = 0;

        let slots = skeleton.slots();
        for &slot_index in skeleton.draw_order() {
            let Some(attachment) = slots.get(slot_index).and_then(|slot| slot.attachment) else {
                continue;
            };
            match self.last_attachments.get_mut(count) {
                Some(last) if *last == attachment => {}
                Some(last) => {
                    *last = attachment;
                    dirty = true;
                }
                None => {
                    self.last_attachments.push(attachment);
                    dirty = true;
                }
            }
            count += 1;
        }

        if count != self.last_attachments.len() {
            self.last_attachments.truncate(count);
            dirty = true;
        }

        dirty
    }

    /// Attachments recorded by the last call.
    #[must_use]
    pub fn last_attachments(&self) -> &[AttachmentId] {
        &self.last_attachments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{Attachment, RegionAttachment, TextureId, TextureRegion};

    fn skeleton_with_slots(names: &[&str]) -> (Skeleton, Vec<AttachmentId>) {
        let mut skeleton = Skeleton::new();
        skeleton.add_bone("root", None).unwrap();
        let mut ids = Vec::new();
        for name in names {
            skeleton.add_slot(name, "root").unwrap();
            let id = skeleton.add_attachment(Attachment::Region(RegionAttachment::new(
                *name,
                TextureRegion::full(TextureId(0)),
                1.0,
                1.0,
            )));
            skeleton.set_attachment(name, Some(id)).unwrap();
            ids.push(id);
        }
        (skeleton, ids)
    }

    #[test]
    fn test_identical_order_is_clean() {
        let (skeleton, _) = skeleton_with_slots(&["a", "b", "c"]);
        let mut detector = PoseChangeDetector::new();

        assert!(detector.validate(&skeleton)); // First sight
        assert!(!detector.validate(&skeleton));
    }

    #[test]
    fn test_replacement_at_same_position_is_dirty() {
        let (mut skeleton, _) = skeleton_with_slots(&["a", "b", "c"]);
        let mut detector = PoseChangeDetector::new();
        detector.validate(&skeleton);

        let x = skeleton.add_attachment(Attachment::Region(RegionAttachment::new(
            "x",
            TextureRegion::full(TextureId(0)),
            1.0,
            1.0,
        )));
        skeleton.set_attachment("b", Some(x)).unwrap();

        assert!(detector.validate(&skeleton));
        assert_eq!(detector.last_attachments()[1], x);
        assert!(!detector.validate(&skeleton));
    }

    #[test]
    fn test_hidden_slot_changes_count() {
        let (mut skeleton, ids) = skeleton_with_slots(&["a", "b", "c"]);
        let mut detector = PoseChangeDetector::new();
        detector.validate(&skeleton);

        skeleton.set_attachment("c", None).unwrap();
        assert!(detector.validate(&skeleton));
        assert_eq!(detector.last_attachments(), &ids[..2]);
    }

    #[test]
    fn test_reordering_is_dirty() {
        let (mut skeleton, _) = skeleton_with_slots(&["a", "b"]);
        let mut detector = PoseChangeDetector::new();
        detector.validate(&skeleton);

        skeleton.draw_order_mut().reverse();
        assert!(detector.validate(&skeleton));
    }

    #[test]
    fn test_out_of_range_draw_order_entry_skipped() {
        let (mut skeleton, ids) = skeleton_with_slots(&["a"]);
        skeleton.draw_order_mut().push(99);
        let mut detector = PoseChangeDetector::new();

        assert!(detector.validate(&skeleton));
        assert_eq!(detector.last_attachments(), &ids[..]);
    }
}
