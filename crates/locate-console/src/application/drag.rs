//! Drag-commit pipeline for moving anchors on the map.
//!
//! A drag produces far more pointer moves than the server needs to see.  The
//! pipeline splits each gesture into two streams:
//!
//! - a **preview** updated on every move, which the view draws instead of the
//!   stored position so the marker never lags the pointer
//! - **commits** into the [`AnchorStore`], at most one per rendering frame,
//!   rounded to centimeters and skipped when the rounded value has not changed
//!
//! ```text
//! down ──▶ move* ──▶ (frame tick: commit pending) ──▶ … ──▶ up/cancel: final commit
//! ```
//!
//! Ending the drag commits synchronously, drops any pending frame request,
//! and releases the pointer.

use locate_core::{MacAddress, PixelsPerMeter, RenderGeometry, ScreenPoint, WorldPoint};
use tracing::debug;

use crate::application::stores::AnchorStore;

/// State of one drag gesture.
#[derive(Debug, Clone, PartialEq)]
struct DragSession {
    map_id: String,
    mac: MacAddress,
    pointer_id: u32,
    /// Position the marker is drawn at.
    preview: WorldPoint,
    /// Unrounded position waiting for the next frame.
    pending: Option<WorldPoint>,
    /// Last rounded value known to the store for this anchor.
    last_committed: Option<WorldPoint>,
}

/// Owns at most one drag at a time.
#[derive(Debug, Default)]
pub struct DragPipeline {
    active: Option<DragSession>,
    frame_requested: bool,
    commits: u64,
}

impl DragPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures `mac` for `pointer_id`.  Returns `false` if a drag is already
    /// in progress.
    ///
    /// `stored` is the anchor's current position in the store, if it has one.
    /// Releasing without moving off it commits nothing.
    pub fn begin(
        &mut self,
        map_id: &str,
        mac: MacAddress,
        pointer_id: u32,
        start: WorldPoint,
        stored: Option<WorldPoint>,
    ) -> bool {
        if let Some(current) = &self.active {
            debug!("drag of {} already active; ignoring {mac}", current.mac);
            return false;
        }
        self.active = Some(DragSession {
            map_id: map_id.to_string(),
            mac,
            pointer_id,
            preview: start,
            pending: None,
            last_committed: stored.map(|p| p.rounded()),
        });
        true
    }

    /// Moves the preview to the clamped world position under `screen` and
    /// schedules a commit for the next frame.
    ///
    /// Moves from other pointers are ignored.
    pub fn pointer_move(
        &mut self,
        pointer_id: u32,
        screen: ScreenPoint,
        geometry: &RenderGeometry,
        ratio: PixelsPerMeter,
    ) -> Option<WorldPoint> {
        let session = self.active.as_mut().filter(|s| s.pointer_id == pointer_id)?;
        let world = geometry.screen_to_world_clamped(screen, ratio);
        session.preview = world;
        session.pending = Some(world);
        self.frame_requested = true;
        Some(world)
    }

    /// Frame tick: commits the pending position, if any.
    pub fn on_frame(&mut self, anchors: &AnchorStore) -> bool {
        self.frame_requested = false;
        let Some(session) = self.active.as_mut() else {
            return false;
        };
        let Some(point) = session.pending.take() else {
            return false;
        };
        let committed = commit(session, point, anchors);
        if committed {
            self.commits += 1;
        }
        committed
    }

    /// Pointer id that owns the active drag.
    pub fn owner(&self) -> Option<u32> {
        self.active.as_ref().map(|s| s.pointer_id)
    }

    /// Pointer up: final commit and release.  Ignored for other pointers.
    pub fn end(&mut self, pointer_id: u32, anchors: &AnchorStore) -> bool {
        if self.owner() != Some(pointer_id) {
            return false;
        }
        self.finish(anchors)
    }

    /// Pointer cancel or teardown: final commit and release, whichever
    /// pointer owns the drag.
    pub fn cancel(&mut self, anchors: &AnchorStore) -> bool {
        self.finish(anchors)
    }

    fn finish(&mut self, anchors: &AnchorStore) -> bool {
        self.frame_requested = false;
        let Some(mut session) = self.active.take() else {
            return false;
        };
        let point = session.pending.take().unwrap_or(session.preview);
        let committed = commit(&mut session, point, anchors);
        if committed {
            self.commits += 1;
        }
        debug!("drag of {} released", session.mac);
        committed
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Whether a frame tick is needed to flush a pending commit.
    pub fn wants_frame(&self) -> bool {
        self.frame_requested
    }

    /// The anchor being dragged and where it should be drawn.
    pub fn preview(&self) -> Option<(MacAddress, WorldPoint)> {
        self.active.as_ref().map(|s| (s.mac, s.preview))
    }

    /// Commits written to the store since construction.
    pub fn commits(&self) -> u64 {
        self.commits
    }
}

fn commit(session: &mut DragSession, point: WorldPoint, anchors: &AnchorStore) -> bool {
    let rounded = point.rounded();
    if session.last_committed == Some(rounded) {
        return false;
    }
    if !anchors.set_coord(&session.map_id, session.mac, rounded.x, rounded.y) {
        return false;
    }
    session.last_committed = Some(rounded);
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use locate_core::{AnchorCoord, FitMode, InboundFrame, OutboundFrame, Size};

    use super::*;
    use crate::application::outbound::MockFrameSink;
    use crate::application::router::FrameConsumer;

    /// 1000x1000 image shown 1:1; 100 px per meter.
    fn fixture() -> (RenderGeometry, PixelsPerMeter) {
        let g = RenderGeometry::compute(
            Size::new(1000.0, 1000.0),
            Size::new(1000.0, 1000.0),
            FitMode::Contain,
        )
        .unwrap();
        (g, PixelsPerMeter::new(100.0).unwrap())
    }

    fn recording_store() -> (AnchorStore, Rc<RefCell<Vec<OutboundFrame>>>) {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&sent);
        let mut sink = MockFrameSink::new();
        sink.expect_send().returning_st(move |f| {
            log.borrow_mut().push(f.clone());
            Ok(())
        });
        (AnchorStore::new(Rc::new(sink)), sent)
    }

    fn mac() -> MacAddress {
        MacAddress::parse("AA:BB:CC:DD:EE:FF").unwrap()
    }

    #[test]
    fn test_hundred_moves_in_one_frame_commit_once() {
        // Arrange
        let (g, ratio) = fixture();
        let (store, sent) = recording_store();
        let mut drag = DragPipeline::new();
        drag.begin("m1", mac(), 1, WorldPoint::new(0.0, 0.0), None);

        // Act
        for i in 0..100 {
            drag.pointer_move(1, ScreenPoint::new(100.0 + i as f64, 500.0), &g, ratio);
        }
        drag.on_frame(&store);

        // Assert
        assert_eq!(sent.borrow().len(), 1);
        assert_eq!(store.get("m1", &mac()).map(|c| (c.x, c.y)), Some((1.99, 5.0)));
    }

    #[test]
    fn test_preview_follows_every_move() {
        let (g, ratio) = fixture();
        let (store, _) = recording_store();
        let mut drag = DragPipeline::new();
        drag.begin("m1", mac(), 1, WorldPoint::new(0.0, 0.0), None);

        drag.pointer_move(1, ScreenPoint::new(250.0, 750.0), &g, ratio);

        assert_eq!(drag.preview(), Some((mac(), WorldPoint::new(2.5, 2.5))));
        assert!(store.get("m1", &mac()).is_none(), "nothing committed before the frame");
        assert!(drag.wants_frame());
    }

    #[test]
    fn test_unchanged_rounded_position_is_not_recommitted() {
        let (g, ratio) = fixture();
        let (store, sent) = recording_store();
        let mut drag = DragPipeline::new();
        drag.begin("m1", mac(), 1, WorldPoint::new(0.0, 0.0), None);

        drag.pointer_move(1, ScreenPoint::new(100.0, 500.0), &g, ratio);
        drag.on_frame(&store);
        drag.pointer_move(1, ScreenPoint::new(100.1, 500.0), &g, ratio);
        drag.on_frame(&store);

        assert_eq!(sent.borrow().len(), 1);
    }

    #[test]
    fn test_end_commits_pending_synchronously_and_releases() {
        let (g, ratio) = fixture();
        let (store, sent) = recording_store();
        let mut drag = DragPipeline::new();
        drag.begin("m1", mac(), 1, WorldPoint::new(0.0, 0.0), None);
        drag.pointer_move(1, ScreenPoint::new(300.0, 700.0), &g, ratio);

        let committed = drag.end(1, &store);

        assert!(committed);
        assert_eq!(sent.borrow().len(), 1);
        assert!(!drag.is_dragging());
        assert!(!drag.wants_frame());
        assert_eq!(store.get("m1", &mac()).map(|c| (c.x, c.y)), Some((3.0, 3.0)));
    }

    #[test]
    fn test_moves_are_clamped_to_image() {
        let (g, ratio) = fixture();
        let (store, _) = recording_store();
        let mut drag = DragPipeline::new();
        drag.begin("m1", mac(), 1, WorldPoint::new(0.0, 0.0), None);

        drag.pointer_move(1, ScreenPoint::new(-500.0, 5000.0), &g, ratio);
        drag.end(1, &store);

        assert_eq!(store.get("m1", &mac()).map(|c| (c.x, c.y)), Some((0.0, 0.0)));
    }

    #[test]
    fn test_other_pointer_is_ignored() {
        let (g, ratio) = fixture();
        let (store, _) = recording_store();
        let mut drag = DragPipeline::new();
        drag.begin("m1", mac(), 1, WorldPoint::new(0.0, 0.0), None);

        assert!(drag.pointer_move(2, ScreenPoint::new(10.0, 10.0), &g, ratio).is_none());
        assert!(!drag.end(2, &store));
        assert!(drag.is_dragging());
    }

    #[test]
    fn test_second_begin_is_rejected() {
        let mut drag = DragPipeline::new();
        assert!(drag.begin("m1", mac(), 1, WorldPoint::default(), None));
        assert!(!drag.begin("m1", mac(), 2, WorldPoint::default(), None));
        assert_eq!(drag.owner(), Some(1));
    }

    #[test]
    fn test_release_without_moves_leaves_stored_anchor_untouched() {
        // Arrange
        let (store, sent) = recording_store();
        store.consume(&InboundFrame::AnchorCoords {
            map_id: "m1".into(),
            items: vec![AnchorCoord { mac: mac(), x: 1.234, y: 5.678 }],
        });
        let stored = WorldPoint::new(1.234, 5.678);
        let mut drag = DragPipeline::new();
        drag.begin("m1", mac(), 1, stored, Some(stored));

        // Act
        let committed = drag.end(1, &store);

        // Assert
        assert!(!committed);
        assert!(sent.borrow().is_empty());
        assert_eq!(store.get("m1", &mac()).map(|c| (c.x, c.y)), Some((1.234, 5.678)));
        assert_eq!(drag.commits(), 0);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_cancel_without_moves_commits_new_placement() {
        let (store, sent) = recording_store();
        let mut drag = DragPipeline::new();
        drag.begin("m1", mac(), 1, WorldPoint::new(1.234, 5.678), None);

        drag.cancel(&store);

        assert_eq!(sent.borrow().len(), 1);
        assert_eq!(store.get("m1", &mac()).map(|c| (c.x, c.y)), Some((1.23, 5.68)));
        assert_eq!(drag.commits(), 1);
    }

    #[test]
    fn test_moving_off_stored_position_commits() {
        let (g, ratio) = fixture();
        let (store, sent) = recording_store();
        let stored = WorldPoint::new(1.0, 5.0);
        let mut drag = DragPipeline::new();
        drag.begin("m1", mac(), 1, stored, Some(stored));

        drag.pointer_move(1, ScreenPoint::new(100.0, 500.0), &g, ratio);
        assert!(!drag.on_frame(&store), "same rounded position as stored");
        drag.pointer_move(1, ScreenPoint::new(200.0, 500.0), &g, ratio);
        drag.end(1, &store);

        assert_eq!(sent.borrow().len(), 1);
        assert_eq!(store.get("m1", &mac()).map(|c| (c.x, c.y)), Some((2.0, 5.0)));
    }
}
