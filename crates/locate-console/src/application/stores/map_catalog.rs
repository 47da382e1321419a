//! Site map catalog.

use std::rc::Rc;

use locate_core::{InboundFrame, MapInfo, OutboundFrame};

use crate::application::outbound::{send_or_warn, FrameSink};
use crate::application::router::FrameConsumer;
use crate::application::state_cell::{StateCell, Subscription};

/// The list of site maps, replaced wholesale by each `MapList` frame.
pub struct MapCatalogStore {
    cell: StateCell<Vec<MapInfo>>,
    sink: Rc<dyn FrameSink>,
}

impl MapCatalogStore {
    pub fn new(sink: Rc<dyn FrameSink>) -> Self {
        Self {
            cell: StateCell::default(),
            sink,
        }
    }

    /// Asks the server for the catalog.
    pub fn request(&self) -> bool {
        send_or_warn(self.sink.as_ref(), OutboundFrame::GetMapList)
    }

    pub fn maps(&self) -> Rc<Vec<MapInfo>> {
        self.cell.get()
    }

    pub fn find(&self, map_id: &str) -> Option<MapInfo> {
        self.cell.get().iter().find(|m| m.id == map_id).cloned()
    }

    pub fn subscribe(&self, listener: impl Fn(&Rc<Vec<MapInfo>>) + 'static) -> Subscription {
        self.cell.subscribe(listener)
    }
}

impl FrameConsumer for MapCatalogStore {
    fn name(&self) -> &'static str {
        "maps"
    }

    fn consume(&self, frame: &InboundFrame) -> bool {
        let InboundFrame::MapList { maps } = frame else {
            return false;
        };
        self.cell.update(|current| (current != maps).then(|| maps.clone()));
        true
    }
}
