//! Per-map scale (pixels per meter).
//!
//! Remote values arrive in `Scale` frames and as the optional `ratio` of
//! `MapList` entries.  Local values come from calibration or the `scale`
//! command; they are applied first and then sent as `SetScale`.

use std::collections::BTreeMap;
use std::rc::Rc;

use locate_core::{InboundFrame, OutboundFrame, PixelsPerMeter};
use thiserror::Error;
use tracing::debug;

use crate::application::outbound::{send_or_warn, FrameSink};
use crate::application::router::FrameConsumer;
use crate::application::state_cell::{StateCell, Subscription};

pub type ScaleTable = BTreeMap<String, PixelsPerMeter>;

/// Errors produced by local scale edits.
#[derive(Debug, Error, PartialEq)]
pub enum ScaleError {
    #[error("scale {ratio} for map {map_id:?} must be finite and greater than zero")]
    InvalidRatio { map_id: String, ratio: f64 },
}

pub struct ScaleStore {
    cell: StateCell<ScaleTable>,
    sink: Rc<dyn FrameSink>,
}

impl ScaleStore {
    pub fn new(sink: Rc<dyn FrameSink>) -> Self {
        Self {
            cell: StateCell::default(),
            sink,
        }
    }

    /// Asks the server for one map's scale.
    pub fn request(&self, map_id: &str) -> bool {
        send_or_warn(
            self.sink.as_ref(),
            OutboundFrame::GetScale {
                map_id: map_id.to_string(),
            },
        )
    }

    pub fn ratio(&self, map_id: &str) -> Option<PixelsPerMeter> {
        self.cell.get().get(map_id).copied()
    }

    pub fn snapshot(&self) -> Rc<ScaleTable> {
        self.cell.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&Rc<ScaleTable>) + 'static) -> Subscription {
        self.cell.subscribe(listener)
    }

    /// Sets a map's scale locally and sends `SetScale`.
    ///
    /// # Errors
    ///
    /// [`ScaleError::InvalidRatio`] for zero, negative, or non-finite ratios;
    /// nothing is stored or sent in that case.
    pub fn set_local(&self, map_id: &str, ratio: f64) -> Result<PixelsPerMeter, ScaleError> {
        let valid = PixelsPerMeter::new(ratio).map_err(|_| ScaleError::InvalidRatio {
            map_id: map_id.to_string(),
            ratio,
        })?;
        self.store(map_id, valid);
        send_or_warn(
            self.sink.as_ref(),
            OutboundFrame::SetScale {
                map_id: map_id.to_string(),
                ratio: valid.get(),
            },
        );
        Ok(valid)
    }

    /// Applies a server-side value without echoing it back.
    pub fn apply_remote(&self, map_id: &str, ratio: f64) -> bool {
        match PixelsPerMeter::new(ratio) {
            Ok(valid) => self.store(map_id, valid),
            Err(e) => {
                debug!("ignoring scale for {map_id}: {e}");
                false
            }
        }
    }

    fn store(&self, map_id: &str, ratio: PixelsPerMeter) -> bool {
        self.cell.update(|table| {
            if table.get(map_id) == Some(&ratio) {
                return None;
            }
            let mut next = table.clone();
            next.insert(map_id.to_string(), ratio);
            Some(next)
        })
    }
}

impl FrameConsumer for ScaleStore {
    fn name(&self) -> &'static str {
        "scale"
    }

    fn consume(&self, frame: &InboundFrame) -> bool {
        match frame {
            InboundFrame::Scale { map_id, ratio } => {
                // Claimed even when the ratio is unusable.
                self.apply_remote(map_id, *ratio);
                true
            }
            InboundFrame::MapList { maps } => {
                let seeded: Vec<(&str, PixelsPerMeter)> = maps
                    .iter()
                    .filter_map(|m| {
                        let ratio = PixelsPerMeter::new(m.ratio?).ok()?;
                        Some((m.id.as_str(), ratio))
                    })
                    .collect();
                self.cell.update(|table| {
                    let mut next = table.clone();
                    let mut changed = false;
                    for (id, ratio) in &seeded {
                        if next.get(*id) != Some(ratio) {
                            next.insert((*id).to_string(), *ratio);
                            changed = true;
                        }
                    }
                    changed.then_some(next)
                });
                true
            }
            _ => false,
        }
    }
}
