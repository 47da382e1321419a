//! Composition root for the application layer.
//!
//! [`Console`] owns the six stores, the router that feeds them, the
//! calibration session, the drag pipeline, and the view state (active map,
//! active view, image and container sizes).  The event loop hands it two
//! kinds of input:
//!
//! - [`TransportEvent`]s from the connection manager
//! - [`OperatorCommand`]s parsed from stdin
//!
//! Everything here runs on one task.  Stores are shared as `Rc` between the
//! router and the console itself.

use std::rc::Rc;

use locate_core::{
    CalibrationError, CalibrationSession, CalibrationState, ClickOutcome, FitMode, GeometryError, MacAddress,
    PixelsPerMeter, RenderGeometry, ScreenPoint, Size, WorldPoint,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::commands::{OperatorCommand, ShowTarget, HELP};
use crate::application::drag::DragPipeline;
use crate::application::outbound::FrameSink;
use crate::application::router::{FrameConsumer, MessageRouter};
use crate::application::state_cell::{StateCell, Subscription};
use crate::application::stores::{
    AnchorStore, BeaconStore, LocateStore, MapCatalogStore, ScaleError, ScaleStore, TelemetryStore,
};
use crate::domain::{ActiveView, ConnectionStatus, ConsoleConfig, TransportEvent};

/// Display area assumed until the operator sets one with `container`.
pub const DEFAULT_CONTAINER: Size = Size {
    width: 1280.0,
    height: 720.0,
};

/// Errors returned by [`Console::handle_command`].
///
/// None of these are fatal; the event loop prints them and carries on.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("no map selected; use `map <id>` first")]
    NoActiveMap,

    #[error("map image size unknown; use `image <w> <h>` first")]
    NoGeometry,

    #[error("map {0:?} has no scale yet; calibrate or use `scale <ratio>`")]
    NoScale(String),

    #[error("no drag in progress for pointer {0}")]
    NotDragging(u32),

    #[error("{0} is already being dragged; release it first")]
    DragInProgress(MacAddress),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Scale(#[from] ScaleError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("could not render snapshot: {0}")]
    Render(#[from] serde_json::Error),
}

/// What the event loop should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Done,
    Output(String),
    Quit,
}

pub struct Console {
    maps: Rc<MapCatalogStore>,
    scale: Rc<ScaleStore>,
    anchors: Rc<AnchorStore>,
    locate: Rc<LocateStore>,
    telemetry: Rc<TelemetryStore>,
    beacons: Rc<BeaconStore>,
    router: MessageRouter,

    status: StateCell<ConnectionStatus>,
    calibration: CalibrationSession,
    drag: DragPipeline,

    active_map: Option<String>,
    active_view: ActiveView,
    image: Option<Size>,
    container: Size,
    fit: FitMode,
    geometry: Option<RenderGeometry>,

    _watchers: Vec<Subscription>,
}

impl Console {
    /// Builds every store around `sink` and wires them into the router.
    pub fn new(sink: Rc<dyn FrameSink>, config: &ConsoleConfig) -> Self {
        let maps = Rc::new(MapCatalogStore::new(Rc::clone(&sink)));
        let scale = Rc::new(ScaleStore::new(Rc::clone(&sink)));
        let anchors = Rc::new(AnchorStore::new(Rc::clone(&sink)));
        let locate = Rc::new(LocateStore::new());
        let telemetry = Rc::new(TelemetryStore::new(config.telemetry_capacity));
        let beacons = Rc::new(BeaconStore::new(sink));

        let router = MessageRouter::new(vec![
            Rc::clone(&maps) as Rc<dyn FrameConsumer>,
            Rc::clone(&scale) as Rc<dyn FrameConsumer>,
            Rc::clone(&anchors) as Rc<dyn FrameConsumer>,
            Rc::clone(&locate) as Rc<dyn FrameConsumer>,
            Rc::clone(&telemetry) as Rc<dyn FrameConsumer>,
            Rc::clone(&beacons) as Rc<dyn FrameConsumer>,
        ]);

        let status = StateCell::default();
        let watchers = vec![
            maps.subscribe(|m| debug!("map catalog: {} maps", m.len())),
            beacons.subscribe(|b| debug!("beacon list: {} ids", b.len())),
            status.subscribe(|s: &Rc<ConnectionStatus>| info!("connection {s}")),
        ];

        Self {
            maps,
            scale,
            anchors,
            locate,
            telemetry,
            beacons,
            router,
            status,
            calibration: CalibrationSession::new(),
            drag: DragPipeline::new(),
            active_map: None,
            active_view: ActiveView::default(),
            image: None,
            container: DEFAULT_CONTAINER,
            fit: FitMode::default(),
            geometry: None,
            _watchers: watchers,
        }
    }

    /// Applies saved preferences without sending anything.  The initial sync
    /// on connect requests data for the restored map.
    pub fn restore(&mut self, last_map: Option<String>, view: ActiveView) {
        self.active_map = last_map;
        self.active_view = view;
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn maps(&self) -> &MapCatalogStore {
        &self.maps
    }

    pub fn scale(&self) -> &ScaleStore {
        &self.scale
    }

    pub fn anchors(&self) -> &AnchorStore {
        &self.anchors
    }

    pub fn locate(&self) -> &LocateStore {
        &self.locate
    }

    pub fn telemetry(&self) -> &TelemetryStore {
        &self.telemetry
    }

    pub fn beacons(&self) -> &BeaconStore {
        &self.beacons
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.get()
    }

    pub fn subscribe_status(&self, listener: impl Fn(&Rc<ConnectionStatus>) + 'static) -> Subscription {
        self.status.subscribe(listener)
    }

    pub fn active_map(&self) -> Option<&str> {
        self.active_map.as_deref()
    }

    pub fn active_view(&self) -> ActiveView {
        self.active_view
    }

    pub fn geometry(&self) -> Option<&RenderGeometry> {
        self.geometry.as_ref()
    }

    pub fn calibration_state(&self) -> &CalibrationState {
        self.calibration.state()
    }

    pub fn drag(&self) -> &DragPipeline {
        &self.drag
    }

    // ── Transport input ───────────────────────────────────────────────────────

    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Status(next) => {
                let changed = self.status.update(|current| (*current != next).then_some(next));
                if changed && next == ConnectionStatus::Connected {
                    self.initial_sync();
                }
            }
            TransportEvent::Frame(frame) => {
                self.router.dispatch(&frame);
            }
        }
    }

    fn initial_sync(&self) {
        self.maps.request();
        self.beacons.request();
        if let Some(map_id) = &self.active_map {
            self.scale.request(map_id);
            self.anchors.request(map_id);
        }
    }

    // ── Frame clock ───────────────────────────────────────────────────────────

    /// Whether the event loop should schedule a frame tick.
    pub fn wants_frame(&self) -> bool {
        self.drag.wants_frame()
    }

    /// One rendering frame: flushes the pending drag commit.
    pub fn on_frame(&mut self) -> bool {
        self.drag.on_frame(&self.anchors)
    }

    /// Ends any drag and calibration.  Called before shutdown.
    pub fn teardown(&mut self) {
        self.calibration.cancel();
        self.drag.cancel(&self.anchors);
    }

    // ── Operator input ────────────────────────────────────────────────────────

    /// Executes one operator command.
    ///
    /// # Errors
    ///
    /// See [`ConsoleError`].  A failed command leaves the console usable.
    pub fn handle_command(&mut self, command: OperatorCommand) -> Result<CommandResult, ConsoleError> {
        match command {
            OperatorCommand::Map(id) => self.select_map(id),
            OperatorCommand::View(view) => {
                info!("view {} → {view}", self.active_view);
                self.active_view = view;
            }
            OperatorCommand::Image { width, height } => {
                self.image = Some(Size::new(width, height));
                self.recompute_geometry()?;
            }
            OperatorCommand::Container { width, height } => {
                self.container = Size::new(width, height);
                self.recompute_geometry()?;
            }
            OperatorCommand::Fit(mode) => {
                self.fit = mode;
                self.recompute_geometry()?;
            }
            OperatorCommand::Scale(ratio) => {
                let map_id = self.require_map()?.to_string();
                let stored = self.scale.set_local(&map_id, ratio)?;
                return Ok(CommandResult::Output(format!("scale for {map_id}: {}", stored.get())));
            }
            OperatorCommand::Anchor { mac, x, y } => {
                let map_id = self.require_map()?.to_string();
                self.anchors.set_coord(&map_id, mac, x, y);
            }
            OperatorCommand::Clear(mac) => {
                let map_id = self.require_map()?.to_string();
                self.anchors.clear_coord(&map_id, mac);
            }
            OperatorCommand::Remove(mac) => self.beacons.remove(mac),
            OperatorCommand::Calibrate => {
                self.require_map()?;
                self.calibration.begin(self.geometry.is_some())?;
                return Ok(CommandResult::Output("calibrating: click two points".into()));
            }
            OperatorCommand::Click(at) => return self.calibration_click(at),
            OperatorCommand::Distance(meters) => return self.finish_calibration(meters),
            OperatorCommand::Cancel => {
                self.calibration.cancel();
                self.drag.cancel(&self.anchors);
            }
            OperatorCommand::Down { mac, at, pointer } => self.begin_drag(mac, at, pointer)?,
            OperatorCommand::Move { at, pointer } => {
                let (geometry, ratio) = self.require_transform()?;
                if self.drag.pointer_move(pointer, at, &geometry, ratio).is_none() {
                    return Err(ConsoleError::NotDragging(pointer));
                }
            }
            OperatorCommand::Up { pointer } => {
                if self.drag.owner() != Some(pointer) {
                    return Err(ConsoleError::NotDragging(pointer));
                }
                self.drag.end(pointer, &self.anchors);
            }
            OperatorCommand::Frame => {
                self.on_frame();
            }
            OperatorCommand::Show(target) => return self.show(target).map(CommandResult::Output),
            OperatorCommand::Help => return Ok(CommandResult::Output(HELP.to_string())),
            OperatorCommand::Quit => return Ok(CommandResult::Quit),
        }
        Ok(CommandResult::Done)
    }

    fn select_map(&mut self, id: String) {
        if self.active_map.as_deref() == Some(id.as_str()) {
            return;
        }
        if !self.maps.maps().is_empty() && self.maps.find(&id).is_none() {
            warn!("map {id:?} is not in the catalog");
        }
        self.calibration.cancel();
        self.drag.cancel(&self.anchors);
        self.image = None;
        self.geometry = None;
        self.scale.request(&id);
        self.anchors.request(&id);
        info!("active map → {id}");
        self.active_map = Some(id);
    }

    fn recompute_geometry(&mut self) -> Result<(), ConsoleError> {
        let Some(image) = self.image else {
            self.geometry = None;
            return Ok(());
        };
        match RenderGeometry::compute(image, self.container, self.fit) {
            Ok(geometry) => {
                self.geometry = Some(geometry);
                Ok(())
            }
            Err(e) => {
                warn!("cannot lay out map image: {e}");
                self.geometry = None;
                Err(e.into())
            }
        }
    }

    fn require_map(&self) -> Result<&str, ConsoleError> {
        self.active_map.as_deref().ok_or(ConsoleError::NoActiveMap)
    }

    fn require_transform(&self) -> Result<(RenderGeometry, PixelsPerMeter), ConsoleError> {
        let map_id = self.require_map()?;
        let geometry = self.geometry.ok_or(ConsoleError::NoGeometry)?;
        let ratio = self
            .scale
            .ratio(map_id)
            .ok_or_else(|| ConsoleError::NoScale(map_id.to_string()))?;
        Ok((geometry, ratio))
    }

    fn calibration_click(&mut self, at: ScreenPoint) -> Result<CommandResult, ConsoleError> {
        let geometry = self.geometry.ok_or(ConsoleError::NoGeometry)?;
        let text = match self.calibration.click(at, &geometry) {
            ClickOutcome::Ignored => "click ignored".to_string(),
            ClickOutcome::Recorded { count } => format!("point {count} recorded"),
            ClickOutcome::Completed { pixel_distance } => {
                format!("{pixel_distance:.2} px apart; enter `distance <meters>`")
            }
        };
        Ok(CommandResult::Output(text))
    }

    fn finish_calibration(&mut self, meters: f64) -> Result<CommandResult, ConsoleError> {
        let map_id = self.require_map()?.to_string();
        let ratio = self.calibration.confirm(meters)?;
        let stored = self.scale.set_local(&map_id, ratio)?;
        info!("calibrated {map_id}: {} px/m", stored.get());
        Ok(CommandResult::Output(format!("scale for {map_id}: {}", stored.get())))
    }

    fn begin_drag(&mut self, mac: MacAddress, at: ScreenPoint, pointer: u32) -> Result<(), ConsoleError> {
        let (geometry, ratio) = self.require_transform()?;
        let map_id = self.require_map()?.to_string();
        if let Some((current, _)) = self.drag.preview() {
            return Err(ConsoleError::DragInProgress(current));
        }
        let stored = self.anchors.get(&map_id, &mac).map(|c| WorldPoint::new(c.x, c.y));
        let start = stored.unwrap_or_else(|| geometry.screen_to_world_clamped(at, ratio));
        self.drag.begin(&map_id, mac, pointer, start, stored);
        Ok(())
    }

    // ── Snapshots ─────────────────────────────────────────────────────────────

    fn show(&self, target: ShowTarget) -> Result<String, ConsoleError> {
        let value = match target {
            ShowTarget::Maps => serde_json::to_value(&*self.maps.maps())?,
            ShowTarget::Scale => {
                let table = self.scale.snapshot();
                Value::Object(table.iter().map(|(id, r)| (id.clone(), json!(r.get()))).collect())
            }
            ShowTarget::Anchors => {
                let map_id = self.require_map()?;
                let set = self.anchors.for_map(map_id);
                let mut items: Vec<Value> = set.values().map(|c| json!(c)).collect();
                if let Some((mac, at)) = self.drag.preview() {
                    items.push(json!({ "dragging": mac, "preview": at }));
                }
                Value::Array(items)
            }
            ShowTarget::Locate => {
                let map_id = self.require_map()?;
                let results = self.locate.for_map(map_id);
                Value::Array(
                    results
                        .values()
                        .map(|e| json!({ "result": e.observation, "receivedAtMs": e.received_at_ms }))
                        .collect(),
                )
            }
            ShowTarget::Telemetry => {
                let snap = self.telemetry.snapshot();
                json!({
                    "rows": snap.rows.len(),
                    "capacity": self.telemetry.capacity(),
                    "seenIds": snap.seen_ids,
                    "latest": snap.latest.values().map(|row| &*row.record).collect::<Vec<_>>(),
                })
            }
            ShowTarget::Beacons => serde_json::to_value(&*self.beacons.snapshot())?,
            ShowTarget::Status => json!({
                "connection": self.status().to_string(),
                "activeMap": self.active_map,
                "view": self.active_view,
                "fit": self.fit,
                "image": self.image,
                "container": self.container,
                "geometry": self.geometry.map(|g| json!({
                    "scale": g.scale,
                    "offsetX": g.offset_x,
                    "offsetY": g.offset_y,
                })),
                "calibrating": !self.calibration.is_idle(),
                "dragging": self.drag.is_dragging(),
                "routed": self.router.dispatched(),
                "unclaimed": self.router.unclaimed(),
            }),
        };
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
