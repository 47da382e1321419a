//! BLE Locate Console: entry point.
//!
//! A headless operator console for the BLE locate server.  It keeps one
//! WebSocket connection to the server, mirrors the server's maps, scales,
//! anchors, beacons, locate results, and raw telemetry in memory, and turns
//! line commands on stdin into calibration, anchor placement, and beacon
//! management commands.
//!
//! # Usage
//!
//! ```text
//! locate-console [OPTIONS]
//!
//! Options:
//!   --scheme <SCHEME>        URL scheme [default: ws]
//!   --host <HOST>            Locate server host [default: 127.0.0.1]
//!   --port <PORT>            Locate server port [default: 8080]
//!   --path <PATH>            WebSocket path [default: /]
//!   --reconnect-ms <MS>      Pause between reconnect attempts [default: 3000]
//!   --frame-ms <MS>          Rendering frame length [default: 16]
//!   --prefs <FILE>           Preferences file [default: platform config dir]
//!   --log-level <LEVEL>      Log level when RUST_LOG is unset [default: info]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable               | Default      | Description                  |
//! |------------------------|--------------|------------------------------|
//! | `LOCATE_SCHEME`        | `ws`         | URL scheme                   |
//! | `LOCATE_HOST`          | `127.0.0.1`  | Locate server host           |
//! | `LOCATE_PORT`          | `8080`       | Locate server port           |
//! | `LOCATE_PATH`          | `/`          | WebSocket path               |
//! | `LOCATE_RECONNECT_MS`  | `3000`       | Reconnect delay              |
//! | `LOCATE_FRAME_MS`      | `16`         | Frame length                 |
//! | `LOCATE_PREFS`         | (platform)   | Preferences file             |
//! | `LOCATE_LOG_LEVEL`     | `info`       | Fallback log filter          |

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use locate_console::application::{Console, FrameSink};
use locate_console::domain::{ConsoleConfig, Endpoint};
use locate_console::infrastructure::event_loop::{run_event_loop, ExitReason};
use locate_console::infrastructure::storage::preferences::{
    default_preferences_path, load_preferences, save_preferences, Preferences,
};
use locate_console::infrastructure::transport::ConnectionManager;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Headless realtime console for the BLE locate server.
#[derive(Debug, Parser)]
#[command(
    name = "locate-console",
    about = "Realtime operator console for the BLE locate server",
    version
)]
struct Cli {
    /// URL scheme.  Only plain `ws` is supported.
    #[arg(long, default_value = "ws", env = "LOCATE_SCHEME")]
    scheme: String,

    /// Hostname or IP address of the locate server.
    #[arg(long, default_value = "127.0.0.1", env = "LOCATE_HOST")]
    host: String,

    /// Port of the locate server's WebSocket endpoint.
    #[arg(long, default_value_t = 8080, env = "LOCATE_PORT")]
    port: u16,

    /// Path of the WebSocket endpoint.
    #[arg(long, default_value = "/", env = "LOCATE_PATH")]
    path: String,

    /// Milliseconds to wait after a disconnect before reconnecting.
    #[arg(long, default_value_t = 3000, env = "LOCATE_RECONNECT_MS")]
    reconnect_ms: u64,

    /// Length of one rendering frame in milliseconds.  Anchor drags commit
    /// at most once per frame.
    #[arg(long, default_value_t = 16, env = "LOCATE_FRAME_MS")]
    frame_ms: u64,

    /// Preferences file.  Defaults to `prefs.toml` in the platform config
    /// directory.
    #[arg(long, env = "LOCATE_PREFS")]
    prefs: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info", env = "LOCATE_LOG_LEVEL")]
    log_level: String,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ConsoleConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported scheme or a zero frame length.
    fn into_console_config(self) -> anyhow::Result<ConsoleConfig> {
        if self.scheme != "ws" {
            bail!("unsupported scheme '{}': only ws is supported", self.scheme);
        }
        if self.frame_ms == 0 {
            bail!("--frame-ms must be greater than zero");
        }

        Ok(ConsoleConfig {
            endpoint: Endpoint::new(self.scheme, self.host, self.port, &self.path),
            reconnect_delay: Duration::from_millis(self.reconnect_ms),
            frame_interval: Duration::from_millis(self.frame_ms),
            prefs_path: self.prefs,
            ..ConsoleConfig::default()
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// All application state lives in `Rc`/`RefCell`, so the console runs on a
/// current-thread runtime.  The connection supervisor is the only spawned
/// task.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // RUST_LOG wins when set; otherwise --log-level applies.
    let fallback = cli.log_level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_console_config()?;
    info!("BLE locate console starting: server={}", config.endpoint);

    // ── Preferences ───────────────────────────────────────────────────────────
    let prefs_path = match &config.prefs_path {
        Some(path) => Some(path.clone()),
        None => match default_preferences_path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("preferences will not be saved: {e}");
                None
            }
        },
    };
    let prefs = match &prefs_path {
        Some(path) => load_preferences(path).unwrap_or_else(|e| {
            warn!("using default preferences: {e}");
            Preferences::default()
        }),
        None => Preferences::default(),
    };

    // ── Wiring ────────────────────────────────────────────────────────────────
    let (manager, mut events) = ConnectionManager::new(&config);
    let manager = Rc::new(manager);
    let mut console = Console::new(Rc::clone(&manager) as Rc<dyn FrameSink>, &config);
    console.restore(prefs.last_map_id, prefs.active_view);
    manager.start();

    // ── Main loop ─────────────────────────────────────────────────────────────
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };
    let reason = run_event_loop(
        &mut console,
        &mut events,
        stdin,
        &mut stdout,
        config.frame_interval,
        shutdown,
    )
    .await;
    match reason {
        ExitReason::Quit => info!("quit requested"),
        ExitReason::Interrupted => info!("received Ctrl+C; shutting down"),
        ExitReason::TransportClosed => warn!("transport stopped unexpectedly"),
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    console.teardown();
    manager.shutdown();

    if let Some(path) = prefs_path {
        let prefs = Preferences {
            last_map_id: console.active_map().map(str::to_string),
            active_view: console.active_view(),
        };
        save_preferences(&path, &prefs)
            .with_context(|| format!("saving preferences to {}", path.display()))?;
    }

    info!("BLE locate console stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
