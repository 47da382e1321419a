//! Console configuration types.
//!
//! [`ConsoleConfig`] is the single source of truth for runtime settings.  It
//! is built from CLI arguments in `main.rs` or from defaults in tests.  No
//! environment variables are read here.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Where the locate server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Always starts with `/`.
    pub path: String,
}

impl Endpoint {
    /// Builds an endpoint, adding a leading `/` to `path` if missing.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16, path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
            path,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new("ws", "127.0.0.1", 8080, "/")
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }
}

/// All runtime configuration for the console.
///
/// # Example
///
/// ```rust
/// use locate_console::domain::ConsoleConfig;
///
/// let cfg = ConsoleConfig::default();
/// assert_eq!(cfg.endpoint.to_string(), "ws://127.0.0.1:8080/");
/// ```
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// The locate server's WebSocket endpoint.
    pub endpoint: Endpoint,

    /// Fixed pause between a disconnect and the next connection attempt.
    pub reconnect_delay: Duration,

    /// Length of one rendering frame; drag commits are throttled to one per
    /// frame.
    pub frame_interval: Duration,

    /// How many raw telemetry rows are kept, newest first.
    pub telemetry_capacity: usize,

    /// Preferences file.  `None` means the platform config directory.
    pub prefs_path: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    /// | Field              | Default                 |
    /// |--------------------|-------------------------|
    /// | endpoint           | `ws://127.0.0.1:8080/`  |
    /// | reconnect_delay    | 3 seconds               |
    /// | frame_interval     | 16 ms                   |
    /// | telemetry_capacity | 200                     |
    /// | prefs_path         | platform config dir     |
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            reconnect_delay: Duration::from_secs(3),
            frame_interval: Duration::from_millis(16),
            telemetry_capacity: 200,
            prefs_path: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
