//! Storage infrastructure: operator preference persistence.
//!
//! The `preferences` sub-module reads and writes the small TOML file that
//! remembers the last selected map and view between runs.  A missing file is
//! the normal first-run case and yields defaults.

pub mod preferences;
