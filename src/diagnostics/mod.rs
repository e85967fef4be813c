//! Diagnostics computed from host data.
//!
//! This module handles:
//! - Platform versions
//! - Plugin inventory and pending updates
//! - Error log tails
//! - Database maintenance aggregates

pub mod database;
pub mod logs;
pub mod plugins;
pub mod system;
pub mod types;

pub use database::db_health;
pub use logs::{parse_lines, tail_error_log, tail_lines, DEFAULT_LINES};
pub use plugins::{analyze_plugins, StatusFilter};
pub use system::system_info;
pub use types::{
    DbHealthSummary, LogTail, PluginRecord, PluginStatus, PluginsAnalysis, SystemInfo, UpdateRecord,
};
