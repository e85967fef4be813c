//! Response payloads of the diagnostics endpoints.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Platform and runtime versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SystemInfo {
    /// WordPress version, empty when unknown.
    pub wordpress_version: String,
    /// PHP version, empty when unknown.
    pub php_version: String,
    /// PHP_OS_FAMILY of the server.
    pub server_os: String,
}

/// Activation state of a plugin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PluginStatus {
    /// Listed in `active_plugins`.
    Active,
    /// Installed but not active.
    Inactive,
}

/// One installed plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PluginRecord {
    /// Plugin file relative to the plugin directory.
    pub file: String,
    /// Display name.
    pub name: String,
    /// Installed version.
    pub version: String,
    /// Activation state.
    pub status: PluginStatus,
}

/// One pending plugin update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateRecord {
    /// Plugin file relative to the plugin directory.
    pub file: String,
    /// Offered version, null when the update data lacks it.
    pub new_version: Option<String>,
}

/// Plugin inventory with pending updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PluginsAnalysis {
    /// Plugins after status filtering.
    pub plugins: Vec<PluginRecord>,
    /// Active entries among `plugins`.
    pub active_count: usize,
    /// Pending updates.
    pub updates: Vec<UpdateRecord>,
}

/// Last lines of the first readable error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LogTail {
    /// Lines, oldest first.
    pub tail: Vec<String>,
    /// Path the lines came from, null when no log was found.
    pub source: Option<String>,
}

/// Database maintenance aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DbHealthSummary {
    /// Total bytes of autoloaded option values.
    pub autoload_size: i64,
    /// Total reclaimable bytes across tables.
    pub overhead: u64,
}
