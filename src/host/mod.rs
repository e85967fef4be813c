//! Read-only access to the WordPress host.
//!
//! Every collaborator the diagnostics read from is a trait here so handlers
//! can run against the real installation or against in-memory doubles:
//! - [`PlatformInfo`]: platform, runtime and OS versions
//! - [`PluginRegistry`]: installed plugins and the active-plugin list
//! - [`UpdateCache`]: the last update check
//! - [`FileReader`]: raw file reads for log tails
//! - [`DatabaseInspector`]: option payload and table status aggregates

pub mod mock;
pub mod wordpress;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HostError;

pub use wordpress::WordPressHost;

/// Header data of one installed plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlugin {
    /// Plugin file relative to the plugin directory, e.g. `akismet/akismet.php`.
    pub file: String,
    /// `Plugin Name:` header.
    pub name: String,
    /// `Version:` header, empty when missing.
    pub version: String,
}

/// Pending updates keyed by plugin file. `None` means the cache entry has no
/// `new_version`.
pub type UpdateMap = BTreeMap<String, Option<String>>;

/// Platform, runtime and operating system versions.
#[async_trait]
pub trait PlatformInfo: Send + Sync {
    /// WordPress version, `None` when it cannot be determined.
    async fn wordpress_version(&self) -> Option<String>;

    /// PHP runtime version, `None` when it cannot be determined.
    async fn php_version(&self) -> Option<String>;

    /// Operating system family in PHP_OS_FAMILY form.
    fn os_family(&self) -> String;
}

/// Installed plugins and activation state.
#[async_trait]
pub trait PluginRegistry: Send + Sync {
    /// Every installed plugin in registry order.
    async fn installed_plugins(&self) -> Result<Vec<InstalledPlugin>, HostError>;

    /// Plugin files listed as active.
    async fn active_plugins(&self) -> Result<Vec<String>, HostError>;
}

/// Results of the last plugin update check.
#[async_trait]
pub trait UpdateCache: Send + Sync {
    /// `Ok(None)` when no update check is available.
    async fn plugin_updates(&self) -> Result<Option<UpdateMap>, HostError>;
}

/// Raw file reads.
#[async_trait]
pub trait FileReader: Send + Sync {
    /// Whole file contents.
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Aggregate database maintenance metrics.
#[async_trait]
pub trait DatabaseInspector: Send + Sync {
    /// Sum of option value byte lengths for autoloaded options, `None` when
    /// the sum is NULL.
    async fn autoload_bytes(&self) -> Result<Option<i64>, HostError>;

    /// Free/overhead bytes reported per table, `None` where a table reports
    /// nothing.
    async fn table_overheads(&self) -> Result<Vec<Option<u64>>, HostError>;
}

/// Bundle of host collaborators shared by all handlers.
#[derive(Clone)]
pub struct Host {
    /// Version reporter.
    pub platform: Arc<dyn PlatformInfo>,
    /// Plugin registry.
    pub plugins: Arc<dyn PluginRegistry>,
    /// Update-check cache.
    pub updates: Arc<dyn UpdateCache>,
    /// File access for log tails.
    pub files: Arc<dyn FileReader>,
    /// Database aggregates.
    pub database: Arc<dyn DatabaseInspector>,
    /// Error-log candidates in lookup order.
    pub log_candidates: Vec<PathBuf>,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("log_candidates", &self.log_candidates)
            .finish_non_exhaustive()
    }
}
