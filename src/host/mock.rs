//! In-memory host for unit testing.
//!
//! Every trait in [`crate::host`] is implemented by [`MockHost`], so handlers
//! can be exercised without a WordPress installation or database.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HostError;
use crate::host::wordpress::OptionSource;
use crate::host::{
    DatabaseInspector, FileReader, Host, InstalledPlugin, PlatformInfo, PluginRegistry,
    UpdateCache, UpdateMap,
};

/// Debug log path used by [`MockHost`].
pub const MOCK_DEBUG_LOG: &str = "/srv/wp/wp-content/debug.log";
/// Fallback error log path used by [`MockHost`].
pub const MOCK_ERROR_LOG: &str = "/srv/wp/error_log";

/// Options table held in memory.
#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    values: HashMap<String, Vec<u8>>,
}

impl MockOptions {
    /// Empty options table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option value.
    pub fn with(mut self, name: &str, value: impl AsRef<[u8]>) -> Self {
        self.values.insert(name.to_string(), value.as_ref().to_vec());
        self
    }
}

#[async_trait]
impl OptionSource for MockOptions {
    async fn get_option(&self, name: &str) -> Result<Option<Vec<u8>>, HostError> {
        Ok(self.values.get(name).cloned())
    }
}

/// Configurable in-memory host.
#[derive(Debug, Clone)]
pub struct MockHost {
    /// WordPress version to report.
    pub wordpress_version: Option<String>,
    /// PHP version to report.
    pub php_version: Option<String>,
    /// OS family to report.
    pub os_family: String,
    /// Installed plugins in registry order.
    pub plugins: Vec<InstalledPlugin>,
    /// Active plugin files.
    pub active: Vec<String>,
    /// Update cache contents, `None` when unavailable.
    pub updates: Option<UpdateMap>,
    /// Readable files.
    pub files: HashMap<PathBuf, Vec<u8>>,
    /// Autoload byte sum.
    pub autoload: Option<i64>,
    /// Per-table overhead.
    pub overheads: Vec<Option<u64>>,
    /// Whether database queries fail.
    pub fail_database: bool,
    /// Number of host lookups performed.
    calls: Arc<AtomicUsize>,
}

impl MockHost {
    /// Create an empty mock host.
    pub fn new() -> Self {
        Self {
            wordpress_version: Some("6.4.2".to_string()),
            php_version: Some("8.2.12".to_string()),
            os_family: "Linux".to_string(),
            plugins: Vec::new(),
            active: Vec::new(),
            updates: None,
            files: HashMap::new(),
            autoload: None,
            overheads: Vec::new(),
            fail_database: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add an installed plugin.
    pub fn with_plugin(mut self, file: &str, name: &str, version: &str, active: bool) -> Self {
        self.plugins.push(InstalledPlugin {
            file: file.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        });
        if active {
            self.active.push(file.to_string());
        }
        self
    }

    /// Add a pending update, enabling the update cache.
    pub fn with_update(mut self, file: &str, new_version: Option<&str>) -> Self {
        self.updates
            .get_or_insert_with(UpdateMap::new)
            .insert(file.to_string(), new_version.map(str::to_string));
        self
    }

    /// Add a readable file.
    pub fn with_file(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.files
            .insert(PathBuf::from(path), contents.as_ref().to_vec());
        self
    }

    /// Set database aggregates.
    pub fn with_database(mut self, autoload: Option<i64>, overheads: Vec<Option<u64>>) -> Self {
        self.autoload = autoload;
        self.overheads = overheads;
        self
    }

    /// Make every database query fail.
    pub fn failing_database(mut self) -> Self {
        self.fail_database = true;
        self
    }

    /// Number of host lookups performed so far, across clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Wrap this mock into a [`Host`].
    pub fn into_host(self) -> Host {
        let mock = Arc::new(self);
        Host {
            platform: mock.clone(),
            plugins: mock.clone(),
            updates: mock.clone(),
            files: mock.clone(),
            database: mock,
            log_candidates: vec![PathBuf::from(MOCK_DEBUG_LOG), PathBuf::from(MOCK_ERROR_LOG)],
        }
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformInfo for MockHost {
    async fn wordpress_version(&self) -> Option<String> {
        self.record_call();
        self.wordpress_version.clone()
    }

    async fn php_version(&self) -> Option<String> {
        self.record_call();
        self.php_version.clone()
    }

    fn os_family(&self) -> String {
        self.record_call();
        self.os_family.clone()
    }
}

#[async_trait]
impl PluginRegistry for MockHost {
    async fn installed_plugins(&self) -> Result<Vec<InstalledPlugin>, HostError> {
        self.record_call();
        Ok(self.plugins.clone())
    }

    async fn active_plugins(&self) -> Result<Vec<String>, HostError> {
        self.record_call();
        Ok(self.active.clone())
    }
}

#[async_trait]
impl UpdateCache for MockHost {
    async fn plugin_updates(&self) -> Result<Option<UpdateMap>, HostError> {
        self.record_call();
        Ok(self.updates.clone())
    }
}

#[async_trait]
impl FileReader for MockHost {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.record_call();
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "mock file not found"))
    }
}

#[async_trait]
impl DatabaseInspector for MockHost {
    async fn autoload_bytes(&self) -> Result<Option<i64>, HostError> {
        self.record_call();
        if self.fail_database {
            return Err(HostError::NoDatabase);
        }
        Ok(self.autoload)
    }

    async fn table_overheads(&self) -> Result<Vec<Option<u64>>, HostError> {
        self.record_call();
        if self.fail_database {
            return Err(HostError::NoDatabase);
        }
        Ok(self.overheads.clone())
    }
}
