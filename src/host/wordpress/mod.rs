//! Host collaborators backed by a real WordPress installation.
//!
//! Files are read from the installation directory; options and table status
//! come from MySQL when a database URL is configured.

pub mod database;
pub mod options;
pub mod platform;
pub mod plugins;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::error::HostError;
use crate::host::{DatabaseInspector, FileReader, Host};

pub use database::{NoDatabase, WpDatabase};
pub use options::{OptionSource, TransientUpdateCache};
pub use platform::WordPressPlatform;
pub use plugins::WordPressPlugins;

/// File reads straight from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

#[async_trait]
impl FileReader for FsReader {
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// A WordPress installation wired into a [`Host`].
pub struct WordPressHost {
    host: Host,
    database: Option<WpDatabase>,
}

impl WordPressHost {
    /// Build host collaborators from configuration.
    ///
    /// Must be called inside a Tokio runtime when a database URL is set.
    pub fn from_config(config: &Config) -> Result<Self, HostError> {
        let database = config
            .database_url
            .as_deref()
            .map(|url| WpDatabase::new(url, &config.table_prefix))
            .transpose()?;

        let options: Option<Arc<dyn OptionSource>> = database
            .clone()
            .map(|db| Arc::new(db) as Arc<dyn OptionSource>);
        let inspector: Arc<dyn DatabaseInspector> = match &database {
            Some(db) => Arc::new(db.clone()),
            None => Arc::new(NoDatabase),
        };

        info!(
            abspath = %config.wp_abspath.display(),
            plugin_dir = %config.plugin_dir().display(),
            database = database.is_some(),
            "WordPress host configured"
        );

        let host = Host {
            platform: Arc::new(WordPressPlatform::new(
                config.wp_abspath.clone(),
                config.php_binary.clone(),
            )),
            plugins: Arc::new(WordPressPlugins::new(config.plugin_dir(), options.clone())),
            updates: Arc::new(TransientUpdateCache::new(options)),
            files: Arc::new(FsReader),
            database: inspector,
            log_candidates: config.log_candidates(),
        };

        Ok(Self { host, database })
    }

    /// Collaborators to hand to the API.
    pub fn host(&self) -> Host {
        self.host.clone()
    }

    /// Release database connections.
    pub async fn shutdown(self) -> Result<(), HostError> {
        match self.database {
            Some(db) => db.disconnect().await,
            None => Ok(()),
        }
    }
}
