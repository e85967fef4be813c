//! MySQL access to the WordPress database.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Opts, Pool, Row};
use tracing::{debug, instrument};

use crate::error::HostError;
use crate::host::DatabaseInspector;

use super::options::OptionSource;

/// Connection pool plus table prefix for one WordPress database.
#[derive(Clone)]
pub struct WpDatabase {
    pool: Pool,
    prefix: String,
}

impl WpDatabase {
    /// Create a lazily connecting pool. The prefix must already be validated.
    pub fn new(url: &str, prefix: &str) -> Result<Self, HostError> {
        let opts = Opts::from_url(url).map_err(mysql_async::Error::from)?;
        Ok(Self {
            pool: Pool::new(opts),
            prefix: prefix.to_string(),
        })
    }

    /// Name of the options table.
    pub fn options_table(&self) -> String {
        format!("{}options", self.prefix)
    }

    /// Close all pooled connections.
    pub async fn disconnect(self) -> Result<(), HostError> {
        self.pool.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl OptionSource for WpDatabase {
    #[instrument(skip(self))]
    async fn get_option(&self, name: &str) -> Result<Option<Vec<u8>>, HostError> {
        let mut conn = self.pool.get_conn().await?;
        let sql = format!(
            "SELECT option_value FROM {} WHERE option_name = ? LIMIT 1",
            self.options_table()
        );
        let value: Option<Vec<u8>> = conn.exec_first(sql, (name,)).await?;
        Ok(value)
    }
}

#[async_trait]
impl DatabaseInspector for WpDatabase {
    #[instrument(skip(self))]
    async fn autoload_bytes(&self) -> Result<Option<i64>, HostError> {
        let mut conn = self.pool.get_conn().await?;
        let sql = format!(
            "SELECT CAST(SUM(LENGTH(option_value)) AS SIGNED) FROM {} WHERE autoload = 'yes'",
            self.options_table()
        );
        let sum: Option<Option<i64>> = conn.query_first(sql).await?;
        Ok(sum.flatten())
    }

    #[instrument(skip(self))]
    async fn table_overheads(&self) -> Result<Vec<Option<u64>>, HostError> {
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<Row> = conn.query("SHOW TABLE STATUS").await?;
        debug!("SHOW TABLE STATUS returned {} rows", rows.len());

        Ok(rows
            .iter()
            .map(|row| {
                row.get_opt::<Option<u64>, _>("Data_free")
                    .and_then(Result::ok)
                    .flatten()
            })
            .collect())
    }
}

/// Stand-in used when no database URL is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDatabase;

#[async_trait]
impl DatabaseInspector for NoDatabase {
    async fn autoload_bytes(&self) -> Result<Option<i64>, HostError> {
        Err(HostError::NoDatabase)
    }

    async fn table_overheads(&self) -> Result<Vec<Option<u64>>, HostError> {
        Err(HostError::NoDatabase)
    }
}
