//! Database maintenance aggregates.

use crate::error::HostError;
use crate::host::DatabaseInspector;

use super::types::DbHealthSummary;

/// Sum autoloaded option bytes and table overhead.
///
/// NULL sums and tables without a reported overhead count as zero. Query
/// failures are returned unchanged.
pub async fn db_health(inspector: &dyn DatabaseInspector) -> Result<DbHealthSummary, HostError> {
    let autoload_size = inspector.autoload_bytes().await?.unwrap_or(0);
    let overhead = inspector
        .table_overheads()
        .await?
        .into_iter()
        .map(|free| free.unwrap_or(0))
        .fold(0u64, u64::saturating_add);

    Ok(DbHealthSummary {
        autoload_size,
        overhead,
    })
}
