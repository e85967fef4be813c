//! Plugin inventory and pending updates.

use std::collections::HashSet;

use tracing::debug;

use crate::error::HostError;
use crate::host::{PluginRegistry, UpdateCache};

use super::types::{PluginRecord, PluginStatus, PluginsAnalysis, UpdateRecord};

/// Which plugins to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Active plugins only.
    #[default]
    Active,
    /// Every installed plugin.
    All,
}

impl StatusFilter {
    /// Interpret the `status` query parameter.
    ///
    /// Absent or empty means `active`; only the exact value `active` filters.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some("active") => StatusFilter::Active,
            Some(_) => StatusFilter::All,
        }
    }
}

/// Build the plugin inventory.
///
/// `active_count` is counted over the returned list, so with
/// [`StatusFilter::Active`] it always equals the list length.
pub async fn analyze_plugins(
    registry: &dyn PluginRegistry,
    updates: &dyn UpdateCache,
    filter: StatusFilter,
) -> Result<PluginsAnalysis, HostError> {
    let (installed, active) =
        futures::try_join!(registry.installed_plugins(), registry.active_plugins())?;
    let active: HashSet<&str> = active.iter().map(String::as_str).collect();

    let plugins: Vec<PluginRecord> = installed
        .iter()
        .filter_map(|plugin| {
            let is_active = active.contains(plugin.file.as_str());
            if filter == StatusFilter::Active && !is_active {
                return None;
            }
            Some(PluginRecord {
                file: plugin.file.clone(),
                name: plugin.name.clone(),
                version: plugin.version.clone(),
                status: if is_active {
                    PluginStatus::Active
                } else {
                    PluginStatus::Inactive
                },
            })
        })
        .collect();

    let active_count = plugins
        .iter()
        .filter(|p| p.status == PluginStatus::Active)
        .count();

    // Only installed plugins with a cache entry count as updates.
    let updates = match updates.plugin_updates().await? {
        Some(available) => installed
            .iter()
            .filter_map(|plugin| {
                available.get(&plugin.file).map(|new_version| UpdateRecord {
                    file: plugin.file.clone(),
                    new_version: new_version.clone(),
                })
            })
            .collect(),
        None => {
            debug!("Update check unavailable, reporting no updates");
            Vec::new()
        }
    };

    Ok(PluginsAnalysis {
        plugins,
        active_count,
        updates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use pretty_assertions::assert_eq;

    fn sample_host() -> MockHost {
        MockHost::new()
            .with_plugin("akismet/akismet.php", "Akismet", "5.3.1", true)
            .with_plugin("hello.php", "Hello Dolly", "1.7.2", false)
            .with_plugin("woocommerce/woocommerce.php", "WooCommerce", "8.4.0", true)
    }

    #[test]
    fn status_param_defaults_to_active() {
        assert_eq!(StatusFilter::from_param(None), StatusFilter::Active);
        assert_eq!(StatusFilter::from_param(Some("")), StatusFilter::Active);
        assert_eq!(StatusFilter::from_param(Some("active")), StatusFilter::Active);
        assert_eq!(StatusFilter::from_param(Some("all")), StatusFilter::All);
        assert_eq!(StatusFilter::from_param(Some("inactive")), StatusFilter::All);
        assert_eq!(StatusFilter::from_param(Some("ACTIVE")), StatusFilter::All);
    }

    #[tokio::test]
    async fn active_filter_keeps_active_only() {
        let host = sample_host();
        let analysis = analyze_plugins(&host, &host, StatusFilter::Active)
            .await
            .unwrap();

        let files: Vec<&str> = analysis.plugins.iter().map(|p| p.file.as_str()).collect();
        assert_eq!(files, vec!["akismet/akismet.php", "woocommerce/woocommerce.php"]);
        assert!(analysis
            .plugins
            .iter()
            .all(|p| p.status == PluginStatus::Active));
        assert_eq!(analysis.active_count, analysis.plugins.len());
    }

    #[tokio::test]
    async fn all_filter_reports_every_plugin() {
        let host = sample_host();
        let analysis = analyze_plugins(&host, &host, StatusFilter::All)
            .await
            .unwrap();

        assert_eq!(analysis.plugins.len(), 3);
        assert_eq!(analysis.active_count, 2);
        assert_eq!(
            analysis.plugins[1],
            PluginRecord {
                file: "hello.php".to_string(),
                name: "Hello Dolly".to_string(),
                version: "1.7.2".to_string(),
                status: PluginStatus::Inactive,
            }
        );
    }

    #[tokio::test]
    async fn active_match_is_exact() {
        let mut host = MockHost::new().with_plugin("hello.php", "Hello Dolly", "1.7.2", false);
        host.active.push("Hello.php".to_string());
        host.active.push("hello.php ".to_string());

        let analysis = analyze_plugins(&host, &host, StatusFilter::All)
            .await
            .unwrap();
        assert_eq!(analysis.plugins[0].status, PluginStatus::Inactive);
        assert_eq!(analysis.active_count, 0);
    }

    #[tokio::test]
    async fn unavailable_update_check_gives_empty_updates() {
        let host = sample_host();
        let analysis = analyze_plugins(&host, &host, StatusFilter::All)
            .await
            .unwrap();
        assert!(analysis.updates.is_empty());
    }

    #[tokio::test]
    async fn updates_cover_installed_plugins_only() {
        let host = sample_host()
            .with_update("akismet/akismet.php", Some("5.3.2"))
            .with_update("hello.php", None)
            .with_update("removed/removed.php", Some("2.0"));

        let analysis = analyze_plugins(&host, &host, StatusFilter::Active)
            .await
            .unwrap();

        assert_eq!(
            analysis.updates,
            vec![
                UpdateRecord {
                    file: "akismet/akismet.php".to_string(),
                    new_version: Some("5.3.2".to_string()),
                },
                UpdateRecord {
                    file: "hello.php".to_string(),
                    new_version: None,
                },
            ]
        );
    }
}
