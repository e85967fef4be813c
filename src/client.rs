//! Client for the diagnostics API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::diagnostics::{DbHealthSummary, LogTail, PluginsAnalysis, SystemInfo};
use crate::error::DoctorError;

const NAMESPACE_PATH: &str = "wpdoctor/v1/";

/// Typed client for a site's `wp-json` base URL.
#[derive(Debug, Clone)]
pub struct DoctorClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// `<site>/wp-json/wpdoctor/v1/`.
    base: Url,
    /// Basic auth user and application password.
    credentials: Option<(String, String)>,
}

impl DoctorClient {
    /// Create a client for `wp_json_url`, e.g. `https://example.com/wp-json`.
    pub fn new(
        wp_json_url: &str,
        credentials: Option<(String, String)>,
        timeout: Duration,
    ) -> Result<Self, DoctorError> {
        let mut root = Url::parse(wp_json_url)?;
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        let base = root.join(NAMESPACE_PATH)?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base,
            credentials,
        })
    }

    /// Namespace URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    #[instrument(skip(self, query), fields(base = %self.base))]
    async fn get<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &[(&str, String)],
    ) -> Result<T, DoctorError> {
        let url = self.base.join(route)?;
        let mut request = self.http.get(url).query(query);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await?.error_for_status()?;
        debug!("GET {} -> {}", route, response.status());
        Ok(response.json().await?)
    }

    /// `GET /system-info`.
    pub async fn system_info(&self) -> Result<SystemInfo, DoctorError> {
        self.get("system-info", &[]).await
    }

    /// `GET /plugins-analysis?status=...`.
    pub async fn plugins_analysis(&self, status: &str) -> Result<PluginsAnalysis, DoctorError> {
        self.get("plugins-analysis", &[("status", status.to_string())])
            .await
    }

    /// `GET /error-logs?lines=...&level=...`.
    pub async fn error_logs(&self, lines: i64, level: Option<&str>) -> Result<LogTail, DoctorError> {
        let mut query = vec![("lines", lines.to_string())];
        if let Some(level) = level {
            query.push(("level", level.to_string()));
        }
        self.get("error-logs", &query).await
    }

    /// `GET /db-check`.
    pub async fn db_check(&self) -> Result<DbHealthSummary, DoctorError> {
        self.get("db-check", &[]).await
    }
}
