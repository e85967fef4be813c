//! OpenAPI document for the diagnostics routes.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::diagnostics::{
    DbHealthSummary, LogTail, PluginRecord, PluginStatus, PluginsAnalysis, SystemInfo, UpdateRecord,
};

use super::error::{ErrorData, ErrorEnvelope};
use super::handlers;

/// Generated API description.
#[derive(OpenApi)]
#[openapi(
    info(title = "WP Doctor diagnostics API"),
    paths(
        handlers::system_info,
        handlers::plugins_analysis,
        handlers::error_logs,
        handlers::db_check
    ),
    components(schemas(
        SystemInfo,
        PluginStatus,
        PluginRecord,
        UpdateRecord,
        PluginsAnalysis,
        LogTail,
        DbHealthSummary,
        ErrorEnvelope,
        ErrorData
    )),
    modifiers(&BasicAuthScheme),
    tags((name = "diagnostics", description = "Read-only site health reports"))
)]
pub struct ApiDoc;

struct BasicAuthScheme;

impl Modify for BasicAuthScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
        );
    }
}
