//! End-to-end tests: a live server on a loopback port driven through
//! [`DoctorClient`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::net::TcpListener;

use wp_doctor::api::{create_router, AppState};
use wp_doctor::auth::{hash_password, BasicAuthenticator, Role};
use wp_doctor::client::DoctorClient;
use wp_doctor::config::Config;
use wp_doctor::diagnostics::{DbHealthSummary, PluginStatus};
use wp_doctor::host::mock::{MockHost, MOCK_DEBUG_LOG};
use wp_doctor::host::{Host, WordPressHost};
use wp_doctor::DoctorError;

const USER: &str = "admin";
const PASSWORD: &str = "abcd efgh ijkl mnop";

/// Serve `host` on an ephemeral port and return the site's wp-json URL.
async fn spawn_server(host: Host, role: Role) -> String {
    let authenticator = BasicAuthenticator::new(USER, &hash_password(PASSWORD), role).unwrap();
    let state = AppState::new(host, Arc::new(authenticator));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    format!("http://{}/wp-json", addr)
}

fn client(url: &str, password: &str) -> DoctorClient {
    DoctorClient::new(
        url,
        Some((USER.to_string(), password.to_string())),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn status_of(err: DoctorError) -> Option<u16> {
    match err {
        DoctorError::Http(e) => e.status().map(|s| s.as_u16()),
        _ => None,
    }
}

#[tokio::test]
async fn test_all_endpoints_over_http() {
    let host = MockHost::new()
        .with_plugin("akismet/akismet.php", "Akismet", "5.3", true)
        .with_plugin("hello.php", "Hello Dolly", "1.7.2", false)
        .with_update("akismet/akismet.php", Some("5.3.1"))
        .with_file(MOCK_DEBUG_LOG, "first\nsecond\nthird\n")
        .with_database(Some(1_048_576), vec![Some(4096), None, Some(1024)]);
    let url = spawn_server(host.into_host(), Role::Administrator).await;
    let client = client(&url, PASSWORD);

    let info = client.system_info().await.unwrap();
    assert_eq!(info.wordpress_version, "6.4.2");
    assert_eq!(info.php_version, "8.2.12");
    assert_eq!(info.server_os, "Linux");

    let active = client.plugins_analysis("active").await.unwrap();
    assert_eq!(active.plugins.len(), 1);
    assert_eq!(active.plugins[0].name, "Akismet");
    assert_eq!(active.active_count, 1);
    assert_eq!(active.updates.len(), 1);
    assert_eq!(active.updates[0].new_version.as_deref(), Some("5.3.1"));

    let all = client.plugins_analysis("all").await.unwrap();
    assert_eq!(all.plugins.len(), 2);
    assert_eq!(all.plugins[1].status, PluginStatus::Inactive);
    assert_eq!(all.active_count, 1);

    let logs = client.error_logs(2, Some("error")).await.unwrap();
    assert_eq!(logs.tail, vec!["second".to_string(), "third".to_string()]);
    assert_eq!(logs.source.as_deref(), Some(MOCK_DEBUG_LOG));

    let db = client.db_check().await.unwrap();
    assert_eq!(
        db,
        DbHealthSummary {
            autoload_size: 1_048_576,
            overhead: 5120,
        }
    );
}

#[tokio::test]
async fn test_wrong_password_is_rejected_with_401() {
    let url = spawn_server(MockHost::new().into_host(), Role::Administrator).await;

    let err = client(&url, "wrong").system_info().await.unwrap_err();
    assert_eq!(status_of(err), Some(401));

    let anonymous = DoctorClient::new(&url, None, Duration::from_secs(5)).unwrap();
    let err = anonymous.db_check().await.unwrap_err();
    assert_eq!(status_of(err), Some(401));
}

#[tokio::test]
async fn test_non_admin_is_rejected_with_403() {
    let url = spawn_server(MockHost::new().into_host(), Role::Editor).await;

    let err = client(&url, PASSWORD).system_info().await.unwrap_err();
    assert_eq!(status_of(err), Some(403));
}

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[tokio::test]
async fn test_wordpress_install_without_database() {
    let root = tempfile::tempdir().unwrap();
    write(
        &root.path().join("wp-includes/version.php"),
        "<?php\n$wp_version = '6.5.2';\n$wp_db_version = 57155;\n",
    );
    write(
        &root.path().join("wp-content/plugins/hello/hello.php"),
        "<?php\n/*\nPlugin Name: Hello Dolly\nVersion: 1.7.2\n*/\n",
    );
    write(&root.path().join("error_log"), "PHP Warning: one\nPHP Warning: two\n");

    let mut config = Config::for_abspath(root.path());
    config.php_binary = "/nonexistent/php".to_string();
    let wordpress = WordPressHost::from_config(&config).unwrap();
    let url = spawn_server(wordpress.host(), Role::Administrator).await;
    let client = client(&url, PASSWORD);

    let info = client.system_info().await.unwrap();
    assert_eq!(info.wordpress_version, "6.5.2");
    assert_eq!(info.php_version, "");

    // debug.log is missing, so the fallback log is read
    let logs = client.error_logs(50, None).await.unwrap();
    assert_eq!(logs.tail, vec!["PHP Warning: one", "PHP Warning: two"]);
    let expected_source = root.path().join("error_log");
    assert_eq!(
        logs.source.as_deref(),
        Some(expected_source.to_string_lossy().as_ref())
    );

    // activation state lives in the database
    let err = client.plugins_analysis("all").await.unwrap_err();
    assert_eq!(status_of(err), Some(500));
    let err = client.db_check().await.unwrap_err();
    assert_eq!(status_of(err), Some(500));

    wordpress.shutdown().await.unwrap();
}
