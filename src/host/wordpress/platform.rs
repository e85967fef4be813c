//! Platform and runtime version lookups.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::host::PlatformInfo;

static WP_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\$wp_version\s*=\s*['"]([^'"]+)['"]\s*;"#).expect("valid wp_version regex")
});

const PHP_VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads versions from a WordPress installation on disk.
#[derive(Debug, Clone)]
pub struct WordPressPlatform {
    abspath: PathBuf,
    php_binary: String,
}

impl WordPressPlatform {
    /// Platform lookups for the installation rooted at `abspath`.
    pub fn new(abspath: PathBuf, php_binary: String) -> Self {
        Self {
            abspath,
            php_binary,
        }
    }
}

#[async_trait]
impl PlatformInfo for WordPressPlatform {
    #[instrument(skip(self))]
    async fn wordpress_version(&self) -> Option<String> {
        let path = self.abspath.join("wp-includes").join("version.php");
        match tokio::fs::read_to_string(&path).await {
            Ok(source) => parse_wp_version(&source),
            Err(e) => {
                debug!("Cannot read {}: {}", path.display(), e);
                None
            }
        }
    }

    #[instrument(skip(self), fields(php = %self.php_binary))]
    async fn php_version(&self) -> Option<String> {
        let output = Command::new(&self.php_binary)
            .args(["-r", "echo PHP_VERSION;"])
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(PHP_VERSION_TIMEOUT, output).await {
            Ok(Ok(out)) if out.status.success() => {
                let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
                (!version.is_empty()).then_some(version)
            }
            Ok(Ok(out)) => {
                debug!("PHP exited with {}", out.status);
                None
            }
            Ok(Err(e)) => {
                debug!("Cannot run PHP: {}", e);
                None
            }
            Err(_) => {
                debug!("PHP version lookup timed out");
                None
            }
        }
    }

    fn os_family(&self) -> String {
        php_os_family(std::env::consts::OS).to_string()
    }
}

/// Extract `$wp_version` from `wp-includes/version.php`.
pub fn parse_wp_version(source: &str) -> Option<String> {
    WP_VERSION_RE
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Map a Rust target OS name onto PHP_OS_FAMILY.
pub fn php_os_family(os: &str) -> &'static str {
    match os {
        "linux" | "android" => "Linux",
        "macos" | "ios" => "Darwin",
        "windows" => "Windows",
        "freebsd" | "openbsd" | "netbsd" | "dragonfly" => "BSD",
        "solaris" | "illumos" => "Solaris",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_version_php() {
        let source = "<?php\n/**\n * WordPress Version\n */\n$wp_version = '6.4.2';\n$wp_db_version = 56657;\n";
        assert_eq!(parse_wp_version(source), Some("6.4.2".to_string()));
    }

    #[test]
    fn missing_version_is_none() {
        assert_eq!(parse_wp_version("<?php\n$wp_db_version = 1;"), None);
    }

    #[test]
    fn os_family_matches_php_names() {
        assert_eq!(php_os_family("linux"), "Linux");
        assert_eq!(php_os_family("macos"), "Darwin");
        assert_eq!(php_os_family("windows"), "Windows");
        assert_eq!(php_os_family("freebsd"), "BSD");
        assert_eq!(php_os_family("haiku"), "Unknown");
    }

    #[tokio::test]
    async fn reads_version_from_install() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("wp-includes")).unwrap();
        std::fs::write(
            dir.path().join("wp-includes/version.php"),
            "<?php\n$wp_version = '6.5-beta1';\n",
        )
        .unwrap();

        let platform = WordPressPlatform::new(dir.path().to_path_buf(), "php".to_string());
        assert_eq!(platform.wordpress_version().await, Some("6.5-beta1".to_string()));
    }

    #[tokio::test]
    async fn missing_interpreter_yields_none() {
        let platform = WordPressPlatform::new(
            PathBuf::from("/nonexistent"),
            "/nonexistent/bin/php-does-not-exist".to_string(),
        );
        assert_eq!(platform.php_version().await, None);
        assert_eq!(platform.wordpress_version().await, None);
    }
}
