//! Platform version report.

use crate::host::PlatformInfo;

use super::types::SystemInfo;

/// Collect platform versions. Unknown values become empty strings.
pub async fn system_info(platform: &dyn PlatformInfo) -> SystemInfo {
    let (wordpress_version, php_version) =
        tokio::join!(platform.wordpress_version(), platform.php_version());

    SystemInfo {
        wordpress_version: wordpress_version.unwrap_or_default(),
        php_version: php_version.unwrap_or_default(),
        server_os: platform.os_family(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn reports_platform_versions() {
        let host = MockHost::new();
        let info = system_info(&host).await;

        assert_eq!(
            info,
            SystemInfo {
                wordpress_version: "6.4.2".to_string(),
                php_version: "8.2.12".to_string(),
                server_os: "Linux".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unknown_versions_are_empty() {
        let mut host = MockHost::new();
        host.wordpress_version = None;
        host.php_version = None;

        let info = system_info(&host).await;
        assert_eq!(info.wordpress_version, "");
        assert_eq!(info.php_version, "");
        assert_eq!(info.server_os, "Linux");
    }
}
