//! Plugin directory scanning and activation lookup.
//!
//! Mirrors how WordPress discovers plugins: top-level `*.php` files and
//! `*.php` files one directory deep, each identified by a `Plugin Name:`
//! header within the first 8 KiB.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use crate::error::HostError;
use crate::host::{InstalledPlugin, PluginRegistry};

use super::options::{decode_active_plugins, OptionSource, ACTIVE_PLUGINS_OPTION};

const HEADER_READ_LIMIT: u64 = 8 * 1024;

static NAME_RE: Lazy<Regex> = Lazy::new(|| header_regex("Plugin Name"));
static VERSION_RE: Lazy<Regex> = Lazy::new(|| header_regex("Version"));

fn header_regex(field: &str) -> Regex {
    Regex::new(&format!(
        r"(?mi)^(?:[ \t]*<\?php)?[ \t/*#@]*{}:(.*)$",
        regex::escape(field)
    ))
    .expect("valid plugin header regex")
}

/// Header fields read from a plugin's main file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginHeader {
    /// `Plugin Name:` value.
    pub name: String,
    /// `Version:` value.
    pub version: String,
}

/// Parse the plugin header block.
pub fn parse_plugin_header(source: &str) -> PluginHeader {
    PluginHeader {
        name: header_value(&NAME_RE, source),
        version: header_value(&VERSION_RE, source),
    }
}

fn header_value(re: &Regex, source: &str) -> String {
    re.captures(source)
        .and_then(|c| c.get(1))
        .map(|m| cleanup_header_comment(m.as_str()))
        .unwrap_or_default()
}

/// Drop everything from the first `*/` or `?>` on, then trim.
fn cleanup_header_comment(raw: &str) -> String {
    let end = [raw.find("*/"), raw.find("?>")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(raw.len());
    raw[..end].trim().to_string()
}

/// Plugin registry over a plugin directory and the options table.
#[derive(Clone)]
pub struct WordPressPlugins {
    plugin_dir: PathBuf,
    options: Option<Arc<dyn OptionSource>>,
}

impl WordPressPlugins {
    /// Registry for `plugin_dir`; activation state comes from `options`.
    pub fn new(plugin_dir: PathBuf, options: Option<Arc<dyn OptionSource>>) -> Self {
        Self {
            plugin_dir,
            options,
        }
    }

    /// Candidate plugin files relative to the plugin directory.
    async fn candidate_files(&self) -> Vec<String> {
        let mut files = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.plugin_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot open plugin dir {}: {}", self.plugin_dir.display(), e);
                return files;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let Ok(file_type) = entry.file_type().await else {
                continue;
            };

            if file_type.is_dir() {
                let Ok(mut sub) = tokio::fs::read_dir(entry.path()).await else {
                    continue;
                };
                while let Ok(Some(sub_entry)) = sub.next_entry().await {
                    let sub_name = sub_entry.file_name().to_string_lossy().into_owned();
                    if sub_name.starts_with('.') || !sub_name.ends_with(".php") {
                        continue;
                    }
                    files.push(format!("{}/{}", name, sub_name));
                }
            } else if name.ends_with(".php") {
                files.push(name);
            }
        }

        files
    }
}

async fn read_header_block(path: &Path) -> std::io::Result<String> {
    let file = tokio::fs::File::open(path).await?;
    let mut buf = Vec::with_capacity(HEADER_READ_LIMIT as usize);
    file.take(HEADER_READ_LIMIT).read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[async_trait]
impl PluginRegistry for WordPressPlugins {
    #[instrument(skip(self), fields(dir = %self.plugin_dir.display()))]
    async fn installed_plugins(&self) -> Result<Vec<InstalledPlugin>, HostError> {
        let mut plugins = Vec::new();

        for file in self.candidate_files().await {
            let source = match read_header_block(&self.plugin_dir.join(&file)).await {
                Ok(source) => source,
                Err(e) => {
                    debug!("Skipping unreadable plugin file {}: {}", file, e);
                    continue;
                }
            };

            let header = parse_plugin_header(&source);
            if header.name.is_empty() {
                continue;
            }

            plugins.push(InstalledPlugin {
                file,
                name: header.name,
                version: header.version,
            });
        }

        plugins.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.file.cmp(&b.file))
        });

        debug!("Found {} installed plugins", plugins.len());
        Ok(plugins)
    }

    async fn active_plugins(&self) -> Result<Vec<String>, HostError> {
        let options = self.options.as_ref().ok_or(HostError::NoDatabase)?;
        match options.get_option(ACTIVE_PLUGINS_OPTION).await? {
            Some(raw) => decode_active_plugins(&raw),
            None => Ok(Vec::new()),
        }
    }
}
