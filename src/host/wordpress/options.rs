//! Options table values and their decoding.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::HostError;
use crate::host::{UpdateCache, UpdateMap};
use crate::php::{self, PhpValue};

/// Option holding the serialized list of active plugin files.
pub const ACTIVE_PLUGINS_OPTION: &str = "active_plugins";

/// Option holding the serialized plugin update-check transient.
pub const UPDATE_PLUGINS_TRANSIENT: &str = "_site_transient_update_plugins";

/// Raw reads from the options table.
#[async_trait]
pub trait OptionSource: Send + Sync {
    /// Raw `option_value` bytes, `None` when the option does not exist.
    async fn get_option(&self, name: &str) -> Result<Option<Vec<u8>>, HostError>;
}

/// Decode the `active_plugins` option into plugin files.
///
/// Non-string entries are skipped.
pub fn decode_active_plugins(raw: &[u8]) -> Result<Vec<String>, HostError> {
    let value = php::unserialize(raw)?;
    Ok(value
        .values()
        .into_iter()
        .filter_map(|v| match v {
            PhpValue::Str(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
        .collect())
}

/// Decode the update transient's `response` map.
///
/// Returns `None` when the transient has no `response` member.
pub fn decode_update_transient(raw: &[u8]) -> Result<Option<UpdateMap>, HostError> {
    let value = php::unserialize(raw)?;
    let Some(response) = value.get("response") else {
        return Ok(None);
    };

    let updates = response
        .entries()
        .into_iter()
        .map(|(file, info)| {
            let new_version = info
                .get("new_version")
                .and_then(PhpValue::as_text)
                .map(|v| v.into_owned());
            (file.into_owned(), new_version)
        })
        .collect();

    Ok(Some(updates))
}

/// Update cache backed by the `update_plugins` site transient.
#[derive(Clone)]
pub struct TransientUpdateCache {
    options: Option<Arc<dyn OptionSource>>,
}

impl TransientUpdateCache {
    /// Cache reading from `options`; `None` means no update mechanism.
    pub fn new(options: Option<Arc<dyn OptionSource>>) -> Self {
        Self { options }
    }
}

#[async_trait]
impl UpdateCache for TransientUpdateCache {
    async fn plugin_updates(&self) -> Result<Option<UpdateMap>, HostError> {
        let Some(options) = &self.options else {
            debug!("No options store, update check unavailable");
            return Ok(None);
        };

        let Some(raw) = options.get_option(UPDATE_PLUGINS_TRANSIENT).await? else {
            debug!("Update transient not present");
            return Ok(None);
        };

        match decode_update_transient(&raw) {
            Ok(updates) => Ok(updates),
            Err(e) => {
                warn!("Ignoring undecodable update transient: {}", e);
                Ok(None)
            }
        }
    }
}
