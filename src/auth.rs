//! Caller identity and the administrator gate.
//!
//! Identities come from HTTP Basic credentials (WordPress application
//! passwords are presented the same way). Roles grant capabilities the way
//! WordPress core does; only administrators hold `manage_options`.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose, Engine as _};
use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha256};
use strum::{AsRefStr, Display, EnumString};
use tracing::debug;

use crate::config::Config;
use crate::error::{AuthError, DoctorError};

/// Capability every diagnostics route requires.
pub const REQUIRED_CAPABILITY: Capability = Capability::ManageOptions;

/// WordPress capabilities relevant to this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Manage site settings; the administrator capability.
    ManageOptions,
    /// Activate and deactivate plugins.
    ActivatePlugins,
    /// Publish posts.
    PublishPosts,
    /// Edit own posts.
    EditPosts,
    /// Read content.
    Read,
}

/// Default WordPress roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Administrator,
    Editor,
    Author,
    Contributor,
    Subscriber,
}

impl Role {
    /// Capabilities granted by this role.
    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Administrator => &[ManageOptions, ActivatePlugins, PublishPosts, EditPosts, Read],
            Role::Editor | Role::Author => &[PublishPosts, EditPosts, Read],
            Role::Contributor => &[EditPosts, Read],
            Role::Subscriber => &[Read],
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Login name.
    pub login: String,
    /// Assigned role.
    pub role: Role,
}

impl Identity {
    /// Whether this identity holds `capability`.
    pub fn can(&self, capability: Capability) -> bool {
        self.role.capabilities().contains(&capability)
    }
}

/// True only for an identity holding the administrator capability.
pub fn is_site_admin(identity: Option<&Identity>) -> bool {
    identity.is_some_and(|id| id.can(REQUIRED_CAPABILITY))
}

/// Classify a failed gate: 401 for anonymous callers, 403 otherwise.
pub fn authorize(identity: Option<&Identity>) -> Result<(), AuthError> {
    if is_site_admin(identity) {
        return Ok(());
    }
    match identity {
        None => Err(AuthError::Unauthenticated),
        Some(_) => Err(AuthError::Forbidden {
            capability: REQUIRED_CAPABILITY.to_string(),
        }),
    }
}

/// Resolves the identity behind a request.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `None` for anonymous or invalid credentials.
    async fn authenticate(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// Hex SHA-256 of a password, the form stored in configuration.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Parse `Authorization: Basic ...` into user and password.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Single configured account checked against Basic credentials.
#[derive(Debug, Clone)]
pub struct BasicAuthenticator {
    user: String,
    password_sha256: Vec<u8>,
    role: Role,
}

impl BasicAuthenticator {
    /// Account `user` whose password hashes to `password_sha256` (hex).
    pub fn new(user: &str, password_sha256: &str, role: Role) -> Result<Self, DoctorError> {
        let password_sha256 = hex::decode(password_sha256)
            .map_err(|_| DoctorError::InvalidConfig("password hash must be hex".to_string()))?;
        Ok(Self {
            user: user.to_string(),
            password_sha256,
            role,
        })
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Option<Identity> {
        let (user, password) = basic_credentials(headers)?;
        let digest = Sha256::digest(password.as_bytes());

        let user_ok = constant_time_eq(user.as_bytes(), self.user.as_bytes());
        let password_ok = constant_time_eq(digest.as_slice(), &self.password_sha256);
        if !(user_ok && password_ok) {
            debug!("Rejected credentials for {:?}", user);
            return None;
        }

        Some(Identity {
            login: user,
            role: self.role,
        })
    }
}

/// Authenticator used when no account is configured; everyone is anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousOnly;

#[async_trait]
impl Authenticator for AnonymousOnly {
    async fn authenticate(&self, _headers: &HeaderMap) -> Option<Identity> {
        None
    }
}

/// Build the authenticator described by `config`.
pub fn authenticator_from_config(config: &Config) -> Result<Arc<dyn Authenticator>, DoctorError> {
    match (&config.api_user, &config.api_password_sha256) {
        (Some(user), Some(hash)) => {
            let role = Role::from_str(&config.api_role).map_err(|_| {
                DoctorError::InvalidConfig(format!("unknown role '{}'", config.api_role))
            })?;
            Ok(Arc::new(BasicAuthenticator::new(user, hash, role)?))
        }
        _ => Ok(Arc::new(AnonymousOnly)),
    }
}
