//! Immutable per-batch context.

use std::fmt;
use syncmark_connector::config::{AuthConfig, ConnectionSettings};

use crate::entity::EntityTypeConfig;

/// Everything a record needs that is the same for the whole batch.
///
/// Shared read-only across workers behind an `Arc`. Per-record values are
/// passed around as return values, never stored here.
#[derive(Clone)]
pub struct SyncContext {
    pub credentials: AuthConfig,
    pub base_url: String,
    pub connection: ConnectionSettings,
    pub entity: EntityTypeConfig,
}

impl SyncContext {
    pub fn new(
        base_url: impl Into<String>,
        credentials: AuthConfig,
        entity: EntityTypeConfig,
    ) -> Self {
        Self {
            credentials,
            base_url: base_url.into(),
            connection: ConnectionSettings::default(),
            entity,
        }
    }

    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionSettings) -> Self {
        self.connection = connection;
        self
    }

    /// User name of the Basic credentials, if any.
    pub fn user(&self) -> Option<&str> {
        match &self.credentials {
            AuthConfig::Basic { username, .. } => Some(username.as_str()),
            AuthConfig::None => None,
        }
    }
}

impl fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("credentials", &self.credentials.redacted())
            .field("base_url", &self.base_url)
            .field("connection", &self.connection)
            .field("entity", &self.entity.name)
            .finish()
    }
}
