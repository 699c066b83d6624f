//! Environment configuration.
//!
//! Missing credentials and base URL degrade to explicit placeholders and are
//! listed in [`SyncSettings::missing`]; the caller decides whether that is
//! fatal. Values that are present but unparseable are always errors.

use std::env::VarError;
use std::path::PathBuf;
use syncmark_connector::config::{AuthConfig, ConnectionSettings, LookupStyle};

use crate::context::SyncContext;
use crate::digest::HexCase;
use crate::entity::EntityCatalog;
use crate::mapping::RankRounding;
use crate::orchestrator::BatchPolicy;
use crate::probe::ProbeFailureMode;

/// Placeholder for missing credentials.
pub const UNDEFINED: &str = "UNDEFINED";
/// Placeholder for a missing base URL. Never resolves.
pub const UNDEFINED_BASE_URL: &str = "http://undefined.invalid";

pub const SYNC_USER: &str = "SYNC_USER";
pub const SYNC_PASSWORD: &str = "SYNC_PASSWORD";
pub const SYNC_BASE_URL: &str = "SYNC_BASE_URL";
pub const SYNC_QUOTE_RANK_ROUNDING: &str = "SYNC_QUOTE_RANK_ROUNDING";

/// Catalog name of the only entity type that needs a rank rounding.
const QUOTE: &str = "quote";

/// Settings of one synchronization run.
#[derive(Clone)]
pub struct SyncSettings {
    pub user: String,
    pub password: String,
    pub base_url: String,
    /// Catalog name of the entity type, e.g. `business-partner`.
    pub entity_type: String,
    pub continue_on_record_error: bool,
    pub call_timeout_ms: u64,
    pub max_concurrency: usize,
    /// Overrides the lookup style of the entity type when set.
    pub lookup_style: Option<LookupStyle>,
    pub digest_hex_case: HexCase,
    pub probe_failure_mode: ProbeFailureMode,
    /// Never defaulted; quotes cannot be synchronized until one is chosen.
    pub quote_rank_rounding: Option<RankRounding>,
    pub batch_file: Option<PathBuf>,
    pub report_file: Option<PathBuf>,
    pub diagnostics_dir: Option<PathBuf>,
    pub store_dir: Option<PathBuf>,
    /// Keys that were absent and replaced by placeholders.
    pub missing: Vec<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            user: UNDEFINED.to_string(),
            password: UNDEFINED.to_string(),
            base_url: UNDEFINED_BASE_URL.to_string(),
            entity_type: "business-partner".to_string(),
            continue_on_record_error: true,
            call_timeout_ms: 30_000,
            max_concurrency: 1,
            lookup_style: None,
            digest_hex_case: HexCase::Lower,
            probe_failure_mode: ProbeFailureMode::Fail,
            quote_rank_rounding: None,
            batch_file: None,
            report_file: None,
            diagnostics_dir: None,
            store_dir: None,
            missing: vec![
                SYNC_USER.to_string(),
                SYNC_PASSWORD.to_string(),
                SYNC_BASE_URL.to_string(),
            ],
        }
    }
}

impl std::fmt::Debug for SyncSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSettings")
            .field("user", &self.user)
            .field("password", &"***")
            .field("base_url", &self.base_url)
            .field("entity_type", &self.entity_type)
            .field("continue_on_record_error", &self.continue_on_record_error)
            .field("call_timeout_ms", &self.call_timeout_ms)
            .field("max_concurrency", &self.max_concurrency)
            .field("missing", &self.missing)
            .finish_non_exhaustive()
    }
}

fn parse_with<T, F>(key: &str, value: &str, parse: F) -> Result<T, ConfigError>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    parse(value.trim()).map_err(|e| ConfigError::InvalidValue(key.into(), e))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(format!("expected a boolean, got '{value}'")),
    }
}

fn parse_positive<T>(value: &str) -> Result<T, String>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let n = value.parse::<T>().map_err(|e| e.to_string())?;
    if n > T::default() {
        Ok(n)
    } else {
        Err("must be greater than zero".to_string())
    }
}

impl SyncSettings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load settings from a custom variable reader.
    ///
    /// Tests use this to supply variables without touching the process
    /// environment.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let read = |key: &str| reader(key).ok().filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |key: &str, placeholder: &str| match read(key) {
            Some(value) => value,
            None => {
                missing.push(key.to_string());
                placeholder.to_string()
            }
        };
        let user = required(SYNC_USER, UNDEFINED);
        let password = required(SYNC_PASSWORD, UNDEFINED);
        let base_url = required(SYNC_BASE_URL, UNDEFINED_BASE_URL);

        let defaults = Self::default();

        let entity_type = read("SYNC_ENTITY_TYPE")
            .map(|v| v.trim().to_lowercase())
            .unwrap_or(defaults.entity_type);

        let continue_on_record_error = match read("SYNC_CONTINUE_ON_RECORD_ERROR") {
            Some(v) => parse_with("SYNC_CONTINUE_ON_RECORD_ERROR", &v, parse_bool)?,
            None => defaults.continue_on_record_error,
        };

        let call_timeout_ms = match read("SYNC_CALL_TIMEOUT_MS") {
            Some(v) => parse_with("SYNC_CALL_TIMEOUT_MS", &v, parse_positive::<u64>)?,
            None => defaults.call_timeout_ms,
        };

        let max_concurrency = match read("SYNC_MAX_CONCURRENCY") {
            Some(v) => parse_with("SYNC_MAX_CONCURRENCY", &v, parse_positive::<usize>)?,
            None => defaults.max_concurrency,
        };

        let lookup_style = read("SYNC_LOOKUP_STYLE")
            .map(|v| parse_with("SYNC_LOOKUP_STYLE", &v, |s| s.parse::<LookupStyle>()))
            .transpose()?;

        let digest_hex_case = match read("SYNC_DIGEST_HEX_CASE") {
            Some(v) => parse_with("SYNC_DIGEST_HEX_CASE", &v, |s| s.parse::<HexCase>())?,
            None => defaults.digest_hex_case,
        };

        let probe_failure_mode = match read("SYNC_PROBE_FAILURE_MODE") {
            Some(v) => parse_with("SYNC_PROBE_FAILURE_MODE", &v, |s| {
                s.parse::<ProbeFailureMode>()
            })?,
            None => defaults.probe_failure_mode,
        };

        let quote_rank_rounding = read(SYNC_QUOTE_RANK_ROUNDING)
            .map(|v| parse_with(SYNC_QUOTE_RANK_ROUNDING, &v, |s| s.parse::<RankRounding>()))
            .transpose()?;

        let settings = Self {
            user,
            password,
            base_url,
            entity_type,
            continue_on_record_error,
            call_timeout_ms,
            max_concurrency,
            lookup_style,
            digest_hex_case,
            probe_failure_mode,
            quote_rank_rounding,
            batch_file: read("SYNC_BATCH_FILE").map(PathBuf::from),
            report_file: read("SYNC_REPORT_FILE").map(PathBuf::from),
            diagnostics_dir: read("SYNC_DIAGNOSTICS_DIR").map(PathBuf::from),
            store_dir: read("SYNC_STORE_DIR").map(PathBuf::from),
            missing,
        };
        settings.require_rank_rounding()?;
        Ok(settings)
    }

    /// Quotes need an explicit rank rounding; there is no safe default.
    fn require_rank_rounding(&self) -> Result<(), ConfigError> {
        if self.entity_type == QUOTE && self.quote_rank_rounding.is_none() {
            return Err(ConfigError::MissingVar(SYNC_QUOTE_RANK_ROUNDING.to_string()));
        }
        Ok(())
    }

    /// Whether `key` was absent and replaced by a placeholder.
    pub fn is_missing(&self, key: &str) -> bool {
        self.missing.iter().any(|k| k == key)
    }

    pub fn credentials(&self) -> AuthConfig {
        AuthConfig::basic(&self.user, &self.password)
    }

    pub fn connection(&self) -> ConnectionSettings {
        ConnectionSettings::new().with_call_timeout_ms(self.call_timeout_ms)
    }

    pub fn policy(&self) -> BatchPolicy {
        BatchPolicy {
            continue_on_record_error: self.continue_on_record_error,
            max_concurrency: self.max_concurrency,
        }
    }

    /// Resolve the configured entity type and build the batch context.
    pub fn build_context(&self) -> Result<SyncContext, ConfigError> {
        self.require_rank_rounding()?;
        let entity = EntityCatalog::standard(self).resolve(&self.entity_type)?;
        Ok(
            SyncContext::new(&self.base_url, self.credentials(), entity)
                .with_connection(self.connection()),
        )
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("unknown entity type '{0}', expected one of: {1}")]
    UnknownEntityType(String, String),
}
