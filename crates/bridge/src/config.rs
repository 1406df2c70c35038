//! Bridge configuration loaded from environment variables.
//!
//! The deployment stage picks which set of platform credentials is used. The
//! result is one [`BridgeConfig`] built at startup and passed by reference to
//! every client; nothing below this module reads the environment.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BRIDGE_STAGE` - Deployment stage, `stg` or `prod`
//! - `BRIDGE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `{STAGE}_MAGENTO_URL` - Commerce REST base URL (e.g. `https://shop.example.com/rest/V1/`)
//! - `{STAGE}_MAGENTO_BEARER` - Commerce integration access token
//! - `{STAGE}_GAMA_URL` - Profile platform base URL
//! - `{STAGE}_GAMA_USERNAME` - Profile platform API user
//! - `{STAGE}_GAMA_PASSWORD` - Profile platform API key
//!
//! `{STAGE}` is `STG` or `PROD`.
//!
//! ## Optional
//! - `BRIDGE_HOST` - Bind address (default: 127.0.0.1)
//! - `BRIDGE_PORT` - Listen port (default: 3000)
//! - `GAMA_REDIRECT_PARAM` - Query parameter appended to every profile platform call (default: `gredir=gama`)
//! - `REGION_TABLE_PATH` - JSON file mapping commerce region ids to profile state codes
//! - `REGION_FALLBACK_CODE` - State code used for unmapped regions (default: 0)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment (defaults to the stage name)
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use profile_bridge_core::{SourceRegionId, TargetStateCode};

use crate::sync::RegionTable;

const DEFAULT_REDIRECT_PARAM: &str = "gredir=gama";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example-token",
    "xxx",
    "todo",
    "fixme",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("Stage {0} is not defined (expected `stg` or `prod`)")]
    UnknownStage(String),
    #[error("Failed to read region table {path}: {reason}")]
    RegionTable { path: String, reason: String },
}

/// Deployment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Staging,
    Production,
}

impl Stage {
    /// Parse the stage name used by the deploy pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownStage` for anything but `stg` or `prod`.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim() {
            "stg" => Ok(Self::Staging),
            "prod" => Ok(Self::Production),
            other => Err(ConfigError::UnknownStage(other.to_owned())),
        }
    }

    /// Prefix of this stage's environment variables.
    #[must_use]
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Self::Staging => "STG",
            Self::Production => "PROD",
        }
    }

    /// Short stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staging => "stg",
            Self::Production => "prod",
        }
    }
}

/// Bridge application configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Selected deployment stage
    pub stage: Stage,
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Commerce platform API configuration
    pub magento: MagentoConfig,
    /// Profile platform API configuration
    pub gama: GamaConfig,
    /// Region id to state code mapping used for addresses
    pub regions: RegionTable,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "stg", "prod")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

/// Commerce platform (Magento REST) configuration.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct MagentoConfig {
    /// REST base URL, always ending in `/`
    pub base_url: Url,
    /// Integration access token
    pub bearer_token: SecretString,
}

impl std::fmt::Debug for MagentoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagentoConfig")
            .field("base_url", &self.base_url.as_str())
            .field("bearer_token", &"[REDACTED]")
            .finish()
    }
}

/// Profile platform (GAMA) configuration.
///
/// Implements `Debug` manually to redact the API password.
#[derive(Clone)]
pub struct GamaConfig {
    /// API base URL, always ending in `/`
    pub base_url: Url,
    /// API user name (basic auth)
    pub username: String,
    /// API key (basic auth password)
    pub password: SecretString,
    /// `key=value` query parameter added to every request
    pub redirect_param: (String, String),
}

impl std::fmt::Debug for GamaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamaConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("redirect_param", &self.redirect_param)
            .finish()
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, if
    /// the stage is unknown, or if the region table cannot be read.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let stage = Stage::parse(&get_required_env("BRIDGE_STAGE")?)?;
        let database_url = get_database_url("BRIDGE_DATABASE_URL")?;
        let host = get_env_or_default("BRIDGE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BRIDGE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BRIDGE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BRIDGE_PORT".to_string(), e.to_string()))?;

        let magento = MagentoConfig::from_env(stage)?;
        let gama = GamaConfig::from_env(stage)?;
        let regions = load_region_table()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment =
            get_optional_env("SENTRY_ENVIRONMENT").or_else(|| Some(stage.as_str().to_owned()));
        let sentry_sample_rate = get_env_or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), e.to_string())
            })?;

        Ok(Self {
            stage,
            database_url,
            host,
            port,
            magento,
            gama,
            regions,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MagentoConfig {
    fn from_env(stage: Stage) -> Result<Self, ConfigError> {
        let prefix = stage.env_prefix();
        Ok(Self {
            base_url: get_base_url(&format!("{prefix}_MAGENTO_URL"))?,
            bearer_token: get_validated_secret(&format!("{prefix}_MAGENTO_BEARER"))?,
        })
    }
}

impl GamaConfig {
    fn from_env(stage: Stage) -> Result<Self, ConfigError> {
        let prefix = stage.env_prefix();
        let redirect_param = parse_redirect_param(&get_env_or_default(
            "GAMA_REDIRECT_PARAM",
            DEFAULT_REDIRECT_PARAM,
        ))?;

        Ok(Self {
            base_url: get_base_url(&format!("{prefix}_GAMA_URL"))?,
            username: get_required_env(&format!("{prefix}_GAMA_USERNAME"))?,
            password: get_required_secret(&format!("{prefix}_GAMA_PASSWORD"))?,
            redirect_param,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required base URL, normalised to end with `/` so relative paths join under it.
fn get_base_url(key: &str) -> Result<Url, ConfigError> {
    parse_base_url(&get_required_env(key)?)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL and make sure it ends with `/`.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let raw = raw.trim();
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{raw}/"))
    }
}

/// Split a `key=value` redirect parameter.
fn parse_redirect_param(raw: &str) -> Result<(String, String), ConfigError> {
    raw.trim()
        .trim_start_matches(['?', '&'])
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "GAMA_REDIRECT_PARAM".to_string(),
                format!("expected key=value, got '{raw}'"),
            )
        })
}

/// Validate that a secret is not a placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Load the region table from `REGION_TABLE_PATH`, or an empty table if unset.
fn load_region_table() -> Result<RegionTable, ConfigError> {
    let fallback = get_env_or_default("REGION_FALLBACK_CODE", "0")
        .parse::<i32>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("REGION_FALLBACK_CODE".to_string(), e.to_string())
        })?;
    let fallback = TargetStateCode::new(fallback);

    let Some(path) = get_optional_env("REGION_TABLE_PATH") else {
        tracing::warn!("REGION_TABLE_PATH not set, every address will use the fallback state");
        return Ok(RegionTable::new(HashMap::new(), fallback));
    };

    let codes = read_region_file(Path::new(&path))?;
    Ok(RegionTable::new(codes, fallback))
}

/// Read a region file shaped as `{"<region id>": <state code>, ...}`.
fn read_region_file(
    path: &Path,
) -> Result<HashMap<SourceRegionId, TargetStateCode>, ConfigError> {
    let region_error = |reason: String| ConfigError::RegionTable {
        path: path.display().to_string(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| region_error(e.to_string()))?;
    let table: HashMap<String, i32> =
        serde_json::from_str(&raw).map_err(|e| region_error(e.to_string()))?;

    table
        .into_iter()
        .map(|(region, code)| {
            region
                .trim()
                .parse::<i32>()
                .map(|id| (SourceRegionId::new(id), TargetStateCode::new(code)))
                .map_err(|_| region_error(format!("region id '{region}' is not an integer")))
        })
        .collect()
}
