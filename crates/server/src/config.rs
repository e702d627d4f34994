//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPPING_LIST_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `SHOPPING_LIST_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPPING_LIST_PORT` - Listen port (falls back to `PORT`, default: 3001)
//! - `SHOPPING_LIST_CORS_ORIGIN` - Allowed browser origin (default: any)
//! - `ITEM_NAME_MAX_LENGTH` - Max item name length (default and ceiling: 100)
//! - `ITEM_QUANTITY_MAX` - Max item quantity (default and ceiling: 999)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (Shopify - both credentials enable the `/shopify` routes)
//! - `SHOPIFY_API_KEY` - App client ID
//! - `SHOPIFY_API_SECRET` - App client secret (used for HMAC verification)
//! - `SHOPIFY_SCOPES` - Requested scopes (default: `read_products,read_orders`)
//! - `SHOPIFY_CALLBACK_URL` - OAuth redirect URI (default: `http://localhost:3001/shopify/callback`)
//! - `FRONTEND_URL` - Where to send the merchant after install (default: this server's `/`)
//! - `SHOPIFY_API_VERSION` - Admin REST API version (default: 2025-01)
//! - `SHOPIFY_API_ORIGIN` - Replace `https://<shop>` for every Shopify call (local mocks)
//! - `SHOPIFY_HTTP_TIMEOUT_SECS` - Timeout for calls to Shopify (default: 10)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use shopping_list_core::{ItemLimits, LimitsError};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SHOPIFY_SCOPES: &str = "read_products,read_orders";
const DEFAULT_CALLBACK_URL: &str = "http://localhost:3001/shopify/callback";
const DEFAULT_API_VERSION: &str = "2025-01";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
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
    #[error("Invalid item limits: {0}")]
    Limits(#[from] LimitsError),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origin (`None` allows any origin)
    pub cors_origin: Option<String>,
    /// Bounds applied by the item validation engine
    pub item_limits: ItemLimits,
    /// Shopify app configuration (`None` disables the install flow)
    pub shopify: Option<ShopifyAppConfig>,
    /// Emit JSON log lines instead of human-readable text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app (OAuth) configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// OAuth client ID (`SHOPIFY_API_KEY`)
    pub client_id: String,
    /// OAuth client secret, also the HMAC key for callbacks
    pub client_secret: SecretString,
    /// Comma-separated scopes requested at install time
    pub scopes: String,
    /// Redirect URI registered with Shopify
    pub callback_url: String,
    /// Frontend base URL for the post-install redirect
    pub frontend_url: Option<String>,
    /// Admin REST API version (e.g., 2025-01)
    pub api_version: String,
    /// Replaces `https://<shop>` in every outbound URL when set
    pub api_origin: Option<String>,
    /// Timeout for token exchange and product requests
    pub http_timeout: Duration,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("callback_url", &self.callback_url)
            .field("frontend_url", &self.frontend_url)
            .field("api_version", &self.api_version)
            .field("api_origin", &self.api_origin)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

/// Variable lookup used while loading configuration.
///
/// `from_env` reads the process environment; tests pass a map instead.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let database_url = get_database_url(lookup, "SHOPPING_LIST_DATABASE_URL")?;
        let host = get_env_or_default(lookup, "SHOPPING_LIST_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPPING_LIST_HOST".to_string(), e.to_string())
            })?;
        let port = lookup("SHOPPING_LIST_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "3001".to_string())
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPPING_LIST_PORT".to_string(), e.to_string())
            })?;
        let cors_origin = get_optional_env(lookup, "SHOPPING_LIST_CORS_ORIGIN")
            .map(|origin| origin.trim_end_matches('/').to_string());
        if let Some(origin) = &cors_origin {
            validate_url(origin, "SHOPPING_LIST_CORS_ORIGIN")?;
        }

        let item_limits = ItemLimits::new(
            parse_optional(lookup, "ITEM_NAME_MAX_LENGTH")?
                .unwrap_or_else(|| ItemLimits::SCHEMA.name_max_length()),
            parse_optional(lookup, "ITEM_QUANTITY_MAX")?
                .unwrap_or_else(|| ItemLimits::SCHEMA.quantity_max()),
        )?;

        let shopify = ShopifyAppConfig::from_lookup(lookup)?;
        let log_json = get_optional_env(lookup, "LOG_FORMAT")
            .is_some_and(|format| format.eq_ignore_ascii_case("json"));

        let sentry_dsn = get_optional_env(lookup, "SENTRY_DSN");
        let sentry_environment = get_optional_env(lookup, "SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env(lookup, "SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env(lookup, "SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            cors_origin,
            item_limits,
            shopify,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyAppConfig {
    /// Returns `Ok(None)` when neither credential is set.
    fn from_lookup(lookup: Lookup<'_>) -> Result<Option<Self>, ConfigError> {
        let client_id = get_optional_env(lookup, "SHOPIFY_API_KEY");
        let has_secret = get_optional_env(lookup, "SHOPIFY_API_SECRET").is_some();

        let client_id = match (client_id, has_secret) {
            (None, false) => return Ok(None),
            (Some(client_id), true) => client_id,
            (None, true) => return Err(ConfigError::MissingEnvVar("SHOPIFY_API_KEY".to_string())),
            (Some(_), false) => {
                return Err(ConfigError::MissingEnvVar("SHOPIFY_API_SECRET".to_string()));
            }
        };

        let client_secret = get_validated_secret(lookup, "SHOPIFY_API_SECRET")?;
        let callback_url = get_env_or_default(lookup, "SHOPIFY_CALLBACK_URL", DEFAULT_CALLBACK_URL);
        validate_url(&callback_url, "SHOPIFY_CALLBACK_URL")?;

        let frontend_url = get_optional_env(lookup, "FRONTEND_URL");
        if let Some(url) = &frontend_url {
            validate_url(url, "FRONTEND_URL")?;
        }

        let api_origin = get_optional_env(lookup, "SHOPIFY_API_ORIGIN")
            .map(|origin| origin.trim_end_matches('/').to_string());
        if let Some(origin) = &api_origin {
            validate_url(origin, "SHOPIFY_API_ORIGIN")?;
        }

        let http_timeout = Duration::from_secs(
            parse_optional(lookup, "SHOPIFY_HTTP_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        );

        Ok(Some(Self {
            client_id,
            client_secret,
            scopes: get_env_or_default(lookup, "SHOPIFY_SCOPES", DEFAULT_SHOPIFY_SCOPES),
            callback_url,
            frontend_url,
            api_version: get_env_or_default(lookup, "SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            api_origin,
            http_timeout,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(lookup: Lookup<'_>, primary_key: &str) -> Result<SecretString, ConfigError> {
    lookup(primary_key)
        .or_else(|| lookup("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(lookup: Lookup<'_>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(lookup: Lookup<'_>, key: &str, default: &str) -> String {
    get_optional_env(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional environment variable.
fn parse_optional<T>(lookup: Lookup<'_>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(lookup, key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Require an absolute http(s) URL.
fn validate_url(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret.
fn get_validated_secret(lookup: Lookup<'_>, key: &str) -> Result<SecretString, ConfigError> {
    let value = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const STRONG_SECRET: &str = "9f86d081884c7d659a2feaa0c55ad015";

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(&|key| map.get(key).cloned())
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_rejects_placeholder() {
        let result = validate_secret_strength("changeme-now-please", "TEST");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_accepts_hex_secret() {
        assert!(validate_secret_strength(STRONG_SECRET, "TEST").is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/shopping_list")]).unwrap();

        assert_eq!(
            config.database_url.expose_secret(),
            "postgres://localhost/shopping_list"
        );
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.item_limits, ItemLimits::SCHEMA);
        assert!(config.shopify.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingEnvVar(ref key) if key == "SHOPPING_LIST_DATABASE_URL")
        );
    }

    #[test]
    fn test_port_falls_back_to_port_var() {
        let config = load(&[("DATABASE_URL", "postgres://db"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.port, 8080);

        let config = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("PORT", "8080"),
            ("SHOPPING_LIST_PORT", "9090"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("DATABASE_URL", "postgres://db"), ("PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_item_limits_can_only_tighten() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("ITEM_QUANTITY_MAX", "99"),
        ])
        .unwrap();
        assert_eq!(config.item_limits.quantity_max(), 99);

        let err = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("ITEM_QUANTITY_MAX", "5000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Limits(_)));
    }

    #[test]
    fn test_shopify_requires_both_credentials() {
        let err = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("SHOPIFY_API_KEY", "abc123"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "SHOPIFY_API_SECRET"));

        let err = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("SHOPIFY_API_SECRET", STRONG_SECRET),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "SHOPIFY_API_KEY"));
    }

    #[test]
    fn test_shopify_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("SHOPIFY_API_KEY", "abc123"),
            ("SHOPIFY_API_SECRET", STRONG_SECRET),
        ])
        .unwrap();

        let shopify = config.shopify.unwrap();
        assert_eq!(shopify.client_id, "abc123");
        assert_eq!(shopify.scopes, "read_products,read_orders");
        assert_eq!(shopify.callback_url, "http://localhost:3001/shopify/callback");
        assert_eq!(shopify.api_version, "2025-01");
        assert_eq!(shopify.http_timeout, Duration::from_secs(10));
        assert!(shopify.frontend_url.is_none());
        assert!(shopify.api_origin.is_none());
    }

    #[test]
    fn test_shopify_rejects_bad_urls() {
        let err = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("SHOPIFY_API_KEY", "abc123"),
            ("SHOPIFY_API_SECRET", STRONG_SECRET),
            ("FRONTEND_URL", "not a url"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "FRONTEND_URL"));
    }

    #[test]
    fn test_shopify_config_debug_redacts_secret() {
        let config = ShopifyAppConfig {
            client_id: "client_id_value".to_string(),
            client_secret: SecretString::from("super_secret_client_secret"),
            scopes: DEFAULT_SHOPIFY_SCOPES.to_string(),
            callback_url: DEFAULT_CALLBACK_URL.to_string(),
            frontend_url: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            api_origin: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("client_id_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_secret"));
    }
}
