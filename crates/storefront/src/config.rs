//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARKETFRONT_BASE_URL` - Public URL for the storefront
//! - `BACKEND_API_URL` - Base URL of the backend REST API
//!
//! ## Optional
//! - `MARKETFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `MARKETFRONT_PORT` - Listen port (default: 3000)
//! - `BACKEND_API_KEY` - Server-to-server API key sent as `X-Api-Key`
//! - `BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `FILTER_CACHE_TTL_SECS` - Category/brand name cache lifetime (default: 300)
//! - `GEOLOCATION_API_URL` - IP geolocation service (default: <https://ipapi.co>)
//! - `GEOCODING_API_URL` - Reverse geocoding service (default: <https://nominatim.openstreetmap.org>)
//! - `CURRENCY_SYMBOL` - Symbol used when formatting prices (default: $)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Backend REST API configuration
    pub backend: BackendConfig,
    /// Third-party location services
    pub geo: GeoConfig,
    /// How long the category/brand name mappings stay fresh
    pub filter_cache_ttl: Duration,
    /// Currency symbol for price formatting
    pub currency_symbol: String,
    /// Error tracking configuration
    pub sentry: SentryConfig,
}

/// Backend REST API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL without a trailing slash (e.g., `https://api.example.com/v1`)
    pub base_url: String,
    /// Optional server-to-server API key
    pub api_key: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Third-party geolocation and reverse geocoding endpoints.
#[derive(Debug, Clone)]
pub struct GeoConfig {
    /// IP geolocation base URL
    pub geolocation_url: String,
    /// Reverse geocoding base URL
    pub geocoding_url: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            geolocation_url: "https://ipapi.co".to_string(),
            geocoding_url: "https://nominatim.openstreetmap.org".to_string(),
        }
    }
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when unset
    pub dsn: Option<String>,
    /// Environment tag (e.g., "production")
    pub environment: Option<String>,
    /// Error event sample rate
    pub sample_rate: f32,
    /// Performance trace sample rate
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the backend API key fails validation (placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("MARKETFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("MARKETFRONT_PORT", "3000")?;
        let base_url = get_required_url("MARKETFRONT_BASE_URL")?;
        let filter_cache_ttl =
            Duration::from_secs(parse_env_or_default::<u64>("FILTER_CACHE_TTL_SECS", "300")?);
        let currency_symbol = get_env_or_default("CURRENCY_SYMBOL", "$");

        let defaults = GeoConfig::default();
        let geo = GeoConfig {
            geolocation_url: get_url_or_default("GEOLOCATION_API_URL", &defaults.geolocation_url)?,
            geocoding_url: get_url_or_default("GEOCODING_API_URL", &defaults.geocoding_url)?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            backend: BackendConfig::from_env()?,
            geo,
            filter_cache_ttl,
            currency_symbol,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Loopback configuration against `backend_url`, defaults elsewhere.
    ///
    /// Used by tests and local tooling that cannot rely on the environment.
    #[must_use]
    pub fn local(base_url: impl Into<String>, backend_url: impl Into<String>) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: base_url.into(),
            backend: BackendConfig {
                base_url: backend_url.into(),
                api_key: None,
                timeout: Duration::from_secs(15),
            },
            geo: GeoConfig::default(),
            filter_cache_ttl: Duration::from_secs(300),
            currency_symbol: "$".to_string(),
            sentry: SentryConfig::default(),
        }
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = match get_optional_env("BACKEND_API_KEY") {
            Some(value) => {
                validate_secret_strength(&value, "BACKEND_API_KEY")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            base_url: get_required_url("BACKEND_API_URL")?,
            api_key,
            timeout: Duration::from_secs(parse_env_or_default::<u64>(
                "BACKEND_TIMEOUT_SECS",
                "15",
            )?),
        })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env_or_default::<f32>("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
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

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a required absolute http(s) URL, normalized without a trailing slash.
fn get_required_url(key: &str) -> Result<String, ConfigError> {
    normalize_url(key, &get_required_env(key)?)
}

/// Get an http(s) URL with a default, normalized without a trailing slash.
fn get_url_or_default(key: &str, default: &str) -> Result<String, ConfigError> {
    normalize_url(key, &get_env_or_default(key, default))
}

/// Validate that `value` is an absolute http(s) URL and strip trailing slashes.
fn normalize_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
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

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated key."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig {
                base_url: "http://localhost:8080/api".to_string(),
                api_key: Some(SecretString::from("k3Y$9xQ!mZ2@pL7#")),
                timeout: Duration::from_secs(15),
            },
            geo: GeoConfig::default(),
            filter_cache_ttl: Duration::from_secs(300),
            currency_symbol: "$".to_string(),
            sentry: SentryConfig::default(),
        }
    }

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("your-api-key-here", "BACKEND_API_KEY"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "BACKEND_API_KEY").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "BACKEND_API_KEY").is_ok());
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("BACKEND_API_URL", "https://api.example.com/v1/").unwrap(),
            "https://api.example.com/v1"
        );
        assert_eq!(
            normalize_url("BACKEND_API_URL", " http://localhost:8080 ").unwrap(),
            "http://localhost:8080"
        );
        assert!(normalize_url("BACKEND_API_URL", "ftp://files.example.com").is_err());
        assert!(normalize_url("BACKEND_API_URL", "not a url").is_err());
    }

    #[test]
    fn test_socket_addr_and_security() {
        let mut config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());

        config.base_url = "https://shop.example.com".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_backend_config_debug_redacts_key() {
        let config = test_config();
        let debug_output = format!("{:?}", config.backend);

        assert!(debug_output.contains("http://localhost:8080/api"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k3Y$9xQ"));
    }
}
