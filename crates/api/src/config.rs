use std::fmt::Display;
use std::str::FromStr;

use stockroom_core::identifier::{IdentifierPattern, DEFAULT_MAX_ATTEMPTS, DEFAULT_SKU_PATTERN};
use stockroom_core::import::{DuplicatePolicy, ImportOptions, DEFAULT_MAX_BYTES, DEFAULT_MAX_ROWS};

use crate::auth::jwt::JwtConfig;

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub engine: EngineConfig,
}

impl ServerConfig {
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `300`                   |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    ///
    /// `CORS_ORIGINS` is comma-separated. The request timeout also bounds a
    /// whole import, so it defaults high.
    ///
    /// # Panics
    ///
    /// Panics on a value that does not parse.
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 300),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            engine: EngineConfig::from_env(),
        }
    }
}

/// Parse `key` when set, otherwise return `default`.
///
/// Panics naming the variable when the value does not parse.
pub(crate) fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

/// Settings consumed by the import pipeline and identifier generator.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SKU pattern; runs of `0` are filled with random digits.
    pub sku_pattern: String,
    /// Prepended to every generated SKU.
    pub sku_prefix: String,
    /// Uniqueness retries before the fallback suffix is used.
    pub sku_max_attempts: u32,
    /// Data rows accepted per import file.
    pub import_max_rows: usize,
    /// Upload size accepted per import file, in bytes.
    pub import_max_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sku_pattern: DEFAULT_SKU_PATTERN.to_string(),
            sku_prefix: String::new(),
            sku_max_attempts: DEFAULT_MAX_ATTEMPTS,
            import_max_rows: DEFAULT_MAX_ROWS,
            import_max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl EngineConfig {
    /// Load engine settings from environment variables.
    ///
    /// | Env Var            | Default          |
    /// |--------------------|------------------|
    /// | `SKU_PATTERN`      | `PROD000000`     |
    /// | `SKU_PREFIX`       | (empty)          |
    /// | `SKU_MAX_ATTEMPTS` | `1000`           |
    /// | `IMPORT_MAX_ROWS`  | `10000`          |
    /// | `IMPORT_MAX_BYTES` | `10485760`       |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let sku_pattern = std::env::var("SKU_PATTERN")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.sku_pattern);

        Self {
            sku_pattern,
            sku_prefix: std::env::var("SKU_PREFIX").unwrap_or(defaults.sku_prefix),
            sku_max_attempts: env_or("SKU_MAX_ATTEMPTS", defaults.sku_max_attempts),
            import_max_rows: env_or("IMPORT_MAX_ROWS", defaults.import_max_rows),
            import_max_bytes: env_or("IMPORT_MAX_BYTES", defaults.import_max_bytes),
        }
    }

    /// Build per-call import options for `policy`.
    pub fn import_options(&self, policy: DuplicatePolicy) -> ImportOptions {
        ImportOptions {
            duplicate_policy: policy,
            max_rows: self.import_max_rows,
            sku_pattern: IdentifierPattern::new(&self.sku_pattern, &self.sku_prefix),
            max_identifier_attempts: self.sku_max_attempts,
        }
    }
}
