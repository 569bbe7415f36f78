//! # Application State
//!
//! [`AppConfig`] is read from the environment once at startup.
//! [`AppState`] holds the services built from it: the proof service (if
//! its artifacts loaded), the verification cache, and the share codec.
//! There are no process-wide globals; everything a handler needs arrives
//! through `State<AppState>`.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sigil_receipt::VerificationCache;
use sigil_share::ShareCodec;
use sigil_zkp::ZkProofService;

use crate::error::AppError;

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `PORT`
    pub port: u16,
    /// `SIGIL_ARTIFACT_DIR`
    pub artifact_dir: PathBuf,
    /// `SIGIL_PROOF_TIMEOUT_SECS`
    pub proof_timeout: Duration,
    /// `SIGIL_CACHE_CAPACITY`
    pub cache_capacity: usize,
    /// `SIGIL_CACHE_TTL_SECS`
    pub cache_ttl: Duration,
    /// `SIGIL_VERIFIER`: name stamped into receipts.
    pub verifier: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            artifact_dir: PathBuf::from("./artifacts"),
            proof_timeout: Duration::from_secs(30),
            cache_capacity: 1024,
            cache_ttl: Duration::from_secs(600),
            verifier: "sigil-api".to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Unset variables take their
    /// default; unparsable ones take their default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            artifact_dir: lookup("SIGIL_ARTIFACT_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            proof_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SIGIL_PROOF_TIMEOUT_SECS",
                defaults.proof_timeout.as_secs(),
            )),
            cache_capacity: parse_or(&lookup, "SIGIL_CACHE_CAPACITY", defaults.cache_capacity),
            cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "SIGIL_CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs(),
            )),
            verifier: lookup("SIGIL_VERIFIER")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.verifier),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %raw, error = %e, "invalid configuration value; using default");
            default
        }),
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    zk: Result<ZkProofService, String>,
    pub cache: Arc<VerificationCache>,
    pub share: ShareCodec,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("zk_ready", &self.zk.is_ok())
            .field("cache", &self.cache)
            .finish()
    }
}

impl AppState {
    /// Build state from configuration, loading proof artifacts from
    /// `config.artifact_dir`.
    ///
    /// Missing or corrupt artifacts do not stop the service: proof and
    /// receipt endpoints answer 500 and readiness reports not ready.
    pub fn new(config: AppConfig) -> Self {
        let zk = ZkProofService::load(&config.artifact_dir, config.proof_timeout).map_err(|e| {
            tracing::error!(
                dir = %config.artifact_dir.display(),
                error = %e,
                "proof artifacts unavailable"
            );
            e.to_string()
        });
        Self::with_parts(config, zk)
    }

    /// Build state around an already constructed proof service.
    pub fn with_service(config: AppConfig, zk: ZkProofService) -> Self {
        Self::with_parts(config, Ok(zk))
    }

    fn with_parts(config: AppConfig, zk: Result<ZkProofService, String>) -> Self {
        let cache = VerificationCache::new(config.cache_capacity, config.cache_ttl);
        Self {
            config: Arc::new(config),
            zk,
            cache: Arc::new(cache),
            share: ShareCodec::default(),
        }
    }

    /// The proof service, or an internal error if artifacts failed to load.
    pub fn zk(&self) -> Result<&ZkProofService, AppError> {
        self.zk
            .as_ref()
            .map_err(|e| AppError::Internal(format!("proof artifacts unavailable: {e}")))
    }

    pub fn is_ready(&self) -> bool {
        self.zk.is_ok()
    }
}
