//! Engine configuration loaded from the environment.
//!
//! Every knob has a production default; `from_env()` only overrides what
//! is explicitly set. Configuration is immutable for the process lifetime.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Tunables for the orchestration engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Size of the batch worker pool.
    pub max_workers: usize,
    /// In-flight call cap per provider.
    pub max_concurrent_per_provider: usize,
    /// Minimum spacing between consecutive call starts to one provider.
    pub min_spacing_ms: u64,
    /// Hard deadline for a single provider call.
    pub call_timeout_secs: u64,
    /// How long a cached result stays servable.
    pub cache_ttl_secs: u64,
    /// Cache size watermark that triggers an expiry sweep on insert.
    pub cache_max_entries: usize,
    /// Rolling window length for per-provider health.
    pub health_window: usize,
    /// Failure rate above which a provider is marked unhealthy.
    pub failure_threshold: f64,
    /// Minimum quiet period between alerts for one provider.
    pub alert_cooldown_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            max_concurrent_per_provider: 2,
            min_spacing_ms: 250,
            call_timeout_secs: 120,
            cache_ttl_secs: 3600,
            cache_max_entries: 256,
            health_window: 20,
            failure_threshold: 0.5,
            alert_cooldown_secs: 300,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset or unparseable. Loads `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            max_workers: env_parse("CARDFORGE_MAX_WORKERS", defaults.max_workers),
            max_concurrent_per_provider: env_parse(
                "CARDFORGE_MAX_CONCURRENT_PER_PROVIDER",
                defaults.max_concurrent_per_provider,
            ),
            min_spacing_ms: env_parse("CARDFORGE_MIN_SPACING_MS", defaults.min_spacing_ms),
            call_timeout_secs: env_parse("CARDFORGE_CALL_TIMEOUT_SECS", defaults.call_timeout_secs),
            cache_ttl_secs: env_parse("CARDFORGE_CACHE_TTL_SECS", defaults.cache_ttl_secs),
            cache_max_entries: env_parse("CARDFORGE_CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            health_window: env_parse("CARDFORGE_HEALTH_WINDOW", defaults.health_window),
            failure_threshold: env_parse("CARDFORGE_FAILURE_THRESHOLD", defaults.failure_threshold),
            alert_cooldown_secs: env_parse(
                "CARDFORGE_ALERT_COOLDOWN_SECS",
                defaults.alert_cooldown_secs,
            ),
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn min_spacing(&self) -> Duration {
        Duration::from_millis(self.min_spacing_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_secs)
    }
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, raw = %raw, "unparseable config value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
