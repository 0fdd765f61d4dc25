//! Cost/health metrics and alerting.
//!
//! Tracks per-provider call counters, failure counts by kind, latency
//! percentiles, and cache hit rates. Health is judged over a rolling
//! window of recent call outcomes; the verdict is written back to the
//! shared [`AvailabilityMap`] so the selector routes around unhealthy
//! providers. Alerts are edge-triggered on the healthy→unhealthy
//! transition and rate-limited per provider.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::time::Instant;

use cardforge_core::{FailureKind, ProviderKind};
use cardforge_events::{EventBus, GenerationEvent};

use crate::availability::AvailabilityMap;
use crate::config::EngineConfig;

/// Outcomes required in the window before a health verdict is trusted.
pub const MIN_WINDOW_SAMPLES: usize = 5;

/// Latency samples retained per provider, oldest dropped first.
const LATENCY_SAMPLE_CAP: usize = 512;

// ---------------------------------------------------------------------------
// Per-provider state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ProviderStats {
    calls: u64,
    successes: u64,
    failures_by_kind: HashMap<FailureKind, u64>,
    latencies_ms: VecDeque<u64>,
    /// Rolling window of recent outcomes, `true` = success.
    window: VecDeque<bool>,
    healthy: bool,
    last_alert_at: Option<Instant>,
}

impl ProviderStats {
    fn new() -> Self {
        Self {
            calls: 0,
            successes: 0,
            failures_by_kind: HashMap::new(),
            latencies_ms: VecDeque::new(),
            window: VecDeque::new(),
            healthy: true,
            last_alert_at: None,
        }
    }

    fn record(&mut self, success: bool, latency: Duration, window_size: usize) {
        self.calls += 1;
        if success {
            self.successes += 1;
        }
        self.latencies_ms.push_back(latency.as_millis() as u64);
        if self.latencies_ms.len() > LATENCY_SAMPLE_CAP {
            self.latencies_ms.pop_front();
        }
        self.window.push_back(success);
        while self.window.len() > window_size {
            self.window.pop_front();
        }
    }

    fn window_failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|&&ok| !ok).count();
        failures as f64 / self.window.len() as f64
    }

    /// Unhealthy only once the window holds enough samples to mean
    /// anything; a provider never goes unhealthy off its first failure.
    fn is_unhealthy(&self, threshold: f64) -> bool {
        self.window.len() >= MIN_WINDOW_SAMPLES && self.window_failure_rate() > threshold
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Latency percentiles in milliseconds, nearest-rank over retained samples.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LatencySummary {
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
}

/// Point-in-time view of one provider's counters.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderMetrics {
    pub provider: ProviderKind,
    pub calls: u64,
    pub successes: u64,
    pub failures_by_kind: HashMap<&'static str, u64>,
    pub window_failure_rate: f64,
    pub healthy: bool,
    pub latency: LatencySummary,
    pub total_cost_usd: f64,
}

/// Point-in-time view of all engine metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub providers: Vec<ProviderMetrics>,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

fn percentile(sorted_ms: &[u64], q: f64) -> u64 {
    if sorted_ms.is_empty() {
        return 0;
    }
    let rank = (q * sorted_ms.len() as f64).ceil() as usize;
    sorted_ms[rank.clamp(1, sorted_ms.len()) - 1]
}

// ---------------------------------------------------------------------------
// MetricsMonitor
// ---------------------------------------------------------------------------

/// Shared metrics sink for the engine. Cheap to call from any task.
pub struct MetricsMonitor {
    stats: Mutex<[ProviderStats; ProviderKind::COUNT]>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cost_usd: [AtomicU64; ProviderKind::COUNT],
    availability: Arc<AvailabilityMap>,
    bus: Arc<EventBus>,
    window_size: usize,
    failure_threshold: f64,
    alert_cooldown: Duration,
}

impl MetricsMonitor {
    pub fn new(config: &EngineConfig, availability: Arc<AvailabilityMap>, bus: Arc<EventBus>) -> Self {
        Self {
            stats: Mutex::new([ProviderStats::new(), ProviderStats::new()]),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            cost_usd: [AtomicU64::new(0), AtomicU64::new(0)],
            availability,
            bus,
            window_size: config.health_window,
            failure_threshold: config.failure_threshold,
            alert_cooldown: config.alert_cooldown(),
        }
    }

    pub fn record_success(&self, provider: ProviderKind, latency: Duration, cost_usd: f64) {
        if cost_usd.is_finite() && cost_usd > 0.0 {
            let micros = (cost_usd * 1_000_000.0).round() as u64;
            self.cost_usd[provider.index()].fetch_add(micros, Ordering::Relaxed);
        }
        self.record_outcome(provider, true, None, latency);
    }

    pub fn record_failure(&self, provider: ProviderKind, kind: FailureKind, latency: Duration) {
        self.record_outcome(provider, false, Some(kind), latency);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_outcome(
        &self,
        provider: ProviderKind,
        success: bool,
        kind: Option<FailureKind>,
        latency: Duration,
    ) {
        let mut guard = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        let stats = &mut guard[provider.index()];
        stats.record(success, latency, self.window_size);
        if let Some(kind) = kind {
            *stats.failures_by_kind.entry(kind).or_insert(0) += 1;
        }

        let unhealthy_now = stats.is_unhealthy(self.failure_threshold);
        let rate = stats.window_failure_rate();

        if unhealthy_now && stats.healthy {
            stats.healthy = false;
            self.availability.set_healthy(provider, false);
            tracing::warn!(
                provider = %provider,
                failure_rate = rate,
                window = stats.window.len(),
                "provider crossed failure threshold, marking unhealthy",
            );
            self.bus.publish(GenerationEvent::ProviderHealthChanged {
                provider,
                healthy: false,
                failure_rate: rate,
                timestamp: Utc::now(),
            });

            let cooled_down = stats
                .last_alert_at
                .map(|at| at.elapsed() >= self.alert_cooldown)
                .unwrap_or(true);
            if cooled_down {
                stats.last_alert_at = Some(Instant::now());
                self.bus.publish(GenerationEvent::AlertRaised {
                    provider,
                    message: format!(
                        "{provider} failure rate {rate:.2} over last {} calls",
                        stats.window.len()
                    ),
                    timestamp: Utc::now(),
                });
            } else {
                tracing::debug!(provider = %provider, "alert suppressed by cooldown");
            }
        } else if !unhealthy_now && !stats.healthy {
            stats.healthy = true;
            self.availability.set_healthy(provider, true);
            tracing::info!(provider = %provider, failure_rate = rate, "provider recovered");
            self.bus.publish(GenerationEvent::ProviderHealthChanged {
                provider,
                healthy: true,
                failure_rate: rate,
                timestamp: Utc::now(),
            });
        }
    }

    /// Point-in-time snapshot of every counter, for reporting.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let guard = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        let providers = ProviderKind::all()
            .iter()
            .map(|&provider| {
                let stats = &guard[provider.index()];
                let mut sorted: Vec<u64> = stats.latencies_ms.iter().copied().collect();
                sorted.sort_unstable();
                ProviderMetrics {
                    provider,
                    calls: stats.calls,
                    successes: stats.successes,
                    failures_by_kind: stats
                        .failures_by_kind
                        .iter()
                        .map(|(kind, count)| (kind.as_str(), *count))
                        .collect(),
                    window_failure_rate: stats.window_failure_rate(),
                    healthy: stats.healthy,
                    latency: LatencySummary {
                        p50: percentile(&sorted, 0.50),
                        p90: percentile(&sorted, 0.90),
                        p95: percentile(&sorted, 0.95),
                        p99: percentile(&sorted, 0.99),
                    },
                    total_cost_usd: self.cost_usd[provider.index()].load(Ordering::Relaxed)
                        as f64
                        / 1_000_000.0,
                }
            })
            .collect();

        MetricsSnapshot {
            providers,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
