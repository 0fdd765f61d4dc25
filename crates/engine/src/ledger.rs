//! Running spend totals.
//!
//! Amounts are stored as integer micro-USD in atomics so concurrent jobs
//! can record spend without a lock and float accumulation error never
//! creeps into the totals. The ledger only ever grows.

use std::sync::atomic::{AtomicU64, Ordering};

use cardforge_core::ProviderKind;

const MICROS_PER_USD: f64 = 1_000_000.0;

/// Monotonic per-provider and total spend counters.
#[derive(Debug)]
pub struct CostLedger {
    per_provider: [AtomicU64; ProviderKind::COUNT],
    total: AtomicU64,
}

impl CostLedger {
    pub fn new() -> Self {
        Self {
            per_provider: [AtomicU64::new(0), AtomicU64::new(0)],
            total: AtomicU64::new(0),
        }
    }

    /// Record confirmed spend for one image, in USD.
    ///
    /// Negative or non-finite amounts are ignored; the ledger never
    /// decrements.
    pub fn record(&self, provider: ProviderKind, usd: f64) {
        if !usd.is_finite() || usd <= 0.0 {
            return;
        }
        let micros = (usd * MICROS_PER_USD).round() as u64;
        self.per_provider[provider.index()].fetch_add(micros, Ordering::Relaxed);
        self.total.fetch_add(micros, Ordering::Relaxed);
    }

    /// Cumulative spend for one provider, in USD.
    pub fn provider_total_usd(&self, provider: ProviderKind) -> f64 {
        self.per_provider[provider.index()].load(Ordering::Relaxed) as f64 / MICROS_PER_USD
    }

    /// Cumulative spend across all providers, in USD.
    pub fn grand_total_usd(&self) -> f64 {
        self.total.load(Ordering::Relaxed) as f64 / MICROS_PER_USD
    }
}

impl Default for CostLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_accumulate_per_provider() {
        let ledger = CostLedger::new();
        ledger.record(ProviderKind::OpenAi, 0.19);
        ledger.record(ProviderKind::OpenAi, 0.02);
        ledger.record(ProviderKind::Gemini, 0.005);

        assert!((ledger.provider_total_usd(ProviderKind::OpenAi) - 0.21).abs() < 1e-9);
        assert!((ledger.provider_total_usd(ProviderKind::Gemini) - 0.005).abs() < 1e-9);
        assert!((ledger.grand_total_usd() - 0.215).abs() < 1e-9);
    }

    #[test]
    fn micro_usd_storage_avoids_float_drift() {
        let ledger = CostLedger::new();
        for _ in 0..1000 {
            ledger.record(ProviderKind::Gemini, 0.005);
        }
        assert_eq!(ledger.grand_total_usd(), 5.0);
    }

    #[test]
    fn negative_and_non_finite_amounts_are_ignored() {
        let ledger = CostLedger::new();
        ledger.record(ProviderKind::OpenAi, -1.0);
        ledger.record(ProviderKind::OpenAi, f64::NAN);
        ledger.record(ProviderKind::OpenAi, f64::INFINITY);
        assert_eq!(ledger.grand_total_usd(), 0.0);
    }

    #[test]
    fn zero_cost_records_nothing() {
        let ledger = CostLedger::new();
        ledger.record(ProviderKind::Gemini, 0.0);
        assert_eq!(ledger.provider_total_usd(ProviderKind::Gemini), 0.0);
    }
}
