//! Lock-free per-provider availability state.
//!
//! The selector reads this on every job without taking a lock; the
//! metrics monitor and the engine are the only writers. The provider set
//! is closed, so state lives in a fixed array indexed by
//! [`ProviderKind::index`].

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use cardforge_core::ProviderKind;

#[derive(Debug)]
struct ProviderSlot {
    /// Credentials present and not rejected. Cleared permanently on auth
    /// failure.
    configured: AtomicBool,
    /// Health verdict from the rolling failure window.
    healthy: AtomicBool,
    /// Epoch milliseconds of the most recent failure; 0 = never failed.
    last_failure_at: AtomicI64,
}

impl ProviderSlot {
    fn new() -> Self {
        Self {
            configured: AtomicBool::new(false),
            healthy: AtomicBool::new(true),
            last_failure_at: AtomicI64::new(0),
        }
    }
}

/// Availability flags for every known provider.
#[derive(Debug)]
pub struct AvailabilityMap {
    slots: [ProviderSlot; ProviderKind::COUNT],
}

impl AvailabilityMap {
    /// All providers start unconfigured and healthy; adapters flip the
    /// configured bit once credentials check out.
    pub fn new() -> Self {
        Self {
            slots: [ProviderSlot::new(), ProviderSlot::new()],
        }
    }

    fn slot(&self, provider: ProviderKind) -> &ProviderSlot {
        &self.slots[provider.index()]
    }

    pub fn set_configured(&self, provider: ProviderKind, configured: bool) {
        self.slot(provider).configured.store(configured, Ordering::Release);
    }

    pub fn is_configured(&self, provider: ProviderKind) -> bool {
        self.slot(provider).configured.load(Ordering::Acquire)
    }

    pub fn set_healthy(&self, provider: ProviderKind, healthy: bool) {
        self.slot(provider).healthy.store(healthy, Ordering::Release);
    }

    pub fn is_healthy(&self, provider: ProviderKind) -> bool {
        self.slot(provider).healthy.load(Ordering::Acquire)
    }

    /// Record the wall-clock time of a failure, in epoch milliseconds.
    pub fn mark_failure(&self, provider: ProviderKind, at_epoch_ms: i64) {
        self.slot(provider)
            .last_failure_at
            .store(at_epoch_ms, Ordering::Release);
    }

    pub fn last_failure_at(&self, provider: ProviderKind) -> Option<i64> {
        match self.slot(provider).last_failure_at.load(Ordering::Acquire) {
            0 => None,
            ms => Some(ms),
        }
    }

    /// Whether the selector may route a job to this provider.
    pub fn is_selectable(&self, provider: ProviderKind) -> bool {
        self.is_configured(provider) && self.is_healthy(provider)
    }
}

impl Default for AvailabilityMap {
    fn default() -> Self {
        Self::new()
    }
}
