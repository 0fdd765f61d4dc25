//! The generation orchestration engine.
//!
//! Ties together the dedup cache, provider selection, throttled batch
//! scheduling, artifact validation, and cost/health tracking behind a
//! single [`GenerationEngine`] façade. Domain types live in
//! `cardforge-core`; provider transport lives in `cardforge-providers`.

pub mod availability;
pub mod cache;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod metrics;
pub mod scheduler;
pub mod selector;

pub use availability::AvailabilityMap;
pub use cache::GenerationCache;
pub use config::EngineConfig;
pub use engine::GenerationEngine;
pub use ledger::CostLedger;
pub use metrics::{MetricsMonitor, MetricsSnapshot, ProviderMetrics};
pub use scheduler::{BatchRequest, ProgressFn};
pub use selector::select_provider;
