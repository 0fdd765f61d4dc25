//! Batch scheduling primitives.
//!
//! Dispatch ordering, per-provider throttling gates, and the job wrapper
//! used by [`GenerationEngine::submit_batch`]. The engine façade owns the
//! pipeline itself; this module owns how jobs are admitted into it.
//!
//! [`GenerationEngine::submit_batch`]: crate::engine::GenerationEngine::submit_batch

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep, Duration, Instant};

use cardforge_core::types::{JobId, Timestamp};
use cardforge_core::GenerationRequest;

// ---------------------------------------------------------------------------
// Batch jobs
// ---------------------------------------------------------------------------

/// Caller-facing unit of a batch: a request plus its priority.
/// Lower priority values dispatch sooner.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub request: GenerationRequest,
    pub priority: i32,
}

impl BatchRequest {
    pub fn new(request: GenerationRequest, priority: i32) -> Self {
        Self { request, priority }
    }
}

/// Internal scheduling record for one batch job. Resolved exactly once.
#[derive(Debug, Clone)]
pub(crate) struct BatchJob {
    pub job_id: JobId,
    pub request: GenerationRequest,
    pub priority: i32,
    /// Monotonic submission index; stable tie-break within a priority.
    pub sequence: u64,
    #[allow(dead_code)]
    pub submitted_at: Timestamp,
}

/// Dispatch order: ascending (priority, sequence).
///
/// Returns indices into `jobs`. Only initial dispatch is ordered;
/// completion order is up to the providers.
pub(crate) fn dispatch_order(jobs: &[BatchJob]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..jobs.len()).collect();
    order.sort_by_key(|&i| (jobs[i].priority, jobs[i].sequence));
    order
}

/// Progress callback invoked after every job resolution with
/// (resolved_so_far, total).
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

// ---------------------------------------------------------------------------
// Provider gates
// ---------------------------------------------------------------------------

/// Throttle for one provider: an in-flight cap plus minimum spacing
/// between consecutive call starts.
///
/// Saturation blocks the dispatching worker, never the provider. The
/// spacing lock is held across the pacing sleep so call starts are
/// serialized per provider.
pub struct ProviderGate {
    permits: Arc<Semaphore>,
    last_dispatch: Mutex<Option<Instant>>,
    min_spacing: Duration,
}

impl ProviderGate {
    pub fn new(max_concurrent: usize, min_spacing: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            last_dispatch: Mutex::new(None),
            min_spacing,
        }
    }

    /// Wait for an in-flight slot and the pacing interval. The returned
    /// permit must be held for the duration of the provider call.
    pub async fn admit(&self) -> OwnedSemaphorePermit {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("gate semaphore is never closed");

        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let since = previous.elapsed();
            if since < self.min_spacing {
                sleep(self.min_spacing - since).await;
            }
        }
        *last = Some(Instant::now());
        permit
    }

    #[cfg(test)]
    pub(crate) fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
