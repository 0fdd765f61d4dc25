//! The orchestration façade.
//!
//! [`GenerationEngine`] owns the full job pipeline: content-key cache
//! lookup, provider selection, paced and deadline-bounded adapter calls,
//! print validation, cost accounting, and event emission. Single jobs go
//! through [`submit`]; batches go through [`submit_batch`] with a bounded
//! worker pool and per-provider throttling.
//!
//! [`submit`]: GenerationEngine::submit
//! [`submit_batch`]: GenerationEngine::submit_batch

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use cardforge_core::prompt::prompt_for;
use cardforge_core::types::JobId;
use cardforge_core::validation::PrintRules;
use cardforge_core::{
    validate_artifact, BrandProfile, CostTable, FailureKind, GenerationRequest, GenerationResult,
    ProviderKind,
};
use cardforge_events::{EventBus, GenerationEvent};
use cardforge_providers::{AdapterOutcome, ProviderAdapter};

use crate::availability::AvailabilityMap;
use crate::cache::GenerationCache;
use crate::config::EngineConfig;
use crate::ledger::CostLedger;
use crate::metrics::{MetricsMonitor, MetricsSnapshot};
use crate::scheduler::{dispatch_order, BatchJob, BatchRequest, ProgressFn, ProviderGate};
use crate::selector::select_provider;

/// The generation orchestration engine.
///
/// Cheap to share as `Arc<GenerationEngine>`; all internal state is
/// already synchronized.
pub struct GenerationEngine {
    config: EngineConfig,
    cost_table: CostTable,
    brand: BrandProfile,
    print_rules: PrintRules,
    adapters: [Option<Arc<dyn ProviderAdapter>>; ProviderKind::COUNT],
    availability: Arc<AvailabilityMap>,
    cache: GenerationCache,
    metrics: Arc<MetricsMonitor>,
    ledger: CostLedger,
    bus: Arc<EventBus>,
    gates: [ProviderGate; ProviderKind::COUNT],
    workers: Arc<Semaphore>,
}

impl GenerationEngine {
    /// Assemble an engine from its adapters.
    ///
    /// Each adapter's credential check seeds the availability map; an
    /// engine with zero configured adapters is valid and resolves every
    /// job as `Unavailable`.
    pub fn new(
        config: EngineConfig,
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        bus: Arc<EventBus>,
    ) -> Self {
        let availability = Arc::new(AvailabilityMap::new());
        let mut slots: [Option<Arc<dyn ProviderAdapter>>; ProviderKind::COUNT] = [None, None];
        for adapter in adapters {
            let kind = adapter.kind();
            let configured = adapter.is_configured();
            availability.set_configured(kind, configured);
            tracing::info!(provider = %kind, configured, "registered provider adapter");
            slots[kind.index()] = Some(adapter);
        }

        let metrics = Arc::new(MetricsMonitor::new(&config, availability.clone(), bus.clone()));
        let gates = [
            ProviderGate::new(config.max_concurrent_per_provider, config.min_spacing()),
            ProviderGate::new(config.max_concurrent_per_provider, config.min_spacing()),
        ];
        let cache = GenerationCache::new(config.cache_ttl(), config.cache_max_entries);
        let workers = Arc::new(Semaphore::new(config.max_workers.max(1)));

        Self {
            config,
            cost_table: CostTable::default(),
            brand: BrandProfile::default(),
            print_rules: PrintRules::default(),
            adapters: slots,
            availability,
            cache,
            metrics,
            ledger: CostLedger::new(),
            bus,
            gates,
            workers,
        }
    }

    pub fn with_cost_table(mut self, table: CostTable) -> Self {
        self.cost_table = table;
        self
    }

    pub fn with_brand_profile(mut self, brand: BrandProfile) -> Self {
        self.brand = brand;
        self
    }

    pub fn with_print_rules(mut self, rules: PrintRules) -> Self {
        self.print_rules = rules;
        self
    }

    pub fn availability(&self) -> &AvailabilityMap {
        &self.availability
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn total_spend_usd(&self) -> f64 {
        self.ledger.grand_total_usd()
    }

    pub fn provider_spend_usd(&self, provider: ProviderKind) -> f64 {
        self.ledger.provider_total_usd(provider)
    }

    // -----------------------------------------------------------------------
    // Single-job pipeline
    // -----------------------------------------------------------------------

    /// Resolve one generation request end to end.
    pub async fn submit(&self, request: GenerationRequest) -> GenerationResult {
        self.run_job(JobId::new_v4(), request).await
    }

    async fn run_job(&self, job_id: JobId, request: GenerationRequest) -> GenerationResult {
        let content_key = request.content_key();
        let started = Instant::now();
        self.bus.publish(GenerationEvent::JobSubmitted {
            job_id,
            content_key: content_key.clone(),
            quality_tier: request.quality_tier,
            timestamp: Utc::now(),
        });

        if let Some(hit) = self.cache.get(&content_key).await {
            self.metrics.record_cache_hit();
            tracing::debug!(%job_id, content_key = %content_key, "cache hit");
            let mut result = hit.with_duration(started.elapsed());
            // A hit spends nothing; keep the per-result view consistent
            // with the ledger and the completion event.
            result.cost_estimate = 0.0;
            self.bus.publish(GenerationEvent::JobCompleted {
                job_id,
                provider: result.provider_used,
                cost_estimate: 0.0,
                duration_ms: result.processing_duration.as_millis() as u64,
                cache_hit: true,
                timestamp: Utc::now(),
            });
            return result;
        }
        self.metrics.record_cache_miss();

        let prompt = prompt_for(&request, &self.brand);
        let result = self
            .generate_uncached(job_id, &request, &prompt)
            .await
            .with_duration(started.elapsed());

        if result.success {
            self.cache.put(&content_key, result.clone()).await;
            self.bus.publish(GenerationEvent::JobCompleted {
                job_id,
                provider: result.provider_used,
                cost_estimate: result.cost_estimate,
                duration_ms: result.processing_duration.as_millis() as u64,
                cache_hit: false,
                timestamp: Utc::now(),
            });
        } else {
            self.bus.publish(GenerationEvent::JobFailed {
                job_id,
                provider: result.provider_used,
                kind: result.error.unwrap_or(FailureKind::Unknown),
                duration_ms: result.processing_duration.as_millis() as u64,
                timestamp: Utc::now(),
            });
        }
        result
    }

    /// Select a provider, call it, and validate the artifact. At most one
    /// automatic retry, against a fallback provider, for transient
    /// failures.
    async fn generate_uncached(
        &self,
        job_id: JobId,
        request: &GenerationRequest,
        prompt: &str,
    ) -> GenerationResult {
        let mut excluded: Option<ProviderKind> = None;

        for attempt in 0..2 {
            let Some(provider) = select_provider(
                request.quality_tier,
                request.explicit_provider,
                &self.availability,
                excluded,
            ) else {
                return GenerationResult::failed(
                    FailureKind::Unavailable,
                    "no configured healthy provider for this request",
                );
            };
            let Some(adapter) = self.adapters[provider.index()].as_ref() else {
                return GenerationResult::failed(
                    FailureKind::Unavailable,
                    format!("no adapter registered for {provider}"),
                );
            };

            let permit = self.gates[provider.index()].admit().await;
            tracing::debug!(%job_id, provider = %provider, attempt, "dispatching provider call");
            let call_started = Instant::now();
            let outcome =
                match tokio::time::timeout(self.config.call_timeout(), adapter.invoke(request, prompt))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => AdapterOutcome::failure(
                        FailureKind::Timeout,
                        format!("call exceeded {}s deadline", self.config.call_timeout_secs),
                    ),
                };
            let latency = call_started.elapsed();
            // Release the in-flight slot before any retry dispatch.
            drop(permit);

            match outcome {
                AdapterOutcome::Image(bytes) => {
                    match validate_artifact(&bytes, &self.print_rules) {
                        Ok(artifact) => {
                            let cost = self.cost_table.unit_cost(provider, request.quality_tier);
                            self.metrics.record_success(provider, latency, cost);
                            self.ledger.record(provider, cost);
                            tracing::info!(
                                %job_id,
                                provider = %provider,
                                cost,
                                width = artifact.width,
                                height = artifact.height,
                                cropped = artifact.cropped,
                                "generation succeeded",
                            );
                            return GenerationResult::ok(artifact.bytes, provider, cost);
                        }
                        Err(violation) => {
                            self.metrics.record_failure(
                                provider,
                                FailureKind::ValidationFailed,
                                latency,
                            );
                            tracing::warn!(
                                %job_id,
                                provider = %provider,
                                rule = violation.rule(),
                                "artifact failed print validation",
                            );
                            return GenerationResult::failed(
                                FailureKind::ValidationFailed,
                                violation.to_string(),
                            )
                            .with_provider(provider);
                        }
                    }
                }
                AdapterOutcome::Failure { kind, detail } => {
                    self.metrics.record_failure(provider, kind, latency);
                    self.availability
                        .mark_failure(provider, Utc::now().timestamp_millis());
                    if kind == FailureKind::AuthError {
                        // Credentials will not fix themselves mid-run.
                        self.availability.set_configured(provider, false);
                        tracing::error!(
                            %job_id,
                            provider = %provider,
                            "credentials rejected, provider disabled for this process",
                        );
                    }
                    if kind.is_retryable() && attempt == 0 {
                        tracing::warn!(
                            %job_id,
                            provider = %provider,
                            kind = %kind,
                            "transient failure, retrying on fallback provider",
                        );
                        excluded = Some(provider);
                        continue;
                    }
                    return GenerationResult::failed(kind, detail).with_provider(provider);
                }
            }
        }

        GenerationResult::failed(FailureKind::Unavailable, "retry budget exhausted")
    }

    // -----------------------------------------------------------------------
    // Batch pipeline
    // -----------------------------------------------------------------------

    /// Resolve a batch of requests concurrently.
    ///
    /// Jobs dispatch in ascending (priority, submission order) through a
    /// worker pool of `max_workers`. Cancelling the token stops new
    /// dispatches; in-flight calls run to completion. Every submitted
    /// request yields exactly one result, in submission order; partial
    /// failure is normal.
    pub async fn submit_batch(
        self: &Arc<Self>,
        requests: Vec<BatchRequest>,
        cancel: CancellationToken,
        progress: Option<ProgressFn>,
    ) -> Vec<GenerationResult> {
        let total = requests.len();
        let submitted_at = Utc::now();
        let jobs: Vec<BatchJob> = requests
            .into_iter()
            .enumerate()
            .map(|(i, br)| BatchJob {
                job_id: JobId::new_v4(),
                request: br.request,
                priority: br.priority,
                sequence: i as u64,
                submitted_at,
            })
            .collect();

        tracing::info!(total_jobs = total, "batch started");
        self.bus.publish(GenerationEvent::BatchStarted {
            total_jobs: total,
            timestamp: Utc::now(),
        });
        let spend_before = self.ledger.grand_total_usd();

        let mut results: Vec<Option<GenerationResult>> = vec![None; total];
        let mut resolved = 0usize;
        let report = |resolved: usize| {
            if let Some(cb) = &progress {
                cb(resolved, total);
            }
        };

        let mut tasks: JoinSet<(usize, GenerationResult)> = JoinSet::new();
        for idx in dispatch_order(&jobs) {
            let job = jobs[idx].clone();

            // A cancelled batch stops dispatching; the undispatched jobs
            // still resolve, as failures, so the result vector stays full.
            let permit = if cancel.is_cancelled() {
                None
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = self.workers.clone().acquire_owned() => permit.ok(),
                }
            };
            let Some(permit) = permit else {
                tracing::debug!(job_id = %job.job_id, "batch cancelled before dispatch");
                results[idx] = Some(GenerationResult::failed(
                    FailureKind::Unavailable,
                    "batch cancelled before dispatch",
                ));
                resolved += 1;
                report(resolved);
                continue;
            };

            let engine = Arc::clone(self);
            tasks.spawn(async move {
                let _permit = permit;
                let result = engine.run_job(job.job_id, job.request).await;
                (idx, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    results[idx] = Some(result);
                }
                Err(e) => {
                    tracing::error!(error = %e, "batch job task aborted");
                }
            }
            resolved += 1;
            report(resolved);
        }

        let results: Vec<GenerationResult> = results
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    GenerationResult::failed(FailureKind::Unknown, "job task aborted")
                })
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.success).count();
        let total_cost = self.ledger.grand_total_usd() - spend_before;
        tracing::info!(
            total_jobs = total,
            succeeded,
            failed = total - succeeded,
            total_cost,
            "batch finished",
        );
        self.bus.publish(GenerationEvent::BatchFinished {
            total_jobs: total,
            succeeded,
            failed: total - succeeded,
            total_cost,
            timestamp: Utc::now(),
        });
        results
    }
}
