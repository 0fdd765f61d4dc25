//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`GenerationEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use cardforge_core::types::JobId;
use cardforge_core::{FailureKind, ProviderKind, QualityTier};

// ---------------------------------------------------------------------------
// GenerationEvent
// ---------------------------------------------------------------------------

/// A lifecycle event emitted by the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GenerationEvent {
    /// A job entered the scheduler queue.
    JobSubmitted {
        job_id: JobId,
        content_key: String,
        quality_tier: QualityTier,
        timestamp: DateTime<Utc>,
    },
    /// A job resolved successfully (from cache or a provider call).
    JobCompleted {
        job_id: JobId,
        provider: Option<ProviderKind>,
        cost_estimate: f64,
        duration_ms: u64,
        cache_hit: bool,
        timestamp: DateTime<Utc>,
    },
    /// A job resolved with a terminal failure.
    JobFailed {
        job_id: JobId,
        provider: Option<ProviderKind>,
        kind: FailureKind,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// A batch started dispatching.
    BatchStarted {
        total_jobs: usize,
        timestamp: DateTime<Utc>,
    },
    /// A batch finished (all jobs resolved or dispatch cancelled).
    BatchFinished {
        total_jobs: usize,
        succeeded: usize,
        failed: usize,
        total_cost: f64,
        timestamp: DateTime<Utc>,
    },
    /// A provider crossed a health boundary.
    ProviderHealthChanged {
        provider: ProviderKind,
        healthy: bool,
        failure_rate: f64,
        timestamp: DateTime<Utc>,
    },
    /// An edge-triggered alert was raised (subject to cooldown).
    AlertRaised {
        provider: ProviderKind,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers can
/// independently receive every published [`GenerationEvent`].
pub struct EventBus {
    sender: broadcast::Sender<GenerationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are
    /// dropped and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// A send error only means there are zero receivers; it is ignored so
    /// that analytics availability can never affect generation outcomes.
    pub fn publish(&self, event: GenerationEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<GenerationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let job_id = JobId::new_v4();
        bus.publish(GenerationEvent::JobCompleted {
            job_id,
            provider: Some(ProviderKind::Gemini),
            cost_estimate: 0.005,
            duration_ms: 1200,
            cache_hit: false,
            timestamp: Utc::now(),
        });

        let received = rx.recv().await.expect("should receive the event");
        match received {
            GenerationEvent::JobCompleted {
                job_id: id,
                provider,
                cache_hit,
                ..
            } => {
                assert_eq!(id, job_id);
                assert_eq!(provider, Some(ProviderKind::Gemini));
                assert!(!cache_hit);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(GenerationEvent::BatchStarted {
            total_jobs: 4,
            timestamp: Utc::now(),
        });

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.expect("subscriber should receive") {
                GenerationEvent::BatchStarted { total_jobs, .. } => assert_eq!(total_jobs, 4),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(GenerationEvent::AlertRaised {
            provider: ProviderKind::OpenAi,
            message: "failure rate 0.60 over last 20 calls".into(),
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn events_serialize_with_tagged_type() {
        let event = GenerationEvent::ProviderHealthChanged {
            provider: ProviderKind::OpenAi,
            healthy: false,
            failure_rate: 0.6,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "provider_health_changed");
        assert_eq!(json["provider"], "openai");
    }
}
