//! Shared fixtures for engine integration tests: a scriptable in-memory
//! provider adapter and PNG helpers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};

use cardforge_core::{
    CardSide, Concept, FailureKind, GenerationRequest, ProviderKind, QualityTier,
};
use cardforge_engine::EngineConfig;
use cardforge_providers::{AdapterOutcome, ProviderAdapter};

/// Install a test-writer tracing subscriber once per test binary.
/// Honors `RUST_LOG` for selective diagnostics.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// Encode a solid RGB PNG at the given dimensions.
pub fn card_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([0, 201, 167])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("png encoding in test fixture");
    buf.into_inner()
}

/// A print-valid artifact: 1536x878 is within aspect tolerance.
pub fn valid_card_png() -> Vec<u8> {
    card_png(1536, 878)
}

pub fn draft_request() -> GenerationRequest {
    GenerationRequest::new(Concept::AthleticEdge, CardSide::Front, QualityTier::Draft)
}

pub fn production_request() -> GenerationRequest {
    GenerationRequest::new(
        Concept::ClinicalPrecision,
        CardSide::Front,
        QualityTier::Production,
    )
}

/// A draft request made cache-unique by its prompt override.
pub fn unique_draft(i: usize) -> GenerationRequest {
    draft_request().with_prompt_override(format!("variant {i}"))
}

/// Engine config tuned for fast tests: no pacing delay.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        min_spacing_ms: 0,
        ..EngineConfig::default()
    }
}

// ---------------------------------------------------------------------------
// ScriptedAdapter
// ---------------------------------------------------------------------------

/// In-memory [`ProviderAdapter`] with a scripted outcome queue.
///
/// Scripted outcomes are consumed first, then every call returns a clone
/// of the default outcome. Tracks call counts, recorded prompts, and the
/// maximum observed in-flight concurrency.
pub struct ScriptedAdapter {
    kind: ProviderKind,
    configured: bool,
    delay: Duration,
    scripted: Mutex<VecDeque<AdapterOutcome>>,
    default_outcome: AdapterOutcome,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedAdapter {
    pub fn new(kind: ProviderKind, default_outcome: AdapterOutcome) -> Self {
        Self {
            kind,
            configured: true,
            delay: Duration::ZERO,
            scripted: Mutex::new(VecDeque::new()),
            default_outcome,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Adapter that always returns a print-valid image.
    pub fn ok(kind: ProviderKind) -> Self {
        Self::new(kind, AdapterOutcome::Image(valid_card_png()))
    }

    /// Adapter that always fails with the given kind.
    pub fn failing(kind: ProviderKind, failure: FailureKind) -> Self {
        Self::new(kind, AdapterOutcome::failure(failure, "scripted failure"))
    }

    /// Adapter whose credential check reports unconfigured.
    pub fn unconfigured(kind: ProviderKind) -> Self {
        let mut adapter = Self::ok(kind);
        adapter.configured = false;
        adapter
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a one-shot outcome ahead of the default.
    pub fn script(&self, outcome: AdapterOutcome) {
        self.scripted
            .lock()
            .expect("scripted queue lock")
            .push_back(outcome);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrency_seen(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log lock").clone()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn invoke(&self, _request: &GenerationRequest, prompt: &str) -> AdapterOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompt log lock")
            .push(prompt.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = self
            .scripted
            .lock()
            .expect("scripted queue lock")
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.clone());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// Convenience: wrap adapters for engine construction.
pub fn adapters(list: Vec<Arc<ScriptedAdapter>>) -> Vec<Arc<dyn ProviderAdapter>> {
    list.into_iter()
        .map(|a| a as Arc<dyn ProviderAdapter>)
        .collect()
}
