//! The provider adapter trait — the single seam between the engine and
//! external image-generation services.
//!
//! The trait is object-safe so the engine can hold a heterogeneous
//! collection of adapters (`Arc<dyn ProviderAdapter>`) and select one at
//! runtime. All methods are async via `#[async_trait]` and the trait
//! requires `Send + Sync` for use across Tokio tasks.

use async_trait::async_trait;

use cardforge_core::{FailureKind, GenerationRequest, ProviderKind};

/// Normalized outcome of one provider invocation.
///
/// Cost attribution and wall-clock accounting happen in the engine; the
/// adapter only reports the artifact bytes or a classified failure.
#[derive(Debug, Clone)]
pub enum AdapterOutcome {
    /// Raw decoded image bytes returned by the provider.
    Image(Vec<u8>),
    /// A classified, expected provider failure.
    Failure {
        kind: FailureKind,
        detail: String,
    },
}

impl AdapterOutcome {
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, AdapterOutcome::Image(_))
    }
}

/// One adapter per external provider.
///
/// `invoke` never returns `Err` for ordinary provider failures (auth
/// rejection, throttling, empty responses); those come back as
/// [`AdapterOutcome::Failure`] with a classified [`FailureKind`]. An
/// adapter constructed without credentials reports `is_configured() ==
/// false` and must never be selected.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter fronts.
    fn kind(&self) -> ProviderKind;

    /// Whether credentials were present and plausible at construction.
    fn is_configured(&self) -> bool;

    /// Execute one generation call for the given request and prompt.
    async fn invoke(&self, request: &GenerationRequest, prompt: &str) -> AdapterOutcome;
}
