//! Generation result type and the failure taxonomy.
//!
//! Every job — success or failure — resolves to exactly one
//! [`GenerationResult`]. Adapters and the engine never raise for expected
//! provider failure modes; they classify them into a [`FailureKind`] and
//! return a failed result instead.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::provider::ProviderKind;

// ---------------------------------------------------------------------------
// FailureKind
// ---------------------------------------------------------------------------

/// Classified failure mode for a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Credentials rejected. Unrecoverable for this process run; the
    /// provider is marked unconfigured.
    AuthError,
    /// Provider throttled the call. Eligible for one fallback retry.
    RateLimited,
    /// The call exceeded its deadline. Eligible for one fallback retry.
    Timeout,
    /// The provider answered but returned no usable artifact.
    EmptyResponse,
    /// The provider returned bytes that are not a decodable image.
    InvalidContent,
    /// The artifact failed print-quality rules. Not a provider error.
    ValidationFailed,
    /// No configured, healthy provider at selection time. No call attempted.
    Unavailable,
    /// Anything the classifier could not attribute.
    Unknown,
}

impl FailureKind {
    /// Stable string form used in metrics labels and event payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::AuthError => "auth_error",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Timeout => "timeout",
            FailureKind::EmptyResponse => "empty_response",
            FailureKind::InvalidContent => "invalid_content",
            FailureKind::ValidationFailed => "validation_failed",
            FailureKind::Unavailable => "unavailable",
            FailureKind::Unknown => "unknown",
        }
    }

    /// Whether a job failing with this kind is eligible for the single
    /// automatic retry against a fallback provider.
    ///
    /// Auth and content failures are excluded because retrying cannot
    /// change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::RateLimited | FailureKind::Timeout)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GenerationResult
// ---------------------------------------------------------------------------

/// The resolved outcome of one generation job. Immutable after construction.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub success: bool,
    /// Decoded image bytes. Empty on failure.
    pub image_bytes: Vec<u8>,
    pub provider_used: Option<ProviderKind>,
    /// Estimated spend for this call, in USD.
    pub cost_estimate: f64,
    pub processing_duration: Duration,
    pub error: Option<FailureKind>,
    /// Human-readable failure detail (e.g. which validation rule failed).
    pub error_detail: Option<String>,
}

impl GenerationResult {
    /// A successful result owning the artifact bytes.
    pub fn ok(image_bytes: Vec<u8>, provider: ProviderKind, cost_estimate: f64) -> Self {
        Self {
            success: true,
            image_bytes,
            provider_used: Some(provider),
            cost_estimate,
            processing_duration: Duration::ZERO,
            error: None,
            error_detail: None,
        }
    }

    /// A failed result with a classified kind and detail message.
    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            image_bytes: Vec::new(),
            provider_used: None,
            cost_estimate: 0.0,
            processing_duration: Duration::ZERO,
            error: Some(kind),
            error_detail: Some(detail.into()),
        }
    }

    /// Attribute the failure to the provider that produced it.
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider_used = Some(provider);
        self
    }

    /// Stamp the wall-clock duration the job took end to end.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.processing_duration = duration;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
