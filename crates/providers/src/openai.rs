//! OpenAI GPT Image 1 adapter.
//!
//! Calls the images/generations endpoint with bearer auth and decodes the
//! base64 payload from the first result entry. Quality and canvas size
//! are derived from the request's quality tier.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use cardforge_core::{FailureKind, GenerationRequest, ProviderKind, QualityTier};

use crate::adapter::{AdapterOutcome, ProviderAdapter};
use crate::credentials::check_openai_key;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ImageGenerationBody<'a> {
    model: &'static str,
    prompt: &'a str,
    n: u32,
    quality: &'static str,
    size: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

/// Map a quality tier onto OpenAI's quality and size knobs.
///
/// Draft renders on the cheap square canvas; review and production use the
/// landscape canvas closest to business-card proportions.
fn tier_params(tier: QualityTier) -> (&'static str, &'static str) {
    match tier {
        QualityTier::Draft => ("low", "1024x1024"),
        QualityTier::Review => ("medium", "1536x1024"),
        QualityTier::Production => ("high", "1536x1024"),
    }
}

// ---------------------------------------------------------------------------
// OpenAiAdapter
// ---------------------------------------------------------------------------

/// Adapter for OpenAI GPT Image 1.
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the adapter at a different host. Used by tests.
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
        }
    }

    /// Classify an HTTP error status into the shared failure taxonomy.
    ///
    /// 5xx and anything else unexpected map to `Unknown`: a call was made
    /// and possibly billed, which `Unavailable` (reserved for the
    /// no-call-attempted selection path) must never imply.
    fn classify_status(status: reqwest::StatusCode, body: &str) -> AdapterOutcome {
        let kind = match status.as_u16() {
            401 | 403 => FailureKind::AuthError,
            429 => FailureKind::RateLimited,
            408 | 504 => FailureKind::Timeout,
            _ => FailureKind::Unknown,
        };
        let snippet: String = body.chars().take(200).collect();
        AdapterOutcome::failure(kind, format!("openai returned {status}: {snippet}"))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn is_configured(&self) -> bool {
        check_openai_key(self.api_key.as_deref()).is_available()
    }

    async fn invoke(&self, request: &GenerationRequest, prompt: &str) -> AdapterOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return AdapterOutcome::failure(FailureKind::AuthError, "no openai api key");
        };

        let (quality, size) = tier_params(request.quality_tier);
        let body = ImageGenerationBody {
            model: ProviderKind::OpenAi.model_id(),
            prompt,
            n: 1,
            quality,
            size,
        };

        tracing::debug!(quality, size, "calling openai images/generations");
        let response = match self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return AdapterOutcome::failure(FailureKind::Timeout, e.to_string());
            }
            Err(e) => {
                return AdapterOutcome::failure(FailureKind::Unknown, e.to_string());
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => return AdapterOutcome::failure(FailureKind::Unknown, e.to_string()),
        };
        if !status.is_success() {
            return Self::classify_status(status, &text);
        }

        let parsed: ImageGenerationResponse = match serde_json::from_str(&text) {
            Ok(p) => p,
            Err(e) => {
                return AdapterOutcome::failure(
                    FailureKind::InvalidContent,
                    format!("unparseable openai response: {e}"),
                );
            }
        };

        let Some(b64) = parsed.data.into_iter().find_map(|d| d.b64_json) else {
            return AdapterOutcome::failure(
                FailureKind::EmptyResponse,
                "openai response contained no image data",
            );
        };

        match BASE64.decode(b64.as_bytes()) {
            Ok(bytes) if !bytes.is_empty() => AdapterOutcome::Image(bytes),
            Ok(_) => AdapterOutcome::failure(FailureKind::EmptyResponse, "zero-byte image payload"),
            Err(e) => AdapterOutcome::failure(
                FailureKind::InvalidContent,
                format!("invalid base64 image payload: {e}"),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
