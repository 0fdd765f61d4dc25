//! Google Gemini 2.5 Flash Image adapter.
//!
//! Calls the generateContent endpoint with the API key in the
//! `x-goog-api-key` header and extracts the first inline image part from
//! the first candidate. Gemini has no quality knob; every tier renders
//! the same way and is billed at the flat per-image rate.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use cardforge_core::{FailureKind, GenerationRequest, ProviderKind};

use crate::adapter::{AdapterOutcome, ProviderAdapter};
use crate::credentials::check_gemini_key;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GenerateContentResponse {
    /// Pull the first inline image payload out of the candidate tree.
    fn first_image_b64(self) -> Option<String> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data.map(|d| d.data))
    }
}

// ---------------------------------------------------------------------------
// GeminiAdapter
// ---------------------------------------------------------------------------

/// Adapter for Google Gemini 2.5 Flash Image.
pub struct GeminiAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiAdapter {
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

    /// 5xx and anything else unexpected map to `Unknown`; `Unavailable`
    /// is reserved for the no-call-attempted selection path.
    fn classify_status(status: reqwest::StatusCode, body: &str) -> AdapterOutcome {
        let kind = match status.as_u16() {
            401 | 403 => FailureKind::AuthError,
            429 => FailureKind::RateLimited,
            408 | 504 => FailureKind::Timeout,
            _ => FailureKind::Unknown,
        };
        let snippet: String = body.chars().take(200).collect();
        AdapterOutcome::failure(kind, format!("gemini returned {status}: {snippet}"))
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn is_configured(&self) -> bool {
        check_gemini_key(self.api_key.as_deref()).is_available()
    }

    async fn invoke(&self, _request: &GenerationRequest, prompt: &str) -> AdapterOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return AdapterOutcome::failure(FailureKind::AuthError, "no gemini api key");
        };

        let body = GenerateContentBody {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
        };
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            ProviderKind::Gemini.model_id()
        );

        tracing::debug!("calling gemini generateContent");
        let response = match self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
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

        let parsed: GenerateContentResponse = match serde_json::from_str(&text) {
            Ok(p) => p,
            Err(e) => {
                return AdapterOutcome::failure(
                    FailureKind::InvalidContent,
                    format!("unparseable gemini response: {e}"),
                );
            }
        };

        let Some(b64) = parsed.first_image_b64() else {
            return AdapterOutcome::failure(
                FailureKind::EmptyResponse,
                "gemini response contained no inline image",
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
