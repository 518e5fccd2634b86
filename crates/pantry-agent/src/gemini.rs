//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! Only the pieces the ordering assistant needs are modelled: a single text
//! prompt, one grounding tool, and the text plus grounding web links of the
//! first candidate.

use std::time::Duration;

use pantry_core::AppConfig;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AgentError;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Grounding tool attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundingTool {
    GoogleSearch,
    GoogleMaps,
}

impl GroundingTool {
    fn as_json(self) -> serde_json::Value {
        match self {
            GroundingTool::GoogleSearch => json!({ "googleSearch": {} }),
            GroundingTool::GoogleMaps => json!({ "googleMaps": {} }),
        }
    }
}

/// Text of the first candidate and the web sources it was grounded on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Web URIs from the grounding metadata, in response order.
    pub grounding_uris: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    tools: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
}

impl From<GenerateContentResponse> for Generation {
    fn from(response: GenerateContentResponse) -> Self {
        let Some(first) = response.candidates.into_iter().next() else {
            return Generation::default();
        };
        let text = first
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();
        let grounding_uris = first
            .grounding_metadata
            .map(|m| {
                m.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web.and_then(|w| w.uri))
                    .collect()
            })
            .unwrap_or_default();
        Generation {
            text,
            grounding_uris,
        }
    }
}

/// Client for the Gemini API.
///
/// Use [`GeminiClient::new`] for production or [`GeminiClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`AgentError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, AgentError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`AgentError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`AgentError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("pantry/0.1 (meal-ordering)")
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| AgentError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Client configured from the environment, or
    /// [`AgentError::NotConfigured`] when `GEMINI_API_KEY` is unset.
    ///
    /// # Errors
    ///
    /// See [`GeminiClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, AgentError> {
        let api_key = config
            .gemini_api_key
            .as_deref()
            .ok_or(AgentError::NotConfigured("GEMINI_API_KEY"))?;
        Ok(Self::with_base_url(
            api_key,
            &config.gemini_model,
            config.request_timeout_secs,
            &config.gemini_base_url,
        )?
        .with_retry(config.max_retries, config.retry_backoff_base_ms))
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> Result<Url, AgentError> {
        let path = format!("v1beta/models/{}:generateContent", self.model);
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| AgentError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Send `prompt` with `tool` enabled and return the first candidate.
    ///
    /// # Errors
    ///
    /// - [`AgentError::Http`] on network failure or a non-2xx status, after
    ///   retries for transient failures.
    /// - [`AgentError::Deserialize`] if the body is not a `generateContent`
    ///   response.
    pub async fn generate(
        &self,
        prompt: &str,
        tool: GroundingTool,
    ) -> Result<Generation, AgentError> {
        let url = self.endpoint()?;
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            tools: vec![tool.as_json()],
        };

        let (url, request) = (&url, &request);
        let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.post_json(url, request)
        })
        .await?;

        let generation = Generation::from(response);
        tracing::debug!(
            model = %self.model,
            chars = generation.text.len(),
            grounding = generation.grounding_uris.len(),
            "gemini generation received"
        );
        Ok(generation)
    }

    async fn post_json(
        &self,
        url: &Url,
        request: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse, AgentError> {
        let response = self.client.post(url.clone()).json(request).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AgentError::Deserialize {
            context: format!("generateContent(model={})", self.model),
            source: e,
        })
    }
}
