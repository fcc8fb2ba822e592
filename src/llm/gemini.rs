use serde::{Deserialize, Serialize};
use std::env;

use super::provider::{API_KEY_ENV, CompletionClient, CompletionError, CompletionResult};
use crate::http::{HttpResponseData, Transport};

const ERROR_BODY_LIMIT: usize = 400;

/// Where the Gemini API key comes from at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeySource {
    /// Read the named environment variable on every call.
    Env(String),
    /// A key loaded from the config file.
    Fixed(String),
}

impl ApiKeySource {
    pub fn from_env() -> Self {
        Self::Env(API_KEY_ENV.to_string())
    }

    pub fn resolve(&self) -> Option<String> {
        let raw = match self {
            Self::Env(name) => env::var(name).ok()?,
            Self::Fixed(key) => key.clone(),
        };
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient<T> {
    transport: T,
    api_key: ApiKeySource,
    model: String,
    base_url: String,
}

impl<T: Transport + Sync> GeminiClient<T> {
    pub fn new(transport: T, api_key: ApiKeySource, model: String, base_url: String) -> Self {
        Self {
            transport,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request(prompt: &str) -> GenerateRequest<'_> {
        GenerateRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        }
    }

    async fn generate(&self, prompt: &str) -> CompletionResult<String> {
        let Some(api_key) = self.api_key.resolve() else {
            return Err(CompletionError::Configuration);
        };

        let response = self
            .transport
            .post_json(
                &self.endpoint(),
                &[("key", api_key.as_str())],
                &Self::build_request(prompt),
            )
            .await
            .map_err(|err| CompletionError::Generic(err.to_string()))?;

        if !response.is_success() {
            return Err(CompletionError::Service(service_error_message(&response)));
        }

        let parsed = serde_json::from_str::<GenerateResponse>(&response.body).map_err(|err| {
            CompletionError::Generic(format!("could not read the model response: {err}"))
        })?;
        extract_text(parsed)
    }
}

impl<T: Transport + Sync> CompletionClient for GeminiClient<T> {
    fn complete(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = CompletionResult<String>> + Send {
        self.generate(prompt)
    }
}

fn service_error_message(response: &HttpResponseData) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&response.body) {
        let message = envelope.error.message.trim();
        if !message.is_empty() {
            return format!("{message} (HTTP {})", response.status);
        }
    }

    let body = response.body.trim();
    if body.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        let body = body.chars().take(ERROR_BODY_LIMIT).collect::<String>();
        format!("HTTP {}: {body}", response.status)
    }
}

fn extract_text(resp: GenerateResponse) -> CompletionResult<String> {
    resp.candidates
        .into_iter()
        .flat_map(|candidate| candidate.content.parts)
        .filter_map(|part| part.text)
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
        .ok_or_else(|| CompletionError::Generic("the model returned an empty response".to_string()))
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}
