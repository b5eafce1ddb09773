use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::model::GenerationConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Text shown when the backend returns an empty candidate.
const EMPTY_RESPONSE_FALLBACK: &str = "I'm sorry, I couldn't generate a response.";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini API error {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// The composed payload for one backend call. Built fresh per user turn,
/// never mutated mid-flight, discarded when the call ends.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model_id: String,
    pub config: GenerationConfig,
    pub payload: String,
    pub system_instruction: String,
}

/// One signal from a live generation stream.
///
/// `Done` is explicit: a channel that closes without it is a transport
/// fault, never a successful empty response.
#[derive(Debug)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Failed(GeminiError),
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct WireGenerationConfig {
    #[serde(rename = "thinkingConfig")]
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
struct ThinkingConfig {
    #[serde(rename = "thinkingBudget")]
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

// ── Client ───────────────────────────────────────────────────────────────

/// HTTP client for the Gemini generation API. The system's sole network
/// boundary; constructed once and passed explicitly to the orchestrator.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn request_body(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: request.payload.clone(),
                }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: request.system_instruction.clone(),
                }],
            },
            generation_config: request.config.thinking_budget.map(|budget| {
                WireGenerationConfig {
                    thinking_config: ThinkingConfig {
                        thinking_budget: budget,
                    },
                }
            }),
        }
    }

    /// One-shot generation. Used by the `ask` command; the chat UI streams.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model_id, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&Self::request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.text();
        if text.is_empty() {
            Ok(EMPTY_RESPONSE_FALLBACK.to_string())
        } else {
            Ok(text)
        }
    }

    /// Open a streaming generation call and return the delta channel.
    ///
    /// Deltas arrive in the exact order the backend emits them. The channel
    /// always terminates with `Done` or `Failed`; dropping the receiver
    /// abandons the stream.
    pub fn stream_generate(&self, request: GenerationRequest) -> UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.clone();

        tokio::spawn(async move {
            client.run_stream(request, tx).await;
        });

        rx
    }

    async fn run_stream(&self, request: GenerationRequest, tx: UnboundedSender<StreamEvent>) {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, request.model_id, self.api_key
        );

        tracing::debug!(model_id = %request.model_id, "opening generation stream");

        let response = match self
            .client
            .post(&url)
            .json(&Self::request_body(&request))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let _ = tx.send(StreamEvent::Failed(e.into()));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "generation stream rejected");
            let _ = tx.send(StreamEvent::Failed(GeminiError::Api { status, body }));
            return;
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(item) = stream.next().await {
            let bytes = match item {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "generation stream aborted mid-read");
                    let _ = tx.send(StreamEvent::Failed(e.into()));
                    return;
                }
            };

            buffer.extend_from_slice(&bytes);

            // SSE events can split across network chunks; only complete
            // lines are parsed, the remainder stays buffered.
            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line);
                let line = line.trim_end();

                if let Some(data) = line.strip_prefix("data: ") {
                    if let Ok(parsed) = serde_json::from_str::<GenerateContentResponse>(data) {
                        let text = parsed.text();
                        if !text.is_empty() && tx.send(StreamEvent::Delta(text)).is_err() {
                            // Receiver dropped (cancelled turn); stop reading.
                            return;
                        }
                    }
                }
            }
        }

        tracing::debug!("generation stream complete");
        let _ = tx.send(StreamEvent::Done);
    }
}
