//! Chat-completion (OpenAI-compatible) provider, Grok by default.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::provider::{MoveProvider, MoveRequest, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_MODEL: &str = "grok-3-mini";
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 500;

const SYSTEM_PROMPT: &str = "You are a chess player. You will be given a position and \
the list of legal moves. Reply with exactly one move from that list in UCI notation \
(for example e2e4 or e7e8q) and nothing else.";

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub temperature: f32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: DEFAULT_REMOTE_TIMEOUT,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct RemoteProvider {
    client: reqwest::Client,
    config: RemoteConfig,
    api_key: String,
    transcript: Vec<String>,
}

impl RemoteProvider {
    /// Fails with `Unavailable` when no API key is configured.
    pub fn new(config: RemoteConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Unavailable("no API key (set XAI_API_KEY)".to_string())
            })?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            api_key,
            transcript: Vec::new(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn map_send_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.config.timeout)
        } else {
            ProviderError::Http(e)
        }
    }
}

#[async_trait]
impl MoveProvider for RemoteProvider {
    fn name(&self) -> &str {
        &self.config.model
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn propose_move(&mut self, request: &MoveRequest) -> Result<String, ProviderError> {
        let prompt = user_prompt(request);
        self.transcript
            .extend(prompt.lines().map(|line| format!(">> {}", line)));
        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;
        if !status.is_success() {
            tracing::warn!("Remote API returned {}", status);
            self.transcript.push(format!("<< HTTP {}", status.as_u16()));
            return Err(ProviderError::Status {
                code: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let content = extract_content(&text)?;
        self.transcript.push(format!("<< {}", content));
        Ok(content)
    }

    fn drain_transcript(&mut self) -> Vec<String> {
        std::mem::take(&mut self.transcript)
    }
}

/// The user message: position, history, whitelist and earlier rejections.
pub fn user_prompt(request: &MoveRequest) -> String {
    let mut prompt = format!(
        "Position (FEN): {}\nYou play {}.\n",
        request.fen,
        request.side.as_str()
    );
    if request.history_san.is_empty() {
        prompt.push_str("No moves have been played yet.\n");
    } else {
        prompt.push_str(&format!("Moves so far: {}\n", request.history_san.join(" ")));
    }
    prompt.push_str(&format!("Legal moves: {}\n", request.legal_uci.join(" ")));
    if !request.rejected.is_empty() {
        prompt.push_str(&format!(
            "These answers were rejected as illegal or unreadable: {}\n",
            request.rejected.join(" | ")
        ));
    }
    prompt.push_str("Answer with one legal move in UCI notation.");
    prompt
}

/// First choice's message content from a chat-completion body.
pub fn extract_content(body: &str) -> Result<String, ProviderError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or(ProviderError::EmptyResponse)
}
