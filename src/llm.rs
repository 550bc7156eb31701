//! Hosted chat-completion client
//!
//! Speaks the OpenAI-compatible chat-completions wire format used by Groq:
//! role-tagged messages, bounded output tokens, and optional tool
//! declarations whose invocations come back as tool-call descriptors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default completion endpoint (Groq, OpenAI-compatible)
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// One role-tagged message in a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::plain("system", content)
    }

    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::plain("user", content)
    }

    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::plain("assistant", content)
    }

    /// A tool-result message answering the given tool call
    #[must_use]
    pub fn tool(call_id: &str, content: &str) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: Some(call_id.to_string()),
        }
    }

    fn plain(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Declared tool (function) the model may invoke
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

/// Function declaration within a tool spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Tool invocation descriptor returned by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

/// Invoked function name plus JSON-encoded arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSpec>>,
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

/// One completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Completion text of the first choice, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.content.as_deref())
    }

    /// Tool-call descriptors of the first choice, when the model stopped
    /// to invoke a tool
    #[must_use]
    pub fn tool_calls(&self) -> Option<&[ToolCall]> {
        let choice = self.choices.first()?;
        if choice.finish_reason.as_deref() == Some("tool_calls") {
            choice.message.tool_calls.as_deref()
        } else {
            None
        }
    }
}

/// Hosted chat-completion collaborator
#[async_trait(?Send)]
pub trait ChatClient {
    /// Submit a completion request
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Groq chat-completion client
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GroqClient {
    /// Create a client for the Groq completion API
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing.
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Groq API key required for the hosted responder".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: GROQ_API_URL.to_string(),
        })
    }

    /// Override the completion endpoint (local gateways, tests)
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[async_trait(?Send)]
impl ChatClient for GroqClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            with_tools = request.tools.is_some(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "completion API error");
            return Err(Error::Completion(format!(
                "completion API error {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse completion response");
            e
        })?;
        Ok(parsed)
    }
}
