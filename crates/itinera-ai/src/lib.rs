//! Conversational itinerary engine for Itinera.
//!
//! Provides the Gemini API client and the state-synchronization core:
//! - A bounded tool-call loop per user turn
//! - Typed dispatch of the assistant's tool invocations
//! - An itinerary merge engine with lock preservation
//! - An ephemeral suggestion channel cleared each turn
//! - Token usage tracking

pub mod dispatch;
pub mod gemini;
pub mod merge;
pub mod prompt;
pub mod session;
pub mod suggestions;
pub mod tools;
pub mod usage;

use async_trait::async_trait;

pub use dispatch::{ToolDispatcher, ToolRequest, UnknownToolError};
pub use gemini::{GeminiClient, GeminiConfig};
pub use merge::{merge_update, ItineraryUpdate};
pub use session::{AssistantReply, Session, TurnPhase, FALLBACK_REPLY, MAX_TOOL_ROUNDS};
pub use suggestions::SuggestionChannel;
pub use usage::UsageTracker;

/// A chat-completion backend that can return text and/or tool calls.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn send_message(
        &self,
        messages: &[WireMessage],
        tools: &[ToolDefinition],
    ) -> Result<AiResponse, AiError>;
}

/// One entry of the wire-level conversation sent to the backend.
///
/// Distinct from `itinera_common::Message`: the wire history carries the
/// intra-turn function-call / function-response exchange, which is never
/// persisted into the chat history.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl WireMessage {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text(content.into())],
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// The assistant turn that requested a batch of tool calls.
    pub fn model_turn(content: String, calls: Vec<ToolCall>) -> Self {
        let mut parts = Vec::with_capacity(calls.len() + 1);
        if !content.is_empty() {
            parts.push(Part::Text(content));
        }
        parts.extend(calls.into_iter().map(Part::FunctionCall));
        Self {
            role: Role::Model,
            parts,
        }
    }

    /// One follow-up message carrying the whole batch of tool results.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::User,
            parts: results.into_iter().map(Part::FunctionResponse).collect(),
        }
    }

    /// Concatenated text parts, ignoring function payloads.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let Part::Text(t) = part {
                out.push_str(t);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Part {
    Text(String),
    FunctionCall(ToolCall),
    FunctionResponse(ToolResult),
}

/// A named tool declared to the backend, with a JSON-Schema parameter shape.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A tool invocation requested by the assistant.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The result returned for one tool invocation, paired by id.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolResult {
    pub id: String,
    pub name: String,
    pub response: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct AiResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Transport-level failures from the backend.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
}

/// Session-boundary failures. Transport errors never appear here: the
/// session absorbs them into a fixed fallback reply.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session initialization failed: {0}")]
    Initialization(String),
    #[error("session is busy with another turn")]
    Busy,
    #[error("tool-call loop exceeded {0} rounds")]
    ToolLoopExceeded(u32),
    #[error("turn cancelled")]
    Cancelled,
}
