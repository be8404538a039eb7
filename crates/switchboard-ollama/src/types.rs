// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama chat API request/response types.

use serde::{Deserialize, Serialize};

/// A request to the Ollama `/api/chat` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "llama3.1:8b").
    pub model: String,

    /// Conversation messages; the system prompt travels as the first
    /// message with role "system".
    pub messages: Vec<ChatMessage>,

    /// Always false: Switchboard consumes complete responses.
    pub stream: bool,

    /// Model options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ChatOptions>,
}

/// Sampling options forwarded to the model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Ollama's name for the max-tokens cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// A single message in the chat format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Plain text content.
    pub content: String,
}

/// A complete (non-streaming) chat response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub message: ChatMessage,
    /// Input token count; absent when the prompt was fully cached.
    pub prompt_eval_count: Option<u64>,
    /// Output token count.
    pub eval_count: Option<u64>,
}

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}
