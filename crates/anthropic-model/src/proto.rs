use ai_common_model::{
    ChatMessage, ChatRequest, ChatResponse, ErrorKind, FinishReason,
    TokenUsage,
};
use serde::{Deserialize, Serialize};

use crate::{AnthropicConfig, Error};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    role: &'static str,
    content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

// -----------
// Conversions
// -----------

/// Anthropic takes system instructions out of band, so system messages are
/// joined into the top-level `system` field.
pub fn create_request(
    req: &ChatRequest,
    config: &AnthropicConfig,
) -> MessagesRequest {
    let mut system_parts = vec![];
    let mut messages = vec![];
    for msg in &req.messages {
        match msg {
            ChatMessage::System(content) => system_parts.push(content.as_str()),
            ChatMessage::User(content) | ChatMessage::Assistant(content) => {
                messages.push(Message {
                    role: msg.role(),
                    content: content.clone(),
                });
            }
        }
    }
    let system =
        (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));

    MessagesRequest {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        system,
        messages,
        stop_sequences: config.stop_sequences.clone(),
        temperature: config.temperature,
        top_p: config.top_p,
    }
}

pub fn into_chat_response(
    resp: MessagesResponse,
) -> Result<ChatResponse, Error> {
    let mut content = String::new();
    let mut reasoning: Option<String> = None;
    for block in resp.content {
        match block {
            ContentBlock::Text { text } => content.push_str(&text),
            ContentBlock::Thinking { thinking } => {
                reasoning.get_or_insert_with(String::new).push_str(&thinking);
            }
            ContentBlock::Unsupported => {
                debug!("skipping an unsupported content block");
            }
        }
    }
    if content.is_empty() && reasoning.is_none() {
        return Err(Error::new(
            "response has no text content",
            ErrorKind::InvalidResponse,
        ));
    }

    Ok(ChatResponse {
        content,
        reasoning,
        usage: TokenUsage::new(
            resp.usage.input_tokens,
            resp.usage.output_tokens,
        ),
        finish_reason: resp
            .stop_reason
            .as_deref()
            .map(FinishReason::from_provider_str),
    })
}
