use ai_common_model::{
    ChatMessage, ChatRequest, ChatResponse, ErrorKind, FinishReason,
    ResponseFormat, TokenUsage,
};
use serde::{Deserialize, Serialize};

use crate::{Error, OpenAIConfig};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
    // vLLM and DeepSeek-style servers.
    pub reasoning_content: Option<String>,
    // Groq.
    pub reasoning: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ModelList {
    pub data: Vec<ModelEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    role: &'static str,
    content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct ResponseFormatParam {
    r#type: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatParam>,
    stream: bool,
}

// -----------
// Conversions
// -----------

pub fn create_request(
    req: &ChatRequest,
    config: &OpenAIConfig,
    model: String,
) -> ChatCompletionRequest {
    let response_format = req
        .response_format
        .or(config.response_format)
        .map(|format| ResponseFormatParam {
            r#type: match format {
                ResponseFormat::Text => "text",
                ResponseFormat::JsonObject => "json_object",
            },
        });
    ChatCompletionRequest {
        model,
        messages: req.messages.iter().map(create_message).collect(),
        temperature: config.temperature,
        top_p: config.top_p,
        max_completion_tokens: config.max_tokens,
        reasoning_effort: config.reasoning_effort.clone(),
        service_tier: config.service_tier.clone(),
        response_format,
        stream: false,
    }
}

#[inline]
fn create_message(msg: &ChatMessage) -> Message {
    Message {
        role: msg.role(),
        content: msg.content().to_owned(),
    }
}

pub fn into_chat_response(
    completion: ChatCompletion,
) -> Result<ChatResponse, Error> {
    let usage = completion
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::new(
            "completion has no choices",
            ErrorKind::InvalidResponse,
        ));
    };
    let AssistantMessage {
        content,
        reasoning_content,
        reasoning,
    } = choice.message;
    Ok(ChatResponse {
        content: content.unwrap_or_default(),
        reasoning: reasoning_content.or(reasoning),
        usage,
        finish_reason: choice
            .finish_reason
            .as_deref()
            .map(FinishReason::from_provider_str),
    })
}
