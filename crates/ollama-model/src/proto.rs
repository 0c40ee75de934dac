use ai_common_model::{
    ChatRequest, ChatResponse, FinishReason, ResponseFormat, TokenUsage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{OllamaConfig, Reasoning};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatResponseBody {
    pub message: AssistantMessage,
    pub done_reason: Option<String>,
    #[serde(default)]
    pub prompt_eval_count: u64,
    #[serde(default)]
    pub eval_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: String,
    pub thinking: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TagsResponse {
    pub models: Vec<LocalModel>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LocalModel {
    pub name: String,
    pub model: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    role: &'static str,
    content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl Options {
    #[inline]
    fn is_empty(&self) -> bool {
        *self == Options::default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequestBody {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    #[serde(skip_serializing_if = "Options::is_empty")]
    options: Options,
    #[serde(skip_serializing_if = "Option::is_none")]
    think: Option<Reasoning>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelRequestBody<'a> {
    pub model: &'a str,
    pub stream: bool,
}

// -----------
// Conversions
// -----------

pub fn create_request(
    req: &ChatRequest,
    config: &OllamaConfig,
) -> ChatRequestBody {
    let format = match req.response_format {
        Some(ResponseFormat::JsonObject) => Some(Value::from("json")),
        Some(ResponseFormat::Text) => None,
        None => config.format.clone(),
    };
    ChatRequestBody {
        model: config.model.clone(),
        messages: req
            .messages
            .iter()
            .map(|msg| Message {
                role: msg.role(),
                content: msg.content().to_owned(),
            })
            .collect(),
        stream: false,
        format,
        options: Options {
            num_ctx: config.num_ctx,
            temperature: config.temperature,
            top_p: config.top_p,
            num_predict: config.max_tokens,
        },
        think: config.reasoning.clone(),
    }
}

pub fn into_chat_response(resp: ChatResponseBody) -> ChatResponse {
    ChatResponse {
        content: resp.message.content,
        reasoning: resp.message.thinking.filter(|t| !t.is_empty()),
        usage: TokenUsage::new(resp.prompt_eval_count, resp.eval_count),
        finish_reason: resp
            .done_reason
            .as_deref()
            .map(FinishReason::from_provider_str),
    }
}

#[cfg(test)]
mod tests {
    use ai_common_model::ChatMessage;
    use serde_json::json;

    use super::*;
    use crate::OllamaConfigBuilder;

    #[test]
    fn test_create_request() {
        let config =
            OllamaConfigBuilder::new("http://localhost:11434", "qwen3:8b")
                .with_format(json!("json"))
                .with_num_ctx(32768)
                .with_reasoning(Reasoning::Enabled(false))
                .build();
        let req = ChatRequest {
            messages: vec![ChatMessage::User("List three colors.".to_owned())],
            response_format: None,
        };
        assert_eq!(
            serde_json::to_value(create_request(&req, &config)).unwrap(),
            json!({
                "model": "qwen3:8b",
                "messages": [
                    { "role": "user", "content": "List three colors." }
                ],
                "stream": false,
                "format": "json",
                "options": { "num_ctx": 32768 },
                "think": false
            })
        );
    }

    #[test]
    fn test_request_format_override() {
        let config = OllamaConfigBuilder::new("http://localhost:11434", "m")
            .with_format(json!({ "type": "object" }))
            .build();
        let req = ChatRequest::from_user("Hi")
            .with_response_format(ResponseFormat::Text);
        let value =
            serde_json::to_value(create_request(&req, &config)).unwrap();
        assert!(value.get("format").is_none());
        assert!(value.get("options").is_none());
    }

    #[test]
    fn test_into_chat_response() {
        let resp: ChatResponseBody = serde_json::from_value(json!({
            "model": "qwen3:8b",
            "created_at": "2025-05-01T00:00:00Z",
            "message": {
                "role": "assistant",
                "content": "Red, green, blue.",
                "thinking": "Easy."
            },
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 14,
            "eval_count": 6
        }))
        .unwrap();
        let resp = into_chat_response(resp);
        assert_eq!(resp.content, "Red, green, blue.");
        assert_eq!(resp.reasoning.as_deref(), Some("Easy."));
        assert_eq!(resp.usage, TokenUsage::new(14, 6));
        assert_eq!(resp.finish_reason, Some(FinishReason::Stop));
    }
}
