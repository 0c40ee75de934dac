use serde::{Deserialize, Serialize};

/// A request to be sent to the chat model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChatRequest {
    /// The input messages.
    pub messages: Vec<ChatMessage>,
    /// Overrides the response format configured on the model.
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    /// Creates a request with a single user message.
    #[inline]
    pub fn from_user<S: Into<String>>(content: S) -> Self {
        Self {
            messages: vec![ChatMessage::User(content.into())],
            response_format: None,
        }
    }

    /// Requests the given response format.
    #[inline]
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum ChatMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
}

impl ChatMessage {
    /// Returns the role name as most providers spell it.
    #[inline]
    pub fn role(&self) -> &'static str {
        match self {
            ChatMessage::System(_) => "system",
            ChatMessage::User(_) => "user",
            ChatMessage::Assistant(_) => "assistant",
        }
    }

    /// Returns the text of this message.
    #[inline]
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System(content)
            | ChatMessage::User(content)
            | ChatMessage::Assistant(content) => content,
        }
    }
}

/// The shape the model is asked to answer in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free-form text.
    Text,
    /// A single JSON object.
    JsonObject,
}
