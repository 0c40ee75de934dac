//! Shared building blocks for LLM research pipelines.
//!
//! The crate resolves a chat model for one of several LLM servers from a
//! loose parameter map, runs batches of web searches and formats the
//! results for a prompt, and carries the small text and cost helpers those
//! pipelines need.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod llm;
pub mod price;
mod query_writer;
pub mod settings;
mod summarizer;
mod text;

pub use llm::{
    ChatModelHandle, HandleError, LlmServer, ParameterBag, ParameterError,
    ResolveError, UnknownServerError, get_llm, load_ollama_model, resolve,
    resolve_model_alias,
};
pub use price::calculate_token_cost;
pub use query_writer::{GeneratedQueries, QueryWriter, QueryWriterError};
pub use settings::{Settings, SettingsError, WebSearchSettings};
pub use summarizer::{SourceSummarizer, SummarizedSources, SummarizerError};
pub use text::strip_thinking_tokens;

/// Re-exports of [`ai_common_model`] crate.
pub mod model {
    pub use ai_common_model::*;
}

/// Re-exports of [`ai_common_web_search`] crate.
pub mod web_search {
    pub use ai_common_web_search::*;
}

/// Re-exports of the chat model clients.
pub mod providers {
    /// OpenAI-compatible client, also used for Groq and vLLM.
    pub mod openai {
        pub use ai_common_openai_model::*;
    }

    /// Anthropic client.
    pub mod anthropic {
        pub use ai_common_anthropic_model::*;
    }

    /// Ollama client.
    pub mod ollama {
        pub use ai_common_ollama_model::*;
    }
}
