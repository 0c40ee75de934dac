//! Token prices of hosted models.

use ai_common_model::TokenUsage;

use crate::LlmServer;

/// USD price per million tokens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelPrice {
    /// Price of prompt tokens.
    pub input: f64,
    /// Price of generated tokens.
    pub output: f64,
}

const fn price(input: f64, output: f64) -> ModelPrice {
    ModelPrice { input, output }
}

const GROQ_PRICES: &[(&str, ModelPrice)] = &[
    ("deepseek-r1-distill-llama-70b", price(0.75, 0.99)),
    ("gemma2-9b-it", price(0.20, 0.20)),
    ("llama3-70b-8192", price(0.59, 0.79)),
    ("llama3-8b-8192", price(0.05, 0.08)),
    ("llama-3.1-8b-instant", price(0.05, 0.08)),
    ("llama-3.3-70b-versatile", price(0.59, 0.79)),
    (
        "meta-llama/llama-4-maverick-17b-128e-instruct",
        price(0.20, 0.60),
    ),
    ("meta-llama/llama-4-scout-17b-16e-instruct", price(0.11, 0.34)),
    ("meta-llama/llama-guard-4-12b", price(0.20, 0.20)),
    ("mistral-saba-24b", price(0.79, 0.79)),
    ("qwen-qwq-32b", price(0.29, 0.39)),
];

const OPENAI_PRICES: &[(&str, ModelPrice)] = &[
    ("gpt-4.1", price(2.00, 8.00)),
    ("gpt-4.1-mini", price(0.40, 1.60)),
    ("gpt-4.1-nano", price(0.10, 0.40)),
    ("gpt-4o", price(2.50, 10.00)),
    ("gpt-4o-mini", price(0.15, 0.60)),
    ("o1", price(15.00, 60.00)),
    ("o3", price(10.00, 40.00)),
    ("o1-mini", price(1.10, 4.40)),
    ("o3-mini", price(1.10, 4.40)),
];

const ANTHROPIC_PRICES: &[(&str, ModelPrice)] = &[
    ("claude-opus-4-latest", price(15.00, 75.00)),
    ("claude-sonnet-4-latest", price(3.00, 15.00)),
    ("claude-3-5-haiku-latest", price(0.80, 4.00)),
    ("claude-3-7-sonnet-latest", price(3.00, 15.00)),
];

/// Looks up the price of `model` on `server`.
///
/// Self-hosted servers have no price.
pub fn model_price(server: LlmServer, model: &str) -> Option<ModelPrice> {
    let table = match server {
        LlmServer::Groq => GROQ_PRICES,
        LlmServer::OpenAI => OPENAI_PRICES,
        LlmServer::Anthropic => ANTHROPIC_PRICES,
        LlmServer::Ollama | LlmServer::Vllm => return None,
    };
    table
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, price)| *price)
}

/// Calculates the USD cost of `usage` on `model`, if its price is known.
pub fn calculate_token_cost(
    server: LlmServer,
    model: &str,
    usage: &TokenUsage,
) -> Option<f64> {
    let Some(price) = model_price(server, model) else {
        debug!("no price known for {model} on {server}");
        return None;
    };
    Some(
        (usage.input_tokens as f64 * price.input
            + usage.output_tokens as f64 * price.output)
            / 1_000_000.0,
    )
}
