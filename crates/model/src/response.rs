use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// A completely received answer from the chat model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated text.
    pub content: String,
    /// Reasoning text, for providers that report it out of band.
    pub reasoning: Option<String>,
    /// Token consumption of this request.
    pub usage: TokenUsage,
    /// The reason the model finished generating.
    pub finish_reason: Option<FinishReason>,
}

/// The reason why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinishReason {
    /// The model has finished generating text.
    Stop,
    /// The output hit the token limit.
    Length,
    /// Any reason we don't model explicitly.
    Other,
}

impl FinishReason {
    /// Parses the reason strings used by the supported providers.
    pub fn from_provider_str(reason: &str) -> Self {
        match reason {
            "stop" | "end_turn" | "stop_sequence" => FinishReason::Stop,
            "length" | "max_tokens" => FinishReason::Length,
            _ => FinishReason::Other,
        }
    }
}

/// Token consumption of one or more requests.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub input_tokens: u64,
    /// Tokens generated by the model.
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Creates a usage record.
    #[inline]
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Returns the sum of input and output tokens.
    #[inline]
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        TokenUsage {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates() {
        let mut usage = TokenUsage::default();
        usage += TokenUsage::new(10, 2);
        usage += TokenUsage::new(5, 3);
        assert_eq!(usage, TokenUsage::new(15, 5));
        assert_eq!(usage.total(), 20);
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::from_provider_str("stop"), FinishReason::Stop);
        assert_eq!(
            FinishReason::from_provider_str("end_turn"),
            FinishReason::Stop
        );
        assert_eq!(
            FinishReason::from_provider_str("max_tokens"),
            FinishReason::Length
        );
        assert_eq!(
            FinishReason::from_provider_str("tool_calls"),
            FinishReason::Other
        );
    }
}
