use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ChatRequest;
use crate::response::ChatResponse;

/// The error type for a chat model.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a configured chat model, which is an entry for
/// sampling completions from one provider.
///
/// Once the model is created, it should behave like a stateless object.
/// It can still have internal state (a connection pool, a memoized model
/// name), but callers should not rely on it, and the model should be
/// prepared for being dropped anytime.
///
/// Constructing a chat model must not touch the network. Connections are
/// established on the first request.
pub trait ChatModel: Send + Sync {
    /// The error type that may be returned by the model.
    type Error: ModelProviderError;

    /// Returns the model name this handle is bound to, if it is known
    /// without asking the provider.
    fn model_name(&self) -> Option<&str>;

    /// Sends a request to the model and waits for the complete answer.
    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + 'static;
}
