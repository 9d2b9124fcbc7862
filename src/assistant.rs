pub mod groq;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::AssistantError;
use crate::model::ChatMessage;

/// Fixed instructions sent ahead of every conversation.
pub const SYSTEM_PROMPT: &str = "You are a stock market analyst. Your role is to use this data \
to answer questions about the stock";

/// Hosted chat model that answers questions about the loaded prices.
pub trait Assistant: Send + Sync {
    fn name(&self) -> &str;

    /// Send `messages` (without the system prompt) and return the reply text.
    fn ask(&self, messages: &[ChatMessage]) -> BoxFuture<'_, Result<String, Report<AssistantError>>>;
}
