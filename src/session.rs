use chrono::NaiveDate;
use error_stack::Report;
use tracing::info;

use crate::assistant::Assistant;
use crate::context::{price_context, question_with_context};
use crate::error::{AssistantError, ProviderError};
use crate::model::{ChatMessage, PriceSeries};
use crate::provider::{DateRange, PriceHistoryProvider};

/// Questions offered to users who don't know where to start.
pub const EXAMPLE_PROMPTS: &[&str] = &[
    "How is the stock performing?",
    "Give me an overview of the stock",
    "What is the highest Close rate?",
    "What are the key technical indicators suggesting?",
    "What is the lowest Open rate?",
    "Show me support and resistance levels",
];

/// Caller-owned state for one user's analysis session.
#[derive(Debug, Clone)]
pub struct Session {
    symbol: String,
    series: Option<PriceSeries>,
    messages: Vec<ChatMessage>,
    context_rows: usize,
}

impl Session {
    pub fn new(symbol: impl Into<String>, context_rows: usize) -> Self {
        Self {
            symbol: symbol.into(),
            series: None,
            messages: Vec::new(),
            context_rows,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn series(&self) -> Option<&PriceSeries> {
        self.series.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Switch to `symbol`. Returns `false` when it is already current.
    ///
    /// Switching drops the loaded prices and the chat history.
    pub fn select_symbol(&mut self, symbol: &str) -> bool {
        if symbol == self.symbol {
            return false;
        }
        info!(from = %self.symbol, to = symbol, "switching symbol");
        self.symbol = symbol.to_owned();
        self.series = None;
        self.messages.clear();
        true
    }

    /// Fetch prices for the current symbol unless already loaded.
    pub async fn ensure_loaded(
        &mut self,
        provider: &dyn PriceHistoryProvider,
        today: NaiveDate,
        history_days: u64,
    ) -> Result<&PriceSeries, Report<ProviderError>> {
        let series = match self.series.take() {
            Some(series) => series,
            None => {
                let range = DateRange::trailing(today, history_days);
                provider.fetch(&self.symbol, range.from, range.to).await?
            }
        };
        Ok(self.series.insert(series))
    }

    /// Ask `assistant` about the loaded prices.
    ///
    /// The question goes into the history verbatim; the request carries it
    /// with the price context attached. The reply is recorded only on success.
    pub async fn ask(
        &mut self,
        assistant: &dyn Assistant,
        question: &str,
    ) -> Result<String, Report<AssistantError>> {
        self.messages.push(ChatMessage::user(question));

        let context = match &self.series {
            Some(series) => price_context(series, self.context_rows),
            None => format!("Stock data for {}: (no data loaded)", self.symbol),
        };
        let request = [ChatMessage::user(question_with_context(&context, question))];

        let reply = assistant.ask(&request).await?;
        self.messages.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }
}
