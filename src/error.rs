use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum ProviderError {
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
    #[display("no price data available for {symbol}")]
    DataUnavailable { symbol: String },
    #[display("missing API key for {provider}")]
    MissingApiKey { provider: String },
}

#[derive(Debug, Display, Error)]
pub enum AssistantError {
    #[display("request to {assistant} failed")]
    Request { assistant: String },
    #[display("failed to parse response from {assistant}")]
    ResponseParse { assistant: String },
    #[display("{assistant} returned no choices")]
    InvalidResponse { assistant: String },
    #[display("missing API key for {assistant}")]
    MissingApiKey { assistant: String },
}
