use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::indicator::{
    DEFAULT_EMA_WINDOW, DEFAULT_RSI_WINDOW, DEFAULT_SMA_WINDOW, IndicatorKind,
};

const STOCK_API_KEY_ENV: &str = "STOCK_API_KEY";
const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_symbol() -> String {
    "AAPL".into()
}

fn default_symbols() -> Vec<String> {
    [
        "AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA", "IBM", "NFLX", "AMD",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_context_rows() -> usize {
    5
}

fn default_provider_url() -> String {
    "https://financialmodelingprep.com/api/v3".into()
}

fn default_history_days() -> u64 {
    150
}

fn default_assistant_url() -> String {
    "https://api.groq.com/openai/v1".into()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f64 {
    0.7
}

fn default_sma_window() -> usize {
    DEFAULT_SMA_WINDOW
}

fn default_ema_window() -> usize {
    DEFAULT_EMA_WINDOW
}

fn default_rsi_window() -> usize {
    DEFAULT_RSI_WINDOW
}

fn default_indicators() -> Vec<IndicatorKind> {
    vec![IndicatorKind::Sma, IndicatorKind::Ema]
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_symbol")]
    pub default_symbol: String,
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Number of most recent bars sent to the assistant as context.
    #[serde(default = "default_context_rows")]
    pub context_rows: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            default_symbol: default_symbol(),
            symbols: default_symbols(),
            context_rows: default_context_rows(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_history_days")]
    pub history_days: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            api_key: None,
            history_days: default_history_days(),
        }
    }
}

impl ProviderConfig {
    /// API key from the config file, falling back to `STOCK_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), STOCK_API_KEY_ENV)
    }
}

#[derive(Debug, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_assistant_url(),
            model: default_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl AssistantConfig {
    /// API key from the config file, falling back to `GROQ_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), GROQ_API_KEY_ENV)
    }
}

#[derive(Debug, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_sma_window")]
    pub sma_window: usize,
    #[serde(default = "default_ema_window")]
    pub ema_window: usize,
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,
    /// Indicators shown when none are requested explicitly.
    #[serde(default = "default_indicators")]
    pub defaults: Vec<IndicatorKind>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_window: default_sma_window(),
            ema_window: default_ema_window(),
            rsi_window: default_rsi_window(),
            defaults: default_indicators(),
        }
    }
}

impl IndicatorConfig {
    /// Configured window for `kind`; `None` for MACD.
    pub fn window_for(&self, kind: IndicatorKind) -> Option<usize> {
        match kind {
            IndicatorKind::Sma => Some(self.sma_window),
            IndicatorKind::Ema => Some(self.ema_window),
            IndicatorKind::Rsi => Some(self.rsi_window),
            IndicatorKind::Macd => None,
        }
    }
}

fn resolve_key(configured: Option<&str>, env_var: &str) -> Option<String> {
    configured
        .filter(|k| !k.trim().is_empty())
        .map(str::to_owned)
        .or_else(|| std::env::var(env_var).ok().filter(|k| !k.trim().is_empty()))
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(config)?;
    validate_symbols(config)?;
    validate_provider(config)?;
    validate_assistant(config)?;
    validate_windows(config)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let general = &config.general;
    if !VALID_LOG_FORMATS.contains(&general.log_format.as_str()) {
        return Err(invalid(format!(
            "general.log_format \"{}\" is not one of {VALID_LOG_FORMATS:?}",
            general.log_format
        )));
    }
    if general.context_rows == 0 {
        return Err(invalid("general.context_rows must be > 0".into()));
    }
    Ok(())
}

fn validate_symbols(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let general = &config.general;
    if general.symbols.is_empty() {
        return Err(invalid("general.symbols must not be empty".into()));
    }

    let mut seen = std::collections::HashSet::new();
    for symbol in &general.symbols {
        if symbol.trim().is_empty() {
            return Err(invalid("general.symbols: empty symbol".into()));
        }
        if !seen.insert(symbol.as_str()) {
            return Err(invalid(format!("general.symbols: duplicate symbol \"{symbol}\"")));
        }
    }

    if !seen.contains(general.default_symbol.as_str()) {
        return Err(invalid(format!(
            "general.default_symbol \"{}\" is not listed in general.symbols",
            general.default_symbol
        )));
    }
    Ok(())
}

fn validate_provider(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.provider.history_days == 0 {
        return Err(invalid("provider.history_days must be > 0".into()));
    }
    Ok(())
}

fn validate_assistant(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let assistant = &config.assistant;
    if !(0.0..=2.0).contains(&assistant.temperature) {
        return Err(invalid(format!(
            "assistant.temperature {} must be within [0, 2]",
            assistant.temperature
        )));
    }
    if assistant.max_tokens == 0 {
        return Err(invalid("assistant.max_tokens must be > 0".into()));
    }
    Ok(())
}

fn validate_windows(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    for kind in IndicatorKind::ALL {
        if config.indicators.window_for(kind) == Some(0) {
            return Err(invalid(format!("indicators.{kind}_window must be > 0")));
        }
    }
    Ok(())
}
