mod assistant;
mod config;
mod context;
mod error;
mod indicator;
mod model;
mod provider;
mod repl;
mod report;
mod session;

use std::io::Write;
use std::path::Path;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use assistant::Assistant;
use assistant::groq::GroqAssistant;
use config::AppConfig;
use indicator::{IndicatorKind, IndicatorParams, IndicatorSeries, compute_indicator};
use model::{PriceSeries, StockMetrics};
use provider::PriceHistoryProvider;
use provider::fmp::FmpProvider;
use repl::{ChatCommand, HELP, parse_command};
use session::{EXAMPLE_PROMPTS, Session};

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("price data error")]
    PriceData,
    #[display("assistant error")]
    Assistant,
    #[display("runtime error")]
    Runtime,
}

#[derive(Parser)]
#[command(name = "stock-analyst", about = "Stock indicators and LLM-backed Q&A")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print price metrics and indicator values
    Show {
        /// Symbols to compare; repeatable
        #[arg(short, long = "symbol")]
        symbols: Vec<String>,
        /// Indicators to compute; repeatable
        #[arg(short, long = "indicator", value_enum)]
        indicators: Vec<IndicatorKind>,
        /// Window override for SMA, EMA and RSI
        #[arg(short, long)]
        window: Option<usize>,
        /// Number of most recent rows to print
        #[arg(short, long, default_value_t = 10)]
        rows: usize,
    },
    /// Ask a single question about a stock
    Ask {
        #[arg(short, long)]
        symbol: Option<String>,
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Interactive chat session
    Chat {
        #[arg(short, long)]
        symbol: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    match cli.command {
        Command::Show {
            symbols,
            indicators,
            window,
            rows,
        } => {
            let symbols = resolve_symbols(&config, &symbols)?;
            let provider = build_provider(&config)?;
            let kinds = if indicators.is_empty() {
                config.indicators.defaults.clone()
            } else {
                indicators
            };
            if symbols.len() > 1 {
                println!("Stock Comparison: {}\n", symbols.join(", "));
            }
            for (i, symbol) in symbols.into_iter().enumerate() {
                if i > 0 {
                    println!();
                }
                let mut session = Session::new(symbol, config.general.context_rows);
                let series = session
                    .ensure_loaded(provider.as_ref(), today(), config.provider.history_days)
                    .await
                    .change_context(AppError::PriceData)?;
                print_overview(&config, series, &kinds, window, rows);
            }
        }
        Command::Ask { symbol, question } => {
            let symbol = resolve_symbol(&config, symbol.as_deref())?;
            let provider = build_provider(&config)?;
            let assistant = build_assistant(&config)?;
            let mut session = Session::new(symbol, config.general.context_rows);
            session
                .ensure_loaded(provider.as_ref(), today(), config.provider.history_days)
                .await
                .change_context(AppError::PriceData)?;
            let answer = session
                .ask(assistant.as_ref(), &question.join(" "))
                .await
                .change_context(AppError::Assistant)?;
            println!("{answer}");
        }
        Command::Chat { symbol } => {
            let symbol = resolve_symbol(&config, symbol.as_deref())?;
            let provider = build_provider(&config)?;
            let assistant = build_assistant(&config)?;
            let session = Session::new(symbol, config.general.context_rows);
            chat_loop(&config, session, provider.as_ref(), assistant.as_ref()).await?;
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    // Logs go to stderr so answers and tables on stdout stay clean.
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn resolve_symbol(config: &AppConfig, requested: Option<&str>) -> Result<String, Report<AppError>> {
    let symbol = requested
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| config.general.default_symbol.clone());
    if !config.general.symbols.contains(&symbol) {
        return Err(Report::new(AppError::Config).attach(format!(
            "symbol {symbol} is not one of {:?}",
            config.general.symbols
        )));
    }
    Ok(symbol)
}

/// Resolve each requested symbol, dropping repeats; the default symbol when
/// none are given.
fn resolve_symbols(
    config: &AppConfig,
    requested: &[String],
) -> Result<Vec<String>, Report<AppError>> {
    if requested.is_empty() {
        return Ok(vec![resolve_symbol(config, None)?]);
    }
    let mut symbols: Vec<String> = Vec::with_capacity(requested.len());
    for symbol in requested {
        let symbol = resolve_symbol(config, Some(symbol))?;
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    Ok(symbols)
}

fn build_provider(config: &AppConfig) -> Result<Box<dyn PriceHistoryProvider>, Report<AppError>> {
    let Some(api_key) = config.provider.resolve_api_key() else {
        return Err(Report::new(error::ProviderError::MissingApiKey {
            provider: "fmp".into(),
        })
        .attach("set provider.api_key or STOCK_API_KEY")
        .change_context(AppError::Config));
    };
    Ok(Box::new(FmpProvider::new(&config.provider.base_url, api_key)))
}

fn build_assistant(config: &AppConfig) -> Result<Box<dyn Assistant>, Report<AppError>> {
    let settings = &config.assistant;
    let Some(api_key) = settings.resolve_api_key() else {
        return Err(Report::new(error::AssistantError::MissingApiKey {
            assistant: "groq".into(),
        })
        .attach("set assistant.api_key or GROQ_API_KEY")
        .change_context(AppError::Config));
    };
    Ok(Box::new(GroqAssistant::new(
        &settings.base_url,
        api_key,
        &settings.model,
        settings.max_tokens,
        settings.temperature,
    )))
}

fn indicator_series(
    config: &AppConfig,
    series: &PriceSeries,
    kinds: &[IndicatorKind],
    window_override: Option<usize>,
) -> Vec<IndicatorSeries> {
    kinds
        .iter()
        .flat_map(|&kind| {
            let window = window_override.or_else(|| config.indicators.window_for(kind));
            compute_indicator(series, kind, IndicatorParams { window })
        })
        .collect()
}

fn print_overview(
    config: &AppConfig,
    series: &PriceSeries,
    kinds: &[IndicatorKind],
    window_override: Option<usize>,
    rows: usize,
) {
    let indicators = indicator_series(config, series, kinds, window_override);
    println!("{} ({} trading days)", series.symbol(), series.len());
    print!("{}", report::render_metrics(StockMetrics::from_series(series).as_ref()));
    for indicator in &indicators {
        match indicator.last_defined() {
            Some(v) => println!("Latest {:<12} {v:.4}", indicator.label),
            None => println!("Latest {:<12} not enough data", indicator.label),
        }
    }
    println!();
    print!("{}", report::render_table(series, &indicators, rows));
}

async fn chat_loop(
    config: &AppConfig,
    mut session: Session,
    provider: &dyn PriceHistoryProvider,
    assistant: &dyn Assistant,
) -> Result<(), Report<AppError>> {
    let history_days = config.provider.history_days;
    load_or_warn(&mut session, provider, history_days).await;

    println!(
        "Chatting about {} using {}. Type /help for commands.",
        session.symbol(),
        assistant.name()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}> ", session.symbol());
        std::io::stdout()
            .flush()
            .change_context(AppError::Runtime)?;

        let line = tokio::select! {
            line = lines.next_line() => line.change_context(AppError::Runtime)?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            ChatCommand::Empty => {}
            ChatCommand::Ask(question) => ask_and_print(&mut session, assistant, &question).await,
            ChatCommand::Example(n) => match EXAMPLE_PROMPTS.get(n - 1) {
                Some(prompt) => {
                    println!("{prompt}");
                    ask_and_print(&mut session, assistant, prompt).await;
                }
                None => println!("there are {} examples", EXAMPLE_PROMPTS.len()),
            },
            ChatCommand::Examples => {
                for (i, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
                    println!("  {}. {prompt}", i + 1);
                }
            }
            ChatCommand::Symbol(symbol) => {
                if !config.general.symbols.contains(&symbol) {
                    println!("unknown symbol {symbol}; see /symbols");
                } else if session.select_symbol(&symbol) {
                    load_or_warn(&mut session, provider, history_days).await;
                }
            }
            ChatCommand::Symbols => println!("{}", config.general.symbols.join(" ")),
            ChatCommand::Show(kinds) => {
                let kinds = if kinds.is_empty() {
                    config.indicators.defaults.clone()
                } else {
                    kinds
                };
                match session.series() {
                    Some(series) => print_overview(config, series, &kinds, None, 10),
                    None => println!("no price data loaded for {}", session.symbol()),
                }
            }
            ChatCommand::History => {
                for message in session.messages() {
                    println!("[{}] {}", message.role, message.content);
                }
            }
            ChatCommand::Help => println!("{HELP}"),
            ChatCommand::Invalid(reason) => println!("{reason}"),
            ChatCommand::Quit => break,
        }
    }

    info!("chat session ended");
    Ok(())
}

async fn load_or_warn(session: &mut Session, provider: &dyn PriceHistoryProvider, history_days: u64) {
    let loaded = session
        .ensure_loaded(provider, today(), history_days)
        .await
        .map(|series| series.len());
    match loaded {
        Ok(days) => println!("Loaded {days} days of {}", session.symbol()),
        Err(e) => {
            tracing::warn!(
                error = ?e,
                provider = provider.name(),
                symbol = session.symbol(),
                "failed to load price data"
            );
            println!("Failed to load data for {}", session.symbol());
        }
    }
}

async fn ask_and_print(session: &mut Session, assistant: &dyn Assistant, question: &str) {
    match session.ask(assistant, question).await {
        Ok(answer) => println!("{answer}"),
        Err(e) => {
            tracing::warn!(error = ?e, "chat request failed");
            println!("Failed to generate response. Please try again.");
        }
    }
}
