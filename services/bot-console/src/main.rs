//! Bot Console - command line control surface for the trading bot
//!
//! Each run:
//! 1. Loads settings (file, environment, flags)
//! 2. Opens a session and synchronizes bot state, trades and signals
//! 3. Runs one command through the orchestrator
//! 4. Prints the dashboard and closes the session

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use bot_console::{
    ConsoleSession, MarketSnapshot, PaperTradingService, Settings, Strategy, TradingService,
    TradingServiceClient,
};

/// Starting balance for paper sessions
const PAPER_BALANCE: i64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "bot-console", about = "Control the trading bot")]
struct Cli {
    /// Settings file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Trading service URL, overrides settings
    #[arg(long)]
    service_url: Option<String>,
    /// Use the in-process paper service
    #[arg(long)]
    paper: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the dashboard
    Status,
    /// Start the bot
    Start,
    /// Stop the bot
    Stop,
    /// Flip the bot between active and inactive
    Toggle,
    /// Update strategy and risk level
    Strategy {
        strategy: Strategy,
        #[arg(allow_negative_numbers = true)]
        risk_level: f64,
    },
    /// Run market analysis and refresh signals
    Analyze {
        #[arg(long, default_value = "market data")]
        data: String,
    },
    /// Execute trades and refresh trade history
    Execute,
    /// Chat with the assistant
    Ask { message: String },
    /// One-shot assistant question
    Prompt { text: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.service_url {
        settings.service_url = url;
    }
    settings.paper |= cli.paper;
    settings.validate()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(settings.log_level()?)
        .init();

    let service: Arc<dyn TradingService> = if settings.paper {
        info!("📝 Using PAPER trading service");
        Arc::new(PaperTradingService::new(Decimal::from(PAPER_BALANCE)))
    } else {
        info!("Trading service: {}", settings.service_url);
        Arc::new(TradingServiceClient::new(
            &settings.service_url,
            settings.request_timeout(),
        )?)
    };

    let (session, report) = ConsoleSession::open(service).await;
    for (field, err) in report.failures() {
        eprintln!("warning: could not load {}: {}", field, err);
    }

    let outcome = run_command(&session, cli.command).await;
    print!("{}", session.dashboard());
    session.close();

    if let Err(e) = &outcome {
        warn!("Command failed: {}", e);
    }
    outcome
}

async fn run_command(session: &ConsoleSession, command: Command) -> anyhow::Result<()> {
    let orchestrator = session.orchestrator();

    match command {
        Command::Status => {
            if let Some(form) = session.strategy_form() {
                info!("Strategy form: {} @ {}", form.strategy, form.risk_label());
            }
        }
        Command::Start => {
            orchestrator.toggle_bot(true).await?;
        }
        Command::Stop => {
            orchestrator.toggle_bot(false).await?;
        }
        Command::Toggle => {
            orchestrator.toggle().await?;
        }
        Command::Strategy {
            strategy,
            risk_level,
        } => {
            orchestrator.update_strategy(strategy, risk_level).await?;
        }
        Command::Analyze { data } => {
            orchestrator.analyze_market(MarketSnapshot::new(data)).await?;
        }
        Command::Execute => {
            orchestrator.execute_trades().await?;
        }
        Command::Ask { message } => {
            let transcript = orchestrator.ask_assistant(&message).await?;
            if let Some(reply) = transcript.last() {
                println!("{}\n", reply.content);
            }
        }
        Command::Prompt { text } => {
            let reply = orchestrator.prompt(&text).await?;
            println!("{}\n", reply);
        }
    }

    Ok(())
}
