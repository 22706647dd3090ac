//! Paper Trading Service - in-process stand-in for the remote service
//!
//! Mirrors what the remote bot does closely enough to drive the console
//! offline: analysis produces a fixed pair of signals, execution turns the
//! confident ones into trades, and nothing leaves the process.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::service::{Result, ServiceError, TradingService};
use crate::types::{
    BotState, ChatMessage, ChatRole, MarketSnapshot, RiskLevel, Signal, SignalAction, Strategy,
    Timestamp, Trade,
};

/// Signals below this confidence are never executed
pub const MIN_EXECUTION_CONFIDENCE: f64 = 0.6;

const DEFAULT_RISK_LEVEL: f64 = 0.5;

/// Paper book; sequences are kept most recent first
struct PaperBook {
    state: BotState,
    signals: Vec<Signal>,
    trades: Vec<Trade>,
}

/// Trading service that runs entirely in memory
pub struct PaperTradingService {
    book: Mutex<PaperBook>,
}

impl PaperTradingService {
    pub fn new(balance: Decimal) -> Self {
        Self {
            book: Mutex::new(PaperBook {
                state: BotState {
                    active: false,
                    balance,
                    strategy: Strategy::Momentum,
                    risk_level: DEFAULT_RISK_LEVEL,
                    last_analysis: None,
                },
                signals: Vec::new(),
                trades: Vec::new(),
            }),
        }
    }
}

impl Default for PaperTradingService {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}

fn generate_signals(timestamp: Timestamp) -> Vec<Signal> {
    vec![
        Signal {
            pair: "ICP/USD".to_string(),
            action: SignalAction::Buy,
            price: Decimal::new(1234, 2),
            confidence: 0.75,
            timestamp,
        },
        Signal {
            pair: "BTC/USD".to_string(),
            action: SignalAction::Sell,
            price: Decimal::new(4235678, 2),
            confidence: 0.62,
            timestamp,
        },
    ]
}

#[async_trait::async_trait]
impl TradingService for PaperTradingService {
    async fn get_bot_state(&self) -> Result<BotState> {
        Ok(self.book.lock().state.clone())
    }

    async fn get_trade_history(&self) -> Result<Vec<Trade>> {
        Ok(self.book.lock().trades.clone())
    }

    async fn get_signals(&self) -> Result<Vec<Signal>> {
        Ok(self.book.lock().signals.clone())
    }

    async fn toggle_bot(&self, active: bool) -> Result<BotState> {
        let mut book = self.book.lock();
        book.state.active = active;
        info!("📝 Paper bot {}", if active { "started" } else { "stopped" });
        Ok(book.state.clone())
    }

    async fn update_strategy(&self, strategy: Strategy, risk_level: RiskLevel) -> Result<BotState> {
        let mut book = self.book.lock();
        book.state.strategy = strategy;
        book.state.risk_level = risk_level.value();
        Ok(book.state.clone())
    }

    async fn analyze_market(&self, snapshot: &MarketSnapshot) -> Result<()> {
        let timestamp = Timestamp::now();
        debug!("Paper analysis of {} bytes of market data", snapshot.as_str().len());

        let mut book = self.book.lock();
        // Newest first: the later of the generated pair leads
        let mut fresh = generate_signals(timestamp);
        fresh.reverse();
        fresh.append(&mut book.signals);
        book.signals = fresh;
        book.state.last_analysis = Some(timestamp);
        Ok(())
    }

    async fn execute_trades(&self) -> Result<()> {
        let mut book = self.book.lock();
        if !book.state.active {
            return Err(ServiceError::Rejected("Bot is not active".to_string()));
        }

        let timestamp = Timestamp::now();
        let mut executed: Vec<Trade> = book
            .signals
            .iter()
            .filter(|signal| signal.confidence > MIN_EXECUTION_CONFIDENCE)
            .cloned()
            .enumerate()
            .map(|(i, signal)| Trade {
                id: timestamp.0 + i as u64,
                signal,
                timestamp,
                executed: true,
                profit_loss: None,
            })
            .collect();

        info!("📝 Paper executed {} trades", executed.len());
        executed.append(&mut book.trades);
        book.trades = executed;
        Ok(())
    }

    async fn prompt(&self, prompt: &str) -> Result<String> {
        Ok(format!("Paper mode has no assistant model. You asked: {}", prompt))
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let last = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!("Paper mode has no assistant model. You said: {}", last))
    }
}
