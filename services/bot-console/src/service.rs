//! Trading Service Facade
//!
//! Typed boundary to the remote trading service. Queries read bot state,
//! commands change it; every operation can fail and none retries.

use std::fmt;

use crate::types::{BotState, ChatMessage, MarketSnapshot, RiskLevel, Signal, Strategy, Trade};

/// Error types for trading service operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("Trading service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request rejected by trading service: {0}")]
    Rejected(String),

    #[error("Malformed response from trading service: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Short kind name for logs and events
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::ServiceUnavailable(_) => "service_unavailable",
            ServiceError::Rejected(_) => "rejected",
            ServiceError::Malformed(_) => "malformed",
        }
    }
}

/// Result type for trading service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Facade operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetBotState,
    GetTradeHistory,
    GetSignals,
    ToggleBot,
    UpdateStrategy,
    AnalyzeMarket,
    ExecuteTrades,
    Prompt,
    Chat,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetBotState => "get_bot_state",
            Operation::GetTradeHistory => "get_trade_history",
            Operation::GetSignals => "get_signals",
            Operation::ToggleBot => "toggle_bot",
            Operation::UpdateStrategy => "update_strategy",
            Operation::AnalyzeMarket => "analyze_market",
            Operation::ExecuteTrades => "execute_trades",
            Operation::Prompt => "prompt",
            Operation::Chat => "chat",
        }
    }

    /// Commands change service state; queries only read it
    pub fn is_command(&self) -> bool {
        !matches!(
            self,
            Operation::GetBotState | Operation::GetTradeHistory | Operation::GetSignals
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote trading service
#[async_trait::async_trait]
pub trait TradingService: Send + Sync {
    /// Current bot state
    async fn get_bot_state(&self) -> Result<BotState>;

    /// Executed trades, most recent first
    async fn get_trade_history(&self) -> Result<Vec<Trade>>;

    /// Generated signals, most recent first
    async fn get_signals(&self) -> Result<Vec<Signal>>;

    /// Ask the service to set the active flag; returns the state it settled on
    async fn toggle_bot(&self, active: bool) -> Result<BotState>;

    /// Change strategy and risk level; returns the state the service accepted
    async fn update_strategy(&self, strategy: Strategy, risk_level: RiskLevel) -> Result<BotState>;

    /// Trigger signal generation. Signals must be re-queried.
    async fn analyze_market(&self, snapshot: &MarketSnapshot) -> Result<()>;

    /// Trigger execution of current signals. Trades must be re-queried.
    async fn execute_trades(&self) -> Result<()>;

    /// One-shot question to the service assistant
    async fn prompt(&self, prompt: &str) -> Result<String>;

    /// Assistant reply to a full conversation
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;
}
