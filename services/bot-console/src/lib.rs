//! Bot Console Library
//!
//! Client-side state orchestration for the trading bot console: a typed
//! facade to the trading service, a state store, and the orchestrator that
//! keeps the two in step.

pub mod client;
pub mod config;
pub mod orchestrator;
pub mod paper;
pub mod service;
pub mod session;
pub mod store;
pub mod types;
pub mod view;

// Re-export main types for convenience
pub use client::TradingServiceClient;
pub use config::Settings;
pub use orchestrator::{CommandError, Orchestrator, SyncReport};
pub use paper::PaperTradingService;
pub use service::{Operation, ServiceError, TradingService};
pub use session::ConsoleSession;
pub use store::{StateStore, StoreEvent, StoreField};
pub use types::{
    BotState, ChatMessage, ChatRole, InvalidRiskLevel, MarketSnapshot, RiskLevel, Signal,
    SignalAction, Strategy, Timestamp, Trade,
};
pub use view::{Dashboard, StrategyForm};
