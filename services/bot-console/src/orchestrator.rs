//! Action Orchestrator - sequences user commands against the trading service
//!
//! At most one command is in flight at a time (the store's pending flag).
//! Queries carry no such restriction: they target independent store fields.
//!
//! Each command is one transition `Idle -> Pending -> Idle`. Trigger-only
//! commands re-query their dependent field inside the same transition, and the
//! flag clears only after the whole chain resolves.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::service::{Operation, ServiceError, TradingService};
use crate::store::{PendingGuard, StateStore, StoreEvent, StoreField};
use crate::types::{
    BotState, ChatMessage, InvalidRiskLevel, MarketSnapshot, RiskLevel, Signal, Strategy, Trade,
};

/// Why a user command did not complete
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Another command is already in flight")]
    Busy,

    #[error(transparent)]
    InvalidRiskLevel(#[from] InvalidRiskLevel),

    #[error("Bot state has not been synchronized yet")]
    Unsynchronized,

    #[error("{operation} failed: {source}")]
    Service {
        operation: Operation,
        #[source]
        source: ServiceError,
    },

    #[error("{operation} succeeded but refreshing {field} failed: {source}")]
    StaleState {
        operation: Operation,
        field: StoreField,
        #[source]
        source: ServiceError,
    },
}

impl CommandError {
    /// Underlying service error, if the service was reached
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            CommandError::Service { source, .. } | CommandError::StaleState { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// Outcome of the startup synchronization, one entry per field
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub bot_state: Result<(), ServiceError>,
    pub trade_history: Result<(), ServiceError>,
    pub signals: Result<(), ServiceError>,
}

impl SyncReport {
    /// Strategy configuration can be shown once bot state is known
    pub fn strategy_ready(&self) -> bool {
        self.bot_state.is_ok()
    }

    pub fn is_complete(&self) -> bool {
        self.bot_state.is_ok() && self.trade_history.is_ok() && self.signals.is_ok()
    }

    /// Fields that failed, with their errors
    pub fn failures(&self) -> Vec<(StoreField, &ServiceError)> {
        [
            (StoreField::BotState, &self.bot_state),
            (StoreField::TradeHistory, &self.trade_history),
            (StoreField::Signals, &self.signals),
        ]
        .into_iter()
        .filter_map(|(field, result)| result.as_ref().err().map(|e| (field, e)))
        .collect()
    }
}

/// Sequences user commands and keeps the store in step with the service
pub struct Orchestrator {
    service: Arc<dyn TradingService>,
    store: Arc<StateStore>,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn TradingService>, store: Arc<StateStore>) -> Self {
        Self { service, store }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Fetch bot state, trade history and signals concurrently
    ///
    /// Each field is written as soon as its query resolves. A failed query
    /// leaves its field as it was and does not affect the others.
    pub async fn synchronize(&self) -> SyncReport {
        let bot_state = async {
            let state = self.service.get_bot_state().await?;
            self.store.replace_bot_state(state);
            Ok::<(), ServiceError>(())
        };
        let trade_history = async {
            let trades = self.service.get_trade_history().await?;
            self.store.replace_trade_history(trades);
            Ok::<(), ServiceError>(())
        };
        let signals = async {
            let signals = self.service.get_signals().await?;
            self.store.replace_signals(signals);
            Ok::<(), ServiceError>(())
        };

        let (bot_state, trade_history, signals) = tokio::join!(bot_state, trade_history, signals);
        let report = SyncReport {
            bot_state,
            trade_history,
            signals,
        };

        for (field, err) in report.failures() {
            warn!(kind = err.kind(), "Failed to synchronize {}: {}", field, err);
        }
        if report.is_complete() {
            info!("✓ Synchronized bot state, trade history and signals");
        }

        report
    }

    /// Ask the service to start or stop the bot
    ///
    /// The stored state is whatever the service answers, which need not match
    /// the request.
    pub async fn toggle_bot(&self, active: bool) -> Result<Arc<BotState>, CommandError> {
        let pending = self.begin(Operation::ToggleBot)?;

        let state = self
            .service
            .toggle_bot(active)
            .await
            .map_err(|e| self.command_failed(&pending, e))?;

        if state.active != active {
            info!(
                "Service kept bot {} (requested active={})",
                if state.active { "active" } else { "inactive" },
                active
            );
        }

        Ok(self.store.replace_bot_state(state))
    }

    /// Flip the last known active flag
    pub async fn toggle(&self) -> Result<Arc<BotState>, CommandError> {
        let current = self.store.bot_state().ok_or(CommandError::Unsynchronized)?;
        self.toggle_bot(!current.active).await
    }

    /// Change strategy and risk level
    ///
    /// Out-of-range risk levels are rejected before the service is called.
    pub async fn update_strategy(
        &self,
        strategy: Strategy,
        risk_level: f64,
    ) -> Result<Arc<BotState>, CommandError> {
        let risk_level = RiskLevel::new(risk_level)?;
        let pending = self.begin(Operation::UpdateStrategy)?;

        let state = self
            .service
            .update_strategy(strategy, risk_level)
            .await
            .map_err(|e| self.command_failed(&pending, e))?;

        if state.strategy != strategy || state.risk_level != risk_level.value() {
            info!(
                "Service settled on {} @ {} (requested {} @ {})",
                state.strategy,
                state.risk_level,
                strategy,
                risk_level.value()
            );
        }

        Ok(self.store.replace_bot_state(state))
    }

    /// Run market analysis, then refresh signals
    pub async fn analyze_market(
        &self,
        snapshot: MarketSnapshot,
    ) -> Result<Arc<Vec<Signal>>, CommandError> {
        let pending = self.begin(Operation::AnalyzeMarket)?;

        self.service
            .analyze_market(&snapshot)
            .await
            .map_err(|e| self.command_failed(&pending, e))?;

        let signals = self
            .service
            .get_signals()
            .await
            .map_err(|e| self.refresh_failed(&pending, StoreField::Signals, e))?;

        info!("Market analysis complete: {} signals", signals.len());
        Ok(self.store.replace_signals(signals))
    }

    /// Execute trades on current signals, then refresh trade history
    pub async fn execute_trades(&self) -> Result<Arc<Vec<Trade>>, CommandError> {
        let pending = self.begin(Operation::ExecuteTrades)?;

        self.service
            .execute_trades()
            .await
            .map_err(|e| self.command_failed(&pending, e))?;

        let trades = self
            .service
            .get_trade_history()
            .await
            .map_err(|e| self.refresh_failed(&pending, StoreField::TradeHistory, e))?;

        info!("Trades executed: {} in history", trades.len());
        Ok(self.store.replace_trade_history(trades))
    }

    /// Send a message to the assistant and record the exchange
    pub async fn ask_assistant(&self, message: &str) -> Result<Arc<Vec<ChatMessage>>, CommandError> {
        let pending = self.begin(Operation::Chat)?;

        let mut transcript = self.store.conversation().as_ref().clone();
        transcript.push(ChatMessage::user(message));

        let reply = self
            .service
            .chat(&transcript)
            .await
            .map_err(|e| self.command_failed(&pending, e))?;

        transcript.push(ChatMessage::assistant(reply));
        Ok(self.store.replace_conversation(transcript))
    }

    /// One-shot assistant question; nothing is stored
    pub async fn prompt(&self, prompt: &str) -> Result<String, CommandError> {
        let pending = self.begin(Operation::Prompt)?;

        self.service
            .prompt(prompt)
            .await
            .map_err(|e| self.command_failed(&pending, e))
    }

    fn begin(&self, operation: Operation) -> Result<PendingGuard<'_>, CommandError> {
        match self.store.try_begin(operation) {
            Some(guard) => {
                debug!(operation = operation.as_str(), "Command issued");
                Ok(guard)
            }
            None => {
                warn!(operation = operation.as_str(), "Rejected: another command is in flight");
                Err(CommandError::Busy)
            }
        }
    }

    fn command_failed(&self, pending: &PendingGuard<'_>, source: ServiceError) -> CommandError {
        let err = CommandError::Service {
            operation: pending.operation(),
            source,
        };
        self.surface(pending.operation(), &err);
        err
    }

    fn refresh_failed(
        &self,
        pending: &PendingGuard<'_>,
        field: StoreField,
        source: ServiceError,
    ) -> CommandError {
        let err = CommandError::StaleState {
            operation: pending.operation(),
            field,
            source,
        };
        self.surface(pending.operation(), &err);
        err
    }

    fn surface(&self, operation: Operation, err: &CommandError) {
        warn!(operation = operation.as_str(), "{}", err);
        self.store.publish(StoreEvent::CommandFailed {
            operation,
            message: err.to_string(),
        });
    }
}
