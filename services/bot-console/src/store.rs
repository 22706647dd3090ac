//! State Store - last known bot state, trades, signals, and the pending flag
//!
//! Every field is replaced wholesale. Consumers get `Arc` snapshots that stay
//! valid until they drop them, whatever replacements happen meanwhile.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::service::Operation;
use crate::types::{BotState, ChatMessage, Signal, Trade};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change notifications for view consumers
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    BotStateReplaced,
    TradeHistoryReplaced,
    SignalsReplaced,
    ConversationReplaced,
    PendingChanged(bool),
    CommandFailed { operation: Operation, message: String },
}

/// Store fields, for error attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreField {
    BotState,
    TradeHistory,
    Signals,
    Conversation,
}

impl std::fmt::Display for StoreField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoreField::BotState => "bot state",
            StoreField::TradeHistory => "trade history",
            StoreField::Signals => "signals",
            StoreField::Conversation => "conversation",
        };
        f.write_str(name)
    }
}

/// In-memory state for one console session
pub struct StateStore {
    bot_state: RwLock<Option<Arc<BotState>>>,
    trade_history: RwLock<Option<Arc<Vec<Trade>>>>,
    signals: RwLock<Option<Arc<Vec<Signal>>>>,
    conversation: RwLock<Arc<Vec<ChatMessage>>>,
    pending: AtomicBool,
    events: broadcast::Sender<StoreEvent>,
}

impl StateStore {
    /// Create an empty store; every field starts unset
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            bot_state: RwLock::new(None),
            trade_history: RwLock::new(None),
            signals: RwLock::new(None),
            conversation: RwLock::new(Arc::new(Vec::new())),
            pending: AtomicBool::new(false),
            events,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn bot_state(&self) -> Option<Arc<BotState>> {
        self.bot_state.read().clone()
    }

    pub fn trade_history(&self) -> Option<Arc<Vec<Trade>>> {
        self.trade_history.read().clone()
    }

    pub fn signals(&self) -> Option<Arc<Vec<Signal>>> {
        self.signals.read().clone()
    }

    pub fn conversation(&self) -> Arc<Vec<ChatMessage>> {
        self.conversation.read().clone()
    }

    /// Whether a command is in flight
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub(crate) fn replace_bot_state(&self, state: BotState) -> Arc<BotState> {
        let state = Arc::new(state);
        *self.bot_state.write() = Some(state.clone());
        self.publish(StoreEvent::BotStateReplaced);
        state
    }

    pub(crate) fn replace_trade_history(&self, trades: Vec<Trade>) -> Arc<Vec<Trade>> {
        let trades = Arc::new(trades);
        *self.trade_history.write() = Some(trades.clone());
        self.publish(StoreEvent::TradeHistoryReplaced);
        trades
    }

    pub(crate) fn replace_signals(&self, signals: Vec<Signal>) -> Arc<Vec<Signal>> {
        let signals = Arc::new(signals);
        *self.signals.write() = Some(signals.clone());
        self.publish(StoreEvent::SignalsReplaced);
        signals
    }

    pub(crate) fn replace_conversation(&self, messages: Vec<ChatMessage>) -> Arc<Vec<ChatMessage>> {
        let messages = Arc::new(messages);
        *self.conversation.write() = messages.clone();
        self.publish(StoreEvent::ConversationReplaced);
        messages
    }

    /// Claim the pending flag for one command
    ///
    /// Returns `None` while another command holds it. The flag clears when
    /// the guard drops.
    pub(crate) fn try_begin(&self, operation: Operation) -> Option<PendingGuard<'_>> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        debug!(operation = operation.as_str(), "Pending flag set");
        self.publish(StoreEvent::PendingChanged(true));
        Some(PendingGuard {
            store: self,
            operation,
        })
    }

    pub(crate) fn publish(&self, event: StoreEvent) {
        // No subscribers is fine
        self.events.send(event).ok();
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the pending flag for the duration of one command chain
pub struct PendingGuard<'a> {
    store: &'a StateStore,
    operation: Operation,
}

impl PendingGuard<'_> {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.store.pending.store(false, Ordering::Release);
        debug!(operation = self.operation.as_str(), "Pending flag cleared");
        self.store.publish(StoreEvent::PendingChanged(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SignalAction, Strategy, Timestamp};
    use rust_decimal::Decimal;

    fn sample_state(active: bool) -> BotState {
        BotState {
            active,
            balance: Decimal::new(100000, 2),
            strategy: Strategy::Momentum,
            risk_level: 0.5,
            last_analysis: None,
        }
    }

    fn sample_signal(pair: &str) -> Signal {
        Signal {
            pair: pair.to_string(),
            action: SignalAction::Buy,
            price: Decimal::new(1234, 2),
            confidence: 0.75,
            timestamp: Timestamp(1),
        }
    }

    #[test]
    fn test_starts_unset() {
        let store = StateStore::new();
        assert!(store.bot_state().is_none());
        assert!(store.trade_history().is_none());
        assert!(store.signals().is_none());
        assert!(store.conversation().is_empty());
        assert!(!store.is_pending());
    }

    #[test]
    fn test_replacement_keeps_old_snapshots() {
        let store = StateStore::new();
        store.replace_signals(vec![sample_signal("ICP/USD")]);
        let before = store.signals().unwrap();

        store.replace_signals(vec![sample_signal("BTC/USD"), sample_signal("ICP/USD")]);
        let after = store.signals().unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(before[0].pair, "ICP/USD");
        assert_eq!(after.len(), 2);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_fields_replace_independently() {
        let store = StateStore::new();
        store.replace_signals(vec![sample_signal("ICP/USD")]);
        let signals = store.signals().unwrap();

        store.replace_bot_state(sample_state(true));
        assert!(Arc::ptr_eq(&signals, &store.signals().unwrap()));
        assert!(store.bot_state().unwrap().active);
    }

    #[test]
    fn test_pending_guard_is_exclusive() {
        let store = StateStore::new();

        let guard = store.try_begin(Operation::ToggleBot).unwrap();
        assert!(store.is_pending());
        assert_eq!(guard.operation(), Operation::ToggleBot);
        assert!(store.try_begin(Operation::ExecuteTrades).is_none());

        drop(guard);
        assert!(!store.is_pending());
        assert!(store.try_begin(Operation::ExecuteTrades).is_some());
    }

    #[tokio::test]
    async fn test_events_published() {
        let store = StateStore::new();
        let mut rx = store.subscribe();

        {
            let _guard = store.try_begin(Operation::ToggleBot).unwrap();
            store.replace_bot_state(sample_state(true));
        }

        assert_eq!(rx.recv().await.unwrap(), StoreEvent::PendingChanged(true));
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::BotStateReplaced);
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::PendingChanged(false));
    }
}
