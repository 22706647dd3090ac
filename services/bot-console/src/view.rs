//! Read-only projections of the state store for display

use rust_decimal::Decimal;
use std::fmt;

use crate::store::StateStore;
use crate::types::{BotState, Signal, Strategy, Timestamp, Trade};

/// Rows shown in each recent list
pub const RECENT_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub pair: String,
    pub action: String,
    pub price: String,
    pub confidence: String,
}

impl SignalRow {
    fn from_signal(signal: &Signal) -> Self {
        Self {
            pair: signal.pair.clone(),
            action: signal.action.to_string(),
            price: format_money(signal.price),
            confidence: format!("{:.0}%", signal.confidence * 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRow {
    pub pair: String,
    pub action: String,
    pub price: String,
    pub time: String,
}

impl TradeRow {
    fn from_trade(trade: &Trade) -> Self {
        Self {
            pair: trade.signal.pair.clone(),
            action: trade.signal.action.to_string(),
            price: format_money(trade.signal.price),
            time: format_time(trade.timestamp, "%H:%M:%S"),
        }
    }
}

/// Dashboard tab content
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub status: &'static str,
    pub toggle_label: &'static str,
    pub balance: Option<String>,
    pub last_analysis: String,
    pub strategy: Option<&'static str>,
    pub risk_level: Option<String>,
    pub recent_signals: Vec<SignalRow>,
    pub recent_trades: Vec<TradeRow>,
    pub can_issue_commands: bool,
    pub can_execute_trades: bool,
}

impl Dashboard {
    pub fn project(store: &StateStore) -> Self {
        let state = store.bot_state();
        let active = state.as_ref().map(|s| s.active);
        let pending = store.is_pending();

        let recent_signals = store
            .signals()
            .map(|signals| signals.iter().take(RECENT_ROWS).map(SignalRow::from_signal).collect())
            .unwrap_or_default();
        let recent_trades = store
            .trade_history()
            .map(|trades| trades.iter().take(RECENT_ROWS).map(TradeRow::from_trade).collect())
            .unwrap_or_default();

        Self {
            status: match active {
                Some(true) => "ACTIVE",
                Some(false) => "INACTIVE",
                None => "UNKNOWN",
            },
            toggle_label: if active == Some(true) { "Stop Bot" } else { "Start Bot" },
            balance: state.as_ref().map(|s| format_money(s.balance)),
            last_analysis: state
                .as_ref()
                .and_then(|s| s.last_analysis)
                .map(|ts| format_time(ts, "%Y-%m-%d %H:%M:%S UTC"))
                .unwrap_or_else(|| "Never".to_string()),
            strategy: state.as_ref().map(|s| s.strategy.label()),
            risk_level: state.as_ref().map(|s| format!("{:.2}", s.risk_level)),
            recent_signals,
            recent_trades,
            can_issue_commands: !pending,
            can_execute_trades: !pending && active == Some(true),
        }
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bot Status:       {}", self.status)?;
        writeln!(f, "Balance:          {}", self.balance.as_deref().unwrap_or("-"))?;
        writeln!(f, "Last analysis:    {}", self.last_analysis)?;
        writeln!(f, "Strategy:         {}", self.strategy.unwrap_or("-"))?;
        writeln!(f, "Risk level:       {}", self.risk_level.as_deref().unwrap_or("-"))?;

        writeln!(f)?;
        writeln!(f, "Recent Signals")?;
        if self.recent_signals.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for row in &self.recent_signals {
            writeln!(
                f,
                "  {:<10} {:<4} {:>12}  confidence {}",
                row.pair, row.action, row.price, row.confidence
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Recent Trades")?;
        if self.recent_trades.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for row in &self.recent_trades {
            writeln!(
                f,
                "  {:<10} {:<4} {:>12}  {}",
                row.pair, row.action, row.price, row.time
            )?;
        }
        Ok(())
    }
}

/// Strategy tab form, seeded from the service's state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyForm {
    pub strategy: Strategy,
    pub risk_level: f64,
}

impl StrategyForm {
    pub fn from_state(state: &BotState) -> Self {
        Self {
            strategy: state.strategy,
            risk_level: state.risk_level,
        }
    }

    pub fn risk_label(&self) -> String {
        format!("{:.2}", self.risk_level)
    }
}

fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

fn format_time(ts: Timestamp, pattern: &str) -> String {
    ts.to_datetime()
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Operation;
    use crate::types::SignalAction;

    fn state(active: bool) -> BotState {
        BotState {
            active,
            balance: Decimal::new(100000, 2),
            strategy: Strategy::MeanReversion,
            risk_level: 0.5,
            last_analysis: Some(Timestamp(1_700_000_000 * Timestamp::UNITS_PER_SECOND)),
        }
    }

    fn signal(pair: &str, confidence: f64) -> Signal {
        Signal {
            pair: pair.to_string(),
            action: SignalAction::Sell,
            price: Decimal::new(4235678, 2),
            confidence,
            timestamp: Timestamp(0),
        }
    }

    #[test]
    fn test_unsynchronized_dashboard() {
        let store = StateStore::new();
        let view = Dashboard::project(&store);
        assert_eq!(view.status, "UNKNOWN");
        assert_eq!(view.toggle_label, "Start Bot");
        assert_eq!(view.balance, None);
        assert_eq!(view.last_analysis, "Never");
        assert!(view.recent_signals.is_empty());
        assert!(view.can_issue_commands);
        assert!(!view.can_execute_trades);
    }

    #[test]
    fn test_dashboard_projection() {
        let store = StateStore::new();
        store.replace_bot_state(state(true));
        store.replace_signals((0..7).map(|i| signal(&format!("P{}", i), 0.62)).collect());

        let view = Dashboard::project(&store);
        assert_eq!(view.status, "ACTIVE");
        assert_eq!(view.toggle_label, "Stop Bot");
        assert_eq!(view.balance.as_deref(), Some("$1000.00"));
        assert_eq!(view.last_analysis, "2023-11-14 22:13:20 UTC");
        assert_eq!(view.strategy, Some("Mean Reversion"));
        assert_eq!(view.risk_level.as_deref(), Some("0.50"));
        assert_eq!(view.recent_signals.len(), RECENT_ROWS);
        assert_eq!(view.recent_signals[0].pair, "P0");
        assert_eq!(view.recent_signals[0].price, "$42356.78");
        assert_eq!(view.recent_signals[0].confidence, "62%");
        assert!(view.can_execute_trades);

        let text = view.to_string();
        assert!(text.contains("Bot Status:       ACTIVE"));
        assert!(text.contains("Recent Trades\n  (none)"));
    }

    #[test]
    fn test_pending_disables_commands() {
        let store = StateStore::new();
        store.replace_bot_state(state(true));
        let _pending = store.try_begin(Operation::AnalyzeMarket).unwrap();

        let view = Dashboard::project(&store);
        assert!(!view.can_issue_commands);
        assert!(!view.can_execute_trades);
    }

    #[test]
    fn test_trade_row_time() {
        let trade = Trade {
            id: 1,
            signal: signal("BTC/USD", 0.62),
            timestamp: Timestamp(1_700_000_000 * Timestamp::UNITS_PER_SECOND + 999),
            executed: true,
            profit_loss: None,
        };
        let row = TradeRow::from_trade(&trade);
        assert_eq!(row.time, "22:13:20");
        assert_eq!(row.action, "SELL");
    }

    #[test]
    fn test_strategy_form_seeded_from_state() {
        let form = StrategyForm::from_state(&state(false));
        assert_eq!(form.strategy, Strategy::MeanReversion);
        assert_eq!(form.risk_label(), "0.50");
    }
}
