//! Core types exchanged with the trading service
//!
//! These types define the contract between the console and the remote bot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading strategy the bot runs
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Momentum,
    MeanReversion,
    Arbitrage,
    MlBased,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Momentum,
        Strategy::MeanReversion,
        Strategy::Arbitrage,
        Strategy::MlBased,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Momentum => "momentum",
            Strategy::MeanReversion => "mean_reversion",
            Strategy::Arbitrage => "arbitrage",
            Strategy::MlBased => "ml_based",
        }
    }

    /// Human readable name
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Momentum => "Momentum",
            Strategy::MeanReversion => "Mean Reversion",
            Strategy::Arbitrage => "Arbitrage",
            Strategy::MlBased => "ML-Based",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown strategy '{}' (expected one of: momentum, mean_reversion, arbitrage, ml_based)",
                    s
                )
            })
    }
}

/// Risk level rejected before it reaches the service
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("Risk level {0} is outside [0, 1]")]
pub struct InvalidRiskLevel(pub f64);

/// Risk level validated to [0, 1]
///
/// The only way to send a risk level to the service.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct RiskLevel(f64);

impl RiskLevel {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 1.0;

    pub fn new(value: f64) -> Result<Self, InvalidRiskLevel> {
        // NaN fails the range check too
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidRiskLevel(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for RiskLevel {
    type Error = InvalidRiskLevel;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Service timestamp: integer nanoseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const UNITS_PER_SECOND: u64 = 1_000_000_000;

    pub fn now() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self(u64::try_from(nanos).unwrap_or_default())
    }

    /// Wall-clock time for display
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.0 / Self::UNITS_PER_SECOND).ok()?;
        let nanos = (self.0 % Self::UNITS_PER_SECOND) as u32;
        DateTime::<Utc>::from_timestamp(secs, nanos)
    }
}

/// Authoritative bot snapshot as reported by the service
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BotState {
    pub active: bool,
    pub balance: Decimal,
    pub strategy: Strategy,
    pub risk_level: f64,
    pub last_analysis: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Buy => "BUY",
            SignalAction::Sell => "SELL",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generated trading recommendation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Signal {
    pub pair: String,
    pub action: SignalAction,
    pub price: Decimal,
    pub confidence: f64,
    #[serde(default)]
    pub timestamp: Timestamp,
}

/// A signal that was acted upon
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Trade {
    #[serde(default)]
    pub id: u64,
    pub signal: Signal,
    pub timestamp: Timestamp,
    #[serde(default = "default_executed")]
    pub executed: bool,
    #[serde(default)]
    pub profit_loss: Option<Decimal>,
}

fn default_executed() -> bool {
    true
}

/// Market data handed to analysis; opaque to the console
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MarketSnapshot(String);

impl MarketSnapshot {
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of an assistant conversation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_bounds() {
        assert!(RiskLevel::new(0.0).is_ok());
        assert!(RiskLevel::new(1.0).is_ok());
        assert_eq!(RiskLevel::new(0.42).unwrap().value(), 0.42);

        assert_eq!(RiskLevel::new(1.5), Err(InvalidRiskLevel(1.5)));
        assert!(RiskLevel::new(-0.01).is_err());
        assert!(RiskLevel::new(f64::NAN).is_err());
    }

    #[test]
    fn test_strategy_wire_names() {
        for strategy in Strategy::ALL {
            let json = serde_json::to_string(&strategy).unwrap();
            assert_eq!(json, format!("\"{}\"", strategy.as_str()));
            assert_eq!(strategy.as_str().parse::<Strategy>().unwrap(), strategy);
        }

        assert_eq!("Mean-Reversion".parse::<Strategy>().unwrap(), Strategy::MeanReversion);
        assert!("scalping".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_bot_state_from_service_json() {
        let json = serde_json::json!({
            "active": true,
            "balance": 1000.25,
            "strategy": "ml_based",
            "risk_level": 0.3,
            "last_analysis": 1_700_000_000_000_000_000u64,
        });

        let state: BotState = serde_json::from_value(json).unwrap();
        assert!(state.active);
        assert_eq!(state.balance, Decimal::new(100025, 2));
        assert_eq!(state.strategy, Strategy::MlBased);
        assert_eq!(state.last_analysis, Some(Timestamp(1_700_000_000_000_000_000)));
    }

    #[test]
    fn test_trade_defaults() {
        let json = serde_json::json!({
            "signal": {
                "pair": "ICP/USD",
                "action": "BUY",
                "price": 12.34,
                "confidence": 0.75
            },
            "timestamp": 5
        });

        let trade: Trade = serde_json::from_value(json).unwrap();
        assert_eq!(trade.id, 0);
        assert!(trade.executed);
        assert_eq!(trade.profit_loss, None);
        assert_eq!(trade.signal.action, SignalAction::Buy);
        assert_eq!(trade.signal.timestamp, Timestamp(0));
    }

    #[test]
    fn test_timestamp_conversion() {
        let ts = Timestamp(1_700_000_000 * Timestamp::UNITS_PER_SECOND + 500);
        let dt = ts.to_datetime().unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert_eq!(dt.timestamp_subsec_nanos(), 500);
    }
}
