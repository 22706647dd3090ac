//! Trading Service API Client

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::service::{Operation, Result, ServiceError, TradingService};
use crate::types::{BotState, ChatMessage, MarketSnapshot, RiskLevel, Signal, Strategy, Trade};

/// HTTP client for the remote trading service
pub struct TradingServiceClient {
    client: Client,
    base_url: String,
}

impl TradingServiceClient {
    /// Create new trading service client
    ///
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, op: Operation, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(operation = op.as_str(), "GET {}", url);

        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        let response = check_status(op, response).await?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, op: Operation, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.post(op, path, body).await?;
        decode(response).await
    }

    async fn post<B>(&self, op: Operation, path: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path);
        debug!(operation = op.as_str(), "POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(op, response).await
    }
}

#[async_trait::async_trait]
impl TradingService for TradingServiceClient {
    async fn get_bot_state(&self) -> Result<BotState> {
        self.get_json(Operation::GetBotState, "/v1/bot/state").await
    }

    async fn get_trade_history(&self) -> Result<Vec<Trade>> {
        self.get_json(Operation::GetTradeHistory, "/v1/trades").await
    }

    async fn get_signals(&self) -> Result<Vec<Signal>> {
        self.get_json(Operation::GetSignals, "/v1/signals").await
    }

    async fn toggle_bot(&self, active: bool) -> Result<BotState> {
        let req = ToggleRequest { active };
        self.post_json(Operation::ToggleBot, "/v1/bot/toggle", &req).await
    }

    async fn update_strategy(&self, strategy: Strategy, risk_level: RiskLevel) -> Result<BotState> {
        let req = StrategyRequest {
            strategy,
            risk_level,
        };
        self.post_json(Operation::UpdateStrategy, "/v1/bot/strategy", &req)
            .await
    }

    async fn analyze_market(&self, snapshot: &MarketSnapshot) -> Result<()> {
        let req = AnalyzeRequest { data: snapshot };
        self.post(Operation::AnalyzeMarket, "/v1/market/analyze", &req)
            .await?;
        Ok(())
    }

    async fn execute_trades(&self) -> Result<()> {
        self.post(Operation::ExecuteTrades, "/v1/trades/execute", &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn prompt(&self, prompt: &str) -> Result<String> {
        let req = PromptRequest { prompt };
        let resp: AssistantReply = self
            .post_json(Operation::Prompt, "/v1/assistant/prompt", &req)
            .await?;
        Ok(resp.reply)
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let req = ChatRequest { messages };
        let resp: AssistantReply = self
            .post_json(Operation::Chat, "/v1/assistant/chat", &req)
            .await?;
        Ok(resp.reply)
    }
}

async fn check_status(op: Operation, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    warn!(operation = op.as_str(), "{} failed: {} - {}", op, status, text);
    Err(status_error(status, text))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::Malformed(e.to_string()))
}

fn status_error(status: StatusCode, body: String) -> ServiceError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{} - {}", status, body)
    };

    if status.is_server_error() {
        ServiceError::ServiceUnavailable(message)
    } else if status.is_client_error() {
        ServiceError::Rejected(message)
    } else {
        ServiceError::Malformed(format!("unexpected status {}", message))
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_decode() {
        ServiceError::Malformed(err.to_string())
    } else {
        ServiceError::ServiceUnavailable(err.to_string())
    }
}

// Request/Response types

#[derive(Debug, Clone, Serialize)]
struct ToggleRequest {
    active: bool,
}

#[derive(Debug, Clone, Serialize)]
struct StrategyRequest {
    strategy: Strategy,
    risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize)]
struct AnalyzeRequest<'a> {
    data: &'a MarketSnapshot,
}

#[derive(Debug, Clone, Serialize)]
struct PromptRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct AssistantReply {
    reply: String,
}
