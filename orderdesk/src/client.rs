use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{ApiError, DeskError, NetworkError, TradeError};
use crate::service::{MarketDataService, TradeService};
use crate::types::{Asset, OrderbookSnapshot, TradeRequest, TradeResponse};

const FETCH_ORDERBOOK: &str = "Failed to fetch orderbook";
const PLACE_TRADE: &str = "Failed to place trade";

// Structured error body some non-success trade responses carry
#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

/// HTTP client for the upstream exchange API
#[derive(Clone)]
pub struct HttpExchangeClient {
    http: Client,
    base_url: String,
}

impl HttpExchangeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DeskError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(|e| DeskError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn orderbook_url(&self, asset: &Asset) -> String {
        format!("{}/orderbook/{}", self.base_url, asset)
    }

    fn trade_url(&self) -> String {
        format!("{}/trade", self.base_url)
    }
}

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or(status.as_str()).to_string()
}

/// Maps a non-success trade response to the user-facing error.
/// A parseable body with a non-empty `error` wins; otherwise the status text is used.
pub fn trade_error_from_body(status: StatusCode, body: &[u8]) -> TradeError {
    let message = serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.is_empty());

    match message {
        Some(message) => TradeError::Api(ApiError { message }),
        None => TradeError::Network(NetworkError::Status {
            context: PLACE_TRADE,
            status: status.as_u16(),
            status_text: status_text(status),
        }),
    }
}

#[async_trait]
impl MarketDataService for HttpExchangeClient {
    async fn fetch_orderbook(&self, asset: &Asset) -> Result<OrderbookSnapshot, NetworkError> {
        let response = self
            .http
            .get(self.orderbook_url(asset))
            .send()
            .await
            .map_err(|e| NetworkError::Transport {
                context: FETCH_ORDERBOOK,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                context: FETCH_ORDERBOOK,
                status: status.as_u16(),
                status_text: status_text(status),
            });
        }

        response
            .json::<OrderbookSnapshot>()
            .await
            .map_err(|e| NetworkError::Decode {
                context: FETCH_ORDERBOOK,
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl TradeService for HttpExchangeClient {
    async fn place_trade(&self, request: &TradeRequest) -> Result<TradeResponse, TradeError> {
        let response = self
            .http
            .post(self.trade_url())
            .json(request)
            .send()
            .await
            .map_err(|e| NetworkError::Transport {
                context: PLACE_TRADE,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            // A body that cannot be read is treated like one without an error field
            let body = response.bytes().await.unwrap_or_default();
            return Err(trade_error_from_body(status, &body));
        }

        response.json::<TradeResponse>().await.map_err(|e| {
            TradeError::Network(NetworkError::Decode {
                context: PLACE_TRADE,
                message: e.to_string(),
            })
        })
    }
}
