use async_trait::async_trait;

use crate::error::{NetworkError, TradeError};
use crate::types::{Asset, OrderbookSnapshot, TradeRequest, TradeResponse};

/// Source of pre-aggregated orderbook snapshots
#[async_trait]
pub trait MarketDataService: Send + Sync {
    async fn fetch_orderbook(&self, asset: &Asset) -> Result<OrderbookSnapshot, NetworkError>;
}

/// Accepts limit orders
#[async_trait]
pub trait TradeService: Send + Sync {
    async fn place_trade(&self, request: &TradeRequest) -> Result<TradeResponse, TradeError>;
}
