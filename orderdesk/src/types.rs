use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Asset identifier as understood by the upstream market data service (e.g. "BTC")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(String);

impl Asset {
    pub fn new(symbol: impl Into<String>) -> Self {
        Asset(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Asset {
    fn from(symbol: &str) -> Self {
        Asset::new(symbol)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[default]
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    #[default]
    Limit,
}

/// One aggregated level of the book as delivered by the market data service
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Full replacement view of one asset's book.
/// Bids are expected descending by price, asks ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookSnapshot {
    pub asset: Asset,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

impl OrderbookSnapshot {
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|level| level.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|level| level.price)
    }

    pub fn spread(&self) -> Option<f64> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    /// Checks the side ordering contract. A violation is a data-quality
    /// defect upstream; callers report it but never reorder.
    pub fn is_well_ordered(&self) -> bool {
        let bids_descending = self.bids.windows(2).all(|w| w[0].price >= w[1].price);
        let asks_ascending = self.asks.windows(2).all(|w| w[0].price <= w[1].price);
        bids_descending && asks_ascending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub asset: Asset,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub price: f64,
    pub quantity: f64,
    pub notional: f64,
}

/// Identifier assigned by the exchange; numeric or textual depending on upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderId {
    Number(u64),
    Text(String),
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderId::Number(id) => write!(f, "{id}"),
            OrderId::Text(id) => f.write_str(id),
        }
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        OrderId::Number(id)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        OrderId::Text(id.to_string())
    }
}

/// Server acknowledgement of a placed trade. Only `id`, `side` and
/// `quantity` are surfaced; anything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResponse {
    pub id: OrderId,
    pub side: Side,
    pub quantity: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
