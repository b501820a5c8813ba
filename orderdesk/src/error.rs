use thiserror::Error;

/// Local, pre-submission rejection. Blocks the network call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Price must be greater than 0 for a LIMIT order.")]
    NonPositivePrice,
    #[error("Quantity must be greater than 0.")]
    NonPositiveQuantity,
    #[error("Notional must be greater than 0.")]
    NonPositiveNotional,
}

/// Transport failure, or a non-success response without a usable body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("{context}: {status_text}")]
    Status {
        context: &'static str,
        status: u16,
        status_text: String,
    },
    #[error("{context}: {message}")]
    Transport {
        context: &'static str,
        message: String,
    },
    #[error("{context}: invalid response body: {message}")]
    Decode {
        context: &'static str,
        message: String,
    },
}

/// Non-success response carrying a structured `{ "error": "..." }` body.
/// Displays exactly the server-supplied message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// A refresh result whose liveness token was invalidated before it landed.
/// Internal only, never shown to the user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("stale orderbook result discarded")]
pub struct StaleResultDiscarded;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    StaleResultDiscarded(#[from] StaleResultDiscarded),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("session is no longer running")]
    SessionClosed,
}

impl From<TradeError> for DeskError {
    fn from(err: TradeError) -> Self {
        match err {
            TradeError::Api(e) => DeskError::Api(e),
            TradeError::Network(e) => DeskError::Network(e),
        }
    }
}
