//! Orderbook polling with a staleness guard.
//!
//! Every refresh cycle is bound to a [`LivenessToken`] taken when the cycle
//! for an asset starts. Selecting another asset or tearing the poller down
//! moves the epoch forward, which invalidates every outstanding token. In
//! flight fetches are not aborted; their results are simply refused.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::{NetworkError, StaleResultDiscarded};
use crate::service::MarketDataService;
use crate::types::{Asset, OrderbookSnapshot};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

/// Marker tying a refresh to the asset selection it was started for
#[derive(Debug, Clone)]
pub struct LivenessToken {
    asset: Asset,
    epoch: u64,
    current: watch::Receiver<u64>,
}

impl LivenessToken {
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// False once the poller has moved on or has been dropped
    pub fn is_live(&self) -> bool {
        self.current.has_changed().is_ok() && *self.current.borrow() == self.epoch
    }

    /// Resolves when the token is invalidated
    pub async fn invalidated(&mut self) {
        let epoch = self.epoch;
        // An error means the poller is gone, which also invalidates
        let _ = self.current.wait_for(|current| *current != epoch).await;
    }
}

/// One settled fetch, tagged with the token of its cycle
#[derive(Debug)]
pub struct RefreshResult {
    pub token: LivenessToken,
    pub outcome: Result<OrderbookSnapshot, NetworkError>,
}

/// Effect of committing a refresh result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookUpdate {
    Replaced,
    /// First failure after a success (or after selection); carries the message
    ErrorRaised(String),
    ErrorPersisting,
}

/// Serializable state of the book panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookView {
    pub asset: Option<Asset>,
    pub loading: bool,
    pub snapshot: Option<OrderbookSnapshot>,
    pub error: Option<String>,
}

pub struct OrderbookPoller {
    asset: Option<Asset>,
    epoch: u64,
    epoch_tx: watch::Sender<u64>,
    torn_down: bool,
    snapshot: Option<OrderbookSnapshot>,
    error: Option<String>,
}

impl Default for OrderbookPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderbookPoller {
    pub fn new() -> Self {
        let (epoch_tx, _) = watch::channel(0);
        OrderbookPoller {
            asset: None,
            epoch: 0,
            epoch_tx,
            torn_down: false,
            snapshot: None,
            error: None,
        }
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    pub fn snapshot(&self) -> Option<&OrderbookSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Loading is shown only until the current asset has its first snapshot
    pub fn is_loading(&self) -> bool {
        !self.torn_down && self.asset.is_some() && self.snapshot.is_none()
    }

    pub fn view(&self) -> BookView {
        BookView {
            asset: self.asset.clone(),
            loading: self.is_loading(),
            snapshot: self.snapshot.clone(),
            error: self.error.clone(),
        }
    }

    /// Starts over for `asset`: invalidates the previous cycle, drops the
    /// displayed snapshot and returns the token for the new cycle.
    pub fn select_asset(&mut self, asset: Asset) -> LivenessToken {
        self.advance_epoch();
        self.torn_down = false;
        self.asset = Some(asset.clone());
        self.snapshot = None;
        self.error = None;

        tracing::info!(asset = %asset, epoch = self.epoch, "Orderbook refresh cycle started");

        LivenessToken {
            asset,
            epoch: self.epoch,
            current: self.epoch_tx.subscribe(),
        }
    }

    /// Invalidates the current cycle for good
    pub fn teardown(&mut self) {
        self.advance_epoch();
        self.torn_down = true;
        tracing::debug!(epoch = self.epoch, "Orderbook poller torn down");
    }

    pub fn is_current(&self, token: &LivenessToken) -> bool {
        !self.torn_down && token.epoch == self.epoch
    }

    /// Applies a settled fetch if its token is still current.
    /// A failure keeps the last good snapshot and annotates it.
    pub fn commit(
        &mut self,
        token: &LivenessToken,
        outcome: Result<OrderbookSnapshot, NetworkError>,
    ) -> Result<BookUpdate, StaleResultDiscarded> {
        if !self.is_current(token) {
            tracing::debug!(
                asset = %token.asset,
                epoch = token.epoch,
                current_epoch = self.epoch,
                "Discarding stale orderbook result"
            );
            return Err(StaleResultDiscarded);
        }

        match outcome {
            Ok(snapshot) => {
                if !snapshot.is_well_ordered() {
                    tracing::warn!(asset = %token.asset, "Orderbook snapshot violates side ordering");
                }
                tracing::debug!(
                    asset = %token.asset,
                    bids = snapshot.bids.len(),
                    asks = snapshot.asks.len(),
                    "Orderbook refreshed"
                );
                self.snapshot = Some(snapshot);
                self.error = None;
                Ok(BookUpdate::Replaced)
            }
            Err(err) => {
                tracing::warn!(asset = %token.asset, error = %err, "Orderbook refresh failed");
                let message = err.to_string();
                let first = self.error.is_none();
                self.error = Some(message.clone());
                if first {
                    Ok(BookUpdate::ErrorRaised(message))
                } else {
                    Ok(BookUpdate::ErrorPersisting)
                }
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn advance_epoch(&mut self) {
        self.epoch += 1;
        self.epoch_tx.send_replace(self.epoch);
    }
}

/// Fetches once, then again every `interval` after the previous fetch
/// settled, until the token is invalidated or `results` is closed.
pub async fn run_refresh_cycle(
    service: Arc<dyn MarketDataService>,
    mut token: LivenessToken,
    interval: Duration,
    results: mpsc::Sender<RefreshResult>,
) {
    while token.is_live() {
        let outcome = service.fetch_orderbook(token.asset()).await;

        if !token.is_live() {
            tracing::debug!(asset = %token.asset, "Refresh settled after invalidation, dropped");
            break;
        }

        let result = RefreshResult {
            token: token.clone(),
            outcome,
        };
        if results.send(result).await.is_err() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = token.invalidated() => break,
        }
    }
}

pub fn spawn_refresh_cycle(
    service: Arc<dyn MarketDataService>,
    token: LivenessToken,
    interval: Duration,
    results: mpsc::Sender<RefreshResult>,
) -> JoinHandle<()> {
    tokio::spawn(run_refresh_cycle(service, token, interval, results))
}
