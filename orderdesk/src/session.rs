//! One dashboard session: a single task owning the polling controller, the
//! order form and the prefill bridge.
//!
//! Everything that mutates session state runs on that task. Network calls
//! run on spawned tasks and report back through channels, so fetch results
//! are checked against the liveness token on the session task before they
//! touch any state.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::config::DeskConfig;
use crate::error::{DeskError, TradeError};
use crate::form::{FormField, FormView, Notification, OrderForm, PrefillOutcome, SubmitAttempt};
use crate::poller::{BookUpdate, BookView, OrderbookPoller, RefreshResult, spawn_refresh_cycle};
use crate::prefill::{self, PrefillBridge, PrefillEvent};
use crate::service::{MarketDataService, TradeService};
use crate::types::{Asset, Side, TradeResponse};

const COMMAND_BUFFER: usize = 256;
const NOTIFICATION_BUFFER: usize = 100;

/// Full presentational state of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub book: BookView,
    pub form: FormView,
}

#[derive(Debug)]
pub enum SessionCommand {
    SelectAsset { asset: Asset },
    SetSide { side: Side },
    EditField { field: FormField, value: String },
    Submit,
    SelectPriceLevel { side: Side, price: f64 },
    DismissNotification,
    DismissBookError,
    View { reply: oneshot::Sender<SessionView> },
    Shutdown,
}

/// Cloneable handle used by collaborators to drive a running session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    notifications: broadcast::Sender<Notification>,
}

impl SessionHandle {
    async fn send(&self, command: SessionCommand) -> Result<(), DeskError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DeskError::SessionClosed)
    }

    pub async fn select_asset(&self, asset: Asset) -> Result<(), DeskError> {
        self.send(SessionCommand::SelectAsset { asset }).await
    }

    pub async fn set_side(&self, side: Side) -> Result<(), DeskError> {
        self.send(SessionCommand::SetSide { side }).await
    }

    pub async fn edit_field(&self, field: FormField, value: impl Into<String>) -> Result<(), DeskError> {
        self.send(SessionCommand::EditField {
            field,
            value: value.into(),
        })
        .await
    }

    pub async fn submit(&self) -> Result<(), DeskError> {
        self.send(SessionCommand::Submit).await
    }

    pub async fn select_price_level(&self, side: Side, price: f64) -> Result<(), DeskError> {
        self.send(SessionCommand::SelectPriceLevel { side, price }).await
    }

    pub async fn dismiss_notification(&self) -> Result<(), DeskError> {
        self.send(SessionCommand::DismissNotification).await
    }

    pub async fn dismiss_book_error(&self) -> Result<(), DeskError> {
        self.send(SessionCommand::DismissBookError).await
    }

    pub async fn view(&self) -> Result<SessionView, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::View { reply }).await?;
        rx.await.map_err(|_| DeskError::SessionClosed)
    }

    /// Stops the session; outstanding refresh results are discarded
    pub async fn shutdown(&self) -> Result<(), DeskError> {
        self.send(SessionCommand::Shutdown).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }
}

struct Session {
    poller: OrderbookPoller,
    form: OrderForm,
    bridge: PrefillBridge,
    market: Arc<dyn MarketDataService>,
    trades: Arc<dyn TradeService>,
    refresh_interval: Duration,
    refresh_tx: mpsc::Sender<RefreshResult>,
    submit_tx: mpsc::Sender<Result<TradeResponse, TradeError>>,
    notifications: broadcast::Sender<Notification>,
}

/// Spawns a session and selects the configured default asset
pub fn start_session(
    config: &DeskConfig,
    market: Arc<dyn MarketDataService>,
    trades: Arc<dyn TradeService>,
) -> SessionHandle {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (refresh_tx, refresh_rx) = mpsc::channel(COMMAND_BUFFER);
    let (submit_tx, submit_rx) = mpsc::channel(1);
    let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);
    let (bridge, prefill_rx) = prefill::channel();

    let session = Session {
        poller: OrderbookPoller::new(),
        form: OrderForm::new(config.default_asset.clone(), config.prefill_policy),
        bridge,
        market,
        trades,
        refresh_interval: config.refresh_interval(),
        refresh_tx,
        submit_tx,
        notifications: notifications.clone(),
    };

    tracing::info!(
        asset = %config.default_asset,
        prefill_policy = %config.prefill_policy,
        refresh_interval_ms = config.refresh_interval_ms,
        "Session started"
    );

    let default_asset = config.default_asset.clone();
    tokio::spawn(session.run(default_asset, command_rx, refresh_rx, submit_rx, prefill_rx));

    SessionHandle {
        commands: command_tx,
        notifications,
    }
}

impl Session {
    async fn run(
        mut self,
        initial_asset: Asset,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut refreshes: mpsc::Receiver<RefreshResult>,
        mut submissions: mpsc::Receiver<Result<TradeResponse, TradeError>>,
        mut prefills: mpsc::UnboundedReceiver<PrefillEvent>,
    ) {
        self.select_asset(initial_asset);

        loop {
            // A click queues its prefill; it must land before the next command
            tokio::select! {
                biased;
                Some(event) = prefills.recv() => self.on_prefill(event),
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(outcome) = submissions.recv() => self.on_submit_settled(outcome),
                Some(result) = refreshes.recv() => self.on_refresh(result),
            }
        }

        self.poller.teardown();
        tracing::info!("Session stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SelectAsset { asset } => {
                if self.poller.asset() != Some(&asset) {
                    self.select_asset(asset);
                }
            }
            SessionCommand::SetSide { side } => self.form.set_side(side),
            SessionCommand::EditField { field, value } => self.form.edit(field, value),
            SessionCommand::Submit => self.submit(),
            SessionCommand::SelectPriceLevel { side, price } => {
                // Delivered back to this task through the prefill channel
                self.bridge.select_level(side, price);
            }
            SessionCommand::DismissNotification => self.form.dismiss(),
            SessionCommand::DismissBookError => self.poller.dismiss_error(),
            SessionCommand::View { reply } => {
                let _ = reply.send(SessionView {
                    book: self.poller.view(),
                    form: self.form.view(),
                });
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn select_asset(&mut self, asset: Asset) {
        let token = self.poller.select_asset(asset.clone());
        self.form.set_asset(asset);
        spawn_refresh_cycle(
            self.market.clone(),
            token,
            self.refresh_interval,
            self.refresh_tx.clone(),
        );
    }

    fn on_refresh(&mut self, result: RefreshResult) {
        match self.poller.commit(&result.token, result.outcome) {
            Ok(BookUpdate::ErrorRaised(message)) => self.notify(Notification::error(message)),
            Ok(BookUpdate::Replaced | BookUpdate::ErrorPersisting) => {}
            Err(_stale) => {}
        }
    }

    fn on_prefill(&mut self, event: PrefillEvent) {
        match self.form.apply_prefill(&event) {
            PrefillOutcome::AdoptedAndSubmit => self.submit(),
            PrefillOutcome::Adopted | PrefillOutcome::Ignored => {}
        }
    }

    fn submit(&mut self) {
        match self.form.begin_submit() {
            SubmitAttempt::Ignored => {}
            SubmitAttempt::Rejected(err) => {
                self.notify(Notification::error(err.to_string()));
                self.form.result_shown();
            }
            SubmitAttempt::Ready(request) => {
                let trades = self.trades.clone();
                let submit_tx = self.submit_tx.clone();
                tokio::spawn(async move {
                    let outcome = trades.place_trade(&request).await;
                    let _ = submit_tx.send(outcome).await;
                });
            }
        }
    }

    fn on_submit_settled(&mut self, outcome: Result<TradeResponse, TradeError>) {
        if let Some(notification) = self.form.finish_submit(outcome) {
            self.notify(notification);
            self.form.result_shown();
        }
    }

    fn notify(&self, notification: Notification) {
        // No subscribers is fine; the form still carries the message
        let _ = self.notifications.send(notification);
    }
}
