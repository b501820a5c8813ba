//! Order entry form: text fields, anchor tracking, validation and the
//! submission state machine.
//!
//! Submission is split in two halves so that the network call can run
//! outside the controller: [`OrderForm::begin_submit`] validates and flips
//! the busy flag, [`OrderForm::finish_submit`] applies the outcome.

use serde::{Deserialize, Serialize};

use crate::engine::{self, AnchorField, parse_positive};
use crate::error::{TradeError, ValidationError};
use crate::prefill::{PrefillEvent, PrefillPolicy};
use crate::types::{Asset, OrderType, Side, TradeRequest, TradeResponse};

/// User-facing text of the form. Kept as typed so partial input survives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub side: Side,
    pub price: String,
    pub quantity: String,
    pub notional: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Price,
    Quantity,
    Notional,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Success,
    Error,
}

/// Message handed to the notification display collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub variant: NotificationVariant,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            variant: NotificationVariant::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            variant: NotificationVariant::Error,
            message: message.into(),
        }
    }
}

/// Result of asking the form to submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAttempt {
    /// A submission is already in flight; the request was dropped
    Ignored,
    /// Validation failed, no network call should be made
    Rejected(ValidationError),
    /// Validation passed; send this request and report back via `finish_submit`
    Ready(TradeRequest),
}

/// Result of observing a prefill event
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrefillOutcome {
    /// Sequence already seen
    Ignored,
    Adopted,
    /// Adopted, and the policy asks for an immediate submission
    AdoptedAndSubmit,
}

/// Serializable snapshot of the form for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub asset: Asset,
    pub state: FormState,
    pub anchor: AnchorField,
    pub phase: SubmitPhase,
    pub busy: bool,
    pub notification: Option<Notification>,
}

pub struct OrderForm {
    asset: Asset,
    state: FormState,
    anchor: AnchorField,
    phase: SubmitPhase,
    notification: Option<Notification>,
    last_prefill: u64,
    policy: PrefillPolicy,
}

impl OrderForm {
    pub fn new(asset: Asset, policy: PrefillPolicy) -> Self {
        OrderForm {
            asset,
            state: FormState::default(),
            anchor: AnchorField::None,
            phase: SubmitPhase::Idle,
            notification: None,
            last_prefill: 0,
            policy,
        }
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn anchor(&self) -> AnchorField {
        self.anchor
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == SubmitPhase::Submitting
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn policy(&self) -> PrefillPolicy {
        self.policy
    }

    pub fn view(&self) -> FormView {
        FormView {
            asset: self.asset.clone(),
            state: self.state.clone(),
            anchor: self.anchor,
            phase: self.phase,
            busy: self.is_busy(),
            notification: self.notification.clone(),
        }
    }

    /// Follows the asset selection; field text is kept
    pub fn set_asset(&mut self, asset: Asset) {
        self.asset = asset;
    }

    pub fn set_side(&mut self, side: Side) {
        self.state.side = side;
        self.on_input_changed();
    }

    /// Applies a user edit. Editing quantity or notional makes it the anchor.
    pub fn edit(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Price => self.state.price = value,
            FormField::Quantity => {
                self.state.quantity = value;
                self.anchor = AnchorField::Quantity;
            }
            FormField::Notional => {
                self.state.notional = value;
                self.anchor = AnchorField::Notional;
            }
        }
        self.on_input_changed();
    }

    /// Adopts side and price from a price-level selection.
    /// Events whose sequence was already observed are ignored.
    pub fn apply_prefill(&mut self, event: &PrefillEvent) -> PrefillOutcome {
        if event.sequence <= self.last_prefill {
            return PrefillOutcome::Ignored;
        }
        self.last_prefill = event.sequence;

        self.state.side = event.side;
        self.state.price = engine::format_number(event.price);
        self.anchor = AnchorField::None;
        self.on_input_changed();

        tracing::debug!(
            sequence = event.sequence,
            side = %event.side,
            price = event.price,
            "Prefill adopted"
        );

        match self.policy {
            PrefillPolicy::PrefillOnly => PrefillOutcome::Adopted,
            PrefillPolicy::PrefillAndSubmit => {
                self.reestablish_basis();
                PrefillOutcome::AdoptedAndSubmit
            }
        }
    }

    /// Clears the displayed result and returns to Idle
    pub fn dismiss(&mut self) {
        self.notification = None;
        if matches!(self.phase, SubmitPhase::Succeeded | SubmitPhase::Failed) {
            self.phase = SubmitPhase::Idle;
        }
    }

    /// Validates the form and, when it passes, marks the form busy and hands
    /// back the request to send. While a submission is in flight this is a no-op.
    pub fn begin_submit(&mut self) -> SubmitAttempt {
        if self.is_busy() {
            tracing::debug!("Submit ignored, a submission is already in flight");
            return SubmitAttempt::Ignored;
        }

        self.notification = None;
        self.phase = SubmitPhase::Validating;

        match self.validate() {
            Ok(request) => {
                self.phase = SubmitPhase::Submitting;
                tracing::info!(
                    asset = %request.asset,
                    side = %request.side,
                    price = request.price,
                    quantity = request.quantity,
                    "Submitting limit order"
                );
                SubmitAttempt::Ready(request)
            }
            Err(err) => {
                self.phase = SubmitPhase::Failed;
                self.notification = Some(Notification::error(err.to_string()));
                SubmitAttempt::Rejected(err)
            }
        }
    }

    /// Applies the outcome of the in-flight submission and returns the
    /// notification to display. Outcomes arriving while nothing is in flight
    /// are dropped.
    pub fn finish_submit(
        &mut self,
        outcome: Result<TradeResponse, TradeError>,
    ) -> Option<Notification> {
        if !self.is_busy() {
            tracing::warn!("Submission outcome arrived with no submission in flight");
            return None;
        }

        let notification = match outcome {
            Ok(response) => {
                tracing::info!(id = %response.id, side = %response.side, "Order placed");
                self.phase = SubmitPhase::Succeeded;
                self.state.quantity.clear();
                self.state.notional.clear();
                self.anchor = AnchorField::None;
                Notification::success(format!(
                    "Order placed successfully (id={}, side={}, quantity={}).",
                    response.id,
                    response.side,
                    engine::format_number(response.quantity)
                ))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Order rejected");
                self.phase = SubmitPhase::Failed;
                Notification::error(err.to_string())
            }
        };

        self.notification = Some(notification.clone());
        Some(notification)
    }

    /// Settles a finished result back to Idle once it has been displayed.
    /// The message stays until dismissed or replaced by an edit.
    pub fn result_shown(&mut self) {
        if matches!(self.phase, SubmitPhase::Succeeded | SubmitPhase::Failed) {
            self.phase = SubmitPhase::Idle;
        }
    }

    fn validate(&self) -> Result<TradeRequest, ValidationError> {
        let price = parse_positive(&self.state.price).ok_or(ValidationError::NonPositivePrice)?;
        let quantity =
            parse_positive(&self.state.quantity).ok_or(ValidationError::NonPositiveQuantity)?;
        let notional =
            parse_positive(&self.state.notional).ok_or(ValidationError::NonPositiveNotional)?;

        Ok(TradeRequest {
            asset: self.asset.clone(),
            side: self.state.side,
            order_type: OrderType::Limit,
            price,
            quantity,
            notional,
        })
    }

    // Observer on every input change: drop a finished result, then rederive
    fn on_input_changed(&mut self) {
        if !self.is_busy() {
            self.phase = SubmitPhase::Idle;
            self.notification = None;
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        let next = engine::reconcile(
            &self.state.price,
            &self.state.quantity,
            &self.state.notional,
            self.anchor,
        );
        self.state.quantity = next.quantity;
        self.state.notional = next.notional;
    }

    // Auto-submit needs a basis: prefer the quantity the user already typed
    fn reestablish_basis(&mut self) {
        if parse_positive(&self.state.quantity).is_some() {
            self.anchor = AnchorField::Quantity;
        } else if parse_positive(&self.state.notional).is_some() {
            self.anchor = AnchorField::Notional;
        }
        self.recompute();
    }
}
