use axum::{Json, extract::State, http::StatusCode};
use orderdesk::form::FormField;
use orderdesk::session::SessionView;
use orderdesk::types::Side;
use serde::Deserialize;

use super::{CommandResponse, command_result, unavailable};
use crate::AppState;

// Side change request
#[derive(Deserialize)]
pub struct SetSideRequest {
    pub side: Side,
}

// Field edit request, `value` is the raw text typed by the user
#[derive(Deserialize)]
pub struct EditFieldRequest {
    pub field: FormField,
    pub value: String,
}

// Get full session view endpoint
pub async fn get_session(
    State(state): State<AppState>,
) -> Result<Json<SessionView>, (StatusCode, Json<CommandResponse>)> {
    let view = state.session.view().await.map_err(unavailable)?;
    Ok(Json(view))
}

pub async fn set_side(
    State(state): State<AppState>,
    Json(payload): Json<SetSideRequest>,
) -> (StatusCode, Json<CommandResponse>) {
    command_result(
        state.session.set_side(payload.side).await,
        StatusCode::OK,
        "Side updated",
    )
}

pub async fn edit_field(
    State(state): State<AppState>,
    Json(payload): Json<EditFieldRequest>,
) -> (StatusCode, Json<CommandResponse>) {
    command_result(
        state.session.edit_field(payload.field, payload.value).await,
        StatusCode::OK,
        "Field updated",
    )
}

// Submit order endpoint; the outcome arrives as a notification
pub async fn submit_order(State(state): State<AppState>) -> (StatusCode, Json<CommandResponse>) {
    command_result(
        state.session.submit().await,
        StatusCode::ACCEPTED,
        "Order submission requested",
    )
}

// Notification onDismiss
pub async fn dismiss_notification(
    State(state): State<AppState>,
) -> (StatusCode, Json<CommandResponse>) {
    command_result(
        state.session.dismiss_notification().await,
        StatusCode::OK,
        "Notification dismissed",
    )
}
