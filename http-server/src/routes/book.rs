use axum::{Json, extract::State, http::StatusCode};
use orderdesk::poller::BookView;
use orderdesk::types::Side;
use serde::Deserialize;

use super::{CommandResponse, command_result, unavailable};
use crate::AppState;

// Click on a displayed price level
#[derive(Deserialize)]
pub struct PriceClickRequest {
    pub side: Side,
    pub price: f64,
}

// Get orderbook panel endpoint
pub async fn get_orderbook(
    State(state): State<AppState>,
) -> Result<Json<BookView>, (StatusCode, Json<CommandResponse>)> {
    let view = state.session.view().await.map_err(unavailable)?;
    Ok(Json(view.book))
}

// Price level click endpoint, feeds the order form
pub async fn click_price_level(
    State(state): State<AppState>,
    Json(payload): Json<PriceClickRequest>,
) -> (StatusCode, Json<CommandResponse>) {
    if !payload.price.is_finite() || payload.price <= 0.0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(CommandResponse::failed("Price must be greater than 0")),
        );
    }

    command_result(
        state
            .session
            .select_price_level(payload.side, payload.price)
            .await,
        StatusCode::OK,
        "Order form prefilled",
    )
}

// Dismiss the orderbook error annotation
pub async fn dismiss_book_error(State(state): State<AppState>) -> (StatusCode, Json<CommandResponse>) {
    command_result(
        state.session.dismiss_book_error().await,
        StatusCode::OK,
        "Orderbook error dismissed",
    )
}
