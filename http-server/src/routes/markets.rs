use axum::{Json, extract::State, http::StatusCode};
use orderdesk::types::Asset;
use serde::{Deserialize, Serialize};

use super::{CommandResponse, command_result, unavailable};
use crate::AppState;

// Assets offered to the asset picker
#[derive(Debug, Serialize)]
pub struct MarketsResponse {
    pub assets: Vec<Asset>,
    pub selected: Option<Asset>,
}

// Asset selection request
#[derive(Deserialize)]
pub struct SelectMarketRequest {
    pub asset: Asset,
}

pub async fn get_markets(
    State(state): State<AppState>,
) -> Result<Json<MarketsResponse>, (StatusCode, Json<CommandResponse>)> {
    let view = state.session.view().await.map_err(unavailable)?;

    Ok(Json(MarketsResponse {
        assets: state.config.assets.clone(),
        selected: view.book.asset,
    }))
}

// Select asset endpoint
pub async fn select_market(
    State(state): State<AppState>,
    Json(payload): Json<SelectMarketRequest>,
) -> (StatusCode, Json<CommandResponse>) {
    if !state.config.is_known_asset(&payload.asset) {
        return (
            StatusCode::BAD_REQUEST,
            Json(CommandResponse::failed(format!(
                "Asset '{}' not supported",
                payload.asset
            ))),
        );
    }

    command_result(
        state.session.select_asset(payload.asset).await,
        StatusCode::OK,
        "Asset selected",
    )
}
