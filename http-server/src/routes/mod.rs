use axum::{Json, http::StatusCode};
use orderdesk::error::DeskError;
use serde::Serialize;

pub mod book;
pub mod markets;
pub mod orders;

// Generic acknowledgement for commands forwarded to the session
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// Maps the outcome of forwarding a command to an HTTP response
pub fn command_result(
    result: Result<(), DeskError>,
    status: StatusCode,
    message: &str,
) -> (StatusCode, Json<CommandResponse>) {
    match result {
        Ok(()) => (status, Json(CommandResponse::ok(message))),
        Err(e) => unavailable(e),
    }
}

pub fn unavailable(err: DeskError) -> (StatusCode, Json<CommandResponse>) {
    tracing::error!("Session command failed: {}", err);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(CommandResponse::failed(err.to_string())),
    )
}
