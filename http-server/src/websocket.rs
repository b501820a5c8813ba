use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use orderdesk::form::{Notification, NotificationVariant};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::AppState;

// Messages pushed to the notification display
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "connection_established")]
    ConnectionEstablished { message: String },
    #[serde(rename = "notification")]
    Notification {
        variant: NotificationVariant,
        message: String,
    },
}

impl From<Notification> for ServerMessage {
    fn from(notification: Notification) -> Self {
        ServerMessage::Notification {
            variant: notification.variant,
            message: notification.message,
        }
    }
}

// Messages the notification display may send back
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Dismiss,
}

// WebSocket handler
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    tracing::info!("Notification WebSocket connected");

    // Subscribe before anything is sent so no notification slips through
    let mut notifications = BroadcastStream::new(state.session.subscribe());
    let (mut sender, mut receiver) = socket.split();

    let connection_msg = ServerMessage::ConnectionEstablished {
        message: "Successfully connected to notifications".to_string(),
    };
    if let Ok(msg_text) = serde_json::to_string(&connection_msg) {
        if sender.send(Message::Text(msg_text.into())).await.is_err() {
            tracing::warn!("Failed to send connection message");
            return;
        }
    }

    // Handle dismissals coming back from the client
    let session = state.session.clone();
    let mut incoming_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Dismiss) => {
                        if session.dismiss_notification().await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!("Ignoring unrecognised client message: {}", e);
                    }
                },
                Ok(Message::Close(_)) => {
                    tracing::info!("Notification WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::error!("Notification WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Forward session notifications
    let mut outgoing_task = tokio::spawn(async move {
        while let Some(item) = notifications.next().await {
            let notification = match item {
                Ok(notification) => notification,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!("Notification client lagged, {} messages skipped", skipped);
                    continue;
                }
            };

            match serde_json::to_string(&ServerMessage::from(notification)) {
                Ok(msg_text) => {
                    if sender.send(Message::Text(msg_text.into())).await.is_err() {
                        tracing::warn!("Failed to send notification");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize notification: {}", e);
                }
            }
        }
    });

    // Wait for either side to finish
    tokio::select! {
        _ = &mut incoming_task => {
            tracing::debug!("Incoming notification task completed");
            outgoing_task.abort();
        }
        _ = &mut outgoing_task => {
            tracing::debug!("Outgoing notification task completed");
            incoming_task.abort();
        }
    }

    tracing::info!("Notification WebSocket closed");
}
