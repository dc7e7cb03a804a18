use crate::engine::{DashboardView, EngineCommand, EngineHandle, FrameView, MetricsUpdate};
use crate::subscription::protocol::{
    ClientMessage, DashboardUpdateMessage, ErrorMessage, FrameUpdateMessage, MetricsUpdateMessage,
};
use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Manages a single presentation WebSocket connection
pub struct ConnectionManager {
    engine: EngineHandle,
}

impl ConnectionManager {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Handle WebSocket connection lifecycle
    pub async fn handle(self, mut socket: WebSocket) {
        let mut dashboard_rx = self.engine.subscribe_dashboard();
        let mut frame_rx = self.engine.subscribe_frames();
        let mut metrics_rx = self.engine.subscribe_metrics();

        self.engine.metrics().increment_ws_connection();
        info!("WebSocket connection established");

        // Current state first so the client never starts blank
        let current = DashboardUpdateMessage::from(self.engine.latest_view());
        if let Err(e) = send_json(&mut socket, &current).await {
            error!(error = %e, "Failed to send initial dashboard state");
        } else {
            self.run(&mut socket, &mut dashboard_rx, &mut frame_rx, &mut metrics_rx)
                .await;
        }

        self.engine.metrics().decrement_ws_connection();
        info!("WebSocket connection closed");
    }

    async fn run(
        &self,
        socket: &mut WebSocket,
        dashboard_rx: &mut broadcast::Receiver<DashboardView>,
        frame_rx: &mut broadcast::Receiver<FrameView>,
        metrics_rx: &mut broadcast::Receiver<MetricsUpdate>,
    ) {
        loop {
            tokio::select! {
                // Handle incoming client messages
                Some(msg) = socket.recv() => {
                    match msg {
                        Ok(Message::Text(text)) => {
                            if let Err(e) = self.handle_client_message(socket, &text).await {
                                error!(error = %e, "Error handling client message");
                            }
                        }
                        Ok(Message::Close(_)) => {
                            info!("WebSocket client disconnected");
                            break;
                        }
                        Ok(Message::Ping(data)) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Ok(_) => {
                            // Ignore binary, pong messages
                        }
                        Err(e) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                result = dashboard_rx.recv() => {
                    match result {
                        Ok(view) => {
                            if let Err(e) = send_json(socket, &DashboardUpdateMessage::from(view)).await {
                                error!(error = %e, "Failed to send dashboard update");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped = skipped, "WebSocket lagged, skipped dashboard updates");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Dashboard channel closed");
                            break;
                        }
                    }
                }

                result = frame_rx.recv() => {
                    match result {
                        Ok(frame) => {
                            if let Err(e) = send_json(socket, &FrameUpdateMessage::from(frame)).await {
                                error!(error = %e, "Failed to send frame update");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // Only the latest frame matters
                            debug!(skipped = skipped, "WebSocket lagged, dropped frames");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Frame channel closed");
                            break;
                        }
                    }
                }

                result = metrics_rx.recv() => {
                    match result {
                        Ok(update) => {
                            if let Err(e) = send_json(socket, &MetricsUpdateMessage::from(update)).await {
                                error!(error = %e, "Failed to send metrics update");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped = skipped, "Metrics lagged, skipped updates");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Metrics channel closed");
                            break;
                        }
                    }
                }

                else => {
                    break;
                }
            }
        }
    }

    /// Forward a client message to the engine, answering parse failures with an error message
    async fn handle_client_message(&self, socket: &mut WebSocket, text: &str) -> anyhow::Result<()> {
        let msg: ClientMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Invalid client message");
                send_json(socket, &ErrorMessage::new(format!("invalid message: {}", e))).await?;
                return Ok(());
            }
        };

        debug!(message = ?msg, "Client message");
        self.engine.send(EngineCommand::from(msg)).await
    }
}

async fn send_json<T: Serialize>(socket: &mut WebSocket, msg: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}
