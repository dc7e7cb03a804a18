// NATS snapshot feed

mod decode;

pub use decode::{decode_snapshot, FeedError};

use crate::engine::EngineHandle;
use anyhow::{Context, Result};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{error, info, warn};

/// NATS configuration
#[derive(Clone, Debug, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Subject on which full device snapshots are published
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_url() -> String {
    std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

fn default_subject() -> String {
    "airflux.snapshots".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            subject: default_subject(),
        }
    }
}

/// Subscribes to the snapshot subject and forwards each decoded payload to the engine
pub struct SnapshotFeed {
    client: async_nats::Client,
    config: FeedConfig,
}

impl SnapshotFeed {
    /// Connect to NATS. Reconnection after this point is handled by the client.
    pub async fn connect(config: FeedConfig) -> Result<Self> {
        info!("Connecting to NATS at {}", config.url);

        let client = async_nats::connect(&config.url)
            .await
            .context("Failed to connect to NATS")?;

        Ok(Self { client, config })
    }

    /// Process messages until the subscription ends or the engine stops
    pub async fn run(self, engine: EngineHandle) -> Result<()> {
        let mut subscriber = self
            .client
            .subscribe(self.config.subject.clone())
            .await
            .with_context(|| format!("Failed to subscribe to '{}'", self.config.subject))?;

        info!(subject = %self.config.subject, "Snapshot feed subscribed");

        while let Some(message) = subscriber.next().await {
            let snapshot = match decode_snapshot(&message.payload) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!(error = %e, subject = %message.subject, "Failed to decode snapshot, skipping");
                    continue;
                }
            };

            if engine.submit_snapshot(snapshot).await.is_err() {
                info!("Engine stopped, snapshot feed exiting");
                return Ok(());
            }
        }

        warn!("Snapshot feed subscription ended");
        Ok(())
    }
}
