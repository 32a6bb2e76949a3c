//! Realtime change feed over the Phoenix channel websocket.
//!
//! Joins one channel per table with a `postgres_changes` INSERT filter and
//! republishes every change frame on a broadcast channel. Heartbeats go to
//! the `phoenix` topic every 30 seconds.

use std::time::Duration;

use broto_common::{AppError, AppResult};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::client::BackendClient;

/// Interval between heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

const EVENT_CAPACITY: usize = 64;

/// A row inserted into a watched table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Table the row was written to.
    pub table: String,
    /// Change type, e.g. `INSERT`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The new row.
    #[serde(default)]
    pub record: Value,
}

/// Realtime client.
#[derive(Clone)]
pub struct RealtimeClient {
    client: BackendClient,
    events: broadcast::Sender<ChangeEvent>,
}

/// Running socket task; the connection closes when this is dropped.
pub struct RealtimeHandle {
    task: JoinHandle<()>,
}

impl RealtimeHandle {
    /// Whether the socket task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl RealtimeClient {
    /// Create a new realtime client.
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { client, events }
    }

    /// Receive change events from every joined table.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Websocket URL for the project.
    pub fn socket_url(&self) -> AppResult<Url> {
        let mut url = self.client.endpoint("realtime/v1/websocket")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| AppError::Realtime(format!("Cannot use {scheme} for {url}")))?;
        url.query_pairs_mut()
            .append_pair("apikey", self.client.anon_key())
            .append_pair("vsn", "1.0.0");
        Ok(url)
    }

    /// Open the socket and join INSERT feeds for `tables`.
    pub async fn connect(&self, tables: &[&str]) -> AppResult<RealtimeHandle> {
        let url = self.socket_url()?;
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| AppError::Realtime(format!("Websocket connect failed: {e}")))?;
        info!(tables = ?tables, "Realtime connected");

        let token = self
            .client
            .access_token()
            .await
            .unwrap_or_else(|| self.client.anon_key().to_string());
        let tables: Vec<String> = tables.iter().map(ToString::to_string).collect();
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            let (mut write, mut read) = socket.split();
            let mut next_ref: u64 = 1;

            for table in &tables {
                let join = join_message(table, &token, next_ref);
                next_ref += 1;
                if let Err(e) = write.send(Message::Text(join.to_string())).await {
                    warn!(error = %e, table, "Failed to join realtime channel");
                    return;
                }
            }

            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            heartbeat.tick().await;

            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        let beat = heartbeat_message(next_ref);
                        next_ref += 1;
                        if let Err(e) = write.send(Message::Text(beat.to_string())).await {
                            warn!(error = %e, "Realtime heartbeat failed");
                            break;
                        }
                    }
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(event) = parse_change(&text) {
                                debug!(table = %event.table, "Realtime change");
                                let _ = events.send(event);
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            let _ = write.send(Message::Pong(payload)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Realtime socket closed");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "Realtime socket error");
                            break;
                        }
                    },
                }
            }
        });

        Ok(RealtimeHandle { task })
    }
}

/// Channel topic used for a table.
#[must_use]
pub fn topic_for(table: &str) -> String {
    format!("realtime:public:{table}")
}

/// `phx_join` frame subscribing to INSERTs on `table`.
#[must_use]
pub fn join_message(table: &str, access_token: &str, message_ref: u64) -> Value {
    json!({
        "topic": topic_for(table),
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "INSERT", "schema": "public", "table": table }
                ]
            },
            "access_token": access_token
        },
        "ref": message_ref.to_string()
    })
}

/// Heartbeat frame.
#[must_use]
pub fn heartbeat_message(message_ref: u64) -> Value {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": message_ref.to_string()
    })
}

/// Extract a change event from a socket frame. Other frames yield `None`.
#[must_use]
pub fn parse_change(frame: &str) -> Option<ChangeEvent> {
    let value: Value = serde_json::from_str(frame).ok()?;
    if value["event"] != "postgres_changes" {
        return None;
    }
    serde_json::from_value(value["payload"]["data"].clone()).ok()
}
