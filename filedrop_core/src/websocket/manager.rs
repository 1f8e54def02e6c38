use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, OwnedSemaphorePermit, RwLock, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WebSocketConfig;
use crate::error::Result;
use crate::websocket::messages::NotificationEvent;

/// Opaque token identifying one registered channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(Uuid);

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug)]
pub struct ClientChannel {
    pub session_id: String,
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<NotificationEvent>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

enum SendOutcome {
    Delivered,
    Closed,
    TimedOut,
}

/// Registry of live client channels and fan-out of notification events.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    channels: Arc<RwLock<HashMap<ChannelHandle, ClientChannel>>>,
    connection_slots: Arc<Semaphore>,
    send_timeout: Duration,
    buffer_size: usize,
    max_connections: usize,
}

impl NotificationHub {
    pub fn new(config: &WebSocketConfig) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            connection_slots: Arc::new(Semaphore::new(config.max_connections)),
            send_timeout: config.send_timeout(),
            buffer_size: config.message_buffer_size,
            max_connections: config.max_connections,
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Claim one of the `max_connections` WebSocket slots. The slot is held
    /// until the returned permit is dropped.
    pub fn try_reserve_slot(&self) -> Option<OwnedSemaphorePermit> {
        self.connection_slots.clone().try_acquire_owned().ok()
    }

    /// Add `sender` to the broadcast set. Registering the same sender twice
    /// returns the handle it already has.
    pub async fn register(
        &self,
        session_id: impl Into<String>,
        sender: mpsc::Sender<NotificationEvent>,
    ) -> ChannelHandle {
        let mut channels = self.channels.write().await;

        if let Some((handle, _)) = channels
            .iter()
            .find(|(_, channel)| channel.sender.same_channel(&sender))
        {
            return *handle;
        }

        let handle = ChannelHandle(Uuid::new_v4());
        let session_id = session_id.into();
        info!(channel_id = %handle, session_id = %session_id, "Channel registered");

        channels.insert(
            handle,
            ClientChannel {
                session_id,
                connected_at: Utc::now(),
                sender,
            },
        );
        handle
    }

    pub async fn unregister(&self, handle: ChannelHandle) {
        let mut channels = self.channels.write().await;
        if let Some(channel) = channels.remove(&handle) {
            info!(channel_id = %handle, session_id = %channel.session_id, "Channel unregistered");
        }
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Send `event` to every registered channel.
    ///
    /// Sends run concurrently and each is bounded by the configured timeout.
    /// Channels whose receiver is gone or which time out are removed.
    pub async fn broadcast(&self, event: NotificationEvent) -> BroadcastReport {
        let targets: Vec<(ChannelHandle, mpsc::Sender<NotificationEvent>)> = {
            let channels = self.channels.read().await;
            channels
                .iter()
                .map(|(handle, channel)| (*handle, channel.sender.clone()))
                .collect()
        };

        if targets.is_empty() {
            debug!("No channels registered, skipping broadcast");
            return BroadcastReport::default();
        }

        let send_timeout = self.send_timeout;
        let sends = targets.into_iter().map(|(handle, sender)| {
            let event = event.clone();
            async move {
                let outcome = match timeout(send_timeout, sender.send(event)).await {
                    Ok(Ok(())) => SendOutcome::Delivered,
                    Ok(Err(_)) => SendOutcome::Closed,
                    Err(_) => SendOutcome::TimedOut,
                };
                (handle, outcome)
            }
        });

        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();
        for (handle, outcome) in join_all(sends).await {
            match outcome {
                SendOutcome::Delivered => report.delivered += 1,
                SendOutcome::Closed => {
                    debug!(channel_id = %handle, "Channel closed during broadcast");
                    failed.push(handle);
                }
                SendOutcome::TimedOut => {
                    warn!(channel_id = %handle, "Channel send timed out during broadcast");
                    failed.push(handle);
                }
            }
        }

        if !failed.is_empty() {
            let mut channels = self.channels.write().await;
            for handle in failed {
                if channels.remove(&handle).is_some() {
                    report.dropped += 1;
                    info!(channel_id = %handle, "Removed failed channel");
                }
            }
        }

        report
    }

    /// Bridge a WebSocket to a hub channel until either side closes.
    pub async fn handle_connection(&self, socket: WebSocket, session_id: String) -> Result<()> {
        let (mut sink, mut stream) = socket.split();
        let (tx, mut rx) = mpsc::channel::<NotificationEvent>(self.buffer_size);

        let handle = self.register(session_id.clone(), tx).await;

        let mut outgoing_task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if sink.send(Message::Text(event.to_text())).await.is_err() {
                    debug!("WebSocket connection closed, stopping outgoing message handler");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let mut incoming_task = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        debug!("Ignoring client text message: {}", text);
                    }
                    Ok(Message::Close(_)) => {
                        debug!("WebSocket connection closed by client");
                        break;
                    }
                    Err(e) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        tokio::select! {
            _ = &mut outgoing_task => {
                debug!(session_id = %session_id, "Outgoing message handler completed");
                incoming_task.abort();
            }
            _ = &mut incoming_task => {
                debug!(session_id = %session_id, "Incoming message handler completed");
                outgoing_task.abort();
            }
        }

        self.unregister(handle).await;
        Ok(())
    }
}
