//! The Bridge Link: a WebSocket client to the Bridge UI with exponential
//! backoff reconnect, ping/pong keepalive, and a bounded outbound queue so
//! a stalled Bridge can't make the controller's workflow block forever.
//!
//! Grounded on the original `BridgeClient`'s manager/reader/writer task
//! split (connect, send hello, race a reader task against a writer task,
//! whichever dies first tears down the connection and the outer loop
//! reconnects with capped backoff).

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;

use actl_types::{OutboundBridgeMessage, OutboundKind, UserMessage};

/// Tuning knobs threaded through from [`actl_config::ControllerConfig`].
#[derive(Debug, Clone)]
pub struct BridgeLinkConfig {
    pub url: String,
    pub reconnect_initial_secs: u64,
    pub reconnect_ceiling_secs: u64,
    pub ping_interval_secs: u64,
    pub ping_timeout_secs: u64,
    pub outbound_queue_capacity: usize,
}

/// Handle to a running Bridge Link: clone to hand to multiple senders.
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    outbound_tx: mpsc::Sender<OutboundBridgeMessage>,
}

impl BridgeHandle {
    /// Queue a message to the Bridge. Drops silently (with a logged
    /// warning) if the outbound queue is full — a backed-up Bridge must
    /// never stall the controller's workflow loop.
    pub async fn send(&self, message: OutboundBridgeMessage) {
        if self.outbound_tx.try_send(message).is_err() {
            log::warn!("bridge outbound queue full, dropping message");
        }
    }
}

/// Spawn the Bridge Link's reconnect-forever task. Inbound `UserMessage`s
/// are forwarded to `inbound_tx` as they arrive; returns a handle for
/// sending outbound messages.
pub fn spawn(config: BridgeLinkConfig, inbound_tx: mpsc::UnboundedSender<UserMessage>) -> BridgeHandle {
    let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_queue_capacity);
    tokio::spawn(run_manager(config, inbound_tx, outbound_rx));
    BridgeHandle { outbound_tx }
}

async fn run_manager(
    config: BridgeLinkConfig,
    inbound_tx: mpsc::UnboundedSender<UserMessage>,
    mut outbound_rx: mpsc::Receiver<OutboundBridgeMessage>,
) {
    let mut backoff = config.reconnect_initial_secs;
    loop {
        log::info!("connecting to bridge at {}", config.url);
        match tokio_tungstenite::connect_async(&config.url).await {
            Ok((ws_stream, _response)) => {
                log::info!("bridge connected");
                backoff = config.reconnect_initial_secs;
                let (mut write, mut read) = ws_stream.split();

                let hello =
                    OutboundBridgeMessage::text(OutboundKind::System, "supervisor_connected", None);
                if let Ok(text) = serde_json::to_string(&hello) {
                    let _ = write.send(Message::Text(text)).await;
                }

                let ping_interval = Duration::from_secs(config.ping_interval_secs);
                let ping_timeout = Duration::from_secs(config.ping_timeout_secs);
                let mut ping_tick = tokio::time::interval(ping_interval);
                let mut last_pong = Instant::now();

                'connection: loop {
                    tokio::select! {
                        _ = ping_tick.tick() => {
                            if last_pong.elapsed() > ping_timeout {
                                log::warn!("bridge ping timeout, reconnecting");
                                break 'connection;
                            }
                            if write.send(Message::Ping(Vec::new())).await.is_err() {
                                break 'connection;
                            }
                        }
                        outbound = outbound_rx.recv() => {
                            match outbound {
                                Some(message) => {
                                    match serde_json::to_string(&message) {
                                        Ok(text) => {
                                            if write.send(Message::Text(text)).await.is_err() {
                                                log::warn!("bridge send failed, reconnecting");
                                                break 'connection;
                                            }
                                        }
                                        Err(e) => log::warn!("failed to serialize outbound bridge message: {e}"),
                                    }
                                }
                                None => {
                                    log::info!("outbound channel closed, shutting down bridge link");
                                    return;
                                }
                            }
                        }
                        incoming = read.next() => {
                            match incoming {
                                Some(Ok(Message::Text(text))) => {
                                    match serde_json::from_str::<UserMessage>(&text) {
                                        Ok(parsed) => {
                                            if inbound_tx.send(parsed).is_err() {
                                                log::warn!("inbound channel closed, shutting down bridge link");
                                                return;
                                            }
                                        }
                                        Err(e) => log::warn!("dropping malformed bridge message: {e}"),
                                    }
                                }
                                Some(Ok(Message::Pong(_))) => {
                                    last_pong = Instant::now();
                                }
                                Some(Ok(Message::Close(_))) | None => {
                                    log::info!("bridge closed connection");
                                    break 'connection;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(e)) => {
                                    log::warn!("bridge read error: {e}");
                                    break 'connection;
                                }
                            }
                        }
                    }
                }
            }
            Err(e) => {
                log::warn!("bridge connect failed: {e}");
            }
        }

        tokio::time::sleep(Duration::from_secs(backoff)).await;
        backoff = (backoff * 2).min(config.reconnect_ceiling_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let mut backoff = 1u64;
        let ceiling = 10u64;
        let sequence = [1, 2, 4, 8, 10, 10];
        for expected in sequence {
            assert_eq!(backoff, expected);
            backoff = (backoff * 2).min(ceiling);
        }
    }
}
