//! Reconnecting status channel
//!
//! A background task keeps a transport connected and forwards parsed
//! status events through an mpsc queue. Connection trouble shows up as
//! `Reconnecting` events, never as errors; once the policy is exhausted
//! the channel sends `Unavailable` once and stops.

use crate::remote::StatusEvent;
use crate::status::backoff::ReconnectPolicy;
use crate::status::transport::StatusTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What consumers of the channel see
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Update(StatusEvent),
    Reconnecting { attempt: u32, delay: Duration },
    /// Reconnects exhausted; no further events follow
    Unavailable,
}

/// Handle to a running status channel.
///
/// Dropping the handle stops the background task.
pub struct StatusChannel {
    rx: mpsc::Receiver<ChannelEvent>,
    task: JoinHandle<()>,
}

impl StatusChannel {
    /// Connect in the background and start forwarding events
    pub fn spawn(transport: Arc<dyn StatusTransport>, policy: ReconnectPolicy) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(run(transport, policy, tx));
        Self { rx, task }
    }

    /// Next event, `None` once the channel has stopped
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.rx.recv().await
    }
}

impl Drop for StatusChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Parse a raw push; malformed payloads are logged and dropped
pub fn parse_status(raw: &str) -> Option<StatusEvent> {
    match serde_json::from_str::<StatusEvent>(raw) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Dropping malformed status payload: {}", e);
            debug!("Payload was: {}", raw);
            None
        }
    }
}

async fn run(
    transport: Arc<dyn StatusTransport>,
    policy: ReconnectPolicy,
    tx: mpsc::Sender<ChannelEvent>,
) {
    let endpoint = transport.describe();
    let mut failures: u32 = 0;

    loop {
        match transport.connect().await {
            Ok(mut stream) => {
                failures = 0;
                info!("Status channel connected to {}", endpoint);
                if tx.send(ChannelEvent::Connected).await.is_err() {
                    return;
                }

                loop {
                    match stream.next_message().await {
                        Ok(Some(raw)) => {
                            let Some(event) = parse_status(&raw) else {
                                continue;
                            };
                            if tx.send(ChannelEvent::Update(event)).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => {
                            info!("Status channel closed by {}", endpoint);
                            break;
                        }
                        Err(e) => {
                            warn!("Status channel error: {}", e);
                            break;
                        }
                    }
                }
            }
            Err(e) => warn!("Status channel could not connect: {}", e),
        }

        failures += 1;
        if !policy.allows(failures) {
            warn!(
                "Giving up on {} after {} reconnect attempts",
                endpoint, policy.max_attempts
            );
            let _ = tx.send(ChannelEvent::Unavailable).await;
            return;
        }

        let delay = policy.delay_for(failures);
        debug!("Reconnecting to {} in {:?} (attempt {})", endpoint, delay, failures);
        if tx
            .send(ChannelEvent::Reconnecting {
                attempt: failures,
                delay,
            })
            .await
            .is_err()
        {
            return;
        }
        tokio::time::sleep(delay).await;
    }
}
