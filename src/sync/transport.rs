//! Pub/sub transport seam.

use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Message-passing seam over the pub/sub medium. Channels are named;
/// messages are opaque serialized strings. A production deployment backs
/// this with its store's pub/sub; tests and single-host setups use
/// [`BroadcastTransport`].
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn publish(&self, channel: &str, message: String) -> Result<()>;
    /// Open a subscription to a named channel. Each call returns an
    /// independent receiver; dropping it is the unsubscribe.
    fn subscribe(&self, channel: &str) -> broadcast::Receiver<String>;
    fn name(&self) -> &'static str;
}

/// In-process transport over `tokio::sync::broadcast`, one lazily created
/// sender per channel name. A publish with no subscribers is not an error;
/// events are announcements, not requests.
pub struct BroadcastTransport {
    capacity: usize,
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

impl BroadcastTransport {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Number of live subscriptions on a channel.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .unwrap()
            .get(channel)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for BroadcastTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl SyncTransport for BroadcastTransport {
    async fn publish(&self, channel: &str, message: String) -> Result<()> {
        // send() errs only when every receiver is gone, which is fine here.
        let _ = self.sender(channel).send(message);
        Ok(())
    }

    fn subscribe(&self, channel: &str) -> broadcast::Receiver<String> {
        self.sender(channel).subscribe()
    }

    fn name(&self) -> &'static str {
        "broadcast"
    }
}
