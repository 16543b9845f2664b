//! Per-node sync channel lifecycle and dispatch.

use super::event::{SyncEvent, SyncEventKind};
use super::transport::SyncTransport;
use crate::{Error, ErrorContext, Result};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Name of the pub/sub channel all nodes share.
    pub channel: String,
    /// Node identity. Defaults to a fresh v4 UUID per process.
    pub node_id: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channel: "taskmesh:todo-sync".into(),
            node_id: None,
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }
}

/// Node-local reaction to a remote mutation. All methods default to
/// no-ops so a handler only implements the kinds it cares about.
pub trait SyncHandler: Send + Sync {
    fn on_task_added(&self, _event: &SyncEvent) {}
    fn on_task_updated(&self, _event: &SyncEvent) {}
    fn on_task_removed(&self, _event: &SyncEvent) {}
    fn on_list_cleared(&self, _event: &SyncEvent) {}
}

/// One node's handle on the shared mutation channel.
///
/// `initialize` subscribes and starts the listener task (idempotent: a
/// second call before `stop` warns and does nothing). `publish` stamps the
/// node id and timestamp onto the event before broadcasting. Events
/// carrying this node's own id are discarded without dispatch.
pub struct NodeSyncChannel {
    cfg: SyncConfig,
    node_id: String,
    transport: Arc<dyn SyncTransport>,
    handler: Arc<dyn SyncHandler>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl NodeSyncChannel {
    pub fn new(
        cfg: SyncConfig,
        transport: Arc<dyn SyncTransport>,
        handler: Arc<dyn SyncHandler>,
    ) -> Self {
        let node_id = cfg
            .node_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            cfg,
            node_id,
            transport,
            handler,
            listener: Mutex::new(None),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Subscribe and start dispatching incoming events. Safe to call once;
    /// a repeat call before `stop` is a logged no-op, never a duplicate
    /// subscription.
    pub fn initialize(&self) {
        let mut listener = self.listener.lock().unwrap();
        if listener.is_some() {
            warn!(node = %self.node_id, "sync channel already initialized, ignoring");
            return;
        }

        let mut rx = self.transport.subscribe(&self.cfg.channel);
        let node_id = self.node_id.clone();
        let handler = Arc::clone(&self.handler);
        let handle = tokio::spawn(async move {
            loop {
                let message = match rx.recv().await {
                    Ok(message) => message,
                    Err(RecvError::Lagged(skipped)) => {
                        // Missed events only delay convergence; the next
                        // invalidation catches the node up.
                        warn!(node = %node_id, skipped, "sync receiver lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                dispatch(&node_id, handler.as_ref(), &message);
            }
        });
        *listener = Some(handle);
    }

    /// Whether the listener task is running.
    pub fn is_ready(&self) -> bool {
        self.listener
            .lock()
            .map(|l| l.as_ref().map(|h| !h.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Stamp the node id and timestamp, serialize, and broadcast. A
    /// delivery failure is logged and returned as `SyncDelivery`; callers
    /// on the mutation path ignore it and keep serving local state.
    pub async fn publish(&self, mut event: SyncEvent) -> Result<()> {
        event.node_id = self.node_id.clone();
        event.timestamp = Utc::now();
        let message = serde_json::to_string(&event)?;
        self.transport
            .publish(&self.cfg.channel, message)
            .await
            .map_err(|e| {
                warn!(node = %self.node_id, error = %e, "sync publish failed");
                Error::sync_with_context(
                    "failed to publish sync event",
                    ErrorContext::new()
                        .with_source("node_sync_channel")
                        .with_details(e.to_string()),
                )
            })
    }

    /// Convenience for the mutation path: build, stamp and publish.
    pub async fn publish_mutation(
        &self,
        kind: SyncEventKind,
        session_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<()> {
        self.publish(SyncEvent::new(kind, session_id, payload)).await
    }

    /// Stop the listener. Idempotent; `initialize` may be called again
    /// afterwards.
    pub fn stop(&self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for NodeSyncChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

fn dispatch(own_node_id: &str, handler: &dyn SyncHandler, message: &str) {
    let event: SyncEvent = match serde_json::from_str(message) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "dropping undecodable sync message");
            return;
        }
    };

    // Self-echo suppression: never react to our own mutations.
    if event.node_id == own_node_id {
        return;
    }

    match event.kind {
        SyncEventKind::Added => handler.on_task_added(&event),
        SyncEventKind::Updated => handler.on_task_updated(&event),
        SyncEventKind::Removed => handler.on_task_removed(&event),
        SyncEventKind::Cleared => handler.on_list_cleared(&event),
        SyncEventKind::Unknown => {
            warn!(node = %event.node_id, "dropping sync event of unknown kind");
            return;
        }
    }
    debug!(kind = event.kind.as_str(), node = %event.node_id, "sync event dispatched");
}
