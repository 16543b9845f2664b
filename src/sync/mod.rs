//! 节点同步通道：以最终一致的方式在多个服务进程间传播任务变更。
//!
//! # Node Sync Channel Module
//!
//! Publish/subscribe broadcaster keeping independently running server
//! processes eventually consistent about task mutations. Each node
//! publishes a [`SyncEvent`] after a local mutation; every other node
//! reacts with node-local bookkeeping (analysis-cache invalidation,
//! logging). Delivery is best-effort: a node that cannot publish or
//! receive keeps operating on stale-but-locally-consistent state.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`NodeSyncChannel`] | Per-node channel: idempotent subscribe, stamped publish, handler dispatch |
//! | [`SyncEvent`] / [`SyncEventKind`] | Wire format of one mutation notification |
//! | [`SyncTransport`] | Seam over the pub/sub medium |
//! | [`BroadcastTransport`] | In-process transport over `tokio::sync::broadcast` |
//! | [`SyncHandler`] | Node-local reaction to remote mutations |
//!
//! ## Self-echo suppression
//!
//! Every published event carries the publishing node's id. A receiver that
//! finds its own id on an event discards it silently; without this, a node
//! would invalidate its own fresh cache and, over a relaying transport,
//! loop forever.

mod channel;
mod event;
mod transport;

pub use channel::{NodeSyncChannel, SyncConfig, SyncHandler};
pub use event::{SyncEvent, SyncEventKind};
pub use transport::{BroadcastTransport, SyncTransport};
