// MIT License - Copyright (c) 2026 Peter Wright

use std::sync::Arc;

use crate::snapshot::Snapshot;

/// Events broadcast by the coordinator.
///
/// Subscribe via `coordinator.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<CoordinatorEvent>`.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// A refresh completed and a new snapshot was published.
    SnapshotUpdated(Arc<Snapshot>),
    /// A refresh failed; the previous snapshot is still the published one.
    /// `auth` marks credential failures, which will not heal on their own.
    RefreshFailed { message: String, auth: bool },
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<CoordinatorEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<CoordinatorEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
