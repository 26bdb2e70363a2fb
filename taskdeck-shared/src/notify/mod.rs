/// Lifecycle notifications
///
/// Handlers emit a [`Notification`] through an [`EventSink`] after a write has
/// committed. Emitting never blocks and never fails the request: the
/// [`QueuedNotifier`] pushes into a bounded queue and a background
/// [`dispatcher`] hands each event to a [`NotificationTransport`]. A full
/// queue drops the event with a warning; transport failures are logged.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdeck_shared::notify::{
///     dispatcher::spawn_dispatcher, transport::LogTransport, EventKind, EventSink,
///     Notification, QueuedNotifier,
/// };
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let (notifier, rx) = QueuedNotifier::new(256);
/// let shutdown = CancellationToken::new();
/// let handle = spawn_dispatcher(rx, Arc::new(LogTransport), shutdown.clone());
///
/// notifier.emit(Notification::new(
///     EventKind::TaskCreated,
///     1,
///     serde_json::json!({ "task_id": 9 }),
/// ));
///
/// shutdown.cancel();
/// handle.await.ok();
/// # }
/// ```

pub mod dispatcher;
pub mod transport;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Default queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Kinds of lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    FolderCreated,
    FolderDeleted,
    TaskAddedToFolder,
    TaskRemovedFromFolder,
    PremiumActivated,
}

impl EventKind {
    /// Gets kind as string
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TaskCreated => "task_created",
            EventKind::TaskUpdated => "task_updated",
            EventKind::TaskDeleted => "task_deleted",
            EventKind::FolderCreated => "folder_created",
            EventKind::FolderDeleted => "folder_deleted",
            EventKind::TaskAddedToFolder => "task_added_to_folder",
            EventKind::TaskRemovedFromFolder => "task_removed_from_folder",
            EventKind::PremiumActivated => "premium_activated",
        }
    }
}

/// One lifecycle event addressed to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// What happened
    pub kind: EventKind,

    /// User the event concerns
    pub user_id: i64,

    /// Event-specific data
    pub payload: serde_json::Value,

    /// When the event was emitted
    pub occurred_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification stamped with the current time
    pub fn new(kind: EventKind, user_id: i64, payload: serde_json::Value) -> Self {
        Self {
            kind,
            user_id,
            payload,
            occurred_at: Utc::now(),
        }
    }
}

/// Fire-and-forget destination for notifications
pub trait EventSink: Send + Sync {
    /// Hands off a notification without waiting for delivery
    fn emit(&self, notification: Notification);
}

/// [`EventSink`] backed by a bounded in-process queue
#[derive(Debug, Clone)]
pub struct QueuedNotifier {
    tx: mpsc::Sender<Notification>,
}

impl QueuedNotifier {
    /// Creates the notifier and the receiving end for the dispatcher
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl EventSink for QueuedNotifier {
    fn emit(&self, notification: Notification) {
        let kind = notification.kind;
        let user_id = notification.user_id;

        match self.tx.try_send(notification) {
            Ok(()) => debug!(kind = kind.as_str(), user_id, "Notification queued"),
            Err(TrySendError::Full(_)) => {
                warn!(kind = kind.as_str(), user_id, "Notification queue full, dropping event")
            }
            Err(TrySendError::Closed(_)) => {
                warn!(kind = kind.as_str(), user_id, "Notification dispatcher stopped, dropping event")
            }
        }
    }
}
