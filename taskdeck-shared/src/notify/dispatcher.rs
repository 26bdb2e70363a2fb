/// Background notification dispatcher
///
/// Drains the [`QueuedNotifier`](super::QueuedNotifier) queue and hands every
/// event to a transport. On shutdown the queue is closed and whatever is
/// already buffered is still delivered before the task exits.

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{transport::NotificationTransport, Notification};

/// Spawns the dispatcher loop on the current runtime
pub fn spawn_dispatcher(
    rx: mpsc::Receiver<Notification>,
    transport: Arc<dyn NotificationTransport>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_dispatcher(rx, transport, shutdown))
}

/// Runs until the queue closes or `shutdown` is cancelled
pub async fn run_dispatcher(
    mut rx: mpsc::Receiver<Notification>,
    transport: Arc<dyn NotificationTransport>,
    shutdown: CancellationToken,
) {
    info!(transport = transport.name(), "Notification dispatcher started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                rx.close();
                let mut drained = 0usize;
                while let Some(notification) = rx.recv().await {
                    deliver(transport.as_ref(), &notification).await;
                    drained += 1;
                }
                info!(drained, "Notification dispatcher shutting down");
                break;
            }
            next = rx.recv() => match next {
                Some(notification) => deliver(transport.as_ref(), &notification).await,
                None => {
                    info!("Notification queue closed, dispatcher exiting");
                    break;
                }
            }
        }
    }
}

async fn deliver(transport: &dyn NotificationTransport, notification: &Notification) {
    if let Err(e) = transport.deliver(notification).await {
        warn!(
            transport = transport.name(),
            kind = notification.kind.as_str(),
            user_id = notification.user_id,
            error = %e,
            "Notification delivery failed"
        );
    }
}
