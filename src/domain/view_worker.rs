//! Background consumer of [`ViewEvent`]s.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::repositories::SmartLinkRepository;
use crate::domain::view_event::ViewEvent;
use crate::utils::timeout::bounded;

const MAX_RETRIES: usize = 3;

/// Applies each view to the store until the channel closes.
///
/// Every attempt is cut off after `store_timeout`. Failed or stalled
/// increments are retried with jittered exponential backoff and then
/// dropped; a lost view never fails the page request that produced it.
pub async fn run_view_worker<R>(
    mut rx: mpsc::Receiver<ViewEvent>,
    repository: Arc<R>,
    store_timeout: Duration,
) where
    R: SmartLinkRepository + ?Sized,
{
    while let Some(ev) = rx.recv().await {
        let strategy = ExponentialBackoff::from_millis(10)
            .map(jitter)
            .take(MAX_RETRIES);

        let result = Retry::start(strategy, || {
            bounded(
                store_timeout,
                "record_view",
                repository.record_view(ev.smartlink_id),
            )
        })
        .await;

        if let Err(e) = result {
            metrics::counter!("smartlink_view_events_failed_total").increment(1);
            tracing::warn!(smartlink_id = ev.smartlink_id, error = %e, "Failed to record view");
        }
    }

    tracing::info!("View worker stopped");
}

/// Queues a view without waiting. A full or closed queue drops the event.
pub fn enqueue_view(tx: &mpsc::Sender<ViewEvent>, smartlink_id: i64) {
    if let Err(e) = tx.try_send(ViewEvent::new(smartlink_id)) {
        metrics::counter!("smartlink_view_events_dropped_total").increment(1);
        tracing::debug!(smartlink_id, error = %e, "View event dropped");
    }
}
