//! Bounded wait for a submission run's outcome

use futures::StreamExt;
use relay_client::BundleResultStream;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use types::{AttemptOutcome, BundleId, BundleResult};

/// Waits up to a fixed deadline for a bundle to be accepted
#[derive(Debug, Clone)]
pub struct ResultWaiter {
    deadline: Duration,
}

impl ResultWaiter {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Wait for any of `bundle_ids` to be accepted on `results`.
    ///
    /// `bundle_ids` holds every bundle submitted so far in the run, the
    /// current one last. All of them carry the same caller transfers, so a
    /// bundle from an earlier attempt that lands late ends the wait too.
    ///
    /// Resolves exactly once. Rejections are logged and do not end the wait;
    /// only acceptance, the deadline or cancellation do. Consumes the stream,
    /// so events arriving after resolution go nowhere.
    pub async fn wait(
        &self,
        mut results: BundleResultStream,
        bundle_ids: &[BundleId],
        cancel: &CancellationToken,
    ) -> AttemptOutcome {
        let bundle_id = bundle_ids.last().map(String::as_str).unwrap_or_default();
        let awaited = |id: &BundleId| bundle_ids.contains(id);
        let deadline = Instant::now() + self.deadline;
        let expiry = sleep_until(deadline);
        tokio::pin!(expiry);

        let mut stream_open = true;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!(bundle_id, "Wait for bundle result cancelled");
                    return AttemptOutcome::Cancelled;
                }
                _ = &mut expiry => {
                    tracing::info!(
                        bundle_id,
                        deadline_secs = self.deadline.as_secs(),
                        "No acceptance before deadline"
                    );
                    return AttemptOutcome::TimedOut;
                }
                event = results.next(), if stream_open => match event {
                    Some(BundleResult::Accepted { bundle_id: id, slot }) if awaited(&id) => {
                        tracing::info!(bundle_id = %id, current_bundle_id = bundle_id, slot, "Bundle accepted");
                        return AttemptOutcome::Accepted { bundle_id: id, slot };
                    }
                    Some(BundleResult::Rejected { bundle_id: id, reason }) if awaited(&id) => {
                        tracing::warn!(bundle_id = %id, reason = %reason, "Bundle rejected, still waiting");
                    }
                    Some(event) => {
                        tracing::debug!(bundle_id, event_bundle_id = %event.bundle_id(), ?event, "Ignoring result event");
                    }
                    None => {
                        tracing::debug!(bundle_id, "Result stream ended, waiting out deadline");
                        stream_open = false;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    const DEADLINE: Duration = Duration::from_secs(30);

    fn channel() -> (mpsc::UnboundedSender<BundleResult>, BundleResultStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Box::pin(UnboundedReceiverStream::new(rx)))
    }

    fn accepted(id: &str, slot: u64) -> BundleResult {
        BundleResult::Accepted { bundle_id: id.to_string(), slot }
    }

    fn ids(ids: &[&str]) -> Vec<BundleId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn rejected(id: &str) -> BundleResult {
        BundleResult::Rejected { bundle_id: id.to_string(), reason: "simulation failure".to_string() }
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_resolves_before_deadline() {
        let (tx, stream) = channel();
        let started = Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            tx.send(rejected("b1")).unwrap();
            tx.send(accepted("b1", 42)).unwrap();
            // Delivered after resolution; must not matter
            let _ = tx.send(rejected("b1"));
        });

        let outcome = ResultWaiter::new(DEADLINE)
            .wait(stream, &ids(&["b1"]), &CancellationToken::new())
            .await;

        assert_eq!(outcome, AttemptOutcome::Accepted { bundle_id: "b1".to_string(), slot: 42 });
        assert!(started.elapsed() < DEADLINE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejections_do_not_end_wait() {
        let (tx, stream) = channel();
        tx.send(rejected("b1")).unwrap();
        tx.send(rejected("b1")).unwrap();
        let started = Instant::now();

        let outcome = ResultWaiter::new(DEADLINE)
            .wait(stream, &ids(&["b1"]), &CancellationToken::new())
            .await;

        assert_eq!(outcome, AttemptOutcome::TimedOut);
        assert!(started.elapsed() >= DEADLINE);
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_times_out_at_deadline() {
        let (_tx, stream) = channel();
        let started = Instant::now();

        let outcome = ResultWaiter::new(DEADLINE)
            .wait(stream, &ids(&["b1"]), &CancellationToken::new())
            .await;

        assert_eq!(outcome, AttemptOutcome::TimedOut);
        assert!(started.elapsed() >= DEADLINE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_stream_still_waits_for_deadline() {
        let (tx, stream) = channel();
        drop(tx);
        let started = Instant::now();

        let outcome = ResultWaiter::new(DEADLINE)
            .wait(stream, &ids(&["b1"]), &CancellationToken::new())
            .await;

        assert_eq!(outcome, AttemptOutcome::TimedOut);
        assert!(started.elapsed() >= DEADLINE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_bundles_are_ignored() {
        let (tx, stream) = channel();
        tx.send(accepted("someone-else", 7)).unwrap();

        let outcome = ResultWaiter::new(DEADLINE)
            .wait(stream, &ids(&["b1"]), &CancellationToken::new())
            .await;

        assert_eq!(outcome, AttemptOutcome::TimedOut);
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_bundle_acceptance_resolves() {
        let (tx, stream) = channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(4)).await;
            tx.send(rejected("b2")).unwrap();
            tx.send(accepted("b1", 99)).unwrap();
        });

        let outcome = ResultWaiter::new(DEADLINE)
            .wait(stream, &ids(&["b1", "b2"]), &CancellationToken::new())
            .await;

        assert_eq!(outcome, AttemptOutcome::Accepted { bundle_id: "b1".to_string(), slot: 99 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_acceptance_after_deadline_is_too_late() {
        let (tx, stream) = channel();

        tokio::spawn(async move {
            tokio::time::sleep(DEADLINE + Duration::from_secs(1)).await;
            let _ = tx.send(accepted("b1", 42));
        });

        let outcome = ResultWaiter::new(DEADLINE)
            .wait(stream, &ids(&["b1"]), &CancellationToken::new())
            .await;

        assert_eq!(outcome, AttemptOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation() {
        let (_tx, stream) = channel();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let started = Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let outcome = ResultWaiter::new(DEADLINE).wait(stream, &ids(&["b1"]), &cancel).await;

        assert_eq!(outcome, AttemptOutcome::Cancelled);
        assert!(started.elapsed() < DEADLINE);
    }
}
