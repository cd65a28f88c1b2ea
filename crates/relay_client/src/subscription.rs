//! Bundle result stream backed by status polling

use crate::{
    client::{BlockEngineClient, MAX_STATUS_QUERY_IDS},
    traits::BundleResultStream,
};
use std::{collections::HashMap, time::Duration};
use tokio::{
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tokio_stream::wrappers::ReceiverStream;
use types::{BundleId, BundleResult, InflightBundleStatus, InflightStatus};

const RESULT_CHANNEL_CAPACITY: usize = 64;

/// Polls in-flight bundle statuses and turns status changes into events
pub(crate) struct ResultPoller {
    client: BlockEngineClient,
    last_seen: HashMap<BundleId, InflightStatus>,
}

impl ResultPoller {
    /// Start a poller task feeding a new result stream.
    ///
    /// The task ends once the returned stream is dropped.
    pub(crate) fn spawn(client: BlockEngineClient, poll_interval: Duration) -> BundleResultStream {
        let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut poller = ResultPoller {
                client,
                last_seen: HashMap::new(),
            };
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = ticker.tick() => {
                        for event in poller.poll().await {
                            if tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }

            tracing::debug!(relay = %poller.client.relay().name, "Bundle result subscription closed");
        });

        Box::pin(ReceiverStream::new(rx))
    }

    /// One polling round over every open bundle id
    async fn poll(&mut self) -> Vec<BundleResult> {
        let ids = self.client.inflight_ids().await;
        self.last_seen.retain(|id, _| ids.contains(id));

        let mut events = Vec::new();
        for chunk in ids.chunks(MAX_STATUS_QUERY_IDS) {
            let statuses = match self.client.get_inflight_bundle_statuses(chunk).await {
                Ok(statuses) => statuses,
                Err(e) => {
                    tracing::warn!(relay = %self.client.relay().name, error = %e, "Bundle status poll failed");
                    continue;
                }
            };

            let context_slot = statuses.context.slot;
            for status in statuses.value {
                if let Some(event) = self.observe(status, context_slot).await {
                    events.push(event);
                }
            }
        }
        events
    }

    /// Convert a status into an event if it changed since the last poll
    async fn observe(&mut self, status: InflightBundleStatus, context_slot: u64) -> Option<BundleResult> {
        if self.last_seen.get(&status.bundle_id) == Some(&status.status) {
            return None;
        }
        self.last_seen.insert(status.bundle_id.clone(), status.status);

        let event = if status.status == InflightStatus::Landed {
            self.client.forget(&status.bundle_id).await;
            BundleResult::Accepted {
                bundle_id: status.bundle_id,
                slot: status.landed_slot.unwrap_or(context_slot),
            }
        } else if status.status.is_rejection() {
            BundleResult::Rejected {
                reason: format!("{:?}", status.status),
                bundle_id: status.bundle_id,
            }
        } else {
            BundleResult::Pending {
                bundle_id: status.bundle_id,
            }
        };
        Some(event)
    }
}
