//! Retry driver: resubmit fresh bundles until one is accepted

use crate::{
    assembler::BundleAssembler, blockhash::BlockhashSource, builder::TransactionBuilder,
    waiter::ResultWaiter,
};
use rand::seq::SliceRandom;
use relay_client::RelayClient;
use solana_sdk::{hash::Hash, signature::Keypair};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use types::{AcceptedBundle, AttemptOutcome, BundleId, EngineError};

/// How many attempts to make and how long to pause between them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries until acceptance or cancellation
    pub max_attempts: Option<u32>,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Retry forever with no pause between attempts
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Tunables for a [`RetryDriver`]
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub transaction_limit: usize,
    pub tip_lamports: u64,
    pub result_timeout: Duration,
    pub retry: RetryPolicy,
}

impl From<&config::Config> for EngineSettings {
    fn from(config: &config::Config) -> Self {
        Self {
            transaction_limit: config.bundle.transaction_limit,
            tip_lamports: config.bundle.tip_lamports,
            result_timeout: config.bundle.result_timeout(),
            retry: RetryPolicy {
                max_attempts: config.retry.max_attempts,
                backoff: config.retry.backoff(),
            },
        }
    }
}

/// Drives bundle submission until acceptance.
///
/// # Warning
///
/// With the default [`RetryPolicy`] there is no attempt ceiling:
/// [`RetryDriver::run_until_accepted`] keeps building, submitting and waiting
/// until a bundle is accepted or the cancellation token fires. If the block
/// engine never accepts (bad transactions, an unfunded tip payer, an
/// unreachable relay) the call never returns on its own. Pass a token you can
/// cancel, or set `max_attempts`.
pub struct RetryDriver<R, B> {
    relay: R,
    blockhash_source: B,
    assembler: BundleAssembler,
    waiter: ResultWaiter,
    tip_lamports: u64,
    policy: RetryPolicy,
}

impl<R, B> RetryDriver<R, B>
where
    R: RelayClient,
    B: BlockhashSource,
{
    pub fn new(relay: R, blockhash_source: B, settings: EngineSettings) -> Self {
        Self {
            relay,
            blockhash_source,
            assembler: BundleAssembler::new(settings.transaction_limit),
            waiter: ResultWaiter::new(settings.result_timeout),
            tip_lamports: settings.tip_lamports,
            policy: settings.retry,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Submit the transactions from `transactions` with a tip paid by
    /// `tip_payer` until accepted.
    ///
    /// Every attempt uses a fresh tip account and blockhash, rebuilds the
    /// caller transactions against that blockhash and signs a new tip.
    /// Acceptance of a bundle from any earlier attempt of the same run also
    /// completes it. Transaction sets that can never fit a bundle fail
    /// immediately without any network I/O. See the type-level warning about
    /// unbounded retries.
    pub async fn run_until_accepted<T>(
        &self,
        transactions: &T,
        tip_payer: &Keypair,
        cancel: &CancellationToken,
    ) -> Result<AcceptedBundle, EngineError>
    where
        T: TransactionBuilder + ?Sized,
    {
        // Count and sizes do not depend on the blockhash
        let preview = transactions
            .build(Hash::default())
            .map_err(|e| EngineError::Build(e.to_string()))?;
        self.assembler.check_capacity(&preview)?;

        let mut submitted: Vec<BundleId> = Vec::new();
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            attempt += 1;
            tracing::info!(
                attempt,
                relay = %self.relay.name(),
                transactions = preview.len(),
                submitted = submitted.len(),
                "Starting bundle attempt"
            );

            match self
                .attempt(attempt, transactions, tip_payer, &mut submitted, cancel)
                .await?
            {
                AttemptOutcome::Accepted { bundle_id, slot } => {
                    tracing::info!(attempt, bundle_id = %bundle_id, slot, "Bundle landed");
                    return Ok(AcceptedBundle {
                        bundle_id,
                        slot,
                        attempts: attempt,
                    });
                }
                AttemptOutcome::Cancelled => return Err(EngineError::Cancelled),
                AttemptOutcome::TimedOut => {}
            }

            if self.policy.exhausted(attempt) {
                tracing::warn!(attempts = attempt, "Giving up on bundle");
                return Err(EngineError::AttemptsExhausted { attempts: attempt });
            }

            if !self.policy.backoff.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                    _ = tokio::time::sleep(self.policy.backoff) => {}
                }
            }
        }
    }

    /// One build/submit/wait cycle. Transport failures count as a timed out
    /// attempt. A successfully submitted bundle id is appended to `submitted`.
    async fn attempt<T>(
        &self,
        attempt: u32,
        transactions: &T,
        tip_payer: &Keypair,
        submitted: &mut Vec<BundleId>,
        cancel: &CancellationToken,
    ) -> Result<AttemptOutcome, EngineError>
    where
        T: TransactionBuilder + ?Sized,
    {
        let tip_account = match self.relay.fetch_tip_accounts().await {
            Ok(accounts) => match accounts.choose(&mut rand::thread_rng()).copied() {
                Some(account) => account,
                None => {
                    tracing::warn!(attempt, "Block engine returned no tip accounts");
                    return Ok(AttemptOutcome::TimedOut);
                }
            },
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Failed to fetch tip accounts");
                return Ok(AttemptOutcome::TimedOut);
            }
        };

        let blockhash = match self.blockhash_source.latest_blockhash().await {
            Ok(blockhash) => blockhash,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Failed to fetch latest blockhash");
                return Ok(AttemptOutcome::TimedOut);
            }
        };

        let transactions = transactions
            .build(blockhash)
            .map_err(|e| EngineError::Build(e.to_string()))?;

        let bundle = self.assembler.assemble(
            transactions,
            tip_payer,
            self.tip_lamports,
            tip_account,
            blockhash,
        )?;

        // Subscribe first so no result for this bundle can be missed
        let results = match self.relay.subscribe_results().await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Failed to subscribe to bundle results");
                return Ok(AttemptOutcome::TimedOut);
            }
        };

        let bundle_id = match self.relay.submit(&bundle).await {
            Ok(bundle_id) => bundle_id,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Bundle submission failed");
                return Ok(AttemptOutcome::TimedOut);
            }
        };

        tracing::info!(
            attempt,
            bundle_id = %bundle_id,
            tip_account = %tip_account,
            %blockhash,
            wait_secs = self.waiter.deadline().as_secs(),
            "Bundle sent, waiting for result"
        );

        submitted.push(bundle_id);
        Ok(self.waiter.wait(results, submitted, cancel).await)
    }
}
