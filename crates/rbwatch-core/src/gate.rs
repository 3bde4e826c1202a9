// ── Exclusive command slot ──
//
// The router session handles one command at a time. Every command goes
// through this gate; a caller that finds the slot busy backs off in short
// fixed steps and gives up after a bounded number of tries instead of
// queueing forever behind a stuck request.

use std::time::Duration;

use rbwatch_api::{Params, Record, RouterClient};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::CoreError;

/// Delay between busy checks.
pub const BACKOFF_DELAY: Duration = Duration::from_millis(200);

/// Busy observations tolerated before giving up.
pub const MAX_BUSY_OBSERVATIONS: u32 = 6;

/// Serializes access to a [`RouterClient`].
pub struct CommandGate<C> {
    client: C,
    slot: Mutex<()>,
    delay: Duration,
}

impl<C: RouterClient> CommandGate<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            slot: Mutex::new(()),
            delay: BACKOFF_DELAY,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    async fn acquire(&self) -> Option<MutexGuard<'_, ()>> {
        let mut busy = 0;
        loop {
            if let Ok(guard) = self.slot.try_lock() {
                return Some(guard);
            }
            debug!("command slot busy, backing off");
            tokio::time::sleep(self.delay).await;
            busy += 1;
            if busy >= MAX_BUSY_OBSERVATIONS {
                warn!(attempts = busy, "command slot still busy, giving up");
                return None;
            }
        }
    }

    /// Issue a command, or `Ok(None)` if the slot stayed busy.
    pub async fn issue(&self, path: &str, params: &Params) -> Result<Option<Vec<Record>>, CoreError> {
        let Some(_guard) = self.acquire().await else {
            return Ok(None);
        };
        let rows = self.client.issue(path, params).await?;
        debug!(path, rows = rows.len(), "command complete");
        Ok(Some(rows))
    }

    /// Like [`issue`](Self::issue), but a busy slot is an error.
    pub async fn issue_required(&self, path: &str, params: &Params) -> Result<Vec<Record>, CoreError> {
        self.issue(path, params)
            .await?
            .ok_or(CoreError::BackoffExhausted {
                attempts: MAX_BUSY_OBSERVATIONS,
            })
    }

    /// Re-establish the session while holding the slot.
    pub async fn reconnect(&self) -> Result<(), CoreError> {
        let _guard = self.acquire().await.ok_or(CoreError::BackoffExhausted {
            attempts: MAX_BUSY_OBSERVATIONS,
        })?;
        self.client.reconnect().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[derive(Default)]
    struct CountingClient {
        issued: AtomicUsize,
    }

    impl RouterClient for CountingClient {
        async fn issue(&self, _path: &str, _params: &Params) -> Result<Vec<Record>, rbwatch_api::Error> {
            self.issued.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Record::new().with("name", "x")])
        }

        async fn reconnect(&self) -> Result<(), rbwatch_api::Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn free_slot_issues_immediately() {
        let gate = CommandGate::new(CountingClient::default());
        let rows = gate.issue("/system/identity/print", &Params::new()).await.unwrap();
        assert_eq!(rows.unwrap().len(), 1);
        assert_eq!(gate.client().issued.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_slot_gives_up_after_six_observations() {
        let gate = CommandGate::new(CountingClient::default());
        let _held = gate.slot.try_lock().unwrap();

        let started = Instant::now();
        let result = gate.issue("/queue/simple/print", &Params::new()).await.unwrap();

        assert!(result.is_none());
        assert_eq!(started.elapsed(), BACKOFF_DELAY * MAX_BUSY_OBSERVATIONS);
        assert_eq!(gate.client().issued.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn required_issue_reports_exhaustion() {
        let gate = CommandGate::new(CountingClient::default());
        let _held = gate.slot.try_lock().unwrap();

        let err = gate
            .issue_required("/queue/simple/set", &Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::BackoffExhausted { attempts: 6 }));
        assert!(gate.reconnect().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn slot_released_mid_backoff_is_taken() {
        let gate = std::sync::Arc::new(CommandGate::new(CountingClient::default()));
        let held = gate.slot.try_lock().unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.issue("/ip/accounting/print", &Params::new()).await })
        };
        tokio::time::sleep(BACKOFF_DELAY * 2).await;
        drop(held);

        let result = waiter.await.unwrap().unwrap();
        assert!(result.is_some());
    }
}
