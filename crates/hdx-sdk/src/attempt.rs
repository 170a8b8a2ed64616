//! Racing primary calls against a timeout.
//!
//! Primary calls run on spawned tasks. When the timeout wins, the task is
//! not cancelled: it keeps running and may still change the primary
//! backend. Such abandoned attempts are tracked while they run so that
//! `settle` and `shutdown` can wait for them and log how they ended.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use hdx_records::RecordResult;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::FallbackTrigger;
use crate::error::{SdkError, SdkResult};
use crate::served::FallbackReason;

/// Outcome of a guarded primary call.
#[derive(Debug)]
pub(crate) enum Attempt<T> {
    Primary(T),
    Degraded(FallbackReason),
}

/// Summary of waiting for abandoned primary attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettleReport {
    /// Attempts that finished within the grace period.
    pub settled: usize,
    /// Of those, how many succeeded against the primary backend.
    pub succeeded: usize,
    /// Attempts still running when the grace period ran out.
    pub outstanding: usize,
}

struct Abandoned {
    op: &'static str,
    kind: &'static str,
    attempt: AbortHandle,
    watcher: JoinHandle<bool>,
}

/// Timeout and fallback policy shared by every store of one service.
pub(crate) struct AttemptPolicy {
    timeout: Duration,
    trigger: FallbackTrigger,
    abandoned: Mutex<Vec<Abandoned>>,
}

impl AttemptPolicy {
    pub(crate) fn new(timeout: Duration, trigger: FallbackTrigger) -> Self {
        Self {
            timeout,
            trigger,
            abandoned: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Abandoned attempts that are still running.
    pub(crate) fn pending(&self) -> usize {
        let mut abandoned = self.abandoned.lock().expect("lock poisoned");
        forget_finished(&mut abandoned);
        abandoned.len()
    }

    /// Run `call` on its own task and wait at most the timeout for it.
    ///
    /// Errors the trigger policy does not cover are returned to the caller.
    pub(crate) async fn attempt<T, Fut>(
        &self,
        op: &'static str,
        kind: &'static str,
        call: Fut,
    ) -> SdkResult<Attempt<T>>
    where
        T: Send + 'static,
        Fut: Future<Output = RecordResult<T>> + Send + 'static,
    {
        let mut handle = tokio::spawn(call);
        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(Ok(value))) => Ok(Attempt::Primary(value)),
            Ok(Ok(Err(error))) => {
                if self.trigger.should_fall_back(&error) {
                    warn!(op, kind, %error, "primary failed, serving from fallback");
                    Ok(Attempt::Degraded(FallbackReason::Error))
                } else {
                    Err(error.into())
                }
            }
            Ok(Err(join_error)) => {
                if self.trigger == FallbackTrigger::AnyError {
                    warn!(op, kind, error = %join_error, "primary attempt aborted, serving from fallback");
                    Ok(Attempt::Degraded(FallbackReason::Error))
                } else {
                    Err(SdkError::AttemptFailed {
                        op,
                        reason: join_error.to_string(),
                    })
                }
            }
            Err(_) => {
                warn!(
                    op,
                    kind,
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "primary timed out, serving from fallback"
                );
                self.abandon(op, kind, handle);
                Ok(Attempt::Degraded(FallbackReason::Timeout))
            }
        }
    }

    fn abandon<T: Send + 'static>(
        &self,
        op: &'static str,
        kind: &'static str,
        handle: JoinHandle<RecordResult<T>>,
    ) {
        let attempt = handle.abort_handle();
        let watcher = tokio::spawn(async move {
            match handle.await {
                Ok(Ok(_)) => {
                    info!(op, kind, "abandoned primary attempt completed");
                    true
                }
                Ok(Err(error)) => {
                    warn!(op, kind, %error, "abandoned primary attempt failed");
                    false
                }
                Err(error) => {
                    warn!(op, kind, %error, "abandoned primary attempt did not finish");
                    false
                }
            }
        });
        let mut abandoned = self.abandoned.lock().expect("lock poisoned");
        forget_finished(&mut abandoned);
        abandoned.push(Abandoned {
            op,
            kind,
            attempt,
            watcher,
        });
    }

    /// Wait up to `grace` for abandoned attempts. Unfinished ones stay tracked.
    pub(crate) async fn settle(&self, grace: Duration) -> SettleReport {
        let (report, unfinished) = self.drain(grace).await;
        self.abandoned
            .lock()
            .expect("lock poisoned")
            .extend(unfinished);
        report
    }

    /// Wait up to `grace` for abandoned attempts, then abort the rest.
    pub(crate) async fn shutdown(&self, grace: Duration) -> SettleReport {
        let (report, unfinished) = self.drain(grace).await;
        for abandoned in unfinished {
            warn!(op = abandoned.op, kind = abandoned.kind, "aborting primary attempt at shutdown");
            abandoned.attempt.abort();
            abandoned.watcher.abort();
        }
        report
    }

    async fn drain(&self, grace: Duration) -> (SettleReport, Vec<Abandoned>) {
        let tracked = std::mem::take(&mut *self.abandoned.lock().expect("lock poisoned"));
        let deadline = Instant::now() + grace;
        let mut report = SettleReport::default();
        let mut unfinished = Vec::new();

        for mut abandoned in tracked {
            match tokio::time::timeout_at(deadline, &mut abandoned.watcher).await {
                Ok(Ok(succeeded)) => {
                    report.settled += 1;
                    if succeeded {
                        report.succeeded += 1;
                    }
                }
                Ok(Err(_)) => report.settled += 1,
                Err(_) => {
                    report.outstanding += 1;
                    unfinished.push(abandoned);
                }
            }
        }
        (report, unfinished)
    }
}

/// Drop attempts whose watcher has already logged the outcome.
fn forget_finished(abandoned: &mut Vec<Abandoned>) {
    abandoned.retain(|a| !a.watcher.is_finished());
}
