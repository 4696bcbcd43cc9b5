//! Single-flight token refresh.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

/// Result of one refresh attempt, shared with every request that waited on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The new access token
    Refreshed(String),
    Failed,
}

/// Lets at most one refresh run at a time
///
/// A request records [`generation`](Self::generation) before it is sent.
/// When it comes back 401 it calls [`refresh`](Self::refresh) with that
/// value: if a refresh already finished since then, the request reuses its
/// outcome instead of starting another one. Requests arriving while a
/// refresh is running wait on the lock and then reuse its outcome.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    last: Mutex<Option<RefreshOutcome>>,
    generation: AtomicU64,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refreshes completed so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub async fn refresh<F, Fut>(&self, seen_generation: u64, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        let mut last = self.last.lock().await;

        if self.generation() != seen_generation {
            if let Some(outcome) = last.as_ref() {
                return outcome.clone();
            }
        }

        let outcome = match refresh().await {
            Some(token) => RefreshOutcome::Refreshed(token),
            None => RefreshOutcome::Failed,
        };
        *last = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    async fn run_concurrent(succeed: bool) -> (Vec<RefreshOutcome>, usize) {
        let guard = Arc::new(RefreshGuard::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = guard.generation();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let guard = guard.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    guard
                        .refresh(seen, || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            succeed.then(|| "fresh-token".to_string())
                        })
                        .await
                })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }
        (outcomes, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn concurrent_failures_share_one_refresh() {
        let (outcomes, calls) = run_concurrent(true).await;
        assert_eq!(calls, 1);
        assert!(outcomes
            .iter()
            .all(|o| *o == RefreshOutcome::Refreshed("fresh-token".to_string())));
    }

    #[tokio::test]
    async fn failed_refresh_rejects_all_waiters() {
        let (outcomes, calls) = run_concurrent(false).await;
        assert_eq!(calls, 1);
        assert!(outcomes.iter().all(|o| *o == RefreshOutcome::Failed));
    }

    #[tokio::test]
    async fn later_failure_triggers_new_refresh() {
        let guard = RefreshGuard::new();
        let first = guard
            .refresh(0, || async { Some("one".to_string()) })
            .await;
        assert_eq!(first, RefreshOutcome::Refreshed("one".to_string()));

        // Sent before the first refresh finished: reuses its token
        let stale = guard.refresh(0, || async { Some("unused".to_string()) }).await;
        assert_eq!(stale, RefreshOutcome::Refreshed("one".to_string()));

        // Sent after it: refreshes again
        let second = guard
            .refresh(guard.generation(), || async { Some("two".to_string()) })
            .await;
        assert_eq!(second, RefreshOutcome::Refreshed("two".to_string()));
        assert_eq!(guard.generation(), 2);
    }
}
