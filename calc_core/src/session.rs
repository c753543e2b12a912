//! # Calculation Session
//!
//! An observable "latest result" for one calculator screen. Each
//! [`CalculationSession::submit`] runs a calculation on the tokio runtime
//! and publishes its [`Outcome`] through a `watch` channel, so any number
//! of readers see the newest value.
//!
//! Every submission gets a generation number. An outcome from an older
//! generation never replaces a newer one already published, so a slow
//! calculation that finishes late cannot overwrite the result of a later
//! edit. A calculation that panics is published as
//! [`CalcError::Internal`].
//!
//! ## Example
//!
//! ```rust
//! use calc_core::session::CalculationSession;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let session = CalculationSession::new();
//! session.submit(async { Ok(6.0 * 7.0) }).await.unwrap();
//!
//! let latest = session.latest().unwrap();
//! assert_eq!(latest.generation, 1);
//! assert_eq!(latest.result, Ok(42.0));
//! # });
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::{CalcError, CalcResult};

/// One published calculation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    /// Submission number, starting at 1
    pub generation: u64,
    pub computed_at: DateTime<Utc>,
    pub result: CalcResult<T>,
}

/// Latest-result holder for one calculator.
pub struct CalculationSession<T> {
    sender: Arc<watch::Sender<Option<Outcome<T>>>>,
    requested: Arc<AtomicU64>,
}

impl<T> Clone for CalculationSession<T> {
    fn clone(&self) -> Self {
        CalculationSession {
            sender: Arc::clone(&self.sender),
            requested: Arc::clone(&self.requested),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for CalculationSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> CalculationSession<T> {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        CalculationSession {
            sender: Arc::new(sender),
            requested: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Receiver that is notified whenever a newer outcome is published.
    pub fn subscribe(&self) -> watch::Receiver<Option<Outcome<T>>> {
        self.sender.subscribe()
    }

    /// The newest published outcome, if any.
    pub fn latest(&self) -> Option<Outcome<T>> {
        self.sender.borrow().clone()
    }

    /// Generation of the most recent submission, published or not.
    pub fn requested_generation(&self) -> u64 {
        self.requested.load(Ordering::SeqCst)
    }

    /// Run `calculation` in the background and publish its outcome.
    ///
    /// The handle resolves to `true` when the outcome was published and
    /// `false` when a newer generation had already been published.
    pub fn submit<F>(&self, calculation: F) -> JoinHandle<bool>
    where
        F: Future<Output = CalcResult<T>> + Send + 'static,
    {
        let generation = self.requested.fetch_add(1, Ordering::SeqCst) + 1;
        let sender = Arc::clone(&self.sender);

        tokio::spawn(async move {
            let result = run_guarded(calculation).await;
            let outcome = Outcome {
                generation,
                computed_at: Utc::now(),
                result,
            };

            sender.send_if_modified(|current| match current {
                Some(newer) if newer.generation > generation => {
                    tracing::debug!(
                        generation,
                        published = newer.generation,
                        "dropping superseded calculation result"
                    );
                    false
                }
                _ => {
                    *current = Some(outcome);
                    true
                }
            })
        })
    }
}

/// Run `calculation` on its own task; a panic comes back as
/// [`CalcError::Internal`] instead of unwinding into the caller.
pub async fn run_guarded<T, F>(calculation: F) -> CalcResult<T>
where
    T: Send + 'static,
    F: Future<Output = CalcResult<T>> + Send + 'static,
{
    match tokio::spawn(calculation).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "calculation task failed");
            Err(CalcError::internal(format!("calculation task failed: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_publishes_in_order() {
        let session = CalculationSession::new();
        let mut rx = session.subscribe();

        assert!(session.submit(async { Ok(1) }).await.unwrap());
        assert!(session.submit(async { Ok(2) }).await.unwrap());

        rx.changed().await.unwrap();
        let latest = rx.borrow_and_update().clone().unwrap();
        assert_eq!(latest.generation, 2);
        assert_eq!(latest.result, Ok(2));
        assert_eq!(session.requested_generation(), 2);
    }

    #[tokio::test]
    async fn test_late_result_does_not_overwrite_newer() {
        let session = CalculationSession::new();
        let (release, wait) = oneshot::channel::<()>();

        let slow = session.submit(async move {
            let _ = wait.await;
            Ok("first")
        });
        let fast = session.submit(async { Ok("second") });

        assert!(fast.await.unwrap());
        release.send(()).unwrap();
        assert!(!slow.await.unwrap());

        let latest = session.latest().unwrap();
        assert_eq!(latest.generation, 2);
        assert_eq!(latest.result, Ok("second"));
    }

    #[tokio::test]
    async fn test_error_replaces_previous_result() {
        let session = CalculationSession::new();
        session.submit(async { Ok(10.0) }).await.unwrap();
        session
            .submit(async { Err(CalcError::missing_field("Room Length")) })
            .await
            .unwrap();
        assert_eq!(
            session.latest().unwrap().result,
            Err(CalcError::missing_field("Room Length"))
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let session: CalculationSession<u32> = CalculationSession::new();
        session
            .submit(async {
                let rows: Vec<u32> = Vec::new();
                Ok(rows[3])
            })
            .await
            .unwrap();
        let err = session.latest().unwrap().result.unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_run_guarded_passes_results_through() {
        assert_eq!(run_guarded(async { Ok(7) }).await, Ok(7));
        assert_eq!(
            run_guarded::<u32, _>(async { Err(CalcError::missing_field("Voltage")) }).await,
            Err(CalcError::missing_field("Voltage"))
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let session = CalculationSession::new();
        let other = session.clone();
        other.submit(async { Ok(5) }).await.unwrap();
        assert_eq!(session.latest().unwrap().result, Ok(5));
    }
}
