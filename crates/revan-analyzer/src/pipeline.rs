//! Batch orchestration.
//!
//! Runs an [`Analyzer`] over a slice of reviews with bounded parallelism and
//! seals the outcome into a [`BatchRun`]. A failing review is recorded and
//! the batch moves on. Every input review lands in exactly one of the run's
//! two lists; reviews never started because of cancellation or the abort
//! threshold are recorded as `Cancelled` / `Aborted` failures.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use revan_core::{AppConfig, BatchRecorder, BatchRun, FailureKind, Review, ReviewFailure, RunStatus};

use crate::analyzer::Analyzer;
use crate::backend::ModelBackend;
use crate::error::BatchError;

/// Knobs for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum number of reviews analyzed at once.
    pub max_concurrency: usize,
    /// Abort after this many consecutive endpoint failures. `0` disables.
    pub abort_after_consecutive_failures: u32,
    /// Pause each worker after its model call.
    pub inter_request_delay_ms: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            abort_after_consecutive_failures: 5,
            inter_request_delay_ms: 0,
        }
    }
}

impl BatchOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrent_reviews,
            abort_after_consecutive_failures: config.abort_after_consecutive_failures,
            inter_request_delay_ms: config.inter_request_delay_ms,
        }
    }
}

/// Cooperative cancellation flag shared between a batch and its controller.
///
/// Cancelling lets in-flight calls finish; reviews not yet started are
/// recorded as cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tracks consecutive endpoint failures in completion order.
struct FailureStreak {
    threshold: u32,
    consecutive: AtomicU32,
    tripped: AtomicBool,
}

impl FailureStreak {
    fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive: AtomicU32::new(0),
            tripped: AtomicBool::new(false),
        }
    }

    fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.consecutive.store(0, Ordering::SeqCst);
    }

    /// Returns `true` when this failure trips the threshold.
    fn record(&self, kind: FailureKind) -> bool {
        if kind == FailureKind::EmptyInput {
            // The endpoint was never contacted.
            return false;
        }
        if !kind.counts_toward_abort() {
            self.reset();
            return false;
        }
        let streak = self.consecutive.fetch_add(1, Ordering::SeqCst) + 1;
        self.threshold > 0 && streak >= self.threshold && !self.tripped.swap(true, Ordering::SeqCst)
    }
}

/// Analyze every review and return the finalized run.
///
/// Review keys are the reviews' own ids, or `row-<n>` when absent; lists in
/// the returned run follow input order.
///
/// # Errors
///
/// Returns [`BatchError::DuplicateReviewId`] if two reviews resolve to the
/// same key. Per-review failures never fail the batch.
pub async fn run_batch<B: ModelBackend>(
    analyzer: &Analyzer<B>,
    reviews: &[Review],
    options: &BatchOptions,
    cancel: &CancelToken,
) -> Result<BatchRun, BatchError> {
    let keys: Vec<String> = reviews
        .iter()
        .enumerate()
        .map(|(i, review)| review.key(i))
        .collect();

    let mut seen = HashSet::with_capacity(keys.len());
    for key in &keys {
        if !seen.insert(key.as_str()) {
            return Err(BatchError::DuplicateReviewId(key.clone()));
        }
    }

    let recorder = BatchRecorder::new();
    let streak = FailureStreak::new(options.abort_after_consecutive_failures);
    let skipped_for_cancel = AtomicBool::new(false);
    let completed = AtomicUsize::new(0);
    let total = reviews.len();
    let max_concurrency = options.max_concurrency.max(1);
    let delay = Duration::from_millis(options.inter_request_delay_ms);

    tracing::info!(
        run_id = %recorder.id(),
        reviews = total,
        max_concurrency,
        "batch run started"
    );

    stream::iter(reviews.iter().zip(&keys).enumerate())
        .map(|(index, (review, key))| {
            let recorder = &recorder;
            let streak = &streak;
            let skipped_for_cancel = &skipped_for_cancel;
            let completed = &completed;
            async move {
                if cancel.is_cancelled() {
                    skipped_for_cancel.store(true, Ordering::SeqCst);
                    recorder.record_failure(
                        index,
                        ReviewFailure {
                            review_id: key.clone(),
                            kind: FailureKind::Cancelled,
                            reason: "run cancelled before this review was started".to_owned(),
                        },
                    );
                    return;
                }
                if streak.is_tripped() {
                    recorder.record_failure(
                        index,
                        ReviewFailure {
                            review_id: key.clone(),
                            kind: FailureKind::Aborted,
                            reason: format!(
                                "run aborted after {} consecutive endpoint failures",
                                streak.threshold
                            ),
                        },
                    );
                    return;
                }

                match analyzer.analyze(review, key).await {
                    Ok(result) => {
                        streak.reset();
                        recorder.record_success(index, result);
                    }
                    Err(err) => {
                        let kind = err.kind();
                        tracing::warn!(review = %key, kind = %kind, error = %err, "review analysis failed");
                        if streak.record(kind) {
                            tracing::error!(
                                threshold = streak.threshold,
                                "consecutive endpoint failures reached threshold, aborting remaining reviews"
                            );
                        }
                        recorder.record_failure(
                            index,
                            ReviewFailure {
                                review_id: key.clone(),
                                kind,
                                reason: err.to_string(),
                            },
                        );
                    }
                }

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!(done, total, "batch progress");

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        })
        .buffer_unordered(max_concurrency)
        .for_each(|()| async {})
        .await;

    // A tripped streak means the endpoint was failing; that outranks a cancel
    // that arrived while it was tripping.
    let status = if streak.is_tripped() {
        RunStatus::Aborted
    } else if skipped_for_cancel.load(Ordering::SeqCst) {
        RunStatus::Cancelled
    } else {
        RunStatus::Completed
    };

    let run = recorder.finish(status);
    tracing::info!(
        run_id = %run.id(),
        status = %run.status(),
        analyzed = run.results().len(),
        failed = run.failures().len(),
        "batch run finished"
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_trips_once_at_threshold() {
        let streak = FailureStreak::new(2);
        assert!(!streak.record(FailureKind::Unreachable));
        assert!(streak.record(FailureKind::Timeout));
        assert!(streak.is_tripped());
        assert!(!streak.record(FailureKind::Unreachable), "trips only once");
    }

    #[test]
    fn reachable_failures_reset_the_streak() {
        let streak = FailureStreak::new(2);
        assert!(!streak.record(FailureKind::Unreachable));
        assert!(!streak.record(FailureKind::HttpStatus));
        assert!(!streak.record(FailureKind::Unreachable));
        assert!(!streak.is_tripped());
    }

    #[test]
    fn empty_input_neither_counts_nor_resets() {
        let streak = FailureStreak::new(2);
        assert!(!streak.record(FailureKind::Unreachable));
        assert!(!streak.record(FailureKind::EmptyInput));
        assert!(streak.record(FailureKind::Unreachable));
    }

    #[test]
    fn zero_threshold_never_trips() {
        let streak = FailureStreak::new(0);
        for _ in 0..100 {
            assert!(!streak.record(FailureKind::Unreachable));
        }
        assert!(!streak.is_tripped());
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
