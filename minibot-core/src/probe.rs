//! Sequential first-success probing.
//!
//! The platform rejects a media-kind/send-method mismatch per call instead of
//! accepting a generic file, so the client has to try type-specific calls in
//! order until one is accepted. [`probe`] isolates that policy: attempts run
//! strictly one after another, a fatal result stops the search immediately,
//! and attempts after a winner or a fatal result are never polled.

use futures::future::BoxFuture;

/// Result of a [`probe`] run: the index of the winning attempt (if any) and
/// every result gathered up to the stop point, winner included.
#[derive(Debug)]
pub struct ProbeOutcome<T> {
    pub winner: Option<usize>,
    pub results: Vec<T>,
}

impl<T> ProbeOutcome<T> {
    /// The winning result, when one attempt succeeded.
    pub fn winning(&self) -> Option<&T> {
        self.winner.map(|i| &self.results[i])
    }

    /// Consumes the outcome and returns the winning result.
    pub fn into_winning(mut self) -> Option<T> {
        self.winner.map(|i| self.results.swap_remove(i))
    }
}

/// Runs `attempts` in order until one satisfies `is_success`.
///
/// `is_fatal` is checked first on each produced result; a fatal result stops
/// the search with no winner. Futures are lazy, so attempts past the stop
/// point never execute.
pub async fn probe<T>(
    is_success: impl Fn(&T) -> bool,
    is_fatal: impl Fn(&T) -> bool,
    attempts: Vec<BoxFuture<'_, T>>,
) -> ProbeOutcome<T> {
    let mut results = Vec::new();
    for (i, attempt) in attempts.into_iter().enumerate() {
        let result = attempt.await;
        let fatal = is_fatal(&result);
        let success = is_success(&result);
        results.push(result);
        if fatal {
            return ProbeOutcome {
                winner: None,
                results,
            };
        }
        if success {
            return ProbeOutcome {
                winner: Some(i),
                results,
            };
        }
    }
    ProbeOutcome {
        winner: None,
        results,
    }
}
