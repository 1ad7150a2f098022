//! The oracle boundary: decides whether a candidate still exhibits the failure.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

/// A predicate that determines whether a candidate change set is interesting.
///
/// Implementations must be pure with respect to the candidate and safe to call
/// from many evaluation tasks at once. An oracle that wraps something stateful
/// (an external process, a shared sandbox) has to serialize itself.
#[async_trait]
pub trait Oracle<T>: Send + Sync
where
    T: Send + Sync,
{
    /// Returns `true` if the candidate still shows the failure.
    async fn interesting(&self, candidate: &[T]) -> bool;
}

/// An oracle backed by a synchronous closure.
///
/// The closure runs on tokio's blocking pool, so a predicate that does real
/// work (running a test, spawning a process) never stalls the runtime and
/// probes overlap up to the evaluator's concurrency limit. The candidate is
/// copied into the blocking task.
pub struct FnOracle<F> {
    predicate: Arc<F>,
}

impl<F> FnOracle<F> {
    /// Wrap a closure as an oracle.
    pub fn new(predicate: F) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }
}

#[async_trait]
impl<T, F> Oracle<T> for FnOracle<F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&[T]) -> bool + Send + Sync + 'static,
{
    async fn interesting(&self, candidate: &[T]) -> bool {
        let predicate = Arc::clone(&self.predicate);
        let candidate = candidate.to_vec();

        match tokio::task::spawn_blocking(move || predicate(&candidate)).await {
            Ok(hit) => hit,
            // Surface the predicate's panic in the calling task
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                warn!(error = %e, "Oracle task cancelled");
                false
            }
        }
    }
}

/// Interesting when the candidate contains every element of a hidden set.
///
/// Monotone: any superset of an interesting candidate is interesting, so ddmin
/// driven by this oracle converges to exactly the hidden set.
#[derive(Debug, Clone)]
pub struct SupersetOracle<T> {
    required: HashSet<T>,
}

impl<T> SupersetOracle<T>
where
    T: Eq + Hash,
{
    /// Create an oracle requiring all of `required`.
    pub fn new(required: impl IntoIterator<Item = T>) -> Self {
        Self {
            required: required.into_iter().collect(),
        }
    }

    /// Number of elements the candidate must contain.
    pub fn required_len(&self) -> usize {
        self.required.len()
    }
}

#[async_trait]
impl<T> Oracle<T> for SupersetOracle<T>
where
    T: Eq + Hash + Send + Sync,
{
    async fn interesting(&self, candidate: &[T]) -> bool {
        if candidate.len() < self.required.len() {
            return false;
        }
        let present: HashSet<&T> = candidate
            .iter()
            .filter(|c| self.required.contains(*c))
            .collect();
        present.len() == self.required.len()
    }
}
