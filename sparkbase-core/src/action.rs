//! Deferred units of work.
//!
//! Every collection operation hands back an [`Action`] instead of doing the
//! work immediately. Nothing touches the store until [`Action::execute`] is
//! awaited, and the action runs on whatever task awaits it; no work is
//! spawned or queued. An action can be executed any number of times and
//! re-runs its computation on every call.
//!
//! ```ignore
//! let save = players.push(player);   // nothing written yet
//! save.execute().await?;             // insert happens here
//!
//! // Concurrency is the caller's choice, e.g. two actions on one task:
//! futures::try_join!(save.execute(), audit.execute())?;
//! ```

use std::{fmt, future::Future, sync::Arc};

use futures::{FutureExt, future::BoxFuture};

use crate::error::DocumentStoreResult;

type Work<'a, T> = Box<dyn Fn() -> BoxFuture<'a, DocumentStoreResult<T>> + Send + Sync + 'a>;

/// A deferred computation producing a `T`.
#[must_use = "actions do nothing until `execute` is awaited"]
pub struct Action<'a, T> {
    work: Work<'a, T>,
}

/// An [`Action`] that produces no value.
pub type VoidAction<'a> = Action<'a, ()>;

impl<'a, T: 'a> Action<'a, T> {
    /// Captures `work` without running it.
    pub fn new<F, Fut>(work: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'a,
        Fut: Future<Output = DocumentStoreResult<T>> + Send + 'a,
    {
        Self { work: Box::new(move || work().boxed()) }
    }

    /// Runs the computation and returns its result.
    ///
    /// Errors raised by the computation are returned unchanged.
    pub async fn execute(&self) -> DocumentStoreResult<T> {
        (self.work)().await
    }

    /// Derives an action whose result is `f` applied to this action's result.
    pub fn map<U, M>(self, f: M) -> Action<'a, U>
    where
        U: 'a,
        M: Fn(T) -> U + Send + Sync + 'a,
    {
        let work = self.work;
        let f = Arc::new(f);

        Action::new(move || {
            let pending = work();
            let f = Arc::clone(&f);
            async move { pending.await.map(|value| (*f)(value)) }
        })
    }
}

impl<T> fmt::Debug for Action<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("output", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentStoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_construction_does_not_run_work() {
        let counter = AtomicUsize::new(0);
        let runs = &counter;

        let action = Action::new(move || async move {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        action.execute().await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_every_execute_reruns_work() {
        let counter = AtomicUsize::new(0);
        let runs = &counter;

        let action = Action::new(move || async move { Ok(runs.fetch_add(1, Ordering::SeqCst) + 1) });

        assert_eq!(action.execute().await.unwrap(), 1);
        assert_eq!(action.execute().await.unwrap(), 2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_propagates_unchanged() {
        let action: VoidAction<'_> =
            Action::new(|| async { Err(DocumentStoreError::Backend("connection reset".to_string())) });

        let err = action.execute().await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::Backend(ref msg) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn test_map_transforms_result() {
        let counter = AtomicUsize::new(0);
        let runs = &counter;

        let count = Action::new(move || async move { Ok(runs.fetch_add(1, Ordering::SeqCst)) });
        let is_first = count.map(|n| n == 0);

        assert!(is_first.execute().await.unwrap());
        assert!(!is_first.execute().await.unwrap());
    }

    #[tokio::test]
    async fn test_map_skips_errors() {
        let failing: Action<'_, usize> =
            Action::new(|| async { Err(DocumentStoreError::Backend("down".to_string())) });

        let err = failing.map(|n| n * 2).execute().await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::Backend(_)));
    }
}
