//! Outcome Module
//!
//! The value a memoized function produces: either ready now, or a pending
//! computation that every caller with the same key shares.

use std::fmt;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt, Shared};

/// A pending result that can be cloned and awaited by any number of callers.
pub type PendingResult<T, E> = Shared<BoxFuture<'static, std::result::Result<T, E>>>;

// == Outcome ==
/// Result of invoking a memoized function.
pub enum Outcome<T, E> {
    /// Computed synchronously
    Ready(T),
    /// Still running; resolves to the function's eventual result
    Pending(PendingResult<T, E>),
}

impl<T, E> Outcome<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wraps an asynchronous computation into a shareable pending outcome.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        Outcome::Pending(future.boxed().shared())
    }

    /// Waits for the final value. Ready outcomes resolve immediately.
    pub async fn resolve(self) -> std::result::Result<T, E> {
        match self {
            Outcome::Ready(value) => Ok(value),
            Outcome::Pending(pending) => pending.await,
        }
    }

    /// Returns the final result if it is already known, without polling.
    pub fn peek_result(&self) -> Option<std::result::Result<T, E>> {
        match self {
            Outcome::Ready(value) => Some(Ok(value.clone())),
            Outcome::Pending(pending) => pending.peek().cloned(),
        }
    }
}

impl<T, E> Outcome<T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }

    /// Returns the synchronous value, if any.
    pub fn ready(&self) -> Option<&T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Pending(_) => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Pending(_) => None,
        }
    }

    /// True when both outcomes are handles to the same pending computation.
    pub fn ptr_eq(&self, other: &Self) -> bool
    where
        T: Clone,
        E: Clone,
    {
        match (self, other) {
            (Outcome::Pending(a), Outcome::Pending(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl<T: Clone, E: Clone> Clone for Outcome<T, E> {
    fn clone(&self) -> Self {
        match self {
            Outcome::Ready(value) => Outcome::Ready(value.clone()),
            Outcome::Pending(pending) => Outcome::Pending(pending.clone()),
        }
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Outcome<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Outcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl<T, E> From<T> for Outcome<T, E> {
    fn from(value: T) -> Self {
        Outcome::Ready(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_ready_accessors() {
        let outcome: Outcome<u32, String> = Outcome::Ready(3);

        assert!(outcome.is_ready());
        assert!(!outcome.is_pending());
        assert_eq!(outcome.ready(), Some(&3));
        assert_eq!(outcome.peek_result(), Some(Ok(3)));
        assert_eq!(outcome.into_ready(), Some(3));
    }

    #[test]
    fn test_pending_clones_share_computation() {
        let outcome: Outcome<u32, String> = Outcome::pending(async { Ok(5) });
        let copy = outcome.clone();
        let other: Outcome<u32, String> = Outcome::pending(async { Ok(5) });

        assert!(outcome.ptr_eq(&copy));
        assert!(!outcome.ptr_eq(&other));
        assert!(!Outcome::<u32, String>::Ready(5).ptr_eq(&Outcome::Ready(5)));
    }

    #[test]
    fn test_pending_resolves_once_signalled() {
        let (tx, rx) = oneshot::channel::<u32>();
        let outcome: Outcome<u32, String> =
            Outcome::pending(async move { rx.await.map_err(|_| "dropped".to_string()) });
        assert_eq!(outcome.peek_result(), None);

        let mut resolve = task::spawn(outcome.clone().resolve());
        assert_pending!(resolve.poll());

        tx.send(9).unwrap();
        assert!(resolve.is_woken());
        assert_eq!(assert_ready!(resolve.poll()), Ok(9));
        assert_eq!(outcome.peek_result(), Some(Ok(9)));
    }

    #[tokio::test]
    async fn test_pending_failure_reaches_every_awaiter() {
        let outcome: Outcome<u32, String> = Outcome::pending(async { Err("nope".to_string()) });

        assert_eq!(outcome.clone().resolve().await, Err("nope".to_string()));
        assert_eq!(outcome.resolve().await, Err("nope".to_string()));
    }

    #[test]
    fn test_debug_hides_pending_internals() {
        let ready: Outcome<u32, String> = 4.into();
        let pending: Outcome<u32, String> = Outcome::pending(async { Ok(4) });

        assert_eq!(format!("{:?}", ready), "Ready(4)");
        assert_eq!(format!("{:?}", pending), "Pending(..)");
    }
}
