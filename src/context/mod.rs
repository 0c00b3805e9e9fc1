//! Execution context threaded through the handler pipeline
//!
//! A [`Context`] carries a cancellation token and an optional deadline.
//! Nothing here preempts a running handler: handlers observe the context
//! themselves (usually via [`Context::check`]) and return early.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::errors::{CodecflowError, Result};

/// Cancellation/deadline carrier passed to every handler
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context
    ///
    /// Cancelling the parent cancels the child, not the other way round.
    /// The child keeps the parent's deadline unless `timeout` is sooner.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let deadline = match (self.deadline, timeout.map(|t| Instant::now() + t)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    /// Request cancellation of this context and all of its children
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before the deadline, if one is set
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail with the reason this context is done, if it is
    ///
    /// Cancellation wins over an expired deadline.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(CodecflowError::Cancelled);
        }
        if self.is_expired() {
            return Err(CodecflowError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Wait until cancellation is requested
    ///
    /// Only the token is awaited; deadlines are checked with [`Context::check`].
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// The underlying token, for handing to async tasks
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_done() {
        let ctx = Context::background();
        assert!(!ctx.is_cancelled());
        assert!(!ctx.is_expired());
        assert!(ctx.deadline().is_none());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_cancel() {
        let ctx = Context::background();
        ctx.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(CodecflowError::Cancelled)));
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        assert!(matches!(ctx.check(), Err(CodecflowError::DeadlineExceeded)));
    }

    #[test]
    fn test_cancel_wins_over_deadline() {
        let ctx = Context::with_timeout(Duration::ZERO);
        ctx.cancel();
        assert!(matches!(ctx.check(), Err(CodecflowError::Cancelled)));
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = Context::background();
        let child = parent.child(None);
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = Context::background();
        let child = parent.child(None);
        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_child_takes_sooner_deadline() {
        let parent = Context::with_timeout(Duration::from_secs(60));
        let child = parent.child(Some(Duration::from_secs(1)));
        assert!(child.deadline().unwrap() < parent.deadline().unwrap());

        let relaxed = parent.child(Some(Duration::from_secs(3600)));
        assert_eq!(relaxed.deadline(), parent.deadline());
    }
}
