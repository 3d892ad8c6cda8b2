use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use tracing::{debug, trace};

use crate::error::{AnimatorError, Result};
use crate::events::Operation;

/// Single-resolution completion signal shared by the event-driven and the
/// activation paths of a lifecycle run.
///
/// Only the first [`resolve`](Self::resolve) reaches the [`Completion`];
/// later calls are reported and ignored. Dropping an unresolved latch
/// resolves the completion with [`AnimatorError::Abandoned`].
#[derive(Debug)]
pub struct CompletionLatch {
    operation: Operation,
    sender: RefCell<Option<oneshot::Sender<bool>>>,
}

impl CompletionLatch {
    pub fn new(operation: Operation) -> (Self, Completion) {
        let (sender, receiver) = oneshot::channel();
        let latch = Self {
            operation,
            sender: RefCell::new(Some(sender)),
        };
        (latch, Completion { operation, receiver })
    }

    /// Resolve with `value`. Returns `false` if the latch already resolved.
    pub fn resolve(&self, value: bool) -> bool {
        let Some(sender) = self.sender.borrow_mut().take() else {
            trace!(operation = %self.operation, value, "latch already resolved");
            return false;
        };
        // the receiver may be gone if the caller dropped the completion
        let _ = sender.send(value);
        debug!(operation = %self.operation, value, "lifecycle resolved");
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.sender.borrow().is_none()
    }
}

/// Future side of a [`CompletionLatch`].
#[derive(Debug)]
#[must_use = "completions do nothing unless awaited"]
pub struct Completion {
    operation: Operation,
    receiver: oneshot::Receiver<bool>,
}

impl Completion {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl Future for Completion {
    type Output = Result<bool>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let operation = this.operation;
        Pin::new(&mut this.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| AnimatorError::Abandoned(operation)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn test_first_resolution_wins() {
        let (latch, completion) = CompletionLatch::new(Operation::Enter);
        assert!(!latch.is_resolved());
        assert!(latch.resolve(false));
        assert!(!latch.resolve(true));
        assert!(latch.is_resolved());
        assert_eq!(completion.now_or_never(), Some(Ok(false)));
    }

    #[test]
    fn test_pending_until_resolved() {
        let (latch, mut completion) = CompletionLatch::new(Operation::Leave);
        assert!((&mut completion).now_or_never().is_none());
        latch.resolve(true);
        assert_eq!(completion.now_or_never(), Some(Ok(true)));
    }

    #[test]
    fn test_dropped_latch_abandons() {
        let (latch, completion) = CompletionLatch::new(Operation::AddClass);
        drop(latch);
        assert_eq!(
            completion.now_or_never(),
            Some(Err(AnimatorError::Abandoned(Operation::AddClass)))
        );
    }

    #[test]
    fn test_resolve_after_completion_dropped() {
        let (latch, completion) = CompletionLatch::new(Operation::RemoveClass);
        drop(completion);
        assert!(latch.resolve(true));
    }
}
