//! Completion signal.
//!
//! The core never constructs both halves of this relationship itself:
//! it exposes a creation function an external caller invokes, then only
//! consumes the future half inside [`crate::root::Root::mount`].
//! `tokio::sync::oneshot` is the one-shot promise/future primitive this
//! pairs naturally with, and `tokio` is already a workspace dependency
//! for the async runtime `Root::mount` itself needs.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// The result an orchestration-level component resolves the signal
/// with: `Ok(())` for ordinary completion, `Err(message)` when the
/// external signal itself failed. If the signal resolves with an error
/// value instead of success, `mount` surfaces that error to its caller.
pub type CompletionResult = Result<(), String>;

/// The future half `Root::mount` awaits. Polls the underlying
/// `oneshot::Receiver` directly, so it can be driven from inside a
/// `tokio::select!` arm (as `&mut CompletionSignal`) without an extra
/// `.wait()` wrapper call.
pub struct CompletionSignal(oneshot::Receiver<CompletionResult>);

/// The resolver half handed to whichever external agent component
/// declares completion.
#[derive(Clone)]
pub struct CompletionResolver(std::rc::Rc<std::cell::RefCell<Option<oneshot::Sender<CompletionResult>>>>);

impl Future for CompletionSignal {
    type Output = Result<CompletionResult, oneshot::error::RecvError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl CompletionSignal {
    pub async fn wait(self) -> Result<CompletionResult, oneshot::error::RecvError> {
        self.await
    }
}

impl CompletionResolver {
    /// Resolve the signal. A second call is a silent no-op — the
    /// channel has already been consumed, and resolving twice has no
    /// assigned meaning.
    pub fn resolve(&self, result: CompletionResult) {
        if let Some(sender) = self.0.borrow_mut().take() {
            let _ = sender.send(result);
        }
    }
}

/// Construct a fresh completion signal pair. This is the creation
/// function the core calls into at the start of `mount`.
pub fn completion_channel() -> (CompletionResolver, CompletionSignal) {
    let (tx, rx) = oneshot::channel();
    (
        CompletionResolver(std::rc::Rc::new(std::cell::RefCell::new(Some(tx)))),
        CompletionSignal(rx),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_with_success() {
        let (resolver, signal) = completion_channel();
        resolver.resolve(Ok(()));
        assert_eq!(signal.wait().await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn resolves_with_failure() {
        let (resolver, signal) = completion_channel();
        resolver.resolve(Err("agent failed".to_string()));
        assert_eq!(signal.wait().await.unwrap(), Err("agent failed".to_string()));
    }

    #[tokio::test]
    async fn second_resolve_is_a_no_op() {
        let (resolver, signal) = completion_channel();
        resolver.resolve(Ok(()));
        resolver.resolve(Err("too late".to_string()));
        assert_eq!(signal.wait().await.unwrap(), Ok(()));
    }
}
