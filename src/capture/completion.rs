//! One-shot rendezvous between an asynchronous platform call and its caller

use tokio::sync::oneshot;

use crate::capture::{Completion, PlatformError};

/// Receiving half of a completion: the caller blocks on it until the
/// platform's handler fires.
#[derive(Debug)]
pub struct CompletionSignal<T> {
    rx: oneshot::Receiver<Result<T, PlatformError>>,
}

/// Creates a handler to hand to the platform and the signal to wait on.
pub fn completion_pair<T: Send + 'static>() -> (Completion<T>, CompletionSignal<T>) {
    let (tx, rx) = oneshot::channel();
    let completion: Completion<T> = Box::new(move |result| {
        // the waiter may already be gone when the caller was torn down
        let _ = tx.send(result);
    });
    (completion, CompletionSignal { rx })
}

/// Outcome observed by the waiting side.
#[derive(Debug, PartialEq, Eq)]
pub enum Signaled<T> {
    Completed(Result<T, PlatformError>),
    /// The handler was dropped without being called.
    Abandoned,
}

impl<T> CompletionSignal<T> {
    /// Blocks the calling thread until the handler fires or is dropped.
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait(self) -> Signaled<T> {
        match self.rx.blocking_recv() {
            Ok(result) => Signaled::Completed(result),
            Err(_) => Signaled::Abandoned,
        }
    }
}
