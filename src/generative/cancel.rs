//! Cooperative cancellation built on channel disconnection.

use std::sync::Mutex;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Create a linked handle and token.
///
/// Cancelling the handle, or dropping it, cancels every clone of the token.
pub fn cancellation() -> (CancelHandle, CancellationToken) {
    let (tx, rx) = crossbeam_channel::bounded::<()>(0);
    (
        CancelHandle {
            sender: Mutex::new(Some(tx)),
        },
        CancellationToken { receiver: rx },
    )
}

/// Observes cancellation. Cheap to clone and share across threads.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    receiver: Receiver<()>,
}

impl CancellationToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self {
            receiver: crossbeam_channel::never(),
        }
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Channel that becomes ready once cancelled, for use in `select!`.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::never()
    }
}

/// Requests cancellation of its linked tokens.
#[derive(Debug)]
pub struct CancelHandle {
    sender: Mutex<Option<Sender<()>>>,
}

impl CancelHandle {
    /// Cancel. Idempotent.
    pub fn cancel(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
    }
}
