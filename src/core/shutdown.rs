//! Two-stage shutdown latch.
//!
//! The first signal requests a graceful stop through the cancellation
//! token; a running cycle is allowed to finish. A second signal means the
//! operator is done waiting and the process should die immediately.

use tokio_util::sync::CancellationToken;

/// What the signal handler should do after a signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Graceful stop was requested; keep running until tasks drain.
    Graceful,
    /// Second signal; exit the process now.
    Kill,
}

/// Tracks how many shutdown signals have fired.
pub struct ShutdownLatch {
    cancel: CancellationToken,
    fired: bool,
}

impl ShutdownLatch {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            fired: false,
        }
    }

    /// Registers one signal. The first cancels the token, every later one
    /// asks for a hard kill.
    pub fn fire(&mut self) -> SignalAction {
        if self.fired {
            SignalAction::Kill
        } else {
            self.fired = true;
            self.cancel.cancel();
            SignalAction::Graceful
        }
    }
}
