use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::{Receiver, Sender};
use tokio::sync::Mutex;

/// Signals a running sweep to stop.
///
/// Aborting is sticky: once [AbortHandle::abort] has been called every listener reports the abort
/// for the rest of its life, no matter how many times it has been checked.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    sender: Sender<()>,
    aborted: Arc<AtomicBool>,
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn abort(&self) {
        if self.aborted.swap(true, Ordering::SeqCst) {
            log::debug!("Abort already requested");
            return;
        }

        if let Err(e) = self.sender.send(()) {
            // Will fail if nobody is waiting on the signal, the flag is enough in that case.
            log::debug!("No listeners woken by abort signal: {e:?}");
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn new_listener(&self) -> AbortListener {
        AbortListener::new(self.sender.subscribe(), self.aborted.clone())
    }
}

#[derive(Clone, Debug)]
pub struct AbortListener {
    receiver: Arc<Mutex<Receiver<()>>>,
    aborted: Arc<AtomicBool>,
}

impl AbortListener {
    pub(crate) fn new(receiver: Receiver<()>, aborted: Arc<AtomicBool>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
            aborted,
        }
    }

    /// Point in time check of the abort flag. Checked at the top of every frame callback.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Wait until an abort is requested. Returns immediately if it already has been.
    ///
    /// It is safe to race this with another future, which is how a paced frame loop wakes up early
    /// to let the next callback observe the abort.
    pub async fn wait_for_abort(&mut self) {
        if self.is_aborted() {
            return;
        }

        let received = self.receiver.lock().await.recv().await;
        if received.is_err() && !self.is_aborted() {
            // Every handle is gone so nothing can abort us any more.
            std::future::pending::<()>().await;
        }
    }
}
