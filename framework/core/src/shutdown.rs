use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::{Receiver, Sender};
use tokio::sync::Mutex;

/// Signals every listener that the run is over, either because the deadline has passed or
/// because the operator asked to stop.
///
/// The signal is sticky. A listener created after [ShutdownHandle::shutdown] was called still
/// observes the shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown(&self) {
        // Set before sending so that a listener subscribing in between still sees the flag.
        if self.triggered.swap(true, Ordering::AcqRel) {
            log::trace!("Shutdown already triggered");
            return;
        }

        if let Err(e) = self.sender.send(()) {
            // Fails when nobody is subscribed, the flag still carries the signal.
            log::warn!("Failed to send shutdown signal: {e:?}");
        }
    }

    /// Whether [ShutdownHandle::shutdown] has been called on this handle or any of its clones.
    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    pub fn new_listener(&self) -> DelegatedShutdownListener {
        DelegatedShutdownListener::new(self.sender.subscribe(), self.triggered.clone())
    }
}

#[derive(Clone, Debug)]
pub struct DelegatedShutdownListener {
    receiver: Arc<Mutex<Receiver<()>>>,
    triggered: Arc<AtomicBool>,
}

impl DelegatedShutdownListener {
    pub(crate) fn new(receiver: Receiver<()>, triggered: Arc<AtomicBool>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
            triggered,
        }
    }

    /// Point in time check if the shutdown signal has been received. If this returns true then
    /// no new work should be started.
    pub fn should_shutdown(&mut self) -> bool {
        if self.triggered.load(Ordering::Acquire) {
            return true;
        }

        match self.receiver.try_lock() {
            Ok(mut guard) => match guard.try_recv() {
                Ok(_) | Err(TryRecvError::Closed) => true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Lagged(_)) => false,
            },
            Err(_) => false,
        }
    }

    /// Wait for the shutdown signal. Returns immediately if shutdown was already triggered.
    ///
    /// It is safe to race this with another future so that the shutdown signal can be used to
    /// cancel the pause between iterations.
    pub async fn wait_for_shutdown(&mut self) {
        let mut guard = self.receiver.lock().await;
        if self.triggered.load(Ordering::Acquire) {
            return;
        }

        match guard.recv().await {
            Ok(()) | Err(RecvError::Closed) => {}
            Err(RecvError::Lagged(n)) => {
                log::trace!("Shutdown listener lagged by {n} messages");
            }
        }
    }
}

#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct ShutdownSignalError {
    msg: String,
}

impl Default for ShutdownSignalError {
    fn default() -> Self {
        Self {
            msg: "Execution cancelled by shutdown signal".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn listener_sees_shutdown_sent_before_it_was_created() {
        let handle = ShutdownHandle::new();
        handle.shutdown();

        let mut listener = handle.new_listener();
        assert!(listener.should_shutdown());
        assert!(handle.is_shutdown());
    }

    #[test]
    fn listener_keeps_reporting_shutdown() {
        let handle = ShutdownHandle::new();
        let mut listener = handle.new_listener();
        assert!(!listener.should_shutdown());

        handle.shutdown();
        assert!(listener.should_shutdown());
        assert!(listener.should_shutdown());
    }

    #[tokio::test]
    async fn wait_for_shutdown_wakes_on_signal() {
        let handle = ShutdownHandle::new();
        let mut listener = handle.new_listener();

        let trigger = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.shutdown();
        });

        tokio::time::timeout(Duration::from_secs(5), listener.wait_for_shutdown())
            .await
            .expect("listener should have been woken");
    }

    #[tokio::test]
    async fn wait_for_shutdown_returns_when_already_triggered() {
        let handle = ShutdownHandle::new();
        handle.shutdown();

        let mut listener = handle.new_listener();
        tokio::time::timeout(Duration::from_millis(100), listener.wait_for_shutdown())
            .await
            .expect("listener should return straight away");
    }
}
