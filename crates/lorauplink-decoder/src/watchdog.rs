use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Background timer that raises an interrupt flag once the budget elapses.
///
/// Disarming (or dropping) wakes the timer thread immediately and joins it,
/// so a watchdog can never fire into a later decode call.
pub(crate) struct Watchdog {
    disarm: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    fired: Arc<AtomicBool>,
}

impl Watchdog {
    pub(crate) fn arm(budget: Duration, fired: Arc<AtomicBool>) -> std::io::Result<Self> {
        let (disarm, disarmed) = mpsc::channel::<()>();
        let flag = Arc::clone(&fired);

        let handle = thread::Builder::new()
            .name("decoder-watchdog".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = disarmed.recv_timeout(budget) {
                    flag.store(true, Ordering::SeqCst);
                    tracing::debug!(?budget, "decoder budget elapsed, interrupting script");
                }
            })?;

        Ok(Self {
            disarm: Some(disarm),
            handle: Some(handle),
            fired,
        })
    }

    /// Stop the timer and report whether it fired.
    pub(crate) fn disarm(mut self) -> bool {
        self.stop();
        self.fired.load(Ordering::SeqCst)
    }

    fn stop(&mut self) {
        drop(self.disarm.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop();
    }
}
