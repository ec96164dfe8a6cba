//! Ctrl-C handling for the chat loop.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::error::{Error, Result};

#[derive(Default)]
struct Inner {
    triggered: AtomicBool,
    notify: Notify,
}

/// A latch set by the user's interrupt request.
///
/// Clones share the same latch. The signal handler only sets the flag and
/// wakes whoever is waiting; the chat loop decides how to wind down.
#[derive(Clone, Default)]
pub struct Interrupt {
    inner: Arc<Inner>,
}

impl Interrupt {
    /// Creates an untriggered latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes Ctrl-C (and termination signals) to this latch.
    ///
    /// May be called at most once per process.
    pub fn install(&self) -> Result<()> {
        let this = self.clone();
        ctrlc::set_handler(move || this.trigger()).map_err(|err| {
            Error::io(
                "failed to install interrupt handler",
                io::Error::other(err.to_string()),
            )
        })
    }

    /// Sets the latch and wakes any waiter.
    pub fn trigger(&self) {
        self.inner.triggered.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    /// Returns true once the latch has been set.
    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Completes once the latch is set.
    ///
    /// ```
    /// # tokio_test::block_on(async {
    /// let interrupt = gemchat::chat::Interrupt::new();
    /// interrupt.clone().trigger();
    /// interrupt.notified().await;
    /// assert!(interrupt.is_triggered());
    /// # });
    /// ```
    pub async fn notified(&self) {
        if self.is_triggered() {
            return;
        }
        self.inner.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_wakes_waiter() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.is_triggered());

        let remote = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            remote.trigger();
        });
        tokio::time::timeout(Duration::from_secs(5), interrupt.notified())
            .await
            .unwrap();
        assert!(interrupt.is_triggered());
    }

    #[tokio::test]
    async fn notified_returns_immediately_when_already_set() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        tokio::time::timeout(Duration::from_millis(100), interrupt.notified())
            .await
            .unwrap();
    }
}
