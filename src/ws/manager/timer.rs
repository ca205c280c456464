use std::{pin::Pin, time::Duration};

use futures_util::future;
use tokio::time::Sleep;

/// Single-shot timer slot, at most one deadline is pending.
#[derive(Debug)]
pub(crate) struct Timer {
    name: &'static str,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self { name, sleep: None }
    }

    /// Arm the timer to fire after `delay`, replacing any pending deadline.
    pub fn arm(&mut self, delay: Duration) {
        log::trace!("Arm {} timer: {:?}", self.name, delay);
        self.sleep = Some(Box::pin(tokio::time::sleep(delay)));
    }

    pub fn cancel(&mut self) {
        if self.sleep.take().is_some() {
            log::trace!("Cancel {} timer", self.name);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolve when the pending deadline passes, never if disarmed.
    ///
    /// The timer is disarmed once this resolves. Dropping the future before that keeps
    /// the deadline pending.
    pub async fn fired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().await,
            None => future::pending().await,
        }

        log::trace!("{} timer fired", self.name);
        self.sleep = None;
    }
}
