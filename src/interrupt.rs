//! Broadcast wake-up primitive.
//!
//! An [`Interrupt`] keeps a registry of pending single-shot signals. Every
//! task waiting on it gets its own oneshot channel; [`Interrupt::trigger`]
//! drains the registry under one lock and fires each of them. Waiters that
//! register after a trigger are not affected by it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::{Instant, timeout_at};

#[derive(Debug, Default)]
pub struct Interrupt {
    waiters: Mutex<HashMap<u64, oneshot::Sender<()>>>,
    next_id: AtomicU64,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter now, to be awaited later.
    ///
    /// Use this when the trigger may race with work done between
    /// registering and waiting, e.g. sending a request whose reply fires
    /// the trigger.
    pub fn listen(&self) -> Waiter<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(id, tx);
        Waiter {
            interrupt: self,
            id,
            rx,
        }
    }

    /// Wake every pending waiter. Returns how many were woken.
    pub fn trigger(&self) -> usize {
        let waiters: Vec<_> = self.waiters.lock().drain().map(|(_, tx)| tx).collect();
        let count = waiters.len();
        for tx in waiters {
            // Receiver dropping concurrently is fine
            let _ = tx.send(());
        }
        count
    }

    /// Wait for a trigger. Returns `false` if `timeout` elapsed first.
    pub async fn wait(&self, timeout: Option<Duration>) -> bool {
        self.listen().wait(timeout).await
    }

    /// Wait for a trigger until `deadline`. `None` waits forever.
    pub async fn wait_until(&self, deadline: Option<Instant>) -> bool {
        self.listen().wait_until(deadline).await
    }

    /// Number of registered waiters.
    pub fn waiters(&self) -> usize {
        self.waiters.lock().len()
    }
}

/// A registration on an [`Interrupt`]. Dropping it deregisters.
#[derive(Debug)]
pub struct Waiter<'a> {
    interrupt: &'a Interrupt,
    id: u64,
    rx: oneshot::Receiver<()>,
}

impl Waiter<'_> {
    /// Wait for a trigger. Returns `false` if `timeout` elapsed first.
    pub async fn wait(self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));
        self.wait_until(deadline).await
    }

    /// Wait for a trigger until `deadline`. `None` waits forever.
    pub async fn wait_until(mut self, deadline: Option<Instant>) -> bool {
        match deadline {
            Some(deadline) => matches!(timeout_at(deadline, &mut self.rx).await, Ok(Ok(()))),
            None => (&mut self.rx).await.is_ok(),
        }
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        self.interrupt.waiters.lock().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[tokio::test(start_paused = true)]
    async fn test_trigger_wakes_all_waiters() {
        let interrupt = Arc::new(Interrupt::new());
        let mut tasks = JoinSet::new();
        for _ in 0..5 {
            let interrupt = interrupt.clone();
            tasks.spawn(async move { interrupt.wait(None).await });
        }
        while interrupt.waiters() < 5 {
            tokio::task::yield_now().await;
        }

        assert_eq!(interrupt.trigger(), 5);
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap());
        }
        assert_eq!(interrupt.waiters(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_not_early() {
        let interrupt = Interrupt::new();
        let start = Instant::now();

        assert!(!interrupt.wait(Some(Duration::from_millis(250))).await);
        assert!(start.elapsed() >= Duration::from_millis(250));
        assert_eq!(interrupt.waiters(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_does_not_affect_later_waiters() {
        let interrupt = Interrupt::new();
        assert_eq!(interrupt.trigger(), 0);
        assert!(!interrupt.wait(Some(Duration::from_millis(10))).await);
    }

    #[tokio::test]
    async fn test_listen_before_trigger_is_not_lost() {
        let interrupt = Interrupt::new();
        let waiter = interrupt.listen();
        interrupt.trigger();
        assert!(waiter.wait(None).await);
    }

    #[tokio::test]
    async fn test_dropped_waiter_deregisters() {
        let interrupt = Interrupt::new();
        let first = interrupt.listen();
        let second = interrupt.listen();
        assert_eq!(interrupt.waiters(), 2);

        drop(first);
        assert_eq!(interrupt.waiters(), 1);
        assert_eq!(interrupt.trigger(), 1);
        assert!(second.wait(None).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_deregisters() {
        let interrupt = Interrupt::new();
        let cancelled = tokio::time::timeout(Duration::from_secs(1), interrupt.wait(None)).await;
        assert!(cancelled.is_err());
        assert_eq!(interrupt.waiters(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_deadline_still_sees_trigger() {
        let interrupt = Interrupt::new();
        let waiter = interrupt.listen();
        interrupt.trigger();
        let past = Instant::now();
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(waiter.wait_until(Some(past)).await);
    }
}
