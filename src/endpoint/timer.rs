// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-shot timers with a cancel-then-arm discipline.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::DriverEvent;

/// Shortest delay any endpoint timer may use.
pub const MIN_CYCLE_TIME: Duration = Duration::from_millis(50);

/// One timer slot per purpose.
///
/// Arming always cancels the previous timer first, so a slot never has more
/// than one pending timer. Each arm gets a fresh ticket; the event delivered
/// on expiry carries it, and [`TimerSlot::fire`] only accepts the ticket of
/// the currently armed timer. An expiry that raced with a cancel is thereby
/// ignored even if its event was already queued.
#[derive(Debug)]
pub(crate) struct TimerSlot {
    name: &'static str,
    ticket: u64,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            ticket: 0,
            handle: None,
        }
    }

    /// Cancels any pending timer and arms a new one.
    ///
    /// After `delay` (at least [`MIN_CYCLE_TIME`]) the event built by
    /// `event` from the new ticket is sent to the driver.
    pub(crate) fn arm<F>(
        &mut self,
        delay: Duration,
        tx: mpsc::UnboundedSender<DriverEvent>,
        event: F,
    )
    where
        F: FnOnce(u64) -> DriverEvent + Send + 'static,
    {
        self.cancel();
        self.ticket += 1;
        let ticket = self.ticket;
        let delay = delay.max(MIN_CYCLE_TIME);

        tracing::debug!(timer = self.name, ticket, ?delay, "Timer armed");

        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event(ticket));
        }));
    }

    /// Cancels the pending timer. Returns `true` if one was pending.
    pub(crate) fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                tracing::trace!(timer = self.name, ticket = self.ticket, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Consumes an expiry. Returns `true` only for the currently armed ticket.
    pub(crate) fn fire(&mut self, ticket: u64) -> bool {
        if self.handle.is_some() && ticket == self.ticket {
            self.handle = None;
            true
        } else {
            tracing::trace!(timer = self.name, ticket, "Ignoring stale timer expiry");
            false
        }
    }

    /// Returns true if a timer is pending.
    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expiry(ticket: u64) -> DriverEvent {
        DriverEvent::RecheckTimer { ticket }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new("test");

        slot.arm(Duration::from_secs(5), tx, expiry);
        assert!(slot.is_armed());

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let Ok(DriverEvent::RecheckTimer { ticket }) = rx.try_recv() else {
            panic!("timer did not fire");
        };
        assert!(slot.fire(ticket));
        assert!(!slot.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_pending_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new("test");

        slot.arm(Duration::from_secs(5), tx.clone(), expiry);
        tokio::time::sleep(Duration::from_secs(3)).await;
        slot.arm(Duration::from_secs(5), tx, expiry);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err(), "first timer must have been cancelled");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(matches!(rx.try_recv(), Ok(DriverEvent::RecheckTimer { ticket: 2 })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_floored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new("test");

        slot.arm(Duration::ZERO, tx, expiry);

        tokio::time::sleep(Duration::from_millis(49)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticket_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new("test");

        slot.arm(Duration::from_secs(1), tx.clone(), expiry);
        slot.arm(Duration::from_secs(1), tx, expiry);

        assert!(!slot.fire(1));
        assert!(slot.fire(2));
        assert!(!slot.fire(2));
    }

    #[tokio::test]
    async fn cancel_reports_pending() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut slot = TimerSlot::new("test");

        assert!(!slot.cancel());
        slot.arm(Duration::from_secs(1), tx, expiry);
        assert!(slot.cancel());
        assert!(!slot.is_armed());
    }
}
