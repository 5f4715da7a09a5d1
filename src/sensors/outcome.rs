use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::utils::notification::{Notification, Notifier};

/// Echo duration in echo timer ticks (25ns each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RawTickCount(pub u32);

impl RawTickCount {
    /// Converts a hardware counter value, saturating values that do not fit in 32 bits.
    /// Anything that large is far beyond the echo timeout anyway.
    pub fn from_counter(value: u64) -> Self {
        RawTickCount(u32::try_from(value).unwrap_or(u32::MAX))
    }
}

/// How a measurement cycle ended, as seen by the interrupt handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoOutcome {
    Completed(RawTickCount),
    TimedOut,
}

const CLOSED: u8 = 0;
const OPEN: u8 = 1;
const RESOLVING: u8 = 2;
const COMPLETED: u8 = 3;
const TIMED_OUT: u8 = 4;

/// Single slot mailbox between the echo interrupts and the measurement controller.
///
/// The controller opens it at the start of a cycle. The first interrupt to post moves it
/// from open to resolved through a compare-and-set, so a competing interrupt firing later
/// cannot overwrite or duplicate the outcome. Posts while the mailbox is not open are
/// dropped.
pub struct EchoMailbox {
    state: AtomicU8,
    ticks: AtomicU32,
    notification: Notification,
    notifier: Notifier,
}

impl EchoMailbox {
    pub fn new() -> Self {
        let notification = Notification::new();
        let notifier = notification.notifier();
        EchoMailbox {
            state: AtomicU8::new(CLOSED),
            ticks: AtomicU32::new(0),
            notification,
            notifier,
        }
    }

    /// Accepts exactly one outcome from now on
    pub fn open(&self) {
        self.ticks.store(0, Ordering::Relaxed);
        self.notification.reset();
        self.state.store(OPEN, Ordering::Release);
    }

    /// Stops accepting outcomes and forgets the current one
    pub fn close(&self) {
        self.state.store(CLOSED, Ordering::Release);
    }

    /// Posts `outcome` if the mailbox is still unresolved and wakes the waiting task.
    /// Returns whether this post was the one that resolved it.
    pub fn post(&self, outcome: EchoOutcome) -> bool {
        if self
            .state
            .compare_exchange(OPEN, RESOLVING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let resolved = match outcome {
            EchoOutcome::Completed(ticks) => {
                self.ticks.store(ticks.0, Ordering::Relaxed);
                COMPLETED
            }
            EchoOutcome::TimedOut => TIMED_OUT,
        };
        self.state.store(resolved, Ordering::Release);
        self.notifier.notify();
        true
    }

    /// The resolved outcome, if there is one yet
    pub fn peek(&self) -> Option<EchoOutcome> {
        match self.state.load(Ordering::Acquire) {
            COMPLETED => Some(EchoOutcome::Completed(RawTickCount(
                self.ticks.load(Ordering::Relaxed),
            ))),
            TIMED_OUT => Some(EchoOutcome::TimedOut),
            _ => None,
        }
    }

    /// Waits without blocking the executor until an outcome is posted
    pub async fn outcome(&self) -> EchoOutcome {
        loop {
            if let Some(outcome) = self.peek() {
                return outcome;
            }
            self.notification.wait().await;
        }
    }
}

impl Default for EchoMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{executor::block_on, FutureExt};
    use std::{sync::Arc, thread};

    #[test]
    fn closed_mailbox_drops_posts() {
        let mailbox = EchoMailbox::new();
        assert!(!mailbox.post(EchoOutcome::TimedOut));
        assert_eq!(mailbox.peek(), None);
    }

    #[test]
    fn first_post_wins() {
        let mailbox = EchoMailbox::new();
        mailbox.open();
        assert!(mailbox.post(EchoOutcome::Completed(RawTickCount(1200))));
        assert!(!mailbox.post(EchoOutcome::TimedOut));
        assert_eq!(
            mailbox.peek(),
            Some(EchoOutcome::Completed(RawTickCount(1200)))
        );
    }

    #[test]
    fn timeout_is_not_replaced_by_a_late_echo() {
        let mailbox = EchoMailbox::new();
        mailbox.open();
        assert!(mailbox.post(EchoOutcome::TimedOut));
        assert!(!mailbox.post(EchoOutcome::Completed(RawTickCount(5))));
        assert_eq!(mailbox.peek(), Some(EchoOutcome::TimedOut));
    }

    #[test]
    fn reopening_clears_the_previous_outcome() {
        let mailbox = EchoMailbox::new();
        mailbox.open();
        mailbox.post(EchoOutcome::TimedOut);
        mailbox.open();
        assert_eq!(mailbox.peek(), None);
        assert!(mailbox.outcome().now_or_never().is_none());
    }

    #[test]
    fn outcome_posted_from_another_thread_wakes_the_waiter() {
        let mailbox = Arc::new(EchoMailbox::new());
        mailbox.open();
        let isr = {
            let mailbox = mailbox.clone();
            thread::spawn(move || mailbox.post(EchoOutcome::Completed(RawTickCount(42))))
        };
        assert_eq!(
            block_on(mailbox.outcome()),
            EchoOutcome::Completed(RawTickCount(42))
        );
        assert!(isr.join().unwrap());
    }

    #[test]
    fn racing_posters_resolve_exactly_once() {
        for _ in 0..100 {
            let mailbox = Arc::new(EchoMailbox::new());
            mailbox.open();
            let posters: Vec<_> = [
                EchoOutcome::Completed(RawTickCount(7)),
                EchoOutcome::TimedOut,
            ]
            .into_iter()
            .map(|outcome| {
                let mailbox = mailbox.clone();
                thread::spawn(move || mailbox.post(outcome))
            })
            .collect();
            let wins = posters
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|won| *won)
                .count();
            assert_eq!(wins, 1);
            assert!(mailbox.peek().is_some());
        }
    }

    #[test]
    fn oversized_counter_values_saturate() {
        assert_eq!(RawTickCount::from_counter(u64::MAX), RawTickCount(u32::MAX));
        assert_eq!(RawTickCount::from_counter(236_000), RawTickCount(236_000));
    }
}
