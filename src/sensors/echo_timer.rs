use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::outcome::{EchoMailbox, EchoOutcome, RawTickCount};
use crate::utils::timer_driver::HwCounter;

/// Measures how long the echo line stays high.
///
/// The counter runs at 40MHz between the rising and falling edge of the echo. Its alarm,
/// at [crate::config::ECHO_TIMEOUT_TICKS], is the hardware timeout for an echo that never
/// falls. Every handler leaves the counter at zero, and only the first outcome of a cycle
/// reaches the mailbox. A falling edge only counts after a rising edge of the same cycle.
pub struct EchoTimer<C: HwCounter> {
    counter: C,
    mailbox: EchoMailbox,
    echo_started: AtomicBool,
    stale_resets: AtomicU32,
}

impl<C: HwCounter> EchoTimer<C> {
    pub fn new(counter: C) -> Self {
        EchoTimer {
            counter,
            mailbox: EchoMailbox::new(),
            echo_started: AtomicBool::new(false),
            stale_resets: AtomicU32::new(0),
        }
    }

    /// Gets the timer ready for a new cycle. Must be called before the trigger pulse.
    pub fn prepare(&self) {
        self.counter.pause();
        self.counter.reset();
        self.counter.rearm_alarm();
        self.echo_started.store(false, Ordering::SeqCst);
        self.mailbox.open();
    }

    /// Echo line went high
    pub fn on_rising_edge(&self) {
        if self.counter.value() != 0 {
            // Leftover from a cycle whose falling edge was never seen
            self.counter.reset();
            self.stale_resets.fetch_add(1, Ordering::Relaxed);
        }
        self.echo_started.store(true, Ordering::SeqCst);
        self.counter.start();
    }

    /// Echo line went low. Ignored unless the echo was seen rising in this cycle.
    pub fn on_falling_edge(&self) {
        if !self.echo_started.swap(false, Ordering::SeqCst) {
            // Glitch or missed rising edge, the counter never started
            return;
        }
        self.counter.pause();
        let ticks = RawTickCount::from_counter(self.counter.value());
        self.counter.reset();
        self.mailbox.post(EchoOutcome::Completed(ticks));
    }

    /// Alarm interrupt handler
    pub fn on_timeout(&self) {
        self.counter.pause();
        self.counter.reset();
        self.mailbox.post(EchoOutcome::TimedOut);
    }

    /// Resolves the cycle as timed out from the main task. Has no effect on the outcome if
    /// an interrupt already resolved it.
    pub fn force_timeout(&self) {
        self.on_timeout();
    }

    /// Waits for the outcome of the current cycle
    pub async fn outcome(&self) -> EchoOutcome {
        self.mailbox.outcome().await
    }

    pub fn peek_outcome(&self) -> Option<EchoOutcome> {
        self.mailbox.peek()
    }

    /// Stops accepting outcomes until the next [EchoTimer::prepare]
    pub fn finish(&self) {
        self.mailbox.close();
    }

    /// Number of rising edges that found a running or unread counter since the last call
    pub fn take_stale_resets(&self) -> u32 {
        self.stale_resets.swap(0, Ordering::Relaxed)
    }
}
