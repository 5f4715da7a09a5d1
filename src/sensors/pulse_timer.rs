use crate::{gpio::OutputLine, utils::timer_driver::HwCounter};

/// Generates the trigger pulse. The counter's alarm is set to
/// [crate::config::PULSE_DEADLINE_TICKS]; when it fires, [PulseTimer::on_deadline] pulls
/// the trigger low from interrupt context, so the pulse width does not depend on when
/// the main task gets scheduled.
pub struct PulseTimer<C: HwCounter, O: OutputLine> {
    counter: C,
    trigger: O,
}

impl<C: HwCounter, O: OutputLine> PulseTimer<C, O> {
    pub fn new(counter: C, trigger: O) -> Self {
        trigger.set_low();
        PulseTimer { counter, trigger }
    }

    /// Restarts the counter from zero
    pub fn arm(&self) {
        self.counter.reset();
        self.counter.rearm_alarm();
        self.counter.start();
    }

    /// Raises the trigger and arms the deadline that will lower it
    pub fn fire(&self) {
        self.trigger.set_high();
        self.arm();
    }

    /// Alarm interrupt handler
    pub fn on_deadline(&self) {
        self.trigger.set_low();
        self.counter.pause();
        self.counter.reset();
    }
}
