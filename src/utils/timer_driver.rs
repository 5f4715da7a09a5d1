/// A free running hardware counter that interrupt handlers can drive directly. Every
/// operation takes `&self` so the same counter can be shared between the main task and
/// the interrupts that start, stop and read it.
pub trait HwCounter: Send + Sync {
    /// Resumes counting from the current value.
    fn start(&self);

    /// Stops counting, keeping the current value.
    fn pause(&self);

    /// Sets the counter back to zero without changing whether it runs.
    fn reset(&self);

    /// Current counter value in ticks.
    fn value(&self) -> u64;

    /// Enables the alarm again so the next time the threshold is reached the deadline
    /// interrupt fires.
    fn rearm_alarm(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDriverError {
    CannotSetTimerCounter,
    CouldNotSetTimer,
    InvalidTimer,
    SubscriptionError,
}

#[cfg(target_os = "espidf")]
pub use esp::{CounterTimer, GroupTimer};

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::hal::timer::{self, TimerConfig};
    use esp_idf_svc::sys::{
        timer_alarm_t_TIMER_ALARM_EN, timer_get_counter_value, timer_group_t,
        timer_group_t_TIMER_GROUP_0, timer_idx_t, timer_idx_t_TIMER_0, timer_idx_t_TIMER_1,
        timer_pause, timer_set_alarm, timer_set_counter_value, timer_start,
    };

    use super::{HwCounter, TimerDriverError};
    use crate::microcontroller_src::peripherals::Peripheral;

    /// Handle on one of the group 0 timers. It only holds the group and index, so it can be
    /// copied into interrupt callbacks. The esp-idf calls it makes only fail on invalid
    /// arguments, which [GroupTimer::for_timer] rules out, so their results are ignored.
    #[derive(Debug, Clone, Copy)]
    pub struct GroupTimer {
        group: timer_group_t,
        index: timer_idx_t,
    }

    impl GroupTimer {
        fn for_timer(timer_num: u8) -> Result<Self, TimerDriverError> {
            let index = match timer_num {
                0 => timer_idx_t_TIMER_0,
                1 => timer_idx_t_TIMER_1,
                _ => return Err(TimerDriverError::InvalidTimer),
            };
            Ok(GroupTimer {
                group: timer_group_t_TIMER_GROUP_0,
                index,
            })
        }
    }

    impl HwCounter for GroupTimer {
        fn start(&self) {
            unsafe { timer_start(self.group, self.index) };
        }

        fn pause(&self) {
            unsafe { timer_pause(self.group, self.index) };
        }

        fn reset(&self) {
            unsafe { timer_set_counter_value(self.group, self.index, 0) };
        }

        fn value(&self) -> u64 {
            let mut value: u64 = 0;
            unsafe { timer_get_counter_value(self.group, self.index, &mut value) };
            value
        }

        fn rearm_alarm(&self) {
            unsafe { timer_set_alarm(self.group, self.index, timer_alarm_t_TIMER_ALARM_EN) };
        }
    }

    /// Owns a group timer configured as a paused up-counter with a single alarm. The
    /// driver has to stay alive for as long as its interrupt callback is subscribed.
    pub struct CounterTimer<'a> {
        driver: timer::TimerDriver<'a>,
        counter: GroupTimer,
    }

    impl<'a> CounterTimer<'a> {
        /// Configures the timer behind `timer` with the given prescaler and alarm. The
        /// counter starts paused at zero.
        ///
        /// # Arguments
        ///
        /// - `timer`: A `Peripheral::Timer` taken from the board peripherals.
        /// - `divider`: Prescaler applied to the 80MHz APB clock.
        /// - `auto_reload`: Whether the counter reloads to zero when the alarm fires.
        /// - `alarm_ticks`: Counter value at which the deadline interrupt fires.
        ///
        /// # Errors
        ///
        /// - `TimerDriverError::InvalidTimer`: If `timer` is not a timer peripheral or the driver
        ///   cannot be created.
        /// - `TimerDriverError::CannotSetTimerCounter`: If the counter cannot be cleared.
        /// - `TimerDriverError::CouldNotSetTimer`: If the alarm cannot be configured.
        pub fn new(
            timer: Peripheral,
            divider: u32,
            auto_reload: bool,
            alarm_ticks: u64,
        ) -> Result<CounterTimer<'a>, TimerDriverError> {
            let config = TimerConfig::new().divider(divider).auto_reload(auto_reload);
            let (driver, counter) = match timer {
                Peripheral::Timer(0) => (
                    timer::TimerDriver::new(unsafe { timer::TIMER00::new() }, &config),
                    GroupTimer::for_timer(0)?,
                ),
                Peripheral::Timer(1) => (
                    timer::TimerDriver::new(unsafe { timer::TIMER01::new() }, &config),
                    GroupTimer::for_timer(1)?,
                ),
                _ => return Err(TimerDriverError::InvalidTimer),
            };
            let mut driver = driver.map_err(|_| TimerDriverError::InvalidTimer)?;

            driver
                .enable(false)
                .map_err(|_| TimerDriverError::CouldNotSetTimer)?;
            driver
                .set_counter(0)
                .map_err(|_| TimerDriverError::CannotSetTimerCounter)?;
            driver
                .set_alarm(alarm_ticks)
                .map_err(|_| TimerDriverError::CouldNotSetTimer)?;
            driver
                .enable_alarm(true)
                .map_err(|_| TimerDriverError::CouldNotSetTimer)?;

            Ok(CounterTimer { driver, counter })
        }

        /// Subscribes `callback` to the alarm interrupt and enables it. The callback runs in
        /// interrupt context.
        ///
        /// # Errors
        ///
        /// - `TimerDriverError::SubscriptionError`: If the callback cannot be registered.
        /// - `TimerDriverError::CouldNotSetTimer`: If the interrupt cannot be enabled.
        pub fn subscribe<F: FnMut() + Send + 'static>(
            &mut self,
            callback: F,
        ) -> Result<(), TimerDriverError> {
            unsafe { self.driver.subscribe(callback) }
                .map_err(|_| TimerDriverError::SubscriptionError)?;
            self.driver
                .enable_interrupt()
                .map_err(|_| TimerDriverError::CouldNotSetTimer)
        }

        /// Copyable handle to the counter for interrupt handlers
        pub fn counter(&self) -> GroupTimer {
            self.counter
        }

        pub fn tick_hz(&self) -> u64 {
            self.driver.tick_hz()
        }
    }
}
