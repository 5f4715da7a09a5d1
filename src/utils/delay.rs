use std::{future::Future, time::Duration};

/// Non blocking delay the measurement controller awaits while other futures keep running
pub trait AsyncDelay {
    fn delay(&mut self, duration: Duration) -> impl Future<Output = ()> + '_;
}

#[cfg(target_os = "espidf")]
pub use esp::TaskTimerDelay;

#[cfg(target_os = "espidf")]
mod esp {
    use std::{future::Future, time::Duration};

    use esp_idf_svc::timer::{EspAsyncTimer, EspTaskTimerService};

    use super::AsyncDelay;
    use crate::utils::timer_driver::TimerDriverError;

    /// Delay backed by an esp-idf task timer, so waiting does not hold up the executor
    pub struct TaskTimerDelay {
        timer: EspAsyncTimer,
    }

    impl TaskTimerDelay {
        /// # Errors
        ///
        /// - `TimerDriverError::CouldNotSetTimer`: If the timer cannot be created.
        pub fn new(timer_service: &EspTaskTimerService) -> Result<Self, TimerDriverError> {
            let timer = timer_service
                .timer_async()
                .map_err(|_| TimerDriverError::CouldNotSetTimer)?;
            Ok(TaskTimerDelay { timer })
        }
    }

    impl AsyncDelay for TaskTimerDelay {
        fn delay(&mut self, duration: Duration) -> impl Future<Output = ()> + '_ {
            async move {
                if self.timer.after(duration).await.is_err() {
                    log::warn!("Task timer failed, ending delay early");
                }
            }
        }
    }
}
