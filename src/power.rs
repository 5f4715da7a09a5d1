use std::time::Duration;

/// Ends a wake cycle. On the device this does not return: the chip resets when it wakes
/// up and the next cycle starts from `main`.
pub trait PowerManager {
    fn sleep_for(&mut self, duration: Duration);
}

#[cfg(target_os = "espidf")]
pub use esp::DeepSleep;

#[cfg(target_os = "espidf")]
mod esp {
    use std::time::Duration;

    use esp_idf_svc::sys::esp_deep_sleep;

    use super::PowerManager;

    /// Timer woken deep sleep
    #[derive(Debug, Default)]
    pub struct DeepSleep;

    impl PowerManager for DeepSleep {
        fn sleep_for(&mut self, duration: Duration) {
            log::info!("Entering deep sleep for {}ms", duration.as_millis());
            let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
            unsafe { esp_deep_sleep(micros) };
        }
    }
}
