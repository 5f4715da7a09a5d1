use std::{future::Future, sync::Arc};

use esp_idf_svc::{eventloop::EspSystemEventLoop, hal::task::block_on, timer::EspTaskTimerService};

use crate::{
    config,
    gpio::{DigitalIn, DigitalOut, RawOutputPin},
    microcontroller_src::peripherals::Peripherals,
    power::DeepSleep,
    sensors::{EchoTimer, PulseTimer, HCSR04},
    telemetry::InfluxPublisher,
    utils::{
        delay::TaskTimerDelay,
        node_error::NodeError,
        timer_driver::{CounterTimer, GroupTimer},
    },
    wifi::{http::HttpClient, WifiDriver},
};

pub type Sensor = HCSR04<GroupTimer, RawOutputPin, TaskTimerDelay>;

/// The rangefinder and the drivers backing it. The drivers own the pins and timers the
/// interrupt handlers use, so they must live as long as the sensor.
pub struct Rangefinder<'a> {
    pub sensor: Sensor,
    _trigger: DigitalOut<'a>,
    _power: DigitalOut<'a>,
    _echo: DigitalIn<'a>,
    _pulse_timer: CounterTimer<'a>,
    _echo_timer: CounterTimer<'a>,
}

/// Primary abstraction for interacting with the microcontroller, handing out the drivers
/// the node is built from.
///
/// - `peripherals`: The peripherals not taken yet.
/// - `event_loop`: System event loop, used by the wifi driver.
/// - `timer_service`: Task timer service, used by the wifi driver and the async delays.
pub struct Microcontroller {
    peripherals: Peripherals,
    event_loop: EspSystemEventLoop,
    timer_service: EspTaskTimerService,
}

impl Microcontroller {
    /// Creates a new Microcontroller instance
    ///
    /// # Errors
    ///
    /// - `NodeError::SystemServiceUnavailable`: If the event loop or the timer service was
    ///   already taken.
    pub fn new() -> Result<Self, NodeError> {
        Ok(Microcontroller {
            peripherals: Peripherals::new(),
            event_loop: EspSystemEventLoop::take()
                .map_err(|_| NodeError::SystemServiceUnavailable)?,
            timer_service: EspTaskTimerService::new()
                .map_err(|_| NodeError::SystemServiceUnavailable)?,
        })
    }

    /// Creates a DigitalIn on the ESP pin with number `pin_num`
    ///
    /// # Errors
    ///
    /// - `NodeError::DigitalInError`: If the pin cannot be configured as an input.
    pub fn set_pin_as_digital_in<'a>(&mut self, pin_num: usize) -> Result<DigitalIn<'a>, NodeError> {
        let pin_peripheral = self.peripherals.get_digital_pin(pin_num);
        Ok(DigitalIn::new(pin_peripheral)?)
    }

    /// Creates a DigitalOut on the ESP pin with number `pin_num`, driven low
    ///
    /// # Errors
    ///
    /// - `NodeError::DigitalOutError`: If the pin cannot be configured as an output.
    pub fn set_pin_as_digital_out<'a>(
        &mut self,
        pin_num: usize,
    ) -> Result<DigitalOut<'a>, NodeError> {
        let pin_peripheral = self.peripherals.get_digital_pin(pin_num);
        Ok(DigitalOut::new(pin_peripheral)?)
    }

    /// Configures timer `timer_num` of group 0 as a paused counter with an alarm
    ///
    /// # Errors
    ///
    /// - `NodeError::TimerDriverError`: If the timer is taken or cannot be configured.
    pub fn get_counter_timer<'a>(
        &mut self,
        timer_num: usize,
        divider: u32,
        auto_reload: bool,
        alarm_ticks: u64,
    ) -> Result<CounterTimer<'a>, NodeError> {
        let timer = self.peripherals.get_timer(timer_num);
        Ok(CounterTimer::new(timer, divider, auto_reload, alarm_ticks)?)
    }

    /// # Errors
    ///
    /// - `NodeError::WifiError`: If the modem was already taken or the driver cannot start.
    pub fn get_wifi_driver<'a>(&mut self) -> Result<WifiDriver<'a>, NodeError> {
        let modem = self.peripherals.get_wifi_peripheral().into_modem()?;
        Ok(WifiDriver::new(
            self.event_loop.clone(),
            self.timer_service.clone(),
            modem,
        )?)
    }

    /// # Errors
    ///
    /// - `NodeError::WifiError`: If the HTTP connection cannot be created.
    pub fn get_influx_publisher(
        &self,
        wifi: &WifiDriver<'_>,
    ) -> Result<InfluxPublisher<HttpClient>, NodeError> {
        Ok(InfluxPublisher::from_config(wifi.get_http_client()?))
    }

    /// # Errors
    ///
    /// - `NodeError::TimerDriverError`: If the task timer cannot be created.
    pub fn get_delay(&self) -> Result<TaskTimerDelay, NodeError> {
        Ok(TaskTimerDelay::new(&self.timer_service)?)
    }

    pub fn get_power_manager(&self) -> DeepSleep {
        DeepSleep
    }

    /// Wires the rangefinder: trigger and power outputs, the echo input and both timers,
    /// with their interrupt handlers subscribed.
    ///
    /// # Errors
    ///
    /// - `NodeError`: If any of the pins or timers cannot be configured.
    pub fn set_up_rangefinder<'a>(&mut self) -> Result<Rangefinder<'a>, NodeError> {
        let trigger = self.set_pin_as_digital_out(config::TRIGGER_PIN)?;
        let power = self.set_pin_as_digital_out(config::SENSOR_POWER_PIN)?;
        let mut echo = self.set_pin_as_digital_in(config::ECHO_PIN)?;

        let mut pulse_timer = self.get_counter_timer(
            0,
            config::PULSE_TIMER_DIVIDER,
            true,
            config::PULSE_DEADLINE_TICKS,
        )?;
        let mut echo_timer = self.get_counter_timer(
            1,
            config::ECHO_TIMER_DIVIDER,
            false,
            config::ECHO_TIMEOUT_TICKS,
        )?;
        log::debug!(
            "Pulse timer at {}Hz, echo timer at {}Hz",
            pulse_timer.tick_hz(),
            echo_timer.tick_hz()
        );

        let pulse = Arc::new(PulseTimer::new(pulse_timer.counter(), trigger.line()));
        let echo_state = Arc::new(EchoTimer::new(echo_timer.counter()));

        let on_deadline = pulse.clone();
        pulse_timer.subscribe(move || on_deadline.on_deadline())?;
        let on_timeout = echo_state.clone();
        echo_timer.subscribe(move || on_timeout.on_timeout())?;
        let on_edge = echo_state.clone();
        echo.on_edges(move |rising| {
            if rising {
                on_edge.on_rising_edge()
            } else {
                on_edge.on_falling_edge()
            }
        })?;

        let sensor = HCSR04::new(pulse, echo_state, power.line(), self.get_delay()?);
        Ok(Rangefinder {
            sensor,
            _trigger: trigger,
            _power: power,
            _echo: echo,
            _pulse_timer: pulse_timer,
            _echo_timer: echo_timer,
        })
    }

    /// Runs `fut` to completion on the current task
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        block_on(fut)
    }
}
