//! Host stand-ins for the hardware and network seams, used to exercise the measurement
//! and wake cycle logic off target.

use std::{
    future::{pending, ready, Future},
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    config::{ECHO_TIMEOUT_TICKS, PULSE_DEADLINE_TICKS},
    gpio::OutputLine,
    power::PowerManager,
    sensors::{Distance, EchoTimer, PulseTimer, HCSR04},
    telemetry::{TelemetryError, TelemetryPublisher},
    utils::{delay::AsyncDelay, timer_driver::HwCounter},
    wifi::{ConnectivityGateway, LinkState, WifiError},
};

#[derive(Default)]
struct CounterState {
    value: AtomicU64,
    running: AtomicBool,
    alarm_enabled: AtomicBool,
}

/// Counter that only moves when told to. Its alarm is one shot, like the group timers:
/// once it fires it stays off until re-armed.
#[derive(Clone)]
pub struct SimCounter {
    state: Arc<CounterState>,
    alarm: u64,
}

impl SimCounter {
    pub fn new(alarm: u64) -> Self {
        let state = CounterState::default();
        state.alarm_enabled.store(true, Ordering::SeqCst);
        SimCounter {
            state: Arc::new(state),
            alarm,
        }
    }

    /// Advances a running counter by `ticks`. Returns whether the alarm fired on the way.
    pub fn advance(&self, ticks: u64) -> bool {
        if !self.is_running() {
            return false;
        }
        let value = self.state.value.fetch_add(ticks, Ordering::SeqCst) + ticks;
        value >= self.alarm && self.state.alarm_enabled.swap(false, Ordering::SeqCst)
    }

    pub fn tick(&self) -> bool {
        self.advance(1)
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }
}

impl HwCounter for SimCounter {
    fn start(&self) {
        self.state.running.store(true, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.state.running.store(false, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.state.value.store(0, Ordering::SeqCst);
    }

    fn value(&self) -> u64 {
        self.state.value.load(Ordering::SeqCst)
    }

    fn rearm_alarm(&self) {
        self.state.alarm_enabled.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct PinState {
    high: AtomicBool,
    rising: AtomicU32,
    falling: AtomicU32,
}

/// Output pin that counts its level changes. Clones observe the same pin.
#[derive(Clone, Default)]
pub struct RecordingPin {
    state: Arc<PinState>,
}

impl RecordingPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.state.high.load(Ordering::SeqCst)
    }

    pub fn rising_edges(&self) -> u32 {
        self.state.rising.load(Ordering::SeqCst)
    }

    pub fn falling_edges(&self) -> u32 {
        self.state.falling.load(Ordering::SeqCst)
    }
}

impl OutputLine for RecordingPin {
    fn set_level(&self, high: bool) {
        let was_high = self.state.high.swap(high, Ordering::SeqCst);
        match (was_high, high) {
            (false, true) => self.state.rising.fetch_add(1, Ordering::SeqCst),
            (true, false) => self.state.falling.fetch_add(1, Ordering::SeqCst),
            _ => 0,
        };
    }
}

/// Delay that never ends, for measurements that must be resolved by the echo
pub struct NeverDelay;

impl AsyncDelay for NeverDelay {
    fn delay(&mut self, _duration: Duration) -> impl Future<Output = ()> + '_ {
        pending()
    }
}

/// Delay that ends as soon as it is polled, for measurements where the echo never starts
pub struct ImmediateDelay;

impl AsyncDelay for ImmediateDelay {
    fn delay(&mut self, _duration: Duration) -> impl Future<Output = ()> + '_ {
        ready(())
    }
}

pub type SimSensor<D> = HCSR04<SimCounter, RecordingPin, D>;

/// The rangefinder wiring with simulated timers and pins. The methods play the part of
/// the interrupt handlers and the sensor itself.
pub struct SimRangefinder {
    pub trigger: RecordingPin,
    pub power: RecordingPin,
    pub pulse_counter: SimCounter,
    pub echo_counter: SimCounter,
    pub pulse_timer: Arc<PulseTimer<SimCounter, RecordingPin>>,
    pub echo_timer: Arc<EchoTimer<SimCounter>>,
}

impl SimRangefinder {
    pub fn new() -> Self {
        let trigger = RecordingPin::new();
        let power = RecordingPin::new();
        let pulse_counter = SimCounter::new(PULSE_DEADLINE_TICKS);
        let echo_counter = SimCounter::new(ECHO_TIMEOUT_TICKS);
        let pulse_timer = Arc::new(PulseTimer::new(pulse_counter.clone(), trigger.clone()));
        let echo_timer = Arc::new(EchoTimer::new(echo_counter.clone()));
        SimRangefinder {
            trigger,
            power,
            pulse_counter,
            echo_counter,
            pulse_timer,
            echo_timer,
        }
    }

    pub fn sensor<D: AsyncDelay>(&self, guard: D) -> SimSensor<D> {
        HCSR04::new(
            self.pulse_timer.clone(),
            self.echo_timer.clone(),
            self.power.clone(),
            guard,
        )
    }

    fn end_trigger_pulse(&self) {
        if self.pulse_counter.advance(PULSE_DEADLINE_TICKS) {
            self.pulse_timer.on_deadline();
        }
    }

    /// Sensor answers with an echo `ticks` long
    pub fn echo(&self, ticks: u64) {
        self.end_trigger_pulse();
        self.echo_timer.on_rising_edge();
        if self.echo_counter.advance(ticks) {
            self.echo_timer.on_timeout();
        }
        self.echo_timer.on_falling_edge();
    }

    /// Echo line rises and stays high until the timeout alarm fires
    pub fn no_echo_end(&self) {
        self.end_trigger_pulse();
        self.echo_timer.on_rising_edge();
        if self.echo_counter.advance(ECHO_TIMEOUT_TICKS) {
            self.echo_timer.on_timeout();
        }
    }
}

impl Default for SimRangefinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Gateway whose behaviour is fixed up front
pub struct ScriptedGateway {
    connect_error: Option<fn() -> WifiError>,
    state: LinkState,
    drops_link: bool,
    pub connects: u32,
}

impl ScriptedGateway {
    /// Connects and keeps the link up
    pub fn connected() -> Self {
        ScriptedGateway {
            connect_error: None,
            state: LinkState::Disconnected,
            drops_link: false,
            connects: 0,
        }
    }

    /// Connects, then loses the link as soon as anyone watches it
    pub fn dropping_link() -> Self {
        ScriptedGateway {
            drops_link: true,
            ..Self::connected()
        }
    }

    /// Fails to connect with the given error
    pub fn failing(error: fn() -> WifiError) -> Self {
        ScriptedGateway {
            connect_error: Some(error),
            ..Self::connected()
        }
    }
}

impl ConnectivityGateway for ScriptedGateway {
    fn connect(&mut self) -> impl Future<Output = Result<(), WifiError>> + '_ {
        self.connects += 1;
        let result = match self.connect_error {
            Some(error) => Err(error()),
            None => {
                self.state = LinkState::Connected;
                Ok(())
            }
        };
        ready(result)
    }

    fn link_state(&self) -> LinkState {
        self.state
    }

    fn link_lost(&mut self) -> impl Future<Output = ()> + '_ {
        let drops_link = self.drops_link;
        if drops_link {
            self.state = LinkState::Disconnected;
        }
        async move {
            if !drops_link {
                pending::<()>().await;
            }
        }
    }
}

/// Publisher that keeps what it was given
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Vec<Distance>,
    pub fail_with: Option<TelemetryError>,
}

impl TelemetryPublisher for RecordingPublisher {
    fn publish(&mut self, distance: Distance) -> Result<(), TelemetryError> {
        self.published.push(distance);
        match self.fail_with {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Power manager that records every sleep request and returns
#[derive(Default)]
pub struct RecordingPowerManager {
    pub sleeps: Vec<Duration>,
}

impl PowerManager for RecordingPowerManager {
    fn sleep_for(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
