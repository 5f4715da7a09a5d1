use std::{future::Future, pin::pin, sync::Arc};

use futures::future::{select, Either};

use super::{
    distance::{estimate_distance, Distance},
    echo_timer::EchoTimer,
    outcome::EchoOutcome,
    pulse_timer::PulseTimer,
};
use crate::{
    config::NO_ECHO_GUARD, gpio::OutputLine, utils::delay::AsyncDelay,
    utils::timer_driver::HwCounter,
};

/// Ways a measurement can end without a distance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementError {
    /// No echo, or an echo longer than the timeout
    SensorTimeout,
    /// The network went down while waiting for the echo
    LinkLoss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementState {
    Idle,
    Triggering,
    Waiting,
    Resolved(Distance),
    TimedOut,
}

/// Drives one HC-SR04 measurement: powers the sensor, sends the trigger pulse and waits
/// for the echo timer to resolve the cycle.
///
/// The timers are shared with the interrupt handlers that feed them, so they are handed
/// in already wrapped in an `Arc`.
pub struct HCSR04<C: HwCounter, O: OutputLine, D: AsyncDelay> {
    pulse: Arc<PulseTimer<C, O>>,
    echo: Arc<EchoTimer<C>>,
    power: O,
    guard: D,
    state: MeasurementState,
}

impl<C: HwCounter, O: OutputLine, D: AsyncDelay> HCSR04<C, O, D> {
    /// # Arguments
    ///
    /// - `pulse`: Pulse timer driving the trigger pin.
    /// - `echo`: Echo timer fed by the echo pin edges and its own timeout alarm.
    /// - `power`: Switch of the sensor supply. Driven low until a measurement starts.
    /// - `guard`: Delay used to give up when the echo never starts.
    pub fn new(
        pulse: Arc<PulseTimer<C, O>>,
        echo: Arc<EchoTimer<C>>,
        power: O,
        guard: D,
    ) -> Self {
        power.set_low();
        HCSR04 {
            pulse,
            echo,
            power,
            guard,
            state: MeasurementState::Idle,
        }
    }

    pub fn state(&self) -> MeasurementState {
        self.state
    }

    /// Takes one measurement.
    ///
    /// # Arguments
    ///
    /// - `link_lost`: Future resolving when the network link goes down. The measurement is
    ///   abandoned if it resolves first.
    ///
    /// # Returns
    ///
    /// The distance to the target. 0 mm is a valid reading.
    ///
    /// # Errors
    ///
    /// - `MeasurementError::SensorTimeout`: If no echo ended before the timeout.
    /// - `MeasurementError::LinkLoss`: If `link_lost` resolved before the echo.
    pub async fn measure<L: Future<Output = ()>>(
        &mut self,
        link_lost: L,
    ) -> Result<Distance, MeasurementError> {
        self.state = MeasurementState::Triggering;
        self.echo.prepare();
        self.power.set_high();
        self.pulse.fire();
        self.state = MeasurementState::Waiting;

        let resolved = {
            let outcome = pin!(self.echo.outcome());
            let link_lost = pin!(link_lost);
            let guard = pin!(self.guard.delay(NO_ECHO_GUARD));
            match select(outcome, select(link_lost, guard)).await {
                Either::Left((outcome, _)) => Ok(outcome),
                Either::Right((Either::Left(_), _)) => Err(MeasurementError::LinkLoss),
                Either::Right((Either::Right(_), _)) => {
                    log::debug!("No echo after {}ms", NO_ECHO_GUARD.as_millis());
                    self.echo.force_timeout();
                    // An edge may still have won the race
                    Ok(self.echo.peek_outcome().unwrap_or(EchoOutcome::TimedOut))
                }
            }
        };

        self.power.set_low();
        self.echo.finish();
        let stale_resets = self.echo.take_stale_resets();
        if stale_resets > 0 {
            log::warn!("Echo counter held a leftover count {stale_resets} time(s)");
        }

        match resolved {
            Ok(EchoOutcome::Completed(ticks)) => {
                let distance = estimate_distance(ticks);
                log::debug!("Echo of {} ticks, {distance}", ticks.0);
                self.state = MeasurementState::Resolved(distance);
                Ok(distance)
            }
            Ok(EchoOutcome::TimedOut) => {
                self.state = MeasurementState::TimedOut;
                Err(MeasurementError::SensorTimeout)
            }
            Err(err) => {
                self.state = MeasurementState::Idle;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::{pending, ready};

    use futures::{executor::block_on, join};

    use super::*;
    use crate::sim::{ImmediateDelay, NeverDelay, SimRangefinder};

    #[test]
    fn echo_resolves_to_a_distance() {
        let rig = SimRangefinder::new();
        let mut sensor = rig.sensor(NeverDelay);
        assert_eq!(sensor.state(), MeasurementState::Idle);

        let (result, ()) = block_on(async {
            join!(sensor.measure(pending()), async { rig.echo(236_000) })
        });

        assert_eq!(result, Ok(Distance(1000)));
        assert_eq!(sensor.state(), MeasurementState::Resolved(Distance(1000)));
        assert!(!rig.trigger.is_high());
    }

    #[test]
    fn power_is_switched_once_per_measurement() {
        let rig = SimRangefinder::new();
        let mut sensor = rig.sensor(NeverDelay);

        let _ = block_on(async {
            join!(sensor.measure(pending()), async { rig.echo(4_720) })
        });
        assert_eq!(rig.power.rising_edges(), 1);
        assert_eq!(rig.power.falling_edges(), 1);
        assert!(!rig.power.is_high());

        let _ = block_on(async {
            join!(sensor.measure(pending()), async { rig.no_echo_end() })
        });
        assert_eq!(rig.power.rising_edges(), 2);
        assert_eq!(rig.power.falling_edges(), 2);
        assert!(!rig.power.is_high());
    }

    #[test]
    fn echo_timeout_is_a_sensor_timeout() {
        let rig = SimRangefinder::new();
        let mut sensor = rig.sensor(NeverDelay);

        let (result, ()) = block_on(async {
            join!(sensor.measure(pending()), async { rig.no_echo_end() })
        });

        assert_eq!(result, Err(MeasurementError::SensorTimeout));
        assert_eq!(sensor.state(), MeasurementState::TimedOut);
        assert_eq!(rig.echo_counter.value(), 0);
    }

    #[test]
    fn missing_echo_is_caught_by_the_guard() {
        let rig = SimRangefinder::new();
        let mut sensor = rig.sensor(ImmediateDelay);

        let result = block_on(sensor.measure(pending()));

        assert_eq!(result, Err(MeasurementError::SensorTimeout));
        assert_eq!(rig.power.falling_edges(), 1);
    }

    #[test]
    fn link_loss_abandons_the_measurement() {
        let rig = SimRangefinder::new();
        let mut sensor = rig.sensor(NeverDelay);

        let result = block_on(sensor.measure(ready(())));

        assert_eq!(result, Err(MeasurementError::LinkLoss));
        assert_eq!(sensor.state(), MeasurementState::Idle);
        assert_eq!(rig.power.rising_edges(), 1);
        assert_eq!(rig.power.falling_edges(), 1);

        // Edges arriving after the measurement was abandoned change nothing
        rig.echo(500);
        assert_eq!(rig.echo_timer.peek_outcome(), None);
    }

    #[test]
    fn leftover_count_does_not_leak_into_the_next_echo() {
        let rig = SimRangefinder::new();
        let mut sensor = rig.sensor(NeverDelay);

        // Echo whose falling edge was lost while the node was abandoning a cycle
        let _ = block_on(sensor.measure(ready(())));
        rig.echo_timer.on_rising_edge();
        rig.echo_counter.advance(1_000);

        let (result, ()) = block_on(async {
            join!(sensor.measure(pending()), async { rig.echo(2_360) })
        });
        assert_eq!(result, Ok(Distance(10)));
    }
}
