use crate::{
    config::DEEP_SLEEP,
    gpio::OutputLine,
    power::PowerManager,
    sensors::{Distance, MeasurementError, HCSR04},
    telemetry::{TelemetryError, TelemetryPublisher},
    utils::{delay::AsyncDelay, timer_driver::HwCounter},
    wifi::{ConnectivityGateway, LinkState},
};

/// How a wake cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleReport {
    Published(Distance),
    PublishFailed(Distance, TelemetryError),
    TimedOut,
    LinkLost,
    LinkDown,
}

/// One wake up of the node: connect, measure, publish and go back to sleep. Every path
/// ends with a single call to the power manager.
pub struct WakeCycle<G: ConnectivityGateway, T: TelemetryPublisher, P: PowerManager> {
    gateway: G,
    publisher: T,
    power: P,
}

impl<G: ConnectivityGateway, T: TelemetryPublisher, P: PowerManager> WakeCycle<G, T, P> {
    pub fn new(gateway: G, publisher: T, power: P) -> Self {
        WakeCycle {
            gateway,
            publisher,
            power,
        }
    }

    /// Runs the cycle with `sensor` and sleeps for [DEEP_SLEEP]. On the device the sleep
    /// does not return.
    pub async fn run<C: HwCounter, O: OutputLine, D: AsyncDelay>(
        &mut self,
        sensor: &mut HCSR04<C, O, D>,
    ) -> CycleReport {
        let report = self.measure_and_publish(sensor).await;
        log::info!("Cycle finished: {report:?}");
        self.power.sleep_for(DEEP_SLEEP);
        report
    }

    async fn measure_and_publish<C: HwCounter, O: OutputLine, D: AsyncDelay>(
        &mut self,
        sensor: &mut HCSR04<C, O, D>,
    ) -> CycleReport {
        if let Err(err) = self.gateway.connect().await {
            log::error!("Could not connect: {err:?}");
            return CycleReport::LinkDown;
        }
        if self.gateway.link_state() != LinkState::Connected {
            log::error!("Link not up after connecting");
            return CycleReport::LinkDown;
        }

        match sensor.measure(self.gateway.link_lost()).await {
            Ok(distance) => {
                log::info!("Measured {distance}");
                match self.publisher.publish(distance) {
                    Ok(()) => CycleReport::Published(distance),
                    Err(err) => {
                        log::error!("Could not publish {distance}: {err:?}");
                        CycleReport::PublishFailed(distance, err)
                    }
                }
            }
            Err(MeasurementError::SensorTimeout) => {
                log::error!("Echo timeout");
                CycleReport::TimedOut
            }
            Err(MeasurementError::LinkLoss) => {
                log::warn!("Link lost while waiting for the echo");
                CycleReport::LinkLost
            }
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn publisher(&self) -> &T {
        &self.publisher
    }

    pub fn power(&self) -> &P {
        &self.power
    }
}

#[cfg(test)]
mod tests {
    use futures::{executor::block_on, join};

    use super::*;
    use crate::sim::{
        ImmediateDelay, NeverDelay, RecordingPowerManager, RecordingPublisher, ScriptedGateway,
        SimRangefinder,
    };
    use crate::wifi::{http::HttpError, WifiError};

    fn cycle(
        gateway: ScriptedGateway,
    ) -> WakeCycle<ScriptedGateway, RecordingPublisher, RecordingPowerManager> {
        WakeCycle::new(
            gateway,
            RecordingPublisher::default(),
            RecordingPowerManager::default(),
        )
    }

    #[test]
    fn publish_failure_still_sleeps() {
        let rig = SimRangefinder::new();
        let mut sensor = rig.sensor(NeverDelay);
        let mut cycle = cycle(ScriptedGateway::connected());
        cycle.publisher.fail_with = Some(TelemetryError::Transport(HttpError::RequestError));

        let (report, ()) = block_on(async {
            join!(cycle.run(&mut sensor), async { rig.echo(236) })
        });

        assert_eq!(
            report,
            CycleReport::PublishFailed(
                Distance(1),
                TelemetryError::Transport(HttpError::RequestError)
            )
        );
        assert_eq!(cycle.publisher.published, vec![Distance(1)]);
        assert_eq!(cycle.power.sleeps, vec![DEEP_SLEEP]);
    }

    #[test]
    fn zero_millimeters_is_published() {
        let rig = SimRangefinder::new();
        let mut sensor = rig.sensor(NeverDelay);
        let mut cycle = cycle(ScriptedGateway::connected());

        let (report, ()) = block_on(async {
            join!(cycle.run(&mut sensor), async { rig.echo(100) })
        });

        assert_eq!(report, CycleReport::Published(Distance(0)));
        assert_eq!(cycle.publisher.published, vec![Distance(0)]);
    }

    #[test]
    fn failed_connect_skips_the_measurement() {
        let rig = SimRangefinder::new();
        let mut sensor = rig.sensor(ImmediateDelay);
        let mut cycle = cycle(ScriptedGateway::failing(|| WifiError::ConnectingError));

        let report = block_on(cycle.run(&mut sensor));

        assert_eq!(report, CycleReport::LinkDown);
        assert_eq!(rig.power.rising_edges(), 0);
        assert!(cycle.publisher.published.is_empty());
        assert_eq!(cycle.power.sleeps, vec![DEEP_SLEEP]);
    }

    #[test]
    fn link_watch_is_handed_to_the_sensor() {
        let rig = SimRangefinder::new();
        let mut sensor = rig.sensor(NeverDelay);
        let mut cycle = cycle(ScriptedGateway::dropping_link());

        let report = block_on(cycle.run(&mut sensor));

        assert_eq!(report, CycleReport::LinkLost);
        assert_eq!(cycle.gateway.connects, 1);
        assert_eq!(cycle.gateway.link_state(), LinkState::Disconnected);
        assert!(cycle.publisher.published.is_empty());
        assert_eq!(cycle.power.sleeps, vec![DEEP_SLEEP]);
    }
}
