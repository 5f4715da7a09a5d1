#![cfg(not(target_os = "espidf"))]

use esp32_rangefinder_node::{
    config::DEEP_SLEEP,
    node::{CycleReport, WakeCycle},
    sensors::{Distance, MeasurementState},
    sim::{
        ImmediateDelay, NeverDelay, RecordingPowerManager, RecordingPublisher, ScriptedGateway,
        SimRangefinder,
    },
    wifi::WifiError,
};
use futures::{executor::block_on, join};

type SimCycle = WakeCycle<ScriptedGateway, RecordingPublisher, RecordingPowerManager>;

fn wake_cycle(gateway: ScriptedGateway) -> SimCycle {
    WakeCycle::new(
        gateway,
        RecordingPublisher::default(),
        RecordingPowerManager::default(),
    )
}

#[test]
fn one_meter_echo_is_published_then_the_node_sleeps() {
    let rig = SimRangefinder::new();
    let mut sensor = rig.sensor(NeverDelay);
    let mut cycle = wake_cycle(ScriptedGateway::connected());

    let (report, ()) = block_on(async {
        join!(cycle.run(&mut sensor), async { rig.echo(236_000) })
    });

    assert_eq!(report, CycleReport::Published(Distance(1000)));
    assert_eq!(cycle.publisher().published, vec![Distance(1000)]);
    assert_eq!(cycle.power().sleeps, vec![DEEP_SLEEP]);
    assert_eq!(sensor.state(), MeasurementState::Resolved(Distance(1000)));
    assert!(!rig.power.is_high());
    assert!(!rig.trigger.is_high());
}

#[test]
fn stray_falling_edge_before_the_echo_is_not_published() {
    let rig = SimRangefinder::new();
    let mut sensor = rig.sensor(NeverDelay);
    let mut cycle = wake_cycle(ScriptedGateway::connected());

    let (report, ()) = block_on(async {
        join!(cycle.run(&mut sensor), async {
            // Glitch on the echo line right after the sensor is powered
            rig.echo_timer.on_falling_edge();
            rig.echo(236_000);
        })
    });

    assert_eq!(report, CycleReport::Published(Distance(1000)));
    assert_eq!(cycle.publisher().published, vec![Distance(1000)]);
    assert_eq!(cycle.power().sleeps, vec![DEEP_SLEEP]);
}

#[test]
fn echo_timeout_publishes_nothing() {
    let rig = SimRangefinder::new();
    let mut sensor = rig.sensor(NeverDelay);
    let mut cycle = wake_cycle(ScriptedGateway::connected());

    let (report, ()) = block_on(async {
        join!(cycle.run(&mut sensor), async { rig.no_echo_end() })
    });

    assert_eq!(report, CycleReport::TimedOut);
    assert!(cycle.publisher().published.is_empty());
    assert_eq!(cycle.power().sleeps, vec![DEEP_SLEEP]);
    assert_eq!(rig.power.falling_edges(), 1);
}

#[test]
fn unplugged_sensor_ends_in_a_timeout() {
    let rig = SimRangefinder::new();
    let mut sensor = rig.sensor(ImmediateDelay);
    let mut cycle = wake_cycle(ScriptedGateway::connected());

    let report = block_on(cycle.run(&mut sensor));

    assert_eq!(report, CycleReport::TimedOut);
    assert!(cycle.publisher().published.is_empty());
    assert_eq!(cycle.power().sleeps, vec![DEEP_SLEEP]);
}

#[test]
fn link_loss_while_waiting_goes_straight_to_sleep() {
    let rig = SimRangefinder::new();
    let mut sensor = rig.sensor(NeverDelay);
    let mut cycle = wake_cycle(ScriptedGateway::dropping_link());

    let report = block_on(cycle.run(&mut sensor));

    assert_eq!(report, CycleReport::LinkLost);
    assert!(cycle.publisher().published.is_empty());
    assert_eq!(cycle.power().sleeps, vec![DEEP_SLEEP]);
    assert_eq!(rig.power.rising_edges(), 1);
    assert_eq!(rig.power.falling_edges(), 1);

    // An echo landing after the cycle was abandoned is dropped
    rig.echo(236_000);
    assert_eq!(rig.echo_timer.peek_outcome(), None);
}

#[test]
fn no_link_means_no_measurement() {
    let rig = SimRangefinder::new();
    let mut sensor = rig.sensor(NeverDelay);
    let mut cycle = wake_cycle(ScriptedGateway::failing(|| WifiError::ConnectingError));

    // NeverDelay: this would hang if the sensor were started
    let report = block_on(cycle.run(&mut sensor));

    assert_eq!(report, CycleReport::LinkDown);
    assert_eq!(sensor.state(), MeasurementState::Idle);
    assert_eq!(rig.power.rising_edges(), 0);
    assert_eq!(cycle.power().sleeps, vec![DEEP_SLEEP]);
}

#[test]
fn consecutive_cycles_each_sleep_once() {
    let rig = SimRangefinder::new();
    let mut sensor = rig.sensor(NeverDelay);
    let mut cycle = wake_cycle(ScriptedGateway::connected());

    for ticks in [23_600, 47_200] {
        let _ = block_on(async {
            join!(cycle.run(&mut sensor), async { rig.echo(ticks) })
        });
    }

    assert_eq!(cycle.publisher().published, vec![Distance(100), Distance(200)]);
    assert_eq!(cycle.power().sleeps, vec![DEEP_SLEEP, DEEP_SLEEP]);
    assert_eq!(cycle.gateway().connects, 2);
}
