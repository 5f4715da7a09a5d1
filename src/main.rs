//! Wakes up, measures the distance to the target once, posts it to InfluxDB and goes back
//! to deep sleep. The board starts over from here on every wake up.

#[cfg(target_os = "espidf")]
use esp32_rangefinder_node::{
    config::DEEP_SLEEP,
    node::WakeCycle,
    power::{DeepSleep, PowerManager},
    utils::node_error::NodeError,
    Microcontroller,
};

#[cfg(target_os = "espidf")]
fn run() -> Result<(), NodeError> {
    let mut micro = Microcontroller::new()?;
    let mut rangefinder = micro.set_up_rangefinder()?;
    let wifi = micro.get_wifi_driver()?;
    let publisher = micro.get_influx_publisher(&wifi)?;

    let mut cycle = WakeCycle::new(wifi, publisher, micro.get_power_manager());
    micro.block_on(cycle.run(&mut rangefinder.sensor));
    Ok(())
}

#[cfg(target_os = "espidf")]
fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    if let Err(err) = run() {
        log::error!("Board bring-up failed: {err:?}");
    }
    DeepSleep.sleep_for(DEEP_SLEEP);
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("This firmware only runs on the ESP32, build it with --target xtensa-esp32-espidf");
}
