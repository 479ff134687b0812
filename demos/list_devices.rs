use std::time::Duration;

use log::info;
use unilink_rf::{connection::ConnectionError, transceiver::WirelessTransceiver};

fn main() -> Result<(), ConnectionError> {
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    // Open both RF dongles
    let mut transceiver = WirelessTransceiver::open(Duration::from_secs(1))?;

    let snapshot = transceiver.list_devices()?;
    info!("Received {} bytes from the hub", snapshot.raw.len());

    println!("Found {} devices", snapshot.devices.len());
    for device in &snapshot.devices {
        println!(
            "MAC={} master={} ch={} rx={} type={} fans={} rpm={:?} bound={}",
            device.mac,
            device.master_mac,
            device.channel,
            device.rx_type,
            device.device_type,
            device.fan_count,
            device.fan_rpm,
            device.is_bound()
        );
    }

    transceiver.close();
    Ok(())
}
