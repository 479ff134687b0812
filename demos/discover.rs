use log::LevelFilter;
use unilink_rf::connection::{usb, ConnectionError};

fn main() -> Result<(), ConnectionError> {
    simplelog::TermLogger::init(
        LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    let devices = usb::find_devices()?;
    if devices.is_empty() {
        println!("No RF dongles found.");
        return Ok(());
    }

    for device in devices {
        println!(
            "{:?} {:04x}:{:04x} bus {} address {} {}",
            device.role,
            device.vendor_id,
            device.product_id,
            device.bus_number,
            device.device_address,
            device.product.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
