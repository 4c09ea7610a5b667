#![no_std]
#![no_main]

use defmt::{error, info};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::peripherals::I2C0;
use embassy_rp::{bind_interrupts, i2c};
use embassy_scd40_sensor::{DEFAULT_ADDRESS, ReadStatus, SCD40Error, SCD40Sensor, TemperatureUnit};
use embassy_time::{Delay, Duration, Timer};
use panic_probe as _;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let p = embassy_rp::init(Default::default());

    let sda = p.PIN_0;
    let scl = p.PIN_1;

    // Configure I2C
    let mut i2c = i2c::I2c::new_async(p.I2C0, scl, sda, Irqs, Default::default());

    // Create sensor instance
    let mut sensor = SCD40Sensor::new(&mut i2c, DEFAULT_ADDRESS, Delay);

    // serial number is only readable while idle
    let _ = sensor.stop_continuous_measurement().await;
    match sensor.serial_number().await {
        Ok(serial) => info!("SCD40 serial number: {=u64:#x}", serial),
        Err(e) => error!("Reading serial number failed: {}", e),
    }

    while let Err(e) = sensor.init().await {
        error!("Sensor initialization failed: {}", e);
        Timer::after(Duration::from_secs(1)).await;
    }

    // Read sensor data
    loop {
        let (co2, temperature, humidity) = sensor.get_all_readings(TemperatureUnit::Celsius).await;
        match sensor.last_read_status() {
            ReadStatus::Fresh => info!(
                "Temperature: {}°C, Humidity: {}%, CO2: {}",
                temperature, humidity, co2
            ),
            ReadStatus::Stale | ReadStatus::NoAttempt => info!("No new data"),
            ReadStatus::ReadyStatusCorrupted => error!("Corrupted data ready status"),
            ReadStatus::Failed(e) => match e {
                SCD40Error::I2CError => error!("I2C communication error"),
                SCD40Error::Timeout => error!("Operation timed out"),
                SCD40Error::ChecksumMismatch => error!("Checksum mismatch"),
                SCD40Error::MeasurementRunning => error!("Sensor busy measuring"),
            },
        }

        Timer::after(Duration::from_secs(5)).await;
    }
}
