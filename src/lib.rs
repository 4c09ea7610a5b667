//! Driver for the Sensirion SCD40/SCD41 CO2, temperature and humidity sensor, built on the
//! `embedded-hal-async` I2C and delay traits.
//!
//! ```ignore
//! let mut sensor = SCD40Sensor::new(&mut i2c, DEFAULT_ADDRESS, embassy_time::Delay);
//! sensor.init().await?;
//! loop {
//!     let (co2, temperature, humidity) = sensor.get_all_readings(TemperatureUnit::Celsius).await;
//!     Timer::after(Duration::from_secs(5)).await;
//! }
//! ```
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

mod bus;
mod command;
mod crc;
mod measurement;
mod scd40;

pub use bus::RawFrame;
pub use command::DEFAULT_ADDRESS;
pub use crate::crc::{compute_checksum, sensirion_crc8};
pub use measurement::{
    ChecksumPolicy, SensorReading, TemperatureUnit, humidity_from_ticks, temperature_from_ticks,
};
pub use scd40::{Config, DataReady, MeasurementState, ReadStatus, SCD40Sensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SCD40Error {
    I2CError,
    Timeout,
    ChecksumMismatch,
    /// The command is only accepted while periodic measurement is stopped.
    MeasurementRunning,
}
