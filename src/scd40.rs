use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::SCD40Error;
use crate::bus::SensirionBus;
use crate::command::Command;
use crate::measurement::{self, ChecksumPolicy, MEASUREMENT_FRAMES, SensorReading, TemperatureUnit};

const DATA_READY_MASK: u16 = 0x07ff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub checksum_policy: ChecksumPolicy,
    /// Upper bound for a single bus transfer. `None` waits forever.
    pub bus_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checksum_policy: ChecksumPolicy::Enforce,
            bus_timeout: Some(Duration::from_millis(100)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementState {
    Stopped,
    ContinuousMeasuring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataReady {
    Ready,
    NotReady,
    /// The status word failed its CRC; nothing is known about the flag.
    Corrupted,
}

/// Outcome of the most recent measurement update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadStatus {
    NoAttempt,
    Fresh,
    Stale,
    ReadyStatusCorrupted,
    Failed(SCD40Error),
}

/// SCD40/SCD41 driver in periodic measurement mode.
///
/// The accessors (`get_co2`, `get_temperature`, ...) poll the data-ready flag and fetch a new
/// measurement when one is available, then return the last good reading. The sensor produces
/// a new measurement every 5 seconds; calling more often just returns the cached values.
pub struct SCD40Sensor<'a, T: I2c, D: DelayNs> {
    bus: SensirionBus<'a, T>,
    delay: D,
    config: Config,
    state: MeasurementState,
    last_reading: SensorReading,
    last_status: ReadStatus,
}

impl<'a, T: I2c, D: DelayNs> SCD40Sensor<'a, T, D> {
    pub fn new(i2c: &'a mut T, address: u8, delay: D) -> Self {
        Self::with_config(i2c, address, delay, Config::default())
    }

    pub fn with_config(i2c: &'a mut T, address: u8, delay: D, config: Config) -> Self {
        Self {
            bus: SensirionBus::new(i2c, address, config.bus_timeout),
            delay,
            config,
            state: MeasurementState::Stopped,
            last_reading: SensorReading::default(),
            last_status: ReadStatus::NoAttempt,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> MeasurementState {
        self.state
    }

    /// Last good reading, without touching the bus.
    pub fn reading(&self) -> SensorReading {
        self.last_reading
    }

    pub fn last_read_status(&self) -> ReadStatus {
        self.last_status
    }

    /// Brings a sensor in an unknown mode into periodic measurement.
    pub async fn init(&mut self) -> Result<(), SCD40Error> {
        self.stop_continuous_measurement().await?;
        self.reinit().await?;
        self.start_continuous_measurement().await
    }

    pub async fn start_continuous_measurement(&mut self) -> Result<(), SCD40Error> {
        info!("Start periodic measurement");
        self.bus
            .write_command(Command::StartPeriodicMeasurement, &mut self.delay)
            .await?;
        self.state = MeasurementState::ContinuousMeasuring;
        Ok(())
    }

    /// Returns once the sensor has settled and accepts commands again.
    pub async fn stop_continuous_measurement(&mut self) -> Result<(), SCD40Error> {
        info!("Stop periodic measurement");
        self.bus
            .write_command(Command::StopPeriodicMeasurement, &mut self.delay)
            .await?;
        self.state = MeasurementState::Stopped;
        Ok(())
    }

    pub async fn factory_reset(&mut self) -> Result<(), SCD40Error> {
        self.idle_command(Command::PerformFactoryReset).await
    }

    pub async fn reinit(&mut self) -> Result<(), SCD40Error> {
        self.idle_command(Command::Reinit).await
    }

    pub async fn serial_number(&mut self) -> Result<u64, SCD40Error> {
        self.idle_command(Command::GetSerialNumber).await?;
        let frames = self.bus.read_frames::<3, _>(&mut self.delay).await?;

        let mut serial = 0u64;
        for frame in frames {
            serial = (serial << 16) | u64::from(frame.checked()?);
        }
        Ok(serial)
    }

    pub async fn data_ready_status(&mut self) -> Result<DataReady, SCD40Error> {
        self.bus
            .write_command(Command::GetDataReadyStatus, &mut self.delay)
            .await?;
        let [frame] = self.bus.read_frames::<1, _>(&mut self.delay).await?;

        if !frame.is_valid() {
            warn!("CRC mismatch on data ready status {:#x}", frame.data_word);
            if self.config.checksum_policy == ChecksumPolicy::Enforce {
                return Ok(DataReady::Corrupted);
            }
        }

        let status = if frame.data_word & DATA_READY_MASK != 0 {
            DataReady::Ready
        } else {
            DataReady::NotReady
        };
        debug!("Data ready status {:#x}", frame.data_word);
        Ok(status)
    }

    pub async fn is_data_ready(&mut self) -> Result<bool, SCD40Error> {
        Ok(self.data_ready_status().await? == DataReady::Ready)
    }

    /// Fetches and stores a new reading if the sensor has one.
    ///
    /// Returns `Ok(false)` when there is nothing new; the stored reading is only replaced on
    /// success.
    pub async fn read_measurement_if_ready(&mut self) -> Result<bool, SCD40Error> {
        let outcome = self.fetch_measurement().await;
        self.last_status = match outcome {
            Ok(status) => status,
            Err(e) => ReadStatus::Failed(e),
        };
        outcome.map(|status| status == ReadStatus::Fresh)
    }

    pub async fn get_co2(&mut self) -> u16 {
        self.refresh().await;
        self.last_reading.co2_ppm
    }

    pub async fn get_temperature(&mut self, unit: TemperatureUnit) -> f32 {
        self.refresh().await;
        self.last_reading.temperature(unit)
    }

    pub async fn get_relative_humidity(&mut self) -> f32 {
        self.refresh().await;
        self.last_reading.relative_humidity()
    }

    /// CO2 (ppm), temperature and relative humidity from a single update.
    pub async fn get_all_readings(&mut self, unit: TemperatureUnit) -> (u16, f32, f32) {
        self.refresh().await;
        let reading = self.last_reading;
        (
            reading.co2_ppm,
            reading.temperature(unit),
            reading.relative_humidity(),
        )
    }

    pub fn release(self) -> (&'a mut T, D) {
        (self.bus.release(), self.delay)
    }

    async fn refresh(&mut self) {
        if let Err(e) = self.read_measurement_if_ready().await {
            error!("Measurement update failed: {:?}", e);
        }
    }

    async fn fetch_measurement(&mut self) -> Result<ReadStatus, SCD40Error> {
        match self.data_ready_status().await? {
            DataReady::Ready => {}
            DataReady::NotReady => {
                debug!("Data not ready, keeping last reading");
                return Ok(ReadStatus::Stale);
            }
            DataReady::Corrupted => return Ok(ReadStatus::ReadyStatusCorrupted),
        }

        self.bus
            .write_command(Command::ReadMeasurement, &mut self.delay)
            .await?;
        let frames = self
            .bus
            .read_frames::<MEASUREMENT_FRAMES, _>(&mut self.delay)
            .await?;
        self.last_reading = measurement::decode(&frames, self.config.checksum_policy)?;
        Ok(ReadStatus::Fresh)
    }

    async fn idle_command(&mut self, command: Command) -> Result<(), SCD40Error> {
        if command.requires_idle() && self.state != MeasurementState::Stopped {
            warn!("Command {:#x} rejected: periodic measurement running", command.raw());
            return Err(SCD40Error::MeasurementRunning);
        }
        self.bus.write_command(command, &mut self.delay).await
    }
}
