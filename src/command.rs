use embassy_time::Duration;

pub const DEFAULT_ADDRESS: u8 = 0x62;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    StartPeriodicMeasurement,
    StopPeriodicMeasurement,
    ReadMeasurement,
    GetDataReadyStatus,
    PerformFactoryReset,
    Reinit,
    GetSerialNumber,
}

impl Command {
    pub const fn raw(self) -> u16 {
        match self {
            Command::StartPeriodicMeasurement => 0x21b1,
            Command::StopPeriodicMeasurement => 0x3f86,
            Command::ReadMeasurement => 0xec05,
            Command::GetDataReadyStatus => 0xe4b8,
            Command::PerformFactoryReset => 0x3632,
            Command::Reinit => 0x3646,
            Command::GetSerialNumber => 0x3682,
        }
    }

    /// Time the sensor needs after the command before the bus may be used again.
    pub const fn execution_time(self) -> Duration {
        match self {
            Command::StartPeriodicMeasurement => Duration::from_millis(0),
            Command::StopPeriodicMeasurement => Duration::from_millis(500),
            Command::ReadMeasurement => Duration::from_millis(1),
            Command::GetDataReadyStatus => Duration::from_millis(1),
            Command::PerformFactoryReset => Duration::from_millis(1200),
            Command::Reinit => Duration::from_millis(30),
            Command::GetSerialNumber => Duration::from_millis(1),
        }
    }

    /// Commands the sensor only accepts while idle.
    pub const fn requires_idle(self) -> bool {
        matches!(
            self,
            Command::PerformFactoryReset | Command::Reinit | Command::GetSerialNumber
        )
    }
}
