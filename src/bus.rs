use core::future::Future;

use embassy_futures::select::{Either, select};
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::SCD40Error;
use crate::command::Command;
use crate::crc::compute_checksum;

pub const FRAME_LEN: usize = 3;
const MAX_FRAMES: usize = 6;

/// One word as sent by the sensor: big-endian data followed by its CRC.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawFrame {
    pub data_word: u16,
    pub checksum_byte: u8,
}

impl RawFrame {
    pub fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self {
            data_word: u16::from_be_bytes([bytes[0], bytes[1]]),
            checksum_byte: bytes[2],
        }
    }

    pub fn is_valid(&self) -> bool {
        compute_checksum(self.data_word) == self.checksum_byte
    }

    pub fn checked(self) -> Result<u16, SCD40Error> {
        if self.is_valid() {
            Ok(self.data_word)
        } else {
            warn!(
                "CRC mismatch on word {:#x}: received {:#x}, expected {:#x}",
                self.data_word,
                self.checksum_byte,
                compute_checksum(self.data_word)
            );
            Err(SCD40Error::ChecksumMismatch)
        }
    }
}

pub(crate) struct SensirionBus<'a, T: I2c> {
    i2c: &'a mut T,
    address: u8,
    timeout: Option<Duration>,
}

impl<'a, T: I2c> SensirionBus<'a, T> {
    pub fn new(i2c: &'a mut T, address: u8, timeout: Option<Duration>) -> Self {
        Self {
            i2c,
            address,
            timeout,
        }
    }

    /// Writes a command and waits out its execution time.
    pub async fn write_command<D: DelayNs>(
        &mut self,
        command: Command,
        delay: &mut D,
    ) -> Result<(), SCD40Error> {
        trace!("Write command {:#x}", command.raw());
        let address = self.address;
        let bytes = command.raw().to_be_bytes();
        bounded(self.timeout, delay, self.i2c.write(address, &bytes)).await?;

        let settle = command.execution_time();
        if settle > Duration::from_ticks(0) {
            delay.delay_ms(settle.as_millis() as u32).await;
        }
        Ok(())
    }

    /// Reads `N` consecutive frames in a single transfer.
    pub async fn read_frames<const N: usize, D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<[RawFrame; N], SCD40Error> {
        const { assert!(N <= MAX_FRAMES) };

        let address = self.address;
        let mut buffer = [0u8; MAX_FRAMES * FRAME_LEN];
        bounded(
            self.timeout,
            delay,
            self.i2c.read(address, &mut buffer[..N * FRAME_LEN]),
        )
        .await?;

        Ok(core::array::from_fn(|i| {
            let offset = i * FRAME_LEN;
            RawFrame::from_bytes([buffer[offset], buffer[offset + 1], buffer[offset + 2]])
        }))
    }

    pub fn release(self) -> &'a mut T {
        self.i2c
    }
}

async fn bounded<E, F, D>(
    timeout: Option<Duration>,
    delay: &mut D,
    transfer: F,
) -> Result<(), SCD40Error>
where
    F: Future<Output = Result<(), E>>,
    D: DelayNs,
{
    let result = match timeout {
        Some(limit) => match select(transfer, delay.delay_ms(limit.as_millis() as u32)).await {
            Either::First(result) => result,
            Either::Second(()) => {
                error!("I2C transfer timed out after {} ms", limit.as_millis());
                return Err(SCD40Error::Timeout);
            }
        },
        None => transfer.await,
    };

    result.map_err(|_| {
        error!("I2C transfer failed");
        SCD40Error::I2CError
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_from_wire_bytes() {
        let frame = RawFrame::from_bytes([0xbe, 0xef, 0x92]);
        assert_eq!(0xbeef, frame.data_word);
        assert!(frame.is_valid());
        assert_eq!(Ok(0xbeef), frame.checked());
    }

    #[test]
    fn corrupted_frame_is_rejected() {
        let frame = RawFrame::from_bytes([0xbe, 0xef, 0x93]);
        assert!(!frame.is_valid());
        assert_eq!(Err(SCD40Error::ChecksumMismatch), frame.checked());
    }
}
