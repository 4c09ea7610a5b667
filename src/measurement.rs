use crate::SCD40Error;
use crate::bus::RawFrame;

/// Number of frames fetched by a read-measurement transfer.
pub const MEASUREMENT_FRAMES: usize = 6;

const TICKS_FULL_SCALE: i64 = 1 << 16;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

/// What to do when a payload frame fails its CRC.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChecksumPolicy {
    /// Discard the whole reading.
    #[default]
    Enforce,
    /// Log the mismatch and use the data anyway.
    LogOnly,
}

/// A decoded measurement. Temperature and humidity are kept in tenths, already rounded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    pub co2_ppm: u16,
    pub temperature_decicelsius: i16,
    pub humidity_decipercent: u16,
}

impl SensorReading {
    pub fn temperature_celsius(&self) -> f32 {
        self.temperature_decicelsius as f32 / 10.0
    }

    /// Derived from the rounded Celsius value, never from raw ticks.
    pub fn temperature_fahrenheit(&self) -> f32 {
        self.temperature_celsius() * 9.0 / 5.0 + 32.0
    }

    pub fn temperature(&self, unit: TemperatureUnit) -> f32 {
        match unit {
            TemperatureUnit::Celsius => self.temperature_celsius(),
            TemperatureUnit::Fahrenheit => self.temperature_fahrenheit(),
        }
    }

    pub fn relative_humidity(&self) -> f32 {
        self.humidity_decipercent as f32 / 10.0
    }
}

/// `-45 + 175 * ticks / 2^16` °C, in tenths. Accepts the 2^16 boundary.
pub fn temperature_from_ticks(ticks: u32) -> i16 {
    let numerator = 1750 * ticks as i64 - 450 * TICKS_FULL_SCALE;
    round_div(numerator, TICKS_FULL_SCALE) as i16
}

/// `100 * ticks / 2^16` %RH, in tenths. Accepts the 2^16 boundary.
pub fn humidity_from_ticks(ticks: u32) -> u16 {
    round_div(1000 * ticks as i64, TICKS_FULL_SCALE) as u16
}

// Half away from zero; `den` is positive.
fn round_div(num: i64, den: i64) -> i64 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        -((-num + den / 2) / den)
    }
}

/// Turns the frames of a read-measurement transfer into a reading.
///
/// Only the first three words carry data; the trailing frames are not checked.
pub fn decode(
    frames: &[RawFrame; MEASUREMENT_FRAMES],
    policy: ChecksumPolicy,
) -> Result<SensorReading, SCD40Error> {
    let mut words = [0u16; 3];
    for (word, frame) in words.iter_mut().zip(frames.iter()) {
        *word = match policy {
            ChecksumPolicy::Enforce => frame.checked()?,
            ChecksumPolicy::LogOnly => {
                if !frame.is_valid() {
                    warn!("Ignoring CRC mismatch on word {:#x}", frame.data_word);
                }
                frame.data_word
            }
        };
    }

    let reading = SensorReading {
        co2_ppm: words[0],
        temperature_decicelsius: temperature_from_ticks(words[1] as u32),
        humidity_decipercent: humidity_from_ticks(words[2] as u32),
    };
    info!(
        "CO2: {} ppm, temperature: {} d°C, humidity: {} d%RH",
        reading.co2_ppm,
        reading.temperature_decicelsius,
        reading.humidity_decipercent
    );
    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::compute_checksum;

    fn frame(word: u16) -> RawFrame {
        RawFrame {
            data_word: word,
            checksum_byte: compute_checksum(word),
        }
    }

    fn frames(co2: u16, t: u16, rh: u16) -> [RawFrame; MEASUREMENT_FRAMES] {
        [frame(co2), frame(t), frame(rh), frame(0), frame(0), frame(0)]
    }

    #[test]
    fn temperature_range_ends() {
        assert_eq!(-450, temperature_from_ticks(0));
        assert_eq!(1300, temperature_from_ticks(65536));
    }

    #[test]
    fn humidity_range_ends() {
        assert_eq!(0, humidity_from_ticks(0));
        assert_eq!(1000, humidity_from_ticks(65536));
    }

    #[test]
    fn half_way_values_round_away_from_zero() {
        // 175 * 16384 / 65536 = 43.75 -> -1.25 °C
        assert_eq!(-13, temperature_from_ticks(16384));
        // 175 * 49152 / 65536 = 131.25 -> 86.25 °C
        assert_eq!(863, temperature_from_ticks(49152));
        // 100 * 32768 / 65536 = 50.0
        assert_eq!(500, humidity_from_ticks(32768));
    }

    #[test]
    fn fahrenheit_is_derived_from_celsius() {
        let mut reading = SensorReading::default();
        assert_eq!(32.0, reading.temperature_fahrenheit());

        reading.temperature_decicelsius = 1000;
        assert_eq!(100.0, reading.temperature_celsius());
        assert_eq!(212.0, reading.temperature_fahrenheit());
        assert_eq!(212.0, reading.temperature(TemperatureUnit::Fahrenheit));
    }

    #[test]
    fn decodes_payload_words() {
        let reading = decode(&frames(400, 0x6667, 0x7333), ChecksumPolicy::Enforce).unwrap();
        assert_eq!(400, reading.co2_ppm);
        // -45 + 175 * 26215 / 65536 = 25.0005
        assert_eq!(250, reading.temperature_decicelsius);
        // 100 * 29491 / 65536 = 44.99
        assert_eq!(450, reading.humidity_decipercent);
        assert_eq!(45.0, reading.relative_humidity());
    }

    #[test]
    fn enforce_rejects_a_single_bad_word() {
        let mut raw = frames(400, 0x6667, 0x7333);
        raw[2].checksum_byte ^= 0x01;
        assert_eq!(
            Err(SCD40Error::ChecksumMismatch),
            decode(&raw, ChecksumPolicy::Enforce)
        );
    }

    #[test]
    fn log_only_keeps_the_data() {
        let mut raw = frames(400, 0x6667, 0x7333);
        raw[0].checksum_byte ^= 0x01;
        let reading = decode(&raw, ChecksumPolicy::LogOnly).unwrap();
        assert_eq!(400, reading.co2_ppm);
    }

    #[test]
    fn trailing_frames_are_not_checked() {
        let mut raw = frames(400, 0x6667, 0x7333);
        raw[5] = RawFrame {
            data_word: 0xffff,
            checksum_byte: 0xff,
        };
        assert!(decode(&raw, ChecksumPolicy::Enforce).is_ok());
    }
}
