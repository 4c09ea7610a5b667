const CRC8_POLYNOMIAL: u8 = 0x31;
const CRC8_INIT: u8 = 0xFF;

/// Sensirion CRC-8 (polynomial 0x31, init 0xFF, no reflection, no final XOR).
#[inline]
pub fn sensirion_crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = CRC8_INIT;

    for &b in data {
        crc ^= b;
        for _ in 0..8 {
            crc = if (crc & 0x80) != 0 {
                (crc << 1) ^ CRC8_POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }

    crc
}

/// Checksum the sensor appends to every 16-bit word it sends, computed over the word's
/// two bytes in wire (big-endian) order.
#[inline]
pub fn compute_checksum(word: u16) -> u8 {
    sensirion_crc8(&word.to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datasheet_vector() {
        assert_eq!(0x92, compute_checksum(0xbeef));
        assert_eq!(0x92, sensirion_crc8(&[0xbe, 0xef]));
    }

    #[test]
    fn zero_word_still_covers_both_bytes() {
        assert_eq!(0x81, compute_checksum(0x0000));
        assert_ne!(sensirion_crc8(&[0x00]), compute_checksum(0x0000));
    }

    #[test]
    fn matches_catalogue_crc_for_every_word() {
        let reference = ::crc::Crc::<u8>::new(&::crc::CRC_8_NRSC_5);
        for word in 0..=u16::MAX {
            assert_eq!(
                reference.checksum(&word.to_be_bytes()),
                compute_checksum(word),
                "word {:#06x}",
                word
            );
        }
    }

    #[test]
    fn empty_input_is_init_value() {
        assert_eq!(CRC8_INIT, sensirion_crc8(&[]));
    }
}
