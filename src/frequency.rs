///! Frequency code calculations

use crate::{constants::*, errors::*};


/// 24-bit DDS frequency code.
///
/// code = round(f / (MCLK / 16) × 2^27)
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrequencyCode(pub u32);

impl FrequencyCode {

    /// Encode `freq_hz` relative to the system clock `clock_hz`.
    ///
    /// Codes above 24 bits are rejected, never truncated.
    pub fn encode(freq_hz: f32, clock_hz: f32) -> Result<Self, Error> {
        if !freq_hz.is_finite() || freq_hz < 0.0 || !clock_hz.is_finite() || clock_hz <= 0.0 {
            return Err(Error::FrequencyOutOfRange);
        }

        let dds_hz = clock_hz as f64 / DDS_CLOCK_DIVIDER;
        let code = libm::round(freq_hz as f64 / dds_hz * FREQUENCY_CODE_SCALE);

        if code > FREQUENCY_CODE_MAX as f64 {
            Err(Error::FrequencyOutOfRange)
        } else {
            Ok(FrequencyCode(code as u32))
        }
    }

    /// Frequency represented by this code.
    pub fn decode(self: &Self, clock_hz: f32) -> f32 {
        let dds_hz = clock_hz as f64 / DDS_CLOCK_DIVIDER;
        (self.0 as f64 * dds_hz / FREQUENCY_CODE_SCALE) as f32
    }

    /// Register bytes, MSB first (bits 23..16, 15..8, 7..0)
    #[inline]
    pub fn to_bytes(self: &Self) -> [u8; 3] {
        [
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >>  8) & 0xFF) as u8,
            ( self.0        & 0xFF) as u8,
        ]
    }

    /// Frequency resolution of one code step
    pub fn resolution_hz(clock_hz: f32) -> f32 {
        (clock_hz as f64 / DDS_CLOCK_DIVIDER / FREQUENCY_CODE_SCALE) as f32
    }
}

/// Encode a frequency straight into its three register bytes.
pub fn encode(freq_hz: f32, clock_hz: f32) -> Result<[u8; 3], Error> {
    FrequencyCode::encode(freq_hz, clock_hz).map(|c| c.to_bytes())
}

/// Inverse of [`encode`]
pub fn decode(bytes: [u8; 3], clock_hz: f32) -> f32 {
    let code = (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32;
    FrequencyCode(code).decode(clock_hz)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_within_resolution() {
        let clk = INTERNAL_CLOCK_HZ;
        let res = FrequencyCode::resolution_hz(clk);
        assert!(res < 0.1);

        let mut f = 1_000.0f32;
        while f < 100_000.0 {
            let b = encode(f, clk).unwrap();
            let back = decode(b, clk);
            assert!((back - f).abs() <= 2.0 * res, "{} -> {}", f, back);
            f += 1_237.5;
        }
    }

    #[test]
    fn known_code() {
        // datasheet example, 30 kHz start with a 16 MHz clock
        let c = FrequencyCode::encode(30_000.0, 16_000_000.0).unwrap();
        assert_eq!(c, FrequencyCode(0x3D70A4));
        assert_eq!(c.to_bytes(), [0x3D, 0x70, 0xA4]);
    }

    #[test]
    fn overflow_is_rejected() {
        let clk = 16_776_000.0;
        assert_eq!(encode(clk, clk), Err(Error::FrequencyOutOfRange));

        // largest representable frequency is just under MCLK / 128
        assert!(encode(clk / 128.0 - 10.0, clk).is_ok());
        assert_eq!(encode(clk / 128.0 + 10.0, clk), Err(Error::FrequencyOutOfRange));
    }

    #[test]
    fn bad_inputs_are_rejected() {
        assert_eq!(encode(-1.0, INTERNAL_CLOCK_HZ), Err(Error::FrequencyOutOfRange));
        assert_eq!(encode(f32::NAN, INTERNAL_CLOCK_HZ), Err(Error::FrequencyOutOfRange));
        assert_eq!(encode(1_000.0, 0.0), Err(Error::FrequencyOutOfRange));
        assert_eq!(encode(0.0, INTERNAL_CLOCK_HZ), Ok([0, 0, 0]));
    }
}
