//! Constants

/// 7-bit I2C slave address
pub const SLAVE_ADDRESS: u8 = 0x0D;

/// Address pointer command, selects the register for a subsequent read
pub const ADDRESS_POINTER: u8 = 0xB0;

/// Control register, D15..D8 (mode, output range, PGA gain)
pub const CONTROL_1: u8 = 0x80;

/// Control register, D7..D0 (reset, clock source)
pub const CONTROL_2: u8 = 0x81;

/// Start frequency code, 3 bytes, MSB first
pub const START_FREQUENCY: u8 = 0x82;

/// Frequency increment code, 3 bytes, MSB first
pub const FREQUENCY_INCREMENT: u8 = 0x85;

/// Number of increments, 9 bit value in 2 bytes
pub const NUMBER_OF_INCREMENTS: u8 = 0x88;

/// Settling time cycles, multiplier and 9 bit value in 2 bytes
pub const SETTLING_CYCLES: u8 = 0x8A;

/// Status register
pub const STATUS: u8 = 0x8F;

/// Real data, 16 bit two's complement, MSB first
pub const REAL_DATA: u8 = 0x94;

/// Imaginary data, 16 bit two's complement, MSB first
pub const IMAGINARY_DATA: u8 = 0x96;

/// Control register 1 bits owned by output range and PGA gain.
/// Mode transitions must carry these over unchanged.
pub const CONTROL_1_SETTINGS_MASK: u8 = 0x07;

/// Control register 2 bit that selects the external clock
pub const CONTROL_2_EXTERNAL_CLOCK: u8 = 0x08;

/// Control register 2 reset bit
pub const CONTROL_2_RESET: u8 = 0x10;

/// Status: real/imaginary data registers hold a fresh conversion
pub const STATUS_VALID_DATA: u8 = 0x02;

/// Status: last point of the programmed sweep has been converted
pub const STATUS_SWEEP_COMPLETE: u8 = 0x04;

/// Status bits defined by the device, anything else reads as 0
pub const STATUS_DEFINED_MASK: u8 = 0x07;

/// Internal oscillator frequency
pub const INTERNAL_CLOCK_HZ: f32 = 16_776_000.0;

/// The DDS is clocked at MCLK / 16
pub const DDS_CLOCK_DIVIDER: f64 = 16.0;

/// Frequency code is a 27-bit fraction of the DDS clock
pub const FREQUENCY_CODE_SCALE: f64 = (1u64 << 27) as f64;

/// Frequency codes are 24 bits wide
pub const FREQUENCY_CODE_MAX: u32 = 0x00FF_FFFF;

/// Number of increments register holds 9 bits
pub const INCREMENT_COUNT_MAX: u16 = 511;

/// Settling cycles register holds 9 bits of cycle count
pub const SETTLING_CYCLES_FIELD_MAX: u16 = 511;

/// Largest settling cycle count accepted from callers,
/// values above the field width fold into the multiplier
pub const SETTLING_CYCLES_MAX: u16 = 1023;

/// Repeat buffer capacity per frequency point
pub const MAX_REPEATS: usize = 64;

/// Default delay between status polls
pub const DEFAULT_POLL_INTERVAL_MS: u16 = 20;

/// Default number of consecutive polls without progress before giving up
pub const DEFAULT_MAX_IDLE_POLLS: u32 = 250;

/// Default pause between Init and Start, lets the excitation settle
pub const DEFAULT_STARTUP_DELAY_MS: u16 = 10;
