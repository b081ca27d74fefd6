///! Sweep configuration / register derivation

use crate::{ constants::*, errors::*, frequency::* };


/// Settling time multiplier, register 0x8A bits D10..D9
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettlingMultiplier {
    X1 = 0b00,
    X2 = 0b01,
    X4 = 0b11,
}

impl SettlingMultiplier {
    /// Numeric factor
    pub fn factor(self) -> u16 {
        match self {
            SettlingMultiplier::X1 => 1,
            SettlingMultiplier::X2 => 2,
            SettlingMultiplier::X4 => 4,
        }
    }
}


/// Settling cycles as written to the device.
///
/// The cycle field is 9 bits wide. Larger requests are moved to the next
/// multiplier with the cycle count rounded up, so the device never settles
/// for less than what was asked for.
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SettlingCycles {
    pub cycles: u16,
    pub multiplier: SettlingMultiplier,
}

impl SettlingCycles {
    pub fn new(cycles: u16, multiplier: SettlingMultiplier) -> Result<Self, Error> {
        if cycles > SETTLING_CYCLES_MAX {
            return Err(Error::InvalidSettlingCycles);
        }

        let total = cycles as u32 * multiplier.factor() as u32;
        let candidates = [SettlingMultiplier::X1, SettlingMultiplier::X2, SettlingMultiplier::X4];
        candidates.iter()
            .filter(|m| m.factor() >= multiplier.factor())
            .map(|m| (*m, (total + m.factor() as u32 - 1) / m.factor() as u32))
            .find(|(_, c)| *c <= SETTLING_CYCLES_FIELD_MAX as u32)
            .map(|(m, c)| SettlingCycles { cycles: c as u16, multiplier: m })
            .ok_or(Error::InvalidSettlingCycles)
    }

    /// Effective number of excitation cycles before a conversion
    pub fn total(self: &Self) -> u32 {
        self.cycles as u32 * self.multiplier.factor() as u32
    }

    /// Register bytes for 0x8A, 0x8B
    pub fn to_bytes(self: &Self) -> [u8; 2] {
        [
            ((self.multiplier as u8) << 1) | ((self.cycles >> 8) as u8 & 0x01),
            (self.cycles & 0xFF) as u8,
        ]
    }
}

impl Default for SettlingCycles {
    fn default() -> Self {
        SettlingCycles { cycles: 15, multiplier: SettlingMultiplier::X1 }
    }
}


/// Frequency sweep parameters.
///
/// Built with chained setters, checked as a whole by [`SweepProgram::register_writes`]
/// before anything reaches the device.
#[derive(Debug,Copy,Clone,PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepProgram {
    pub start_hz: f32,
    pub increment_hz: f32,
    pub increment_count: u16,
    pub settling: SettlingCycles,
    pub clock_hz: f32,
}

/// A single register write, (address, value)
pub type RegisterWrite = (u8, u8);

/// Number of register writes needed to load a program
pub const PROGRAM_WRITES: usize = 10;

impl SweepProgram {

    /// Sweep from `start_hz` in `increment_count` steps of `increment_hz`,
    /// internal clock, default settling.
    pub fn new(start_hz: f32, increment_hz: f32, increment_count: u16) -> Self {
        SweepProgram {
            start_hz,
            increment_hz,
            increment_count,
            settling: SettlingCycles::default(),
            clock_hz: INTERNAL_CLOCK_HZ,
        }
    }

    /// Frequency codes are relative to this clock
    pub fn clock_hz(mut self: Self, clock_hz: f32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    /// Settling cycles, validated when the program is encoded
    pub fn settling(mut self: Self, settling: SettlingCycles) -> Self {
        self.settling = settling;
        self
    }

    /// Number of frequency points the sweep produces
    #[inline]
    pub fn point_count(self: &Self) -> u16 {
        self.increment_count + 1
    }

    /// Nominal frequency of point `index`
    #[inline]
    pub fn frequency_at(self: &Self, index: u16) -> f32 {
        self.start_hz + index as f32 * self.increment_hz
    }

    /// Last frequency of the sweep
    #[inline]
    pub fn stop_hz(self: &Self) -> f32 {
        self.frequency_at(self.increment_count)
    }

    /// Validates the program and derives the register writes,
    /// in address order.
    pub fn register_writes(self: &Self) -> Result<[RegisterWrite; PROGRAM_WRITES], Error> {
        if self.increment_count > INCREMENT_COUNT_MAX {
            return Err(Error::InvalidIncrementCount);
        }

        let start = encode(self.start_hz, self.clock_hz)?;
        let inc = encode(self.increment_hz, self.clock_hz)?;
        // the device accumulates codes, the last point must be representable as well
        encode(self.stop_hz(), self.clock_hz)?;

        let n = [
            ((self.increment_count >> 8) & 0x01) as u8,
            (self.increment_count & 0xFF) as u8,
        ];
        let s = self.settling.to_bytes();

        Ok([
            (START_FREQUENCY,         start[0]),
            (START_FREQUENCY + 1,     start[1]),
            (START_FREQUENCY + 2,     start[2]),
            (FREQUENCY_INCREMENT,     inc[0]),
            (FREQUENCY_INCREMENT + 1, inc[1]),
            (FREQUENCY_INCREMENT + 2, inc[2]),
            (NUMBER_OF_INCREMENTS,    n[0]),
            (NUMBER_OF_INCREMENTS + 1, n[1]),
            (SETTLING_CYCLES,         s[0]),
            (SETTLING_CYCLES + 1,     s[1]),
        ])
    }
}
