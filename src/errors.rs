//! Errors

use core::fmt;

/// Driver errors
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Register bus read or write failed
    Bus,

    /// Status register returned a pattern the sweep can't account for,
    /// raw status byte attached
    UnexpectedStatus(u8),

    /// Frequency / clock pair doesn't fit the 24-bit frequency code
    FrequencyOutOfRange,

    /// Number of increments exceeds the 9-bit register
    InvalidIncrementCount,

    /// Settling cycles can't be expressed with any multiplier
    InvalidSettlingCycles,

    /// Repeat count is zero or exceeds the repeat buffer
    InvalidRepeatCount,

    /// Repeat buffer already holds a full point
    RepeatBufferFull,

    /// Command is not valid in the current sweep state
    InvalidTransition,

    /// Poll budget exhausted without the expected status transition
    SweepTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus => write!(f, "register bus error"),
            Error::UnexpectedStatus(s) => write!(f, "unexpected status {:#04x}", s),
            Error::FrequencyOutOfRange => write!(f, "frequency code exceeds 24 bits"),
            Error::InvalidIncrementCount => write!(f, "number of increments out of range"),
            Error::InvalidSettlingCycles => write!(f, "settling cycles out of range"),
            Error::InvalidRepeatCount => write!(f, "repeat count out of range"),
            Error::RepeatBufferFull => write!(f, "repeat buffer full"),
            Error::InvalidTransition => write!(f, "invalid sweep state transition"),
            Error::SweepTimeout => write!(f, "sweep timed out"),
        }
    }
}
