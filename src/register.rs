//! AD5934 control and status registers

use core::marker::PhantomData;

use crate::constants::*;

/// Register marker types
macro_rules! gen_register_marker {
    ($(#[$meta:meta])* $r:ident, $addr:expr) => {
        $(#[$meta])*
        #[derive(Debug,Copy,Clone,PartialEq,Eq)]
        pub struct $r {}

        impl Address for $r { const ADDRESS: u8 = $addr; }
    }
}

/// Bus address of a register marker
pub trait Address {
    const ADDRESS: u8;
}

gen_register_marker!(
    /// Control register D15..D8
    Ctrl1, CONTROL_1
);
gen_register_marker!(
    /// Control register D7..D0
    Ctrl2, CONTROL_2
);


/// Single 8-bit control register
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub struct Reg<R> {
    /// Register byte
    pub w: u8,
    phantom: PhantomData<R>,
}

impl<R> Default for Reg<R> {
    #[inline]
    fn default() -> Self { Reg::new(0) }
}

/// Bit operations on register bytes
impl<R> Reg<R> {
    #[inline]
    pub fn new(w: u8) -> Self {
        Reg { w, phantom: PhantomData }
    }

    #[inline]
    pub fn get<F>(self: &Self) -> F
    where F: Sized + BitField<R> + From<u8>
    {
        F::from(
            (self.w >> F::offset()) & F::mask()
        )
    }

    #[inline]
    pub fn set<F>(mut self: Self, f: F) -> Self
    where F: Sized + BitField<R> + Into<u8>
    {
        let fbits = (f.into() & F::mask()) << F::offset();
        let rbits = self.w & (! ( F::mask() << F::offset() ));
        self.w = rbits | fbits;
        self
    }
}


/// Bit operations on 8bit register bytes
pub trait BitField<R> {
    /// Number of bits in the bit field
    fn num_bits() -> u8;

    /// Offset from 0
    fn offset() -> u8;

    #[inline]
    fn mask() -> u8 {
        !(0xFFu8 << Self::num_bits())
    }

    /// Bits occupied by the field, in register position
    #[inline]
    fn field_mask() -> u8 {
        Self::mask() << Self::offset()
    }
}

/// Generate BitField implementation
macro_rules! gen_bitfield_impl {
	($r:ty, $n:ident, $nb:tt, $off:tt) => {
        impl BitField<$r> for $n {
            #[inline] fn num_bits() -> u8 { $nb }
            #[inline] fn offset() -> u8 { $off }
        }
    }
}

/// Enum-encoded field boilerplate, decoding goes through `from_bits`
macro_rules! gen_bitfield_enum {
	($r:ty, $n:ident, $nb:tt, $off:tt) => {
        gen_bitfield_impl!($r, $n, $nb, $off);

        impl From<u8> for $n { #[inline] fn from(x: u8) -> Self { $n::from_bits(x) } }
        impl Into<u8> for $n { #[inline] fn into(self) -> u8 { self as u8 } }
    }
}


/// Control register D15..D12, the operating mode command.
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Register not programmed yet
    NoOperation = 0b0000,
    /// Excite the load at the start frequency without measuring
    Initialize = 0b0001,
    /// Begin converting at the current frequency
    StartSweep = 0b0010,
    /// Step to the next frequency and convert
    Increment = 0b0011,
    /// Convert again at the current frequency
    Repeat = 0b0100,
    /// Output and DDS off, lowest power
    PowerDown = 0b1010,
    /// Output biased at VDD/2, registers retained
    Standby = 0b1011,
}
gen_bitfield_enum!(Ctrl1, Mode, 4, 4);

impl Mode {
    fn from_bits(x: u8) -> Self {
        match x {
            0b0001 => Mode::Initialize,
            0b0010 => Mode::StartSweep,
            0b0011 => Mode::Increment,
            0b0100 => Mode::Repeat,
            0b1010 => Mode::PowerDown,
            0b1011 => Mode::Standby,
            _ => Mode::NoOperation,
        }
    }

    /// Command byte as it lands in control register 1,
    /// before the range/gain bits are merged in.
    #[inline]
    pub fn pattern(self) -> u8 {
        Reg::<Ctrl1>::default().set(self).w
    }
}


/// Control register D10..D9, excitation output voltage range.
/// Numbering follows the datasheet, not the bit order.
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputRange {
    /// Range 1, 2.0 V p-p
    Range1 = 0b00,
    /// Range 4, 200 mV p-p
    Range4 = 0b01,
    /// Range 3, 400 mV p-p
    Range3 = 0b10,
    /// Range 2, 1.0 V p-p
    Range2 = 0b11,
}
gen_bitfield_enum!(Ctrl1, OutputRange, 2, 1);

impl OutputRange {
    fn from_bits(x: u8) -> Self {
        match x & 0b11 {
            0b01 => OutputRange::Range4,
            0b10 => OutputRange::Range3,
            0b11 => OutputRange::Range2,
            _ => OutputRange::Range1,
        }
    }

    /// Datasheet range number, 1 to 4
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(OutputRange::Range1),
            2 => Some(OutputRange::Range2),
            3 => Some(OutputRange::Range3),
            4 => Some(OutputRange::Range4),
            _ => None,
        }
    }

    /// Peak to peak excitation amplitude
    pub fn millivolts_pp(self) -> u16 {
        match self {
            OutputRange::Range1 => 2000,
            OutputRange::Range2 => 1000,
            OutputRange::Range3 => 400,
            OutputRange::Range4 => 200,
        }
    }
}


/// Control register D8, receive stage programmable gain
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PgaGain {
    X5 = 0,
    X1 = 1,
}
gen_bitfield_enum!(Ctrl1, PgaGain, 1, 0);

impl PgaGain {
    fn from_bits(x: u8) -> Self {
        if x & 1 == 1 { PgaGain::X1 } else { PgaGain::X5 }
    }
}


/// Control register D3, system clock source
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    Internal = 0,
    External = 1,
}
gen_bitfield_enum!(Ctrl2, ClockSource, 1, 3);

impl ClockSource {
    fn from_bits(x: u8) -> Self {
        if x & 1 == 1 { ClockSource::External } else { ClockSource::Internal }
    }
}


/// Cached copy of both control registers.
///
/// Mode transitions only ever touch the upper nibble of control register 1;
/// range and gain live in its low 3 bits and are carried over on every write.
#[derive(Debug,Copy,Clone,Default,PartialEq,Eq)]
pub struct ControlRegisterState {
    pub ctrl1: Reg<Ctrl1>,
    pub ctrl2: Reg<Ctrl2>,
}

impl ControlRegisterState {
    /// State from raw register bytes
    pub fn from_bytes(ctrl1: u8, ctrl2: u8) -> Self {
        ControlRegisterState { ctrl1: Reg::new(ctrl1), ctrl2: Reg::new(ctrl2) }
    }

    #[inline]
    pub fn mode(self: &Self) -> Mode { self.ctrl1.get() }

    #[inline]
    pub fn output_range(self: &Self) -> OutputRange { self.ctrl1.get() }

    #[inline]
    pub fn gain(self: &Self) -> PgaGain { self.ctrl1.get() }

    #[inline]
    pub fn clock_source(self: &Self) -> ClockSource { self.ctrl2.get() }
}

/// Merges a mode command into a control register 1 byte read from the device.
/// Bits 0..2 (range, gain) survive, D11 and the old mode are cleared.
#[inline]
pub fn merge_mode(current: u8, mode: Mode) -> u8 {
    (current & CONTROL_1_SETTINGS_MASK) | mode.pattern()
}


/// Status register snapshot, valid for a single poll only.
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepStatus(pub u8);

impl SweepStatus {
    /// Real and imaginary data registers hold a new conversion
    #[inline]
    pub fn valid_data(self: &Self) -> bool { self.0 & STATUS_VALID_DATA != 0 }

    /// The final point of the sweep has been converted
    #[inline]
    pub fn sweep_complete(self: &Self) -> bool { self.0 & STATUS_SWEEP_COMPLETE != 0 }

    /// Any of the reserved bits D3..D7 set. They are not guaranteed
    /// to read back as zero, a floating bus reads 0xFF.
    #[inline]
    pub fn has_reserved_bits(self: &Self) -> bool { self.0 & !STATUS_DEFINED_MASK != 0 }
}
