///! Device registers access

use log::{ debug, trace, warn };

use crate::bus::*;
use crate::config::*;
use crate::constants::*;
use crate::errors::*;
use crate::measure::SampleRepeat;
use crate::register::*;


/// AD5934 device
pub struct Ad5934<BUS> {
    bus: BUS,
    control: ControlRegisterState,
}


impl<BUS> Ad5934<BUS>
where BUS: RegisterBus,
{
    /// Creates the device handle. Nothing is written until the first command,
    /// cached control registers start out zeroed, see [`Ad5934::sync_control`].
    ///
    /// `bus` - register access, e.g. [`I2cBus`]
    pub fn new(bus: BUS) -> Self {
        Ad5934 { bus, control: ControlRegisterState::default() }
    }

    /// Gives the bus back
    pub fn release(self) -> BUS {
        self.bus
    }

    #[cfg(test)]
    pub(crate) fn bus_mut(self: &mut Self) -> &mut BUS {
        &mut self.bus
    }

    /// Last control register values written or read back
    #[inline]
    pub fn control(self: &Self) -> &ControlRegisterState {
        &self.control
    }

    #[inline]
    pub fn read_register(self: &mut Self, address: u8) -> Result<u8, Error> {
        self.bus.read_byte(address).map_err(|_| Error::Bus)
    }

    #[inline]
    pub fn write_register(self: &mut Self, address: u8, value: u8) -> Result<(), Error> {
        self.bus.write_byte(address, value).map_err(|_| Error::Bus)
    }

    /// Refreshes the cached control registers from the device.
    pub fn sync_control(self: &mut Self) -> Result<&ControlRegisterState, Error> {
        let c1 = self.read_register(Ctrl1::ADDRESS)?;
        let c2 = self.read_register(Ctrl2::ADDRESS)?;
        self.control = ControlRegisterState::from_bytes(c1, c2);
        Ok(&self.control)
    }

    /// Issues a mode command.
    ///
    /// Control register 1 is read back first and only its top nibble is replaced,
    /// output range and PGA gain (bits 0..2) are carried over as they are on the device.
    pub fn set_mode(self: &mut Self, mode: Mode) -> Result<(), Error> {
        let current = self.read_register(Ctrl1::ADDRESS)?;
        let w = merge_mode(current, mode);
        self.write_register(Ctrl1::ADDRESS, w)?;
        self.control.ctrl1 = Reg::new(w);
        debug!("mode {:?} ctrl1 {:#04x} -> {:#04x}", mode, current, w);
        Ok(())
    }

    /// Sets the excitation voltage range, mode bits untouched.
    pub fn set_output_range(self: &mut Self, range: OutputRange) -> Result<(), Error> {
        self.update_ctrl1(|r| r.set(range))
    }

    /// Sets the receive PGA gain, mode bits untouched.
    pub fn set_gain(self: &mut Self, gain: PgaGain) -> Result<(), Error> {
        self.update_ctrl1(|r| r.set(gain))
    }

    /// Selects the system clock. Frequency codes in a [`SweepProgram`] must be
    /// computed against the matching clock frequency.
    pub fn set_clock_source(self: &mut Self, clock: ClockSource) -> Result<(), Error> {
        let current = Reg::<Ctrl2>::new(self.read_register(Ctrl2::ADDRESS)?);
        let w = current.set(clock).w & CONTROL_2_EXTERNAL_CLOCK;
        self.write_register(Ctrl2::ADDRESS, w)?;
        self.control.ctrl2 = Reg::new(w);
        debug!("clock {:?}", clock);
        Ok(())
    }

    /// Pulses the reset bit, interrupting any sweep in progress.
    /// The clock source selection is kept.
    pub fn reset(self: &mut Self) -> Result<(), Error> {
        let clock = self.read_register(Ctrl2::ADDRESS)? & CONTROL_2_EXTERNAL_CLOCK;
        self.write_register(Ctrl2::ADDRESS, clock | CONTROL_2_RESET)?;
        self.control.ctrl2 = Reg::new(clock);
        debug!("reset");
        Ok(())
    }

    /// Loads start frequency, increment, number of increments and settling cycles.
    ///
    /// The whole program is encoded before the first write, a rejected program
    /// leaves the device untouched.
    pub fn load_program(self: &mut Self, program: &SweepProgram) -> Result<(), Error> {
        let writes = program.register_writes()?;
        for (address, value) in writes.iter() {
            self.write_register(*address, *value)?;
        }
        debug!(
            "program {} Hz + {} x {} Hz, settling {}",
            program.start_hz, program.increment_count, program.increment_hz, program.settling.total()
        );
        Ok(())
    }

    /// Reads the status register, reserved bits D3..D7 masked off.
    pub fn status(self: &mut Self) -> Result<SweepStatus, Error> {
        let s = SweepStatus(self.read_register(STATUS)?);
        if s.has_reserved_bits() {
            warn!("status {:#04x} has reserved bits set", s.0);
        }
        Ok(SweepStatus(s.0 & STATUS_DEFINED_MASK))
    }

    /// Reads real and imaginary data registers, no status check.
    pub fn read_sample(self: &mut Self) -> Result<SampleRepeat, Error> {
        let real = self.read_i16(REAL_DATA)?;
        let imag = self.read_i16(IMAGINARY_DATA)?;
        trace!("sample re {} im {}", real, imag);
        Ok(SampleRepeat { real, imag })
    }

    /// Non-blocking sample read: `WouldBlock` until the status register reports valid data.
    pub fn try_sample(self: &mut Self) -> nb::Result<SampleRepeat, Error> {
        if self.status()?.valid_data() {
            Ok(self.read_sample()?)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn read_i16(self: &mut Self, address: u8) -> Result<i16, Error> {
        let hi = self.read_register(address)?;
        let lo = self.read_register(address + 1)?;
        Ok(i16::from_be_bytes([hi, lo]))
    }

    fn update_ctrl1<F>(self: &mut Self, f: F) -> Result<(), Error>
    where F: FnOnce(Reg<Ctrl1>) -> Reg<Ctrl1>
    {
        let current = Reg::<Ctrl1>::new(self.read_register(Ctrl1::ADDRESS)?);
        let w = f(current).w;
        self.write_register(Ctrl1::ADDRESS, w)?;
        self.control.ctrl1 = Reg::new(w);
        Ok(())
    }
}
