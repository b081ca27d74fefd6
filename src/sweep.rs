//! Sweep sequencing
//!
//! ```text
//! Idle -> Standby -> Initialized -> Sweeping { Repeating | Advancing | Finishing } -> Complete
//! ```
//!
//! Every frequency point is converted `repeat_count` times; the controller
//! issues `Repeat` until that count is reached, then `Increment`. The sweep is
//! complete once the last of the `increment_count + 1` points has all its repeats
//! and the device reports sweep complete.

use log::{ debug, warn };

use crate::bus::*;
use crate::config::*;
use crate::device::*;
use crate::errors::*;
use crate::register::*;


/// What the device is doing while a sweep is running
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SweepPhase {
    /// Converting the current frequency again
    Repeating,
    /// Converting a frequency for the first time
    Advancing,
    /// All points converted, waiting for the sweep complete status
    Finishing,
}

#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SweepState {
    Idle,
    Standby,
    Initialized,
    Sweeping(SweepPhase),
    Complete,
}


/// Outcome of feeding one valid sample to the controller
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// More repeats needed at `index`
    Repeat { index: u16 },
    /// Point `index` has all its repeats, device moved on to the next frequency
    Advance { index: u16 },
    /// Point `index` has all its repeats and was the last one
    Last { index: u16 },
}


/// Drives the device through a programmed sweep.
pub struct SweepController<BUS> {
    device: Ad5934<BUS>,
    program: SweepProgram,
    repeat_count: u16,
    state: SweepState,
    index: u16,
    taken: u16,
}


impl<BUS> SweepController<BUS>
where BUS: RegisterBus,
{
    /// Controller for `program`, converting each point `repeat_count` times.
    /// The program is validated here, nothing is written yet.
    pub fn new(device: Ad5934<BUS>, program: &SweepProgram, repeat_count: u16) -> Result<Self, Error> {
        program.register_writes()?;
        if repeat_count == 0 {
            return Err(Error::InvalidRepeatCount);
        }
        Ok(SweepController {
            device,
            program: *program,
            repeat_count,
            state: SweepState::Idle,
            index: 0,
            taken: 0,
        })
    }

    /// Gives the device back
    pub fn release(self) -> Ad5934<BUS> {
        self.device
    }

    #[inline]
    pub fn device(self: &Self) -> &Ad5934<BUS> { &self.device }

    #[inline]
    pub fn device_mut(self: &mut Self) -> &mut Ad5934<BUS> { &mut self.device }

    #[inline]
    pub fn control(self: &Self) -> &ControlRegisterState { self.device.control() }

    #[inline]
    pub fn program(self: &Self) -> &SweepProgram { &self.program }

    #[inline]
    pub fn repeat_count(self: &Self) -> u16 { self.repeat_count }

    #[inline]
    pub fn state(self: &Self) -> SweepState { self.state }

    /// Frequency point currently being converted
    #[inline]
    pub fn index(self: &Self) -> u16 { self.index }

    /// Samples taken at the current point
    #[inline]
    pub fn taken(self: &Self) -> u16 { self.taken }

    /// Nominal frequency of the current point
    #[inline]
    pub fn frequency_hz(self: &Self) -> f32 { self.program.frequency_at(self.index) }

    #[inline]
    pub fn is_complete(self: &Self) -> bool { self.state == SweepState::Complete }

    /// Output range, only before the sweep is initialized
    pub fn set_output_range(self: &mut Self, range: OutputRange) -> Result<(), Error> {
        self.check_configurable()?;
        self.device.set_output_range(range)
    }

    /// PGA gain, only before the sweep is initialized
    pub fn set_gain(self: &mut Self, gain: PgaGain) -> Result<(), Error> {
        self.check_configurable()?;
        self.device.set_gain(gain)
    }

    /// Clock source, only before the sweep is initialized.
    /// The program's clock frequency has to match.
    pub fn set_clock_source(self: &mut Self, clock: ClockSource) -> Result<(), Error> {
        self.check_configurable()?;
        self.device.set_clock_source(clock)
    }

    /// Enters standby. Safe to repeat, control registers don't change after the first call.
    pub fn standby(self: &mut Self) -> Result<(), Error> {
        match self.state {
            SweepState::Idle | SweepState::Standby => {
                self.device.set_mode(Mode::Standby)?;
                self.state = SweepState::Standby;
                Ok(())
            }
            _ => Err(Error::InvalidTransition),
        }
    }

    /// Loads the program and starts exciting the load at the start frequency.
    /// No conversion is done until [`SweepController::start`].
    pub fn initialize(self: &mut Self) -> Result<(), Error> {
        if self.state != SweepState::Standby {
            return Err(Error::InvalidTransition);
        }
        self.device.load_program(&self.program)?;
        self.device.set_mode(Mode::Initialize)?;
        self.index = 0;
        self.taken = 0;
        self.state = SweepState::Initialized;
        Ok(())
    }

    /// Starts converting at the start frequency.
    pub fn start(self: &mut Self) -> Result<(), Error> {
        if self.state != SweepState::Initialized {
            return Err(Error::InvalidTransition);
        }
        self.device.set_mode(Mode::StartSweep)?;
        self.state = SweepState::Sweeping(SweepPhase::Advancing);
        Ok(())
    }

    /// Accounts for one valid sample and issues the next command.
    ///
    /// `status` is the read that reported the sample as valid.
    pub fn on_sample(self: &mut Self, status: SweepStatus) -> Result<Step, Error> {
        match self.state {
            SweepState::Sweeping(SweepPhase::Repeating)
            | SweepState::Sweeping(SweepPhase::Advancing) => (),
            _ => return Err(Error::InvalidTransition),
        }

        // counters move only once the command is out, a failed write leaves
        // the sample unaccounted for
        let index = self.index;
        let taken = self.taken + 1;

        if taken < self.repeat_count {
            self.device.set_mode(Mode::Repeat)?;
            self.taken = taken;
            self.state = SweepState::Sweeping(SweepPhase::Repeating);
            return Ok(Step::Repeat { index });
        }

        if index >= self.program.increment_count {
            self.taken = taken;
            self.state = SweepState::Sweeping(SweepPhase::Finishing);
            self.check_finished(status)?;
            return Ok(Step::Last { index });
        }

        if status.sweep_complete() {
            warn!("sweep complete reported at point {} of {}", index, self.program.increment_count);
            return Err(Error::UnexpectedStatus(status.0));
        }

        self.device.set_mode(Mode::Increment)?;
        self.index += 1;
        self.taken = 0;
        self.state = SweepState::Sweeping(SweepPhase::Advancing);
        debug!("point {} -> {} Hz", self.index, self.frequency_hz());
        Ok(Step::Advance { index })
    }

    /// Checks a status read while all points are in but the device
    /// hasn't reported sweep complete yet. True once complete.
    pub fn check_finished(self: &mut Self, status: SweepStatus) -> Result<bool, Error> {
        match self.state {
            SweepState::Complete => Ok(true),
            SweepState::Sweeping(SweepPhase::Finishing) => {
                if status.sweep_complete() {
                    self.state = SweepState::Complete;
                    debug!("sweep complete, {} points", self.program.point_count());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            _ => Err(Error::InvalidTransition),
        }
    }

    /// Abandons whatever is in progress and returns the device to standby.
    /// Used to recover from [`Error::SweepTimeout`].
    pub fn abort(self: &mut Self) -> Result<(), Error> {
        self.index = 0;
        self.taken = 0;
        self.device.set_mode(Mode::Standby)?;
        self.state = SweepState::Standby;
        Ok(())
    }

    /// Powers the device down, back to `Idle`.
    pub fn power_down(self: &mut Self) -> Result<(), Error> {
        self.index = 0;
        self.taken = 0;
        self.device.set_mode(Mode::PowerDown)?;
        self.state = SweepState::Idle;
        Ok(())
    }

    fn check_configurable(self: &Self) -> Result<(), Error> {
        match self.state {
            SweepState::Idle | SweepState::Standby => Ok(()),
            _ => Err(Error::InvalidTransition),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::mock::*;

    fn controller(increments: u16, repeats: u16) -> SweepController<MockBus> {
        let p = SweepProgram::new(10_000.0, 1_000.0, increments);
        SweepController::new(Ad5934::new(MockBus::new()), &p, repeats).unwrap()
    }

    const VALID: SweepStatus = SweepStatus(STATUS_VALID_DATA);
    const VALID_DONE: SweepStatus = SweepStatus(STATUS_VALID_DATA | STATUS_SWEEP_COMPLETE);

    #[test]
    fn transitions_in_order() {
        let mut c = controller(3, 2);
        assert_eq!(c.start(), Err(Error::InvalidTransition));
        assert_eq!(c.initialize(), Err(Error::InvalidTransition));

        c.standby().unwrap();
        c.standby().unwrap();
        assert_eq!(c.state(), SweepState::Standby);

        c.initialize().unwrap();
        assert_eq!(c.control().mode(), Mode::Initialize);
        assert_eq!(c.set_gain(PgaGain::X1), Err(Error::InvalidTransition));
        assert_eq!(c.standby(), Err(Error::InvalidTransition));

        c.start().unwrap();
        assert_eq!(c.state(), SweepState::Sweeping(SweepPhase::Advancing));
        assert_eq!(c.control().mode(), Mode::StartSweep);
    }

    #[test]
    fn repeats_then_advances() {
        let mut c = controller(3, 2);
        c.standby().unwrap();
        c.initialize().unwrap();
        c.start().unwrap();

        let mut steps = std::vec::Vec::new();
        for i in 0..8 {
            let status = if i == 7 { VALID_DONE } else { VALID };
            steps.push(c.on_sample(status).unwrap());
        }

        assert_eq!(steps, vec![
            Step::Repeat { index: 0 }, Step::Advance { index: 0 },
            Step::Repeat { index: 1 }, Step::Advance { index: 1 },
            Step::Repeat { index: 2 }, Step::Advance { index: 2 },
            Step::Repeat { index: 3 }, Step::Last { index: 3 },
        ]);
        assert!(c.is_complete());

        let bus = c.release().release();
        let modes: std::vec::Vec<u8> = bus.writes_to(CONTROL_1).iter().map(|w| w & 0xF0).collect();
        assert_eq!(modes, vec![0xB0, 0x10, 0x20, 0x40, 0x30, 0x40, 0x30, 0x40, 0x30, 0x40]);
    }

    #[test]
    fn waits_for_sweep_complete_status() {
        let mut c = controller(0, 1);
        c.standby().unwrap();
        c.initialize().unwrap();
        c.start().unwrap();

        assert_eq!(c.on_sample(VALID), Ok(Step::Last { index: 0 }));
        assert_eq!(c.state(), SweepState::Sweeping(SweepPhase::Finishing));
        assert_eq!(c.check_finished(VALID), Ok(false));
        assert_eq!(c.check_finished(VALID_DONE), Ok(true));
        assert!(c.is_complete());
        assert_eq!(c.on_sample(VALID), Err(Error::InvalidTransition));
    }

    #[test]
    fn failed_command_leaves_counters() {
        let mut c = controller(1, 2);
        c.standby().unwrap();
        c.initialize().unwrap();
        c.start().unwrap();

        c.device_mut().bus_mut().fail_writes = true;
        assert_eq!(c.on_sample(VALID), Err(Error::Bus));
        assert_eq!((c.index(), c.taken()), (0, 0));

        c.device_mut().bus_mut().fail_writes = false;
        assert_eq!(c.on_sample(VALID), Ok(Step::Repeat { index: 0 }));

        c.device_mut().bus_mut().fail_writes = true;
        assert_eq!(c.on_sample(VALID), Err(Error::Bus));
        assert_eq!((c.index(), c.taken()), (0, 1));
        assert_eq!(c.state(), SweepState::Sweeping(SweepPhase::Repeating));

        c.device_mut().bus_mut().fail_writes = false;
        assert_eq!(c.on_sample(VALID), Ok(Step::Advance { index: 0 }));
        assert_eq!((c.index(), c.taken()), (1, 0));
    }

    #[test]
    fn early_sweep_complete_is_an_error() {
        let mut c = controller(2, 1);
        c.standby().unwrap();
        c.initialize().unwrap();
        c.start().unwrap();
        assert_eq!(c.on_sample(VALID_DONE), Err(Error::UnexpectedStatus(0x06)));
    }

    #[test]
    fn abort_recovers_to_standby() {
        let mut c = controller(2, 2);
        c.standby().unwrap();
        c.initialize().unwrap();
        c.start().unwrap();
        c.on_sample(VALID).unwrap();

        c.abort().unwrap();
        assert_eq!(c.state(), SweepState::Standby);
        assert_eq!((c.index(), c.taken()), (0, 0));
        c.initialize().unwrap();

        c.power_down().unwrap();
        assert_eq!(c.state(), SweepState::Idle);
        assert_eq!(c.control().mode(), Mode::PowerDown);
    }

    #[test]
    fn rejects_bad_configuration_up_front() {
        let p = SweepProgram::new(10_000.0, 1_000.0, 600);
        assert_eq!(
            SweepController::new(Ad5934::new(MockBus::new()), &p, 1).err(),
            Some(Error::InvalidIncrementCount)
        );
        let p = SweepProgram::new(10_000.0, 1_000.0, 6);
        assert_eq!(
            SweepController::new(Ad5934::new(MockBus::new()), &p, 0).err(),
            Some(Error::InvalidRepeatCount)
        );
    }
}
