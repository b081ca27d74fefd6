#![cfg_attr(not(test), no_std)]

//! (AD5934)[https://www.analog.com/en/products/ad5934.html] impedance converter driver.
//!
//! Programs a frequency sweep, sequences the device through it and averages
//! repeated conversions into one magnitude / phase result per frequency point.
//!
//! ```ignore
//! let dev = Ad5934::new(I2cBus::new(i2c));
//! let program = SweepProgram::new(30_000.0, 10.0, 150);
//! let mut ctl = SweepController::new(dev, &program, 4)?;
//! ctl.set_output_range(OutputRange::Range1)?;
//! ctl.set_gain(PgaGain::X1)?;
//!
//! let mut poller = MeasurementPoller::new(ctl, PollConfig::default(), |p: &AveragedPoint| {
//!     // p.frequency_hz, p.magnitude, p.phase
//! })?;
//! poller.sweep(&mut delay)?;
//! ```

pub mod constants;
pub mod errors;
pub mod register;
pub mod frequency;
pub mod config;
pub mod bus;
pub mod device;
pub mod measure;
pub mod sweep;
pub mod poll;

#[cfg(test)]
mod mock;

pub use crate::{
    bus::{ I2cBus, RegisterBus },
    config::{ SettlingCycles, SettlingMultiplier, SweepProgram },
    device::Ad5934,
    errors::Error,
    measure::{ AveragedPoint, Averager, SampleRepeat },
    poll::{ MeasurementPoller, PointSink, PollConfig },
    register::{ ClockSource, ControlRegisterState, Mode, OutputRange, PgaGain, SweepStatus },
    sweep::{ Step, SweepController, SweepPhase, SweepState },
};
