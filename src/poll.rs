//! Status polling loop

use embedded_hal::blocking::delay::DelayMs;
use log::{ debug, warn };

use crate::bus::*;
use crate::constants::*;
use crate::errors::*;
use crate::measure::*;
use crate::sweep::*;


/// Polling cadence and budget
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollConfig {
    /// Pause between status reads
    pub interval_ms: u16,
    /// Consecutive status reads without a sample or completion before
    /// the sweep is abandoned with [`Error::SweepTimeout`]
    pub max_idle_polls: u32,
    /// Pause between Init and Start
    pub startup_delay_ms: u16,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_idle_polls: DEFAULT_MAX_IDLE_POLLS,
            startup_delay_ms: DEFAULT_STARTUP_DELAY_MS,
        }
    }
}

impl PollConfig {
    pub fn interval_ms(mut self: Self, interval_ms: u16) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// At least one poll, a zero budget is raised to 1
    pub fn max_idle_polls(mut self: Self, max_idle_polls: u32) -> Self {
        self.max_idle_polls = core::cmp::max(max_idle_polls, 1);
        self
    }

    /// Budget as wall-clock time without progress, at the configured interval
    pub fn timeout_ms(mut self: Self, timeout_ms: u32) -> Self {
        let interval = core::cmp::max(self.interval_ms, 1) as u64;
        let polls = (timeout_ms as u64 + interval - 1) / interval;
        self.max_idle_polls = core::cmp::max(polls as u32, 1);
        self
    }

    pub fn startup_delay_ms(mut self: Self, startup_delay_ms: u16) -> Self {
        self.startup_delay_ms = startup_delay_ms;
        self
    }
}


/// Receives each averaged point as soon as it is complete
pub trait PointSink {
    fn point(self: &mut Self, point: &AveragedPoint);
}

impl<F> PointSink for F
where F: FnMut(&AveragedPoint),
{
    #[inline]
    fn point(self: &mut Self, point: &AveragedPoint) {
        self(point)
    }
}


/// Polls the device through a sweep, averaging repeats and handing
/// finished points to the sink.
pub struct MeasurementPoller<BUS, SINK> {
    controller: SweepController<BUS>,
    averager: Averager,
    config: PollConfig,
    sink: SINK,
    idle_polls: u32,
    emitted: u16,
    elapsed_ms: u32,
}


impl<BUS, SINK> MeasurementPoller<BUS, SINK>
where BUS: RegisterBus,
      SINK: PointSink,
{
    pub fn new(controller: SweepController<BUS>, config: PollConfig, sink: SINK) -> Result<Self, Error> {
        let averager = Averager::new(controller.repeat_count())?;
        Ok(MeasurementPoller { controller, averager, config, sink, idle_polls: 0, emitted: 0, elapsed_ms: 0 })
    }

    /// Gives the controller and sink back
    pub fn release(self) -> (SweepController<BUS>, SINK) {
        (self.controller, self.sink)
    }

    #[inline]
    pub fn controller(self: &Self) -> &SweepController<BUS> { &self.controller }

    #[inline]
    pub fn controller_mut(self: &mut Self) -> &mut SweepController<BUS> { &mut self.controller }

    #[inline]
    pub fn config(self: &Self) -> &PollConfig { &self.config }

    /// Polling delay issued since the sweep started
    #[inline]
    pub fn elapsed_ms(self: &Self) -> u32 { self.elapsed_ms }

    /// Points handed to the sink in the current sweep
    #[inline]
    pub fn emitted(self: &Self) -> u16 { self.emitted }

    /// One status read.
    ///
    /// With valid data the sample is read, averaged and the controller moves the
    /// device on (repeat or increment); a point is emitted once it has all its repeats.
    /// `None` when there was nothing to read.
    pub fn poll(self: &mut Self) -> Result<Option<SampleRepeat>, Error> {
        let state = self.controller.state();
        match state {
            SweepState::Sweeping(_) => (),
            _ => return Err(Error::InvalidTransition),
        }

        let status = self.controller.device_mut().status()?;

        if state == SweepState::Sweeping(SweepPhase::Finishing) {
            if self.controller.check_finished(status)? {
                self.idle_polls = 0;
            } else {
                self.idle_polls += 1;
            }
            return Ok(None);
        }

        if !status.valid_data() {
            self.idle_polls += 1;
            return Ok(None);
        }

        let sample = self.controller.device_mut().read_sample()?;
        self.averager.push(sample)?;
        self.idle_polls = 0;

        let frequency_hz = self.controller.frequency_hz();
        let step = match self.controller.on_sample(status) {
            Ok(step) => step,
            Err(e) => {
                // not accounted for, the next poll reads it again
                self.averager.pop();
                return Err(e);
            }
        };
        match step {
            Step::Repeat { .. } => (),
            Step::Advance { index } | Step::Last { index } => {
                if let Some(mut point) = self.averager.finish(index, frequency_hz) {
                    point.elapsed_ms = self.elapsed_ms;
                    self.emitted += 1;
                    self.sink.point(&point);
                }
            }
        }
        Ok(Some(sample))
    }

    /// Polls until the sweep completes, pausing `interval_ms` between reads.
    ///
    /// Gives up with [`Error::SweepTimeout`] after `max_idle_polls` reads in a row
    /// that brought neither a sample nor completion. The controller is left where it
    /// stopped, [`MeasurementPoller::abort`] returns it to standby.
    pub fn run<DELAY>(self: &mut Self, delay: &mut DELAY) -> Result<u16, Error>
    where DELAY: DelayMs<u16>,
    {
        match self.controller.state() {
            SweepState::Sweeping(_) | SweepState::Complete => (),
            _ => return Err(Error::InvalidTransition),
        }

        let budget = core::cmp::max(self.config.max_idle_polls, 1);
        self.idle_polls = 0;
        while !self.controller.is_complete() {
            delay.delay_ms(self.config.interval_ms);
            self.elapsed_ms = self.elapsed_ms.saturating_add(self.config.interval_ms as u32);
            self.poll()?;
            if self.idle_polls >= budget {
                warn!(
                    "sweep timeout at point {} after {} idle polls",
                    self.controller.index(), self.idle_polls
                );
                return Err(Error::SweepTimeout);
            }
        }
        Ok(self.emitted)
    }

    /// Full sweep from wherever the device is: standby, load program,
    /// initialize, let the excitation settle, start, then [`MeasurementPoller::run`].
    ///
    /// Returns the number of points handed to the sink.
    pub fn sweep<DELAY>(self: &mut Self, delay: &mut DELAY) -> Result<u16, Error>
    where DELAY: DelayMs<u16>,
    {
        match self.controller.state() {
            SweepState::Idle | SweepState::Standby => (),
            _ => self.controller.abort()?,
        }
        self.averager.clear();
        self.emitted = 0;

        self.controller.standby()?;
        self.controller.initialize()?;
        delay.delay_ms(self.config.startup_delay_ms);
        self.controller.start()?;
        self.elapsed_ms = 0;
        debug!(
            "sweep started, {} points x {} repeats",
            self.controller.program().point_count(), self.controller.repeat_count()
        );
        self.run(delay)
    }

    /// Drops any partial point and returns the device to standby.
    pub fn abort(self: &mut Self) -> Result<(), Error> {
        self.averager.clear();
        self.idle_polls = 0;
        self.controller.abort()
    }
}
