//! Repeat averaging and impedance calculation

use heapless::Vec;

use crate::{ constants::*, errors::* };


/// Raw DFT result of one conversion
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleRepeat {
    pub real: i16,
    pub imag: i16,
}


/// Averaged result for one frequency point
#[derive(Debug,Copy,Clone,PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AveragedPoint {
    /// Position in the sweep, 0 is the start frequency
    pub index: u16,
    pub frequency_hz: f32,
    pub real_mean: f32,
    pub imag_mean: f32,
    /// |Z| in raw DFT units, uncalibrated
    pub magnitude: f32,
    /// Radians, -π..π
    pub phase: f32,
    pub repeat_count: u16,
    /// Milliseconds of polling delay since the sweep was started, 0 when
    /// the point wasn't produced by [`crate::MeasurementPoller`]
    pub elapsed_ms: u32,
}

impl AveragedPoint {
    /// Magnitude and phase from mean real / imaginary parts.
    ///
    /// Phase uses the two-argument arctangent, which keeps the quadrant
    /// and is defined for a zero real part.
    pub fn from_means(index: u16, frequency_hz: f32, real_mean: f32, imag_mean: f32, repeat_count: u16) -> Self {
        AveragedPoint {
            index,
            frequency_hz,
            real_mean,
            imag_mean,
            magnitude: libm::sqrtf(real_mean * real_mean + imag_mean * imag_mean),
            phase: libm::atan2f(imag_mean, real_mean),
            repeat_count,
            elapsed_ms: 0,
        }
    }

    #[inline]
    pub fn phase_degrees(self: &Self) -> f32 {
        self.phase.to_degrees()
    }
}


/// Collects the repeats of a single frequency point.
///
/// The buffer is sized per configuration up to [`MAX_REPEATS`] and emptied
/// every time a point is produced, nothing carries over between points.
#[derive(Debug,Clone)]
pub struct Averager {
    repeat_count: u16,
    samples: Vec<SampleRepeat, MAX_REPEATS>,
}

impl Averager {
    pub fn new(repeat_count: u16) -> Result<Self, Error> {
        if repeat_count == 0 || repeat_count as usize > MAX_REPEATS {
            return Err(Error::InvalidRepeatCount);
        }
        Ok(Averager { repeat_count, samples: Vec::new() })
    }

    #[inline]
    pub fn repeat_count(self: &Self) -> u16 {
        self.repeat_count
    }

    /// Samples held for the current point
    #[inline]
    pub fn len(self: &Self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(self: &Self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn is_full(self: &Self) -> bool {
        self.samples.len() >= self.repeat_count as usize
    }

    pub fn push(self: &mut Self, sample: SampleRepeat) -> Result<(), Error> {
        if self.is_full() {
            return Err(Error::RepeatBufferFull);
        }
        self.samples.push(sample).map_err(|_| Error::RepeatBufferFull)
    }

    /// Takes back the most recent sample
    pub fn pop(self: &mut Self) -> Option<SampleRepeat> {
        self.samples.pop()
    }

    /// Averages whatever has been collected and empties the buffer.
    /// `None` if nothing was collected.
    pub fn finish(self: &mut Self, index: u16, frequency_hz: f32) -> Option<AveragedPoint> {
        if self.samples.is_empty() {
            return None;
        }

        // integer sums, no accumulated rounding
        let (re, im) = self.samples.iter()
            .fold((0i32, 0i32), |(re, im), s| (re + s.real as i32, im + s.imag as i32));
        let n = self.samples.len() as u16;
        self.samples.clear();

        Some(AveragedPoint::from_means(index, frequency_hz, re as f32 / n as f32, im as f32 / n as f32, n))
    }

    /// Drops a partially collected point
    pub fn clear(self: &mut Self) {
        self.samples.clear();
    }
}
