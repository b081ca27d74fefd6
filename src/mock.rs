//! Test doubles: a plain register file and a device simulator.

use embedded_hal::blocking::delay::DelayMs;
use std::vec::Vec;

use crate::bus::RegisterBus;
use crate::constants::*;


/// Register file, reads return whatever was last written or preset.
pub struct MockBus {
    pub regs: [u8; 256],
    pub writes: Vec<(u8, u8)>,
    pub fail: bool,
    /// Reads still work, every write fails
    pub fail_writes: bool,
}

impl MockBus {
    pub fn new() -> Self {
        MockBus { regs: [0; 256], writes: Vec::new(), fail: false, fail_writes: false }
    }

    /// Values written to `address`, oldest first
    pub fn writes_to(&self, address: u8) -> Vec<u8> {
        self.writes.iter().filter(|(a, _)| *a == address).map(|(_, v)| *v).collect()
    }

    pub fn last_write(&self, address: u8) -> Option<u8> {
        self.writes_to(address).last().copied()
    }
}

impl RegisterBus for MockBus {
    type Error = ();

    fn read_byte(&mut self, address: u8) -> Result<u8, ()> {
        if self.fail { Err(()) } else { Ok(self.regs[address as usize]) }
    }

    fn write_byte(&mut self, address: u8, value: u8) -> Result<(), ()> {
        if self.fail || self.fail_writes {
            return Err(());
        }
        self.writes.push((address, value));
        self.regs[address as usize] = value;
        Ok(())
    }
}


/// Behavioural model of the sweep engine.
///
/// A conversion becomes valid on the `latency`-th status read after the command
/// that started it. Data: real = 100 * (index + 1) + repeat, imag = -10.
pub struct SimulatedDevice {
    pub bus: MockBus,
    pub latency: u32,
    /// Conversions never finish
    pub never_valid: bool,
    /// Status reads between the last conversion and the sweep complete bit
    pub complete_delay: u32,
    /// Every read fails once this many reads went through
    pub fail_after_reads: Option<u32>,
    reads: u32,
    index: u16,
    repeat: u16,
    pending: Option<u32>,
    complete_countdown: Option<u32>,
    valid: bool,
    complete: bool,
}

impl SimulatedDevice {
    pub fn new(latency: u32) -> Self {
        SimulatedDevice {
            bus: MockBus::new(),
            latency,
            never_valid: false,
            complete_delay: 0,
            fail_after_reads: None,
            reads: 0,
            index: 0,
            repeat: 0,
            pending: None,
            complete_countdown: None,
            valid: false,
            complete: false,
        }
    }

    fn increments(&self) -> u16 {
        let r = &self.bus.regs;
        ((r[NUMBER_OF_INCREMENTS as usize] as u16 & 0x01) << 8) | r[NUMBER_OF_INCREMENTS as usize + 1] as u16
    }

    fn command(&mut self, mode: u8) {
        match mode {
            0x1 | 0xA | 0xB => {
                self.index = 0;
                self.repeat = 0;
                self.pending = None;
                self.complete_countdown = None;
                self.valid = false;
                self.complete = false;
            }
            0x2 => {
                self.index = 0;
                self.repeat = 0;
                self.convert();
            }
            0x3 => {
                self.index += 1;
                self.repeat = 0;
                self.convert();
            }
            0x4 => {
                self.repeat += 1;
                self.convert();
            }
            _ => (),
        }
    }

    fn convert(&mut self) {
        self.valid = false;
        self.pending = Some(self.latency);
    }

    fn finish_conversion(&mut self) {
        if self.never_valid {
            return;
        }
        self.valid = true;
        let real = (100 * (self.index as i16 + 1) + self.repeat as i16).to_be_bytes();
        let imag = (-10i16).to_be_bytes();
        let r = &mut self.bus.regs;
        r[REAL_DATA as usize] = real[0];
        r[REAL_DATA as usize + 1] = real[1];
        r[IMAGINARY_DATA as usize] = imag[0];
        r[IMAGINARY_DATA as usize + 1] = imag[1];

        if self.index >= self.increments() && !self.complete && self.complete_countdown.is_none() {
            if self.complete_delay == 0 {
                self.complete = true;
            } else {
                self.complete_countdown = Some(self.complete_delay);
            }
        }
    }

    fn status(&mut self) -> u8 {
        if let Some(n) = self.pending {
            if n <= 1 {
                self.pending = None;
                self.finish_conversion();
            } else {
                self.pending = Some(n - 1);
            }
        } else if let Some(n) = self.complete_countdown {
            if n == 0 {
                self.complete_countdown = None;
                self.complete = true;
            } else {
                self.complete_countdown = Some(n - 1);
            }
        }

        let mut s = 0;
        if self.valid { s |= STATUS_VALID_DATA; }
        if self.complete { s |= STATUS_SWEEP_COMPLETE; }
        s
    }
}

impl RegisterBus for SimulatedDevice {
    type Error = ();

    fn read_byte(&mut self, address: u8) -> Result<u8, ()> {
        if let Some(limit) = self.fail_after_reads {
            if self.reads >= limit {
                return Err(());
            }
        }
        self.reads += 1;

        if address == STATUS {
            Ok(self.status())
        } else {
            self.bus.read_byte(address)
        }
    }

    fn write_byte(&mut self, address: u8, value: u8) -> Result<(), ()> {
        self.bus.write_byte(address, value)?;
        if address == CONTROL_1 {
            self.command(value >> 4);
        }
        Ok(())
    }
}


/// Delay that returns immediately and records what was asked for
#[derive(Default)]
pub struct NoDelay {
    pub calls: Vec<u16>,
}

impl DelayMs<u16> for NoDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.calls.push(ms);
    }
}
