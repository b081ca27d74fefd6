///! Register bus

use embedded_hal::blocking::i2c::{ Read, Write };

use crate::constants::*;


/// Byte-addressed register access, all the driver needs from the transport.
pub trait RegisterBus {
    type Error;

    /// Reads a single register
    fn read_byte(self: &mut Self, address: u8) -> Result<u8, Self::Error>;

    /// Writes a single register
    fn write_byte(self: &mut Self, address: u8, value: u8) -> Result<(), Self::Error>;
}


/// [`RegisterBus`] over a blocking I2C peripheral.
///
/// Reads set the address pointer first, then fetch one byte.
pub struct I2cBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cBus<I2C> {
    /// Bus for a device at the default slave address
    pub fn new(i2c: I2C) -> Self {
        I2cBus { i2c, address: SLAVE_ADDRESS }
    }

    /// Bus for a device at a non-default slave address
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        I2cBus { i2c, address }
    }

    /// Gives the I2C peripheral back
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterBus for I2cBus<I2C>
where I2C: Write<Error = E> + Read<Error = E>,
{
    type Error = E;

    fn read_byte(self: &mut Self, address: u8) -> Result<u8, E> {
        self.i2c.write(self.address, &[ADDRESS_POINTER, address])?;
        let mut buf = [0u8; 1];
        self.i2c.read(self.address, &mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(self: &mut Self, address: u8, value: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[address, value])
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[derive(Default)]
    struct RecordingI2c {
        writes: Vec<(u8, Vec<u8>)>,
        reads: Vec<u8>,
        next: u8,
    }

    impl Write for RecordingI2c {
        type Error = ();
        fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), ()> {
            self.writes.push((addr, bytes.to_vec()));
            Ok(())
        }
    }

    impl Read for RecordingI2c {
        type Error = ();
        fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), ()> {
            self.reads.push(addr);
            buffer[0] = self.next;
            Ok(())
        }
    }

    #[test]
    fn read_sets_pointer() {
        let mut bus = I2cBus::new(RecordingI2c { next: 0x42, ..Default::default() });
        assert_eq!(bus.read_byte(STATUS), Ok(0x42));

        let i2c = bus.release();
        assert_eq!(i2c.writes, vec![(0x0D, vec![0xB0, 0x8F])]);
        assert_eq!(i2c.reads, vec![0x0D]);
    }

    #[test]
    fn write_is_address_value() {
        let mut bus = I2cBus::with_address(RecordingI2c::default(), 0x0E);
        bus.write_byte(CONTROL_1, 0xB0).unwrap();
        assert_eq!(bus.release().writes, vec![(0x0E, vec![0x80, 0xB0])]);
    }
}
