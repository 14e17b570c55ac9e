// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{BigEndian, ByteOrder};

use crate::core::RegisterDevice;
use crate::sensors::SensorResult;

pub const TMP007_ADDRESS: u16 = 0x40;

const REGISTER_LOCAL_TEMPERATURE: u8 = 0x01;
const REGISTER_OBJECT_TEMPERATURE: u8 = 0x03;

/// Raw die and object temperature registers
///
/// The device sends the most significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermopileReading {
    pub local: u16,
    pub object: u16,
}

/// Provides access to the TMP007 infrared thermopile
///
/// http://www.ti.com/lit/ds/symlink/tmp007.pdf
pub struct TMP007Thermopile<T: RegisterDevice> {
    i2cdev: T,
}

impl<T> TMP007Thermopile<T>
where
    T: RegisterDevice,
{
    pub fn new(mut i2cdev: T) -> SensorResult<TMP007Thermopile<T>> {
        i2cdev.bind(TMP007_ADDRESS)?;
        Ok(TMP007Thermopile { i2cdev })
    }

    pub fn read(&mut self) -> SensorResult<ThermopileReading> {
        let local = self.i2cdev.read_register_exact(REGISTER_LOCAL_TEMPERATURE, 2)?;
        let object = self.i2cdev.read_register_exact(REGISTER_OBJECT_TEMPERATURE, 2)?;
        Ok(ThermopileReading {
            local: BigEndian::read_u16(&local),
            object: BigEndian::read_u16(&object),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BusError;
    use crate::device::BusHandle;
    use crate::mock::MockI2CBus;
    use crate::sensors::SensorError;

    #[test]
    fn test_read_both_registers() {
        let mut kernel = MockI2CBus::new();
        kernel
            .device_mut(TMP007_ADDRESS)
            .write_regs(REGISTER_LOCAL_TEMPERATURE, &[0x0C, 0x80]);
        kernel
            .device_mut(TMP007_ADDRESS)
            .write_regs(REGISTER_OBJECT_TEMPERATURE, &[0x0D, 0x00]);
        let mut sensor = TMP007Thermopile::new(BusHandle::from_kernel(kernel, "mock0")).unwrap();
        let reading = sensor.read().unwrap();
        assert_eq!(reading.local, 0x0C80);
        assert_eq!(reading.object, 0x0D00);
    }

    #[test]
    fn test_short_register_read() {
        let mut kernel = MockI2CBus::new();
        kernel.queue_block_response(&[0x01, 0x0C]);
        let mut sensor = TMP007Thermopile::new(BusHandle::from_kernel(kernel, "mock0")).unwrap();
        match sensor.read() {
            Err(SensorError::Bus(BusError::ShortRead {
                requested: 2,
                returned: 1,
            })) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
