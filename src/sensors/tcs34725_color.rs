// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{ByteOrder, LittleEndian};

use crate::core::RegisterDevice;
use crate::sensors::SensorResult;

pub const TCS34725_ADDRESS: u16 = 0x29;

const COMMAND: u8 = 0x80;
const TYPE_AUTO: u8 = 0x20;
const REGISTER_ENABLE: u8 = COMMAND | TYPE_AUTO | 0x00;
const REGISTER_ATIME: u8 = COMMAND | TYPE_AUTO | 0x01;
const REGISTER_CONTROL: u8 = COMMAND | TYPE_AUTO | 0x0F;
const REGISTER_RDATA: u8 = COMMAND | TYPE_AUTO | 0x16;
const REGISTER_GDATA: u8 = COMMAND | TYPE_AUTO | 0x18;
const REGISTER_BDATA: u8 = COMMAND | TYPE_AUTO | 0x1A;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorReading {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

/// Provides access to the TCS34725 RGB colour sensor
pub struct TCS34725Color<T: RegisterDevice> {
    i2cdev: T,
}

impl<T> TCS34725Color<T>
where
    T: RegisterDevice,
{
    pub fn new(mut i2cdev: T) -> SensorResult<TCS34725Color<T>> {
        i2cdev.bind(TCS34725_ADDRESS)?;
        // power on with the RGBC engine running
        i2cdev.write_word(REGISTER_ENABLE, 0x03)?;
        // 700ms integration
        i2cdev.write_word(REGISTER_ATIME, 0x00)?;
        // 1x gain
        i2cdev.write_word(REGISTER_CONTROL, 0x00)?;
        Ok(TCS34725Color { i2cdev })
    }

    pub fn read(&mut self) -> SensorResult<ColorReading> {
        Ok(ColorReading {
            red: self.read_channel(REGISTER_RDATA)?,
            green: self.read_channel(REGISTER_GDATA)?,
            blue: self.read_channel(REGISTER_BDATA)?,
        })
    }

    fn read_channel(&mut self, register: u8) -> SensorResult<u16> {
        let data = self.i2cdev.read_register_exact(register, 2)?;
        Ok(LittleEndian::read_u16(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::BusHandle;
    use crate::mock::{KernelCall, MockI2CBus};
    use crate::smbus::SmbusSize;

    #[test]
    fn test_each_channel_has_its_own_register() {
        let mut kernel = MockI2CBus::new();
        kernel
            .device_mut(TCS34725_ADDRESS)
            .write_regs(REGISTER_RDATA, &[0x01, 0x00, 0x02, 0x00, 0x03, 0x00]);
        let mut sensor = TCS34725Color::new(BusHandle::from_kernel(kernel, "mock0")).unwrap();
        let reading = sensor.read().unwrap();
        assert_eq!(
            reading,
            ColorReading {
                red: 1,
                green: 2,
                blue: 3,
            }
        );
        let reads: Vec<u8> = sensor
            .i2cdev
            .kernel()
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                KernelCall::Smbus { transaction, .. } if transaction.size == SmbusSize::I2CBlockData => {
                    Some(transaction.command)
                }
                _ => None,
            })
            .collect();
        assert_eq!(reads, vec![REGISTER_RDATA, REGISTER_GDATA, REGISTER_BDATA]);
    }
}
