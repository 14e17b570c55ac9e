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

pub const TSL2591_ADDRESS: u16 = 0x29;

const COMMAND: u8 = 0x80;
const NORMAL_OP: u8 = 0x20;
const REGISTER_ENABLE: u8 = COMMAND | NORMAL_OP | 0x00;
const REGISTER_CONFIG: u8 = COMMAND | NORMAL_OP | 0x01;
const REGISTER_C0_DATA: u8 = COMMAND | NORMAL_OP | 0x14;
const REGISTER_C1_DATA: u8 = COMMAND | NORMAL_OP | 0x16;

const ENABLE_POWER_ON_AEN: u16 = 0x03;
const CONFIG_MEDIUM_GAIN_200MS: u16 = 0x11; // medium gain, 200ms integration

/// Raw channel counts, low byte first on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightReading {
    /// channel 0: visible and infrared
    pub full: u16,
    /// channel 1: infrared only
    pub infrared: u16,
}

/// Provides access to the TSL2591 ambient light sensor
pub struct TSL2591Light<T: RegisterDevice> {
    i2cdev: T,
}

impl<T> TSL2591Light<T>
where
    T: RegisterDevice,
{
    /// Power the sensor on and pick medium gain with 200ms integration
    pub fn new(mut i2cdev: T) -> SensorResult<TSL2591Light<T>> {
        i2cdev.bind(TSL2591_ADDRESS)?;
        i2cdev.write_word(REGISTER_ENABLE, ENABLE_POWER_ON_AEN)?;
        i2cdev.write_word(REGISTER_CONFIG, CONFIG_MEDIUM_GAIN_200MS)?;
        Ok(TSL2591Light { i2cdev })
    }

    pub fn read(&mut self) -> SensorResult<LightReading> {
        let full = self.i2cdev.read_register_exact(REGISTER_C0_DATA, 2)?;
        let infrared = self.i2cdev.read_register_exact(REGISTER_C1_DATA, 2)?;
        Ok(LightReading {
            full: LittleEndian::read_u16(&full),
            infrared: LittleEndian::read_u16(&infrared),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::BusHandle;
    use crate::mock::MockI2CBus;

    #[test]
    fn test_init_and_read() {
        let mut kernel = MockI2CBus::new();
        kernel
            .device_mut(TSL2591_ADDRESS)
            .write_regs(REGISTER_C0_DATA, &[0x34, 0x12, 0x78, 0x06]);
        let mut sensor = TSL2591Light::new(BusHandle::from_kernel(kernel, "mock0")).unwrap();
        {
            let regs = sensor.i2cdev.kernel().device(TSL2591_ADDRESS).unwrap();
            assert_eq!(regs.read_regs(REGISTER_ENABLE, 1), vec![0x03]);
            assert_eq!(regs.read_regs(REGISTER_CONFIG, 1), vec![0x11]);
        }
        let reading = sensor.read().unwrap();
        assert_eq!(reading.full, 0x1234);
        assert_eq!(reading.infrared, 0x0678);
    }
}
