// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

/// 256 byte-wide registers behind one slave address
///
/// Plain reads continue from the register selected by the last
/// access, the way most register-file devices behave.  Addresses
/// wrap at 0xFF.
pub struct I2CRegisterMap {
    registers: [u8; 0x100],
    offset: u8,
}

impl Default for I2CRegisterMap {
    fn default() -> I2CRegisterMap {
        I2CRegisterMap::new()
    }
}

impl I2CRegisterMap {
    pub fn new() -> I2CRegisterMap {
        I2CRegisterMap {
            registers: [0x00; 0x100],
            offset: 0,
        }
    }

    /// Store `data` starting at `offset` and select the following register
    pub fn write_regs(&mut self, offset: u8, data: &[u8]) {
        trace!("WRITE | 0x{:X} : {:?}", offset, data);
        let mut reg = offset;
        for byte in data {
            self.registers[reg as usize] = *byte;
            reg = reg.wrapping_add(1);
        }
        self.offset = reg;
    }

    /// Inspect `len` registers starting at `offset` without moving the selection
    pub fn read_regs(&self, offset: u8, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.registers[offset.wrapping_add(i as u8) as usize])
            .collect()
    }

    /// Fill `data` from the selected register onwards
    pub fn read(&mut self, data: &mut [u8]) {
        let start = self.offset;
        for byte in data.iter_mut() {
            *byte = self.registers[self.offset as usize];
            self.offset = self.offset.wrapping_add(1);
        }
        trace!("READ  | 0x{:X} : {:?}", start, data);
    }

    /// Plain write: the first byte selects the register, the rest is stored
    pub fn write(&mut self, data: &[u8]) {
        if let Some((&offset, rest)) = data.split_first() {
            self.write_regs(offset, rest);
        }
    }

    /// Select a register for the next plain read
    pub fn select(&mut self, offset: u8) {
        self.offset = offset;
    }
}
