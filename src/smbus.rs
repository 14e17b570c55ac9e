// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! SMBus transaction model
//!
//! One `SmbusTransaction` describes exactly one I2C_SMBUS control
//! request: direction, command byte, transaction shape and the data
//! block the kernel reads from or fills in.

use byteorder::{ByteOrder, NativeEndian};

/// As specified in SMBus standard
pub const I2C_SMBUS_BLOCK_MAX: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadWrite {
    Read = 1,
    Write = 0,
}

/// Transaction shape, the `size` argument of the I2C_SMBUS ioctl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SmbusSize {
    Quick = 0,
    Byte = 1,
    ByteData = 2,
    WordData = 3,
    ProcCall = 4,
    BlockData = 5,
    I2CBlockBroken = 6,
    BlockProcCall = 7, // SMBus 2.0
    I2CBlockData = 8,
}

// In C, this is a union:
//
// union i2c_smbus_data {
//     __u8 byte;
//     __u16 word;
//     __u8 block[I2C_SMBUS_BLOCK_MAX + 2]; /* block[0] is used for length */
//                            /* and one more for user-space compatibility */
// };
//
// The block is the largest member so it stands in for all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SmbusData {
    block: [u8; I2C_SMBUS_BLOCK_MAX + 2],
}

impl SmbusData {
    pub fn empty() -> SmbusData {
        SmbusData {
            block: [0; I2C_SMBUS_BLOCK_MAX + 2],
        }
    }

    /// Data carrying a native-order word, as the kernel expects it
    pub fn from_word(value: u16) -> SmbusData {
        let mut data = SmbusData::empty();
        NativeEndian::write_u16(&mut data.block[..2], value);
        data
    }

    /// Length-prefixed block; `values` must not exceed `I2C_SMBUS_BLOCK_MAX`
    pub fn from_block(values: &[u8]) -> SmbusData {
        let mut data = SmbusData::empty();
        let len = values.len().min(I2C_SMBUS_BLOCK_MAX);
        data.block[0] = len as u8;
        data.block[1..=len].copy_from_slice(&values[..len]);
        data
    }

    /// Request header for a block read of `len` bytes
    pub fn block_request(len: usize) -> SmbusData {
        let mut data = SmbusData::empty();
        data.block[0] = len.min(I2C_SMBUS_BLOCK_MAX) as u8;
        data
    }

    pub fn word(&self) -> u16 {
        NativeEndian::read_u16(&self.block[..2])
    }

    /// The count byte of a block
    pub fn count(&self) -> usize {
        self.block[0] as usize
    }

    /// Block payload after the count byte, clamped to what the buffer holds
    pub fn payload(&self) -> &[u8] {
        let count = self.count().min(I2C_SMBUS_BLOCK_MAX);
        &self.block[1..=count]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.block
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.block
    }
}

/// A single I2C_SMBUS control request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmbusTransaction {
    pub read_write: ReadWrite,
    /// Register (or other command byte) sent first
    pub command: u8,
    pub size: SmbusSize,
    pub data: SmbusData,
}

impl SmbusTransaction {
    /// I2C block read of up to `len` bytes from `register`
    pub fn block_read(register: u8, len: usize) -> SmbusTransaction {
        SmbusTransaction {
            read_write: ReadWrite::Read,
            command: register,
            size: SmbusSize::I2CBlockData,
            data: SmbusData::block_request(len),
        }
    }

    /// I2C block write of `values` to `register`
    pub fn block_write(register: u8, values: &[u8]) -> SmbusTransaction {
        SmbusTransaction {
            read_write: ReadWrite::Write,
            command: register,
            size: SmbusSize::I2CBlockData,
            data: SmbusData::from_block(values),
        }
    }

    pub fn write_word(register: u8, value: u16) -> SmbusTransaction {
        SmbusTransaction {
            read_write: ReadWrite::Write,
            command: register,
            size: SmbusSize::WordData,
            data: SmbusData::from_word(value),
        }
    }
}
