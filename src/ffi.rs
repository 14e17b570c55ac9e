// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

#![allow(non_camel_case_types)]

use std::os::unix::prelude::*;

use nix::errno::Errno;

use crate::core::I2CFunctions;
use crate::smbus::{SmbusData, SmbusTransaction};

// from include/uapi/linux/i2c-dev.h
const I2C_SLAVE: u16 = 0x0703;
const I2C_FUNCS: u16 = 0x0705;
const I2C_SMBUS: u16 = 0x0720;

/// This is the structure as used in the I2C_SMBUS ioctl call
#[repr(C)]
pub struct i2c_smbus_ioctl_data {
    // __u8 read_write;
    read_write: u8,
    // __u8 command;
    command: u8,
    // __u32 size;
    size: u32,
    // union i2c_smbus_data __user *data;
    data: *mut SmbusData,
}

mod ioctl {
    pub use super::i2c_smbus_ioctl_data;
    use super::{I2C_FUNCS, I2C_SLAVE, I2C_SMBUS};

    ioctl_write_int_bad!(set_i2c_slave_address, I2C_SLAVE);
    ioctl_read_bad!(get_i2c_funcs, I2C_FUNCS, libc::c_ulong);
    ioctl_write_ptr_bad!(i2c_smbus, I2C_SMBUS, i2c_smbus_ioctl_data);
}

pub fn i2c_set_slave_address(fd: RawFd, slave_address: u16) -> Result<(), Errno> {
    unsafe {
        ioctl::set_i2c_slave_address(fd, i32::from(slave_address))?;
    }
    Ok(())
}

pub fn i2c_get_functions(fd: RawFd) -> Result<I2CFunctions, Errno> {
    let mut funcs: libc::c_ulong = 0;
    unsafe {
        ioctl::get_i2c_funcs(fd, &mut funcs)?;
    }
    // only the low 32 bits carry functionality flags
    Ok(I2CFunctions::from_bits_retain(funcs as u32))
}

/// Issue one I2C_SMBUS request; the kernel may write back into `transaction.data`
pub fn i2c_smbus_access(fd: RawFd, transaction: &mut SmbusTransaction) -> Result<(), Errno> {
    let args = i2c_smbus_ioctl_data {
        read_write: transaction.read_write as u8,
        command: transaction.command,
        size: transaction.size as u32,
        data: &mut transaction.data,
    };

    // `args.data` borrows `transaction` for the duration of the call
    unsafe { ioctl::i2c_smbus(fd, &args).map(drop) }
}
