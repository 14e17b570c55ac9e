// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::prelude::*;
use std::path::Path;

use nix::errno::Errno;
use nix::unistd;

use crate::core::{I2CFunctions, I2CKernel};
use crate::ffi;
use crate::smbus::SmbusTransaction;

/// Struct providing access to a Linux i2c bus
///
/// The kernel exposes one device (e.g. `/dev/i2c-1`) per
/// I2C bus that the system has access to (and which is
/// exposed to userspace).  The descriptor is released when
/// the value is dropped or explicitly closed.
pub struct LinuxI2CBus {
    devfile: File,
}

impl AsRawFd for LinuxI2CBus {
    fn as_raw_fd(&self) -> RawFd {
        self.devfile.as_raw_fd()
    }
}

impl I2CKernel for LinuxI2CBus {
    fn open<P: AsRef<Path>>(location: P) -> io::Result<LinuxI2CBus> {
        let devfile = OpenOptions::new().read(true).write(true).open(location)?;
        Ok(LinuxI2CBus { devfile })
    }

    fn functions(&mut self) -> Result<I2CFunctions, Errno> {
        ffi::i2c_get_functions(self.as_raw_fd())
    }

    fn set_slave_address(&mut self, address: u16) -> Result<(), Errno> {
        ffi::i2c_set_slave_address(self.as_raw_fd(), address)
    }

    fn smbus_access(&mut self, transaction: &mut SmbusTransaction) -> Result<(), Errno> {
        ffi::i2c_smbus_access(self.as_raw_fd(), transaction)
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize, Errno> {
        unistd::read(self.as_raw_fd(), data)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Errno> {
        unistd::write(self.as_raw_fd(), data)
    }

    fn close(self) -> Result<(), Errno> {
        // take the descriptor out of the File so it is closed exactly once
        unistd::close(self.devfile.into_raw_fd())
    }
}
