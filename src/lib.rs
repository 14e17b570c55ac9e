// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! # riot-smbus
//!
//! The `riot-smbus` crate provides register-level access to SMBus
//! devices hanging off a Linux i2c adapter.  It wraps the kernel
//! interface for interacting with i2c in userspace:
//! https://www.kernel.org/doc/Documentation/i2c/dev-interface
//!
//! A [`BusHandle`] owns one open bus location.  It negotiates the
//! adapter functionality once, binds a 7-bit slave address and then
//! executes byte-stream, block and word transactions, falling back to
//! plain reads and writes when the adapter cannot do block transfers.
//!
//! ```rust,no_run
//! use riot_smbus::{BusHandle, LinuxI2CBus, RegisterDevice};
//!
//! # fn main() -> riot_smbus::BusResult<()> {
//! let mut dev = BusHandle::<LinuxI2CBus>::open_device("/dev/i2c-1", 0x20)?;
//! let input = dev.read_register(0x09, 1)?;
//! dev.write_word(0x0A, u16::from(input[0] | 0x40))?;
//! dev.close()
//! # }
//! ```

#[macro_use]
extern crate nix;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;

pub mod core;
mod device;
mod ffi;
pub mod linux;
pub mod mock;
pub mod regmap;
pub mod sensors;
pub mod smbus;
mod transaction;

pub use crate::core::{BusError, BusResult, I2CFunctions, I2CKernel, Operation, RegisterDevice};
pub use crate::device::{BusHandle, HandleState};
pub use crate::linux::LinuxI2CBus;
