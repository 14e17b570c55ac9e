// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Drivers for the devices found on a RIoT gateway
//!
//! The drivers only format register accesses; they return raw
//! register values and leave unit conversion to the caller.

use crate::core::BusError;

pub mod riot;
pub mod tcs34725_color;
pub mod tmp007_thermopile;
pub mod tsl2591_light;

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The command name is not one the driver knows
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
}

pub type SensorResult<T> = Result<T, SensorError>;
