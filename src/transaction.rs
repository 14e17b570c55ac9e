// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Byte-stream, block and word transactions on a bound handle
//!
//! Each operation is a single control request to the kernel.  Nothing
//! is retried here; the caller decides what to do with a failure.

use crate::core::{BusError, BusResult, I2CFunctions, I2CKernel, Operation};
use crate::device::{BusHandle, Negotiation};
use crate::smbus::{SmbusTransaction, I2C_SMBUS_BLOCK_MAX};

impl<K: I2CKernel> BusHandle<K> {
    /// Read from the device without naming a register
    ///
    /// Adapters without SMBus block read get a plain read of
    /// `data.len()` bytes.  Otherwise an I2C block read with command
    /// byte 0 is issued.  Returns the number of bytes the device
    /// reported, which may differ from `data.len()`.
    pub fn raw_read(&mut self, data: &mut [u8]) -> BusResult<usize> {
        let address = self.bound_address()?;
        if !self.raw_functions().can_block_read() {
            debug!("0x{:02x}: read {} bytes", address, data.len());
            return self.kernel.read(data).map_err(|errno| BusError::IoTransactionFailed {
                op: Operation::Read,
                register: None,
                errno,
            });
        }
        self.block_read(0x00, data)
    }

    /// Read a block starting at `register`
    ///
    /// Always an I2C block read, whatever the adapter reported; an
    /// adapter that cannot do it fails the request in the kernel.  At
    /// most `data.len()` bytes are copied.  Returns the count reported
    /// by the device, which is authoritative over `data.len()`.
    pub fn read_register_into(&mut self, register: u8, data: &mut [u8]) -> BusResult<usize> {
        self.bound_address()?;
        self.block_functions()?;
        self.block_read(register, data)
    }

    /// Write raw bytes to the device
    ///
    /// With SMBus block write support `data[0]` is sent as the command
    /// byte and the rest as a length-prefixed block.  Without it the
    /// whole slice goes out as one plain write.
    pub fn raw_write(&mut self, data: &[u8]) -> BusResult<()> {
        let address = self.bound_address()?;
        if !self.raw_functions().can_block_write() {
            debug!("0x{:02x}: write {:02x?}", address, data);
            let written = self.kernel.write(data).map_err(|errno| BusError::IoTransactionFailed {
                op: Operation::Write,
                register: data.first().cloned(),
                errno,
            })?;
            if written < data.len() {
                return Err(BusError::ShortWrite {
                    requested: data.len(),
                    written,
                });
            }
            return Ok(());
        }

        let (&register, payload) = data.split_first().ok_or(BusError::EmptyWrite)?;
        if payload.len() > I2C_SMBUS_BLOCK_MAX {
            return Err(BusError::BlockTooLarge { len: payload.len() });
        }
        debug!("0x{:02x}: block write 0x{:02x} <- {:02x?}", address, register, payload);
        let mut transaction = SmbusTransaction::block_write(register, payload);
        self.kernel
            .smbus_access(&mut transaction)
            .map_err(|errno| BusError::IoTransactionFailed {
                op: Operation::BlockWrite,
                register: Some(register),
                errno,
            })
    }

    /// Write a 16 bit value to `register` with an SMBus word transaction
    ///
    /// The value is handed to the kernel as is; byte order on the wire
    /// is the device's business.
    pub fn write_word(&mut self, register: u8, value: u16) -> BusResult<()> {
        let address = self.bound_address()?;
        debug!("0x{:02x}: write word 0x{:02x} <- 0x{:04x}", address, register, value);
        let mut transaction = SmbusTransaction::write_word(register, value);
        self.kernel
            .smbus_access(&mut transaction)
            .map_err(|errno| BusError::IoTransactionFailed {
                op: Operation::WriteWord,
                register: Some(register),
                errno,
            })
    }

    fn block_read(&mut self, register: u8, data: &mut [u8]) -> BusResult<usize> {
        if data.len() > I2C_SMBUS_BLOCK_MAX {
            return Err(BusError::BlockTooLarge { len: data.len() });
        }
        let mut transaction = SmbusTransaction::block_read(register, data.len());
        self.kernel
            .smbus_access(&mut transaction)
            .map_err(|errno| BusError::IoTransactionFailed {
                op: Operation::BlockRead,
                register: Some(register),
                errno,
            })?;

        let count = transaction.data.count();
        let payload = transaction.data.payload();
        let copied = payload.len().min(data.len());
        data[..copied].copy_from_slice(&payload[..copied]);
        debug!("block read 0x{:02x} -> {:02x?} (count {})", register, &data[..copied], count);
        Ok(count)
    }

    // Unknown functionality means plain reads and writes only.
    fn raw_functions(&self) -> I2CFunctions {
        match self.negotiation {
            Negotiation::Negotiated(funcs) => funcs,
            Negotiation::Failed(_) => I2CFunctions::empty(),
        }
    }

    fn block_functions(&self) -> BusResult<I2CFunctions> {
        match self.negotiation {
            Negotiation::Negotiated(funcs) => Ok(funcs),
            Negotiation::Failed(errno) => Err(BusError::AdapterQueryFailed(errno)),
        }
    }
}
