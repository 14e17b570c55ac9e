// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! In-memory stand-in for the kernel i2c layer
//!
//! `MockI2CBus` keeps one register map per slave address and records
//! every request made to it, so tests can check exactly which control
//! requests a driver issued.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use byteorder::{ByteOrder, LittleEndian};
use nix::errno::Errno;

use crate::core::{I2CFunctions, I2CKernel};
use crate::regmap::I2CRegisterMap;
use crate::smbus::{ReadWrite, SmbusData, SmbusSize, SmbusTransaction};

/// One request as seen by the mock kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelCall {
    Functions,
    SetSlaveAddress(u16),
    /// The transaction as issued, before the kernel filled anything in
    Smbus {
        address: Option<u16>,
        transaction: SmbusTransaction,
    },
    Read {
        address: Option<u16>,
        len: usize,
    },
    Write {
        address: Option<u16>,
        data: Vec<u8>,
    },
    Close,
}

pub type Journal = Rc<RefCell<Vec<KernelCall>>>;

pub struct MockI2CBus {
    location: PathBuf,
    functions: Result<I2CFunctions, Errno>,
    address: Option<u16>,
    devices: HashMap<u16, I2CRegisterMap>,
    block_responses: VecDeque<Vec<u8>>,
    failures: VecDeque<Errno>,
    write_limit: Option<usize>,
    close_error: Option<Errno>,
    journal: Journal,
}

impl Default for MockI2CBus {
    fn default() -> MockI2CBus {
        MockI2CBus::new()
    }
}

impl MockI2CBus {
    /// A bus whose adapter supports everything
    pub fn new() -> MockI2CBus {
        MockI2CBus::at("mock0")
    }

    pub fn at<P: AsRef<Path>>(location: P) -> MockI2CBus {
        MockI2CBus {
            location: location.as_ref().to_path_buf(),
            functions: Ok(I2CFunctions::all()),
            address: None,
            devices: HashMap::new(),
            block_responses: VecDeque::new(),
            failures: VecDeque::new(),
            write_limit: None,
            close_error: None,
            journal: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_functions(mut self, funcs: I2CFunctions) -> MockI2CBus {
        self.functions = Ok(funcs);
        self
    }

    pub fn with_failing_query(mut self, errno: Errno) -> MockI2CBus {
        self.functions = Err(errno);
        self
    }

    pub fn with_failing_close(mut self, errno: Errno) -> MockI2CBus {
        self.close_error = Some(errno);
        self
    }

    /// Change what the next functionality query reports
    pub fn set_functions(&mut self, funcs: I2CFunctions) {
        self.functions = Ok(funcs);
    }

    /// Fail the next request (other than the functionality query)
    pub fn fail_next(&mut self, errno: Errno) {
        self.failures.push_back(errno);
    }

    /// Answer the next block read with these raw bytes, count byte first
    pub fn queue_block_response(&mut self, block: &[u8]) {
        self.block_responses.push_back(block.to_vec());
    }

    /// Accept at most `len` bytes on the next plain write
    pub fn limit_next_write(&mut self, len: usize) {
        self.write_limit = Some(len);
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn device(&self, address: u16) -> Option<&I2CRegisterMap> {
        self.devices.get(&address)
    }

    /// Register map of a slave, created on first use
    pub fn device_mut(&mut self, address: u16) -> &mut I2CRegisterMap {
        self.devices.entry(address).or_insert_with(I2CRegisterMap::new)
    }

    /// Shared handle to the call log, still usable after the bus is closed
    pub fn journal(&self) -> Journal {
        Rc::clone(&self.journal)
    }

    pub fn calls(&self) -> Vec<KernelCall> {
        self.journal.borrow().clone()
    }

    pub fn count<F: Fn(&KernelCall) -> bool>(&self, pred: F) -> usize {
        self.journal.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn last_smbus(&self) -> Option<SmbusTransaction> {
        self.journal.borrow().iter().rev().find_map(|c| match *c {
            KernelCall::Smbus { transaction, .. } => Some(transaction),
            _ => None,
        })
    }

    pub fn last_smbus_address(&self) -> Option<u16> {
        self.journal.borrow().iter().rev().find_map(|c| match *c {
            KernelCall::Smbus { address, .. } => address,
            _ => None,
        })
    }

    fn record(&self, call: KernelCall) {
        self.journal.borrow_mut().push(call);
    }

    fn injected_failure(&mut self) -> Result<(), Errno> {
        match self.failures.pop_front() {
            Some(errno) => Err(errno),
            None => Ok(()),
        }
    }

    fn selected(&mut self) -> Result<&mut I2CRegisterMap, Errno> {
        let address = self.address.ok_or(Errno::ENXIO)?;
        Ok(self.device_mut(address))
    }
}

impl I2CKernel for MockI2CBus {
    fn open<P: AsRef<Path>>(location: P) -> io::Result<MockI2CBus> {
        Ok(MockI2CBus::at(location))
    }

    fn functions(&mut self) -> Result<I2CFunctions, Errno> {
        self.record(KernelCall::Functions);
        self.functions
    }

    fn set_slave_address(&mut self, address: u16) -> Result<(), Errno> {
        self.record(KernelCall::SetSlaveAddress(address));
        self.injected_failure()?;
        self.address = Some(address);
        Ok(())
    }

    fn smbus_access(&mut self, transaction: &mut SmbusTransaction) -> Result<(), Errno> {
        self.record(KernelCall::Smbus {
            address: self.address,
            transaction: *transaction,
        });
        self.injected_failure()?;

        let register = transaction.command;
        match (transaction.read_write, transaction.size) {
            (ReadWrite::Read, SmbusSize::I2CBlockData) => {
                if let Some(response) = self.block_responses.pop_front() {
                    let block = transaction.data.as_bytes_mut();
                    let len = response.len().min(block.len());
                    block[..len].copy_from_slice(&response[..len]);
                } else {
                    let len = transaction.data.count();
                    let regs = self.selected()?.read_regs(register, len);
                    transaction.data = SmbusData::from_block(&regs);
                }
            }
            (ReadWrite::Write, SmbusSize::I2CBlockData) => {
                let payload = transaction.data.payload().to_vec();
                self.selected()?.write_regs(register, &payload);
            }
            (ReadWrite::Write, SmbusSize::WordData) => {
                // SMBus puts the low byte on the wire first
                let mut wire = [0u8; 2];
                LittleEndian::write_u16(&mut wire, transaction.data.word());
                self.selected()?.write_regs(register, &wire);
            }
            _ => return Err(Errno::EOPNOTSUPP),
        }
        Ok(())
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize, Errno> {
        self.record(KernelCall::Read {
            address: self.address,
            len: data.len(),
        });
        self.injected_failure()?;
        self.selected()?.read(data);
        Ok(data.len())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Errno> {
        self.record(KernelCall::Write {
            address: self.address,
            data: data.to_vec(),
        });
        self.injected_failure()?;
        let len = match self.write_limit.take() {
            Some(limit) => limit.min(data.len()),
            None => data.len(),
        };
        self.selected()?.write(&data[..len]);
        Ok(len)
    }

    fn close(self) -> Result<(), Errno> {
        self.record(KernelCall::Close);
        match self.close_error {
            Some(errno) => Err(errno),
            None => Ok(()),
        }
    }
}
