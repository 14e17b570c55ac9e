// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::{Path, PathBuf};

use nix::errno::Errno;

use crate::core::{BusError, BusResult, I2CFunctions, I2CKernel, Operation, RegisterDevice};

/// Highest valid 7-bit slave address
const MAX_SLAVE_ADDRESS: u16 = 0x7F;

/// Outcome of the last I2C_FUNCS query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Negotiation {
    Negotiated(I2CFunctions),
    Failed(Errno),
}

/// Where a handle is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// The bus is open but the adapter functionality is unknown
    Opened,
    /// The adapter functionality is known, no slave is bound yet
    Negotiated,
    /// A slave address is bound; transactions may be issued
    Addressed,
}

/// An open bus location talking to one slave at a time
///
/// The handle owns its kernel descriptor exclusively.  Dropping the
/// handle releases the descriptor; `close` does the same but reports
/// a failed release.  Concurrent users must serialize access
/// themselves, e.g. with a `Mutex<BusHandle<_>>`.
pub struct BusHandle<K: I2CKernel> {
    pub(crate) kernel: K,
    location: PathBuf,
    pub(crate) negotiation: Negotiation,
    address: Option<u16>,
}

impl<K: I2CKernel> BusHandle<K> {
    /// Open the bus at `location` and negotiate adapter functionality
    ///
    /// A failed functionality query does not fail the open; the handle
    /// then only uses plain reads and writes for unaddressed I/O.
    pub fn open<P: AsRef<Path>>(location: P) -> BusResult<BusHandle<K>> {
        let location = location.as_ref();
        let kernel = K::open(location).map_err(|source| BusError::OpenFailed {
            location: location.to_path_buf(),
            source,
        })?;
        Ok(BusHandle::from_kernel(kernel, location))
    }

    /// Open the bus at `location` and bind `address`
    pub fn open_device<P: AsRef<Path>>(location: P, address: u16) -> BusResult<BusHandle<K>> {
        let mut handle = BusHandle::open(location)?;
        handle.bind(address)?;
        Ok(handle)
    }

    /// Wrap an already opened kernel bus
    pub fn from_kernel<P: AsRef<Path>>(mut kernel: K, location: P) -> BusHandle<K> {
        let location = location.as_ref().to_path_buf();
        let negotiation = query_functions(&mut kernel, &location);
        info!("opened i2c bus {}", location.display());
        BusHandle {
            kernel,
            location,
            negotiation,
            address: None,
        }
    }

    /// Query the adapter functionality again, replacing the stored mask
    pub fn negotiate(&mut self) -> BusResult<I2CFunctions> {
        self.negotiation = query_functions(&mut self.kernel, &self.location);
        match self.negotiation {
            Negotiation::Negotiated(funcs) => Ok(funcs),
            Negotiation::Failed(errno) => Err(BusError::AdapterQueryFailed(errno)),
        }
    }

    /// Adapter functionality, if the last query succeeded
    pub fn functions(&self) -> Option<I2CFunctions> {
        match self.negotiation {
            Negotiation::Negotiated(funcs) => Some(funcs),
            Negotiation::Failed(_) => None,
        }
    }

    /// Set the slave address for this handle
    ///
    /// Only 7-bit addresses are accepted.  Rebinding replaces the
    /// address for every following transaction.  If the kernel rejects
    /// the request the previous binding stays in place.
    pub fn bind(&mut self, address: u16) -> BusResult<()> {
        if address > MAX_SLAVE_ADDRESS {
            return Err(BusError::InvalidAddress(address));
        }
        self.kernel
            .set_slave_address(address)
            .map_err(|errno| BusError::IoTransactionFailed {
                op: Operation::SetAddress,
                register: None,
                errno,
            })?;
        debug!("{}: bound slave 0x{:02x}", self.location.display(), address);
        self.address = Some(address);
        Ok(())
    }

    pub fn address(&self) -> Option<u16> {
        self.address
    }

    pub fn state(&self) -> HandleState {
        match (self.address, self.negotiation) {
            (Some(_), _) => HandleState::Addressed,
            (None, Negotiation::Negotiated(_)) => HandleState::Negotiated,
            (None, Negotiation::Failed(_)) => HandleState::Opened,
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut K {
        &mut self.kernel
    }

    /// Release the bus descriptor, reporting a failed release
    pub fn close(self) -> BusResult<()> {
        let location = self.location;
        self.kernel.close().map_err(BusError::CloseFailed)?;
        info!("closed i2c bus {}", location.display());
        Ok(())
    }

    pub(crate) fn bound_address(&self) -> BusResult<u16> {
        self.address.ok_or(BusError::UnboundAddress)
    }
}

fn query_functions<K: I2CKernel>(kernel: &mut K, location: &Path) -> Negotiation {
    match kernel.functions() {
        Ok(funcs) => {
            debug!("{}: functionality 0x{:08x}", location.display(), funcs.bits());
            Negotiation::Negotiated(funcs)
        }
        Err(errno) => {
            warn!(
                "{}: querying functionality failed ({}), using plain reads and writes",
                location.display(),
                errno
            );
            Negotiation::Failed(errno)
        }
    }
}

impl<K: I2CKernel> RegisterDevice for BusHandle<K> {
    fn bind(&mut self, address: u16) -> BusResult<()> {
        BusHandle::bind(self, address)
    }

    fn read_register(&mut self, register: u8, len: usize) -> BusResult<Vec<u8>> {
        let mut buf = vec![0; len];
        let count = self.read_register_into(register, &mut buf)?;
        buf.truncate(count.min(len));
        Ok(buf)
    }

    fn write_word(&mut self, register: u8, value: u16) -> BusResult<()> {
        BusHandle::write_word(self, register, value)
    }

    fn write(&mut self, data: &[u8]) -> BusResult<()> {
        self.raw_write(data)
    }

    fn read(&mut self, data: &mut [u8]) -> BusResult<usize> {
        self.raw_read(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{KernelCall, MockI2CBus};

    fn handle(funcs: I2CFunctions) -> BusHandle<MockI2CBus> {
        BusHandle::from_kernel(MockI2CBus::new().with_functions(funcs), "mock0")
    }

    #[test]
    fn test_open_negotiates_once() {
        let dev = BusHandle::<MockI2CBus>::open("mock0").unwrap();
        assert_eq!(dev.state(), HandleState::Negotiated);
        assert_eq!(dev.kernel().calls(), vec![KernelCall::Functions]);
        assert_eq!(dev.functions(), Some(I2CFunctions::all()));
    }

    #[test]
    fn test_open_passes_location_to_kernel() {
        let dev = BusHandle::<MockI2CBus>::open("/dev/i2c-7").unwrap();
        assert_eq!(dev.location(), Path::new("/dev/i2c-7"));
        assert_eq!(dev.kernel().location(), dev.location());
    }

    #[test]
    fn test_open_device_binds_address() {
        let dev = BusHandle::<MockI2CBus>::open_device("mock0", 0x20).unwrap();
        assert_eq!(dev.state(), HandleState::Addressed);
        assert_eq!(dev.address(), Some(0x20));
        assert_eq!(
            dev.kernel().calls(),
            vec![KernelCall::Functions, KernelCall::SetSlaveAddress(0x20)]
        );
    }

    #[test]
    fn test_failed_query_does_not_fail_construction() {
        let kernel = MockI2CBus::new().with_failing_query(Errno::ENOTTY);
        let mut dev = BusHandle::from_kernel(kernel, "mock0");
        assert_eq!(dev.state(), HandleState::Opened);
        assert_eq!(dev.functions(), None);
        match dev.negotiate() {
            Err(BusError::AdapterQueryFailed(Errno::ENOTTY)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_negotiate_overwrites_mask() {
        let mut dev = handle(I2CFunctions::I2C_FUNC_I2C);
        dev.kernel_mut()
            .set_functions(I2CFunctions::I2C_FUNC_SMBUS_BLOCK_DATA);
        let funcs = dev.negotiate().unwrap();
        assert!(funcs.can_block_read());
        assert_eq!(dev.functions(), Some(I2CFunctions::I2C_FUNC_SMBUS_BLOCK_DATA));
        assert_eq!(dev.kernel().count(|c| *c == KernelCall::Functions), 2);
    }

    #[test]
    fn test_bind_rejects_ten_bit_address() {
        let mut dev = handle(I2CFunctions::all());
        for address in [0x80u16, 0x3FF].iter() {
            match dev.bind(*address) {
                Err(BusError::InvalidAddress(a)) => assert_eq!(a, *address),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(dev.address(), None);
        assert_eq!(dev.kernel().calls(), vec![KernelCall::Functions]);
    }

    #[test]
    fn test_bind_accepts_every_seven_bit_address() {
        let mut dev = handle(I2CFunctions::all());
        for address in 0..=MAX_SLAVE_ADDRESS {
            dev.bind(address).unwrap();
            dev.write_word(0x00, address).unwrap();
            assert_eq!(dev.kernel().last_smbus_address(), Some(address));
        }
    }

    #[test]
    fn test_failed_bind_keeps_previous_address() {
        let mut dev = handle(I2CFunctions::all());
        dev.bind(0x20).unwrap();
        dev.kernel_mut().fail_next(Errno::EBUSY);
        match dev.bind(0x21) {
            Err(BusError::IoTransactionFailed {
                op: Operation::SetAddress,
                errno: Errno::EBUSY,
                ..
            }) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(dev.address(), Some(0x20));
    }

    #[test]
    fn test_close_reports_release_failure() {
        let dev = BusHandle::from_kernel(MockI2CBus::new().with_failing_close(Errno::EIO), "mock0");
        let journal = dev.kernel().journal();
        match dev.close() {
            Err(BusError::CloseFailed(Errno::EIO)) => {}
            other => panic!("unexpected {:?}", other),
        }
        let closes = journal
            .borrow()
            .iter()
            .filter(|c| **c == KernelCall::Close)
            .count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_close_releases_once() {
        let dev = BusHandle::<MockI2CBus>::open_device("mock0", 0x20).unwrap();
        let journal = dev.kernel().journal();
        dev.close().unwrap();
        assert_eq!(journal.borrow().last(), Some(&KernelCall::Close));
    }

    #[test]
    fn test_register_device_truncates_to_reported_count() {
        let mut dev = handle(I2CFunctions::all());
        dev.bind(0x40).unwrap();
        dev.kernel_mut().queue_block_response(&[0x01, 0xAB, 0xCD]);
        let data = RegisterDevice::read_register(&mut dev, 0x01, 2).unwrap();
        assert_eq!(data, vec![0xAB]);

        dev.kernel_mut().queue_block_response(&[0x01, 0xAB]);
        match dev.read_register_exact(0x01, 2) {
            Err(BusError::ShortRead {
                requested: 2,
                returned: 1,
            }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
