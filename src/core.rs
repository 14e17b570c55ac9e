// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use nix::errno::Errno;

use crate::smbus::SmbusTransaction;

/// The primitive that was being executed when a control request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SetAddress,
    Read,
    Write,
    BlockRead,
    BlockWrite,
    WriteWord,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Operation::SetAddress => "set address",
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::BlockRead => "block read",
            Operation::BlockWrite => "block write",
            Operation::WriteWord => "write word",
        };
        f.write_str(name)
    }
}

/// Error that occurred while performing an SMBus operation
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The bus location could not be opened
    #[error("unable to open {}: {source}", .location.display())]
    OpenFailed {
        location: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Querying the adapter functionality (I2C_FUNCS) failed
    #[error("querying adapter functionality failed: {0}")]
    AdapterQueryFailed(Errno),

    /// A transaction was attempted before a slave address was bound
    #[error("no slave address bound to the handle")]
    UnboundAddress,

    /// Only 7-bit addresses are accepted
    #[error("invalid 7-bit slave address 0x{0:x}")]
    InvalidAddress(u16),

    /// The kernel rejected a control request
    #[error("{op} failed (register {register:?}): {errno}")]
    IoTransactionFailed {
        op: Operation,
        register: Option<u8>,
        errno: Errno,
    },

    /// The device returned fewer bytes than were asked for
    #[error("short read: requested {requested} bytes, got {returned}")]
    ShortRead { requested: usize, returned: usize },

    /// A plain write pushed fewer bytes than were given
    #[error("short write: requested {requested} bytes, wrote {written}")]
    ShortWrite { requested: usize, written: usize },

    /// The payload does not fit in one SMBus block
    #[error("block of {len} bytes exceeds the SMBus maximum")]
    BlockTooLarge { len: usize },

    /// A block write needs at least the register byte
    #[error("block write without a register byte")]
    EmptyWrite,

    /// Releasing the bus descriptor failed
    #[error("closing bus failed: {0}")]
    CloseFailed(Errno),
}

/// Result of an SMBus operation
pub type BusResult<T> = Result<T, BusError>;

bitflags! {
    /// Adapter functionality as reported by the I2C_FUNCS ioctl
    ///
    /// The bits mirror `include/uapi/linux/i2c.h`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct I2CFunctions: u32 {
        const I2C_FUNC_I2C = 0x0000_0001;
        const I2C_FUNC_10BIT_ADDR = 0x0000_0002;
        const I2C_FUNC_PROTOCOL_MANGLING = 0x0000_0004; /* I2C_M_IGNORE_NAK etc. */
        const I2C_FUNC_SMBUS_PEC = 0x0000_0008;
        const I2C_FUNC_NOSTART = 0x0000_0010; /* I2C_M_NOSTART */
        const I2C_FUNC_SMBUS_BLOCK_PROC_CALL = 0x0000_8000; /* SMBus 2.0 */
        const I2C_FUNC_SMBUS_QUICK = 0x0001_0000;
        const I2C_FUNC_SMBUS_READ_BYTE = 0x0002_0000;
        const I2C_FUNC_SMBUS_WRITE_BYTE = 0x0004_0000;
        const I2C_FUNC_SMBUS_READ_BYTE_DATA = 0x0008_0000;
        const I2C_FUNC_SMBUS_WRITE_BYTE_DATA = 0x0010_0000;
        const I2C_FUNC_SMBUS_READ_WORD_DATA = 0x0020_0000;
        const I2C_FUNC_SMBUS_WRITE_WORD_DATA = 0x0040_0000;
        const I2C_FUNC_SMBUS_PROC_CALL = 0x0080_0000;
        const I2C_FUNC_SMBUS_READ_BLOCK_DATA = 0x0100_0000;
        const I2C_FUNC_SMBUS_WRITE_BLOCK_DATA = 0x0200_0000;
        const I2C_FUNC_SMBUS_READ_I2C_BLOCK = 0x0400_0000; /* I2C-like block xfer  */
        const I2C_FUNC_SMBUS_WRITE_I2C_BLOCK = 0x0800_0000; /* w/ 1-byte reg. addr. */

        const I2C_FUNC_SMBUS_WORD_DATA = Self::I2C_FUNC_SMBUS_READ_WORD_DATA.bits()
            | Self::I2C_FUNC_SMBUS_WRITE_WORD_DATA.bits();
        const I2C_FUNC_SMBUS_BLOCK_DATA = Self::I2C_FUNC_SMBUS_READ_BLOCK_DATA.bits()
            | Self::I2C_FUNC_SMBUS_WRITE_BLOCK_DATA.bits();

        /// What an adapter emulating SMBus over plain I2C reports
        const I2C_FUNC_SMBUS_EMUL = Self::I2C_FUNC_SMBUS_QUICK.bits()
            | Self::I2C_FUNC_SMBUS_READ_BYTE.bits()
            | Self::I2C_FUNC_SMBUS_WRITE_BYTE.bits()
            | Self::I2C_FUNC_SMBUS_READ_BYTE_DATA.bits()
            | Self::I2C_FUNC_SMBUS_WRITE_BYTE_DATA.bits()
            | Self::I2C_FUNC_SMBUS_WORD_DATA.bits()
            | Self::I2C_FUNC_SMBUS_PROC_CALL.bits()
            | Self::I2C_FUNC_SMBUS_WRITE_BLOCK_DATA.bits()
            | Self::I2C_FUNC_SMBUS_READ_I2C_BLOCK.bits()
            | Self::I2C_FUNC_SMBUS_WRITE_I2C_BLOCK.bits();
    }
}

impl I2CFunctions {
    /// Whether the adapter can perform SMBus block reads
    ///
    /// Raw I/O is gated on the SMBus block bits even though the block
    /// path issues I2C block transactions.  An adapter that only
    /// reports `I2C_FUNC_SMBUS_EMUL` therefore gets plain reads and
    /// block writes.
    pub fn can_block_read(self) -> bool {
        self.contains(I2CFunctions::I2C_FUNC_SMBUS_READ_BLOCK_DATA)
    }

    /// Whether the adapter can perform SMBus block writes
    pub fn can_block_write(self) -> bool {
        self.contains(I2CFunctions::I2C_FUNC_SMBUS_WRITE_BLOCK_DATA)
    }
}

/// The kernel side of an i2c bus
///
/// Every method maps to exactly one system call on the bus
/// descriptor.  `LinuxI2CBus` talks to `/dev/i2c-N`; the mock
/// implementation records calls for tests.
pub trait I2CKernel: Sized {
    /// Open the bus at the given location
    fn open<P: AsRef<Path>>(location: P) -> io::Result<Self>;

    /// Ask the adapter which transfer primitives it supports (I2C_FUNCS)
    fn functions(&mut self) -> Result<I2CFunctions, Errno>;

    /// Select the slave that subsequent requests are addressed to (I2C_SLAVE)
    fn set_slave_address(&mut self, address: u16) -> Result<(), Errno>;

    /// Issue a single SMBus control request (I2C_SMBUS)
    fn smbus_access(&mut self, transaction: &mut SmbusTransaction) -> Result<(), Errno>;

    /// Plain stream read from the bound slave
    fn read(&mut self, data: &mut [u8]) -> Result<usize, Errno>;

    /// Plain stream write to the bound slave
    fn write(&mut self, data: &[u8]) -> Result<usize, Errno>;

    /// Release the descriptor
    fn close(self) -> Result<(), Errno>;
}

/// Register level access to a single slave device
///
/// This is the surface device drivers are written against.  The
/// register contents are never interpreted; drivers own byte order
/// and bit decoding.
pub trait RegisterDevice {
    /// Bind the 7-bit slave address used by all following calls
    fn bind(&mut self, address: u16) -> BusResult<()>;

    /// Read up to `len` bytes starting at `register`
    ///
    /// The returned vector holds as many bytes as the device reported,
    /// which may be fewer than `len`.
    fn read_register(&mut self, register: u8, len: usize) -> BusResult<Vec<u8>>;

    /// Write a 16 bit value to `register` with a word transaction
    fn write_word(&mut self, register: u8, value: u16) -> BusResult<()>;

    /// Write raw bytes, by convention starting with the register
    fn write(&mut self, data: &[u8]) -> BusResult<()>;

    /// Read from the currently selected register
    fn read(&mut self, data: &mut [u8]) -> BusResult<usize>;

    /// Read exactly `len` bytes starting at `register`
    fn read_register_exact(&mut self, register: u8, len: usize) -> BusResult<Vec<u8>> {
        let data = self.read_register(register, len)?;
        if data.len() < len {
            return Err(BusError::ShortRead {
                requested: len,
                returned: data.len(),
            });
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_capabilities() {
        let funcs = I2CFunctions::I2C_FUNC_I2C | I2CFunctions::I2C_FUNC_SMBUS_READ_BLOCK_DATA;
        assert!(funcs.can_block_read());
        assert!(!funcs.can_block_write());
        assert!(I2CFunctions::I2C_FUNC_SMBUS_BLOCK_DATA.can_block_write());
        assert!(!I2CFunctions::empty().can_block_read());

        let emul = I2CFunctions::I2C_FUNC_I2C | I2CFunctions::I2C_FUNC_SMBUS_EMUL;
        assert!(!emul.can_block_read());
        assert!(emul.can_block_write());
    }

    #[test]
    fn test_error_display_carries_errno() {
        let err = BusError::IoTransactionFailed {
            op: Operation::BlockRead,
            register: Some(0x09),
            errno: Errno::EIO,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("block read failed"));
        assert!(msg.contains("Some(9)"));
    }
}
