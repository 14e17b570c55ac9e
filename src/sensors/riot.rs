// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! RIoT interface board: relays, digital I/O, DAC and ADC
//!
//! The board carries three slaves on one bus: the I/O expander at
//! 0x20, the luminaire DAC at 0x61 and the ADC at 0x49.  The driver
//! rebinds the handle before talking to each of them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder};

use crate::core::RegisterDevice;
use crate::sensors::{SensorError, SensorResult};

pub const RIOT_ADDRESS: u16 = 0x20;
const DAC_ADDRESS: u16 = 0x61;
const ADC_ADDRESS: u16 = 0x49;

const REGISTER_IO_DIRECTION: u8 = 0x00;
const REGISTER_IO_POLARITY: u8 = 0x01;
const REGISTER_DIGITAL_INPUT: u8 = 0x09;
const REGISTER_DIGITAL_OUTPUT: u8 = 0x0A;

const REGISTER_ADC_OUTPUT: u8 = 0x00;
const REGISTER_ADC_CONFIG: u8 = 0x01;

/// One of the two output or relay channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Zero,
    One,
}

impl Channel {
    fn digital_set_mask(self) -> u8 {
        match self {
            Channel::Zero => 0x40,
            Channel::One => 0x80,
        }
    }

    fn digital_reset_mask(self) -> u8 {
        !self.digital_set_mask()
    }

    // relays are normally closed, so "set" opens the contact
    fn relay_set_mask(self) -> u8 {
        match self {
            Channel::Zero => 0x10,
            Channel::One => 0x20,
        }
    }

    fn relay_reset_mask(self) -> u8 {
        !self.relay_set_mask()
    }

    fn name(self) -> &'static str {
        match self {
            Channel::Zero => "Zero",
            Channel::One => "One",
        }
    }
}

/// ADC input channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcChannel {
    Zero,
    One,
    Two,
    Three,
}

impl AdcChannel {
    /// Config word starting a single-shot conversion on this input
    fn config(self) -> u16 {
        match self {
            AdcChannel::Zero => 0x83C5,
            AdcChannel::One => 0x83D5,
            AdcChannel::Two => 0x83E5,
            AdcChannel::Three => 0x83F5,
        }
    }

    fn name(self) -> &'static str {
        match self {
            AdcChannel::Zero => "Zero",
            AdcChannel::One => "One",
            AdcChannel::Two => "Two",
            AdcChannel::Three => "Three",
        }
    }
}

/// The digital input register; the low nibble holds inputs 0-3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalInputs(pub u8);

impl DigitalInputs {
    pub fn input(self, n: u8) -> bool {
        n < 4 && self.0 & (1 << n) != 0
    }
}

/// Raw conversion result, most significant byte first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcReading(pub [u8; 2]);

impl AdcReading {
    pub fn value(self) -> u16 {
        BigEndian::read_u16(&self.0)
    }
}

/// Everything the board can be asked to do by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ReadDigitalInput,
    SetDigitalOutput(Channel),
    ResetDigitalOutput(Channel),
    SetRelayOutput(Channel),
    ResetRelayOutput(Channel),
    DimLuminaireUp,
    DimLuminaireDown,
    ReadAdc(AdcChannel),
}

impl Command {
    pub const ALL: [Command; 15] = [
        Command::ReadDigitalInput,
        Command::SetDigitalOutput(Channel::Zero),
        Command::ResetDigitalOutput(Channel::Zero),
        Command::SetDigitalOutput(Channel::One),
        Command::ResetDigitalOutput(Channel::One),
        Command::SetRelayOutput(Channel::Zero),
        Command::ResetRelayOutput(Channel::Zero),
        Command::SetRelayOutput(Channel::One),
        Command::ResetRelayOutput(Channel::One),
        Command::DimLuminaireUp,
        Command::DimLuminaireDown,
        Command::ReadAdc(AdcChannel::Zero),
        Command::ReadAdc(AdcChannel::One),
        Command::ReadAdc(AdcChannel::Two),
        Command::ReadAdc(AdcChannel::Three),
    ];
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Command::ReadDigitalInput => write!(f, "ReadDigitalInput"),
            Command::SetDigitalOutput(ch) => write!(f, "SetDigitalOutputChannel{}", ch.name()),
            Command::ResetDigitalOutput(ch) => write!(f, "ResetDigitalOutputChannel{}", ch.name()),
            Command::SetRelayOutput(ch) => write!(f, "SetRelayOutputChannel{}", ch.name()),
            Command::ResetRelayOutput(ch) => write!(f, "ResetRelayOutputChannel{}", ch.name()),
            Command::DimLuminaireUp => write!(f, "DimLuminaireUp"),
            Command::DimLuminaireDown => write!(f, "DimLuminaireDown"),
            Command::ReadAdc(ch) => write!(f, "ReadADCChannel{}", ch.name()),
        }
    }
}

impl FromStr for Command {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Command, SensorError> {
        let channel = |name: &str| match name {
            "Zero" => Some(Channel::Zero),
            "One" => Some(Channel::One),
            _ => None,
        };
        let adc_channel = |name: &str| match name {
            "Zero" => Some(AdcChannel::Zero),
            "One" => Some(AdcChannel::One),
            "Two" => Some(AdcChannel::Two),
            "Three" => Some(AdcChannel::Three),
            _ => None,
        };
        let parsed = match s {
            "ReadDigitalInput" => Some(Command::ReadDigitalInput),
            "DimLuminaireUp" => Some(Command::DimLuminaireUp),
            "DimLuminaireDown" => Some(Command::DimLuminaireDown),
            _ => {
                if let Some(rest) = s.strip_prefix("SetDigitalOutputChannel") {
                    channel(rest).map(Command::SetDigitalOutput)
                } else if let Some(rest) = s.strip_prefix("ResetDigitalOutputChannel") {
                    channel(rest).map(Command::ResetDigitalOutput)
                } else if let Some(rest) = s.strip_prefix("SetRelayOutputChannel") {
                    channel(rest).map(Command::SetRelayOutput)
                } else if let Some(rest) = s.strip_prefix("ResetRelayOutputChannel") {
                    channel(rest).map(Command::ResetRelayOutput)
                } else if let Some(rest) = s.strip_prefix("ReadADCChannel") {
                    adc_channel(rest).map(Command::ReadAdc)
                } else {
                    None
                }
            }
        };
        parsed.ok_or_else(|| SensorError::UnknownCommand(s.to_string()))
    }
}

/// Key/value result of a command
pub type Response = BTreeMap<&'static str, String>;

/// Provides access to the RIoT interface board
pub struct RIoTBoard<T: RegisterDevice> {
    i2cdev: T,
}

impl<T> RIoTBoard<T>
where
    T: RegisterDevice,
{
    /// Take over the bus and configure the digital I/O expander
    ///
    /// The low nibble becomes inputs, the high nibble outputs.
    pub fn new(mut i2cdev: T) -> SensorResult<RIoTBoard<T>> {
        i2cdev.bind(RIOT_ADDRESS)?;
        i2cdev.write(&[REGISTER_IO_DIRECTION, 0x0F])?;
        i2cdev.write(&[REGISTER_IO_POLARITY, 0x00])?;
        Ok(RIoTBoard { i2cdev })
    }

    pub fn read_digital_input(&mut self) -> SensorResult<DigitalInputs> {
        self.i2cdev.bind(RIOT_ADDRESS)?;
        let data = self.i2cdev.read_register_exact(REGISTER_DIGITAL_INPUT, 1)?;
        Ok(DigitalInputs(data[0]))
    }

    pub fn set_digital_output(&mut self, channel: Channel) -> SensorResult<()> {
        let mask = channel.digital_set_mask();
        self.update_outputs(|value| value | mask)
    }

    pub fn reset_digital_output(&mut self, channel: Channel) -> SensorResult<()> {
        let mask = channel.digital_reset_mask();
        self.update_outputs(|value| value & mask)
    }

    pub fn set_relay(&mut self, channel: Channel) -> SensorResult<()> {
        let mask = channel.relay_set_mask();
        self.update_outputs(|value| value | mask)
    }

    pub fn reset_relay(&mut self, channel: Channel) -> SensorResult<()> {
        let mask = channel.relay_reset_mask();
        self.update_outputs(|value| value & mask)
    }

    /// Write `value` to DAC register `register` of the luminaire dimmer
    pub fn set_dac(&mut self, register: u8, value: u16) -> SensorResult<()> {
        self.i2cdev.bind(DAC_ADDRESS)?;
        self.i2cdev.write_word(register, value)?;
        Ok(())
    }

    /// Start a conversion on `channel` and read back the result register
    pub fn read_adc(&mut self, channel: AdcChannel) -> SensorResult<AdcReading> {
        self.i2cdev.bind(ADC_ADDRESS)?;
        self.i2cdev.write_word(REGISTER_ADC_CONFIG, channel.config())?;
        let data = self.i2cdev.read_register_exact(REGISTER_ADC_OUTPUT, 2)?;
        Ok(AdcReading([data[0], data[1]]))
    }

    pub fn execute(&mut self, command: Command) -> SensorResult<Response> {
        let mut response = Response::new();
        match command {
            Command::ReadDigitalInput => {
                let inputs = self.read_digital_input()?;
                response.insert("raw", format!("{:X}", inputs.0));
                for (key, n) in [
                    ("digitalInput01", 0),
                    ("digitalInput02", 1),
                    ("digitalInput03", 2),
                    ("digitalInput04", 3),
                ]
                .iter()
                {
                    response.insert(*key, format!("{:X}", inputs.input(*n) as u8));
                }
            }
            Command::SetDigitalOutput(ch) => self.set_digital_output(ch)?,
            Command::ResetDigitalOutput(ch) => self.reset_digital_output(ch)?,
            Command::SetRelayOutput(ch) => self.set_relay(ch)?,
            Command::ResetRelayOutput(ch) => self.reset_relay(ch)?,
            Command::DimLuminaireUp => self.set_dac(0x0F, 0x00FF)?,
            Command::DimLuminaireDown => self.set_dac(0x00, 0x0000)?,
            Command::ReadAdc(ch) => {
                let reading = self.read_adc(ch)?;
                response.insert("raw", format!("{:02X}{:02X}", reading.0[0], reading.0[1]));
                response.insert("value", reading.value().to_string());
            }
        }
        debug!("{} -> {:?}", command, response);
        Ok(response)
    }

    /// Give the bus back
    pub fn into_inner(self) -> T {
        self.i2cdev
    }

    // Read-modify-write of the output register, seeded from the input register.
    fn update_outputs<F: FnOnce(u8) -> u8>(&mut self, update: F) -> SensorResult<()> {
        let current = self.read_digital_input()?;
        let value = update(current.0);
        self.i2cdev
            .write_word(REGISTER_DIGITAL_OUTPUT, u16::from(value))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BusError, I2CFunctions};
    use crate::device::BusHandle;
    use crate::mock::{KernelCall, MockI2CBus};
    use crate::smbus::SmbusSize;
    use nix::errno::Errno;

    fn board() -> RIoTBoard<BusHandle<MockI2CBus>> {
        let kernel = MockI2CBus::new().with_functions(I2CFunctions::all());
        RIoTBoard::new(BusHandle::from_kernel(kernel, "mock0")).unwrap()
    }

    fn kernel(board: &RIoTBoard<BusHandle<MockI2CBus>>) -> &MockI2CBus {
        board.i2cdev.kernel()
    }

    #[test]
    fn test_init_configures_io_direction() {
        let board = board();
        let regs = kernel(&board).device(RIOT_ADDRESS).unwrap().read_regs(0x00, 2);
        assert_eq!(regs, vec![0x0F, 0x00]);
    }

    #[test]
    fn test_read_digital_input() {
        let mut board = board();
        board
            .i2cdev
            .kernel_mut()
            .device_mut(RIOT_ADDRESS)
            .write_regs(REGISTER_DIGITAL_INPUT, &[0b0101]);
        let inputs = board.read_digital_input().unwrap();
        assert!(inputs.input(0));
        assert!(!inputs.input(1));
        assert!(inputs.input(2));
        assert!(!inputs.input(4));
    }

    #[test]
    fn test_set_digital_output_is_read_modify_write() {
        let mut board = board();
        board
            .i2cdev
            .kernel_mut()
            .device_mut(RIOT_ADDRESS)
            .write_regs(REGISTER_DIGITAL_INPUT, &[0x03]);
        board.set_digital_output(Channel::Zero).unwrap();
        let txn = kernel(&board).last_smbus().unwrap();
        assert_eq!(txn.command, REGISTER_DIGITAL_OUTPUT);
        assert_eq!(txn.size, SmbusSize::WordData);
        assert_eq!(txn.data.word(), 0x0043);
    }

    #[test]
    fn test_reset_relay_clears_bit() {
        let mut board = board();
        board
            .i2cdev
            .kernel_mut()
            .device_mut(RIOT_ADDRESS)
            .write_regs(REGISTER_DIGITAL_INPUT, &[0x3F]);
        board.reset_relay(Channel::One).unwrap();
        assert_eq!(kernel(&board).last_smbus().unwrap().data.word(), 0x001F);
    }

    #[test]
    fn test_failed_bind_skips_output_write() {
        let mut board = board();
        board.i2cdev.kernel_mut().fail_next(Errno::EIO);
        // the bind consumes the injected failure
        match board.set_relay(Channel::Zero) {
            Err(SensorError::Bus(BusError::IoTransactionFailed { .. })) => {}
            other => panic!("unexpected {:?}", other),
        }
        let words = kernel(&board).count(|c| match c {
            KernelCall::Smbus { transaction, .. } => transaction.size == SmbusSize::WordData,
            _ => false,
        });
        assert_eq!(words, 0);
    }

    #[test]
    fn test_failed_input_read_skips_output_write() {
        let mut board = board();
        board.i2cdev.kernel_mut().queue_block_response(&[0x00]);
        match board.set_digital_output(Channel::One) {
            Err(SensorError::Bus(BusError::ShortRead {
                requested: 1,
                returned: 0,
            })) => {}
            other => panic!("unexpected {:?}", other),
        }
        let last = kernel(&board).last_smbus().unwrap();
        assert_eq!(last.command, REGISTER_DIGITAL_INPUT);
        assert_eq!(last.size, SmbusSize::I2CBlockData);
    }

    #[test]
    fn test_dim_luminaire_targets_dac() {
        let mut board = board();
        board.execute(Command::DimLuminaireUp).unwrap();
        assert_eq!(kernel(&board).last_smbus_address(), Some(DAC_ADDRESS));
        let txn = kernel(&board).last_smbus().unwrap();
        assert_eq!((txn.command, txn.data.word()), (0x0F, 0x00FF));
    }

    #[test]
    fn test_read_adc() {
        let mut board = board();
        // conversion result, count byte first
        board.i2cdev.kernel_mut().queue_block_response(&[0x02, 0x12, 0x30]);
        let response = board.execute(Command::ReadAdc(AdcChannel::Two)).unwrap();
        assert_eq!(response["raw"], "1230");
        assert_eq!(response["value"], "4656");

        let config = kernel(&board)
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                KernelCall::Smbus {
                    address: Some(ADC_ADDRESS),
                    transaction,
                } if transaction.size == SmbusSize::WordData => Some(transaction.data.word()),
                _ => None,
            })
            .last();
        assert_eq!(config, Some(0x83E5));
    }

    #[test]
    fn test_read_digital_input_response() {
        let mut board = board();
        board
            .i2cdev
            .kernel_mut()
            .device_mut(RIOT_ADDRESS)
            .write_regs(REGISTER_DIGITAL_INPUT, &[0x0A]);
        let response = board.execute(Command::ReadDigitalInput).unwrap();
        assert_eq!(response["raw"], "A");
        assert_eq!(response["digitalInput01"], "0");
        assert_eq!(response["digitalInput02"], "1");
        assert_eq!(response["digitalInput04"], "1");
    }

    #[test]
    fn test_command_names_round_trip() {
        for command in Command::ALL.iter() {
            let parsed: Command = command.to_string().parse().unwrap();
            assert_eq!(parsed, *command);
        }
        assert_eq!(
            "ReadADCChannelThree".parse::<Command>().unwrap(),
            Command::ReadAdc(AdcChannel::Three)
        );
        assert!(matches!(
            "SetRelayOutputChannelTwo".parse::<Command>(),
            Err(SensorError::UnknownCommand(_))
        ));
    }
}
