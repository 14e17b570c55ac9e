// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Drives the RIoT interface board and its sensors from the command line

extern crate docopt;
extern crate riot_smbus;

use docopt::Docopt;
use std::env::args;
use std::process;

use riot_smbus::sensors::riot::{Command, RIoTBoard};
use riot_smbus::sensors::tcs34725_color::TCS34725Color;
use riot_smbus::sensors::tmp007_thermopile::TMP007Thermopile;
use riot_smbus::sensors::tsl2591_light::TSL2591Light;
use riot_smbus::sensors::SensorResult;
use riot_smbus::{BusHandle, LinuxI2CBus};

const USAGE: &str = "
Control the RIoT board via Linux i2cdev.

Usage:
  riot <device> board <command>
  riot <device> thermopile
  riot <device> light
  riot <device> color
  riot --commands
  riot (-h | --help)

Options:
  -h --help     Show this help text.
  --commands    List the board commands.
";

fn run(args: &docopt::ArgvMap) -> SensorResult<()> {
    let device = args.get_str("<device>");
    let bus = BusHandle::<LinuxI2CBus>::open(device)?;
    if args.get_bool("board") {
        let command: Command = args.get_str("<command>").parse()?;
        let mut board = RIoTBoard::new(bus)?;
        for (key, value) in board.execute(command)? {
            println!("{}: {}", key, value);
        }
        board.into_inner().close()?;
    } else if args.get_bool("thermopile") {
        let mut sensor = TMP007Thermopile::new(bus)?;
        println!("{:?}", sensor.read()?);
    } else if args.get_bool("light") {
        let mut sensor = TSL2591Light::new(bus)?;
        println!("{:?}", sensor.read()?);
    } else if args.get_bool("color") {
        let mut sensor = TCS34725Color::new(bus)?;
        println!("{:?}", sensor.read()?);
    }
    Ok(())
}

fn main() {
    let args = Docopt::new(USAGE)
        .and_then(|d| d.argv(args()).parse())
        .unwrap_or_else(|e| e.exit());

    if args.get_bool("--commands") {
        for command in Command::ALL.iter() {
            println!("{}", command);
        }
        return;
    }

    if let Err(err) = run(&args) {
        println!("Error: {}", err);
        process::exit(1);
    }
}
