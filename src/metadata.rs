use crate::*;
use embedded_hal_nb::serial::Write;

const TAG_END: u8 = 0x00;
const TAG_NAME: u8 = 0x01;
const TAG_FIRMWARE: u8 = 0x02;
const TAG_SAMPLE_MEMORY: u8 = 0x21;
const TAG_DYNAMIC_MEMORY: u8 = 0x22;
const TAG_SAMPLE_RATE: u8 = 0x23;
const TAG_PROBES: u8 = 0x40;
const TAG_PROTOCOL: u8 = 0x41;

/// Device descriptor sent in reply to `0x04`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Metadata {
    pub name: &'static str,
    pub firmware: &'static str,
    pub sample_memory: u32,
    pub dynamic_memory: u32,
    pub sample_rate: u32,
    pub probes: u8,
    pub protocol_version: u8,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: DEVICE_NAME,
            firmware: env!("CARGO_PKG_VERSION"),
            sample_memory: SAMPLE_MEMORY as u32,
            dynamic_memory: 0,
            sample_rate: SAMPLE_RATE,
            probes: PROBES as u8,
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

impl Metadata {
    /// Writes the tagged frame, terminated by a zero tag.
    pub fn write<S: Write<u8>>(&self, serial: &mut S) -> Result<(), S::Error> {
        write_string(serial, TAG_NAME, self.name)?;
        write_string(serial, TAG_FIRMWARE, self.firmware)?;
        write_u32(serial, TAG_SAMPLE_MEMORY, self.sample_memory)?;
        write_u32(serial, TAG_DYNAMIC_MEMORY, self.dynamic_memory)?;
        write_u32(serial, TAG_SAMPLE_RATE, self.sample_rate)?;
        write_all(serial, &[TAG_PROBES, self.probes])?;
        write_all(serial, &[TAG_PROTOCOL, self.protocol_version])?;
        write_all(serial, &[TAG_END])
    }
}

fn write_string<S: Write<u8>>(serial: &mut S, tag: u8, value: &str) -> Result<(), S::Error> {
    write_all(serial, &[tag])?;
    write_all(serial, value.as_bytes())?;
    write_all(serial, &[0x00])
}

fn write_u32<S: Write<u8>>(serial: &mut S, tag: u8, value: u32) -> Result<(), S::Error> {
    write_all(serial, &[tag])?;
    write_all(serial, &value.to_be_bytes())
}

/// Blocking write of `bytes`, waiting out back-pressure on every byte.
pub fn write_all<S: Write<u8>>(serial: &mut S, bytes: &[u8]) -> Result<(), S::Error> {
    for &byte in bytes {
        nb::block!(serial.write(byte))?;
    }
    Ok(())
}
