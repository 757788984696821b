#![allow(dead_code)]

use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal_nb::serial::{ErrorType, Read, Write};
use std::collections::VecDeque;
use sumpla::*;

pub type TestAnalyzer = LogicAnalyzer<Wire, NoDelay, Waveform>;

pub fn analyzer(wire: Wire) -> TestAnalyzer {
    let storage: &'static mut [u8; SAMPLE_MEMORY] = Box::leak(Box::new([0; SAMPLE_MEMORY]));
    LogicAnalyzer::new(Sampler::new(
        wire,
        NoDelay,
        Waveform::default(),
        Calibration::for_probe::<Wire>(125_000_000),
        SampleBuffer::new(storage),
    ))
}

/// Probe inputs as a function of the sample index.
pub struct Wire {
    levels: fn(usize) -> u8,
    index: usize,
    cycles: u32,
}

impl Wire {
    pub fn new(levels: fn(usize) -> u8) -> Self {
        Self {
            levels,
            index: 0,
            cycles: 0,
        }
    }
}

impl Probe for Wire {
    fn read_port(&mut self) -> u8 {
        let level = (self.levels)(self.index);
        self.index += 1;
        level
    }

    fn read_cycle_counter(&mut self) -> u32 {
        self.cycles = self.cycles.wrapping_add(3);
        self.cycles
    }

    fn stall(&mut self, _units: u32) {}
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Default)]
pub struct Waveform {
    pub running: bool,
}

impl SignalGenerator for Waveform {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

/// Host side of the link.
#[derive(Default)]
pub struct Host {
    to_device: VecDeque<u8>,
    from_device: Vec<u8>,
}

impl Host {
    pub fn send(&mut self, bytes: &[u8]) {
        self.to_device.extend(bytes);
    }

    pub fn received(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.from_device)
    }
}

impl ErrorType for Host {
    type Error = Infallible;
}

impl Read<u8> for Host {
    fn read(&mut self) -> nb::Result<u8, Infallible> {
        self.to_device.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

impl Write<u8> for Host {
    fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
        self.from_device.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        Ok(())
    }
}

/// Serves every pending host byte.
pub fn run(analyzer: &mut TestAnalyzer, host: &mut Host) {
    loop {
        match analyzer.poll_serial(host) {
            Ok(()) => {}
            Err(nb::Error::WouldBlock) => break,
            Err(nb::Error::Other(err)) => match err {},
        }
    }
}

pub fn long(opcode: u8, arg: u32) -> [u8; 5] {
    let [a, b, c, d] = arg.to_le_bytes();
    [opcode, a, b, c, d]
}
