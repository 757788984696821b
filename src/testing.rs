//! Host doubles for the hardware seams.

use crate::*;
use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal_nb::serial::{ErrorType, Read, Write};

pub fn storage() -> &'static mut [u8; SAMPLE_MEMORY] {
    Box::leak(Box::new([0; SAMPLE_MEMORY]))
}

/// Port replaying a fixed sequence; the cycle counter advances on every read.
pub struct MockProbe {
    port: Vec<u8>,
    counting: bool,
    reads: usize,
    counter: u32,
    counter_reads: usize,
    stalls: Vec<u32>,
    pads: Vec<u32>,
}

impl MockProbe {
    pub fn sequence(port: &[u8]) -> Self {
        Self {
            port: port.to_vec(),
            counting: false,
            reads: 0,
            counter: 0,
            counter_reads: 0,
            stalls: Vec::new(),
            pads: Vec::new(),
        }
    }

    pub fn constant(value: u8) -> Self {
        Self::sequence(&[value])
    }

    /// Port value equals the number of earlier reads.
    pub fn counting() -> Self {
        Self {
            counting: true,
            ..Self::sequence(&[])
        }
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn counter_reads(&self) -> usize {
        self.counter_reads
    }

    pub fn elapsed_cycles(&self) -> u32 {
        self.counter
    }

    pub fn stalls(&self) -> &[u32] {
        &self.stalls
    }

    pub fn pads(&self) -> &[u32] {
        &self.pads
    }
}

impl Probe for MockProbe {
    fn read_port(&mut self) -> u8 {
        let value = if self.counting {
            self.reads as u8
        } else {
            self.port[self.reads % self.port.len()]
        };
        self.reads += 1;
        value
    }

    fn read_cycle_counter(&mut self) -> u32 {
        self.counter_reads += 1;
        self.counter = self.counter.wrapping_add(1);
        self.counter
    }

    fn stall(&mut self, units: u32) {
        self.stalls.push(units);
    }

    fn pad<const CYCLES: u32>(&mut self) {
        self.pads.push(CYCLES);
    }
}

/// 24 bit counter stepping by a large stride, to exercise wrap handling.
///
/// `ticks` keeps the unmasked time so waits can be checked across wraps.
pub struct NarrowCounter {
    counter: u32,
    step: u32,
    ticks: u64,
}

impl NarrowCounter {
    pub fn starting_at(counter: u32, step: u32) -> Self {
        Self {
            counter: counter & Self::COUNTER_MASK,
            step,
            ticks: 0,
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Probe for NarrowCounter {
    const COUNTER_MASK: u32 = 0x00ff_ffff;

    fn read_port(&mut self) -> u8 {
        0
    }

    fn read_cycle_counter(&mut self) -> u32 {
        self.ticks += u64::from(self.step);
        self.counter = self.counter.wrapping_add(self.step) & Self::COUNTER_MASK;
        self.counter
    }
}

#[derive(Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.total_ns += u64::from(us) * 1_000;
    }
}

#[derive(Default)]
pub struct MockGenerator {
    starts: usize,
    stops: usize,
}

impl MockGenerator {
    pub fn starts(&self) -> usize {
        self.starts
    }

    pub fn stops(&self) -> usize {
        self.stops
    }
}

impl SignalGenerator for MockGenerator {
    fn start(&mut self) {
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

/// Loopback serial: `rx` feeds reads, writes land in `tx`.
#[derive(Default)]
pub struct MockSerial {
    rx: Vec<u8>,
    tx: Vec<u8>,
    backlog: usize,
    pending: usize,
    refusals: usize,
    flushes: usize,
}

impl MockSerial {
    pub fn with_input(input: &[u8]) -> Self {
        Self {
            rx: input.iter().rev().copied().collect(),
            ..Self::default()
        }
    }

    /// Refuses every byte `backlog` times before taking it.
    pub fn congested(backlog: usize) -> Self {
        Self {
            backlog,
            pending: backlog,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> &[u8] {
        &self.tx
    }

    pub fn take_sent(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }

    pub fn refusals(&self) -> usize {
        self.refusals
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl ErrorType for MockSerial {
    type Error = Infallible;
}

impl Read<u8> for MockSerial {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.rx.pop().ok_or(nb::Error::WouldBlock)
    }
}

impl Write<u8> for MockSerial {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.pending > 0 {
            self.pending -= 1;
            self.refusals += 1;
            return Err(nb::Error::WouldBlock);
        }
        self.pending = self.backlog;
        self.tx.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}
