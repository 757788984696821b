//! Core of a SUMP-compatible logic analyzer.
//!
//! The crate is split into the hardware-free pieces that do the actual work
//! and the thin firmware binary (`src/main.rs`, built with the `firmware`
//! feature) that wires them to an RP2040:
//!
//! ```text
//! serial byte stream -> CommandDecoder -> LogicAnalyzer -> Sampler -> SampleBuffer
//!                                              |                          |
//!                                              +------ response bytes <---+
//! ```
//!
//! Everything that touches silicon goes through [`Probe`], [`SignalGenerator`],
//! `embedded_hal::delay::DelayNs` and the `embedded_hal_nb` serial traits, so the
//! timing-critical paths run unchanged against mocks on the host.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod analyzer;
pub mod command;
pub mod config;
pub mod hw;
pub mod metadata;
pub mod sampler;
pub mod timing;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use analyzer::LogicAnalyzer;
pub use command::{Command, CommandDecoder, DecoderState, FrameKind};
pub use config::{Flags, SamplerConfig};
pub use hw::{Probe, SignalGenerator};
pub use metadata::Metadata;
pub use sampler::{SampleBuffer, Sampler};
pub use timing::{Calibration, LoopCosts, Pacing};
pub use trigger::{Trigger, TriggerConfig};

/// Number of input channels, one bit of the sampled port each.
pub const PROBES: usize = 8;
/// Capacity of the sample buffer in bytes (one sample per byte).
pub const SAMPLE_MEMORY: usize = 32_768;
/// Fastest supported sample rate in Hz.
pub const SAMPLE_RATE: u32 = 10_000_000;
/// Reply to the SUMP query command.
pub const DEVICE_ID: &[u8; 4] = b"1ALS";
/// Name reported in the metadata frame.
pub const DEVICE_NAME: &str = "sumpla: 8ch Logic Analyzer";
/// SUMP metadata protocol version.
pub const PROTOCOL_VERSION: u8 = 2;
