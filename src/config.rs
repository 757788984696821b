use crate::*;

/// Slowest divider accepted before the transform; anything below maps to 10 MHz.
pub const MIN_DIVIDER: u32 = 9;
/// Divider applied by `reset`.
pub const DEFAULT_DIVIDER: u32 = 11;

/// SUMP divider to inter-sample spacing in nanoseconds.
///
/// The divider counts ticks of the 100 MHz reference clock of the protocol,
/// so one tick is 10 ns.
pub const fn period_from_divider(divider: u32) -> u64 {
    let divider = if divider < MIN_DIVIDER {
        MIN_DIVIDER
    } else {
        divider
    };
    (divider as u64 + 1) * 10
}

/// SUMP flag register (`0x82`).
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flags(u32);

impl Flags {
    pub const DEMUX: u32 = 0x01;
    pub const FILTER: u32 = 0x02;
    pub const CHANNEL_GROUPS: u32 = 0x3c;
    pub const EXTERNAL: u32 = 0x40;
    pub const INVERTED: u32 = 0x80;
    pub const TEST: u32 = 0x400;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    /// Drive the diagnostic waveform while capturing.
    pub const fn test_mode(self) -> bool {
        self.contains(Self::TEST)
    }

    /// Channel groups the host asked to disable, one bit per group.
    pub const fn disabled_groups(self) -> u8 {
        ((self.0 & Self::CHANNEL_GROUPS) >> 2) as u8
    }
}

/// Acquisition settings, changed only between captures.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplerConfig {
    sampling_period: u64,
    sample_count: usize,
    sample_delay: u16,
    trigger: Trigger,
    flags: Flags,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sampling_period: period_from_divider(DEFAULT_DIVIDER),
            sample_count: SAMPLE_MEMORY,
            sample_delay: 0,
            trigger: Trigger::default(),
            flags: Flags::default(),
        }
    }
}

impl SamplerConfig {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Inter-sample spacing in nanoseconds.
    pub fn sampling_period(&self) -> u64 {
        self.sampling_period
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Microseconds waited before the trigger check.
    pub fn sample_delay(&self) -> u16 {
        self.sample_delay
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn set_sampling_divider(&mut self, divider: u32) {
        self.sampling_period = period_from_divider(divider);
    }

    pub fn set_sample_count(&mut self, count: u32) {
        self.sample_count = (count as usize).min(SAMPLE_MEMORY);
    }

    pub fn set_sampling_delay(&mut self, delay_us: u16) {
        self.sample_delay = delay_us;
    }

    pub fn set_trigger_mask(&mut self, mask: u32) {
        self.trigger.set_mask(mask);
    }

    pub fn set_trigger_value(&mut self, value: u32) {
        self.trigger.set_value(value);
    }

    pub fn set_trigger_enabled(&mut self, enabled: bool) {
        self.trigger.set_enabled(enabled);
    }

    pub fn set_flags(&mut self, flags: u32) {
        self.flags = Flags::new(flags);
    }
}
