//! Per-clock timing calibration of the capture loops.
//!
//! The four fastest SUMP rates are too tight for a counter-based wait, so they
//! run an unrolled loop that stalls for a fixed number of cycles between reads.
//! Every other rate paces itself against the cycle counter, unless its period
//! is shorter than one counter wait. Both cycle budgets are derived from the
//! core clock and the [`LoopCosts`] of the probe here, once, instead of being
//! baked into the loops.

use crate::hw::Probe;

/// Samples taken per unrolled loop iteration.
pub const BATCH: usize = 4;

/// Periods in nanoseconds served by the unrolled loop: 10, 5, 2 and 1 MHz.
pub const FAST_PERIODS: [u64; 4] = [100, 200, 500, 1000];

/// Cycles spent reading the port, storing the sample and advancing the loop.
pub const SAMPLE_COST: u32 = 4;

/// Cycles spent latching the counter and testing the bound of one wait.
pub const WAIT_OVERHEAD: u32 = 17;

/// Largest trim the capture loop can pad after a stall.
pub const MAX_TRIM: u32 = 3;

/// Cycle costs of one probe's capture primitives.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopCosts {
    pub sample: u32,
    pub wait_overhead: u32,
    pub stall_overhead: u32,
    pub stall_unit: u32,
}

impl LoopCosts {
    /// Costs of a probe whose stall burns exactly one cycle per unit.
    pub const DEFAULT: Self = Self {
        sample: SAMPLE_COST,
        wait_overhead: WAIT_OVERHEAD,
        stall_overhead: 0,
        stall_unit: 1,
    };

    pub const fn of<P: Probe>() -> Self {
        Self {
            sample: P::SAMPLE_CYCLES,
            wait_overhead: P::WAIT_OVERHEAD_CYCLES,
            stall_overhead: P::STALL_OVERHEAD_CYCLES,
            stall_unit: P::STALL_UNIT_CYCLES,
        }
    }

    /// Cycles a stall of `units` followed by `trim` pad cycles takes.
    pub const fn stall_cycles(&self, units: u32, trim: u32) -> u64 {
        self.stall_overhead as u64 + units as u64 * self.stall_unit as u64 + trim as u64
    }
}

/// How the capture loop spaces its reads.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pacing {
    /// Unrolled loop: `stall` units then `trim` pad cycles after each read.
    Unrolled { stall: u32, trim: u32 },
    /// Counter-paced loop, waits `wait` cycles after each read.
    Paced { wait: u64 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FastRate {
    pub period: u64,
    pub pacing: Pacing,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    core_clock_hz: u32,
    costs: LoopCosts,
    fast: [FastRate; FAST_PERIODS.len()],
}

impl Calibration {
    pub const fn new(core_clock_hz: u32) -> Self {
        Self::with_costs(core_clock_hz, LoopCosts::DEFAULT)
    }

    /// Calibration for the loop costs `P` reports.
    pub const fn for_probe<P: Probe>(core_clock_hz: u32) -> Self {
        Self::with_costs(core_clock_hz, LoopCosts::of::<P>())
    }

    pub const fn with_costs(core_clock_hz: u32, costs: LoopCosts) -> Self {
        let mut fast = [FastRate {
            period: 0,
            pacing: Pacing::Unrolled { stall: 0, trim: 0 },
        }; FAST_PERIODS.len()];
        let mut idx = 0;
        while idx < FAST_PERIODS.len() {
            let period = FAST_PERIODS[idx];
            fast[idx] = FastRate {
                period,
                pacing: unrolled(&costs, cycles_in(core_clock_hz, period)),
            };
            idx += 1;
        }
        Self {
            core_clock_hz,
            costs,
            fast,
        }
    }

    pub fn fast_rates(&self) -> &[FastRate] {
        &self.fast
    }

    /// CPU cycles in `period_ns`, rounded to the nearest cycle.
    pub fn cycles(&self, period_ns: u64) -> u64 {
        cycles_in(self.core_clock_hz, period_ns)
    }

    pub fn pacing(&self, period_ns: u64) -> Pacing {
        if let Some(rate) = self.fast.iter().find(|rate| rate.period == period_ns) {
            return rate.pacing;
        }
        let cycles = self.cycles(period_ns);
        let floor = u64::from(self.costs.sample) + u64::from(self.costs.wait_overhead);
        if cycles > floor {
            Pacing::Paced {
                wait: cycles - floor,
            }
        } else {
            // a counter wait alone would overshoot the period
            unrolled(&self.costs, cycles)
        }
    }

    /// Cycles from one read to the next under `pacing`.
    pub fn spacing(&self, pacing: Pacing) -> u64 {
        let sample = u64::from(self.costs.sample);
        match pacing {
            Pacing::Unrolled { stall, trim } => sample + self.costs.stall_cycles(stall, trim),
            Pacing::Paced { wait } => sample + u64::from(self.costs.wait_overhead) + wait,
        }
    }
}

/// Splits the cycles left after the read into stall units and a trim.
///
/// Periods shorter than the fixed costs get no stall at all.
const fn unrolled(costs: &LoopCosts, cycles: u64) -> Pacing {
    let fixed = costs.sample as u64 + costs.stall_overhead as u64;
    let budget = cycles.saturating_sub(fixed);
    let unit = if costs.stall_unit == 0 {
        1
    } else {
        costs.stall_unit as u64
    };
    let units = budget / unit;
    let trim = budget % unit;
    Pacing::Unrolled {
        stall: if units > u32::MAX as u64 {
            u32::MAX
        } else {
            units as u32
        },
        trim: if trim > MAX_TRIM as u64 {
            MAX_TRIM
        } else {
            trim as u32
        },
    }
}

const fn cycles_in(core_clock_hz: u32, period_ns: u64) -> u64 {
    let cycles = (period_ns as u128 * core_clock_hz as u128 + 500_000_000) / 1_000_000_000;
    if cycles > u64::MAX as u128 {
        u64::MAX
    } else {
        cycles as u64
    }
}
