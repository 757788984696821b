//! Narrow hardware seams used by the sampling engine.

use crate::timing::{SAMPLE_COST, WAIT_OVERHEAD};

/// Access to the sampled input port and the CPU cycle counter.
///
/// Implementations must be cheap: `read_port` sits inside the capture loop and
/// its cost is part of the per-sample budget accounted for by
/// [`Calibration`](crate::Calibration). The `*_CYCLES` constants describe what
/// the primitives actually cost on the target, and
/// [`Calibration::for_probe`](crate::Calibration::for_probe) builds its table
/// from them.
pub trait Probe {
    /// Significant bits of [`read_cycle_counter`](Probe::read_cycle_counter).
    ///
    /// A 24 bit down-counter such as SysTick is exposed as an up-counter
    /// wrapping at `0x00FF_FFFF`.
    const COUNTER_MASK: u32 = u32::MAX;

    /// Cycles to read the port, store the sample and advance the loop.
    const SAMPLE_CYCLES: u32 = SAMPLE_COST;

    /// Fixed cycles of one [`wait_cycles`](Probe::wait_cycles) on top of the
    /// requested count.
    const WAIT_OVERHEAD_CYCLES: u32 = WAIT_OVERHEAD;

    /// Fixed cycles of one [`stall`](Probe::stall), whatever its length.
    const STALL_OVERHEAD_CYCLES: u32 = 0;

    /// Cycles added by each unit passed to [`stall`](Probe::stall).
    const STALL_UNIT_CYCLES: u32 = 1;

    /// Snapshot of the 8 probe inputs.
    fn read_port(&mut self) -> u8;

    /// Free running counter incremented once per CPU cycle.
    fn read_cycle_counter(&mut self) -> u32;

    /// Burns `STALL_OVERHEAD_CYCLES + units * STALL_UNIT_CYCLES` CPU cycles
    /// without touching the port.
    fn stall(&mut self, units: u32) {
        for _ in 0..units {
            core::hint::spin_loop();
        }
    }

    /// Burns exactly `CYCLES` CPU cycles, rounding a stall off to the period.
    #[inline(always)]
    fn pad<const CYCLES: u32>(&mut self) {
        for _ in 0..CYCLES {
            core::hint::spin_loop();
        }
    }

    /// Spins until `cycles` have elapsed on the cycle counter.
    ///
    /// Waits longer than half the counter range are split so the wrapping
    /// comparison never aliases.
    fn wait_cycles(&mut self, cycles: u64) {
        let chunk = u64::from(Self::COUNTER_MASK >> 1);
        let mut remaining = cycles;
        while remaining > 0 {
            let target = remaining.min(chunk) as u32;
            let start = self.read_cycle_counter();
            while self.read_cycle_counter().wrapping_sub(start) & Self::COUNTER_MASK < target {}
            remaining -= u64::from(target);
        }
    }
}

/// Waveform source driven onto the probe pins while test mode is active.
pub trait SignalGenerator {
    fn start(&mut self);
    fn stop(&mut self);
}

/// No test waveform available.
impl SignalGenerator for () {
    fn start(&mut self) {}
    fn stop(&mut self) {}
}
