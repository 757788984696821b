use crate::timing::{BATCH, MAX_TRIM};
use crate::*;
use embedded_hal::delay::DelayNs;
use embedded_hal_nb::serial::Write;

/// Samples captured by the self-test.
pub const SELF_TEST_SAMPLES: usize = 1024;

/// Sample memory, filled from index 0 in capture order.
pub struct SampleBuffer {
    samples: &'static mut [u8; SAMPLE_MEMORY],
}

impl SampleBuffer {
    pub fn new(samples: &'static mut [u8; SAMPLE_MEMORY]) -> Self {
        Self { samples }
    }

    /// The first `count` samples, oldest first.
    pub fn samples(&self, count: usize) -> &[u8] {
        &self.samples[..count.min(SAMPLE_MEMORY)]
    }
}

/// Blocking acquisition engine.
///
/// Owns the configuration and the sample memory; nothing else mutates either,
/// and a capture holds `&mut self` until the last sample is stored.
pub struct Sampler<P, D, G = ()> {
    probe: P,
    delay: D,
    generator: G,
    calibration: Calibration,
    config: SamplerConfig,
    buffer: SampleBuffer,
}

impl<P, D, G> Sampler<P, D, G>
where
    P: Probe,
    D: DelayNs,
    G: SignalGenerator,
{
    /// Creates a new sampler with the default configuration.
    ///
    /// # Arguments
    ///
    /// * `probe` - Port and cycle counter access.
    /// * `delay` - Microsecond delay used before the trigger check.
    /// * `generator` - Test-mode waveform source.
    /// * `calibration` - Cycle budgets derived from the core clock.
    /// * `buffer` - Sample memory.
    pub fn new(
        probe: P,
        delay: D,
        generator: G,
        calibration: Calibration,
        buffer: SampleBuffer,
    ) -> Self {
        Self {
            probe,
            delay,
            generator,
            calibration,
            config: SamplerConfig::default(),
            buffer,
        }
    }

    /// Releases the hardware handles.
    pub fn free(self) -> (P, D, G) {
        (self.probe, self.delay, self.generator)
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Samples of the last capture, oldest first.
    pub fn samples(&self) -> &[u8] {
        self.buffer.samples(self.config.sample_count())
    }

    pub fn reset(&mut self) {
        self.config.reset();
    }

    pub fn set_sampling_divider(&mut self, divider: u32) {
        self.config.set_sampling_divider(divider);
    }

    pub fn set_sample_count(&mut self, count: u32) {
        self.config.set_sample_count(count);
    }

    pub fn set_sampling_delay(&mut self, delay_us: u16) {
        self.config.set_sampling_delay(delay_us);
    }

    pub fn set_trigger_mask(&mut self, mask: u32) {
        self.config.set_trigger_mask(mask);
    }

    pub fn set_trigger_value(&mut self, value: u32) {
        self.config.set_trigger_value(value);
    }

    pub fn set_trigger_enabled(&mut self, enabled: bool) {
        self.config.set_trigger_enabled(enabled);
    }

    pub fn set_flags(&mut self, flags: u32) {
        self.config.set_flags(flags);
    }

    /// Captures with the test waveform when test mode is set, then drains the
    /// samples to `serial`.
    pub fn arm<S: Write<u8>>(&mut self, serial: &mut S) -> Result<(), S::Error> {
        if self.config.flags().test_mode() {
            self.generator.start();
            self.capture();
            self.generator.stop();
        } else {
            self.capture();
        }
        self.drain(serial)
    }

    /// Runs one capture to completion.
    ///
    /// Waits the configured delay, then spins until the trigger matches (for as
    /// long as it takes), then fills `sample_count` samples.
    pub fn capture(&mut self) {
        let delay_us = self.config.sample_delay();
        if delay_us > 0 {
            self.delay.delay_us(u32::from(delay_us));
        }

        let trigger = *self.config.trigger();
        if trigger.is_enabled() {
            if !trigger.is_reachable() {
                warn!(
                    "trigger value {=u8:#x} outside mask {=u8:#x}, waiting forever",
                    trigger.value(),
                    trigger.mask()
                );
            }
            while !trigger.is_met(self.probe.read_port()) {}
        }

        self.sample(self.config.sample_count());
    }

    /// Sends the captured samples, blocking on the transport before each byte.
    pub fn drain<S: Write<u8>>(&mut self, serial: &mut S) -> Result<(), S::Error> {
        for &sample in self.buffer.samples(self.config.sample_count()) {
            nb::block!(serial.write(sample))?;
        }
        nb::block!(serial.flush())
    }

    /// Captures can not be interrupted; kept for the XOFF acknowledgment.
    pub fn stop(&mut self) {
        debug!("stop requested while idle");
    }

    /// Short untriggered capture with the test waveform running.
    ///
    /// Returns the channels that toggled at least once.
    pub fn run_test(&mut self) -> u8 {
        let count = SELF_TEST_SAMPLES.min(SAMPLE_MEMORY);
        self.generator.start();
        self.sample(count);
        self.generator.stop();

        let toggled = self
            .buffer
            .samples(count)
            .windows(2)
            .fold(0, |acc, pair| acc | (pair[0] ^ pair[1]));
        info!("self-test toggled channels {=u8:#x}", toggled);
        toggled
    }

    fn sample(&mut self, count: usize) {
        let samples = &mut self.buffer.samples[..count.min(SAMPLE_MEMORY)];
        let pacing = self.calibration.pacing(self.config.sampling_period());
        trace!("sampling {=usize} with {}", samples.len(), pacing);
        let probe = &mut self.probe;
        match pacing {
            Pacing::Unrolled { stall, trim: 0 } => sample_unrolled::<P, 0>(probe, samples, stall),
            Pacing::Unrolled { stall, trim: 1 } => sample_unrolled::<P, 1>(probe, samples, stall),
            Pacing::Unrolled { stall, trim: 2 } => sample_unrolled::<P, 2>(probe, samples, stall),
            Pacing::Unrolled { stall, .. } => {
                sample_unrolled::<P, { MAX_TRIM }>(probe, samples, stall)
            }
            Pacing::Paced { wait } => sample_paced(probe, samples, wait),
        }
    }
}

// Capture loops run from RAM on the target, out of reach of XIP cache misses.
#[inline(never)]
#[cfg_attr(all(target_arch = "arm", target_os = "none"), link_section = ".data.sample")]
fn sample_unrolled<P: Probe, const TRIM: u32>(probe: &mut P, samples: &mut [u8], stall: u32) {
    let mut batches = samples.chunks_exact_mut(BATCH);
    for batch in &mut batches {
        batch[0] = probe.read_port();
        probe.stall(stall);
        probe.pad::<TRIM>();
        batch[1] = probe.read_port();
        probe.stall(stall);
        probe.pad::<TRIM>();
        batch[2] = probe.read_port();
        probe.stall(stall);
        probe.pad::<TRIM>();
        batch[3] = probe.read_port();
        probe.stall(stall);
        probe.pad::<TRIM>();
    }
    for sample in batches.into_remainder() {
        *sample = probe.read_port();
        probe.stall(stall);
        probe.pad::<TRIM>();
    }
}

#[inline(never)]
#[cfg_attr(all(target_arch = "arm", target_os = "none"), link_section = ".data.sample")]
fn sample_paced<P: Probe>(probe: &mut P, samples: &mut [u8], wait: u64) {
    let mut batches = samples.chunks_exact_mut(BATCH);
    for batch in &mut batches {
        batch[0] = probe.read_port();
        probe.wait_cycles(wait);
        batch[1] = probe.read_port();
        probe.wait_cycles(wait);
        batch[2] = probe.read_port();
        probe.wait_cycles(wait);
        batch[3] = probe.read_port();
        probe.wait_cycles(wait);
    }
    for sample in batches.into_remainder() {
        *sample = probe.read_port();
        probe.wait_cycles(wait);
    }
}
