use crate::metadata::write_all;
use crate::*;
use embedded_hal::delay::DelayNs;
use embedded_hal_nb::serial::{Read, Write};

/// The device: command decoder plus the sampler it drives.
pub struct LogicAnalyzer<P, D, G = ()> {
    sampler: Sampler<P, D, G>,
    decoder: CommandDecoder,
    metadata: Metadata,
}

impl<P, D, G> LogicAnalyzer<P, D, G>
where
    P: Probe,
    D: DelayNs,
    G: SignalGenerator,
{
    pub fn new(sampler: Sampler<P, D, G>) -> Self {
        Self {
            sampler,
            decoder: CommandDecoder::new(),
            metadata: Metadata::default(),
        }
    }

    pub fn sampler(&self) -> &Sampler<P, D, G> {
        &self.sampler
    }

    pub fn decoder(&self) -> &CommandDecoder {
        &self.decoder
    }

    /// Reads at most one byte from `serial` and handles it.
    ///
    /// `WouldBlock` means no byte was waiting. Captures started by the byte run
    /// to completion before this returns.
    pub fn poll_serial<S>(&mut self, serial: &mut S) -> nb::Result<(), S::Error>
    where
        S: Read<u8> + Write<u8>,
    {
        let byte = serial.read()?;
        self.feed(byte, serial).map_err(nb::Error::Other)
    }

    /// Pushes one received byte through the decoder and executes the command
    /// it completes, if any.
    pub fn feed<S: Write<u8>>(&mut self, byte: u8, serial: &mut S) -> Result<(), S::Error> {
        match self.decoder.push(byte) {
            Some(command) => self.execute(command, serial),
            None => Ok(()),
        }
    }

    pub fn execute<S: Write<u8>>(&mut self, command: Command, serial: &mut S) -> Result<(), S::Error> {
        debug!("command {}", command);
        match command {
            Command::Reset => self.sampler.reset(),
            Command::Arm => self.sampler.arm(serial)?,
            Command::GetId => {
                write_all(serial, DEVICE_ID)?;
                nb::block!(serial.flush())?;
            }
            Command::GetMeta => {
                self.metadata.write(serial)?;
                nb::block!(serial.flush())?;
            }
            Command::SelfTest => {
                self.sampler.run_test();
            }
            Command::Resume => self.sampler.capture(),
            Command::Pause => self.sampler.stop(),
            Command::SetDivider(divider) => self.sampler.set_sampling_divider(divider),
            Command::SetReadDelayCount { read, delay } => {
                self.sampler.set_sample_count(4 * (1 + u32::from(read)));
                self.sampler.set_sampling_delay(delay.saturating_mul(4));
            }
            Command::SetFlags(flags) => self.sampler.set_flags(flags),
            Command::SetTriggerMask(0, mask) => self.sampler.set_trigger_mask(mask),
            Command::SetTriggerValues(0, value) => self.sampler.set_trigger_value(value),
            Command::SetTriggerConfig(0, config) => {
                let config = TriggerConfig::new(config);
                if config.is_serial() {
                    warn!("serial trigger not supported, trigger disabled");
                }
                self.sampler.set_trigger_enabled(config.enables_trigger());
            }
            Command::SetTriggerMask(stage, _)
            | Command::SetTriggerValues(stage, _)
            | Command::SetTriggerConfig(stage, _) => {
                trace!("ignoring trigger stage {=u8}", stage);
            }
            Command::Ignored(opcode) => {
                trace!("ignoring opcode {=u8:#x}", opcode);
            }
        }
        Ok(())
    }
}
