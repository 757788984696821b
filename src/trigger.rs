/// Parallel trigger gating the start of a capture.
///
/// Only the low byte of mask and value is kept; the port is 8 bits wide.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Trigger {
    mask: u8,
    value: u8,
    enabled: bool,
}

impl Trigger {
    pub fn set_mask(&mut self, mask: u32) {
        self.mask = mask as u8;
    }

    pub fn set_value(&mut self, value: u32) {
        self.value = value as u8;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the live port state releases the capture.
    #[inline(always)]
    pub fn is_met(&self, port: u8) -> bool {
        port & self.mask == self.value
    }

    /// A value with bits outside the mask never matches.
    pub fn is_reachable(&self) -> bool {
        self.value & !self.mask == 0
    }
}

/// Stage configuration word of `0xC2`.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerConfig(u32);

impl TriggerConfig {
    const SERIAL: u32 = 0x04;
    const START: u32 = 0x08;

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn is_serial(self) -> bool {
        self.0 & Self::SERIAL != 0
    }

    pub const fn is_start(self) -> bool {
        self.0 & Self::START != 0
    }

    /// Serial triggers are not supported and leave the trigger off.
    pub const fn enables_trigger(self) -> bool {
        !self.is_serial() && self.is_start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_low_byte_is_stored() {
        let mut trigger = Trigger::default();
        trigger.set_mask(0xdead_be81);
        trigger.set_value(0x1234_5601);
        assert_eq!(trigger.mask(), 0x81);
        assert_eq!(trigger.value(), 0x01);
    }

    #[test]
    fn matches_masked_port() {
        let mut trigger = Trigger::default();
        trigger.set_mask(0x05);
        trigger.set_value(0x04);
        assert!(trigger.is_met(0x04));
        assert!(trigger.is_met(0xfe));
        assert!(!trigger.is_met(0x05));
        assert!(!trigger.is_met(0x00));
    }

    #[test]
    fn empty_mask_always_matches_zero_value() {
        let trigger = Trigger::default();
        assert!((0..=u8::MAX).all(|port| trigger.is_met(port)));
        assert!(trigger.is_reachable());
    }

    #[test]
    fn value_outside_mask_is_unreachable() {
        let mut trigger = Trigger::default();
        trigger.set_mask(0x0f);
        trigger.set_value(0x10);
        assert!(!trigger.is_reachable());
        assert!((0..=u8::MAX).all(|port| !trigger.is_met(port)));
    }

    #[test]
    fn serial_mode_forces_trigger_off() {
        assert!(TriggerConfig::new(0x08).enables_trigger());
        assert!(!TriggerConfig::new(0x0c).enables_trigger());
        assert!(!TriggerConfig::new(0x04).enables_trigger());
        assert!(!TriggerConfig::new(0x00).enables_trigger());
        assert!(TriggerConfig::new(0x0c).is_serial());
    }
}
