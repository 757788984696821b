use crate::*;
use cortex_m::peripheral::{syst::SystClkSource, SYST};
use embedded_hal_nb::serial::{ErrorKind, ErrorType, Write};
use usb_device::UsbError;

/// SysTick runs the full 24 bit range.
pub const SYSTICK_RELOAD: u32 = 0x00ff_ffff;

/// Probe pins through the SIO input register, cycle count from SysTick.
pub struct SioProbe {
    _syst: SYST,
}

impl SioProbe {
    pub fn new(mut syst: SYST) -> Self {
        syst.set_clock_source(SystClkSource::Core);
        syst.set_reload(SYSTICK_RELOAD);
        syst.clear_current();
        syst.enable_counter();
        Self { _syst: syst }
    }
}

impl Probe for SioProbe {
    const COUNTER_MASK: u32 = SYSTICK_RELOAD;

    // `mov` into the loop register, then `units + 1` passes of `subs` + `bcs`
    // on the Cortex-M0+: 3 cycles each, 2 for the last one.
    const STALL_OVERHEAD_CYCLES: u32 = 3;
    const STALL_UNIT_CYCLES: u32 = 3;

    #[inline(always)]
    fn read_port(&mut self) -> u8 {
        // SAFETY: read-only access to the single-cycle GPIO input register.
        let bank0 = unsafe { (*pac::SIO::ptr()).gpio_in().read().bits() };
        (bank0 >> PIN_BASE) as u8
    }

    #[inline(always)]
    fn read_cycle_counter(&mut self) -> u32 {
        // SysTick counts down
        SYSTICK_RELOAD - SYST::get_current()
    }

    #[inline(always)]
    fn stall(&mut self, units: u32) {
        // SAFETY: register-only countdown loop.
        unsafe {
            core::arch::asm!(
                "2:",
                "subs {n}, #1",
                "bcs 2b",
                n = inout(reg) units => _,
                options(nomem, nostack),
            );
        }
    }

    #[inline(always)]
    fn pad<const CYCLES: u32>(&mut self) {
        // SAFETY: `nop` only.
        unsafe {
            match CYCLES {
                0 => {}
                1 => core::arch::asm!("nop", options(nomem, nostack, preserves_flags)),
                2 => core::arch::asm!("nop", "nop", options(nomem, nostack, preserves_flags)),
                _ => core::arch::asm!("nop", "nop", "nop", options(nomem, nostack, preserves_flags)),
            }
        }
    }
}

/// CDC-ACM port exposed as a byte-wise non-blocking serial.
///
/// Every call polls the USB device, so blocking on `WouldBlock` keeps the
/// bus serviced.
pub struct UsbSerial {
    usb_dev: UsbDevice<'static, UsbBus>,
    serial: SerialPort<'static, UsbBus>,
}

impl UsbSerial {
    pub fn new(usb_dev: UsbDevice<'static, UsbBus>, serial: SerialPort<'static, UsbBus>) -> Self {
        Self { usb_dev, serial }
    }

    fn poll(&mut self) {
        self.usb_dev.poll(&mut [&mut self.serial]);
    }
}

fn usb_error(err: UsbError) -> nb::Error<ErrorKind> {
    match err {
        UsbError::WouldBlock => nb::Error::WouldBlock,
        UsbError::BufferOverflow => nb::Error::Other(ErrorKind::Overrun),
        _ => nb::Error::Other(ErrorKind::Other),
    }
}

impl ErrorType for UsbSerial {
    type Error = ErrorKind;
}

impl embedded_hal_nb::serial::Read<u8> for UsbSerial {
    fn read(&mut self) -> nb::Result<u8, ErrorKind> {
        self.poll();
        let mut byte = [0x00];
        match self.serial.read(&mut byte) {
            Ok(0) => Err(nb::Error::WouldBlock),
            Ok(_) => Ok(byte[0]),
            Err(err) => Err(usb_error(err)),
        }
    }
}

impl Write<u8> for UsbSerial {
    fn write(&mut self, word: u8) -> nb::Result<(), ErrorKind> {
        self.poll();
        match self.serial.write(&[word]) {
            Ok(0) => Err(nb::Error::WouldBlock),
            Ok(_) => Ok(()),
            Err(err) => Err(usb_error(err)),
        }
    }

    fn flush(&mut self) -> nb::Result<(), ErrorKind> {
        self.poll();
        self.serial.flush().map_err(usb_error)
    }
}
