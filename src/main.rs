#![no_std]
#![no_main]

extern crate panic_probe;
extern crate rp2040_hal as hal;
extern crate rtic;

mod board;
mod pattern;

use defmt_rtt as _;

use board::*;
use cortex_m::singleton;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal_nb::serial::Read;
use hal::clocks::Clock;
use hal::gpio::*;
use hal::pac;
use hal::usb::UsbBus;
use pattern::TestPattern;
use portable_atomic::{AtomicUsize, Ordering};
use sumpla::*;
use usb_device::{class_prelude::*, prelude::*};
use usbd_serial::SerialPort;

pub const PIN_BASE: u8 = 0;
pub const XTAL_FREQ_HZ: u32 = 12_000_000_u32;

#[cfg(not(feature = "generic-bootloader"))]
#[used]
#[no_mangle]
#[link_section = ".boot2"]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;

#[cfg(feature = "generic-bootloader")]
#[used]
#[no_mangle]
#[link_section = ".boot2"]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

static LOG_SEQ: AtomicUsize = AtomicUsize::new(0);
defmt::timestamp!("{=usize}", LOG_SEQ.fetch_add(1, Ordering::Relaxed));

type Analyzer = LogicAnalyzer<SioProbe, hal::Timer, TestPattern>;
type StatusLed = Pin<bank0::Gpio25, FunctionSioOutput, PullDown>;

fn blink(led: &mut StatusLed, delay: &mut impl DelayNs, on_ms: u32, off_ms: u32, times: usize) {
    for _ in 0..times {
        led.set_high().ok();
        delay.delay_ms(on_ms);
        led.set_low().ok();
        delay.delay_ms(off_ms);
    }
}

#[rtic::app(device = pac, peripherals = true)]
mod app {
    use super::*;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        analyzer: Analyzer,
        serial: UsbSerial,
        status_led: StatusLed,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        unsafe {
            hal::sio::spinlock_reset();
        }

        let mut resets = ctx.device.RESETS;
        let mut watchdog = hal::Watchdog::new(ctx.device.WATCHDOG);
        let clocks = defmt::unwrap!(hal::clocks::init_clocks_and_plls(
            XTAL_FREQ_HZ,
            ctx.device.XOSC,
            ctx.device.CLOCKS,
            ctx.device.PLL_SYS,
            ctx.device.PLL_USB,
            &mut resets,
            &mut watchdog,
        )
        .ok());
        let core_clock = clocks.system_clock.freq().to_Hz();

        let usb_regs = ctx.device.USBCTRL_REGS;
        let usb_dpram = ctx.device.USBCTRL_DPRAM;
        let usb_bus = UsbBus::new(usb_regs, usb_dpram, clocks.usb_clock, true, &mut resets);
        let usb_bus: &'static UsbBusAllocator<UsbBus> =
            defmt::unwrap!(singleton!(: UsbBusAllocator<UsbBus> = UsbBusAllocator::new(usb_bus)));

        let serial = SerialPort::new(usb_bus);
        let usb_dev = UsbDeviceBuilder::new(usb_bus, UsbVidPid(0x16c0, 0x27dd))
            .strings(&[StringDescriptors::default()
                .manufacturer("Ferris & Co")
                .product("sumpla logic analyzer")
                .serial_number("_sumpla_")]);
        let usb_dev = defmt::unwrap!(usb_dev.ok())
            .device_class(usbd_serial::USB_CLASS_CDC)
            .build();

        let mut timer = hal::Timer::new(ctx.device.TIMER, &mut resets, &clocks);
        let (pio, sm0, _, _, _) = ctx.device.PIO0.split(&mut resets);

        let sio = hal::Sio::new(ctx.device.SIO);
        let pins = Pins::new(
            ctx.device.IO_BANK0,
            ctx.device.PADS_BANK0,
            sio.gpio_bank0,
            &mut resets,
        );

        // Probe inputs; the PIO only drives them in test mode.
        pins.gpio0.reconfigure::<FunctionPio0, PullNone>();
        pins.gpio1.reconfigure::<FunctionPio0, PullNone>();
        pins.gpio2.reconfigure::<FunctionPio0, PullNone>();
        pins.gpio3.reconfigure::<FunctionPio0, PullNone>();
        pins.gpio4.reconfigure::<FunctionPio0, PullNone>();
        pins.gpio5.reconfigure::<FunctionPio0, PullNone>();
        pins.gpio6.reconfigure::<FunctionPio0, PullNone>();
        pins.gpio7.reconfigure::<FunctionPio0, PullNone>();

        let mut status_led = pins.gpio25.into_push_pull_output();

        let samples = defmt::unwrap!(singleton!(: [u8; SAMPLE_MEMORY] = [0x00; SAMPLE_MEMORY]));
        let calibration = Calibration::for_probe::<SioProbe>(core_clock);
        defmt::info!("core clock {=u32} Hz, {}", core_clock, calibration);

        let sampler = Sampler::new(
            SioProbe::new(ctx.core.SYST),
            timer,
            TestPattern::new(pio, sm0, core_clock),
            calibration,
            SampleBuffer::new(samples),
        );
        let analyzer = LogicAnalyzer::new(sampler);

        blink(&mut status_led, &mut timer, 50, 100, 5);

        (
            Shared {},
            Local {
                analyzer,
                serial: UsbSerial::new(usb_dev, serial),
                status_led,
            },
        )
    }

    #[idle(local = [analyzer, serial, status_led])]
    fn idle(ctx: idle::Context) -> ! {
        let idle::LocalResources {
            analyzer,
            serial,
            status_led,
            ..
        } = ctx.local;

        loop {
            let byte = match serial.read() {
                Ok(byte) => byte,
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(err)) => {
                    defmt::warn!("serial read failed: {}", defmt::Debug2Format(&err));
                    continue;
                }
            };

            status_led.set_high().ok();
            if let Err(err) = analyzer.feed(byte, serial) {
                defmt::warn!("serial write failed: {}", defmt::Debug2Format(&err));
            }
            status_led.set_low().ok();
        }
    }
}
