use crate::*;
use hal::pio::{
    PIOBuilder, PinDir, Running, StateMachine, Stopped, UninitStateMachine, PIO, SM0,
};

pub type PatternAssembler = pio::Assembler<32>;
pub type PatternProgram = pio::Program<32>;

/// Toggle rate of probe 0; probe `n` runs at `PATTERN_BASE_HZ >> n`.
pub const PATTERN_BASE_HZ: u32 = 1_000_000;

/// PIO cycles per counter step (`mov` + `jmp`).
const CYCLES_PER_STEP: u64 = 2;

enum Engine {
    Idle(StateMachine<(pac::PIO0, SM0), Stopped>),
    Driving(StateMachine<(pac::PIO0, SM0), Running>),
}

/// Binary counter on the probe pins, one halving of frequency per pin.
pub struct TestPattern {
    _pio: PIO<pac::PIO0>,
    engine: Option<Engine>,
}

/// `X` decrements forever and is mirrored onto the out pins.
pub fn program() -> PatternProgram {
    let mut asm = PatternAssembler::new();
    let mut wrap_target = asm.label();
    let mut wrap_source = asm.label();

    asm.bind(&mut wrap_target);
    asm.mov(
        pio::MovDestination::PINS,
        pio::MovOperation::None,
        pio::MovSource::X,
    );
    asm.jmp(pio::JmpCondition::XDecNonZero, &mut wrap_target);
    asm.bind(&mut wrap_source);

    asm.assemble_with_wrap(wrap_source, wrap_target)
}

/// 16.8 fixed point divider putting probe 0 at `PATTERN_BASE_HZ`.
fn clock_divisor(core_clock_hz: u32) -> (u16, u8) {
    // one pin period spans two counter steps
    let step_hz = u64::from(PATTERN_BASE_HZ) * 2 * CYCLES_PER_STEP;
    let div = (u64::from(core_clock_hz) << 8) / step_hz;
    let int = (div >> 8).clamp(1, u64::from(u16::MAX)) as u16;
    (int, div as u8)
}

fn pin_dirs(dir: PinDir) -> impl Iterator<Item = (u8, PinDir)> {
    (PIN_BASE..PIN_BASE + PROBES as u8).map(move |pin| (pin, dir))
}

impl TestPattern {
    pub fn new(
        mut pio: PIO<pac::PIO0>,
        sm: UninitStateMachine<(pac::PIO0, SM0)>,
        core_clock_hz: u32,
    ) -> Self {
        let program = defmt::unwrap!(pio.install(&program()).ok());
        let (int, frac) = clock_divisor(core_clock_hz);
        let (mut sm, _, _) = PIOBuilder::from_installed_program(program)
            .out_pins(PIN_BASE, PROBES as u8)
            .clock_divisor_fixed_point(int, frac)
            .build(sm);
        sm.set_pindirs(pin_dirs(PinDir::Input));

        Self {
            _pio: pio,
            engine: Some(Engine::Idle(sm)),
        }
    }
}

impl SignalGenerator for TestPattern {
    fn start(&mut self) {
        self.engine = match self.engine.take() {
            Some(Engine::Idle(mut sm)) => {
                sm.set_pindirs(pin_dirs(PinDir::Output));
                Some(Engine::Driving(sm.start()))
            }
            engine => engine,
        };
    }

    fn stop(&mut self) {
        self.engine = match self.engine.take() {
            Some(Engine::Driving(sm)) => {
                let mut sm = sm.stop();
                sm.set_pindirs(pin_dirs(PinDir::Input));
                Some(Engine::Idle(sm))
            }
            engine => engine,
        };
    }
}
