//! SUMP command framing.
//!
//! Commands arrive one byte at a time. The first byte of a frame is the opcode
//! and decides the frame length from a fixed table: short commands are the
//! opcode alone, long commands carry four little-endian argument bytes.
//! Opcodes outside the table are dropped on their own, which is how the
//! decoder regains sync after line noise.

pub const RESET: u8 = 0x00;
pub const ARM: u8 = 0x01;
pub const GET_ID: u8 = 0x02;
pub const SELF_TEST: u8 = 0x03;
pub const GET_META: u8 = 0x04;
pub const RLE_FINISH: u8 = 0x05;
pub const XON: u8 = 0x11;
pub const XOFF: u8 = 0x13;
pub const SET_DIVIDER: u8 = 0x80;
pub const SET_READ_DELAY_COUNT: u8 = 0x81;
pub const SET_FLAGS: u8 = 0x82;
pub const SET_DELAY_COUNT: u8 = 0x83;
pub const SET_READ_COUNT: u8 = 0x84;
pub const SET_TRIGGER_MASK: u8 = 0xc0;
pub const SET_TRIGGER_VALUES: u8 = 0xc1;
pub const SET_TRIGGER_CONFIG: u8 = 0xc2;

const FRAME_LEN: usize = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameKind {
    Short,
    Long,
}

impl FrameKind {
    /// Frame length class of `opcode`, `None` when the opcode is unknown.
    pub const fn classify(opcode: u8) -> Option<Self> {
        match opcode {
            RESET | ARM | GET_ID | SELF_TEST | GET_META | RLE_FINISH | XON | XOFF => {
                Some(Self::Short)
            }
            SET_DIVIDER..=SET_READ_COUNT | SET_TRIGGER_MASK..=0xcf => Some(Self::Long),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Reset,
    Arm,
    GetId,
    SelfTest,
    GetMeta,
    Resume,
    Pause,
    SetDivider(u32),
    SetReadDelayCount { read: u16, delay: u16 },
    SetFlags(u32),
    SetTriggerMask(u8, u32),
    SetTriggerValues(u8, u32),
    SetTriggerConfig(u8, u32),
    /// Well-formed frame without a handler in this device.
    Ignored(u8),
}

impl Command {
    /// Decodes a complete frame, `args` is zeroed for short commands.
    pub fn decode(opcode: u8, args: [u8; 4]) -> Self {
        let word = u32::from_le_bytes(args);
        match opcode {
            RESET => Self::Reset,
            ARM => Self::Arm,
            GET_ID => Self::GetId,
            SELF_TEST => Self::SelfTest,
            GET_META => Self::GetMeta,
            XON => Self::Resume,
            XOFF => Self::Pause,
            SET_DIVIDER => Self::SetDivider(word),
            SET_READ_DELAY_COUNT => Self::SetReadDelayCount {
                read: u16::from_le_bytes([args[0], args[1]]),
                delay: u16::from_le_bytes([args[2], args[3]]),
            },
            SET_FLAGS => Self::SetFlags(word),
            0xc0 | 0xc4 | 0xc8 | 0xcc => Self::SetTriggerMask((opcode - 0xc0) / 4, word),
            0xc1 | 0xc5 | 0xc9 | 0xcd => Self::SetTriggerValues((opcode - 0xc1) / 4, word),
            0xc2 | 0xc6 | 0xca | 0xce => Self::SetTriggerConfig((opcode - 0xc2) / 4, word),
            other => Self::Ignored(other),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderState {
    Idle,
    /// Long opcode seen, `filled` argument bytes collected so far.
    AccumulatingLong { filled: u8 },
}

/// Byte-at-a-time frame assembler.
pub struct CommandDecoder {
    frame: [u8; FRAME_LEN],
    needle: usize,
}

impl Default for CommandDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDecoder {
    pub const fn new() -> Self {
        Self {
            frame: [0; FRAME_LEN],
            needle: 0,
        }
    }

    pub fn state(&self) -> DecoderState {
        match self.needle {
            0 => DecoderState::Idle,
            n => DecoderState::AccumulatingLong {
                filled: (n - 1) as u8,
            },
        }
    }

    /// Drops a partially received frame.
    pub fn clear(&mut self) {
        self.needle = 0;
        self.frame = [0; FRAME_LEN];
    }

    /// Feeds one byte, returning the command it completes.
    pub fn push(&mut self, byte: u8) -> Option<Command> {
        if self.needle > 0 {
            self.frame[self.needle] = byte;
            self.needle += 1;
            if self.needle < FRAME_LEN {
                return None;
            }
            let [opcode, args @ ..] = self.frame;
            self.clear();
            return Some(Command::decode(opcode, args));
        }

        match FrameKind::classify(byte) {
            Some(FrameKind::Short) => Some(Command::decode(byte, [0; 4])),
            Some(FrameKind::Long) => {
                self.frame[0] = byte;
                self.needle = 1;
                None
            }
            None => {
                debug!("dropping unknown opcode {=u8:#x}", byte);
                None
            }
        }
    }
}
